use crate::error::{AppError, Result};
use crate::results::ExtractedImportantData;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct StoreResultRequest {
    pub tool_name: String,
    /// Raw tool output. Non-string JSON is stored in its compact encoding.
    pub result: Value,
}

/// What a caller learns about a stored result; the full text stays server-side.
#[derive(Debug, Serialize)]
pub struct StoreResultResponse {
    pub id: String,
    pub tool_name: String,
    pub timestamp: DateTime<Utc>,
    pub token_count: usize,
    pub was_summarized: bool,
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct ResultsContextResponse {
    pub stored_results: usize,
    pub context: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractedResponse {
    pub summary: String,
    pub data: ExtractedImportantData,
}

/// POST /results - Record a tool's raw output.
pub async fn store_result_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StoreResultRequest>,
) -> Result<(StatusCode, Json<StoreResultResponse>)> {
    if request.tool_name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "tool_name cannot be empty".to_string(),
        ));
    }

    let raw = match request.result {
        Value::String(text) => text,
        other => other.to_string(),
    };

    let stored = state.results.lock().store_result(&request.tool_name, &raw);

    metrics::counter!("results_stored_total").increment(1);
    if stored.was_summarized {
        metrics::counter!("results_summarized_total").increment(1);
    }

    Ok((
        StatusCode::CREATED,
        Json(StoreResultResponse {
            id: stored.id,
            tool_name: stored.tool_name,
            timestamp: stored.timestamp,
            token_count: stored.token_count,
            was_summarized: stored.was_summarized,
            summary: stored.summary,
        }),
    ))
}

/// GET /results/context - Stored results rendered within the token budget.
pub async fn results_context_handler(
    State(state): State<Arc<AppState>>,
) -> Json<ResultsContextResponse> {
    let (stored_results, context) = {
        let results = state.results.lock();
        (results.len(), results.all_results_for_context())
    };
    Json(ResultsContextResponse {
        stored_results,
        context,
    })
}

/// GET /results/extracted - Merged extracted data across stored results.
pub async fn extracted_handler(State(state): State<Arc<AppState>>) -> Json<ExtractedResponse> {
    let (summary, data) = {
        let results = state.results.lock();
        (results.extracted_data_summary(), results.extracted_data())
    };
    Json(ExtractedResponse { summary, data })
}
