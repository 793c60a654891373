use crate::error::{AppError, Result};
use crate::results::estimate_tokens;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub message: String,
    #[serde(default)]
    pub selected_scripts: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PromptResponse {
    pub prompt: String,
    pub estimated_tokens: usize,
}

/// POST /prompt - Gather live context and assemble the planner prompt.
///
/// Collaborator failures never fail the request; their sections are simply
/// left out of the prompt.
pub async fn prompt_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<PromptResponse>> {
    if request.message.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Message cannot be empty".to_string(),
        ));
    }

    let start = std::time::Instant::now();
    let prompt = state
        .build_prompt(&request.message, request.selected_scripts)
        .await;
    let prompt_chars = prompt.chars().count();

    metrics::counter!("prompt_builds_total").increment(1);
    metrics::histogram!("prompt_length_chars").record(prompt_chars as f64);

    tracing::info!(
        prompt_chars,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Planner prompt assembled"
    );

    Ok(Json(PromptResponse {
        estimated_tokens: estimate_tokens(&prompt),
        prompt,
    }))
}
