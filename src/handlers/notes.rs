use crate::context::{IntegrationSource, NoteKey};
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub note: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEntry {
    pub source: IntegrationSource,
    pub app_slug: String,
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct NotesResponse {
    pub notes: Vec<NoteEntry>,
}

fn note_key(source: &str, app_slug: &str) -> Result<NoteKey> {
    let source: IntegrationSource = source.parse().map_err(AppError::ValidationError)?;
    if app_slug.trim().is_empty() {
        return Err(AppError::ValidationError(
            "app_slug cannot be empty".to_string(),
        ));
    }
    Ok(NoteKey::new(source, app_slug))
}

/// GET /notes - All connector notes.
pub async fn list_notes_handler(State(state): State<Arc<AppState>>) -> Result<Json<NotesResponse>> {
    let notes = state
        .notes
        .all_notes()
        .await?
        .into_iter()
        .map(|(key, note)| NoteEntry {
            source: key.source,
            app_slug: key.app_slug,
            note,
        })
        .collect();

    Ok(Json(NotesResponse { notes }))
}

/// PUT /notes/:source/:app_slug - Create or replace a note. A blank note
/// removes it.
pub async fn put_note_handler(
    State(state): State<Arc<AppState>>,
    Path((source, app_slug)): Path<(String, String)>,
    Json(request): Json<NoteRequest>,
) -> Result<StatusCode> {
    let key = note_key(&source, &app_slug)?;
    state.notes.upsert_note(key, &request.note).await?;
    state.gatherer.invalidate();
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /notes/:source/:app_slug
pub async fn delete_note_handler(
    State(state): State<Arc<AppState>>,
    Path((source, app_slug)): Path<(String, String)>,
) -> Result<StatusCode> {
    let key = note_key(&source, &app_slug)?;
    if !state.notes.delete_note(&key).await? {
        return Err(AppError::NotFound(format!(
            "No note for {}/{}",
            key.source, key.app_slug
        )));
    }
    state.gatherer.invalidate();
    Ok(StatusCode::NO_CONTENT)
}
