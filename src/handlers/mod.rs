pub mod abilities;
pub mod health;
pub mod messages;
pub mod notes;
pub mod prompt;
pub mod results;

pub use abilities::{
    categories_handler, category_handler, directory_handler, get_ability_handler,
    replace_abilities_handler, search_abilities_handler,
};
pub use health::{health_handler, ready_handler};
pub use messages::route_message_handler;
pub use notes::{delete_note_handler, list_notes_handler, put_note_handler};
pub use prompt::prompt_handler;
pub use results::{extracted_handler, results_context_handler, store_result_handler};

use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// All API routes except `/metrics`, which needs the recorder handle.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/abilities", put(replace_abilities_handler))
        .route("/abilities/search", get(search_abilities_handler))
        .route("/abilities/categories", get(categories_handler))
        .route("/abilities/categories/:name", get(category_handler))
        .route("/abilities/directory", get(directory_handler))
        .route("/abilities/:name", get(get_ability_handler))
        .route("/results", post(store_result_handler))
        .route("/results/context", get(results_context_handler))
        .route("/results/extracted", get(extracted_handler))
        .route("/prompt", post(prompt_handler))
        .route("/notes", get(list_notes_handler))
        .route(
            "/notes/:source/:app_slug",
            put(put_note_handler).delete(delete_note_handler),
        )
        .route("/messages", post(route_message_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(state)
}
