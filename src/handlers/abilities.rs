//! Ability discovery endpoints.
//!
//! Planners find abilities two ways: ranked keyword search, or browsing the
//! category tree like a filesystem. Both read the same registry snapshot.

use crate::abilities::{
    parse_abilities, Ability, AbilityCategory, AbilityPath, CategorySummary, SearchOutcome,
};
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    pub max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DirectoryParams {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ReplaceResponse {
    pub abilities: usize,
    pub categories: usize,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Serialize)]
pub struct DirectoryResponse {
    pub path: String,
    pub listing: String,
}

#[derive(Debug, Serialize)]
pub struct AbilityResponse {
    pub ability: Ability,
    pub path: AbilityPath,
    pub display_path: String,
}

/// PUT /abilities - Replace the corpus from an MCP `list_tools` response
/// or a bare array of tool descriptors.
pub async fn replace_abilities_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<ReplaceResponse>> {
    let abilities = parse_abilities(&body)?;
    let total = state.replace_abilities(abilities);
    let categories = state.abilities.read().catalog.categories().len();

    Ok(Json(ReplaceResponse {
        abilities: total,
        categories,
    }))
}

/// GET /abilities/search - Ranked keyword search. A blank query matches
/// nothing but still reports the corpus size.
pub async fn search_abilities_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchOutcome>> {
    let max_results = params
        .max_results
        .unwrap_or(state.config.default_max_results);
    if max_results == 0 {
        return Err(AppError::ValidationError(
            "max_results must be at least 1".to_string(),
        ));
    }

    let start = std::time::Instant::now();
    let outcome = state.abilities.read().index.search(&params.query, max_results);

    metrics::counter!("ability_search_requests_total").increment(1);
    metrics::histogram!("ability_search_matches").record(outcome.matches.len() as f64);

    tracing::debug!(
        query = %params.query,
        matches = outcome.matches.len(),
        total = outcome.total_available,
        elapsed_us = start.elapsed().as_micros() as u64,
        "Ability search completed"
    );

    Ok(Json(outcome))
}

/// GET /abilities/categories - Top-level categories with recursive counts.
pub async fn categories_handler(State(state): State<Arc<AppState>>) -> Json<CategoriesResponse> {
    let categories = state.abilities.read().catalog.categories();
    Json(CategoriesResponse { categories })
}

/// GET /abilities/categories/:name
pub async fn category_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<AbilityCategory>> {
    let category = state.abilities.read().catalog.category(&name).cloned();
    category
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Category not found: {}", name)))
}

/// GET /abilities/directory - Text listing of a category path.
pub async fn directory_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DirectoryParams>,
) -> Json<DirectoryResponse> {
    let listing = state.abilities.read().catalog.directory_listing(&params.path);
    Json(DirectoryResponse {
        path: params.path,
        listing,
    })
}

/// GET /abilities/:name - One ability with its catalog path.
pub async fn get_ability_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<AbilityResponse>> {
    let (ability, path) = state
        .abilities
        .read()
        .catalog
        .find_ability(&name)
        .ok_or_else(|| AppError::NotFound(format!("Ability not found: {}", name)))?;

    Ok(Json(AbilityResponse {
        display_path: path.display_path(),
        ability,
        path,
    }))
}
