//! Ability ingestion from MCP `list_tools` payloads.
//!
//! Accepts either a full JSON-RPC response (`result.tools`), a bare
//! `{ "tools": [...] }` object, or a plain array of tool descriptors.
//! Also renders the compact parameter summaries used in prompts.

use crate::abilities::types::{Ability, SchemaEntry};
use crate::error::{AppError, Result};
use serde_json::Value;
use std::path::Path;

/// Maximum description length before truncation
const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Maximum parameter description length for the summary
const MAX_PARAM_DESC_LENGTH: usize = 50;

/// Parse abilities out of an MCP tool listing.
///
/// # Errors
/// Returns `AppError::ValidationError` if no tool array can be found, or if
/// every entry is malformed. Individual malformed tools are logged and
/// skipped (partial success model).
pub fn parse_abilities(json: &Value) -> Result<Vec<Ability>> {
    let tools_array = extract_tools_array(json)?;

    let mut results = Vec::with_capacity(tools_array.len());

    for (idx, tool_value) in tools_array.iter().enumerate() {
        match serde_json::from_value::<Ability>(tool_value.clone()) {
            Ok(ability) if ability.name.trim().is_empty() => {
                tracing::warn!(index = idx, "Skipping ability with empty name");
            }
            Ok(ability) => results.push(ability),
            Err(e) => {
                tracing::warn!(
                    index = idx,
                    error = %e,
                    "Skipping malformed ability definition"
                );
            }
        }
    }

    if results.is_empty() && !tools_array.is_empty() {
        return Err(AppError::ValidationError(
            "All ability definitions failed to parse".into(),
        ));
    }

    tracing::debug!(
        total = tools_array.len(),
        parsed = results.len(),
        "Ability ingestion complete"
    );

    Ok(results)
}

/// Read and parse an ability listing from disk.
pub fn load_abilities_file(path: &Path) -> Result<Vec<Ability>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::StorageError(format!(
            "Failed to read abilities file {}: {}",
            path.display(),
            e
        ))
    })?;
    let json: Value = serde_json::from_str(&raw)?;
    let abilities = parse_abilities(&json)?;

    tracing::info!(
        path = %path.display(),
        count = abilities.len(),
        "Abilities loaded from file"
    );

    Ok(abilities)
}

/// Navigates `result.tools`, then `tools`, then accepts a bare array.
fn extract_tools_array(json: &Value) -> Result<&Vec<Value>> {
    json.get("result")
        .and_then(|r| r.get("tools"))
        .or_else(|| json.get("tools"))
        .unwrap_or(json)
        .as_array()
        .ok_or_else(|| {
            AppError::ValidationError(
                "Expected 'result.tools', 'tools' or a top-level array of abilities".into(),
            )
        })
}

/// Truncate description to MAX_DESCRIPTION_LENGTH characters with ellipsis.
///
/// Attempts to truncate at a word boundary when possible.
pub fn truncate_description(desc: &str) -> String {
    if desc.chars().count() <= MAX_DESCRIPTION_LENGTH {
        return desc.to_string();
    }

    let truncated: String = desc.chars().take(MAX_DESCRIPTION_LENGTH).collect();

    match truncated.rfind(' ') {
        Some(pos) if pos > truncated.len().saturating_sub(50) => {
            format!("{}...", &truncated[..pos])
        }
        _ => format!("{}...", truncated),
    }
}

/// Build parameter summary from the ability's input schema.
///
/// Format: "param1*: type (desc), param2: type"
/// Required parameters are marked with an asterisk (*).
pub fn summarize_params(ability: &Ability) -> String {
    let schema = &ability.input_schema;
    if schema.properties.is_empty() {
        return "none".to_string();
    }

    let params: Vec<String> = schema
        .properties
        .iter()
        .map(|(name, entry)| format_param(name, entry, schema.required.contains(name)))
        .collect();

    params.join(", ")
}

/// Format a single parameter for the summary.
fn format_param(name: &str, entry: &SchemaEntry, is_required: bool) -> String {
    let brief_desc: String = entry
        .description
        .as_deref()
        .map(|d| {
            // First sentence, capped at MAX_PARAM_DESC_LENGTH chars
            let sentence = d.split('.').next().unwrap_or("");
            sentence.chars().take(MAX_PARAM_DESC_LENGTH).collect()
        })
        .unwrap_or_default();

    let req_marker = if is_required { "*" } else { "" };

    if brief_desc.trim().is_empty() {
        format!("{}{}: {}", name, req_marker, entry.type_label())
    } else {
        format!(
            "{}{}: {} ({})",
            name,
            req_marker,
            entry.type_label(),
            brief_desc.trim()
        )
    }
}
