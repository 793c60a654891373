//! Prompt assembly for the planner.
//!
//! The assembler is pure: it takes already-fetched [`ContextSources`] and
//! renders sections in a fixed order, skipping any section whose data is
//! missing. The ability catalog, instructions and user request are always
//! present, so a prompt can be built from no external data at all.

use crate::abilities::ingest::truncate_description;
use crate::abilities::{summarize_params, Ability};
use crate::context::sources::{ConnectedAccount, ContextSources, IntegrationSource};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Abilities described by the static catalog section.
pub const CORE_ABILITY_NAMES: &[&str] = &[
    "run-code",
    "fetch-url",
    "read-file",
    "write-file",
    "web-search",
    "search-abilities",
    "list-ability-directory",
];

const ABILITY_CATALOG: &str = "\
ABILITY CATALOG:
Abilities are organized like a filesystem (category/subcategory/ability).
Core abilities, always available:
- run-code: Execute code in the connected execution environment (inputs: code*, language)
- fetch-url: Fetch a URL over HTTP and return the response body (inputs: url*, method, headers, body)
- read-file: Read a file from the execution environment (inputs: path*)
- write-file: Write a file in the execution environment (inputs: path*, content*)
- web-search: Search the web for current information (inputs: query*)
- search-abilities: Find more abilities by natural-language query (inputs: query*, maxResults)
- list-ability-directory: Browse abilities by category path, e.g. \"github/codespaces\" (inputs: path)";

const INSTRUCTIONS: &str = "\
INSTRUCTIONS:
- Plan the smallest sequence of ability calls that fulfils the request.
- Pass the planning token with every ability call.
- Reference credentials only by the token names listed above; never ask for their values.
- Prefer connected accounts over asking the user to authenticate again, and follow any user notes attached to them.
- Every generated action is shown to the user for approval before it runs.";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountEntry<'a> {
    id: &'a str,
    app_slug: &'a str,
    display_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    healthy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_notes: Option<&'a str>,
}

pub struct ContextAssembler {
    core_names: BTreeSet<&'static str>,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextAssembler {
    pub fn new() -> Self {
        Self {
            core_names: CORE_ABILITY_NAMES.iter().copied().collect(),
        }
    }

    /// Whether an ability is already covered by the static catalog.
    pub fn is_core(&self, name: &str) -> bool {
        self.core_names.contains(name)
    }

    /// Render the full planner prompt. Never fails.
    pub fn build_prompt(&self, user_message: &str, sources: &ContextSources) -> String {
        let mut sections: Vec<String> = Vec::new();

        if let Some(token) = sources
            .planning_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
        {
            sections.push(format!(
                "PLANNING TOKEN: {}\nInclude this token in every ability call for this request.",
                token
            ));
        }

        if !sources.user_tokens.is_empty() {
            let mut section = String::from("AVAILABLE USER TOKENS:\n");
            for token in &sources.user_tokens {
                let _ = writeln!(section, "- {}", token);
            }
            sections.push(section.trim_end().to_string());
        }

        if let Some(info) = sources.codespace_info.as_ref().filter(|v| !is_blank_json(v)) {
            let rendered = serde_json::to_string_pretty(info).unwrap_or_else(|_| info.to_string());
            sections.push(format!("CODESPACE ENVIRONMENT:\n{}", rendered));
        }

        if let Some(connection) = &sources.executor_connection {
            if let Some(url) = connection.service_url() {
                let mut section = format!("EXECUTION SERVICE: {}", url);
                if let Some(target) = &connection.target {
                    let _ = write!(section, "\nTarget type: {}", target.target_type);
                    if let Some(name) = target.codespace_name.as_ref().or(target.name.as_ref()) {
                        let _ = write!(section, "\nTarget name: {}", name);
                    }
                }
                sections.push(section);
            }
        }

        if let Some(scripts) = sources
            .selected_scripts
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            sections.push(format!("SELECTED SCRIPTS:\n{}", scripts.trim_end()));
        }

        sections.push(ABILITY_CATALOG.to_string());

        let additional: Vec<&Ability> = sources
            .additional_tools
            .iter()
            .filter(|a| !self.is_core(&a.name))
            .collect();
        if !additional.is_empty() {
            let mut section = String::from("ADDITIONAL TOOLS:\n");
            for ability in additional {
                let _ = writeln!(
                    section,
                    "- {}: {} (inputs: {})",
                    ability.name,
                    truncate_description(ability.description_or_empty()),
                    summarize_params(ability)
                );
            }
            sections.push(section.trim_end().to_string());
        }

        for (source, accounts) in &sources.accounts {
            if accounts.is_empty() {
                continue;
            }
            sections.push(format!(
                "CONNECTED {} ACCOUNTS:\n{}",
                source.label(),
                render_accounts(*source, accounts, sources)
            ));
        }

        if let Some(previous) = sources
            .previous_results
            .as_deref()
            .filter(|p| !p.trim().is_empty())
        {
            sections.push(format!(
                "PREVIOUS EXECUTION DATA:\n{}",
                previous.trim_end()
            ));
        }

        sections.push(INSTRUCTIONS.to_string());
        sections.push(format!("USER REQUEST:\n{}", user_message));

        sections.join("\n\n")
    }
}

fn render_accounts(
    source: IntegrationSource,
    accounts: &[ConnectedAccount],
    sources: &ContextSources,
) -> String {
    let entries: Vec<AccountEntry<'_>> = accounts
        .iter()
        .map(|account| AccountEntry {
            id: &account.id,
            app_slug: &account.app_slug,
            display_name: &account.display_name,
            healthy: account.healthy,
            user_notes: sources.note_for(source, &account.app_slug),
        })
        .collect();

    serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
}

fn is_blank_json(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
