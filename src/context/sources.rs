//! External facts that feed prompt assembly, and the collaborators that
//! fetch them.

use crate::abilities::Ability;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Third-party integration platforms whose connected accounts are surfaced
/// to the planner. Declaration order is prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationSource {
    Pipedream,
    Composio,
}

impl IntegrationSource {
    pub const ALL: [IntegrationSource; 2] = [IntegrationSource::Pipedream, IntegrationSource::Composio];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationSource::Pipedream => "pipedream",
            IntegrationSource::Composio => "composio",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IntegrationSource::Pipedream => "PIPEDREAM",
            IntegrationSource::Composio => "COMPOSIO",
        }
    }
}

impl fmt::Display for IntegrationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegrationSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pipedream" => Ok(IntegrationSource::Pipedream),
            "composio" => Ok(IntegrationSource::Composio),
            other => Err(format!("Unknown integration source: {}", other)),
        }
    }
}

/// Key of a connector note: the integration plus the lowercased app slug.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteKey {
    pub source: IntegrationSource,
    pub app_slug: String,
}

impl NoteKey {
    pub fn new(source: IntegrationSource, app_slug: &str) -> Self {
        Self {
            source,
            app_slug: app_slug.trim().to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedAccount {
    pub id: String,
    #[serde(alias = "app_slug")]
    pub app_slug: String,
    #[serde(alias = "display_name", default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorTarget {
    #[serde(rename = "type")]
    pub target_type: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codespace_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConnection {
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ExecutorTarget>,
}

impl ExecutorConnection {
    /// The execution service URL, only when actually connected.
    pub fn service_url(&self) -> Option<&str> {
        if !self.connected {
            return None;
        }
        self.target
            .as_ref()
            .map(|t| t.url.as_str())
            .filter(|url| !url.trim().is_empty())
    }
}

/// Everything the assembler may put into a prompt. Any field may be empty;
/// empty fields simply drop their prompt section.
#[derive(Debug, Clone, Default)]
pub struct ContextSources {
    pub planning_token: Option<String>,
    /// Names of credentials the user has configured, never their values.
    pub user_tokens: Vec<String>,
    pub codespace_info: Option<Value>,
    pub executor_connection: Option<ExecutorConnection>,
    pub selected_scripts: Option<String>,
    pub additional_tools: Vec<Ability>,
    pub accounts: BTreeMap<IntegrationSource, Vec<ConnectedAccount>>,
    pub account_notes: BTreeMap<NoteKey, String>,
    /// Rendered extracted data from previous tool executions.
    pub previous_results: Option<String>,
}

impl ContextSources {
    pub fn note_for(&self, source: IntegrationSource, app_slug: &str) -> Option<&str> {
        self.account_notes
            .get(&NoteKey::new(source, app_slug))
            .map(String::as_str)
            .filter(|note| !note.trim().is_empty())
    }
}

#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Names of the credentials available to generated code.
    async fn available_tokens(&self) -> anyhow::Result<Vec<String>>;
}

#[async_trait]
pub trait EnvironmentSource: Send + Sync {
    /// Codespace/environment metadata: package manifest, environment
    /// variable names, documentation resources.
    async fn environment(&self) -> anyhow::Result<Option<Value>>;
}

#[async_trait]
pub trait ExecutorStatusSource: Send + Sync {
    async fn executor_status(&self) -> anyhow::Result<ExecutorConnection>;
}

#[async_trait]
pub trait AccountSource: Send + Sync {
    fn source(&self) -> IntegrationSource;

    async fn connected_accounts(&self) -> anyhow::Result<Vec<ConnectedAccount>>;
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn all_notes(&self) -> crate::Result<BTreeMap<NoteKey, String>>;

    async fn get_note(&self, key: &NoteKey) -> crate::Result<Option<String>>;

    /// Create or replace a note. A blank note removes the entry.
    async fn upsert_note(&self, key: NoteKey, note: &str) -> crate::Result<()>;

    /// Returns whether a note existed.
    async fn delete_note(&self, key: &NoteKey) -> crate::Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_note_key_lowercases_slug() {
        assert_eq!(
            NoteKey::new(IntegrationSource::Pipedream, " Slack "),
            NoteKey::new(IntegrationSource::Pipedream, "slack")
        );
    }

    #[test]
    fn test_integration_source_parsing() {
        assert_eq!("Composio".parse::<IntegrationSource>(), Ok(IntegrationSource::Composio));
        assert!("zapier".parse::<IntegrationSource>().is_err());
    }

    #[test]
    fn test_account_accepts_both_casings() {
        let camel: ConnectedAccount =
            serde_json::from_value(json!({ "id": "a1", "appSlug": "slack", "displayName": "Team" }))
                .unwrap();
        let snake: ConnectedAccount =
            serde_json::from_value(json!({ "id": "a1", "app_slug": "slack", "display_name": "Team" }))
                .unwrap();
        assert_eq!(camel, snake);
    }

    #[test]
    fn test_service_url_requires_connection() {
        let target = ExecutorTarget {
            target_type: "codespace".into(),
            url: "https://exec.example".into(),
            name: None,
            codespace_name: Some("cs-1".into()),
        };
        let connected = ExecutorConnection {
            connected: true,
            target: Some(target.clone()),
        };
        let disconnected = ExecutorConnection {
            connected: false,
            target: Some(target),
        };

        assert_eq!(connected.service_url(), Some("https://exec.example"));
        assert_eq!(disconnected.service_url(), None);
    }

    #[test]
    fn test_blank_note_is_not_returned() {
        let mut sources = ContextSources::default();
        sources
            .account_notes
            .insert(NoteKey::new(IntegrationSource::Composio, "github"), "  ".into());
        assert_eq!(sources.note_for(IntegrationSource::Composio, "GitHub"), None);
    }
}
