//! Best-effort regex extraction of the parts of a tool result worth keeping.
//!
//! Nothing here can fail: a pattern with no matches contributes an empty
//! list. Credential handling only ever records that an indicator was seen,
//! never the value next to it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Cap per extracted list so a huge result cannot balloon the summary.
const MAX_ITEMS_PER_KIND: usize = 25;
const MAX_KEY_VALUES: usize = 30;
const MAX_VALUE_CHARS: usize = 200;

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b")
        .expect("Invalid regex")
});
static OBJECT_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9a-fA-F]{24}\b").expect("Invalid regex"));
static ID_FIELD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)"([a-z0-9_\-]*id)"\s*:\s*(?:"([^"]{1,200})"|(\d+))"#).expect("Invalid regex")
});
static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s"'<>)\]}]+"#).expect("Invalid regex"));
static API_PATH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:^|[\s"'(=])(/(?:api|v\d+)/[A-Za-z0-9_\-./{}:]*)"#).expect("Invalid regex")
});
static STRING_PAIR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""([A-Za-z0-9_\-]+)"\s*:\s*"([^"]*)""#).expect("Invalid regex")
});
static ERROR_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)"error"\s*:\s*"[^"]+""#,
        r"(?i)[a-z]*error:[^\n]+",
        r"(?i)\bfailed:[^\n]+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid regex"))
    .collect()
});
static SUCCESS_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)"success"\s*:\s*true"#,
        r"(?i)\b(?:successfully|succeeded|created|completed|deployed|saved)\b[^\n]{0,80}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid regex"))
    .collect()
});

/// Substrings whose presence means the result references a credential.
const CREDENTIAL_INDICATORS: &[&str] = &[
    "api_key",
    "apikey",
    "access_token",
    "refresh_token",
    "client_secret",
    "private_key",
    "password",
    "bearer",
    "authorization",
    "secret",
    "token",
];

const IMPORTANT_KEYS: &[&str] = &[
    "name",
    "title",
    "email",
    "status",
    "state",
    "type",
    "login",
    "username",
    "full_name",
    "display_name",
    "owner",
    "repository",
    "branch",
    "version",
    "message",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedImportantData {
    pub ids: Vec<String>,
    pub urls: Vec<String>,
    pub api_endpoints: Vec<String>,
    pub credentials: Vec<String>,
    pub key_value_pairs: BTreeMap<String, String>,
    pub error_messages: Vec<String>,
    pub success_indicators: Vec<String>,
}

impl ExtractedImportantData {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
            && self.urls.is_empty()
            && self.api_endpoints.is_empty()
            && self.credentials.is_empty()
            && self.key_value_pairs.is_empty()
            && self.error_messages.is_empty()
            && self.success_indicators.is_empty()
    }

    /// Fold `other` in, keeping first occurrences and the per-kind caps.
    pub fn merge(&mut self, other: &ExtractedImportantData) {
        extend_unique(&mut self.ids, other.ids.iter().cloned());
        extend_unique(&mut self.urls, other.urls.iter().cloned());
        extend_unique(&mut self.api_endpoints, other.api_endpoints.iter().cloned());
        extend_unique(&mut self.credentials, other.credentials.iter().cloned());
        extend_unique(&mut self.error_messages, other.error_messages.iter().cloned());
        extend_unique(
            &mut self.success_indicators,
            other.success_indicators.iter().cloned(),
        );
        for (key, value) in &other.key_value_pairs {
            if self.key_value_pairs.len() >= MAX_KEY_VALUES {
                break;
            }
            self.key_value_pairs
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Plain-text rendering with one block per non-empty kind.
    pub fn render(&self) -> String {
        let mut out = String::new();
        write_list(&mut out, "Errors", &self.error_messages);
        write_list(&mut out, "Success indicators", &self.success_indicators);
        write_inline(&mut out, "IDs", &self.ids);
        write_inline(&mut out, "URLs", &self.urls);
        write_inline(&mut out, "API endpoints", &self.api_endpoints);
        if !self.key_value_pairs.is_empty() {
            let _ = writeln!(out, "Key data:");
            for (key, value) in &self.key_value_pairs {
                let _ = writeln!(out, "  - {}: {}", key, value);
            }
        }
        write_list(&mut out, "Credential references", &self.credentials);
        out
    }
}

/// Estimated token count: one token per four characters, rounded up.
///
/// This is a deliberate approximation, not a tokenizer. Every budget in
/// the crate is calibrated against it.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

pub fn extract_important_data(text: &str) -> ExtractedImportantData {
    let mut data = ExtractedImportantData::default();

    extend_unique(
        &mut data.ids,
        UUID_REGEX.find_iter(text).map(|m| m.as_str().to_string()),
    );
    extend_unique(
        &mut data.ids,
        OBJECT_ID_REGEX.find_iter(text).map(|m| m.as_str().to_string()),
    );
    extend_unique(
        &mut data.ids,
        ID_FIELD_REGEX
            .captures_iter(text)
            .filter_map(|c| c.get(2).or_else(|| c.get(3)))
            .map(|m| m.as_str().to_string()),
    );

    extend_unique(
        &mut data.urls,
        URL_REGEX
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':']).to_string()),
    );

    extend_unique(
        &mut data.api_endpoints,
        API_PATH_REGEX
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim_end_matches(['.', ',', ':']).to_string()),
    );

    for caps in STRING_PAIR_REGEX.captures_iter(text) {
        if data.key_value_pairs.len() >= MAX_KEY_VALUES {
            break;
        }
        let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let value = value.as_str().trim();
        if value.is_empty() || !is_important_key(key.as_str()) {
            continue;
        }
        data.key_value_pairs
            .entry(key.as_str().to_string())
            .or_insert_with(|| clip(value));
    }

    let lower = text.to_lowercase();
    extend_unique(
        &mut data.credentials,
        CREDENTIAL_INDICATORS
            .iter()
            .filter(|indicator| lower.contains(*indicator))
            .map(|indicator| format!("contains {} reference", indicator)),
    );

    for regex in ERROR_REGEXES.iter() {
        extend_unique(
            &mut data.error_messages,
            regex.find_iter(text).map(|m| clip(m.as_str().trim())),
        );
    }
    for regex in SUCCESS_REGEXES.iter() {
        extend_unique(
            &mut data.success_indicators,
            regex.find_iter(text).map(|m| clip(m.as_str().trim())),
        );
    }

    data
}

fn is_important_key(key: &str) -> bool {
    let key = key.to_lowercase();
    if key.contains("token") || key.contains("secret") || key.contains("password") {
        return false;
    }
    IMPORTANT_KEYS.contains(&key.as_str())
        || key == "id"
        || key.ends_with("_id")
        || (key.ends_with("id") && key.len() > 2)
        || key.ends_with("url")
        || key.ends_with("uri")
        || key.ends_with("link")
        || key == "href"
}

fn extend_unique(target: &mut Vec<String>, items: impl Iterator<Item = String>) {
    for item in items {
        if target.len() >= MAX_ITEMS_PER_KIND {
            break;
        }
        if !item.is_empty() && !target.contains(&item) {
            target.push(item);
        }
    }
}

fn clip(value: &str) -> String {
    if value.chars().count() <= MAX_VALUE_CHARS {
        value.to_string()
    } else {
        let head: String = value.chars().take(MAX_VALUE_CHARS).collect();
        format!("{}...", head)
    }
}

fn write_inline(out: &mut String, label: &str, items: &[String]) {
    if !items.is_empty() {
        let _ = writeln!(out, "{}: {}", label, items.join(", "));
    }
}

fn write_list(out: &mut String, label: &str, items: &[String]) {
    if !items.is_empty() {
        let _ = writeln!(out, "{}:", label);
        for item in items {
            let _ = writeln!(out, "  - {}", item);
        }
    }
}
