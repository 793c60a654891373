//! Bounded store of recent tool execution results.
//!
//! Results are kept newest-first in a ring buffer. Each one carries a
//! deterministic summary so that, when rendered into prompt context under a
//! token budget, any entry can degrade from its full text to its summary.

use crate::results::extract::{estimate_tokens, extract_important_data, ExtractedImportantData};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt::Write;

pub const DEFAULT_MAX_STORED_RESULTS: usize = 10;
pub const DEFAULT_SUMMARIZE_THRESHOLD: usize = 25_000;
pub const DEFAULT_MAX_TOKENS_FOR_FULL_RESULT: usize = 25_000;

/// Appended once the context budget cannot fit even a summary.
pub const OMISSION_MARKER: &str =
    "[Older execution results omitted: context token budget exhausted]";

const PREVIEW_HEAD_CHARS: usize = 600;
const PREVIEW_TAIL_CHARS: usize = 200;

static SECRET_FIELD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)("[a-z0-9_\-]*(?:token|secret|password|api_?key|authorization)[a-z0-9_\-]*"\s*:\s*")[^"]*(")"#,
    )
    .expect("Invalid regex")
});
static BEARER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(bearer\s+)[A-Za-z0-9\-._~+/]+=*").expect("Invalid regex")
});

#[derive(Debug, Clone, Serialize)]
pub struct StoredResult {
    pub id: String,
    pub tool_name: String,
    pub timestamp: DateTime<Utc>,
    pub full_result: String,
    pub summary: String,
    pub token_count: usize,
    pub was_summarized: bool,
    pub extracted_data: ExtractedImportantData,
}

pub struct ResultStore {
    results: VecDeque<StoredResult>,
    max_stored_results: usize,
    summarize_threshold: usize,
    max_tokens_for_full_result: usize,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_STORED_RESULTS,
            DEFAULT_SUMMARIZE_THRESHOLD,
            DEFAULT_MAX_TOKENS_FOR_FULL_RESULT,
        )
    }
}

impl ResultStore {
    /// `max_stored_results` is clamped to at least one entry.
    pub fn new(
        max_stored_results: usize,
        summarize_threshold: usize,
        max_tokens_for_full_result: usize,
    ) -> Self {
        let max_stored_results = max_stored_results.max(1);
        Self {
            results: VecDeque::with_capacity(max_stored_results + 1),
            max_stored_results,
            summarize_threshold,
            max_tokens_for_full_result,
        }
    }

    /// Record a tool's raw output, evicting the oldest entries beyond capacity.
    pub fn store_result(&mut self, tool_name: &str, raw_result: &str) -> StoredResult {
        let token_count = estimate_tokens(raw_result);
        let was_summarized = token_count > self.summarize_threshold;
        let extracted_data = extract_important_data(raw_result);
        let summary = build_summary(tool_name, raw_result, token_count, &extracted_data);

        let stored = StoredResult {
            id: uuid::Uuid::new_v4().to_string(),
            tool_name: tool_name.to_string(),
            timestamp: Utc::now(),
            full_result: raw_result.to_string(),
            summary,
            token_count,
            was_summarized,
            extracted_data,
        };

        self.results.push_front(stored.clone());
        self.results.truncate(self.max_stored_results);

        tracing::debug!(
            tool = tool_name,
            token_count,
            was_summarized,
            stored = self.results.len(),
            "Tool result stored"
        );

        stored
    }

    /// Stored results, newest first.
    pub fn results(&self) -> impl Iterator<Item = &StoredResult> {
        self.results.iter()
    }

    pub fn get(&self, id: &str) -> Option<&StoredResult> {
        self.results.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }

    /// Render every stored result, newest first, under the token budget.
    ///
    /// Full text is used while it fits. The first entry that does not fit,
    /// and every entry after it, falls back to its summary. Once a summary
    /// does not fit either, [`OMISSION_MARKER`] is appended and rendering
    /// stops.
    pub fn all_results_for_context(&self) -> String {
        let mut out = String::new();
        let mut used = 0usize;
        let mut degraded = false;

        for (position, result) in self.results.iter().enumerate() {
            if !degraded
                && !result.was_summarized
                && used + result.token_count <= self.max_tokens_for_full_result
            {
                used += result.token_count;
                write_entry(&mut out, position, result, &result.full_result, false);
                continue;
            }

            if !result.was_summarized {
                degraded = true;
            }

            let summary_tokens = estimate_tokens(&result.summary);
            if used + summary_tokens > self.max_tokens_for_full_result {
                let _ = writeln!(out, "{}", OMISSION_MARKER);
                break;
            }
            used += summary_tokens;
            write_entry(&mut out, position, result, &result.summary, true);
        }

        out
    }

    /// Extracted data merged across all stored results, newest first.
    /// Empty when nothing worth reporting was found.
    pub fn extracted_data_summary(&self) -> String {
        let mut merged = ExtractedImportantData::default();
        for result in &self.results {
            merged.merge(&result.extracted_data);
        }
        if merged.is_empty() {
            return String::new();
        }
        merged.render()
    }

    /// Merged extracted data, for callers that want structure over text.
    pub fn extracted_data(&self) -> ExtractedImportantData {
        let mut merged = ExtractedImportantData::default();
        for result in &self.results {
            merged.merge(&result.extracted_data);
        }
        merged
    }
}

fn write_entry(out: &mut String, position: usize, result: &StoredResult, body: &str, summarized: bool) {
    let _ = writeln!(
        out,
        "--- Result {} | {} | {}{} ---",
        position + 1,
        result.tool_name,
        result.timestamp.to_rfc3339(),
        if summarized { " | summarized" } else { "" }
    );
    let _ = writeln!(out, "{}", body.trim_end());
    out.push('\n');
}

fn build_summary(
    tool_name: &str,
    raw: &str,
    token_count: usize,
    extracted: &ExtractedImportantData,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "[Summary of {} output: ~{} tokens, {} characters]",
        tool_name,
        token_count,
        raw.chars().count()
    );
    out.push_str(&extracted.render());

    let redacted = redact_secrets(raw);
    let total = redacted.chars().count();
    if total <= PREVIEW_HEAD_CHARS + PREVIEW_TAIL_CHARS {
        let _ = writeln!(out, "Preview:\n{}", redacted.trim_end());
    } else {
        let head: String = redacted.chars().take(PREVIEW_HEAD_CHARS).collect();
        let tail: String = redacted.chars().skip(total - PREVIEW_TAIL_CHARS).collect();
        let _ = writeln!(
            out,
            "Preview (start):\n{}\n... [{} characters omitted] ...\nPreview (end):\n{}",
            head,
            total - PREVIEW_HEAD_CHARS - PREVIEW_TAIL_CHARS,
            tail
        );
    }
    out
}

/// Blank out values of secret-looking JSON fields and bearer tokens.
fn redact_secrets(text: &str) -> String {
    let text = SECRET_FIELD_REGEX.replace_all(text, "${1}[REDACTED]${2}");
    BEARER_REGEX
        .replace_all(&text, "${1}[REDACTED]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_keeps_most_recent() {
        let mut store = ResultStore::new(3, DEFAULT_SUMMARIZE_THRESHOLD, DEFAULT_MAX_TOKENS_FOR_FULL_RESULT);
        for i in 0..5 {
            store.store_result("tool", &format!("output {i}"));
            assert!(store.len() <= 3);
        }

        let kept: Vec<&str> = store.results().map(|r| r.full_result.as_str()).collect();
        assert_eq!(kept, vec!["output 4", "output 3", "output 2"]);
    }

    #[test]
    fn test_zero_capacity_clamped_to_one() {
        let mut store = ResultStore::new(0, 10, 10);
        store.store_result("a", "1");
        store.store_result("b", "2");
        assert_eq!(store.len(), 1);
        assert_eq!(store.results().next().unwrap().tool_name, "b");
    }

    #[test]
    fn test_large_result_is_summarized() {
        let mut store = ResultStore::new(10, 100, 1_000);
        let raw = format!("{}\nError: disk full", "x".repeat(2_000));

        let stored = store.store_result("build", &raw);
        assert!(stored.was_summarized);
        assert_ne!(stored.summary, stored.full_result);
        assert!(stored.summary.contains("Error: disk full"));
        assert!(stored.summary.contains("characters omitted"));
        assert_eq!(stored.token_count, estimate_tokens(&raw));
    }

    #[test]
    fn test_small_result_is_not_summarized() {
        let mut store = ResultStore::default();
        let stored = store.store_result("echo", "hello");
        assert!(!stored.was_summarized);
        assert_eq!(stored.token_count, 2);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut store = ResultStore::new(10, 5, 1_000);
        assert!(!store.store_result("t", &"a".repeat(20)).was_summarized);
        assert!(store.store_result("t", &"a".repeat(21)).was_summarized);
    }

    #[test]
    fn test_summary_redacts_secret_values() {
        let mut store = ResultStore::new(10, 1, 1_000);
        let raw = r#"{"access_token": "ghp_supersecret", "status": "ok"} Authorization: Bearer abc.def"#;

        let stored = store.store_result("auth", raw);
        assert!(!stored.summary.contains("ghp_supersecret"));
        assert!(!stored.summary.contains("abc.def"));
        assert!(stored.summary.contains("contains access_token reference"));
    }

    #[test]
    fn test_context_degrades_older_results_to_summaries() {
        // Each result is 500 tokens; budget fits two in full.
        let mut store = ResultStore::new(10, 25_000, 1_300);
        store.store_result("oldest", &"a".repeat(2_000));
        store.store_result("middle", &"b".repeat(2_000));
        store.store_result("newest", &"c".repeat(2_000));

        let context = store.all_results_for_context();
        assert!(context.contains(&"c".repeat(2_000)));
        assert!(context.contains(&"b".repeat(2_000)));
        assert!(!context.contains(&"a".repeat(2_000)));
        assert!(context.contains("[Summary of oldest output"));
        assert!(!context.contains(OMISSION_MARKER));

        let newest = context.find("newest").unwrap();
        let oldest = context.find("oldest").unwrap();
        assert!(newest < oldest);
    }

    #[test]
    fn test_context_stops_with_marker_when_summaries_overflow() {
        let mut store = ResultStore::new(10, 25_000, 600);
        store.store_result("first", &"a".repeat(2_000));
        store.store_result("second", &"b".repeat(2_000));
        store.store_result("third", &"c".repeat(2_000));

        let context = store.all_results_for_context();
        assert!(context.contains(&"c".repeat(2_000)));
        assert!(context.trim_end().ends_with(OMISSION_MARKER));
        assert!(!context.contains("first"));
        assert_eq!(context.matches(OMISSION_MARKER).count(), 1);
    }

    #[test]
    fn test_context_uses_summary_for_summarized_entries() {
        let mut store = ResultStore::new(10, 100, 25_000);
        store.store_result("huge", &"z".repeat(1_000));

        let context = store.all_results_for_context();
        assert!(context.contains("| summarized"));
        assert!(!context.contains(&"z".repeat(1_000)));
    }

    #[test]
    fn test_empty_store_renders_nothing() {
        let store = ResultStore::default();
        assert!(store.all_results_for_context().is_empty());
        assert!(store.extracted_data_summary().is_empty());
    }

    #[test]
    fn test_extracted_data_summary_merges_results() {
        let mut store = ResultStore::default();
        store.store_result("a", "workspace 550e8400-e29b-41d4-a716-446655440000");
        store.store_result("b", "see https://example.com/docs");

        let summary = store.extracted_data_summary();
        assert!(summary.contains("550e8400-e29b-41d4-a716-446655440000"));
        assert!(summary.contains("https://example.com/docs"));
        assert_eq!(store.extracted_data().urls.len(), 1);
    }

    #[test]
    fn test_get_by_id() {
        let mut store = ResultStore::default();
        let stored = store.store_result("a", "1");
        assert_eq!(store.get(&stored.id).map(|r| r.tool_name.as_str()), Some("a"));
        assert!(store.get("missing").is_none());
    }
}
