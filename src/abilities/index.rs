//! Keyword search over the ability corpus.
//!
//! The index is rebuilt wholesale on every [`AbilityIndex::update_abilities`]
//! call; there is no incremental patching. Scoring is purely lexical:
//!
//! | signal                                              | points |
//! |-----------------------------------------------------|--------|
//! | lowercased name equals a query token                | 100    |
//! | query token is a substring of the name (per token)  | 50     |
//! | query token is a prefix of the name (per token)     | 25     |
//! | ability keyword related to a query token (per kw)   | 10     |

use crate::abilities::keywords::{extract_keywords, tokenize};
use crate::abilities::types::Ability;
use serde::Serialize;
use std::collections::BTreeSet;

const EXACT_NAME_SCORE: u32 = 100;
const NAME_CONTAINS_SCORE: u32 = 50;
const NAME_PREFIX_SCORE: u32 = 25;
const KEYWORD_SCORE: u32 = 10;

/// Default number of matches returned by a search.
pub const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct AbilityMatch {
    pub ability: Ability,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub matches: Vec<AbilityMatch>,
    pub total_available: usize,
    pub search_query: String,
}

struct IndexedAbility {
    ability: Ability,
    name_lower: String,
    keywords: BTreeSet<String>,
}

#[derive(Default)]
pub struct AbilityIndex {
    entries: Vec<IndexedAbility>,
    builtins: Vec<Ability>,
}

impl AbilityIndex {
    /// An empty index with no built-in abilities.
    pub fn new() -> Self {
        Self::default()
    }

    /// An index that always carries `builtins` in addition to whatever
    /// corpus the caller supplies. A built-in is skipped on rebuild when the
    /// corpus already has an ability of the same name.
    pub fn with_builtins(builtins: Vec<Ability>) -> Self {
        let mut index = Self {
            entries: Vec::new(),
            builtins,
        };
        index.update_abilities(Vec::new());
        index
    }

    /// Replace the corpus and rebuild all keyword entries.
    pub fn update_abilities(&mut self, abilities: Vec<Ability>) {
        let mut corpus = abilities;
        for builtin in &self.builtins {
            if !corpus.iter().any(|a| a.name == builtin.name) {
                corpus.push(builtin.clone());
            }
        }

        self.entries = corpus
            .into_iter()
            .map(|ability| IndexedAbility {
                name_lower: ability.name.to_lowercase(),
                keywords: extract_keywords(&ability),
                ability,
            })
            .collect();

        tracing::debug!(
            abilities = self.entries.len(),
            builtins = self.builtins.len(),
            "Ability index rebuilt"
        );
    }

    /// Rank abilities against a natural-language query.
    ///
    /// Results have a positive score, are sorted by non-increasing score with
    /// corpus order breaking ties, and are capped at `max_results`.
    pub fn search(&self, query: &str, max_results: usize) -> SearchOutcome {
        let tokens = tokenize(query);
        let total_available = self.entries.len();

        if tokens.is_empty() {
            return SearchOutcome {
                matches: Vec::new(),
                total_available,
                search_query: query.to_string(),
            };
        }

        let mut scored: Vec<(u32, &IndexedAbility)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let score = score_entry(entry, &tokens);
                (score > 0).then_some((score, entry))
            })
            .collect();

        // Stable sort keeps corpus order among ties.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let matches = scored
            .into_iter()
            .take(max_results)
            .map(|(score, entry)| AbilityMatch {
                ability: entry.ability.clone(),
                score,
            })
            .collect();

        SearchOutcome {
            matches,
            total_available,
            search_query: query.to_string(),
        }
    }

    pub fn abilities(&self) -> impl Iterator<Item = &Ability> {
        self.entries.iter().map(|e| &e.ability)
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.iter().any(|b| b.name == name)
    }

    /// Keywords of the first ability with this name.
    pub fn keywords_for(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.entries
            .iter()
            .find(|e| e.ability.name == name)
            .map(|e| &e.keywords)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn score_entry(entry: &IndexedAbility, tokens: &[String]) -> u32 {
    let name = entry.name_lower.as_str();
    let mut score = 0;

    if tokens.iter().any(|t| t == name) {
        score += EXACT_NAME_SCORE;
    }

    for token in tokens {
        if name.contains(token.as_str()) {
            score += NAME_CONTAINS_SCORE;
        }
        if name.starts_with(token.as_str()) {
            score += NAME_PREFIX_SCORE;
        }
    }

    let related = entry
        .keywords
        .iter()
        .filter(|kw| {
            tokens
                .iter()
                .any(|t| kw.contains(t.as_str()) || t.contains(kw.as_str()))
        })
        .count() as u32;

    score + related * KEYWORD_SCORE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Ability> {
        vec![
            Ability::new("run-code", "Execute a snippet in the sandbox")
                .with_property("source", "string", "Program text", true),
            Ability::new("list-github-repos", "Show repositories owned by a user")
                .with_property("owner", "string", "Account login", true),
            Ability::new("fetch-url", "Download a page over HTTP")
                .with_property("url", "string", "Address to download", true),
        ]
    }

    fn index_with(abilities: Vec<Ability>) -> AbilityIndex {
        let mut index = AbilityIndex::new();
        index.update_abilities(abilities);
        index
    }

    #[test]
    fn test_github_repo_query_prefers_name_match() {
        let index = index_with(corpus());
        let outcome = index.search("github repo", 5);

        assert_eq!(outcome.total_available, 3);
        assert_eq!(outcome.search_query, "github repo");
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].ability.name, "list-github-repos");
        assert!(outcome
            .matches
            .iter()
            .all(|m| m.ability.name != "run-code" && m.ability.name != "fetch-url"));
    }

    #[test]
    fn test_score_components() {
        let index = index_with(vec![Ability::new("deploy", "")]);

        // exact (100) + substring (50) + prefix (25) + keyword "deploy" (10)
        let outcome = index.search("deploy", 5);
        assert_eq!(outcome.matches[0].score, 185);

        // substring + prefix + keyword
        let outcome = index.search("dep", 5);
        assert_eq!(outcome.matches[0].score, 85);
    }

    #[test]
    fn test_keyword_relation_works_both_directions() {
        let index = index_with(vec![Ability::new("zzz", "Send notifications")]);

        // query token contains keyword
        assert_eq!(index.search("notificationsx", 5).matches[0].score, 10);
        // keyword contains query token
        assert_eq!(index.search("notif", 5).matches[0].score, 10);
    }

    #[test]
    fn test_empty_query_returns_no_matches() {
        let index = index_with(corpus());
        for query in ["", "   ", "to be or"] {
            let outcome = index.search(query, 5);
            assert!(outcome.matches.is_empty());
            assert_eq!(outcome.total_available, 3);
        }
    }

    #[test]
    fn test_empty_corpus() {
        let index = AbilityIndex::new();
        let outcome = index.search("anything useful", 5);
        assert_eq!(outcome.total_available, 0);
        assert!(outcome.matches.is_empty());
    }

    #[test]
    fn test_results_sorted_capped_and_positive() {
        let abilities: Vec<Ability> = (0..20)
            .map(|i| Ability::new(format!("file-tool-{i}"), "Handle file data"))
            .chain(std::iter::once(Ability::new("file", "Open file")))
            .collect();
        let index = index_with(abilities);

        let outcome = index.search("file", 4);
        assert_eq!(outcome.matches.len(), 4);
        assert_eq!(outcome.matches[0].ability.name, "file");
        assert!(outcome.matches.iter().all(|m| m.score > 0));
        assert!(outcome
            .matches
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let index = index_with(vec![
            Ability::new("alpha-report", ""),
            Ability::new("beta-report", ""),
            Ability::new("gamma-report", ""),
        ]);

        let names: Vec<String> = index
            .search("report", 5)
            .matches
            .into_iter()
            .map(|m| m.ability.name)
            .collect();
        assert_eq!(names, vec!["alpha-report", "beta-report", "gamma-report"]);
    }

    #[test]
    fn test_duplicate_names_score_independently() {
        let index = index_with(vec![Ability::new("run-code", ""), Ability::new("run-code", "")]);
        assert_eq!(index.search("run code", 5).matches.len(), 2);
    }

    #[test]
    fn test_builtins_appended_once() {
        let mut index = AbilityIndex::with_builtins(vec![Ability::web_search()]);
        assert_eq!(index.len(), 1);

        index.update_abilities(corpus());
        index.update_abilities(corpus());
        assert_eq!(index.len(), 4);
        assert_eq!(
            index.abilities().filter(|a| a.name == "web-search").count(),
            1
        );
        assert!(index.is_builtin("web-search"));
    }

    #[test]
    fn test_builtin_not_added_when_corpus_has_same_name() {
        let mut index = AbilityIndex::with_builtins(vec![Ability::web_search()]);
        index.update_abilities(vec![Ability::new("web-search", "Custom search")]);

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.abilities().next().and_then(|a| a.description.clone()),
            Some("Custom search".to_string())
        );
    }

    #[test]
    fn test_update_replaces_keywords() {
        let mut index = index_with(corpus());
        assert!(index.keywords_for("fetch-url").is_some());

        index.update_abilities(vec![Ability::new("trace-logs", "Tail service logs")]);
        assert!(index.keywords_for("fetch-url").is_none());
        assert!(index.keywords_for("trace-logs").unwrap().contains("tail"));
        assert!(index.search("fetch", 5).matches.is_empty());
    }
}
