//! Keyword extraction shared by query tokenization and index building.

use crate::abilities::types::Ability;
use std::collections::BTreeSet;

/// Words too common to carry any signal about what an ability does.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "are", "was", "were", "you", "your",
    "can", "into", "use", "using", "how", "what", "when", "where", "which", "who", "will",
    "would", "should", "could", "all", "any", "not", "but", "has", "have", "had", "its",
    "our", "out", "about", "then", "than", "there", "their", "them", "they", "been", "being",
    "also", "each", "some", "such", "only", "other", "over", "very", "just", "does", "did",
    "please", "want", "need", "like", "help", "make",
];

/// Lowercase, replace non-alphanumerics with spaces, split on whitespace,
/// drop tokens of two characters or fewer and stop words.
///
/// Tokens are returned in first-seen order without duplicates.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut seen = BTreeSet::new();
    normalized
        .split_whitespace()
        .filter(|token| token.chars().count() > 2)
        .filter(|token| !STOP_WORDS.contains(token))
        .filter(|token| seen.insert(token.to_string()))
        .map(str::to_string)
        .collect()
}

/// Keywords for one ability: its name, description, schema property names
/// and property descriptions, all run through [`tokenize`].
pub fn extract_keywords(ability: &Ability) -> BTreeSet<String> {
    let mut keywords = BTreeSet::new();

    keywords.extend(tokenize(&ability.name));
    keywords.extend(tokenize(ability.description_or_empty()));

    for (prop_name, entry) in &ability.input_schema.properties {
        keywords.extend(tokenize(prop_name));
        if let Some(desc) = &entry.description {
            keywords.extend(tokenize(desc));
        }
    }

    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_short_and_stop_words() {
        let tokens = tokenize("Show me the GitHub repos for my-org!");
        assert_eq!(tokens, vec!["show", "github", "repos", "org"]);
    }

    #[test]
    fn test_tokenize_deduplicates_in_order() {
        assert_eq!(tokenize("repo REPO repo code"), vec!["repo", "code"]);
    }

    #[test]
    fn test_tokenize_whitespace_only() {
        assert!(tokenize("   \t\n ").is_empty());
        assert!(tokenize("a an to").is_empty());
    }

    #[test]
    fn test_extract_keywords_covers_schema() {
        let ability = Ability::new("list-github-repos", "List repositories of a user")
            .with_property("owner", "string", "Account login name", true);

        let keywords = extract_keywords(&ability);
        for expected in ["list", "github", "repos", "repositories", "user", "owner", "account", "login", "name"] {
            assert!(keywords.contains(expected), "missing keyword {expected}");
        }
        assert!(!keywords.contains("of"));
    }
}
