//! Hierarchical, filesystem-style classification of abilities.
//!
//! Classification looks at the lowercased ability name only and walks an
//! ordered rule list; the first rule with a matching trigger wins. Names
//! matching no rule land in `utilities/misc`.

use crate::abilities::types::{Ability, AbilityPath};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

struct Refinement {
    triggers: &'static [&'static str],
    subcategory: &'static str,
}

struct Rule {
    category: &'static str,
    triggers: &'static [&'static str],
    refinements: &'static [Refinement],
    fallback: &'static str,
}

const FALLBACK_CATEGORY: &str = "utilities";
const FALLBACK_SUBCATEGORY: &str = "misc";

const RULES: &[Rule] = &[
    Rule {
        category: "github",
        triggers: &["github", "git", "codespace", "repo"],
        refinements: &[
            Refinement { triggers: &["codespace"], subcategory: "codespaces" },
            Refinement { triggers: &["workflow", "action"], subcategory: "workflows" },
        ],
        fallback: "repos",
    },
    Rule {
        category: "files",
        triggers: &["file", "read", "write", "edit"],
        refinements: &[Refinement { triggers: &["app", "template"], subcategory: "app-management" }],
        fallback: "operations",
    },
    Rule {
        category: "execution",
        triggers: &["run", "execute", "build", "command"],
        refinements: &[Refinement { triggers: &["background", "job"], subcategory: "background" }],
        fallback: "direct",
    },
    Rule {
        category: "web",
        triggers: &["fetch", "web", "http", "url"],
        refinements: &[],
        fallback: "requests",
    },
    Rule {
        category: "discovery",
        triggers: &["search", "find", "list", "get"],
        refinements: &[Refinement { triggers: &["api", "service"], subcategory: "api" }],
        fallback: "general",
    },
    Rule {
        category: "planning",
        triggers: &["plan", "todo", "task"],
        refinements: &[],
        fallback: "tasks",
    },
    Rule {
        category: "debug",
        triggers: &["debug", "monitor", "log", "trace"],
        refinements: &[],
        fallback: "monitoring",
    },
];

/// Category and subcategory for an ability name.
pub fn classify(name: &str) -> (&'static str, &'static str) {
    let lower = name.to_lowercase();
    let contains_any = |triggers: &[&str]| triggers.iter().any(|t| lower.contains(t));

    RULES
        .iter()
        .find(|rule| contains_any(rule.triggers))
        .map(|rule| {
            let sub = rule
                .refinements
                .iter()
                .find(|r| contains_any(r.triggers))
                .map_or(rule.fallback, |r| r.subcategory);
            (rule.category, sub)
        })
        .unwrap_or((FALLBACK_CATEGORY, FALLBACK_SUBCATEGORY))
}

fn category_description(category: &str) -> &'static str {
    match category {
        "github" => "GitHub repositories, codespaces and workflow automation",
        "files" => "Reading, writing and editing files and app templates",
        "execution" => "Running code, commands and builds",
        "web" => "HTTP requests and web content retrieval",
        "discovery" => "Searching, listing and looking up resources",
        "planning" => "Task planning and todo tracking",
        "debug" => "Debugging, monitoring, logs and traces",
        _ => "General purpose utilities",
    }
}

fn subcategory_description(category: &str, subcategory: &str) -> &'static str {
    match (category, subcategory) {
        ("github", "codespaces") => "Create, inspect and manage GitHub Codespaces",
        ("github", "workflows") => "GitHub Actions workflows and runs",
        ("github", "repos") => "Repository contents, branches and metadata",
        ("files", "app-management") => "Application scaffolding and templates",
        ("files", "operations") => "Basic file reads, writes and edits",
        ("execution", "background") => "Long-running background jobs",
        ("execution", "direct") => "Immediate code and command execution",
        ("web", "requests") => "Fetching URLs and calling HTTP endpoints",
        ("discovery", "api") => "Discovering APIs and connected services",
        ("discovery", "general") => "General search and listing",
        ("planning", "tasks") => "Plans, tasks and todo lists",
        ("debug", "monitoring") => "Logs, traces and runtime monitoring",
        _ => "Miscellaneous abilities",
    }
}

/// Position of a category in rule order; unknown categories sort last.
fn category_rank(category: &str) -> usize {
    RULES
        .iter()
        .position(|r| r.category == category)
        .unwrap_or(RULES.len())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbilityCategory {
    pub name: String,
    pub description: String,
    pub abilities: Vec<Ability>,
    pub subcategories: BTreeMap<String, AbilityCategory>,
}

impl AbilityCategory {
    fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            abilities: Vec::new(),
            subcategories: BTreeMap::new(),
        }
    }

    /// Abilities in this node and every descendant, recomputed on each call.
    pub fn ability_count(&self) -> usize {
        self.abilities.len()
            + self
                .subcategories
                .values()
                .map(AbilityCategory::ability_count)
                .sum::<usize>()
    }

    fn collect_abilities(&self, out: &mut Vec<Ability>) {
        out.extend(self.abilities.iter().cloned());
        for sub in self.subcategories.values() {
            sub.collect_abilities(out);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub description: String,
    pub ability_count: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AbilityCatalog {
    /// Top-level categories in rule order.
    categories: Vec<AbilityCategory>,
    paths: HashMap<String, AbilityPath>,
}

impl AbilityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset and rebuild the category tree from scratch.
    pub fn organize_abilities(&mut self, abilities: &[Ability]) {
        self.categories.clear();
        self.paths.clear();

        for ability in abilities {
            let (category, subcategory) = classify(&ability.name);

            let idx = match self.categories.iter().position(|c| c.name == category) {
                Some(idx) => idx,
                None => {
                    self.categories
                        .push(AbilityCategory::new(category, category_description(category)));
                    self.categories.len() - 1
                }
            };

            self.categories[idx]
                .subcategories
                .entry(subcategory.to_string())
                .or_insert_with(|| {
                    AbilityCategory::new(
                        subcategory,
                        subcategory_description(category, subcategory),
                    )
                })
                .abilities
                .push(ability.clone());

            // First occurrence wins for duplicate names.
            self.paths
                .entry(ability.name.clone())
                .or_insert_with(|| AbilityPath {
                    category: category.to_string(),
                    subcategory: Some(subcategory.to_string()),
                    ability_name: ability.name.clone(),
                });
        }

        self.categories.sort_by_key(|c| category_rank(&c.name));

        tracing::debug!(
            abilities = abilities.len(),
            categories = self.categories.len(),
            "Ability catalog organized"
        );
    }

    pub fn categories(&self) -> Vec<CategorySummary> {
        self.categories
            .iter()
            .map(|c| CategorySummary {
                name: c.name.clone(),
                description: c.description.clone(),
                ability_count: c.ability_count(),
            })
            .collect()
    }

    pub fn category(&self, name: &str) -> Option<&AbilityCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Abilities in `category` and all its subcategories. Unknown categories
    /// yield an empty list.
    pub fn abilities_by_category(&self, category: &str) -> Vec<Ability> {
        let mut out = Vec::new();
        if let Some(node) = self.category(category) {
            node.collect_abilities(&mut out);
        }
        out
    }

    pub fn find_ability(&self, name: &str) -> Option<(Ability, AbilityPath)> {
        let path = self.paths.get(name)?;
        let node = self.category(&path.category)?;
        let node = match &path.subcategory {
            Some(sub) => node.subcategories.get(sub)?,
            None => node,
        };
        let ability = node.abilities.iter().find(|a| a.name == name)?;
        Some((ability.clone(), path.clone()))
    }

    /// Human-readable listing of the root, a category or a subcategory.
    ///
    /// Paths are slash separated and may carry leading/trailing slashes,
    /// e.g. `""`, `"/"`, `"github"`, `"/github/repos/"`.
    pub fn directory_listing(&self, path: &str) -> String {
        let parts: Vec<&str> = path
            .split('/')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        let mut out = String::new();
        match parts.as_slice() {
            [] => {
                let _ = writeln!(out, "/");
                for category in &self.categories {
                    let _ = writeln!(
                        out,
                        "  {}/ ({} abilities) - {}",
                        category.name,
                        category.ability_count(),
                        category.description
                    );
                }
                if self.categories.is_empty() {
                    let _ = writeln!(out, "  (empty)");
                }
            }
            [category] => match self.category(category) {
                Some(node) => {
                    let _ = writeln!(out, "/{}/ - {}", node.name, node.description);
                    write_abilities(&mut out, &node.abilities, "  ");
                    for sub in node.subcategories.values() {
                        let _ = writeln!(
                            out,
                            "  {}/ ({} abilities) - {}",
                            sub.name,
                            sub.ability_count(),
                            sub.description
                        );
                        write_abilities(&mut out, &sub.abilities, "    ");
                    }
                }
                None => {
                    let _ = writeln!(out, "Directory not found: /{}", category);
                }
            },
            [category, subcategory] => {
                match self
                    .category(category)
                    .and_then(|c| c.subcategories.get(*subcategory))
                {
                    Some(node) => {
                        let _ = writeln!(
                            out,
                            "/{}/{}/ - {}",
                            category, node.name, node.description
                        );
                        write_abilities(&mut out, &node.abilities, "  ");
                    }
                    None => {
                        let _ = writeln!(out, "Directory not found: /{}/{}", category, subcategory);
                    }
                }
            }
            _ => {
                let _ = writeln!(out, "Directory not found: /{}", parts.join("/"));
            }
        }
        out
    }

    pub fn path_of(&self, name: &str) -> Option<&AbilityPath> {
        self.paths.get(name)
    }
}

fn write_abilities(out: &mut String, abilities: &[Ability], indent: &str) {
    for ability in abilities {
        match ability.description.as_deref().filter(|d| !d.is_empty()) {
            Some(desc) => {
                let _ = writeln!(out, "{}{} - {}", indent, ability.name, desc);
            }
            None => {
                let _ = writeln!(out, "{}{}", indent, ability.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Ability> {
        vec![
            Ability::new("list-github-repos", "List repositories"),
            Ability::new("create-codespace", "Start a codespace"),
            Ability::new("github-trigger-workflow", "Dispatch a GitHub Actions workflow"),
            Ability::new("read-file", "Read a file"),
            Ability::new("edit-app-template", "Scaffold an app"),
            Ability::new("run-code", "Execute code"),
            Ability::new("run-background-job", "Queue work"),
            Ability::new("fetch-url", "Download a page"),
            Ability::new("search-api-docs", "Look up API docs"),
            Ability::new("plan-steps", "Break work into steps"),
            Ability::new("tail-logs", "Show logs"),
            Ability::new("summarize", "Summarize text"),
        ]
    }

    #[test]
    fn test_classification_rules() {
        let cases = [
            ("list-github-repos", "github", "repos"),
            ("run-code", "execution", "direct"),
            // Matches both "codespace" and "repo"; the codespaces refinement is checked first.
            ("list-codespaces-for-repo", "github", "codespaces"),
            ("github-trigger-workflow", "github", "workflows"),
            ("trigger-workflow", "utilities", "misc"),
            ("read-file", "files", "operations"),
            ("edit-app-template", "files", "app-management"),
            ("start-background-job", "utilities", "misc"),
            ("run-background-job", "execution", "background"),
            ("fetch-url", "web", "requests"),
            ("search-api-docs", "discovery", "api"),
            ("get-weather", "discovery", "general"),
            ("plan-steps", "planning", "tasks"),
            ("tail-logs", "debug", "monitoring"),
            ("summarize", "utilities", "misc"),
        ];

        for (name, category, subcategory) in cases {
            assert_eq!(classify(name), (category, subcategory), "classifying {name}");
        }
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // Matches files ("read") and execution ("run"); files comes first.
        assert_eq!(classify("read-and-run"), ("files", "operations"));
        // Matches github ("git") before web ("fetch").
        assert_eq!(classify("git-fetch"), ("github", "repos"));
    }

    #[test]
    fn test_classification_ignores_case() {
        assert_eq!(classify("List_GitHub_Repos"), ("github", "repos"));
    }

    #[test]
    fn test_organize_is_deterministic() {
        let mut first = AbilityCatalog::new();
        first.organize_abilities(&sample());
        let mut second = AbilityCatalog::new();
        second.organize_abilities(&sample());
        assert_eq!(first, second);

        // Re-running on the same catalog resets rather than accumulates.
        first.organize_abilities(&sample());
        assert_eq!(first, second);
    }

    #[test]
    fn test_categories_in_rule_order_with_transitive_counts() {
        let mut catalog = AbilityCatalog::new();
        catalog.organize_abilities(&sample());

        let categories = catalog.categories();
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["github", "files", "execution", "web", "discovery", "planning", "debug", "utilities"]
        );

        let github = &categories[0];
        assert_eq!(github.ability_count, 3);
        assert!(!github.description.is_empty());
    }

    #[test]
    fn test_abilities_by_category_includes_descendants() {
        let mut catalog = AbilityCatalog::new();
        catalog.organize_abilities(&sample());

        let github: Vec<String> = catalog
            .abilities_by_category("github")
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(github.len(), 3);
        assert!(github.contains(&"create-codespace".to_string()));
        assert!(catalog.abilities_by_category("nope").is_empty());
    }

    #[test]
    fn test_find_ability() {
        let mut catalog = AbilityCatalog::new();
        catalog.organize_abilities(&sample());

        let (ability, path) = catalog.find_ability("run-code").unwrap();
        assert_eq!(ability.name, "run-code");
        assert_eq!(path.category, "execution");
        assert_eq!(path.subcategory.as_deref(), Some("direct"));
        assert!(catalog.find_ability("missing").is_none());
    }

    #[test]
    fn test_directory_listing_levels() {
        let mut catalog = AbilityCatalog::new();
        catalog.organize_abilities(&sample());

        let root = catalog.directory_listing("/");
        assert!(root.starts_with("/\n"));
        assert!(root.contains("github/ (3 abilities)"));

        let github = catalog.directory_listing("github");
        assert!(github.contains("codespaces/ (1 abilities)"));
        assert!(github.contains("create-codespace - Start a codespace"));

        let repos = catalog.directory_listing("/github/repos/");
        assert!(repos.starts_with("/github/repos/"));
        assert!(repos.contains("list-github-repos - List repositories"));
        assert!(!repos.contains("create-codespace"));

        assert!(catalog
            .directory_listing("github/nothing")
            .starts_with("Directory not found"));
        assert!(catalog.directory_listing("a/b/c").starts_with("Directory not found"));
    }

    #[test]
    fn test_empty_catalog_listing() {
        let catalog = AbilityCatalog::new();
        assert_eq!(catalog.directory_listing(""), "/\n  (empty)\n");
        assert!(catalog.categories().is_empty());
    }
}
