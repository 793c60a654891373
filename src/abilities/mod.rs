//! Ability ingestion, keyword search and catalog classification.
//!
//! Abilities arrive as MCP tool descriptors. The [`AbilityIndex`] answers
//! ranked keyword queries over them; the [`AbilityCatalog`] files each one
//! under a category/subcategory path for directory-style browsing.

pub mod catalog;
pub mod index;
pub mod ingest;
pub mod keywords;
pub mod types;

pub use catalog::{classify, AbilityCatalog, AbilityCategory, CategorySummary};
pub use index::{AbilityIndex, AbilityMatch, SearchOutcome, DEFAULT_MAX_RESULTS};
pub use ingest::{load_abilities_file, parse_abilities, summarize_params};
pub use types::{Ability, AbilityPath, InputSchema, SchemaEntry};
