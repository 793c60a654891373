//! Tool execution results: extraction, summarization and budgeted recall.

pub mod extract;
pub mod store;

pub use extract::{estimate_tokens, extract_important_data, ExtractedImportantData};
pub use store::{ResultStore, StoredResult, OMISSION_MARKER};
