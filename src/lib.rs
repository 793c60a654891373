//! approver-core - ability discovery and planner context service
//!
//! Backs the Keyboard Approver desktop app: indexes and categorizes the
//! abilities an AI planner may call, keeps a bounded memory of tool results,
//! and assembles the planner prompt from live context.

pub mod abilities;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod messages;
pub mod persistence;
pub mod results;
pub mod state;

// Re-export key types for convenience
pub use abilities::{Ability, AbilityCatalog, AbilityIndex};
pub use config::Config;
pub use context::{ContextAssembler, ContextGatherer, ContextSources};
pub use error::{AppError, Result};
pub use handlers::router;
pub use messages::ApprovalMessage;
pub use persistence::FileNoteStore;
pub use results::ResultStore;
pub use state::AppState;
