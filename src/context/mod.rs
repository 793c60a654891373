//! Prompt context: collaborator traits, parallel gathering and assembly.

pub mod assembler;
pub mod gather;
pub mod http;
pub mod sources;

pub use assembler::{ContextAssembler, CORE_ABILITY_NAMES};
pub use gather::{new_planning_token, ContextGatherer};
pub use http::{gatherer_from_endpoints, HttpAccountSource, HttpSource};
pub use sources::{
    AccountSource, ConnectedAccount, ContextSources, EnvironmentSource, ExecutorConnection,
    ExecutorStatusSource, ExecutorTarget, IntegrationSource, NoteKey, NoteStore, TokenSource,
};
