//! Date-qualified retrieval over event timelines with token-budgeted prompt assembly.

pub mod context;
pub mod core;
pub mod corpus;
pub mod embedding;
pub mod llm;
pub mod rag;
pub mod retrieval;
pub mod server;
pub mod state;

pub use crate::core::errors::RagError;
