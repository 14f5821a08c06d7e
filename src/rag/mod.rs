//! Retrieval-augmented answering over a dated corpus.
//!
//! This module provides:
//! - `CorpusBuilder`: preprocesses raw lines and embeds them into a `Corpus`
//! - `RagEngine`: searches the corpus, assembles budgeted prompts and requests completions

mod builder;
mod engine;

pub use builder::CorpusBuilder;
pub use engine::{Answer, RagEngine};
