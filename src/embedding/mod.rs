//! Embedding service boundary.
//!
//! - `Vectorizer`: one request to an external embedding model
//! - `EmbeddingService`: bounded, optionally concurrent batching on top of a `Vectorizer`
//! - `OpenAiVectorizer` / `HashingVectorizer`: networked and offline implementations

mod hashing;
mod openai;
mod provider;
mod service;

use std::sync::Arc;

pub use hashing::HashingVectorizer;
pub use openai::OpenAiVectorizer;
pub use provider::Vectorizer;
pub use service::EmbeddingService;

use crate::core::config::{EmbeddingProviderKind, EmbeddingSettings};
use crate::core::errors::RagError;

pub fn build_vectorizer(settings: &EmbeddingSettings) -> Result<Arc<dyn Vectorizer>, RagError> {
    let vectorizer: Arc<dyn Vectorizer> = match settings.provider {
        EmbeddingProviderKind::Openai => Arc::new(OpenAiVectorizer::from_settings(settings)?),
        EmbeddingProviderKind::Hashing => Arc::new(HashingVectorizer::new(settings.dimensions)),
    };
    tracing::info!(model = vectorizer.model_name(), "Using embedding model");
    Ok(vectorizer)
}
