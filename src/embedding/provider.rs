use async_trait::async_trait;

use crate::core::errors::RagError;

/// An external embedding model.
#[async_trait]
pub trait Vectorizer: Send + Sync {
    /// Model identifier sent to the service (e.g. "text-embedding-3-small").
    fn model_name(&self) -> &str;

    /// Embeds `texts` in one request, returning one vector per input in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        match (vectors.pop(), vectors.is_empty()) {
            (Some(vector), true) => Ok(vector),
            _ => Err(RagError::Vectorization(format!(
                "{} did not return exactly one embedding",
                self.model_name()
            ))),
        }
    }
}
