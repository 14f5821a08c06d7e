use async_trait::async_trait;

use crate::core::errors::RagError;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// provider name (e.g. "openai", "canned")
    fn name(&self) -> &str;

    /// single-turn completion of a fully rendered prompt; the reply is returned unmodified
    async fn complete(&self, prompt: &str, max_output_tokens: u32) -> Result<String, RagError>;
}
