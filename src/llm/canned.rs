use async_trait::async_trait;

use super::provider::CompletionProvider;
use crate::core::errors::RagError;

/// Returns a fixed reply without calling any service. Used offline and in tests.
#[derive(Debug, Clone, Default)]
pub struct CannedCompletion {
    response: String,
}

impl CannedCompletion {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl CompletionProvider for CannedCompletion {
    fn name(&self) -> &str {
        "canned"
    }

    async fn complete(&self, _prompt: &str, _max_output_tokens: u32) -> Result<String, RagError> {
        Ok(self.response.clone())
    }
}
