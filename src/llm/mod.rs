mod canned;
mod openai;
mod provider;
pub mod types;

use std::sync::Arc;

pub use canned::CannedCompletion;
pub use openai::OpenAiCompletion;
pub use provider::CompletionProvider;
pub use types::{ChatMessage, ChatRequest};

use crate::core::config::{CompletionProviderKind, CompletionSettings};
use crate::core::errors::RagError;

pub fn build_completion(settings: &CompletionSettings) -> Result<Arc<dyn CompletionProvider>, RagError> {
    let provider: Arc<dyn CompletionProvider> = match settings.provider {
        CompletionProviderKind::Openai => Arc::new(OpenAiCompletion::from_settings(settings)?),
        CompletionProviderKind::Canned => Arc::new(CannedCompletion::new(settings.canned_response.clone())),
    };
    tracing::info!(provider = provider.name(), model = %settings.model, "Using completion provider");
    Ok(provider)
}
