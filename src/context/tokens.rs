//! Token counting for prompt budgeting.

use std::path::Path;
use std::sync::Arc;

use tiktoken_rs::CoreBPE;
use tokenizers::Tokenizer;

use crate::core::config::{TokenizerScheme, TokenizerSettings};
use crate::core::errors::RagError;

/// Counts tokens under one fixed scheme. Implementations are pure: the same text always
/// yields the same count and no I/O happens while counting.
pub trait TokenCounter: Send + Sync {
    fn scheme(&self) -> &str;

    fn count_tokens(&self, text: &str) -> Result<usize, RagError>;
}

/// Counts with a HuggingFace tokenizer loaded from a local `tokenizer.json`.
pub struct HuggingFaceTokenCounter {
    tokenizer: Tokenizer,
    scheme: String,
}

impl HuggingFaceTokenCounter {
    pub fn from_file(path: &Path) -> Result<Self, RagError> {
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| RagError::Tokenizer(format!("{}: {}", path.display(), e)))?;
        let scheme = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "huggingface".to_string());
        Ok(Self { tokenizer, scheme })
    }

    pub fn from_tokenizer(tokenizer: Tokenizer, scheme: impl Into<String>) -> Self {
        Self {
            tokenizer,
            scheme: scheme.into(),
        }
    }
}

impl TokenCounter for HuggingFaceTokenCounter {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn count_tokens(&self, text: &str) -> Result<usize, RagError> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| RagError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().len())
    }
}

/// Counts with the byte-pair encoding an OpenAI model uses (`o200k_base` for the gpt-4o family).
pub struct TiktokenTokenCounter {
    bpe: CoreBPE,
    scheme: String,
}

impl TiktokenTokenCounter {
    pub fn for_model(model: &str) -> Result<Self, RagError> {
        let bpe = tiktoken_rs::get_bpe_from_model(model)
            .map_err(|e| RagError::Tokenizer(format!("no encoding for model {}: {}", model, e)))?;
        Ok(Self {
            bpe,
            scheme: format!("tiktoken:{}", model),
        })
    }
}

impl TokenCounter for TiktokenTokenCounter {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn count_tokens(&self, text: &str) -> Result<usize, RagError> {
        Ok(self.bpe.encode_ordinary(text).len())
    }
}

/// One token per whitespace-separated word.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenCounter;

impl TokenCounter for WhitespaceTokenCounter {
    fn scheme(&self) -> &str {
        "whitespace"
    }

    fn count_tokens(&self, text: &str) -> Result<usize, RagError> {
        Ok(text.split_whitespace().count())
    }
}

/// Roughly four bytes per token, the usual rule of thumb for English BPE vocabularies.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimateTokenCounter;

impl TokenCounter for EstimateTokenCounter {
    fn scheme(&self) -> &str {
        "estimate"
    }

    fn count_tokens(&self, text: &str) -> Result<usize, RagError> {
        Ok(text.len().div_ceil(4))
    }
}

/// Builds the configured counter. The `tiktoken` scheme follows `tokenizer.model` when set and
/// the completion model otherwise.
pub fn build_token_counter(
    settings: &TokenizerSettings,
    completion_model: &str,
) -> Result<Arc<dyn TokenCounter>, RagError> {
    let counter: Arc<dyn TokenCounter> = match settings.scheme {
        TokenizerScheme::Tiktoken => {
            let model = settings.model.as_deref().unwrap_or(completion_model);
            Arc::new(TiktokenTokenCounter::for_model(model)?)
        }
        TokenizerScheme::Huggingface => {
            let path = settings.path.as_deref().ok_or_else(|| {
                RagError::Config("tokenizer.path is required for the huggingface scheme".to_string())
            })?;
            Arc::new(HuggingFaceTokenCounter::from_file(path)?)
        }
        TokenizerScheme::Whitespace => Arc::new(WhitespaceTokenCounter),
        TokenizerScheme::Estimate => Arc::new(EstimateTokenCounter),
    };
    tracing::info!(scheme = counter.scheme(), "Using token counter");
    Ok(counter)
}
