use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::retrieval::DistanceMetric;

/// Typed view of `config.yml` merged with `secrets.yaml`.
///
/// Every section and field falls back to its default, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlmanacConfig {
    pub corpus: CorpusSettings,
    pub embedding: EmbeddingSettings,
    pub completion: CompletionSettings,
    pub tokenizer: TokenizerSettings,
    pub retrieval: RetrievalSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    /// Page fetched by `almanac build` when no input file is given.
    pub source_url: Option<String>,
    /// Wikipedia article whose plain-text extract is used when neither a file nor a URL is given.
    pub wikipedia_title: Option<String>,
    pub wikipedia_api: String,
    /// Persisted corpus; defaults to `<data dir>/corpus.csv`.
    pub path: Option<PathBuf>,
    pub separator: String,
    pub section_marker: String,
    pub fetch_timeout_secs: u64,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            source_url: None,
            wikipedia_title: None,
            wikipedia_api: defaults::WIKIPEDIA_API.to_string(),
            path: None,
            separator: defaults::DATE_SEPARATOR.to_string(),
            section_marker: defaults::SECTION_MARKER.to_string(),
            fetch_timeout_secs: defaults::FETCH_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    #[default]
    Openai,
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Texts per embedding request.
    pub batch_size: usize,
    /// Embedding requests allowed in flight at once.
    pub concurrency: usize,
    pub timeout_secs: u64,
    /// Output width of the hashing provider.
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            base_url: defaults::OPENAI_BASE_URL.to_string(),
            model: defaults::EMBEDDING_MODEL.to_string(),
            api_key: None,
            batch_size: defaults::EMBEDDING_BATCH_SIZE,
            concurrency: defaults::EMBEDDING_CONCURRENCY,
            timeout_secs: defaults::EMBEDDING_TIMEOUT_SECS,
            dimensions: defaults::HASHING_DIMENSIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionProviderKind {
    #[default]
    Openai,
    Canned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    pub provider: CompletionProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_output_tokens: u32,
    pub temperature: f64,
    pub timeout_secs: u64,
    /// Reply returned by the canned provider.
    pub canned_response: String,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            provider: CompletionProviderKind::default(),
            base_url: defaults::OPENAI_BASE_URL.to_string(),
            model: defaults::COMPLETION_MODEL.to_string(),
            api_key: None,
            max_output_tokens: defaults::MAX_OUTPUT_TOKENS,
            temperature: 0.0,
            timeout_secs: defaults::COMPLETION_TIMEOUT_SECS,
            canned_response: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerScheme {
    /// The OpenAI byte-pair encoding of the completion model.
    #[default]
    Tiktoken,
    /// A HuggingFace `tokenizer.json` matching the completion model.
    Huggingface,
    Whitespace,
    Estimate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerSettings {
    pub scheme: TokenizerScheme,
    pub path: Option<PathBuf>,
    /// Overrides the completion model when picking a tiktoken encoding.
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub metric: DistanceMetric,
    pub max_context_tokens: usize,
    pub context_separator: String,
    pub prompt_template: String,
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::default(),
            max_context_tokens: defaults::MAX_CONTEXT_TOKENS,
            context_separator: defaults::CONTEXT_SEPARATOR.to_string(),
            prompt_template: defaults::PROMPT_TEMPLATE.to_string(),
            top_k: defaults::SEARCH_TOP_K,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: defaults::SERVER_HOST.to_string(),
            port: 0,
            allowed_origins: Vec::new(),
        }
    }
}
