pub mod defaults;
pub mod paths;
pub mod schema;
pub mod service;
pub mod validation;

pub use paths::AppPaths;
pub use schema::{
    AlmanacConfig, CompletionProviderKind, CompletionSettings, CorpusSettings,
    EmbeddingProviderKind, EmbeddingSettings, RetrievalSettings, ServerSettings,
    TokenizerScheme, TokenizerSettings,
};
pub use service::ConfigService;
