use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to load corpus: {0}")]
    Corpus(#[source] anyhow::Error),

    #[error("Failed to initialize RAG engine: {0}")]
    Engine(#[source] anyhow::Error),
}
