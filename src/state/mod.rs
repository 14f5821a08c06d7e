use std::path::PathBuf;
use std::sync::Arc;

use crate::core::config::{AlmanacConfig, AppPaths, ConfigService};
use crate::corpus::{CsvCorpusStore, CorpusStore};
use crate::rag::RagEngine;

pub mod error;

use error::InitializationError;

/// State shared by every route: resolved paths, the loaded configuration and the query engine
/// over an immutable corpus.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: Arc<AlmanacConfig>,
    pub engine: Arc<RagEngine>,
}

impl AppState {
    /// Loads configuration, reads the persisted corpus and wires the engine.
    ///
    /// `corpus_path` overrides both `corpus.path` and the default location under the data dir.
    pub fn initialize(
        config_service: &ConfigService,
        corpus_path: Option<PathBuf>,
    ) -> Result<Arc<Self>, InitializationError> {
        let paths = Arc::new(config_service.paths().clone());
        let config = config_service
            .load()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let corpus_path = resolve_corpus_path(&config, &paths, corpus_path);
        let store = CsvCorpusStore::new(corpus_path.clone());
        let corpus = store
            .load(&corpus_path)
            .map_err(|e| InitializationError::Corpus(e.into()))?;

        let engine = RagEngine::from_config(&config, Arc::new(corpus))
            .map_err(|e| InitializationError::Engine(e.into()))?;

        Ok(Arc::new(Self::new(paths, config, engine)))
    }

    pub fn new(paths: Arc<AppPaths>, config: AlmanacConfig, engine: RagEngine) -> Self {
        Self {
            paths,
            config: Arc::new(config),
            engine: Arc::new(engine),
        }
    }
}

/// Explicit path, then `corpus.path`, then `<data dir>/corpus.csv`.
pub fn resolve_corpus_path(
    config: &AlmanacConfig,
    paths: &AppPaths,
    explicit: Option<PathBuf>,
) -> PathBuf {
    explicit
        .or_else(|| config.corpus.path.clone())
        .unwrap_or_else(|| paths.corpus_path.clone())
}
