use crate::corpus::{Corpus, Preprocessor};
use crate::core::errors::RagError;
use crate::embedding::EmbeddingService;

/// Turns raw lines into an embedded corpus: preprocess, then embed every fragment text.
#[derive(Clone)]
pub struct CorpusBuilder {
    preprocessor: Preprocessor,
    embeddings: EmbeddingService,
}

impl CorpusBuilder {
    pub fn new(preprocessor: Preprocessor, embeddings: EmbeddingService) -> Self {
        Self {
            preprocessor,
            embeddings,
        }
    }

    /// A vectorization failure aborts the build; no partial corpus is returned.
    pub async fn build<I, S>(&self, lines: I) -> Result<Corpus, RagError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fragments = self.preprocessor.process(lines);
        if fragments.is_empty() {
            tracing::warn!("No dated fragments found; the corpus is empty");
            return Ok(Corpus::empty());
        }

        let texts: Vec<String> = fragments.iter().map(|f| f.text.clone()).collect();
        let vectors = self.embeddings.embed_many(&texts).await?;
        let corpus = Corpus::new(fragments, vectors)?;

        tracing::info!(
            fragments = corpus.len(),
            dimensions = corpus.dimensions(),
            model = self.embeddings.model_name(),
            "Built corpus"
        );
        Ok(corpus)
    }
}
