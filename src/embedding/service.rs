use std::sync::Arc;

use futures_util::{stream, StreamExt, TryStreamExt};

use super::provider::Vectorizer;
use crate::core::config::EmbeddingSettings;
use crate::core::errors::RagError;

/// Front door to a `Vectorizer` that splits large inputs into bounded batches.
#[derive(Clone)]
pub struct EmbeddingService {
    vectorizer: Arc<dyn Vectorizer>,
    batch_size: usize,
    concurrency: usize,
}

impl EmbeddingService {
    pub fn new(vectorizer: Arc<dyn Vectorizer>, batch_size: usize, concurrency: usize) -> Self {
        Self {
            vectorizer,
            batch_size: batch_size.max(1),
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_settings(vectorizer: Arc<dyn Vectorizer>, settings: &EmbeddingSettings) -> Self {
        Self::new(vectorizer, settings.batch_size, settings.concurrency)
    }

    pub fn model_name(&self) -> &str {
        self.vectorizer.model_name()
    }

    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, RagError> {
        self.vectorizer.embed(text).await
    }

    /// Embeds every text, `batch_size` per request with up to `concurrency` requests in
    /// flight. Output order matches `texts`; the first failing batch aborts the whole call.
    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let batch_count = texts.len().div_ceil(self.batch_size);
        tracing::info!(
            texts = texts.len(),
            batches = batch_count,
            model = self.model_name(),
            "Embedding texts"
        );

        let vectorizer = self.vectorizer.as_ref();
        let batches: Vec<Vec<Vec<f32>>> = stream::iter(texts.chunks(self.batch_size).enumerate())
            .map(|(index, batch)| async move {
                let vectors = vectorizer.embed_batch(batch).await?;
                if vectors.len() != batch.len() {
                    return Err(RagError::Vectorization(format!(
                        "batch {} returned {} embeddings for {} texts",
                        index,
                        vectors.len(),
                        batch.len()
                    )));
                }
                tracing::debug!(batch = index, size = batch.len(), "Embedded batch");
                Ok(vectors)
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        Ok(batches.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Encodes each text's numeric value; later batches answer faster than earlier ones.
    struct RecordingVectorizer {
        calls: AtomicUsize,
        max_batch: AtomicUsize,
    }

    #[async_trait]
    impl Vectorizer for RecordingVectorizer {
        fn model_name(&self) -> &str {
            "recording"
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.max_batch.fetch_max(texts.len(), Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30u64.saturating_sub(call as u64 * 10))).await;
            texts
                .iter()
                .map(|t| t.parse::<f32>().map(|v| vec![v]).map_err(RagError::vectorization))
                .collect()
        }
    }

    struct ShortVectorizer;

    #[async_trait]
    impl Vectorizer for ShortVectorizer {
        fn model_name(&self) -> &str {
            "short"
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Ok(vec![vec![1.0]])
        }
    }

    #[tokio::test]
    async fn batches_are_bounded_and_reassembled_in_order() {
        let vectorizer = Arc::new(RecordingVectorizer {
            calls: AtomicUsize::new(0),
            max_batch: AtomicUsize::new(0),
        });
        let service = EmbeddingService::new(vectorizer.clone(), 2, 3);
        let texts: Vec<String> = (0..7).map(|i| i.to_string()).collect();

        let vectors = service.embed_many(&texts).await.expect("embed");

        let flat: Vec<f32> = vectors.into_iter().flatten().collect();
        assert_eq!(flat, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(vectorizer.calls.load(Ordering::SeqCst), 4);
        assert_eq!(vectorizer.max_batch.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn errors_propagate_unchanged() {
        let vectorizer = Arc::new(RecordingVectorizer {
            calls: AtomicUsize::new(0),
            max_batch: AtomicUsize::new(0),
        });
        let service = EmbeddingService::new(vectorizer, 10, 1);
        let texts = vec!["1".to_string(), "not a number".to_string()];

        let err = service.embed_many(&texts).await.unwrap_err();
        assert!(matches!(err, RagError::Vectorization(_)));
    }

    #[tokio::test]
    async fn short_batches_are_rejected() {
        let service = EmbeddingService::new(Arc::new(ShortVectorizer), 5, 1);
        let texts = vec!["a".to_string(), "b".to_string()];

        assert!(service.embed_many(&texts).await.is_err());
    }

    #[tokio::test]
    async fn empty_input_makes_no_requests() {
        let vectorizer = Arc::new(RecordingVectorizer {
            calls: AtomicUsize::new(0),
            max_batch: AtomicUsize::new(0),
        });
        let service = EmbeddingService::new(vectorizer.clone(), 5, 1);

        assert!(service.embed_many(&[]).await.expect("embed").is_empty());
        assert_eq!(vectorizer.calls.load(Ordering::SeqCst), 0);
    }
}
