use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::provider::Vectorizer;
use crate::core::config::EmbeddingSettings;
use crate::core::errors::RagError;

/// Client for any service speaking the OpenAI `/v1/embeddings` protocol.
#[derive(Clone)]
pub struct OpenAiVectorizer {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiVectorizer {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RagError::vectorization)?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client,
        })
    }

    /// Falls back to `OPENAI_API_KEY` when the settings carry no key.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self, RagError> {
        let api_key = settings
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        Self::new(
            settings.base_url.clone(),
            settings.model.clone(),
            api_key,
            Duration::from_secs(settings.timeout_secs),
        )
    }
}

#[async_trait]
impl Vectorizer for OpenAiVectorizer {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": texts,
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await.map_err(RagError::vectorization)?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::Vectorization(format!(
                "embedding request returned {}: {}",
                status, text
            )));
        }

        let payload: EmbeddingsResponse = res.json().await.map_err(RagError::vectorization)?;
        order_embeddings(payload.data, texts.len())
    }
}

/// Puts response items back into request order and checks that every input got a vector.
fn order_embeddings(mut items: Vec<EmbeddingItem>, expected: usize) -> Result<Vec<Vec<f32>>, RagError> {
    if items.len() != expected {
        return Err(RagError::Vectorization(format!(
            "requested {} embeddings, received {}",
            expected,
            items.len()
        )));
    }
    items.sort_by_key(|item| item.index);
    Ok(items.into_iter().map(|item| item.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_items_are_reordered_by_index() {
        let payload: EmbeddingsResponse = serde_json::from_str(
            r#"{"object":"list","data":[
                {"object":"embedding","index":1,"embedding":[0.5,0.5]},
                {"object":"embedding","index":0,"embedding":[1.0,0.0]}
            ],"model":"m"}"#,
        )
        .expect("payload parses");

        let ordered = order_embeddings(payload.data, 2).expect("ordered");
        assert_eq!(ordered, vec![vec![1.0, 0.0], vec![0.5, 0.5]]);
    }

    #[test]
    fn short_responses_are_vectorization_failures() {
        let err = order_embeddings(Vec::new(), 3).unwrap_err();
        assert!(matches!(err, RagError::Vectorization(_)));
    }

    #[tokio::test]
    async fn unreachable_service_surfaces_as_vectorization_failure() {
        let vectorizer = OpenAiVectorizer::new(
            "http://127.0.0.1:9",
            "test-model",
            None,
            Duration::from_millis(500),
        )
        .expect("client builds");

        let err = vectorizer.embed("hello").await.unwrap_err();
        assert!(matches!(err, RagError::Vectorization(_)));
    }
}
