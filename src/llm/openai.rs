use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::provider::CompletionProvider;
use super::types::{ChatRequest, ChatResponse};
use crate::core::config::CompletionSettings;
use crate::core::errors::RagError;

/// Chat-completions client for OpenAI and compatible servers (LM Studio, vLLM, llama.cpp).
#[derive(Clone)]
pub struct OpenAiCompletion {
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f64,
    client: Client,
}

impl OpenAiCompletion {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        temperature: f64,
        timeout: Duration,
    ) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RagError::completion)?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            temperature,
            client,
        })
    }

    pub fn from_settings(settings: &CompletionSettings) -> Result<Self, RagError> {
        let api_key = settings
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        Self::new(
            settings.base_url.clone(),
            settings.model.clone(),
            api_key,
            settings.temperature,
            Duration::from_secs(settings.timeout_secs),
        )
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletion {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str, max_output_tokens: u32) -> Result<String, RagError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest::single_turn(&self.model, prompt, self.temperature, max_output_tokens);

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await.map_err(RagError::completion)?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::Completion(format!(
                "chat completion returned {}: {}",
                status, text
            )));
        }

        let payload: ChatResponse = res.json().await.map_err(RagError::completion)?;
        first_choice(payload)
    }
}

fn first_choice(payload: ChatResponse) -> Result<String, RagError> {
    payload
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| RagError::Completion("response contained no choices".to_string()))
}
