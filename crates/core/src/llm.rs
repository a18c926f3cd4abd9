use crate::error::InferenceError;
use crate::traits::InferenceClient;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Chat-completion client for the Groq OpenAI-compatible endpoint.
pub struct GroqClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GroqClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_endpoint(DEFAULT_GROQ_ENDPOINT, api_key, model)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub async fn complete(&self, system: &str, user: &str) -> Result<String, InferenceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": system},
                    {"role": "user", "content": user},
                ],
                "temperature": 0.1,
                "max_tokens": 1024,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InferenceError::Backend {
                status: response.status().to_string(),
            });
        }

        let payload: Value = response.json().await?;
        payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(InferenceError::EmptyCompletion)
    }
}

/// Generation capability resolved once at startup: either a usable client or
/// an explicit absence, so call sites never probe a nullable handle.
pub enum GroqGenerator {
    Configured(GroqClient),
    Disabled,
}

impl GroqGenerator {
    /// Treats a missing or blank key as "generation disabled".
    pub fn from_key(api_key: Option<String>, model: &str) -> Self {
        match api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
        {
            Some(key) => GroqGenerator::Configured(GroqClient::new(key, model)),
            None => GroqGenerator::Disabled,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, GroqGenerator::Configured(_))
    }
}

#[async_trait]
impl InferenceClient for GroqGenerator {
    async fn complete(&self, system: &str, user: &str) -> Result<String, InferenceError> {
        match self {
            GroqGenerator::Configured(client) => client.complete(system, user).await,
            GroqGenerator::Disabled => Err(InferenceError::Unconfigured),
        }
    }
}
