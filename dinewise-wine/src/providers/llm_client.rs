//! Minimal OpenAI-compatible chat completions client
//!
//! Used by the fallback research provider and the LLM wine-list classifier.
//! Every call asks for a JSON object and returns it parsed.

use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::rate_limit::{self, DirectLimiter};
use super::ProviderError;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions client with built-in rate limiting
#[derive(Clone)]
pub struct ChatClient {
    http_client: Client,
    base_url: String,
    model: String,
    rate_limiter: Arc<DirectLimiter>,
}

impl ChatClient {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        model: &str,
        requests_per_second: u32,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let mut headers = header::HeaderMap::new();
        if let Some(key) = api_key {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| ProviderError::Unconfigured(format!("Invalid LLM API key: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ProviderError::Unconfigured(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            rate_limiter: Arc::new(rate_limit::per_second(requests_per_second)),
        })
    }

    /// Send a system + user prompt, return the model's JSON object
    pub async fn complete_json(&self, system: &str, user: &str) -> Result<Value, ProviderError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        debug!(model = %self.model, "Sending chat completion request");
        let response = self.http_client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Invalid chat response: {}", e)))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Parse("Chat response had no content".to_string()))?;

        parse_json_content(&content)
    }
}

/// Parse model output, tolerating a surrounding markdown code fence
pub fn parse_json_content(content: &str) -> Result<Value, ProviderError> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(unfenced)
        .map_err(|e| ProviderError::Parse(format!("Model did not return JSON: {}", e)))
}
