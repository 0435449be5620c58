//! Primary research provider: HTTP wine search API
//!
//! # API contract
//! - Endpoint: `GET {base_url}/wines/search?q={query}`
//! - Auth: `Authorization: Bearer {api_key}` when a key is configured
//! - Response: a characteristics object, or `{"results": [object, ...]}`
//!   where the first result is the best match
//! - 404 or an empty result list means "no data for this wine"

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::rate_limit::{self, DirectLimiter};
use super::{ProviderError, RawCharacteristics, ResearchProvider};

const PROVIDER_NAME: &str = "web_research";

/// User-Agent header sent with every request
const USER_AGENT: &str = concat!("dinewise-wine/", env!("CARGO_PKG_VERSION"));

pub struct WebResearchProvider {
    http_client: Client,
    base_url: String,
    rate_limiter: Arc<DirectLimiter>,
}

impl WebResearchProvider {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        requests_per_second: u32,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
        if let Some(key) = api_key {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|e| {
                ProviderError::Unconfigured(format!("Invalid research API key: {}", e))
            })?;
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
            rate_limiter: Arc::new(rate_limit::per_second(requests_per_second)),
        })
    }
}

/// Pick the characteristics object out of a search response
fn extract_best_match(body: Value, query: &str) -> Result<RawCharacteristics, ProviderError> {
    let candidate = match body {
        Value::Object(mut map) if map.contains_key("results") => {
            match map.remove("results") {
                Some(Value::Array(results)) => results.into_iter().next(),
                _ => None,
            }
        }
        Value::Object(map) => Some(Value::Object(map)),
        _ => None,
    }
    .ok_or_else(|| ProviderError::NotFound(format!("No results for '{}'", query)))?;

    let raw: RawCharacteristics = serde_json::from_value(candidate)
        .map_err(|e| ProviderError::Parse(format!("Unexpected research result shape: {}", e)))?;

    if raw.is_empty() {
        return Err(ProviderError::NotFound(format!("Empty result for '{}'", query)));
    }
    Ok(raw)
}

#[async_trait]
impl ResearchProvider for WebResearchProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn lookup(&self, query: &str) -> Result<RawCharacteristics, ProviderError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/wines/search", self.base_url);
        debug!(query = %query, "Querying wine research API");

        let response = self
            .http_client
            .get(&url)
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(ProviderError::NotFound(format!("No results for '{}'", query)));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse research response: {}", e)))?;

        extract_best_match(body, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_first_result() {
        let body = json!({
            "results": [
                { "wine_type": "red", "tannin": 4.5 },
                { "wine_type": "white" }
            ]
        });
        let raw = extract_best_match(body, "q").unwrap();
        assert_eq!(raw.wine_type.as_deref(), Some("red"));
    }

    #[test]
    fn test_extract_bare_object() {
        let raw = extract_best_match(json!({ "body": "full" }), "q").unwrap();
        assert_eq!(raw.body, Some(json!("full")));
    }

    #[test]
    fn test_empty_results_is_not_found() {
        assert!(matches!(
            extract_best_match(json!({ "results": [] }), "q"),
            Err(ProviderError::NotFound(_))
        ));
        assert!(matches!(
            extract_best_match(json!({}), "q"),
            Err(ProviderError::NotFound(_))
        ));
    }

    #[test]
    fn test_non_object_is_not_found() {
        assert!(extract_best_match(json!("nope"), "q").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let provider = WebResearchProvider::new(
            "http://127.0.0.1:1",
            None,
            10,
            Duration::from_secs(2),
        )
        .unwrap();
        let err = provider.lookup("Barolo").await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_) | ProviderError::Timeout));
    }
}
