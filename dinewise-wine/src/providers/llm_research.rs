//! Fallback research provider backed by a chat model

use async_trait::async_trait;
use serde_json::Value;

use super::llm_client::ChatClient;
use super::{ProviderError, RawCharacteristics, ResearchProvider};

const PROVIDER_NAME: &str = "llm_research";

const SYSTEM_PROMPT: &str = "You are a sommelier research assistant. Given a wine \
description, answer with a single JSON object using exactly these keys: wine_type, \
region, country, varietals (array of strings), acidity, tannin, intensity, sweetness \
(each a number from 1 to 5, where sweetness 1 is bone dry), body, flavor_profile, \
aroma, serving_temperature, aging_potential, food_pairing, rating (number of points \
out of 100). Use null for anything you do not know. Never guess. If the wine cannot \
be identified answer {\"found\": false}.";

pub struct LlmResearchProvider {
    client: ChatClient,
}

impl LlmResearchProvider {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

fn interpret(value: Value, query: &str) -> Result<RawCharacteristics, ProviderError> {
    if value.get("found").and_then(Value::as_bool) == Some(false) {
        return Err(ProviderError::NotFound(format!("Model could not identify '{}'", query)));
    }

    let raw: RawCharacteristics = serde_json::from_value(value)
        .map_err(|e| ProviderError::Parse(format!("Unexpected model output shape: {}", e)))?;

    if raw.is_empty() {
        return Err(ProviderError::NotFound(format!("Model returned no data for '{}'", query)));
    }
    Ok(raw)
}

#[async_trait]
impl ResearchProvider for LlmResearchProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn lookup(&self, query: &str) -> Result<RawCharacteristics, ProviderError> {
        let value = self.client.complete_json(SYSTEM_PROMPT, query).await?;
        interpret(value, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_found_false_is_not_found() {
        assert!(matches!(
            interpret(json!({ "found": false }), "q"),
            Err(ProviderError::NotFound(_))
        ));
    }

    #[test]
    fn test_all_null_is_not_found() {
        assert!(matches!(
            interpret(json!({ "wine_type": null, "tannin": null }), "q"),
            Err(ProviderError::NotFound(_))
        ));
    }

    #[test]
    fn test_characteristics_pass_through() {
        let raw = interpret(json!({ "wine_type": "white", "acidity": 4 }), "q").unwrap();
        assert_eq!(raw.wine_type.as_deref(), Some("white"));
        assert_eq!(raw.acidity, Some(json!(4)));
    }
}
