//! Research providers
//!
//! A provider turns a free-text query ("Ridge Monte Bello 2018 Santa Cruz
//! Mountains") into raw wine characteristics or fails. Any implementation of
//! [`ResearchProvider`] is substitutable; [`ProviderChain`] escalates from the
//! primary source to fallbacks as attempts accumulate.

pub mod chain;
pub mod llm_client;
pub mod llm_research;
pub mod rate_limit;
pub mod web_research;

pub use chain::ProviderChain;
pub use llm_client::ChatClient;
pub use llm_research::LlmResearchProvider;
pub use web_research::WebResearchProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Research provider failure (always transient from the orchestrator's view)
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with an error status
    #[error("Provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Provider has no data for the query
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Provider is missing required configuration
    #[error("Provider not configured: {0}")]
    Unconfigured(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Characteristics as returned by a provider, before mapping
///
/// Structure fields accept numbers or descriptive labels; list-like fields
/// accept a string or an array of strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCharacteristics {
    #[serde(alias = "type", alias = "color", alias = "style")]
    pub wine_type: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    #[serde(alias = "grapes", alias = "grape_varieties")]
    pub varietals: Option<Value>,
    pub acidity: Option<Value>,
    #[serde(alias = "tannins")]
    pub tannin: Option<Value>,
    pub intensity: Option<Value>,
    pub sweetness: Option<Value>,
    pub body: Option<Value>,
    #[serde(alias = "flavors", alias = "flavor_notes", alias = "tasting_notes")]
    pub flavor_profile: Option<Value>,
    #[serde(alias = "aromas", alias = "nose")]
    pub aroma: Option<Value>,
    pub serving_temperature: Option<Value>,
    #[serde(alias = "aging", alias = "cellaring")]
    pub aging_potential: Option<Value>,
    #[serde(alias = "food_pairings", alias = "pairings")]
    pub food_pairing: Option<Value>,
    #[serde(alias = "score")]
    pub rating: Option<Value>,
}

impl RawCharacteristics {
    /// True when the provider returned nothing usable
    pub fn is_empty(&self) -> bool {
        fn blank(v: &Option<Value>) -> bool {
            match v {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(Value::Array(a)) => a.is_empty(),
                Some(_) => false,
            }
        }
        self.wine_type.as_deref().map_or(true, |s| s.trim().is_empty())
            && self.region.as_deref().map_or(true, |s| s.trim().is_empty())
            && self.country.as_deref().map_or(true, |s| s.trim().is_empty())
            && [
                &self.varietals,
                &self.acidity,
                &self.tannin,
                &self.intensity,
                &self.sweetness,
                &self.body,
                &self.flavor_profile,
                &self.aroma,
                &self.serving_temperature,
                &self.aging_potential,
                &self.food_pairing,
                &self.rating,
            ]
            .into_iter()
            .all(blank)
    }
}

/// External research capability
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Provider name, recorded as the verification source
    fn name(&self) -> &str;

    /// Look up characteristics for a composed search query
    async fn lookup(&self, query: &str) -> Result<RawCharacteristics, ProviderError>;
}
