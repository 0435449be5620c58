//! Classification capability: free text to structured wine

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{WineIdentity, WineRecord};
use crate::providers::ProviderError;

/// Structured entry extracted from one wine-list line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredWine {
    pub name: String,
    pub producer: Option<String>,
    pub vintage: Option<i32>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub varietals: Vec<String>,
    pub wine_type: Option<String>,
    /// Listed (bottle) price
    pub price: Option<f64>,
}

impl StructuredWine {
    pub fn identity(&self) -> WineIdentity {
        WineIdentity {
            name: self.name.trim().to_string(),
            producer: non_blank(self.producer.as_deref()),
            vintage: self.vintage,
            region: non_blank(self.region.as_deref()),
            country: non_blank(self.country.as_deref()),
            varietals: self
                .varietals
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Fresh unverified record for insertion
    pub fn to_record(&self) -> WineRecord {
        let mut record = WineRecord::new(self.identity());
        record.characteristics.wine_type = non_blank(self.wine_type.as_deref());
        record
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Classifier backend error: {0}")]
    Backend(#[from] ProviderError),

    #[error("Classifier returned an invalid entry: {0}")]
    Invalid(String),
}

/// Turns one line of text into a structured wine, or `None` when the line is
/// not a wine entry
#[async_trait]
pub trait WineClassifier: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(&self, text: &str) -> Result<Option<StructuredWine>, ClassifierError>;
}
