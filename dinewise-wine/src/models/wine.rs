//! Wine record model
//!
//! A wine is identified by (name, producer, vintage). Everything the research
//! provider fills in lives in [`WineCharacteristics`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Enrichment lifecycle of a wine record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentStatus {
    /// Created by ingestion, never researched
    #[default]
    Unverified,
    /// Research started but was interrupted by the daily budget
    Pending,
    /// Passed the quality gate
    Verified,
    /// Last enrichment ended in a terminal per-wine failure
    Failed,
}

impl EnrichmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentStatus::Unverified => "unverified",
            EnrichmentStatus::Pending => "pending",
            EnrichmentStatus::Verified => "verified",
            EnrichmentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for EnrichmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrichmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unverified" => Ok(EnrichmentStatus::Unverified),
            "pending" => Ok(EnrichmentStatus::Pending),
            "verified" => Ok(EnrichmentStatus::Verified),
            "failed" => Ok(EnrichmentStatus::Failed),
            other => Err(format!("unknown enrichment status: {}", other)),
        }
    }
}

/// Identity fields of a wine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WineIdentity {
    pub name: String,
    #[serde(default)]
    pub producer: Option<String>,
    #[serde(default)]
    pub vintage: Option<i32>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub varietals: Vec<String>,
}

impl WineIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = Some(producer.into());
        self
    }

    pub fn with_vintage(mut self, vintage: i32) -> Self {
        self.vintage = Some(vintage);
        self
    }

    /// Normalized uniqueness key over (name, producer, vintage)
    ///
    /// Case and inner whitespace are ignored; a missing vintage is `nv`.
    pub fn identity_key(&self) -> String {
        let vintage = self
            .vintage
            .map(|v| v.to_string())
            .unwrap_or_else(|| "nv".to_string());
        format!(
            "{}|{}|{}",
            normalize_key_part(&self.name),
            normalize_key_part(self.producer.as_deref().unwrap_or("")),
            vintage
        )
    }
}

fn normalize_key_part(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Researched characteristics
///
/// Numeric structure fields (acidity, tannin, intensity, sweetness) use a 1-5
/// scale where 1 is lowest (for sweetness: bone dry).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WineCharacteristics {
    /// Color/style ("red", "white", "rosé", "sparkling", ...)
    pub wine_type: Option<String>,
    pub acidity: Option<f64>,
    pub tannin: Option<f64>,
    pub intensity: Option<f64>,
    pub sweetness: Option<f64>,
    /// Body descriptor ("light", "medium-bodied", "full-bodied")
    pub body: Option<String>,
    pub flavor_profile: Option<String>,
    pub aroma: Option<String>,
    pub serving_temperature: Option<String>,
    pub aging_potential: Option<String>,
    pub food_pairing: Option<String>,
}

/// Persisted wine record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WineRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub identity: WineIdentity,
    #[serde(flatten)]
    pub characteristics: WineCharacteristics,
    pub status: EnrichmentStatus,
    pub verification_source: Option<String>,
    pub rating: Option<f64>,
    pub priority: i64,
    pub enrichment_attempts: i64,
    pub last_enrichment_error: Option<String>,
    pub enriched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl WineRecord {
    /// Fresh, unverified record
    pub fn new(identity: WineIdentity) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            characteristics: WineCharacteristics::default(),
            status: EnrichmentStatus::Unverified,
            verification_source: None,
            rating: None,
            priority: 0,
            enrichment_attempts: 0,
            last_enrichment_error: None,
            enriched_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn display_name(&self) -> String {
        let mut parts = Vec::new();
        if let Some(producer) = &self.identity.producer {
            parts.push(producer.clone());
        }
        parts.push(self.identity.name.clone());
        if let Some(vintage) = self.identity.vintage {
            parts.push(vintage.to_string());
        }
        parts.join(" ")
    }
}

/// Addressable wine field (quality gate configuration names these)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WineField {
    Producer,
    Vintage,
    Region,
    Country,
    Varietals,
    WineType,
    Acidity,
    Tannin,
    Intensity,
    Sweetness,
    Body,
    FlavorProfile,
    Aroma,
    ServingTemperature,
    AgingPotential,
    FoodPairing,
    Rating,
}

/// Borrowed view of a field's value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    List(&'a [String]),
    Number(Option<f64>),
}

impl WineField {
    pub fn as_str(&self) -> &'static str {
        match self {
            WineField::Producer => "producer",
            WineField::Vintage => "vintage",
            WineField::Region => "region",
            WineField::Country => "country",
            WineField::Varietals => "varietals",
            WineField::WineType => "wine_type",
            WineField::Acidity => "acidity",
            WineField::Tannin => "tannin",
            WineField::Intensity => "intensity",
            WineField::Sweetness => "sweetness",
            WineField::Body => "body",
            WineField::FlavorProfile => "flavor_profile",
            WineField::Aroma => "aroma",
            WineField::ServingTemperature => "serving_temperature",
            WineField::AgingPotential => "aging_potential",
            WineField::FoodPairing => "food_pairing",
            WineField::Rating => "rating",
        }
    }

    pub fn value<'a>(&self, record: &'a WineRecord) -> FieldValue<'a> {
        let id = &record.identity;
        let c = &record.characteristics;
        match self {
            WineField::Producer => FieldValue::Text(id.producer.as_deref()),
            WineField::Vintage => FieldValue::Number(id.vintage.map(f64::from)),
            WineField::Region => FieldValue::Text(id.region.as_deref()),
            WineField::Country => FieldValue::Text(id.country.as_deref()),
            WineField::Varietals => FieldValue::List(&id.varietals),
            WineField::WineType => FieldValue::Text(c.wine_type.as_deref()),
            WineField::Acidity => FieldValue::Number(c.acidity),
            WineField::Tannin => FieldValue::Number(c.tannin),
            WineField::Intensity => FieldValue::Number(c.intensity),
            WineField::Sweetness => FieldValue::Number(c.sweetness),
            WineField::Body => FieldValue::Text(c.body.as_deref()),
            WineField::FlavorProfile => FieldValue::Text(c.flavor_profile.as_deref()),
            WineField::Aroma => FieldValue::Text(c.aroma.as_deref()),
            WineField::ServingTemperature => FieldValue::Text(c.serving_temperature.as_deref()),
            WineField::AgingPotential => FieldValue::Text(c.aging_potential.as_deref()),
            WineField::FoodPairing => FieldValue::Text(c.food_pairing.as_deref()),
            WineField::Rating => FieldValue::Number(record.rating),
        }
    }
}

impl fmt::Display for WineField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WineField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s.trim().to_lowercase().as_str() {
            "producer" => WineField::Producer,
            "vintage" => WineField::Vintage,
            "region" => WineField::Region,
            "country" => WineField::Country,
            "varietals" | "grapes" => WineField::Varietals,
            "wine_type" | "type" | "color" => WineField::WineType,
            "acidity" => WineField::Acidity,
            "tannin" | "tannins" => WineField::Tannin,
            "intensity" => WineField::Intensity,
            "sweetness" => WineField::Sweetness,
            "body" => WineField::Body,
            "flavor_profile" | "flavors" => WineField::FlavorProfile,
            "aroma" | "aromas" => WineField::Aroma,
            "serving_temperature" => WineField::ServingTemperature,
            "aging_potential" => WineField::AgingPotential,
            "food_pairing" => WineField::FoodPairing,
            "rating" => WineField::Rating,
            other => return Err(format!("unknown wine field: {}", other)),
        };
        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key_ignores_case_and_spacing() {
        let a = WineIdentity::new("Cabernet  Sauvignon")
            .with_producer("Ridge")
            .with_vintage(2019);
        let b = WineIdentity::new("cabernet sauvignon ")
            .with_producer("RIDGE")
            .with_vintage(2019);
        assert_eq!(a.identity_key(), b.identity_key());
        assert_eq!(a.identity_key(), "cabernet sauvignon|ridge|2019");
    }

    #[test]
    fn test_identity_key_distinguishes_vintage() {
        let a = WineIdentity::new("Barolo").with_vintage(2016);
        let b = WineIdentity::new("Barolo");
        assert_ne!(a.identity_key(), b.identity_key());
        assert!(b.identity_key().ends_with("|nv"));
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            EnrichmentStatus::Unverified,
            EnrichmentStatus::Pending,
            EnrichmentStatus::Verified,
            EnrichmentStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<EnrichmentStatus>().unwrap(), status);
        }
        assert!("done".parse::<EnrichmentStatus>().is_err());
    }

    #[test]
    fn test_field_aliases() {
        assert_eq!("tannins".parse::<WineField>().unwrap(), WineField::Tannin);
        assert_eq!("Flavor_Profile".parse::<WineField>().unwrap(), WineField::FlavorProfile);
        assert!("price".parse::<WineField>().is_err());
    }

    #[test]
    fn test_record_serializes_flat() {
        let mut record = WineRecord::new(WineIdentity::new("Sancerre").with_producer("Vacheron"));
        record.characteristics.wine_type = Some("white".to_string());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "Sancerre");
        assert_eq!(json["wine_type"], "white");
        assert_eq!(json["status"], "unverified");
    }

    #[test]
    fn test_display_name() {
        let record = WineRecord::new(
            WineIdentity::new("Monte Bello").with_producer("Ridge").with_vintage(2018),
        );
        assert_eq!(record.display_name(), "Ridge Monte Bello 2018");
    }
}
