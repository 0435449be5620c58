//! Parsed guest preference
//!
//! Produced by a preference parser from the guest's free text and treated as
//! immutable input by the recommendation engine.

use serde::{Deserialize, Serialize};

/// Inclusive range on the 1-5 structure scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BandRepr")]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

/// Accepted wire forms: a label ("medium-high") or an explicit range
#[derive(Deserialize)]
#[serde(untagged)]
enum BandRepr {
    Label(String),
    Range { min: f64, max: f64 },
}

impl TryFrom<BandRepr> for Band {
    type Error = String;

    fn try_from(repr: BandRepr) -> Result<Self, Self::Error> {
        match repr {
            BandRepr::Label(label) => {
                Band::from_label(&label).ok_or_else(|| format!("unknown band label: {}", label))
            }
            BandRepr::Range { min, max } => Band::new(min, max),
        }
    }
}

impl Band {
    pub fn new(min: f64, max: f64) -> Result<Self, String> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(format!("invalid band range: {}..{}", min, max));
        }
        Ok(Self { min, max })
    }

    /// Map a descriptive label to its range
    ///
    /// Separators are interchangeable: "medium high", "medium_high" and
    /// "medium-high" are the same label.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label
            .trim()
            .to_lowercase()
            .replace(['_', ' '], "-")
            .replace("med-", "medium-");
        let (min, max) = match normalized.as_str() {
            "very-low" => (1.0, 1.5),
            "low" => (1.0, 2.0),
            "medium-low" | "low-medium" => (1.5, 3.0),
            "medium" | "moderate" => (2.5, 3.5),
            "medium-high" | "medium-plus" | "high-medium" => (3.5, 4.5),
            "high" => (4.0, 5.0),
            "very-high" => (4.5, 5.0),
            // sweetness vocabulary
            "bone-dry" => (1.0, 1.0),
            "dry" => (1.0, 1.5),
            "off-dry" | "semi-dry" => (1.5, 2.5),
            "medium-sweet" | "semi-sweet" => (2.5, 3.5),
            "sweet" | "dessert" => (3.5, 5.0),
            _ => return None,
        };
        Some(Self { min, max })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Human-readable form for guest messaging
    pub fn describe(&self) -> String {
        format!("{:.1}-{:.1}", self.min, self.max)
    }
}

/// Optional price limits (either bound may be open)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceBand {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl PriceBand {
    pub fn contains(&self, price: f64) -> bool {
        self.min.map_or(true, |min| price >= min) && self.max.map_or(true, |max| price <= max)
    }
}

/// Structured guest preference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestPreference {
    /// Color/type ("red", "white", "sparkling")
    #[serde(default)]
    pub color: Option<String>,
    /// Body descriptor ("full", "light")
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub tannin: Option<Band>,
    #[serde(default)]
    pub acidity: Option<Band>,
    #[serde(default)]
    pub sweetness: Option<Band>,
    #[serde(default)]
    pub flavor_notes: Vec<String>,
    #[serde(default)]
    pub price: Option<PriceBand>,
}

impl GuestPreference {
    /// True when no scoring criterion is specified
    pub fn is_empty(&self) -> bool {
        self.color.is_none()
            && self.body.is_none()
            && self.tannin.is_none()
            && self.acidity.is_none()
            && self.sweetness.is_none()
            && self.flavor_notes.is_empty()
    }
}
