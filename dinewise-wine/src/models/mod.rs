//! Domain models for the wine pipeline

pub mod preference;
pub mod recommendation;
pub mod wine;

pub use preference::{Band, GuestPreference, PriceBand};
pub use recommendation::{MatchType, RecommendationResult, WineMatch};
pub use wine::{
    EnrichmentStatus, FieldValue, WineCharacteristics, WineField, WineIdentity, WineRecord,
};

/// A wine on a restaurant's list
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryItem {
    pub wine: WineRecord,
    pub price: Option<f64>,
}
