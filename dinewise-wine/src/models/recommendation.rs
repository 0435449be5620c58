//! Recommendation output types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a recommended wine relates to the guest's preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Perfect,
    Surprise,
}

/// One recommended wine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WineMatch {
    pub wine_id: Uuid,
    pub name: String,
    pub producer: Option<String>,
    pub vintage: Option<i32>,
    pub price: Option<f64>,
    /// Weighted score in [0, 1]
    pub score: f64,
    pub match_type: MatchType,
    /// Criteria the wine does not meet (surprise picks only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missed_criteria: Vec<String>,
}

/// Ranked, diversified recommendation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub restaurant_id: String,
    pub matches: Vec<WineMatch>,
}

impl RecommendationResult {
    pub fn wine_ids(&self) -> Vec<Uuid> {
        self.matches.iter().map(|m| m.wine_id).collect()
    }

    pub fn perfect_count(&self) -> usize {
        self.matches
            .iter()
            .filter(|m| m.match_type == MatchType::Perfect)
            .count()
    }
}
