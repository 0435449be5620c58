//! Recommendation engine
//!
//! Stateless apart from the analytics log: scoring and selection are pure,
//! and a failed log write never fails the recommendation.

use async_trait::async_trait;
use dinewise_common::config::RecommendationConfig;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::scoring::Scorer;
use super::selection::{select, Candidate, SelectionPolicy};
use crate::db::recommendation_log;
use crate::models::{GuestPreference, InventoryItem, RecommendationResult, WineMatch};

/// Analytics sink for recommendation calls
#[async_trait]
pub trait RecommendationLog: Send + Sync {
    async fn record(
        &self,
        restaurant_id: &str,
        preference: &GuestPreference,
        wine_ids: &[Uuid],
    ) -> dinewise_common::Result<()>;
}

/// Writes to the `recommendation_log` table
pub struct SqliteRecommendationLog {
    db: SqlitePool,
}

impl SqliteRecommendationLog {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecommendationLog for SqliteRecommendationLog {
    async fn record(
        &self,
        restaurant_id: &str,
        preference: &GuestPreference,
        wine_ids: &[Uuid],
    ) -> dinewise_common::Result<()> {
        let preference_json = serde_json::to_string(preference)?;
        recommendation_log::insert_log(&self.db, restaurant_id, &preference_json, wine_ids).await?;
        Ok(())
    }
}

pub struct RecommendationEngine {
    scorer: Scorer,
    policy: SelectionPolicy,
    log: Arc<dyn RecommendationLog>,
}

impl RecommendationEngine {
    pub fn new(scorer: Scorer, policy: SelectionPolicy, log: Arc<dyn RecommendationLog>) -> Self {
        Self { scorer, policy, log }
    }

    pub fn from_config(config: &RecommendationConfig, log: Arc<dyn RecommendationLog>) -> Self {
        Self::new(
            Scorer::new(config.weights.clone()),
            SelectionPolicy::from_config(config),
            log,
        )
    }

    /// Score and select without side effects
    ///
    /// Items with a known price outside the preference's price band are
    /// left out before scoring.
    pub fn rank(&self, inventory: &[InventoryItem], preference: &GuestPreference) -> Vec<WineMatch> {
        let candidates: Vec<Candidate<'_>> = inventory
            .iter()
            .filter(|item| match (preference.price, item.price) {
                (Some(band), Some(price)) => band.contains(price),
                _ => true,
            })
            .map(|item| Candidate {
                item,
                score: self.scorer.score(&item.wine, preference),
            })
            .collect();

        select(candidates, &self.policy)
    }

    pub async fn recommend(
        &self,
        restaurant_id: &str,
        inventory: &[InventoryItem],
        preference: &GuestPreference,
    ) -> RecommendationResult {
        let result = RecommendationResult {
            restaurant_id: restaurant_id.to_string(),
            matches: self.rank(inventory, preference),
        };

        debug!(
            restaurant_id = %restaurant_id,
            inventory = inventory.len(),
            matches = result.matches.len(),
            perfect = result.perfect_count(),
            "Recommendations computed"
        );

        if let Err(e) = self.log.record(restaurant_id, preference, &result.wine_ids()).await {
            warn!(restaurant_id = %restaurant_id, error = %e, "Failed to log recommendation call");
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Band, MatchType, PriceBand, WineIdentity, WineRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingLog(AtomicUsize);

    #[async_trait]
    impl RecommendationLog for FailingLog {
        async fn record(
            &self,
            _restaurant_id: &str,
            _preference: &GuestPreference,
            _wine_ids: &[Uuid],
        ) -> dinewise_common::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(dinewise_common::Error::Internal("log store offline".to_string()))
        }
    }

    fn red(name: &str, tannin: f64, price: Option<f64>) -> InventoryItem {
        let mut wine = WineRecord::new(WineIdentity::new(name));
        wine.characteristics.wine_type = Some("red".to_string());
        wine.characteristics.tannin = Some(tannin);
        InventoryItem { wine, price }
    }

    #[tokio::test]
    async fn test_log_failure_does_not_fail_recommendation() {
        let log = Arc::new(FailingLog(AtomicUsize::new(0)));
        let engine = RecommendationEngine::from_config(&RecommendationConfig::default(), log.clone());
        let preference = GuestPreference {
            color: Some("red".to_string()),
            tannin: Band::from_label("high"),
            ..Default::default()
        };

        let result = engine.recommend("r1", &[red("Syrah", 4.5, None)], &preference).await;
        assert_eq!(result.matches.len(), 1);
        assert_eq!(log.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_price_band_filters_known_prices_only() {
        let engine = RecommendationEngine::from_config(
            &RecommendationConfig::default(),
            Arc::new(FailingLog(AtomicUsize::new(0))),
        );
        let preference = GuestPreference {
            color: Some("red".to_string()),
            price: Some(PriceBand { min: None, max: Some(50.0) }),
            ..Default::default()
        };
        let inventory = vec![
            red("Cheap", 3.0, Some(40.0)),
            red("Pricey", 3.0, Some(120.0)),
            red("Unpriced", 3.0, None),
        ];

        let matches = engine.rank(&inventory, &preference);
        let names: Vec<_> = matches.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(!names.contains(&"Pricey"));
        assert!(matches.iter().all(|m| m.match_type == MatchType::Perfect));
    }
}
