//! Ranked, diversified selection
//!
//! 1. Rank by score descending; ties go to the higher rating, then the lower
//!    wine id
//! 2. Up to `max_perfect` wines at or above the perfect threshold
//! 3. Up to `max_surprise` unselected wines in the surprise band, each
//!    carrying its missed criteria
//! 4. Backfill from the best remaining wines with a non-zero score until
//!    `max_results` are chosen. Backfill is tagged `perfect` while that tag
//!    has room, `surprise` afterwards
//!
//! Output lists `perfect` entries first, then `surprise`, each by rank.

use dinewise_common::config::RecommendationConfig;
use std::cmp::Ordering;

use super::scoring::WineScore;
use crate::models::{InventoryItem, MatchType, WineMatch};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPolicy {
    pub perfect_threshold: f64,
    pub surprise_threshold: f64,
    pub max_perfect: usize,
    pub max_surprise: usize,
    pub max_results: usize,
}

impl SelectionPolicy {
    pub fn from_config(config: &RecommendationConfig) -> Self {
        Self {
            perfect_threshold: config.perfect_threshold,
            surprise_threshold: config.surprise_threshold,
            max_perfect: config.max_perfect,
            max_surprise: config.max_surprise,
            max_results: config.max_results,
        }
    }
}

/// A scored inventory item
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub item: &'a InventoryItem,
    pub score: WineScore,
}

fn rank(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    b.score
        .score
        .total_cmp(&a.score.score)
        .then_with(|| {
            let ra = a.item.wine.rating.unwrap_or(f64::NEG_INFINITY);
            let rb = b.item.wine.rating.unwrap_or(f64::NEG_INFINITY);
            rb.total_cmp(&ra)
        })
        .then_with(|| a.item.wine.id.cmp(&b.item.wine.id))
}

fn to_match(candidate: &Candidate<'_>, match_type: MatchType) -> WineMatch {
    let wine = &candidate.item.wine;
    WineMatch {
        wine_id: wine.id,
        name: wine.identity.name.clone(),
        producer: wine.identity.producer.clone(),
        vintage: wine.identity.vintage,
        price: candidate.item.price,
        score: candidate.score.score,
        match_type,
        missed_criteria: match match_type {
            MatchType::Surprise => candidate.score.missed.clone(),
            MatchType::Perfect => Vec::new(),
        },
    }
}

pub fn select(mut candidates: Vec<Candidate<'_>>, policy: &SelectionPolicy) -> Vec<WineMatch> {
    candidates.sort_by(rank);

    // (rank index, tag) of every chosen candidate
    let mut chosen: Vec<(usize, MatchType)> = Vec::new();
    let is_chosen = |chosen: &[(usize, MatchType)], index: usize| chosen.iter().any(|(i, _)| *i == index);
    let count = |chosen: &[(usize, MatchType)], tag: MatchType| chosen.iter().filter(|(_, t)| *t == tag).count();

    for (index, candidate) in candidates.iter().enumerate() {
        if chosen.len() >= policy.max_results || count(&chosen, MatchType::Perfect) >= policy.max_perfect {
            break;
        }
        if candidate.score.score >= policy.perfect_threshold {
            chosen.push((index, MatchType::Perfect));
        }
    }

    for (index, candidate) in candidates.iter().enumerate() {
        if chosen.len() >= policy.max_results || count(&chosen, MatchType::Surprise) >= policy.max_surprise {
            break;
        }
        let score = candidate.score.score;
        if !is_chosen(&chosen, index) && score >= policy.surprise_threshold && score < policy.perfect_threshold {
            chosen.push((index, MatchType::Surprise));
        }
    }

    for (index, candidate) in candidates.iter().enumerate() {
        if chosen.len() >= policy.max_results {
            break;
        }
        if is_chosen(&chosen, index) || candidate.score.score <= 0.0 {
            continue;
        }
        let tag = if count(&chosen, MatchType::Perfect) < policy.max_perfect {
            MatchType::Perfect
        } else {
            MatchType::Surprise
        };
        chosen.push((index, tag));
    }

    // perfect first, then surprise; rank order within each
    chosen.sort_by_key(|(index, tag)| (*tag != MatchType::Perfect, *index));
    chosen
        .into_iter()
        .map(|(index, tag)| to_match(&candidates[index], tag))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{WineIdentity, WineRecord};
    use uuid::Uuid;

    fn policy() -> SelectionPolicy {
        SelectionPolicy::from_config(&RecommendationConfig::default())
    }

    fn item(id: u128, rating: Option<f64>) -> InventoryItem {
        let mut wine = WineRecord::new(WineIdentity::new(format!("Wine {}", id)));
        wine.id = Uuid::from_u128(id);
        wine.rating = rating;
        InventoryItem { wine, price: None }
    }

    fn candidate(item: &InventoryItem, score: f64) -> Candidate<'_> {
        Candidate {
            item,
            score: WineScore {
                score,
                evaluated: 1,
                missed: vec![format!("missed by {}", item.wine.identity.name)],
            },
        }
    }

    fn ids(matches: &[WineMatch]) -> Vec<u128> {
        matches.iter().map(|m| m.wine_id.as_u128()).collect()
    }

    #[test]
    fn test_two_perfect_one_surprise() {
        let items: Vec<_> = (1..=5).map(|i| item(i, None)).collect();
        let scores = [0.95, 0.90, 0.80, 0.55, 0.45];
        let candidates = items.iter().zip(scores).map(|(i, s)| candidate(i, s)).collect();

        let matches = select(candidates, &policy());
        assert_eq!(ids(&matches), vec![1, 2, 4]);
        assert_eq!(matches[2].match_type, MatchType::Surprise);
        assert_eq!(matches[2].missed_criteria, vec!["missed by Wine 4"]);
        assert!(matches[0].missed_criteria.is_empty());
    }

    #[test]
    fn test_backfill_fills_perfect_then_surprise() {
        let items: Vec<_> = (1..=4).map(|i| item(i, None)).collect();
        let scores = [0.30, 0.25, 0.20, 0.0];
        let candidates = items.iter().zip(scores).map(|(i, s)| candidate(i, s)).collect();

        let matches = select(candidates, &policy());
        assert_eq!(ids(&matches), vec![1, 2, 3]);
        assert_eq!(matches[0].match_type, MatchType::Perfect);
        assert_eq!(matches[1].match_type, MatchType::Perfect);
        assert_eq!(matches[2].match_type, MatchType::Surprise);
    }

    #[test]
    fn test_backfill_skips_zero_scores() {
        let items: Vec<_> = (1..=3).map(|i| item(i, None)).collect();
        let scores = [0.5, 0.0, 0.0];
        let candidates = items.iter().zip(scores).map(|(i, s)| candidate(i, s)).collect();

        let matches = select(candidates, &policy());
        assert_eq!(ids(&matches), vec![1]);
        assert_eq!(matches[0].match_type, MatchType::Surprise);
    }

    #[test]
    fn test_perfect_cap_with_three_high_scores() {
        let items: Vec<_> = (1..=3).map(|i| item(i, None)).collect();
        let scores = [0.9, 0.85, 0.8];
        let candidates = items.iter().zip(scores).map(|(i, s)| candidate(i, s)).collect();

        let matches = select(candidates, &policy());
        assert_eq!(matches.len(), 3);
        assert_eq!(matches.iter().filter(|m| m.match_type == MatchType::Perfect).count(), 2);
        assert_eq!(matches[2].wine_id.as_u128(), 3);
        assert_eq!(matches[2].match_type, MatchType::Surprise);
    }

    #[test]
    fn test_tie_break_rating_then_id() {
        let items = vec![item(3, Some(90.0)), item(2, Some(94.0)), item(1, Some(90.0)), item(4, None)];
        let candidates = items.iter().map(|i| candidate(i, 0.8)).collect();

        let matches = select(candidates, &policy());
        assert_eq!(ids(&matches), vec![2, 1, 3]);
    }

    #[test]
    fn test_empty_inventory() {
        assert!(select(Vec::new(), &policy()).is_empty());
    }

    #[test]
    fn test_within_tag_order_is_non_increasing() {
        let items: Vec<_> = (1..=6).map(|i| item(i, None)).collect();
        let scores = [0.1, 0.75, 0.2, 0.65, 0.9, 0.3];
        let candidates = items.iter().zip(scores).map(|(i, s)| candidate(i, s)).collect();

        let matches = select(candidates, &policy());
        assert!(matches.len() <= 3);
        for tag in [MatchType::Perfect, MatchType::Surprise] {
            let scores: Vec<f64> = matches.iter().filter(|m| m.match_type == tag).map(|m| m.score).collect();
            assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
