//! Weighted multi-criterion wine scoring
//!
//! A criterion counts only when both the wine and the preference specify
//! it. Matched criteria add their weight; each matched flavor keyword adds
//! the flavor weight again. The total is clamped to [0, 1] and a wine with
//! no comparable criterion scores 0.

use dinewise_common::config::CriterionWeights;

use crate::models::{Band, GuestPreference, WineRecord};

/// Score and the criteria behind it
#[derive(Debug, Clone, PartialEq)]
pub struct WineScore {
    pub score: f64,
    /// Criteria both sides specified
    pub evaluated: usize,
    /// Human-readable descriptions of the criteria the wine fails
    pub missed: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Scorer {
    weights: CriterionWeights,
}

impl Scorer {
    pub fn new(weights: CriterionWeights) -> Self {
        Self { weights }
    }

    pub fn score(&self, wine: &WineRecord, preference: &GuestPreference) -> WineScore {
        let c = &wine.characteristics;
        let mut total = 0.0;
        let mut evaluated = 0;
        let mut missed = Vec::new();

        if let (Some(wanted), Some(actual)) = (preference.color.as_deref(), c.wine_type.as_deref()) {
            evaluated += 1;
            if contains_ignore_case(actual, wanted) {
                total += self.weights.color;
            } else {
                missed.push(format!("{} rather than {}", actual.trim(), wanted.trim()));
            }
        }

        for (label, band, value, weight) in [
            ("tannin", preference.tannin, c.tannin, self.weights.tannin),
            ("acidity", preference.acidity, c.acidity, self.weights.acidity),
            ("sweetness", preference.sweetness, c.sweetness, self.weights.sweetness),
        ] {
            if let (Some(band), Some(value)) = (band, value) {
                evaluated += 1;
                if band.contains(value) {
                    total += weight;
                } else {
                    missed.push(describe_band_miss(label, &band, value));
                }
            }
        }

        if let (Some(wanted), Some(actual)) = (preference.body.as_deref(), c.body.as_deref()) {
            evaluated += 1;
            if contains_ignore_case(actual, wanted) {
                total += self.weights.body;
            } else {
                missed.push(format!("{} body rather than {}", actual.trim(), wanted.trim()));
            }
        }

        let flavor_text = [c.flavor_profile.as_deref(), c.aroma.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let notes: Vec<&str> = preference
            .flavor_notes
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .collect();
        if !notes.is_empty() && !flavor_text.trim().is_empty() {
            evaluated += 1;
            for note in notes {
                if contains_ignore_case(&flavor_text, note) {
                    total += self.weights.flavor_note;
                } else {
                    missed.push(format!("no {} notes", note));
                }
            }
        }

        let score = if evaluated == 0 { 0.0 } else { total.clamp(0.0, 1.0) };
        WineScore {
            score,
            evaluated,
            missed,
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    !needle.is_empty() && haystack.to_lowercase().contains(&needle)
}

fn describe_band_miss(label: &str, band: &Band, value: f64) -> String {
    let direction = if value < band.min { "lower" } else { "higher" };
    format!("{} {} than requested ({:.1} vs {})", label, direction, value, band.describe())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WineIdentity;

    fn scorer() -> Scorer {
        Scorer::new(CriterionWeights::default())
    }

    fn cabernet() -> WineRecord {
        let mut wine = WineRecord::new(WineIdentity::new("Cabernet Sauvignon"));
        wine.characteristics.wine_type = Some("Red".to_string());
        wine.characteristics.tannin = Some(4.5);
        wine.characteristics.acidity = Some(3.0);
        wine.characteristics.body = Some("full-bodied".to_string());
        wine.characteristics.flavor_profile = Some("blackcurrant, cedar, graphite".to_string());
        wine
    }

    fn red_medium_high_tannin() -> GuestPreference {
        GuestPreference {
            color: Some("red".to_string()),
            tannin: Band::from_label("medium-high"),
            ..Default::default()
        }
    }

    #[test]
    fn test_color_and_tannin_match() {
        let result = scorer().score(&cabernet(), &red_medium_high_tannin());
        assert!((result.score - 0.5).abs() < 1e-9);
        assert_eq!(result.evaluated, 2);
        assert!(result.missed.is_empty());
    }

    #[test]
    fn test_unrelated_wine_scores_zero() {
        let mut wine = WineRecord::new(WineIdentity::new("Sauvignon Blanc"));
        wine.characteristics.wine_type = Some("white".to_string());
        wine.characteristics.tannin = Some(1.0);

        let result = scorer().score(&wine, &red_medium_high_tannin());
        assert_eq!(result.score, 0.0);
        assert_eq!(result.missed.len(), 2);
    }

    #[test]
    fn test_nothing_comparable_scores_zero() {
        let wine = WineRecord::new(WineIdentity::new("Mystery"));
        let result = scorer().score(&wine, &red_medium_high_tannin());
        assert_eq!(result.score, 0.0);
        assert_eq!(result.evaluated, 0);
    }

    #[test]
    fn test_flavor_notes_are_additive() {
        let preference = GuestPreference {
            flavor_notes: vec!["cedar".to_string(), "graphite".to_string(), "banana".to_string()],
            ..Default::default()
        };
        let result = scorer().score(&cabernet(), &preference);
        assert!((result.score - 0.10).abs() < 1e-9);
        assert_eq!(result.missed, vec!["no banana notes"]);
    }

    #[test]
    fn test_score_clamped_to_one() {
        let weights = CriterionWeights {
            flavor_note: 0.6,
            ..CriterionWeights::default()
        };
        let preference = GuestPreference {
            color: Some("red".to_string()),
            flavor_notes: vec!["cedar".to_string(), "graphite".to_string()],
            ..Default::default()
        };
        assert_eq!(Scorer::new(weights).score(&cabernet(), &preference).score, 1.0);
    }

    #[test]
    fn test_body_substring_and_band_miss_description() {
        let preference = GuestPreference {
            body: Some("Full".to_string()),
            acidity: Band::from_label("high"),
            ..Default::default()
        };
        let result = scorer().score(&cabernet(), &preference);
        assert!((result.score - 0.15).abs() < 1e-9);
        assert_eq!(result.missed, vec!["acidity lower than requested (3.0 vs 4.0-5.0)"]);
    }
}
