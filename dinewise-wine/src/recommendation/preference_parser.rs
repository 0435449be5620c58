//! Guest free text to structured preference
//!
//! The engine only needs a [`GuestPreference`]; any [`PreferenceParser`] can
//! supply one. [`KeywordPreferenceParser`] is a vocabulary-based parser that
//! needs no external service.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::{Band, GuestPreference, PriceBand};

#[derive(Debug, Error)]
pub enum PreferenceParseError {
    #[error("Guest description is empty")]
    Empty,

    #[error("Preference parser backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait PreferenceParser: Send + Sync {
    async fn parse(&self, description: &str) -> Result<GuestPreference, PreferenceParseError>;
}

const FLAVOR_VOCABULARY: &[&str] = &[
    "apple", "apricot", "berry", "blackberry", "blackcurrant", "butter", "cassis", "cedar",
    "cherry", "chocolate", "citrus", "coffee", "earth", "floral", "grapefruit", "herb",
    "honey", "lemon", "leather", "mineral", "oak", "peach", "pear", "pepper", "plum",
    "raspberry", "smoke", "spice", "strawberry", "tobacco", "tropical", "vanilla", "violet",
];

const MODIFIER: &str = r"(very high|very low|medium[- ]high|medium[- ]low|high|low|medium|moderate|soft|firm|big|gentle|bright|crisp)";

static TANNIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b{}\s+tannins?\b", MODIFIER))
        .unwrap_or_else(|e| panic!("invalid tannin pattern: {}", e))
});

static ACIDITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b{}\s+acid(?:ity|ic)?\b", MODIFIER))
        .unwrap_or_else(|e| panic!("invalid acidity pattern: {}", e))
});

static PRICE_MAX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:under|below|less than|up to|max(?:imum)?|no more than)\s*[$€£]?\s*(\d+(?:\.\d+)?)")
        .unwrap_or_else(|e| panic!("invalid price pattern: {}", e))
});

static PRICE_MIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:over|above|more than|at least)\s*[$€£]?\s*(\d+(?:\.\d+)?)")
        .unwrap_or_else(|e| panic!("invalid price pattern: {}", e))
});

static PRICE_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[$€£]\s*(\d+(?:\.\d+)?)\s*(?:-|–|to)\s*[$€£]?\s*(\d+(?:\.\d+)?)")
        .unwrap_or_else(|e| panic!("invalid price pattern: {}", e))
});

#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordPreferenceParser;

impl KeywordPreferenceParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_text(&self, description: &str) -> GuestPreference {
        let text = description.to_lowercase();
        let has = |word: &str| contains_word(&text, word);

        let color = if ["sparkling", "bubbles", "bubbly", "champagne", "prosecco"].iter().any(|w| has(w)) {
            Some("sparkling")
        } else if ["rosé", "rose", "pink"].iter().any(|w| has(w)) {
            Some("rosé")
        } else if has("red") {
            Some("red")
        } else if has("white") {
            Some("white")
        } else {
            None
        };

        let body = if text.contains("full-bodied") || text.contains("full bodied") || has("bold") {
            Some("full")
        } else if text.contains("light-bodied") || text.contains("light bodied") || has("light") {
            Some("light")
        } else if text.contains("medium-bodied") || text.contains("medium bodied") {
            Some("medium")
        } else {
            None
        };

        let tannin = band_from_modifier(&TANNIN_RE, &text).or_else(|| {
            if has("tannic") || has("grippy") {
                Band::from_label("high")
            } else if has("smooth") || has("silky") {
                Band::from_label("low")
            } else {
                None
            }
        });

        let acidity = band_from_modifier(&ACIDITY_RE, &text).or_else(|| {
            if has("crisp") || has("zesty") || has("zippy") || has("refreshing") {
                Band::from_label("high")
            } else {
                None
            }
        });

        let sweetness = if text.contains("bone dry") || text.contains("bone-dry") {
            Band::from_label("bone-dry")
        } else if text.contains("off-dry") || text.contains("off dry") {
            Band::from_label("off-dry")
        } else if text.contains("not too sweet") || text.contains("not sweet") || has("dry") {
            Band::from_label("dry")
        } else if has("sweet") || has("dessert") {
            Band::from_label("sweet")
        } else {
            None
        };

        let flavor_notes = FLAVOR_VOCABULARY
            .iter()
            .filter(|note| contains_word(&text, note) || contains_word(&text, &format!("{}s", note)))
            .map(|note| note.to_string())
            .collect();

        GuestPreference {
            color: color.map(str::to_string),
            body: body.map(str::to_string),
            tannin,
            acidity,
            sweetness,
            flavor_notes,
            price: parse_price(&text),
        }
    }
}

fn contains_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + word.len()..].chars().next();
        !before.map_or(false, char::is_alphanumeric) && !after.map_or(false, char::is_alphanumeric)
    })
}

fn band_from_modifier(re: &Regex, text: &str) -> Option<Band> {
    let caps = re.captures(text)?;
    let label = match caps[1].to_lowercase().replace(' ', "-").as_str() {
        "soft" | "gentle" => "low".to_string(),
        "firm" | "big" | "bright" | "crisp" => "high".to_string(),
        other => other.to_string(),
    };
    Band::from_label(&label)
}

fn parse_price(text: &str) -> Option<PriceBand> {
    if let Some(caps) = PRICE_RANGE_RE.captures(text) {
        let (a, b) = (caps[1].parse::<f64>().ok()?, caps[2].parse::<f64>().ok()?);
        return Some(PriceBand {
            min: Some(a.min(b)),
            max: Some(a.max(b)),
        });
    }
    let max = PRICE_MAX_RE.captures(text).and_then(|c| c[1].parse::<f64>().ok());
    let min = PRICE_MIN_RE.captures(text).and_then(|c| c[1].parse::<f64>().ok());
    (min.is_some() || max.is_some()).then_some(PriceBand { min, max })
}

#[async_trait]
impl PreferenceParser for KeywordPreferenceParser {
    async fn parse(&self, description: &str) -> Result<GuestPreference, PreferenceParseError> {
        if description.trim().is_empty() {
            return Err(PreferenceParseError::Empty);
        }
        Ok(self.parse_text(description))
    }
}
