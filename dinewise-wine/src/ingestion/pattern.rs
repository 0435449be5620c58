//! Offline wine-list line classifier
//!
//! Recognizes the common list shapes:
//!
//! ```text
//! 2018 Ridge Monte Bello, Santa Cruz Mountains  $185
//! NV Krug Grande Cuvée - 350
//! Cloudy Bay Sauvignon Blanc, Marlborough, New Zealand 2023 | 14 / 56
//! ```
//!
//! A line needs a vintage (or an NV marker), a name, and either a price or a
//! comma-separated region. Headings, prose and blank lines yield `None`.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::classifier::{ClassifierError, StructuredWine, WineClassifier};

const CLASSIFIER_NAME: &str = "pattern";

/// Longer than this is prose, not a list entry
const MAX_WORDS: usize = 16;

/// Known varietals with their usual wine type (longest names first)
const VARIETALS: &[(&str, &str)] = &[
    ("Cabernet Sauvignon", "red"),
    ("Gewürztraminer", "white"),
    ("Sauvignon Blanc", "white"),
    ("Cabernet Franc", "red"),
    ("Chenin Blanc", "white"),
    ("Pinot Grigio", "white"),
    ("Tempranillo", "red"),
    ("Chardonnay", "white"),
    ("Sangiovese", "red"),
    ("Pinot Noir", "red"),
    ("Pinot Gris", "white"),
    ("Mourvèdre", "red"),
    ("Zinfandel", "red"),
    ("Albariño", "white"),
    ("Carmenère", "red"),
    ("Nebbiolo", "red"),
    ("Grenache", "red"),
    ("Riesling", "white"),
    ("Viognier", "white"),
    ("Malbec", "red"),
    ("Merlot", "red"),
    ("Shiraz", "red"),
    ("Syrah", "red"),
    ("Gamay", "red"),
];

const COUNTRIES: &[&str] = &[
    "argentina",
    "australia",
    "austria",
    "chile",
    "france",
    "germany",
    "greece",
    "italy",
    "new zealand",
    "portugal",
    "south africa",
    "spain",
    "united states",
    "usa",
];

static GLASS_BOTTLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[$€£]?\s*\d{1,4}(?:\.\d{1,2})?\s*/\s*[$€£]?\s*(\d{1,5}(?:\.\d{1,2})?)\s*$")
        .unwrap_or_else(|e| panic!("invalid glass/bottle pattern: {}", e))
});

static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[\s|:/.–—-])\s*([$€£])?\s*(\d{1,5}(?:\.\d{1,2})?)\s*$")
        .unwrap_or_else(|e| panic!("invalid price pattern: {}", e))
});

static VINTAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap_or_else(|e| panic!("invalid vintage pattern: {}", e))
});

static NV_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|\s)(?:n\.v\.|nv)(?:\s|,|$)")
        .unwrap_or_else(|e| panic!("invalid NV pattern: {}", e))
});

static LEADING_MARK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[•*·–—-]+|#?\d{1,4}[.)])\s*")
        .unwrap_or_else(|e| panic!("invalid bullet pattern: {}", e))
});

static VARIETAL_RE: Lazy<Regex> = Lazy::new(|| {
    let names: Vec<String> = VARIETALS.iter().map(|(name, _)| regex::escape(name)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", names.join("|")))
        .unwrap_or_else(|e| panic!("invalid varietal pattern: {}", e))
});

static SPARKLING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:champagne|prosecco|cava|crémant|cremant|sparkling|spumante|brut)\b")
        .unwrap_or_else(|e| panic!("invalid sparkling pattern: {}", e))
});

static ROSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:rosé|rose|rosado|rosato)\b")
        .unwrap_or_else(|e| panic!("invalid rosé pattern: {}", e))
});

static COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(red|rouge|tinto|rosso|white|blanc|blanco|bianco)\b")
        .unwrap_or_else(|e| panic!("invalid color pattern: {}", e))
});

#[derive(Debug, Default, Clone, Copy)]
pub struct PatternClassifier;

impl PatternClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of [`WineClassifier::classify`]
    pub fn classify_line(&self, line: &str) -> Option<StructuredWine> {
        let mut text = LEADING_MARK_RE.replace(line.trim(), "").trim().to_string();
        if text.is_empty() {
            return None;
        }

        let price = take_price(&mut text);

        let vintage = match VINTAGE_RE.find(&text).map(|m| (m.range(), m.as_str().parse::<i32>().ok())) {
            Some((range, year)) => {
                text.replace_range(range, " ");
                year
            }
            None => {
                let marker = NV_RE
                    .find(&text)
                    .map(|m| (m.range(), m.as_str().ends_with(',')));
                match marker {
                    // keep the segment separator when the marker swallowed it
                    Some((range, had_comma)) => {
                        text.replace_range(range, if had_comma { " ," } else { " " });
                        None
                    }
                    None => return None,
                }
            }
        };

        let segments: Vec<String> = text
            .split(',')
            .map(clean_segment)
            .filter(|s| !s.is_empty())
            .collect();
        let first = segments.first()?;

        if price.is_none() && segments.len() < 2 {
            return None;
        }
        if first.split_whitespace().count() > MAX_WORDS || !first.chars().any(char::is_alphabetic) {
            return None;
        }

        let (producer, name, varietal) = split_producer(first);
        let (region, country) = locate(&segments[1..]);

        Some(StructuredWine {
            name,
            producer,
            vintage,
            region,
            country,
            wine_type: infer_type(line, varietal),
            varietals: varietal.map(|(v, _)| vec![v.to_string()]).unwrap_or_default(),
            price,
        })
    }
}

/// Strip a trailing price (the bottle price for "glass / bottle" pairs)
fn take_price(text: &mut String) -> Option<f64> {
    let glass_bottle = GLASS_BOTTLE_RE
        .captures(text)
        .and_then(|caps| Some((caps.get(0)?.start(), caps[1].parse::<f64>().ok())));
    if let Some((start, price)) = glass_bottle {
        text.truncate(start);
        return price;
    }

    let (start, raw, has_currency) = {
        let caps = PRICE_RE.captures(text)?;
        (caps.get(0)?.start(), caps[2].to_string(), caps.get(1).is_some())
    };
    // A bare four-digit year at the end is the vintage, not a price
    if !has_currency && raw.len() == 4 && VINTAGE_RE.is_match(&raw) {
        return None;
    }
    let price = raw.parse::<f64>().ok()?;
    text.truncate(start);
    Some(price)
}

fn clean_segment(segment: &str) -> String {
    segment
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c.is_whitespace() || "|-–—:./".contains(c))
        .to_string()
}

/// `(producer, name, varietal)` from the leading segment
fn split_producer(segment: &str) -> (Option<String>, String, Option<(&'static str, &'static str)>) {
    if let Some((producer, name)) = segment
        .split_once(" - ")
        .or_else(|| segment.split_once(" – "))
    {
        let producer = producer.trim();
        let name = name.trim();
        if !producer.is_empty() && !name.is_empty() {
            return (Some(producer.to_string()), name.to_string(), find_varietal(name));
        }
    }

    match VARIETAL_RE.find(segment) {
        Some(m) => {
            let varietal = find_varietal(m.as_str());
            let producer = segment[..m.start()].trim();
            if producer.is_empty() {
                (None, segment.to_string(), varietal)
            } else {
                (
                    Some(producer.to_string()),
                    segment[m.start()..].trim().to_string(),
                    varietal,
                )
            }
        }
        None => (None, segment.to_string(), None),
    }
}

fn find_varietal(text: &str) -> Option<(&'static str, &'static str)> {
    let found = VARIETAL_RE.find(text)?.as_str().to_lowercase();
    VARIETALS
        .iter()
        .copied()
        .find(|(name, _)| name.to_lowercase() == found)
}

/// Region and country from the trailing segments
fn locate(rest: &[String]) -> (Option<String>, Option<String>) {
    let is_country = |s: &str| COUNTRIES.contains(&s.to_lowercase().as_str());
    match rest {
        [] => (None, None),
        [only] if is_country(only) => (None, Some(only.clone())),
        [only] => (Some(only.clone()), None),
        [region, country, ..] => (Some(region.clone()), Some(country.clone())),
    }
}

fn infer_type(line: &str, varietal: Option<(&str, &'static str)>) -> Option<String> {
    if SPARKLING_RE.is_match(line) {
        return Some("sparkling".to_string());
    }
    if ROSE_RE.is_match(line) {
        return Some("rosé".to_string());
    }
    if let Some((_, wine_type)) = varietal {
        return Some(wine_type.to_string());
    }
    COLOR_RE.captures(line).map(|caps| {
        match caps[1].to_lowercase().as_str() {
            "red" | "rouge" | "tinto" | "rosso" => "red",
            _ => "white",
        }
        .to_string()
    })
}

#[async_trait]
impl WineClassifier for PatternClassifier {
    fn name(&self) -> &str {
        CLASSIFIER_NAME
    }

    async fn classify(&self, text: &str) -> Result<Option<StructuredWine>, ClassifierError> {
        Ok(self.classify_line(text))
    }
}
