//! Map raw provider output onto a wine record
//!
//! Characteristics always come from the fresh provider response; anything the
//! provider left empty or that cannot be interpreted stays `None`. Identity
//! details (region, country, varietals) are only filled when the record does
//! not already carry them. A wine type recorded at ingestion survives when
//! the provider reports none.

use serde_json::Value;

use crate::models::{WineCharacteristics, WineRecord};
use crate::providers::RawCharacteristics;

/// Apply a provider response to a copy of `base`
pub fn apply_research(base: &WineRecord, raw: &RawCharacteristics) -> WineRecord {
    let mut record = base.clone();

    if record.identity.region.is_none() {
        record.identity.region = clean_text(raw.region.as_deref());
    }
    if record.identity.country.is_none() {
        record.identity.country = clean_text(raw.country.as_deref());
    }
    if record.identity.varietals.is_empty() {
        record.identity.varietals = raw.varietals.as_ref().map(to_list).unwrap_or_default();
    }

    record.characteristics = WineCharacteristics {
        wine_type: clean_text(raw.wine_type.as_deref())
            .or_else(|| base.characteristics.wine_type.clone()),
        acidity: raw.acidity.as_ref().and_then(|v| to_scale(v, Scale::Structure)),
        tannin: raw.tannin.as_ref().and_then(|v| to_scale(v, Scale::Structure)),
        intensity: raw.intensity.as_ref().and_then(|v| to_scale(v, Scale::Structure)),
        sweetness: raw.sweetness.as_ref().and_then(|v| to_scale(v, Scale::Sweetness)),
        body: raw.body.as_ref().and_then(to_body),
        flavor_profile: raw.flavor_profile.as_ref().and_then(to_text),
        aroma: raw.aroma.as_ref().and_then(to_text),
        serving_temperature: raw.serving_temperature.as_ref().and_then(to_text),
        aging_potential: raw.aging_potential.as_ref().and_then(to_text),
        food_pairing: raw.food_pairing.as_ref().and_then(to_text),
    };
    record.rating = raw.rating.as_ref().and_then(to_rating);

    record
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scale {
    Structure,
    Sweetness,
}

fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Text field from a string, a number, or a list of strings
fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean_text(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) => {
            let parts = to_list(value);
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}

/// List field from an array or a comma/slash separated string
fn to_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .filter_map(|s| clean_text(Some(s)))
            .collect(),
        Value::String(s) => s
            .split(|c| c == ',' || c == '/' || c == ';')
            .filter_map(|part| clean_text(Some(part)))
            .collect(),
        _ => Vec::new(),
    }
}

fn normalize_label(label: &str) -> String {
    let lowered = label.trim().to_lowercase();
    let expanded = match lowered.as_str() {
        "medium+" | "med+" => "medium-high".to_string(),
        "medium-" | "med-" => "medium-low".to_string(),
        _ => lowered,
    };
    expanded
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn label_to_scale(label: &str, scale: Scale) -> Option<f64> {
    let label = normalize_label(label);
    let structure = match label.as_str() {
        "very-low" => Some(1.0),
        "low" | "light" | "soft" => Some(1.5),
        "medium-low" | "moderately-low" => Some(2.0),
        "medium" | "moderate" => Some(3.0),
        "medium-high" | "moderately-high" | "medium-plus" => Some(4.0),
        "high" | "firm" | "crisp" => Some(4.5),
        "very-high" => Some(5.0),
        _ => None,
    };
    match scale {
        Scale::Structure => structure,
        Scale::Sweetness => match label.as_str() {
            "bone-dry" | "dry" | "brut" => Some(1.0),
            "off-dry" | "medium-dry" | "demi-sec" => Some(2.0),
            "medium-sweet" | "semi-sweet" => Some(3.0),
            "sweet" => Some(4.5),
            "very-sweet" | "lusciously-sweet" | "dessert" => Some(5.0),
            _ => structure,
        },
    }
}

fn number_to_scale(n: f64) -> Option<f64> {
    if !n.is_finite() {
        return None;
    }
    if (1.0..=5.0).contains(&n) {
        Some(n)
    } else if n > 5.0 && n <= 10.0 {
        Some(n / 2.0)
    } else {
        None
    }
}

/// Structure value on the 1-5 scale
fn to_scale(value: &Value, scale: Scale) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().and_then(number_to_scale),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => number_to_scale(n),
            Err(_) => label_to_scale(s, scale),
        },
        _ => None,
    }
}

/// Body descriptor; numeric bodies become light/medium/full
fn to_body(value: &Value) -> Option<String> {
    let numeric = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match numeric {
        Some(n) => number_to_scale(n).map(|v| {
            if v <= 2.0 {
                "light-bodied".to_string()
            } else if v <= 3.5 {
                "medium-bodied".to_string()
            } else {
                "full-bodied".to_string()
            }
        }),
        None => to_text(value),
    }
}

fn to_rating(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (n.is_finite() && n >= 0.0).then_some(n)
}
