//! Chat-model wine-list classifier

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::classifier::{ClassifierError, StructuredWine, WineClassifier};
use crate::providers::ChatClient;

const CLASSIFIER_NAME: &str = "llm";

const SYSTEM_PROMPT: &str = "You extract wines from restaurant wine lists. Given one \
line of a wine list, answer with a single JSON object: {\"is_wine\": bool, \"name\": \
string, \"producer\": string|null, \"vintage\": number|\"NV\"|null, \"region\": \
string|null, \"country\": string|null, \"varietals\": [string], \"wine_type\": \
\"red\"|\"white\"|\"rosé\"|\"sparkling\"|\"dessert\"|\"fortified\"|null, \"price\": \
number|null}. Headings, section titles, descriptions and anything that is not a single \
wine entry get {\"is_wine\": false}. When a glass and a bottle price are both listed, \
use the bottle price.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClassifiedLine {
    is_wine: bool,
    name: Option<String>,
    producer: Option<String>,
    vintage: Option<Value>,
    region: Option<String>,
    country: Option<String>,
    varietals: Vec<String>,
    wine_type: Option<String>,
    price: Option<Value>,
}

pub struct LlmClassifier {
    client: ChatClient,
}

impl LlmClassifier {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches(['$', '€', '£']).parse().ok(),
        _ => None,
    }
}

fn interpret(value: Value) -> Result<Option<StructuredWine>, ClassifierError> {
    let line: ClassifiedLine = serde_json::from_value(value)
        .map_err(|e| ClassifierError::Invalid(format!("unexpected classifier output: {}", e)))?;

    let name = match line.name.as_deref().map(str::trim) {
        Some(name) if line.is_wine && !name.is_empty() => name.to_string(),
        _ => return Ok(None),
    };

    // "NV" and null both mean no vintage; anything else must be a plausible year
    let vintage = match number(line.vintage.as_ref()) {
        Some(year) if (1800.0..=2100.0).contains(&year) => Some(year as i32),
        Some(year) => {
            return Err(ClassifierError::Invalid(format!("implausible vintage {}", year)));
        }
        None => None,
    };

    Ok(Some(StructuredWine {
        name,
        producer: line.producer,
        vintage,
        region: line.region,
        country: line.country,
        varietals: line.varietals,
        wine_type: line.wine_type,
        price: number(line.price.as_ref()).filter(|p| p.is_finite() && *p >= 0.0),
    }))
}

#[async_trait]
impl WineClassifier for LlmClassifier {
    fn name(&self) -> &str {
        CLASSIFIER_NAME
    }

    async fn classify(&self, text: &str) -> Result<Option<StructuredWine>, ClassifierError> {
        let value = self.client.complete_json(SYSTEM_PROMPT, text).await?;
        interpret(value)
    }
}
