//! Configuration loading and root folder resolution
//!
//! Every tunable of the wine pipeline lives here with its default. Algorithmic
//! code receives these values and never carries its own constants.
//!
//! Config file resolution priority:
//! 1. Command-line `--config` path (highest priority)
//! 2. `DINEWISE_CONFIG` environment variable
//! 3. `<config_dir>/dinewise/dinewise-wine.toml` if it exists
//! 4. Compiled defaults (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "DINEWISE_CONFIG";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "DINEWISE_ROOT_FOLDER";

/// Environment variable carrying the research provider API key
pub const RESEARCH_API_KEY_ENV_VAR: &str = "DINEWISE_RESEARCH_API_KEY";

/// Environment variable carrying the LLM API key
pub const LLM_API_KEY_ENV_VAR: &str = "DINEWISE_LLM_API_KEY";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the database file
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub enrichment: EnrichmentConfig,
    pub quality: QualityConfig,
    pub recommendation: RecommendationConfig,
    pub providers: ProvidersConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (e.g. "info", "dinewise_wine=debug")
    pub level: String,
    /// Emit ANSI colors
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5780,
        }
    }
}

/// Enrichment retry, budget and pacing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// External research calls allowed per UTC day
    pub daily_budget: u32,
    /// Attempts per wine before giving up
    pub max_retries: u32,
    /// First backoff delay
    pub backoff_base_ms: u64,
    /// Backoff ceiling before jitter
    pub backoff_max_ms: u64,
    /// Upper bound (exclusive) of the random jitter added to each delay
    pub jitter_max_ms: u64,
    /// Wall-clock budget for a single wine inside a batch
    pub item_timeout_secs: u64,
    /// Pause between wines inside a batch
    pub pacing_ms: u64,
    /// Attempts spent on each provider before escalating to the next one
    pub escalate_after: u32,
    /// Keep a partial result tagged `failed` when the quality gate rejects the last attempt
    pub persist_partial_on_quality_failure: bool,
    /// Largest `limit` accepted by a single batch run
    pub max_batch_limit: u32,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            daily_budget: 100,
            max_retries: 3,
            backoff_base_ms: 1_000,
            backoff_max_ms: 30_000,
            jitter_max_ms: 1_000,
            item_timeout_secs: 30,
            pacing_ms: 2_000,
            escalate_after: 2,
            persist_partial_on_quality_failure: true,
            max_batch_limit: 200,
        }
    }
}

/// A single critical field of the quality gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityFieldConfig {
    /// Field name (e.g. "flavor_profile", "tannin")
    pub field: String,
    /// Minimum trimmed string length; `None` means "present" (numeric fields)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
}

impl QualityFieldConfig {
    fn text(field: &str, min_length: usize) -> Self {
        Self {
            field: field.to_string(),
            min_length: Some(min_length),
        }
    }

    fn present(field: &str) -> Self {
        Self {
            field: field.to_string(),
            min_length: None,
        }
    }
}

/// Quality gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Minimum completion ratio for a pass
    pub threshold: f64,
    /// Ordered list of critical fields
    pub fields: Vec<QualityFieldConfig>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            threshold: 0.98,
            fields: vec![
                QualityFieldConfig::text("wine_type", 3),
                QualityFieldConfig::text("varietals", 3),
                QualityFieldConfig::text("region", 2),
                QualityFieldConfig::present("acidity"),
                QualityFieldConfig::present("tannin"),
                QualityFieldConfig::present("intensity"),
                QualityFieldConfig::present("sweetness"),
                QualityFieldConfig::text("body", 3),
                QualityFieldConfig::text("flavor_profile", 10),
                QualityFieldConfig::text("aroma", 5),
                QualityFieldConfig::text("serving_temperature", 2),
                QualityFieldConfig::text("aging_potential", 2),
                QualityFieldConfig::text("food_pairing", 10),
                QualityFieldConfig::present("rating"),
            ],
        }
    }
}

/// Per-criterion scoring weights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CriterionWeights {
    pub color: f64,
    pub tannin: f64,
    pub acidity: f64,
    pub body: f64,
    pub sweetness: f64,
    /// Added once per matched flavor keyword
    pub flavor_note: f64,
}

impl Default for CriterionWeights {
    fn default() -> Self {
        Self {
            color: 0.30,
            tannin: 0.20,
            acidity: 0.20,
            body: 0.15,
            sweetness: 0.10,
            flavor_note: 0.05,
        }
    }
}

/// Recommendation selection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub weights: CriterionWeights,
    /// Minimum score for a `perfect` match
    pub perfect_threshold: f64,
    /// Minimum score for a `surprise` pick (upper bound is `perfect_threshold`)
    pub surprise_threshold: f64,
    pub max_perfect: usize,
    pub max_surprise: usize,
    pub max_results: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            weights: CriterionWeights::default(),
            perfect_threshold: 0.70,
            surprise_threshold: 0.40,
            max_perfect: 2,
            max_surprise: 1,
            max_results: 3,
        }
    }
}

/// External provider endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Primary research search endpoint base URL
    pub research_base_url: Option<String>,
    pub research_api_key: Option<String>,
    /// OpenAI-compatible chat completions base URL (fallback research + classification)
    pub llm_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    /// Outbound request rate per provider
    pub requests_per_second: u32,
    pub request_timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            research_base_url: None,
            research_api_key: None,
            llm_base_url: None,
            llm_api_key: None,
            llm_model: "gpt-4o-mini".to_string(),
            requests_per_second: 1,
            request_timeout_secs: 20,
        }
    }
}

impl TomlConfig {
    /// Resolve, load and validate configuration
    ///
    /// A missing file at the default location is not an error; an explicit
    /// path (CLI or environment) that cannot be read is.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let config = match resolve_config_path(cli_path) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                load_toml_config(&path)?
            }
            None => {
                info!("No configuration file found, using defaults");
                TomlConfig::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and cross-field constraints
    pub fn validate(&self) -> Result<()> {
        let e = &self.enrichment;
        if e.max_retries == 0 {
            return Err(Error::Config("enrichment.max_retries must be at least 1".to_string()));
        }
        if e.backoff_base_ms > e.backoff_max_ms {
            return Err(Error::Config(format!(
                "enrichment.backoff_base_ms ({}) exceeds backoff_max_ms ({})",
                e.backoff_base_ms, e.backoff_max_ms
            )));
        }
        if e.escalate_after == 0 {
            return Err(Error::Config("enrichment.escalate_after must be at least 1".to_string()));
        }
        if e.item_timeout_secs == 0 {
            return Err(Error::Config("enrichment.item_timeout_secs must be at least 1".to_string()));
        }

        let q = &self.quality;
        if !(0.0..=1.0).contains(&q.threshold) {
            return Err(Error::Config(format!(
                "quality.threshold must be within [0, 1], got {}",
                q.threshold
            )));
        }
        if q.fields.is_empty() {
            return Err(Error::Config("quality.fields must not be empty".to_string()));
        }

        let r = &self.recommendation;
        for (name, value) in [
            ("perfect_threshold", r.perfect_threshold),
            ("surprise_threshold", r.surprise_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "recommendation.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if r.surprise_threshold >= r.perfect_threshold {
            return Err(Error::Config(format!(
                "recommendation.surprise_threshold ({}) must be below perfect_threshold ({})",
                r.surprise_threshold, r.perfect_threshold
            )));
        }
        if r.max_results == 0 {
            return Err(Error::Config("recommendation.max_results must be at least 1".to_string()));
        }

        if self.providers.requests_per_second == 0 {
            return Err(Error::Config("providers.requests_per_second must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Resolved root folder: environment override, then TOML, then OS default
    pub fn root_folder(&self) -> PathBuf {
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV_VAR) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }
        self.root_folder
            .clone()
            .unwrap_or_else(get_default_root_folder)
    }

    /// Database file inside the root folder
    pub fn database_path(&self) -> PathBuf {
        self.root_folder().join("dinewise.db")
    }

    /// Research provider API key (ENV → TOML)
    pub fn research_api_key(&self) -> Option<String> {
        resolve_api_key(
            "research",
            RESEARCH_API_KEY_ENV_VAR,
            self.providers.research_api_key.as_deref(),
        )
    }

    /// LLM API key (ENV → TOML)
    pub fn llm_api_key(&self) -> Option<String> {
        resolve_api_key("LLM", LLM_API_KEY_ENV_VAR, self.providers.llm_api_key.as_deref())
    }
}

/// Resolve an API key from environment then TOML
///
/// **Priority:** ENV → TOML. Blank values are ignored.
pub fn resolve_api_key(label: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_key = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_value.filter(|k| is_valid_key(k)).map(str::to_string);

    match (env_key, toml_key) {
        (Some(env), Some(_)) => {
            warn!(
                "{} API key found in environment and TOML config. Using environment (highest priority).",
                label
            );
            Some(env)
        }
        (Some(env), None) => {
            info!("{} API key loaded from environment variable", label);
            Some(env)
        }
        (None, Some(toml)) => {
            info!("{} API key loaded from TOML config", label);
            Some(toml)
        }
        (None, None) => None,
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Pick the config file to load, if any
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config file
    dirs::config_dir()
        .map(|d| d.join("dinewise").join("dinewise-wine.toml"))
        .filter(|p| p.exists())
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Get OS-dependent default root folder path
fn get_default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("dinewise"))
        .unwrap_or_else(|| PathBuf::from("./dinewise_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        TomlConfig::default().validate().unwrap();
    }

    #[test]
    fn test_default_quality_fields_are_ordered() {
        let q = QualityConfig::default();
        assert_eq!(q.fields.first().unwrap().field, "wine_type");
        assert_eq!(q.fields.last().unwrap().field, "rating");
        assert!(q.fields.iter().any(|f| f.field == "tannin" && f.min_length.is_none()));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [enrichment]
            daily_budget = 5

            [recommendation]
            perfect_threshold = 0.8
            "#,
        )
        .unwrap();

        assert_eq!(config.enrichment.daily_budget, 5);
        assert_eq!(config.enrichment.max_retries, 3);
        assert_eq!(config.recommendation.perfect_threshold, 0.8);
        assert_eq!(config.recommendation.surprise_threshold, 0.40);
        assert_eq!(config.recommendation.weights.color, 0.30);
    }

    #[test]
    fn test_quality_fields_from_toml() {
        let config: TomlConfig = toml::from_str(
            r#"
            [quality]
            threshold = 0.5
            fields = [
                { field = "body", min_length = 4 },
                { field = "tannin" },
            ]
            "#,
        )
        .unwrap();

        assert_eq!(config.quality.fields.len(), 2);
        assert_eq!(config.quality.fields[0].min_length, Some(4));
        assert_eq!(config.quality.fields[1].min_length, None);
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut config = TomlConfig::default();
        config.recommendation.surprise_threshold = 0.75;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_retries() {
        let mut config = TomlConfig::default();
        config.enrichment.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_backoff_base_above_max() {
        let mut config = TomlConfig::default();
        config.enrichment.backoff_base_ms = 60_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_quality_fields() {
        let mut config = TomlConfig::default();
        config.quality.fields.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key("   "));
        assert!(!is_valid_key(""));
    }
}
