//! Service wiring
//!
//! Builds every pipeline component once from configuration. Providers are
//! optional: without a research source the enrichment routes answer 503
//! while ingestion and recommendations keep working.

use dinewise_common::config::TomlConfig;
use dinewise_common::time::Clock;
use dinewise_common::{Error, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::enrichment::{
    BackoffPolicy, BatchProcessor, DailyBudget, EnrichmentOrchestrator, EnrichmentSettings,
    QualityGate,
};
use crate::ingestion::{IngestionParser, LlmClassifier, PatternClassifier, WineClassifier};
use crate::providers::{
    ChatClient, LlmResearchProvider, ProviderChain, ResearchProvider, WebResearchProvider,
};
use crate::recommendation::{
    KeywordPreferenceParser, PreferenceParser, RecommendationEngine, SqliteRecommendationLog,
};

/// Pluggable capabilities
pub struct Capabilities {
    /// `None` disables enrichment
    pub research: Option<ProviderChain>,
    pub classifier: Arc<dyn WineClassifier>,
    pub preference_parser: Arc<dyn PreferenceParser>,
}

impl Capabilities {
    /// Build the configured providers
    ///
    /// Web research is the primary source and the chat model the fallback;
    /// the chat model also classifies wine-list lines when available.
    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        let p = &config.providers;
        let timeout = Duration::from_secs(p.request_timeout_secs);
        let mut research: Vec<Arc<dyn ResearchProvider>> = Vec::new();

        if let Some(base_url) = p.research_base_url.as_deref() {
            let key = config.research_api_key();
            let provider = WebResearchProvider::new(base_url, key.as_deref(), p.requests_per_second, timeout)
                .map_err(|e| Error::Config(e.to_string()))?;
            research.push(Arc::new(provider));
        }

        let chat = match (p.llm_base_url.as_deref(), config.llm_api_key()) {
            (Some(base_url), Some(key)) => Some(
                ChatClient::new(base_url, Some(&key), &p.llm_model, p.requests_per_second, timeout)
                    .map_err(|e| Error::Config(e.to_string()))?,
            ),
            (Some(_), None) => {
                warn!("providers.llm_base_url set but no LLM API key found; chat model disabled");
                None
            }
            _ => None,
        };

        let classifier: Arc<dyn WineClassifier> = match &chat {
            Some(client) => {
                research.push(Arc::new(LlmResearchProvider::new(client.clone())));
                Arc::new(LlmClassifier::new(client.clone()))
            }
            None => Arc::new(PatternClassifier::new()),
        };

        let research = ProviderChain::new(research, config.enrichment.escalate_after);
        match &research {
            Some(chain) => info!(providers = ?chain.names(), "Research providers configured"),
            None => warn!("No research provider configured; enrichment disabled"),
        }
        info!(classifier = classifier.name(), "Wine-list classifier selected");

        Ok(Self {
            research,
            classifier,
            preference_parser: Arc::new(KeywordPreferenceParser::new()),
        })
    }
}

/// Enrichment components (present when a research provider exists)
pub struct EnrichmentServices {
    pub orchestrator: Arc<EnrichmentOrchestrator>,
    pub batch: Arc<BatchProcessor>,
}

pub struct Services {
    /// Shared by every batch run
    pub budget: Arc<DailyBudget>,
    pub enrichment: Option<EnrichmentServices>,
    pub ingestion: Arc<IngestionParser>,
    pub recommendations: Arc<RecommendationEngine>,
    pub preference_parser: Arc<dyn PreferenceParser>,
    pub max_batch_limit: u32,
}

impl Services {
    pub fn new(
        db: SqlitePool,
        config: &TomlConfig,
        capabilities: Capabilities,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let budget = Arc::new(DailyBudget::new(config.enrichment.daily_budget, clock.clone()));
        let gate = QualityGate::from_config(&config.quality)?;

        let enrichment = capabilities.research.map(|chain| {
            let orchestrator = Arc::new(EnrichmentOrchestrator::new(
                db.clone(),
                chain,
                budget.clone(),
                gate,
                BackoffPolicy::from_config(&config.enrichment),
                EnrichmentSettings::from_config(&config.enrichment),
                clock,
            ));
            let batch = Arc::new(BatchProcessor::from_config(
                db.clone(),
                orchestrator.clone(),
                &config.enrichment,
            ));
            EnrichmentServices { orchestrator, batch }
        });

        let log = Arc::new(SqliteRecommendationLog::new(db.clone()));

        Ok(Self {
            budget,
            enrichment,
            ingestion: Arc::new(IngestionParser::new(db, capabilities.classifier)),
            recommendations: Arc::new(RecommendationEngine::from_config(&config.recommendation, log)),
            preference_parser: capabilities.preference_parser,
            max_batch_limit: config.enrichment.max_batch_limit,
        })
    }

    pub fn from_config(db: SqlitePool, config: &TomlConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::new(db, config, Capabilities::from_config(config)?, clock)
    }
}
