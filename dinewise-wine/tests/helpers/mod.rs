//! Test Helper Utilities
//!
//! Shared fixtures for dinewise-wine integration tests: in-memory database,
//! scripted research providers and service wiring without network access.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use dinewise_common::config::TomlConfig;
use dinewise_common::db::init_memory_database;
use dinewise_common::time::ManualClock;
use serde_json::json;
use sqlx::SqlitePool;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dinewise_wine::db::wines;
use dinewise_wine::ingestion::PatternClassifier;
use dinewise_wine::models::{WineIdentity, WineRecord};
use dinewise_wine::providers::{ProviderChain, ProviderError, RawCharacteristics, ResearchProvider};
use dinewise_wine::recommendation::KeywordPreferenceParser;
use dinewise_wine::services::{Capabilities, Services};

/// One scripted provider response
#[derive(Debug, Clone)]
pub enum Step {
    Found(RawCharacteristics),
    Fail,
    /// Never answers (exercises the per-item timeout)
    Hang,
}

/// Research provider that replays a script, repeating the last step
pub struct ScriptedProvider {
    name: String,
    script: Mutex<VecDeque<Step>>,
    last: Mutex<Step>,
    calls: AtomicU32,
    queries: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn sequence(name: &str, steps: Vec<Step>) -> Arc<Self> {
        let last = steps.last().cloned().unwrap_or(Step::Fail);
        Arc::new(Self {
            name: name.to_string(),
            script: Mutex::new(steps.into()),
            last: Mutex::new(last),
            calls: AtomicU32::new(0),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn always(name: &str, step: Step) -> Arc<Self> {
        Self::sequence(name, vec![step])
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResearchProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, query: &str) -> Result<RawCharacteristics, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());

        let step = {
            let mut script = self.script.lock().unwrap();
            match script.pop_front() {
                Some(step) => {
                    *self.last.lock().unwrap() = step.clone();
                    step
                }
                None => self.last.lock().unwrap().clone(),
            }
        };

        match step {
            Step::Found(raw) => Ok(raw),
            Step::Fail => Err(ProviderError::Api {
                status: 503,
                message: "upstream unavailable".to_string(),
            }),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ProviderError::Timeout)
            }
        }
    }
}

/// Research result that satisfies every default critical field
pub fn complete_research() -> RawCharacteristics {
    serde_json::from_value(json!({
        "wine_type": "red",
        "region": "Napa Valley",
        "country": "USA",
        "varietals": ["Cabernet Sauvignon"],
        "acidity": "medium",
        "tannin": "high",
        "intensity": 4,
        "sweetness": "dry",
        "body": "full-bodied",
        "flavor_profile": "blackcurrant, cedar, graphite",
        "aroma": "cassis and tobacco",
        "serving_temperature": "16-18C",
        "aging_potential": "10-20 years",
        "food_pairing": "grilled ribeye, aged cheddar",
        "rating": 93
    }))
    .unwrap()
}

/// Research result with only a couple of fields
pub fn sparse_research() -> RawCharacteristics {
    serde_json::from_value(json!({
        "wine_type": "red",
        "tannin": "high"
    }))
    .unwrap()
}

/// Configuration with no waiting anywhere
pub fn test_config(daily_budget: u32) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.enrichment.daily_budget = daily_budget;
    config.enrichment.max_retries = 3;
    config.enrichment.backoff_base_ms = 0;
    config.enrichment.backoff_max_ms = 0;
    config.enrichment.jitter_max_ms = 0;
    config.enrichment.pacing_ms = 0;
    config.enrichment.escalate_after = 2;
    config
}

pub fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 14, 18, 30, 0).unwrap(),
    ))
}

pub async fn create_test_db() -> SqlitePool {
    init_memory_database()
        .await
        .expect("Failed to create in-memory database")
}

/// Services over `pool` with the given research providers (in priority order)
pub fn create_services(
    pool: &SqlitePool,
    config: &TomlConfig,
    providers: Vec<Arc<dyn ResearchProvider>>,
) -> Services {
    let capabilities = Capabilities {
        research: ProviderChain::new(providers, config.enrichment.escalate_after),
        classifier: Arc::new(PatternClassifier::new()),
        preference_parser: Arc::new(KeywordPreferenceParser::new()),
    };
    Services::new(pool.clone(), config, capabilities, test_clock())
        .expect("Failed to build services")
}

/// Insert `count` unverified wines, returning them in insertion order
pub async fn seed_wines(pool: &SqlitePool, count: usize) -> Vec<WineRecord> {
    let mut seeded = Vec::with_capacity(count);
    for i in 0..count {
        let identity = WineIdentity::new(format!("Test Cuvée {}", i + 1))
            .with_producer("Domaine Example")
            .with_vintage(2015 + i as i32);
        let (wine, inserted) = wines::insert_if_absent(pool, &WineRecord::new(identity))
            .await
            .expect("Failed to seed wine");
        assert!(inserted);
        seeded.push(wine);
    }
    seeded
}

pub async fn reload(pool: &SqlitePool, wine: &WineRecord) -> WineRecord {
    wines::load_wine(pool, wine.id)
        .await
        .expect("Failed to load wine")
        .expect("Wine missing")
}
