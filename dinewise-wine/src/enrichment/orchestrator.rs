//! Enrichment orchestrator
//!
//! Drives one wine through research attempts:
//!
//! 1. Take one unit of daily budget, or stop with `BudgetExhausted`
//! 2. Ask the provider chosen by the [`ProviderChain`] for this attempt
//! 3. Map the response and run the [`QualityGate`]
//! 4. Provider failures and gate failures are retried with backoff until
//!    `max_retries` attempts have been made
//!
//! A successful wine is written exactly once, with status `verified`.

use dinewise_common::config::EnrichmentConfig;
use dinewise_common::time::Clock;
use sqlx::SqlitePool;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::backoff::BackoffPolicy;
use super::budget::DailyBudget;
use super::error::EnrichmentError;
use super::mapping::apply_research;
use super::quality_gate::{QualityGate, QualityReport};
use super::retry::{with_retry, AttemptOutcome, RetryError};
use crate::db::wines;
use crate::models::{EnrichmentStatus, WineIdentity, WineRecord};
use crate::providers::ProviderChain;

/// Per-wine retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentSettings {
    pub max_retries: u32,
    /// Keep the last below-threshold result (status `failed`) instead of
    /// discarding it
    pub persist_partial_on_quality_failure: bool,
}

impl EnrichmentSettings {
    pub fn from_config(config: &EnrichmentConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            persist_partial_on_quality_failure: config.persist_partial_on_quality_failure,
        }
    }
}

/// Result of an attempt that passed the gate
struct Accepted {
    record: WineRecord,
    source: String,
    attempts: u32,
}

/// Why a single attempt did not produce a verified record
enum AttemptFailure {
    Budget,
    Provider {
        provider: String,
        error: String,
    },
    Quality {
        provider: String,
        candidate: Box<WineRecord>,
        report: QualityReport,
    },
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Budget => write!(f, "daily research budget exhausted"),
            AttemptFailure::Provider { provider, error } => write!(f, "{}: {}", provider, error),
            AttemptFailure::Quality { provider, report, .. } => {
                f.write_str(&quality_failure_message(provider, report))
            }
        }
    }
}

fn quality_failure_message(provider: &str, report: &QualityReport) -> String {
    format!(
        "{}: quality gate failed ({:.0}% complete, missing: {})",
        provider,
        report.completion_ratio * 100.0,
        report.missing_fields.join(", ")
    )
}

/// Search query from the identity fields that are present
///
/// Missing fields are left out; the query never waits on them.
pub fn compose_query(identity: &WineIdentity) -> String {
    let vintage = identity.vintage.map(|v| v.to_string());
    [
        identity.producer.as_deref(),
        Some(identity.name.as_str()),
        vintage.as_deref(),
        identity.region.as_deref(),
        identity.country.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

pub struct EnrichmentOrchestrator {
    db: SqlitePool,
    chain: ProviderChain,
    budget: Arc<DailyBudget>,
    gate: QualityGate,
    backoff: BackoffPolicy,
    settings: EnrichmentSettings,
    clock: Arc<dyn Clock>,
}

impl EnrichmentOrchestrator {
    pub fn new(
        db: SqlitePool,
        chain: ProviderChain,
        budget: Arc<DailyBudget>,
        gate: QualityGate,
        backoff: BackoffPolicy,
        settings: EnrichmentSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            chain,
            budget,
            gate,
            backoff,
            settings,
            clock,
        }
    }

    pub fn budget(&self) -> &Arc<DailyBudget> {
        &self.budget
    }

    pub fn settings(&self) -> EnrichmentSettings {
        self.settings
    }

    /// Research, validate and persist one wine
    pub async fn enrich(&self, wine: &WineRecord) -> Result<WineRecord, EnrichmentError> {
        let query = compose_query(&wine.identity);
        info!(wine_id = %wine.id, query = %query, "Enriching wine");

        let query_ref = query.as_str();
        let outcome = with_retry(
            "enrich_wine",
            &self.backoff,
            self.settings.max_retries,
            move |attempt| self.attempt(wine, query_ref, attempt),
        )
        .await;

        match outcome {
            Ok(accepted) => self.persist_verified(wine, accepted).await,
            Err(RetryError::Aborted { attempt, .. }) => {
                // Budget ran out; `attempt` calls were already made for this wine
                if attempt > 0 {
                    wines::record_failure(
                        &self.db,
                        wine.id,
                        EnrichmentStatus::Pending,
                        attempt,
                        "daily research budget exhausted",
                    )
                    .await?;
                }
                warn!(wine_id = %wine.id, attempts = attempt, "Enrichment stopped: daily budget exhausted");
                Err(EnrichmentError::BudgetExhausted)
            }
            Err(RetryError::Exhausted {
                attempts,
                last_error:
                    AttemptFailure::Quality {
                        provider,
                        candidate,
                        report,
                    },
            }) => {
                self.handle_quality_failure(*candidate, provider, report, attempts)
                    .await
            }
            Err(RetryError::Exhausted {
                attempts,
                last_error,
            }) => {
                let message = last_error.to_string();
                wines::record_failure(
                    &self.db,
                    wine.id,
                    EnrichmentStatus::Failed,
                    attempts,
                    &message,
                )
                .await?;
                warn!(wine_id = %wine.id, attempts, error = %message, "Enrichment failed: max retries exceeded");
                Err(EnrichmentError::MaxRetriesExceeded {
                    attempts,
                    last_error: message,
                })
            }
        }
    }

    async fn attempt(
        &self,
        wine: &WineRecord,
        query: &str,
        attempt: u32,
    ) -> AttemptOutcome<Accepted, AttemptFailure> {
        if !self.budget.try_acquire() {
            return AttemptOutcome::Abort(AttemptFailure::Budget);
        }

        let provider = self.chain.select(attempt);
        let provider_name = provider.name().to_string();
        debug!(wine_id = %wine.id, attempt, provider = %provider_name, "Research attempt");

        let raw = match provider.lookup(query).await {
            Ok(raw) => raw,
            Err(e) => {
                return AttemptOutcome::Retry(AttemptFailure::Provider {
                    provider: provider_name,
                    error: e.to_string(),
                })
            }
        };

        let candidate = apply_research(wine, &raw);
        let report = self.gate.evaluate(&candidate);
        if !report.passed {
            debug!(
                wine_id = %wine.id,
                attempt,
                completion_ratio = report.completion_ratio,
                missing = ?report.missing_fields,
                "Research result below quality threshold"
            );
            return AttemptOutcome::Retry(AttemptFailure::Quality {
                provider: provider_name,
                candidate: Box::new(candidate),
                report,
            });
        }

        AttemptOutcome::Success(Accepted {
            record: candidate,
            source: provider_name,
            attempts: attempt + 1,
        })
    }

    async fn persist_verified(
        &self,
        wine: &WineRecord,
        accepted: Accepted,
    ) -> Result<WineRecord, EnrichmentError> {
        let mut record = accepted.record;
        record.status = EnrichmentStatus::Verified;
        record.verification_source = Some(accepted.source);
        record.enrichment_attempts = wine.enrichment_attempts + accepted.attempts as i64;
        record.last_enrichment_error = None;
        record.enriched_at = Some(self.clock.now());

        wines::save_enrichment(&self.db, &record).await?;

        info!(
            wine_id = %record.id,
            attempts = accepted.attempts,
            source = record.verification_source.as_deref().unwrap_or_default(),
            "Wine verified"
        );
        Ok(record)
    }

    async fn handle_quality_failure(
        &self,
        mut candidate: WineRecord,
        provider: String,
        report: QualityReport,
        attempts: u32,
    ) -> Result<WineRecord, EnrichmentError> {
        let message = quality_failure_message(&provider, &report);

        let partial_persisted = if self.settings.persist_partial_on_quality_failure {
            candidate.status = EnrichmentStatus::Failed;
            candidate.verification_source = Some(provider);
            candidate.enrichment_attempts += attempts as i64;
            candidate.last_enrichment_error = Some(message.clone());
            wines::save_partial_enrichment(&self.db, &candidate).await?
        } else {
            wines::record_failure(
                &self.db,
                candidate.id,
                EnrichmentStatus::Failed,
                attempts,
                &message,
            )
            .await?;
            false
        };

        warn!(
            wine_id = %candidate.id,
            attempts,
            completion_ratio = report.completion_ratio,
            partial_persisted,
            "Enrichment failed: quality gate not met"
        );
        Err(EnrichmentError::QualityGateFailure {
            report,
            partial_persisted,
        })
    }
}
