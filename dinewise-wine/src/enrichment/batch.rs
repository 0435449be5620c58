//! Batch enrichment
//!
//! Pulls a window of not-yet-verified wines and enriches them one at a time
//! with a fixed pacing delay between items. Each item races a hard timeout
//! so one hung lookup cannot stall the run. The run ends early, with partial
//! statistics, when the daily budget runs out or the cancellation token
//! fires; both are checked between items only.

use chrono::{DateTime, Utc};
use dinewise_common::config::EnrichmentConfig;
use dinewise_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::orchestrator::EnrichmentOrchestrator;
use crate::db::wines;

/// Why a batch stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every selected wine was attempted
    Completed,
    BudgetExhausted,
    Cancelled,
}

/// Statistics for one batch run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub run_id: Uuid,
    /// Wines selected for this run
    pub selected: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Failures caused by the per-item timeout (included in `failed`)
    pub timed_out: usize,
    pub stop_reason: StopReason,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl BatchStats {
    fn new(run_id: Uuid, selected: usize) -> Self {
        Self {
            run_id,
            selected,
            processed: 0,
            succeeded: 0,
            failed: 0,
            timed_out: 0,
            stop_reason: StopReason::Completed,
            started_at: Utc::now(),
            elapsed_ms: 0,
        }
    }
}

pub struct BatchProcessor {
    db: SqlitePool,
    orchestrator: Arc<EnrichmentOrchestrator>,
    pacing: Duration,
    item_timeout: Duration,
}

impl BatchProcessor {
    pub fn new(
        db: SqlitePool,
        orchestrator: Arc<EnrichmentOrchestrator>,
        pacing: Duration,
        item_timeout: Duration,
    ) -> Self {
        Self {
            db,
            orchestrator,
            pacing,
            item_timeout,
        }
    }

    pub fn from_config(
        db: SqlitePool,
        orchestrator: Arc<EnrichmentOrchestrator>,
        config: &EnrichmentConfig,
    ) -> Self {
        Self::new(
            db,
            orchestrator,
            Duration::from_millis(config.pacing_ms),
            Duration::from_secs(config.item_timeout_secs),
        )
    }

    /// Enrich up to `limit` unverified wines
    ///
    /// Only a failure to load the window is an error; per-wine failures are
    /// counted and the run moves on.
    pub async fn run_batch(
        &self,
        run_id: Uuid,
        limit: u32,
        cancel_token: &CancellationToken,
    ) -> Result<BatchStats> {
        let start_time = Instant::now();
        let window = wines::load_unverified(&self.db, limit).await?;
        let mut stats = BatchStats::new(run_id, window.len());
        let budget = self.orchestrator.budget();

        info!(run_id = %run_id, limit, selected = window.len(), "Enrichment batch started");

        for (index, wine) in window.iter().enumerate() {
            if index > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            if cancel_token.is_cancelled() {
                info!(run_id = %run_id, processed = stats.processed, "Enrichment batch cancelled");
                stats.stop_reason = StopReason::Cancelled;
                break;
            }
            if !budget.can_proceed() {
                info!(run_id = %run_id, processed = stats.processed, "Daily budget exhausted, stopping batch");
                stats.stop_reason = StopReason::BudgetExhausted;
                break;
            }

            match tokio::time::timeout(self.item_timeout, self.orchestrator.enrich(wine)).await {
                Ok(Ok(_)) => {
                    stats.processed += 1;
                    stats.succeeded += 1;
                }
                Ok(Err(e)) if e.is_terminal_for_batch() => {
                    info!(run_id = %run_id, wine_id = %wine.id, "Daily budget exhausted mid-item, stopping batch");
                    stats.stop_reason = StopReason::BudgetExhausted;
                    break;
                }
                Ok(Err(e)) => {
                    stats.processed += 1;
                    stats.failed += 1;
                    warn!(run_id = %run_id, wine_id = %wine.id, kind = ?e.kind(), error = %e, "Wine enrichment failed");
                }
                Err(_) => {
                    stats.processed += 1;
                    stats.failed += 1;
                    stats.timed_out += 1;
                    warn!(
                        run_id = %run_id,
                        wine_id = %wine.id,
                        timeout_secs = self.item_timeout.as_secs(),
                        "Wine enrichment timed out"
                    );
                }
            }
        }

        stats.elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            processed = stats.processed,
            succeeded = stats.succeeded,
            failed = stats.failed,
            stop_reason = ?stats.stop_reason,
            elapsed_ms = stats.elapsed_ms,
            "Enrichment batch finished"
        );
        Ok(stats)
    }
}
