//! Wine enrichment pipeline
//!
//! Leaves first: [`backoff`] and [`budget`] bound the external calls,
//! [`quality_gate`] decides what may be marked verified, [`orchestrator`]
//! drives one wine and [`batch`] drives many.

pub mod backoff;
pub mod batch;
pub mod budget;
pub mod error;
pub mod mapping;
pub mod orchestrator;
pub mod quality_gate;
pub mod retry;

pub use backoff::BackoffPolicy;
pub use batch::{BatchProcessor, BatchStats, StopReason};
pub use budget::{BudgetSnapshot, DailyBudget};
pub use error::{EnrichmentError, EnrichmentErrorKind};
pub use orchestrator::{compose_query, EnrichmentOrchestrator, EnrichmentSettings};
pub use quality_gate::{CriticalField, FieldRequirement, QualityGate, QualityReport};
pub use retry::{with_retry, AttemptOutcome, RetryError};
