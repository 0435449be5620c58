//! Enrichment failure taxonomy

use serde::Serialize;
use thiserror::Error;

use super::quality_gate::QualityReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentErrorKind {
    BudgetExhausted,
    MaxRetriesExceeded,
    QualityGateFailure,
    StorageWrite,
}

/// Why a single wine could not be enriched
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// No budget left today; not a failure of the wine
    #[error("Daily research budget exhausted")]
    BudgetExhausted,

    /// Every attempt failed at the provider
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },

    /// The last attempt returned data below the quality threshold
    #[error(
        "Quality gate failed ({:.0}% complete, missing: {})",
        .report.completion_ratio * 100.0,
        .report.missing_fields.join(", ")
    )]
    QualityGateFailure {
        report: QualityReport,
        /// The partial result was kept with status `failed`
        partial_persisted: bool,
    },

    /// Reading or writing the wine record failed
    #[error("Storage error: {0}")]
    StorageWrite(#[from] dinewise_common::Error),
}

impl EnrichmentError {
    pub fn kind(&self) -> EnrichmentErrorKind {
        match self {
            EnrichmentError::BudgetExhausted => EnrichmentErrorKind::BudgetExhausted,
            EnrichmentError::MaxRetriesExceeded { .. } => EnrichmentErrorKind::MaxRetriesExceeded,
            EnrichmentError::QualityGateFailure { .. } => EnrichmentErrorKind::QualityGateFailure,
            EnrichmentError::StorageWrite(_) => EnrichmentErrorKind::StorageWrite,
        }
    }

    /// Whether a batch must stop after this error
    ///
    /// Only budget exhaustion ends a batch; every other error is confined to
    /// the wine that raised it.
    pub fn is_terminal_for_batch(&self) -> bool {
        matches!(self, EnrichmentError::BudgetExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_budget_stops_batch() {
        assert!(EnrichmentError::BudgetExhausted.is_terminal_for_batch());
        assert!(!EnrichmentError::MaxRetriesExceeded {
            attempts: 3,
            last_error: "timeout".to_string()
        }
        .is_terminal_for_batch());
        assert!(!EnrichmentError::StorageWrite(dinewise_common::Error::Internal("x".into()))
            .is_terminal_for_batch());
    }

    #[test]
    fn test_quality_failure_message() {
        let err = EnrichmentError::QualityGateFailure {
            report: QualityReport {
                passed: false,
                missing_fields: vec!["aroma".to_string(), "tannin".to_string()],
                completion_ratio: 0.5,
            },
            partial_persisted: true,
        };
        assert_eq!(err.kind(), EnrichmentErrorKind::QualityGateFailure);
        assert_eq!(err.to_string(), "Quality gate failed (50% complete, missing: aroma, tannin)");
    }
}
