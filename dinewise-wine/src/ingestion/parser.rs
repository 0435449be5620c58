//! Wine-list ingestion
//!
//! Each line goes through the classifier; non-wine lines are skipped. Wines
//! are deduplicated on (name, producer, vintage) before insertion, so
//! ingesting the same list twice never creates a second record.

use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::classifier::{ClassifierError, WineClassifier};
use crate::db::{inventory, wines};
use crate::models::WineRecord;

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("Storage error: {0}")]
    Storage(#[from] dinewise_common::Error),
}

/// A parsed wine line
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedWine {
    /// The stored record (the pre-existing one for duplicates)
    pub wine: WineRecord,
    pub inserted: bool,
    pub price: Option<f64>,
}

/// Outcome of ingesting a whole list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionReport {
    pub lines: usize,
    pub parsed: usize,
    /// Lines that are not wine entries
    pub skipped: usize,
    /// Lines the classifier failed on
    pub errors: usize,
    pub inserted: usize,
    pub duplicates: usize,
    /// Wines placed on the restaurant's list
    pub linked: usize,
    pub wine_ids: Vec<Uuid>,
}

pub struct IngestionParser {
    db: SqlitePool,
    classifier: Arc<dyn WineClassifier>,
}

impl IngestionParser {
    pub fn new(db: SqlitePool, classifier: Arc<dyn WineClassifier>) -> Self {
        Self { db, classifier }
    }

    /// Classify one line and store it if it is a new wine
    ///
    /// `Ok(None)` means the line is not a wine entry.
    pub async fn parse_line(&self, line: &str) -> Result<Option<ParsedWine>, IngestionError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let structured = match self.classifier.classify(line).await? {
            Some(s) if !s.name.trim().is_empty() => s,
            _ => {
                debug!(line = %line, "Not a wine entry, skipping");
                return Ok(None);
            }
        };

        let identity = structured.identity();
        if let Some(existing) = wines::find_by_identity(&self.db, &identity).await? {
            debug!(wine_id = %existing.id, key = %identity.identity_key(), "Wine already known");
            return Ok(Some(ParsedWine {
                wine: existing,
                inserted: false,
                price: structured.price,
            }));
        }

        // a concurrent ingestion may have inserted it since the lookup
        let (wine, inserted) = wines::insert_if_absent(&self.db, &structured.to_record()).await?;
        if inserted {
            debug!(wine_id = %wine.id, name = %wine.display_name(), "Wine inserted");
        }
        Ok(Some(ParsedWine {
            wine,
            inserted,
            price: structured.price,
        }))
    }

    /// Ingest every line of `text`, optionally placing each wine on a
    /// restaurant's list
    ///
    /// Classifier failures are counted per line; storage failures abort.
    pub async fn ingest_list(
        &self,
        text: &str,
        restaurant_id: Option<&str>,
    ) -> Result<IngestionReport, IngestionError> {
        let mut report = IngestionReport::default();

        for line in text.lines() {
            report.lines += 1;
            match self.parse_line(line).await {
                Ok(Some(parsed)) => {
                    report.parsed += 1;
                    if parsed.inserted {
                        report.inserted += 1;
                    } else {
                        report.duplicates += 1;
                    }
                    if let Some(restaurant_id) = restaurant_id {
                        inventory::link_to_restaurant(&self.db, restaurant_id, parsed.wine.id, parsed.price)
                            .await?;
                        report.linked += 1;
                    }
                    report.wine_ids.push(parsed.wine.id);
                }
                Ok(None) => report.skipped += 1,
                Err(IngestionError::Classifier(e)) => {
                    warn!(
                        classifier = self.classifier.name(),
                        line = %line.trim(),
                        error = %e,
                        "Failed to classify line"
                    );
                    report.errors += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            classifier = self.classifier.name(),
            lines = report.lines,
            parsed = report.parsed,
            inserted = report.inserted,
            duplicates = report.duplicates,
            skipped = report.skipped,
            errors = report.errors,
            "Wine list ingested"
        );
        Ok(report)
    }
}
