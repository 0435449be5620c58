//! Completion-rate quality gate
//!
//! A record passes when the share of critical fields that meet their
//! requirement reaches the configured threshold. Evaluation is pure and
//! never touches the record.

use dinewise_common::config::QualityConfig;
use dinewise_common::{Error, Result};
use serde::Serialize;

use crate::models::{FieldValue, WineField, WineRecord};

/// What a critical field must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRequirement {
    /// Trimmed text (or joined list) at least this many characters
    MinLength(usize),
    /// Any value at all
    Present,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriticalField {
    pub field: WineField,
    pub requirement: FieldRequirement,
}

impl CriticalField {
    pub fn is_satisfied(&self, record: &WineRecord) -> bool {
        let min_len = match self.requirement {
            FieldRequirement::MinLength(n) => n.max(1),
            FieldRequirement::Present => 1,
        };
        match self.field.value(record) {
            FieldValue::Text(text) => text.map_or(false, |t| t.trim().chars().count() >= min_len),
            FieldValue::List(items) => {
                let joined_len: usize = items
                    .iter()
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(|s| s.chars().count())
                    .sum();
                joined_len >= min_len
            }
            FieldValue::Number(n) => n.map_or(false, |v| v.is_finite()),
        }
    }
}

/// Result of a quality evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub passed: bool,
    /// Critical fields that failed, in configured order
    pub missing_fields: Vec<String>,
    pub completion_ratio: f64,
}

/// Configured quality gate
#[derive(Debug, Clone)]
pub struct QualityGate {
    fields: Vec<CriticalField>,
    threshold: f64,
}

impl QualityGate {
    pub fn new(fields: Vec<CriticalField>, threshold: f64) -> Self {
        Self { fields, threshold }
    }

    /// Build from configuration, rejecting unknown field names
    pub fn from_config(config: &QualityConfig) -> Result<Self> {
        let fields = config
            .fields
            .iter()
            .map(|f| {
                let field = f
                    .field
                    .parse::<WineField>()
                    .map_err(|e| Error::Config(format!("quality.fields: {}", e)))?;
                let requirement = match f.min_length {
                    Some(n) => FieldRequirement::MinLength(n),
                    None => FieldRequirement::Present,
                };
                Ok(CriticalField { field, requirement })
            })
            .collect::<Result<Vec<_>>>()?;

        if fields.is_empty() {
            return Err(Error::Config("quality.fields must not be empty".to_string()));
        }
        Ok(Self::new(fields, config.threshold))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn fields(&self) -> &[CriticalField] {
        &self.fields
    }

    pub fn evaluate(&self, record: &WineRecord) -> QualityReport {
        let missing_fields: Vec<String> = self
            .fields
            .iter()
            .filter(|f| !f.is_satisfied(record))
            .map(|f| f.field.to_string())
            .collect();

        let total = self.fields.len();
        let passing = total - missing_fields.len();
        let completion_ratio = if total == 0 {
            0.0
        } else {
            passing as f64 / total as f64
        };

        QualityReport {
            passed: total > 0 && completion_ratio >= self.threshold,
            missing_fields,
            completion_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WineIdentity;

    fn gate(threshold: f64) -> QualityGate {
        QualityGate::new(
            vec![
                CriticalField { field: WineField::WineType, requirement: FieldRequirement::MinLength(3) },
                CriticalField { field: WineField::Tannin, requirement: FieldRequirement::Present },
                CriticalField { field: WineField::FlavorProfile, requirement: FieldRequirement::MinLength(10) },
                CriticalField { field: WineField::Varietals, requirement: FieldRequirement::MinLength(3) },
            ],
            threshold,
        )
    }

    fn complete_record() -> WineRecord {
        let mut record = WineRecord::new(WineIdentity::new("Test"));
        record.identity.varietals = vec!["Syrah".to_string()];
        record.characteristics.wine_type = Some("red".to_string());
        record.characteristics.tannin = Some(4.0);
        record.characteristics.flavor_profile = Some("blackberry, pepper, smoke".to_string());
        record
    }

    #[test]
    fn test_complete_record_passes() {
        let report = gate(0.98).evaluate(&complete_record());
        assert!(report.passed);
        assert_eq!(report.completion_ratio, 1.0);
        assert!(report.missing_fields.is_empty());
    }

    #[test]
    fn test_missing_fields_listed_in_order() {
        let mut record = complete_record();
        record.characteristics.tannin = None;
        record.characteristics.flavor_profile = Some("fruity".to_string());

        let report = gate(0.98).evaluate(&record);
        assert!(!report.passed);
        assert_eq!(report.missing_fields, vec!["tannin", "flavor_profile"]);
        assert_eq!(report.completion_ratio, 0.5);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let mut record = complete_record();
        record.characteristics.tannin = None;
        assert!(gate(0.75).evaluate(&record).passed);
        assert!(!gate(0.76).evaluate(&record).passed);
    }

    #[test]
    fn test_whitespace_does_not_count() {
        let mut record = complete_record();
        record.characteristics.wine_type = Some("  r  ".to_string());
        assert!(gate(0.5).evaluate(&record).missing_fields.contains(&"wine_type".to_string()));
    }

    #[test]
    fn test_nan_number_is_missing() {
        let mut record = complete_record();
        record.characteristics.tannin = Some(f64::NAN);
        assert_eq!(gate(0.5).evaluate(&record).missing_fields, vec!["tannin"]);
    }

    #[test]
    fn test_evaluate_is_monotonic_when_fields_are_added() {
        let g = gate(0.98);
        let mut record = WineRecord::new(WineIdentity::new("Empty"));
        let mut previous = g.evaluate(&record).completion_ratio;

        record.characteristics.tannin = Some(2.0);
        let r1 = g.evaluate(&record).completion_ratio;
        assert!(r1 >= previous);
        previous = r1;

        record.identity.varietals = vec!["Gamay".to_string()];
        let r2 = g.evaluate(&record).completion_ratio;
        assert!(r2 >= previous);
        previous = r2;

        record.characteristics.wine_type = Some("red".to_string());
        record.characteristics.flavor_profile = Some("cranberry and violet".to_string());
        let r3 = g.evaluate(&record).completion_ratio;
        assert!(r3 >= previous);
        assert_eq!(r3, 1.0);
    }

    #[test]
    fn test_evaluate_does_not_mutate() {
        let record = complete_record();
        let before = record.clone();
        let _ = gate(0.98).evaluate(&record);
        assert_eq!(record, before);
    }

    #[test]
    fn test_from_config_defaults() {
        let g = QualityGate::from_config(&QualityConfig::default()).unwrap();
        assert_eq!(g.threshold(), 0.98);
        assert_eq!(g.fields().len(), 14);
    }

    #[test]
    fn test_from_config_rejects_unknown_field() {
        let mut config = QualityConfig::default();
        config.fields.push(dinewise_common::config::QualityFieldConfig {
            field: "price".to_string(),
            min_length: None,
        });
        assert!(matches!(QualityGate::from_config(&config), Err(Error::Config(_))));
    }
}
