//! Validator
//!
//! Cleans a collected batch and refuses to hand it over for training when too
//! little data survives.
use crate::data::{CleanBatch, RawBatch, Record, ValidationReport};
use crate::errors::RetrainError;
use hashbrown::HashSet;
use log::info;

/// Removes malformed rows from a batch, failing if fewer than `minimum_rows` remain.
#[derive(Debug, Clone, Copy)]
pub struct DataValidator {
    pub minimum_rows: usize,
}

impl DataValidator {
    pub fn new(minimum_rows: usize) -> Self {
        DataValidator { minimum_rows }
    }

    /// Apply the cleaning rules in order:
    /// missing fields (including non-finite amounts), non positive amounts, hours outside `[0, 23]`,
    /// days outside `[0, 6]`, labels outside `{0, 1}`, and finally exact duplicates.
    pub fn validate(&self, batch: &RawBatch) -> Result<CleanBatch, RetrainError> {
        info!("Validating {} records...", batch.len());
        let mut report = ValidationReport {
            original: batch.len(),
            ..Default::default()
        };

        let complete: Vec<Record> = batch.records.iter().filter_map(|r| r.complete()).collect();
        report.missing = batch.len() - complete.len();

        let records = retain_counted(complete, &mut report.non_positive_amount, |r| r.amount > 0.0);
        let records = retain_counted(records, &mut report.invalid_hour, |r| (0..=23).contains(&r.hour));
        let records = retain_counted(records, &mut report.invalid_day_of_week, |r| {
            (0..=6).contains(&r.day_of_week)
        });
        let records = retain_counted(records, &mut report.invalid_label, |r| r.label == 0 || r.label == 1);

        let before = records.len();
        let mut seen = HashSet::with_capacity(before);
        let records: Vec<Record> = records
            .into_iter()
            .filter(|r| seen.insert(r.dedup_key()))
            .collect();
        report.duplicates = before - records.len();

        log_report(&report);

        if records.len() < self.minimum_rows {
            return Err(RetrainError::DataQuality {
                original: report.original,
                cleaned: records.len(),
                minimum: self.minimum_rows,
                percent_lost: report.percent_lost(),
                shortfall: self.minimum_rows - records.len(),
            });
        }

        info!("{} valid records.", records.len());
        Ok(CleanBatch {
            collected_at: batch.collected_at,
            records,
            report,
        })
    }
}

fn retain_counted<F>(records: Vec<Record>, removed: &mut usize, keep: F) -> Vec<Record>
where
    F: Fn(&Record) -> bool,
{
    let before = records.len();
    let kept: Vec<Record> = records.into_iter().filter(|r| keep(r)).collect();
    *removed = before - kept.len();
    kept
}

fn log_report(report: &ValidationReport) {
    let rules = [
        ("missing field", report.missing),
        ("amount <= 0", report.non_positive_amount),
        ("invalid hour", report.invalid_hour),
        ("invalid day of week", report.invalid_day_of_week),
        ("invalid label", report.invalid_label),
        ("duplicate", report.duplicates),
    ];
    for (rule, count) in rules.iter().filter(|(_, c)| *c > 0) {
        info!("  Removed ({}): {}", rule, count);
    }
    if report.removed() > 0 {
        info!(
            "  Removed {} of {} records ({:.1}%).",
            report.removed(),
            report.original,
            report.percent_lost()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawRecord;

    fn raw(amount: f64, hour: i64, category: &str, label: i64) -> RawRecord {
        RawRecord {
            amount: Some(amount),
            hour: Some(hour),
            day_of_week: Some(2),
            category: Some(category.to_string()),
            label: Some(label),
        }
    }

    fn good_rows(n: usize) -> Vec<RawRecord> {
        (0..n).map(|i| raw(1.0 + i as f64, (i % 24) as i64, "A", (i % 2) as i64)).collect()
    }

    #[test]
    fn test_rules_applied_in_order() {
        let mut rows = good_rows(10);
        rows.push(RawRecord {
            amount: None,
            ..raw(5.0, 3, "B", 0)
        });
        rows.push(raw(-4.0, 3, "B", 0));
        rows.push(raw(0.0, 3, "B", 0));
        rows.push(raw(7.0, 24, "B", 0));
        rows.push(raw(7.0, -1, "B", 0));
        rows.push(RawRecord {
            day_of_week: Some(7),
            ..raw(7.0, 2, "B", 0)
        });
        rows.push(raw(7.0, 2, "B", 3));
        rows.push(rows[0].clone());
        rows.push(rows[1].clone());

        let clean = DataValidator::new(10).validate(&RawBatch::new(rows)).unwrap();
        let report = clean.report;
        assert_eq!(report.original, 19);
        assert_eq!(report.missing, 1);
        assert_eq!(report.non_positive_amount, 2);
        assert_eq!(report.invalid_hour, 2);
        assert_eq!(report.invalid_day_of_week, 1);
        assert_eq!(report.invalid_label, 1);
        assert_eq!(report.duplicates, 2);
        assert_eq!(clean.len(), 10);
        assert_eq!(report.cleaned(), clean.len());
    }

    #[test]
    fn test_duplicates_keep_first_occurrence_order() {
        let rows = vec![raw(3.0, 1, "C", 0), raw(1.0, 1, "A", 0), raw(3.0, 1, "C", 0)];
        let clean = DataValidator::new(1).validate(&RawBatch::new(rows)).unwrap();
        let amounts: Vec<f64> = clean.records.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![3.0, 1.0]);
    }

    #[test]
    fn test_below_minimum_fails() {
        // 500 rows, 220 of them bad.
        let mut rows = good_rows(280);
        rows.extend((0..220).map(|i| raw(-(i as f64) - 1.0, 3, "A", 0)));
        let err = DataValidator::new(1000).validate(&RawBatch::new(rows)).unwrap_err();
        match err {
            RetrainError::DataQuality {
                original,
                cleaned,
                minimum,
                percent_lost,
                shortfall,
            } => {
                assert_eq!(original, 500);
                assert_eq!(cleaned, 280);
                assert_eq!(minimum, 1000);
                assert!((percent_lost - 44.0).abs() < 1e-9);
                assert_eq!(shortfall, 720);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let validator = DataValidator::new(50);
        assert!(validator.validate(&RawBatch::new(good_rows(50))).is_ok());
        assert!(validator.validate(&RawBatch::new(good_rows(49))).is_err());
    }

    #[test]
    fn test_empty_batch() {
        assert!(DataValidator::new(0).validate(&RawBatch::new(Vec::new())).is_ok());
        match DataValidator::new(1).validate(&RawBatch::new(Vec::new())) {
            Err(RetrainError::DataQuality { percent_lost, .. }) => assert_eq!(percent_lost, 0.0),
            _ => panic!("expected a data quality error"),
        }
    }

    #[test]
    fn test_validate_is_idempotent() {
        let mut rows = good_rows(40);
        rows.push(raw(-1.0, 2, "A", 1));
        rows.push(rows[3].clone());
        let validator = DataValidator::new(1);
        let once = validator.validate(&RawBatch::new(rows)).unwrap();
        let twice = validator.validate(&once.to_raw()).unwrap();
        assert_eq!(twice.report.removed(), 0);
        assert_eq!(once.records, twice.records);
    }

    #[test]
    fn test_non_finite_amounts_are_missing() {
        let mut rows = good_rows(5);
        rows.push(raw(f64::INFINITY, 2, "A", 1));
        rows.push(raw(f64::NEG_INFINITY, 2, "A", 1));
        let clean = DataValidator::new(1).validate(&RawBatch::new(rows)).unwrap();
        assert_eq!(clean.report.missing, 2);
        assert_eq!(clean.report.non_positive_amount, 0);
        assert!(clean.records.iter().all(|r| r.amount.is_finite()));
    }
}
