//! Source
//!
//! Collaborators that hand the job a batch of raw transactions.
use crate::constants::DEFAULT_WINDOW_DAYS;
use crate::data::{RawBatch, RawRecord};
use crate::errors::RetrainError;
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use std::path::{Path, PathBuf};

pub const CATEGORIES: [&str; 4] = ["A", "B", "C", "D"];

/// Logical time window the batch should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionWindow {
    pub days: u32,
}

impl Default for CollectionWindow {
    fn default() -> Self {
        CollectionWindow {
            days: DEFAULT_WINDOW_DAYS,
        }
    }
}

pub trait DataSource {
    fn collect(&mut self, window: CollectionWindow) -> Result<RawBatch, RetrainError>;
}

impl<S: DataSource + ?Sized> DataSource for Box<S> {
    fn collect(&mut self, window: CollectionWindow) -> Result<RawBatch, RetrainError> {
        (**self).collect(window)
    }
}

/// Reads `amount,hour,day_of_week,category,label` rows from a csv file.
///
/// Empty or unparsable cells become missing values, they are dropped later by validation.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        CsvSource {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DataSource for CsvSource {
    fn collect(&mut self, window: CollectionWindow) -> Result<RawBatch, RetrainError> {
        info!("Collecting data from the last {} days...", window.days);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| RetrainError::DataSource(format!("{}: {}", self.path.display(), e)))?;
        let records = reader
            .deserialize::<RawRecord>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RetrainError::DataSource(format!("{}: {}", self.path.display(), e)))?;
        info!("{} transactions loaded from {}", records.len(), self.path.display());
        Ok(RawBatch::new(records))
    }
}

/// Generates transactions where fraud correlates with high amounts,
/// night hours and category `D`.
pub struct SyntheticSource {
    rng: StdRng,
    rows: Range<usize>,
}

impl SyntheticSource {
    /// Reproducible source producing exactly `rows` records per batch.
    pub fn seeded(seed: u64, rows: usize) -> Self {
        SyntheticSource {
            rng: StdRng::seed_from_u64(seed),
            rows: rows..rows + 1,
        }
    }

    /// Reproducible source producing a number of rows drawn from `rows`.
    pub fn seeded_range(seed: u64, rows: Range<usize>) -> Self {
        SyntheticSource {
            rng: StdRng::seed_from_u64(seed),
            rows,
        }
    }

    /// Source seeded from system entropy, producing a number of rows drawn from `rows`.
    pub fn from_entropy(rows: Range<usize>) -> Self {
        SyntheticSource {
            rng: StdRng::from_entropy(),
            rows,
        }
    }

    fn record(&mut self) -> RawRecord {
        // Exponential with a mean of 500.
        let amount = -500.0 * (1.0 - self.rng.gen::<f64>()).ln();
        let hour = self.rng.gen_range(0..24);
        let day_of_week = self.rng.gen_range(0..7);
        let category = CATEGORIES.choose(&mut self.rng).copied().unwrap_or("A");

        let mut score = 0.02;
        if amount > 800.0 {
            score += 0.4;
        }
        if hour >= 22 || hour <= 5 {
            score += 0.3;
        }
        if category == "D" {
            score += 0.2;
        }
        let label = i64::from(self.rng.gen::<f64>() < score);

        RawRecord {
            amount: Some(amount),
            hour: Some(hour),
            day_of_week: Some(day_of_week),
            category: Some(category.to_string()),
            label: Some(label),
        }
    }
}

impl DataSource for SyntheticSource {
    fn collect(&mut self, window: CollectionWindow) -> Result<RawBatch, RetrainError> {
        info!("Collecting data from the last {} days...", window.days);
        let n = if self.rows.is_empty() {
            self.rows.start
        } else {
            self.rng.gen_range(self.rows.clone())
        };
        let records = (0..n).map(|_| self.record()).collect();
        info!("{} transactions generated", n);
        Ok(RawBatch::new(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_synthetic_source_is_reproducible() {
        let a = SyntheticSource::seeded(1, 200).collect(CollectionWindow::default()).unwrap();
        let b = SyntheticSource::seeded(1, 200).collect(CollectionWindow::default()).unwrap();
        assert_eq!(a.len(), 200);
        assert_eq!(a.records, b.records);
    }

    #[test]
    fn test_synthetic_records_are_valid() {
        let batch = SyntheticSource::seeded(5, 2000).collect(CollectionWindow::default()).unwrap();
        let mut positives = 0;
        for r in batch.records.iter().map(|r| r.complete().unwrap()) {
            assert!(r.amount > 0.0);
            assert!((0..24).contains(&r.hour));
            assert!((0..7).contains(&r.day_of_week));
            assert!(CATEGORIES.contains(&r.category.as_str()));
            positives += r.label;
        }
        assert!(positives > 0 && positives < 2000);
    }

    #[test]
    fn test_synthetic_row_range() {
        let batch = SyntheticSource::from_entropy(10..20).collect(CollectionWindow { days: 7 }).unwrap();
        assert!((10..20).contains(&batch.len()));
    }

    #[test]
    fn test_boxed_source() {
        let mut source: Box<dyn DataSource> = Box::new(SyntheticSource::seeded_range(4, 30..40));
        let batch = source.collect(CollectionWindow::default()).unwrap();
        assert!((30..40).contains(&batch.len()));
    }

    #[test]
    fn test_csv_source() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "amount,hour,day_of_week,category,label").unwrap();
        writeln!(file, "120.5,3,1,A,0").unwrap();
        writeln!(file, ",22,6,D,1").unwrap();
        writeln!(file, "abc,10,2,B,0").unwrap();
        writeln!(file, "40.0,11,2,,1").unwrap();
        file.flush().unwrap();

        let batch = CsvSource::new(file.path()).collect(CollectionWindow::default()).unwrap();
        assert_eq!(batch.len(), 4);
        assert_eq!(batch.records[0].amount, Some(120.5));
        assert_eq!(batch.records[0].category.as_deref(), Some("A"));
        assert_eq!(batch.records[1].amount, None);
        assert_eq!(batch.records[2].amount, None);
        assert_eq!(batch.records[3].category, None);
        assert!(batch.records[0].complete().is_some());
    }

    #[test]
    fn test_csv_source_missing_file() {
        let res = CsvSource::new("/nonexistent/transactions.csv").collect(CollectionWindow::default());
        assert!(matches!(res, Err(RetrainError::DataSource(_))));
    }
}
