//! Data
//!
//! Records, batches and the dense feature matrix handed to the trainer.
use crate::constants::FEATURE_SCHEMA_VERSION;
use crate::errors::RetrainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single observation as delivered by a data source, before validation.
///
/// Every field is optional, an empty or unparsable CSV cell is `None`.
/// A non-finite amount (`NaN`, `inf`, or an overflowing literal) is treated as missing as well.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub hour: Option<i64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub day_of_week: Option<i64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub label: Option<i64>,
}

impl RawRecord {
    /// Convert into a [`Record`] when every field is present.
    pub fn complete(&self) -> Option<Record> {
        let amount = self.amount.filter(|a| a.is_finite())?;
        Some(Record {
            amount,
            hour: self.hour?,
            day_of_week: self.day_of_week?,
            category: self.category.clone().filter(|c| !c.is_empty())?,
            label: self.label?,
        })
    }
}

/// A complete observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub amount: f64,
    pub hour: i64,
    pub day_of_week: i64,
    pub category: String,
    pub label: i64,
}

impl Record {
    /// Key used to detect exact duplicates; floats are compared bitwise.
    pub(crate) fn dedup_key(&self) -> (u64, i64, i64, String, i64) {
        (self.amount.to_bits(), self.hour, self.day_of_week, self.category.clone(), self.label)
    }
}

impl From<&Record> for RawRecord {
    fn from(r: &Record) -> Self {
        RawRecord {
            amount: Some(r.amount),
            hour: Some(r.hour),
            day_of_week: Some(r.day_of_week),
            category: Some(r.category.clone()),
            label: Some(r.label),
        }
    }
}

/// Records collected together, not yet validated.
#[derive(Debug, Clone)]
pub struct RawBatch {
    pub collected_at: DateTime<Utc>,
    pub records: Vec<RawRecord>,
}

impl RawBatch {
    pub fn new(records: Vec<RawRecord>) -> Self {
        RawBatch {
            collected_at: Utc::now(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Number of rows removed by each cleaning rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub original: usize,
    pub missing: usize,
    pub non_positive_amount: usize,
    pub invalid_hour: usize,
    pub invalid_day_of_week: usize,
    pub invalid_label: usize,
    pub duplicates: usize,
}

impl ValidationReport {
    pub fn removed(&self) -> usize {
        self.missing
            + self.non_positive_amount
            + self.invalid_hour
            + self.invalid_day_of_week
            + self.invalid_label
            + self.duplicates
    }

    pub fn cleaned(&self) -> usize {
        self.original - self.removed()
    }

    /// Percentage of the original rows removed, 0 for an empty batch.
    pub fn percent_lost(&self) -> f64 {
        if self.original == 0 {
            0.0
        } else {
            self.removed() as f64 / self.original as f64 * 100.0
        }
    }
}

/// A batch that passed validation.
#[derive(Debug, Clone)]
pub struct CleanBatch {
    pub collected_at: DateTime<Utc>,
    pub records: Vec<Record>,
    pub report: ValidationReport,
}

impl CleanBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Turn the batch back into its unvalidated form, so it can be validated again.
    pub fn to_raw(&self) -> RawBatch {
        RawBatch {
            collected_at: self.collected_at,
            records: self.records.iter().map(RawRecord::from).collect(),
        }
    }
}

/// Ordered column names of a feature matrix, plus the version of the encoding
/// that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: u32,
    pub columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Self {
        FeatureSchema {
            version: FEATURE_SCHEMA_VERSION,
            columns,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

/// Contiguous column major matrix of features.
///
/// Each column is described by the matching entry of `schema.columns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub schema: FeatureSchema,
    /// The raw values, one column after the other.
    pub data: Vec<f64>,
    /// Number of rows in the matrix.
    pub rows: usize,
}

impl FeatureMatrix {
    /// Create a new matrix, the data must hold `rows * schema.len()` values.
    pub fn new(schema: FeatureSchema, data: Vec<f64>, rows: usize) -> Result<Self, RetrainError> {
        if data.len() != rows * schema.len() {
            return Err(RetrainError::InvalidParameter(
                "data".to_string(),
                format!("{} values", rows * schema.len()),
                data.len().to_string(),
            ));
        }
        Ok(FeatureMatrix { schema, data, rows })
    }

    pub fn cols(&self) -> usize {
        self.schema.len()
    }

    /// Get a single reference to an item in the matrix.
    ///
    /// * `i` - The ith row of the data to get.
    /// * `j` - the jth column of the data to get.
    pub fn get(&self, i: usize, j: usize) -> &f64 {
        &self.data[j * self.rows + i]
    }

    /// Get an entire column in the matrix.
    pub fn get_col(&self, col: usize) -> &[f64] {
        &self.data[col * self.rows..(col + 1) * self.rows]
    }

    /// Get a row of the data as a vector.
    pub fn get_row(&self, row: usize) -> Vec<f64> {
        self.data.iter().skip(row).step_by(self.rows.max(1)).copied().collect()
    }

    /// Reorder the columns to follow `schema`.
    ///
    /// Fails when the schema versions differ or when a column of `schema`
    /// is absent from this matrix.
    pub fn align_to(&self, schema: &FeatureSchema) -> Result<FeatureMatrix, RetrainError> {
        if self.schema == *schema {
            return Ok(self.clone());
        }
        if self.schema.version != schema.version {
            return Err(RetrainError::Comparison(format!(
                "feature schema version {} does not match version {}",
                schema.version, self.schema.version
            )));
        }
        let mut data = Vec::with_capacity(self.rows * schema.len());
        for column in schema.columns.iter() {
            let idx = self
                .schema
                .position(column)
                .ok_or_else(|| RetrainError::Comparison(format!("column {} is missing from the holdout set", column)))?;
            data.extend_from_slice(self.get_col(idx));
        }
        Ok(FeatureMatrix {
            schema: schema.clone(),
            data,
            rows: self.rows,
        })
    }
}
