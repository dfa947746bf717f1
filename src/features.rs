//! Features
//!
//! Encodes a clean batch into a fixed-width matrix. The column layout depends
//! only on the configured [`CategoryVocabulary`], never on the batch contents,
//! so matrices built from different batches always line up.
use crate::constants::OTHER_CATEGORY;
use crate::data::{CleanBatch, FeatureMatrix, FeatureSchema};
use crate::errors::RetrainError;
use crate::utils::items_to_strings;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const NUMERIC_COLUMNS: [&str; 3] = ["amount", "hour", "day_of_week"];

/// What to do with a categorical code outside the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UnknownCategory {
    /// Encode it in a dedicated overflow column.
    #[default]
    Other,
    /// Refuse the batch.
    Fail,
}

impl FromStr for UnknownCategory {
    type Err = RetrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Other" | "other" => Ok(UnknownCategory::Other),
            "Fail" | "fail" => Ok(UnknownCategory::Fail),
            _ => Err(RetrainError::ParseString(
                s.to_string(),
                "UnknownCategory".to_string(),
                items_to_strings(vec!["Other", "Fail"]),
            )),
        }
    }
}

/// The known categorical codes, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    pub codes: Vec<String>,
    #[serde(default)]
    pub unknown: UnknownCategory,
}

impl Default for CategoryVocabulary {
    fn default() -> Self {
        CategoryVocabulary {
            codes: ["A", "B", "C", "D"].iter().map(|c| c.to_string()).collect(),
            unknown: UnknownCategory::Other,
        }
    }
}

impl CategoryVocabulary {
    /// Every code must map to its own column.
    pub fn validate(&self) -> Result<(), RetrainError> {
        if self.codes.is_empty() {
            return Err(RetrainError::InvalidParameter(
                "vocabulary".to_string(),
                "at least one category".to_string(),
                "none".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(self.codes.len());
        for code in self.codes.iter() {
            if code.is_empty() || !seen.insert(code.as_str()) {
                return Err(RetrainError::InvalidParameter(
                    "vocabulary".to_string(),
                    "distinct, non empty codes".to_string(),
                    format!("{:?}", code),
                ));
            }
        }
        if self.unknown == UnknownCategory::Other && seen.contains(OTHER_CATEGORY) {
            return Err(RetrainError::InvalidParameter(
                "vocabulary".to_string(),
                format!("no code named {} when unknown categories use the overflow column", OTHER_CATEGORY),
                OTHER_CATEGORY.to_string(),
            ));
        }
        Ok(())
    }

    /// Column schema produced by this vocabulary.
    pub fn schema(&self) -> FeatureSchema {
        let mut columns: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(self.codes.iter().map(|c| format!("category_{}", c)));
        if self.unknown == UnknownCategory::Other {
            columns.push(format!("category_{}", OTHER_CATEGORY));
        }
        FeatureSchema::new(columns)
    }
}

/// Maps records onto the vocabulary's schema.
#[derive(Debug, Clone)]
pub struct FeaturePreparer {
    vocabulary: CategoryVocabulary,
    schema: FeatureSchema,
    lookup: HashMap<String, usize>,
}

impl FeaturePreparer {
    pub fn new(vocabulary: CategoryVocabulary) -> Self {
        let schema = vocabulary.schema();
        let lookup = vocabulary
            .codes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        FeaturePreparer {
            vocabulary,
            schema,
            lookup,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Build the feature matrix and the label vector for a batch.
    ///
    /// Numeric columns are passed through unchanged, each category becomes a
    /// 0/1 indicator column.
    pub fn prepare(&self, batch: &CleanBatch) -> Result<(FeatureMatrix, Vec<f64>), RetrainError> {
        let rows = batch.len();
        let n_codes = self.vocabulary.codes.len();
        let mut data = vec![0.0; rows * self.schema.len()];
        let mut labels = Vec::with_capacity(rows);

        for (i, record) in batch.records.iter().enumerate() {
            data[i] = record.amount;
            data[rows + i] = record.hour as f64;
            data[2 * rows + i] = record.day_of_week as f64;

            let code_idx = match self.lookup.get(&record.category) {
                Some(idx) => *idx,
                None => match self.vocabulary.unknown {
                    UnknownCategory::Other => n_codes,
                    UnknownCategory::Fail => return Err(RetrainError::UnknownCategory(record.category.clone())),
                },
            };
            data[(NUMERIC_COLUMNS.len() + code_idx) * rows + i] = 1.0;
            labels.push(record.label as f64);
        }

        let matrix = FeatureMatrix::new(self.schema.clone(), data, rows)?;
        Ok((matrix, labels))
    }
}
