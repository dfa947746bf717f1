//! Errors
//!
//! Custom error types used throughout the `retrainer` crate.
use thiserror::Error;

/// Errors that can occur while running a retraining job.
#[derive(Debug, Error)]
pub enum RetrainError {
    /// Too few rows survived cleaning to train on.
    #[error(
        "Insufficient data: {cleaned} < {minimum} valid rows ({original} collected, {percent_lost:.1}% lost, {shortfall} short)."
    )]
    DataQuality {
        /// Rows in the batch before cleaning.
        original: usize,
        /// Rows left after cleaning.
        cleaned: usize,
        /// Configured minimum number of rows.
        minimum: usize,
        /// Percentage of the original rows removed by cleaning.
        percent_lost: f64,
        /// How many rows were missing to reach the minimum.
        shortfall: usize,
    },
    /// Failure while fitting a model.
    #[error("Training failed: {0}")]
    Training(String),
    /// Failure to score a model against the holdout set.
    #[error("Unable to compare models: {0}")]
    Comparison(String),
    /// A categorical code outside of the configured vocabulary.
    #[error("Category {0} is not part of the feature vocabulary.")]
    UnknownCategory(String),
    /// The data source could not produce a batch.
    #[error("Unable to collect data: {0}")]
    DataSource(String),
    /// Unable to write an artifact to file.
    #[error("Unable to write to file: {0}")]
    UnableToWrite(String),
    /// Unable to read an artifact from file.
    #[error("Unable to read from file: {0}")]
    UnableToRead(String),
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
}
