//! Trainer
//!
//! The contract between the job and whatever learns the model. The job only
//! ever sees a [`Trainer`] that turns a matrix and labels into a [`Classifier`].
use crate::constants::{MAX_BIN, MAX_DEPTH, N_ESTIMATORS, TRAIN_SEED};
use crate::data::FeatureMatrix;
use crate::errors::RetrainError;
use crate::forest::ForestClassifier;
use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Anything able to label the rows of a feature matrix with 0.0 or 1.0.
pub trait Classifier {
    fn predict(&self, data: &FeatureMatrix) -> Vec<f64>;
}

/// Fits a classifier. Trainers do no cleaning or feature work of their own.
pub trait Trainer {
    type Model: Classifier + Serialize + DeserializeOwned;

    fn train(&self, data: &FeatureMatrix, y: &[f64], config: &TrainConfig) -> Result<Self::Model, RetrainError>;
}

fn default_n_estimators() -> usize {
    N_ESTIMATORS
}
fn default_max_depth() -> usize {
    MAX_DEPTH
}
fn default_seed() -> u64 {
    TRAIN_SEED
}
fn default_max_bin() -> u16 {
    MAX_BIN
}
fn default_min_samples_leaf() -> usize {
    1
}
fn default_bootstrap() -> bool {
    true
}

/// Hyperparameters handed to the trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Number of trees in the ensemble.
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    /// Maximum depth of each tree.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Seed for random number generation.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Maximum number of bins for discretization.
    #[serde(default = "default_max_bin")]
    pub max_bin: u16,
    /// Minimum number of rows on each side of a split.
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    /// Fit each tree on a bootstrap sample instead of the full data.
    #[serde(default = "default_bootstrap")]
    pub bootstrap: bool,
    /// Number of threads, all available cores when `None`.
    #[serde(default)]
    pub num_threads: Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            n_estimators: N_ESTIMATORS,
            max_depth: MAX_DEPTH,
            seed: TRAIN_SEED,
            max_bin: MAX_BIN,
            min_samples_leaf: 1,
            bootstrap: true,
            num_threads: None,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<(), RetrainError> {
        if self.n_estimators == 0 {
            return Err(RetrainError::InvalidParameter(
                "n_estimators".to_string(),
                "a positive number".to_string(),
                self.n_estimators.to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(RetrainError::InvalidParameter(
                "max_depth".to_string(),
                "a positive number".to_string(),
                self.max_depth.to_string(),
            ));
        }
        if self.max_bin < 2 {
            return Err(RetrainError::InvalidParameter(
                "max_bin".to_string(),
                "a value of at least 2".to_string(),
                self.max_bin.to_string(),
            ));
        }
        if self.num_threads == Some(0) {
            return Err(RetrainError::InvalidParameter(
                "num_threads".to_string(),
                "a positive number".to_string(),
                "0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Check the shapes a trainer can rely on.
pub fn check_training_data(data: &FeatureMatrix, y: &[f64]) -> Result<(), RetrainError> {
    if data.rows == 0 {
        return Err(RetrainError::Training("no rows to train on".to_string()));
    }
    if y.len() != data.rows {
        return Err(RetrainError::Training(format!(
            "{} labels provided for {} rows",
            y.len(),
            data.rows
        )));
    }
    if let Some(v) = y.iter().find(|v| **v != 0.0 && **v != 1.0) {
        return Err(RetrainError::Training(format!("label {} is not binary", v)));
    }
    Ok(())
}

impl<T: Trainer + ?Sized> Trainer for &T {
    type Model = T::Model;

    fn train(&self, data: &FeatureMatrix, y: &[f64], config: &TrainConfig) -> Result<Self::Model, RetrainError> {
        (**self).train(data, y, config)
    }
}

/// Trains a [`ForestClassifier`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ForestTrainer;

impl Trainer for ForestTrainer {
    type Model = ForestClassifier;

    fn train(&self, data: &FeatureMatrix, y: &[f64], config: &TrainConfig) -> Result<ForestClassifier, RetrainError> {
        info!(
            "Training forest with {} trees (max depth {}) on {} rows...",
            config.n_estimators, config.max_depth, data.rows
        );
        let start = Instant::now();
        let model = ForestClassifier::fit(data, y, config)?;
        info!(
            "Model trained in {:.2}s, {} leaves.",
            start.elapsed().as_secs_f32(),
            model.n_leaves()
        );
        Ok(model)
    }
}

/// Always predicts the most frequent training label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MajorityClassifier {
    pub label: f64,
}

impl Classifier for MajorityClassifier {
    fn predict(&self, data: &FeatureMatrix) -> Vec<f64> {
        vec![self.label; data.rows]
    }
}

/// Trains a [`MajorityClassifier`], a baseline that ignores the features.
#[derive(Debug, Clone, Copy, Default)]
pub struct MajorityTrainer;

impl Trainer for MajorityTrainer {
    type Model = MajorityClassifier;

    fn train(&self, data: &FeatureMatrix, y: &[f64], _config: &TrainConfig) -> Result<MajorityClassifier, RetrainError> {
        check_training_data(data, y)?;
        let positives = y.iter().filter(|v| **v == 1.0).count();
        let label = if positives * 2 > y.len() { 1.0 } else { 0.0 };
        Ok(MajorityClassifier { label })
    }
}
