//! Job Configuration
//!
//! Every location and threshold the job uses, injected at construction instead
//! of being read from global constants.
use crate::constants::{DEFAULT_MINIMUM_ROWS, DEFAULT_WINDOW_DAYS, HOLDOUT_ROWS, HOLDOUT_SEED};
use crate::errors::RetrainError;
use crate::features::CategoryVocabulary;
use crate::holdout::HoldoutStore;
use crate::registry::ModelRegistry;
use crate::source::CollectionWindow;
use crate::trainer::TrainConfig;
use crate::utils::read_json;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_production_path() -> PathBuf {
    PathBuf::from("models/production_model.json")
}
fn default_archive_dir() -> PathBuf {
    PathBuf::from("models/archive")
}
fn default_holdout_path() -> PathBuf {
    PathBuf::from("data/holdout.json")
}
fn default_minimum_rows() -> usize {
    DEFAULT_MINIMUM_ROWS
}
fn default_window_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}
fn default_holdout_rows() -> usize {
    HOLDOUT_ROWS
}
fn default_holdout_seed() -> u64 {
    HOLDOUT_SEED
}

/// Configuration for a [`crate::job::RetrainJob`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// File holding the production model.
    #[serde(default = "default_production_path")]
    pub production_path: PathBuf,
    /// Directory of superseded models.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,
    /// File holding the fixed holdout set.
    #[serde(default = "default_holdout_path")]
    pub holdout_path: PathBuf,
    /// Fewer valid rows than this aborts the job before training.
    #[serde(default = "default_minimum_rows")]
    pub minimum_rows: usize,
    /// Days of data to collect.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Size of the holdout set when it is first created.
    #[serde(default = "default_holdout_rows")]
    pub holdout_rows: usize,
    /// Seed of the holdout generator.
    #[serde(default = "default_holdout_seed")]
    pub holdout_seed: u64,
    /// Hyperparameters for the trainer.
    #[serde(default)]
    pub train: TrainConfig,
    /// Known categorical codes.
    #[serde(default)]
    pub vocabulary: CategoryVocabulary,
}

impl Default for JobConfig {
    fn default() -> Self {
        JobConfig {
            production_path: default_production_path(),
            archive_dir: default_archive_dir(),
            holdout_path: default_holdout_path(),
            minimum_rows: DEFAULT_MINIMUM_ROWS,
            window_days: DEFAULT_WINDOW_DAYS,
            holdout_rows: HOLDOUT_ROWS,
            holdout_seed: HOLDOUT_SEED,
            train: TrainConfig::default(),
            vocabulary: CategoryVocabulary::default(),
        }
    }
}

impl JobConfig {
    /// Load a configuration from a json file, missing keys take their default value.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RetrainError> {
        let config: JobConfig = read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration with every file placed under `root`.
    pub fn rooted_at<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        JobConfig {
            production_path: root.join(default_production_path()),
            archive_dir: root.join(default_archive_dir()),
            holdout_path: root.join(default_holdout_path()),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), RetrainError> {
        if self.holdout_rows == 0 {
            return Err(RetrainError::InvalidParameter(
                "holdout_rows".to_string(),
                "a positive number".to_string(),
                "0".to_string(),
            ));
        }
        self.vocabulary.validate()?;
        self.train.validate()
    }

    pub fn window(&self) -> CollectionWindow {
        CollectionWindow { days: self.window_days }
    }

    pub fn registry(&self) -> ModelRegistry {
        ModelRegistry::new(&self.production_path, &self.archive_dir)
    }

    pub fn holdout_store(&self) -> HoldoutStore {
        HoldoutStore::new(&self.holdout_path, self.holdout_rows, self.holdout_seed)
    }
}
