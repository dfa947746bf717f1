//! Holdout
//!
//! The fixed evaluation set every model is scored on. It is generated on the
//! first run, persisted, and only ever read afterwards, which keeps scores
//! comparable from one job run to the next.
use crate::constants::{HOLDOUT_ROWS, HOLDOUT_SEED};
use crate::data::{FeatureMatrix, FeatureSchema};
use crate::errors::RetrainError;
use crate::features::FeaturePreparer;
use crate::metric::{accuracy, f1, precision, recall, ConfusionMatrix};
use crate::registry::ModelArtifact;
use crate::source::{CollectionWindow, DataSource, SyntheticSource};
use crate::trainer::Classifier;
use crate::utils::{read_json, write_json_atomic};
use crate::validator::DataValidator;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldoutSet {
    pub created_at: DateTime<Utc>,
    pub features: FeatureMatrix,
    pub labels: Vec<f64>,
}

impl HoldoutSet {
    pub fn schema(&self) -> &FeatureSchema {
        &self.features.schema
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Scores of a model on the holdout set. Promotion only looks at `f1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldoutScore {
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
}

/// Predict the holdout set with `artifact`, after aligning the holdout columns
/// to the schema the model was trained on.
pub fn evaluate<M: Classifier>(artifact: &ModelArtifact<M>, holdout: &HoldoutSet) -> Result<HoldoutScore, RetrainError> {
    let features = holdout.features.align_to(&artifact.schema)?;
    let predictions = artifact.model.predict(&features);
    if predictions.len() != holdout.len() {
        return Err(RetrainError::Comparison(format!(
            "model produced {} predictions for {} holdout rows",
            predictions.len(),
            holdout.len()
        )));
    }
    let cm = ConfusionMatrix::from_predictions(&holdout.labels, &predictions);
    Ok(HoldoutScore {
        f1: f1(&cm),
        precision: precision(&cm),
        recall: recall(&cm),
        accuracy: accuracy(&cm),
        confusion: cm,
    })
}

/// F1 score of `artifact` on the holdout set, in `[0, 1]`.
pub fn score<M: Classifier>(artifact: &ModelArtifact<M>, holdout: &HoldoutSet) -> Result<f64, RetrainError> {
    evaluate(artifact, holdout).map(|s| s.f1)
}

/// Location of the persisted holdout set, and how to build it the first time.
#[derive(Debug, Clone)]
pub struct HoldoutStore {
    path: PathBuf,
    rows: usize,
    seed: u64,
}

impl HoldoutStore {
    pub fn new<P: AsRef<Path>>(path: P, rows: usize, seed: u64) -> Self {
        HoldoutStore {
            path: path.as_ref().to_path_buf(),
            rows,
            seed,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<HoldoutSet, RetrainError> {
        read_json(&self.path)
    }

    /// Return the persisted holdout set, creating it from a seeded synthetic
    /// source when none exists yet.
    pub fn obtain(&self, preparer: &FeaturePreparer) -> Result<HoldoutSet, RetrainError> {
        let mut generator = SyntheticSource::seeded(self.seed, self.rows);
        self.obtain_with(preparer, &mut generator)
    }

    /// Return the persisted holdout set, creating it from `generator` when none exists yet.
    pub fn obtain_with(&self, preparer: &FeaturePreparer, generator: &mut dyn DataSource) -> Result<HoldoutSet, RetrainError> {
        if self.exists() {
            return self.load();
        }
        info!("Creating fixed holdout set at {}...", self.path.display());
        let batch = generator.collect(CollectionWindow::default())?;
        let clean = DataValidator::new(1).validate(&batch)?;
        let (features, labels) = preparer.prepare(&clean)?;
        let holdout = HoldoutSet {
            created_at: Utc::now(),
            features,
            labels,
        };
        write_json_atomic(&holdout, &self.path)?;
        info!("Holdout set of {} rows persisted.", holdout.len());
        Ok(holdout)
    }
}

impl Default for HoldoutStore {
    fn default() -> Self {
        HoldoutStore::new("data/holdout.json", HOLDOUT_ROWS, HOLDOUT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::CategoryVocabulary;
    use crate::trainer::MajorityClassifier;
    use tempfile::tempdir;

    fn artifact(label: f64, schema: FeatureSchema) -> ModelArtifact<MajorityClassifier> {
        ModelArtifact::new(MajorityClassifier { label }, schema)
    }

    #[test]
    fn test_obtain_creates_once() {
        let dir = tempdir().unwrap();
        let store = HoldoutStore::new(dir.path().join("holdout.json"), 300, 12345);
        let preparer = FeaturePreparer::new(CategoryVocabulary::default());
        assert!(!store.exists());

        let first = store.obtain(&preparer).unwrap();
        assert!(store.exists());
        assert_eq!(first.len(), 300);
        assert_eq!(first.schema(), preparer.schema());

        // A different generator must not be used once the set is persisted.
        let mut other = SyntheticSource::seeded(99, 10);
        let second = store.obtain_with(&preparer, &mut other).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scores_are_stable_across_loads() {
        let dir = tempdir().unwrap();
        let store = HoldoutStore::new(dir.path().join("holdout.json"), 500, 1);
        let preparer = FeaturePreparer::new(CategoryVocabulary::default());
        let model = artifact(1.0, preparer.schema().clone());

        let a = score(&model, &store.obtain(&preparer).unwrap()).unwrap();
        let b = score(&model, &store.obtain(&preparer).unwrap()).unwrap();
        assert_eq!(a, b);
        assert!(a > 0.0 && a < 1.0);
    }

    #[test]
    fn test_majority_negative_scores_zero() {
        let dir = tempdir().unwrap();
        let store = HoldoutStore::new(dir.path().join("holdout.json"), 200, 3);
        let preparer = FeaturePreparer::new(CategoryVocabulary::default());
        let holdout = store.obtain(&preparer).unwrap();
        let scores = evaluate(&artifact(0.0, preparer.schema().clone()), &holdout).unwrap();
        assert_eq!(scores.f1, 0.0);
        assert_eq!(scores.recall, 0.0);
        assert_eq!(scores.confusion.total(), 200);
    }

    #[test]
    fn test_schema_mismatch_is_a_comparison_error() {
        let dir = tempdir().unwrap();
        let store = HoldoutStore::new(dir.path().join("holdout.json"), 50, 3);
        let preparer = FeaturePreparer::new(CategoryVocabulary::default());
        let holdout = store.obtain(&preparer).unwrap();

        let mut columns = preparer.schema().columns.clone();
        columns.push("category_E".to_string());
        let res = score(&artifact(1.0, FeatureSchema::new(columns)), &holdout);
        assert!(matches!(res, Err(RetrainError::Comparison(_))));
    }

    #[test]
    fn test_reordered_schema_is_aligned() {
        let dir = tempdir().unwrap();
        let store = HoldoutStore::new(dir.path().join("holdout.json"), 50, 3);
        let preparer = FeaturePreparer::new(CategoryVocabulary::default());
        let holdout = store.obtain(&preparer).unwrap();

        let mut columns = preparer.schema().columns.clone();
        columns.reverse();
        let reordered = score(&artifact(1.0, FeatureSchema::new(columns)), &holdout).unwrap();
        let original = score(&artifact(1.0, preparer.schema().clone()), &holdout).unwrap();
        assert_eq!(reordered, original);
    }

    #[test]
    fn test_unreadable_holdout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("holdout.json");
        std::fs::write(&path, "not json").unwrap();
        let store = HoldoutStore::new(&path, 50, 3);
        let preparer = FeaturePreparer::new(CategoryVocabulary::default());
        assert!(matches!(store.obtain(&preparer), Err(RetrainError::UnableToRead(_))));
    }
}
