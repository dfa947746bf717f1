//! Forest
//!
//! Bagged classification trees, fitted in parallel on a dedicated thread pool.
use crate::binning::bin_matrix;
use crate::constants::DECISION_THRESHOLD;
use crate::data::FeatureMatrix;
use crate::errors::RetrainError;
use crate::sampler::{BootstrapSampler, NoSampler, Sampler};
use crate::splitter::GiniSplitter;
use crate::trainer::{check_training_data, Classifier, TrainConfig};
use crate::tree::Tree;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestClassifier {
    pub trees: Vec<Tree>,
    pub n_features: usize,
    /// Threads used for prediction, all available cores when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<usize>,
}

impl ForestClassifier {
    /// Fit `config.n_estimators` trees. Tree `i` is seeded with `config.seed + i`,
    /// so the result does not depend on the number of threads.
    pub fn fit(data: &FeatureMatrix, y: &[f64], config: &TrainConfig) -> Result<Self, RetrainError> {
        config.validate()?;
        check_training_data(data, y)?;

        let binned = bin_matrix(data, config.max_bin)?;
        let n_features = data.cols();
        let max_features = ((n_features as f64).sqrt().round() as usize).max(1);
        let splitter = GiniSplitter {
            min_samples_leaf: config.min_samples_leaf,
        };
        let index: Vec<usize> = (0..data.rows).collect();

        let pool = thread_pool(config.num_threads).map_err(|e| RetrainError::Training(e.to_string()))?;

        let trees = pool.install(|| {
            (0..config.n_estimators)
                .into_par_iter()
                .map(|i| {
                    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
                    let (chosen, excluded) = if config.bootstrap {
                        BootstrapSampler.sample(&mut rng, &index)
                    } else {
                        NoSampler.sample(&mut rng, &index)
                    };
                    debug!("Tree {} fitted on {} rows, {} out of bag.", i, chosen.len(), excluded.len());
                    let mut tree = Tree::new();
                    tree.fit(
                        &binned,
                        chosen,
                        y,
                        &splitter,
                        config.max_depth,
                        max_features,
                        2 * config.min_samples_leaf.max(1),
                        &mut rng,
                    );
                    tree
                })
                .collect::<Vec<Tree>>()
        });

        Ok(ForestClassifier {
            trees,
            n_features,
            num_threads: config.num_threads,
        })
    }

    /// Mean positive class probability over all trees.
    pub fn predict_proba(&self, data: &FeatureMatrix) -> Vec<f64> {
        let n_trees = self.trees.len().max(1) as f64;
        let predict = || {
            (0..data.rows)
                .into_par_iter()
                .map(|i| {
                    let row = data.get_row(i);
                    self.trees.iter().map(|t| t.predict_row(&row)).sum::<f64>() / n_trees
                })
                .collect::<Vec<f64>>()
        };
        match self.num_threads {
            None => predict(),
            Some(n) => match thread_pool(Some(n)) {
                Ok(pool) => pool.install(predict),
                Err(e) => {
                    warn!("Unable to build a pool of {} threads ({}), using the global pool.", n, e);
                    predict()
                }
            },
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.trees.iter().map(|t| t.n_leaves).sum()
    }
}

fn thread_pool(num_threads: Option<usize>) -> Result<ThreadPool, ThreadPoolBuildError> {
    let mut builder = ThreadPoolBuilder::new();
    if let Some(n) = num_threads {
        builder = builder.num_threads(n);
    }
    builder.build()
}

impl Classifier for ForestClassifier {
    fn predict(&self, data: &FeatureMatrix) -> Vec<f64> {
        self.predict_proba(data)
            .into_iter()
            .map(|p| if p > DECISION_THRESHOLD { 1.0 } else { 0.0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureSchema;

    // Label is 1 when x0 > 0.6, x1 carries no signal.
    fn fixture(rows: usize) -> (FeatureMatrix, Vec<f64>) {
        let x0: Vec<f64> = (0..rows).map(|i| ((i * 7919) % rows) as f64 / rows as f64).collect();
        let x1: Vec<f64> = (0..rows).map(|i| (i % 5) as f64).collect();
        let y = x0.iter().map(|v| if *v > 0.6 { 1.0 } else { 0.0 }).collect();
        let schema = FeatureSchema::new(vec!["x0".to_string(), "x1".to_string()]);
        let data = x0.into_iter().chain(x1).collect();
        (FeatureMatrix::new(schema, data, rows).unwrap(), y)
    }

    fn config() -> TrainConfig {
        TrainConfig {
            n_estimators: 10,
            max_depth: 6,
            num_threads: Some(2),
            ..Default::default()
        }
    }

    #[test]
    fn test_forest_fit_predict() {
        let (m, y) = fixture(500);
        let model = ForestClassifier::fit(&m, &y, &config()).unwrap();
        assert_eq!(model.trees.len(), 10);
        let preds = model.predict(&m);
        let correct = preds.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
        assert!(correct as f64 / y.len() as f64 > 0.95);
        assert!(model.predict_proba(&m).iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_forest_is_deterministic() {
        let (m, y) = fixture(200);
        let a = ForestClassifier::fit(&m, &y, &config()).unwrap();
        let b = ForestClassifier::fit(
            &m,
            &y,
            &TrainConfig {
                num_threads: Some(1),
                ..config()
            },
        )
        .unwrap();
        assert_eq!(a.trees, b.trees);
    }

    #[test]
    fn test_forest_without_bootstrap() {
        let (m, y) = fixture(100);
        let model = ForestClassifier::fit(
            &m,
            &y,
            &TrainConfig {
                bootstrap: false,
                ..config()
            },
        )
        .unwrap();
        assert_eq!(model.n_features, 2);
        assert!(model.n_leaves() >= model.trees.len());
    }

    #[test]
    fn test_forest_rejects_bad_input() {
        let (m, y) = fixture(50);
        assert!(matches!(
            ForestClassifier::fit(&m, &y[..10], &config()),
            Err(RetrainError::Training(_))
        ));
        let bad = TrainConfig {
            max_depth: 0,
            ..config()
        };
        assert!(matches!(
            ForestClassifier::fit(&m, &y, &bad),
            Err(RetrainError::InvalidParameter(..))
        ));
    }

    #[test]
    fn test_forest_predicts_with_its_thread_count() {
        let (m, y) = fixture(150);
        let model = ForestClassifier::fit(
            &m,
            &y,
            &TrainConfig {
                num_threads: Some(1),
                ..config()
            },
        )
        .unwrap();
        assert_eq!(model.num_threads, Some(1));
        let single = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        assert_eq!(model.predict_proba(&m), single.install(|| model.predict_proba(&m)));
        let unbounded = ForestClassifier {
            num_threads: None,
            ..model.clone()
        };
        assert_eq!(unbounded.predict(&m), model.predict(&m));

        // Models saved without a thread count load with the default.
        let mut json: serde_json::Value = serde_json::to_value(&model).unwrap();
        json.as_object_mut().unwrap().remove("num_threads");
        let loaded: ForestClassifier = serde_json::from_value(json).unwrap();
        assert_eq!(loaded.num_threads, None);
    }

    #[test]
    fn test_forest_json_roundtrip_predictions() {
        let (m, y) = fixture(120);
        let model = ForestClassifier::fit(&m, &y, &config()).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let loaded: ForestClassifier = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.predict(&m), model.predict(&m));
    }
}
