mod node;

// Modules
pub mod binning;
pub mod config;
pub mod constants;
pub mod data;
pub mod errors;
pub mod features;
pub mod forest;
pub mod gate;
pub mod histogram;
pub mod holdout;
pub mod job;
pub mod metric;
pub mod notify;
pub mod registry;
pub mod sampler;
pub mod source;
pub mod splitter;
pub mod trainer;
pub mod tree;
pub mod utils;
pub mod validator;

// Individual classes, and functions
pub use config::JobConfig;
pub use data::{FeatureMatrix, FeatureSchema, RawBatch, RawRecord, Record};
pub use errors::RetrainError;
pub use features::{CategoryVocabulary, FeaturePreparer, UnknownCategory};
pub use forest::ForestClassifier;
pub use gate::{Comparison, Decision, PromotionGate};
pub use holdout::{HoldoutSet, HoldoutStore};
pub use job::{JobOutcome, JobStage, RetrainJob};
pub use notify::{LogNotifier, MemoryNotifier, Notifier};
pub use registry::{ModelArtifact, ModelRegistry};
pub use source::{CsvSource, DataSource, SyntheticSource};
pub use trainer::{Classifier, ForestTrainer, MajorityTrainer, TrainConfig, Trainer};
pub use validator::DataValidator;
