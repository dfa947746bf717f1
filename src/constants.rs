pub const DEFAULT_MINIMUM_ROWS: usize = 1000;
pub const DEFAULT_WINDOW_DAYS: u32 = 90;
pub const HOLDOUT_ROWS: usize = 10_000;
pub const HOLDOUT_SEED: u64 = 12_345;
pub const N_ESTIMATORS: usize = 100;
pub const MAX_DEPTH: usize = 10;
pub const TRAIN_SEED: u64 = 42;
pub const MAX_BIN: u16 = 64;
pub const FEATURE_SCHEMA_VERSION: u32 = 1;
pub const DECISION_THRESHOLD: f64 = 0.5;
pub const OTHER_CATEGORY: &str = "other";
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const SYNTHETIC_MIN_ROWS: usize = 40_000;
pub const SYNTHETIC_MAX_ROWS: usize = 50_000;
