//! Retrainer CLI
//!
//! Runs one retraining job, meant to be scheduled (cron, CI) at a fixed cadence.
//!
//! # Usage
//!
//! ```bash
//! # Synthetic data, default locations
//! retrainer
//!
//! # Transactions from a csv export, with a job config
//! retrainer --config job.json --data transactions.csv
//! ```

use clap::Parser;
use log::error;
use retrainer::constants::{SYNTHETIC_MAX_ROWS, SYNTHETIC_MIN_ROWS};
use retrainer::{CsvSource, DataSource, ForestTrainer, JobConfig, LogNotifier, RetrainJob, SyntheticSource};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Retrain the fraud classifier and promote it if it is at least as good as production.
#[derive(Parser, Debug)]
#[command(name = "retrainer", version, about)]
struct Cli {
    /// Job configuration (json), defaults are used for missing keys.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Csv file with the collected transactions, synthetic data is generated when omitted.
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Minimum number of valid rows required to train.
    #[arg(long)]
    minimum_rows: Option<usize>,

    /// Seed of the synthetic data generator.
    #[arg(long)]
    seed: Option<u64>,
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{}] {}", chrono::Local::now().format("%H:%M:%S"), record.args()))
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let mut config = match cli.config.as_ref() {
        Some(path) => match JobConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => JobConfig::default(),
    };
    if let Some(minimum_rows) = cli.minimum_rows {
        config.minimum_rows = minimum_rows;
    }

    let rows = SYNTHETIC_MIN_ROWS..SYNTHETIC_MAX_ROWS;
    let source: Box<dyn DataSource> = match (cli.data, cli.seed) {
        (Some(path), _) => Box::new(CsvSource::new(path)),
        (None, Some(seed)) => Box::new(SyntheticSource::seeded_range(seed, rows)),
        (None, None) => Box::new(SyntheticSource::from_entropy(rows)),
    };

    let mut job = RetrainJob::new(config, source, ForestTrainer, LogNotifier);
    ExitCode::from(job.run().exit_code())
}
