//! Job
//!
//! Runs one retraining cycle: collect, validate, prepare, train, evaluate,
//! decide, then promote or alert. Every run ends in exactly one [`JobOutcome`].
use crate::config::JobConfig;
use crate::errors::RetrainError;
use crate::features::FeaturePreparer;
use crate::gate::{Comparison, Decision, PromotionGate};
use crate::holdout::{evaluate, score, HoldoutScore, HoldoutStore};
use crate::notify::{AlertContext, Notifier};
use crate::registry::{ModelArtifact, ModelRegistry, PromotionRecord};
use crate::source::DataSource;
use crate::trainer::Trainer;
use crate::validator::DataValidator;
use log::{error, info, warn};
use std::fmt::{self, Display};
use std::time::Instant;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Collect,
    Validate,
    Prepare,
    Train,
    Evaluate,
    Decide,
    Promote,
    Notify,
}

impl Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            JobStage::Collect => "collect",
            JobStage::Validate => "validate",
            JobStage::Prepare => "prepare",
            JobStage::Train => "train",
            JobStage::Evaluate => "evaluate",
            JobStage::Decide => "decide",
            JobStage::Promote => "promote",
            JobStage::Notify => "notify",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromotionSummary {
    pub comparison: Comparison,
    pub candidate: HoldoutScore,
    pub record: PromotionRecord,
}

/// Terminal result of a job run.
#[derive(Debug)]
pub enum JobOutcome {
    Promoted(PromotionSummary),
    Rejected(Comparison),
    Aborted { stage: JobStage, error: RetrainError },
}

impl JobOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            JobOutcome::Promoted(_) => "promoted",
            JobOutcome::Rejected(_) => "rejected",
            JobOutcome::Aborted { .. } => "aborted",
        }
    }

    pub fn comparison(&self) -> Option<&Comparison> {
        match self {
            JobOutcome::Promoted(s) => Some(&s.comparison),
            JobOutcome::Rejected(c) => Some(c),
            JobOutcome::Aborted { .. } => None,
        }
    }

    /// Process exit code, only an aborted job is a failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            JobOutcome::Aborted { .. } => 1,
            _ => 0,
        }
    }
}

impl Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobOutcome::Aborted { stage, error } => write!(f, "aborted during {}: {}", stage, error),
            _ => {
                let c = self.comparison().copied().unwrap_or(Comparison {
                    incumbent: None,
                    candidate: f64::NAN,
                });
                write!(
                    f,
                    "{} (current F1 {:.4}, candidate F1 {:.4})",
                    self.status(),
                    c.baseline(),
                    c.candidate
                )
            }
        }
    }
}

// Logs the end of the job when dropped, whichever way `run` exits.
struct JobFinalizer {
    start: Instant,
}

impl Drop for JobFinalizer {
    fn drop(&mut self) {
        let rule = "=".repeat(50);
        info!("{}", rule);
        info!("END OF JOB ({:.1}s)", self.start.elapsed().as_secs_f32());
        info!("{}", rule);
    }
}

pub struct RetrainJob<S, T, N> {
    config: JobConfig,
    source: S,
    trainer: T,
    notifier: N,
    validator: DataValidator,
    preparer: FeaturePreparer,
    registry: ModelRegistry,
    holdout: HoldoutStore,
    gate: PromotionGate,
}

impl<S, T, N> RetrainJob<S, T, N>
where
    S: DataSource,
    T: Trainer,
    N: Notifier,
{
    pub fn new(config: JobConfig, source: S, trainer: T, notifier: N) -> Self {
        RetrainJob {
            validator: DataValidator::new(config.minimum_rows),
            preparer: FeaturePreparer::new(config.vocabulary.clone()),
            registry: config.registry(),
            holdout: config.holdout_store(),
            gate: PromotionGate,
            config,
            source,
            trainer,
            notifier,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Run the job once. Errors never escape, they end the run as `Aborted`
    /// and are reported through the notifier.
    pub fn run(&mut self) -> JobOutcome {
        let _finalizer = JobFinalizer { start: Instant::now() };
        let rule = "=".repeat(50);
        info!("{}", rule);
        info!("RETRAINING JOB");
        info!("{}", rule);

        let mut stage = JobStage::Collect;
        let outcome = match self.execute(&mut stage) {
            Ok(outcome) => outcome,
            Err(error) => {
                error!("Failure during {}: {}", stage, error);
                let context = AlertContext {
                    comparison: None,
                    stage: Some(stage.to_string()),
                };
                self.notifier.notify(&error.to_string(), &context);
                JobOutcome::Aborted { stage, error }
            }
        };
        info!("Job {}", outcome);
        outcome
    }

    fn execute(&mut self, stage: &mut JobStage) -> Result<JobOutcome, RetrainError> {
        *stage = JobStage::Collect;
        let batch = self.source.collect(self.config.window())?;

        *stage = JobStage::Validate;
        let clean = self.validator.validate(&batch)?;
        drop(batch);

        *stage = JobStage::Prepare;
        let (features, labels) = self.preparer.prepare(&clean)?;
        drop(clean);

        *stage = JobStage::Train;
        let model = self.trainer.train(&features, &labels, &self.config.train)?;
        let mut candidate = ModelArtifact::new(model, features.schema.clone());
        candidate.insert_metadata("training_rows", features.rows.to_string());
        drop(features);

        *stage = JobStage::Evaluate;
        info!("Comparing with the production model...");
        let holdout = self.holdout.obtain(&self.preparer)?;
        let candidate_score = evaluate(&candidate, &holdout)?;
        let incumbent = match self.registry.current::<T::Model>()? {
            Some(current) => Some(score(&current, &holdout)?),
            None => {
                info!("  (First model, there is no previous one)");
                None
            }
        };

        *stage = JobStage::Decide;
        let comparison = Comparison {
            incumbent,
            candidate: candidate_score.f1,
        };
        info!("  Current F1:   {:.4}", comparison.baseline());
        info!(
            "  Candidate F1: {:.4} (precision {:.4}, recall {:.4})",
            candidate_score.f1, candidate_score.precision, candidate_score.recall
        );

        match self.gate.judge(&comparison) {
            Decision::Promote => {
                info!("Candidate is better or equal, promoting.");
                *stage = JobStage::Promote;
                candidate.insert_metadata("holdout_f1", format!("{:.6}", candidate_score.f1));
                let record = self.registry.promote(&candidate)?;
                Ok(JobOutcome::Promoted(PromotionSummary {
                    comparison,
                    candidate: candidate_score,
                    record,
                }))
            }
            Decision::Reject => {
                warn!("Candidate is WORSE than the production model.");
                *stage = JobStage::Notify;
                self.registry.reject();
                let context = AlertContext {
                    comparison: Some(comparison),
                    stage: None,
                };
                self.notifier.notify("Candidate model is worse than the production model", &context);
                Ok(JobOutcome::Rejected(comparison))
            }
        }
    }
}
