//! Gate
//!
//! Decides whether a freshly trained candidate replaces the production model.
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Promote,
    Reject,
}

impl Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Decision::Promote => write!(f, "promote"),
            Decision::Reject => write!(f, "reject"),
        }
    }
}

/// Scores the decision was based on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// F1 of the production model, `None` when there is none.
    pub incumbent: Option<f64>,
    pub candidate: f64,
}

impl Comparison {
    /// Score the candidate has to reach, an empty registry counts as 0.0.
    pub fn baseline(&self) -> f64 {
        match self.incumbent {
            Some(v) if !v.is_nan() => v,
            _ => 0.0,
        }
    }

    /// How much worse the candidate is than the baseline, negative when better.
    pub fn drop(&self) -> f64 {
        self.baseline() - self.candidate
    }
}

/// Stateless promotion rule: the candidate wins when it is at least as good
/// as the incumbent, ties go to the newer model.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromotionGate;

impl PromotionGate {
    pub fn decide(&self, incumbent: Option<f64>, candidate: f64) -> Decision {
        self.judge(&Comparison { incumbent, candidate })
    }

    pub fn judge(&self, comparison: &Comparison) -> Decision {
        // A NaN candidate never compares as >= and is rejected.
        if comparison.candidate >= comparison.baseline() {
            Decision::Promote
        } else {
            Decision::Reject
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worse_candidate_rejected() {
        assert_eq!(PromotionGate.decide(Some(0.82), 0.79), Decision::Reject);
    }

    #[test]
    fn test_tie_promotes() {
        assert_eq!(PromotionGate.decide(Some(0.70), 0.70), Decision::Promote);
    }

    #[test]
    fn test_first_model_always_promoted() {
        assert_eq!(PromotionGate.decide(None, 0.0), Decision::Promote);
        assert_eq!(PromotionGate.decide(None, 0.4), Decision::Promote);
    }

    #[test]
    fn test_decision_is_monotonic() {
        let grid: Vec<f64> = (0..=20).map(|i| i as f64 / 20.0).collect();
        for a in grid.iter() {
            for b in grid.iter() {
                let promoted = PromotionGate.decide(Some(*a), *b) == Decision::Promote;
                assert_eq!(promoted, b >= a, "incumbent {a} candidate {b}");
            }
        }
    }

    #[test]
    fn test_nan_scores() {
        assert_eq!(PromotionGate.decide(Some(0.5), f64::NAN), Decision::Reject);
        assert_eq!(PromotionGate.decide(None, f64::NAN), Decision::Reject);
        assert_eq!(PromotionGate.decide(Some(f64::NAN), 0.1), Decision::Promote);
    }

    #[test]
    fn test_comparison_drop() {
        let c = Comparison {
            incumbent: Some(0.82),
            candidate: 0.79,
        };
        assert!((c.drop() - 0.03).abs() < 1e-12);
        let first = Comparison {
            incumbent: None,
            candidate: 0.5,
        };
        assert_eq!(first.baseline(), 0.0);
        assert_eq!(Decision::Promote.to_string(), "promote");
    }
}
