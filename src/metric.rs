//! Metric
//!
//! Binary classification metrics computed from hard 0/1 predictions.
use serde::{Deserialize, Serialize};

/// Counts of a binary confusion matrix, the positive class is `1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y: &[f64], yhat: &[f64]) -> Self {
        let mut cm = ConfusionMatrix::default();
        for (y_, yhat_) in y.iter().zip(yhat) {
            match (*y_ > 0.5, *yhat_ > 0.5) {
                (true, true) => cm.true_positive += 1,
                (false, true) => cm.false_positive += 1,
                (false, false) => cm.true_negative += 1,
                (true, false) => cm.false_negative += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

// A ratio with an empty denominator is reported as 0.0.
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

pub fn precision(cm: &ConfusionMatrix) -> f64 {
    ratio(cm.true_positive, cm.true_positive + cm.false_positive)
}

pub fn recall(cm: &ConfusionMatrix) -> f64 {
    ratio(cm.true_positive, cm.true_positive + cm.false_negative)
}

pub fn accuracy(cm: &ConfusionMatrix) -> f64 {
    ratio(cm.true_positive + cm.true_negative, cm.total())
}

/// Harmonic mean of precision and recall, `2TP / (2TP + FP + FN)`.
pub fn f1(cm: &ConfusionMatrix) -> f64 {
    ratio(
        2 * cm.true_positive,
        2 * cm.true_positive + cm.false_positive + cm.false_negative,
    )
}

pub fn f1_score(y: &[f64], yhat: &[f64]) -> f64 {
    f1(&ConfusionMatrix::from_predictions(y, yhat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix() {
        let y = vec![1.0, 1.0, 0.0, 0.0, 1.0];
        let yhat = vec![1.0, 0.0, 1.0, 0.0, 1.0];
        let cm = ConfusionMatrix::from_predictions(&y, &yhat);
        assert_eq!(cm.true_positive, 2);
        assert_eq!(cm.false_negative, 1);
        assert_eq!(cm.false_positive, 1);
        assert_eq!(cm.true_negative, 1);
        assert_eq!(cm.total(), 5);
        assert!((precision(&cm) - 2.0 / 3.0).abs() < 1e-12);
        assert!((recall(&cm) - 2.0 / 3.0).abs() < 1e-12);
        assert!((accuracy(&cm) - 0.6).abs() < 1e-12);
        assert!((f1(&cm) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_f1_is_harmonic_mean() {
        let y = vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0];
        let yhat = vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let cm = ConfusionMatrix::from_predictions(&y, &yhat);
        let (p, r) = (precision(&cm), recall(&cm));
        assert!((f1(&cm) - 2.0 * p * r / (p + r)).abs() < 1e-12);
    }

    #[test]
    fn test_f1_without_positive_predictions() {
        let y = vec![1.0, 0.0, 0.0];
        assert_eq!(f1_score(&y, &[0.0, 0.0, 0.0]), 0.0);
        assert_eq!(f1_score(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
        assert_eq!(f1_score(&y, &y), 1.0);
    }
}
