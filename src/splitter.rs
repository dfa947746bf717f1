//! Splitter
//!
//! Finds the best threshold for a node given the histograms of its candidate features.
use crate::histogram::{FeatureHistogram, LabelCounts};

#[derive(Debug, Clone, PartialEq)]
pub struct SplitInfo {
    pub split_feature: usize,
    /// Last bin sent to the left child.
    pub split_bin: u16,
    /// Rows with `value < split_value` go left.
    pub split_value: f64,
    pub split_gain: f64,
    pub left_counts: LabelCounts,
    pub right_counts: LabelCounts,
}

pub trait Splitter {
    /// Best split of a single feature, or `None` when no split improves the node.
    fn best_feature_split(&self, hist: &FeatureHistogram, cuts: &[f64], parent: LabelCounts) -> Option<SplitInfo>;

    /// Best split across all the given histograms.
    fn best_split(&self, hists: &[FeatureHistogram], cuts: &[Vec<f64>], parent: LabelCounts) -> Option<SplitInfo> {
        let mut best: Option<SplitInfo> = None;
        for hist in hists {
            if let Some(info) = self.best_feature_split(hist, &cuts[hist.feature], parent) {
                if best.as_ref().map_or(true, |b| info.split_gain > b.split_gain) {
                    best = Some(info);
                }
            }
        }
        best
    }
}

/// Gini impurity of a node with the given label counts.
pub fn gini(counts: LabelCounts) -> f64 {
    let n = (counts[0] + counts[1]) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let p0 = counts[0] as f64 / n;
    let p1 = counts[1] as f64 / n;
    1.0 - p0 * p0 - p1 * p1
}

/// Splits on the largest decrease in weighted Gini impurity.
pub struct GiniSplitter {
    pub min_samples_leaf: usize,
}

impl Splitter for GiniSplitter {
    fn best_feature_split(&self, hist: &FeatureHistogram, cuts: &[f64], parent: LabelCounts) -> Option<SplitInfo> {
        let n = (parent[0] + parent[1]) as f64;
        let parent_gini = gini(parent);
        let min_leaf = self.min_samples_leaf.max(1) as u32;

        let mut left = [0_u32; 2];
        let mut best: Option<SplitInfo> = None;
        // The last bin can not be a split point, nothing would go right.
        for (b, counts) in hist.bins.iter().enumerate().take(cuts.len()) {
            left[0] += counts[0];
            left[1] += counts[1];
            let right = [parent[0] - left[0], parent[1] - left[1]];
            let n_left = left[0] + left[1];
            let n_right = right[0] + right[1];
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }
            let gain =
                parent_gini - (n_left as f64 / n) * gini(left) - (n_right as f64 / n) * gini(right);
            if gain > f64::EPSILON && best.as_ref().map_or(true, |s| gain > s.split_gain) {
                best = Some(SplitInfo {
                    split_feature: hist.feature,
                    split_bin: b as u16,
                    split_value: cuts[b],
                    split_gain: gain,
                    left_counts: left,
                    right_counts: right,
                });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gini() {
        assert_eq!(gini([10, 0]), 0.0);
        assert_eq!(gini([5, 5]), 0.5);
        assert_eq!(gini([0, 0]), 0.0);
    }

    #[test]
    fn test_perfect_split() {
        let hist = FeatureHistogram {
            feature: 2,
            bins: vec![[4, 0], [3, 0], [0, 5]],
        };
        let splitter = GiniSplitter { min_samples_leaf: 1 };
        let info = splitter.best_feature_split(&hist, &[1.0, 2.0], [7, 5]).unwrap();
        assert_eq!(info.split_feature, 2);
        assert_eq!(info.split_bin, 1);
        assert_eq!(info.split_value, 2.0);
        assert_eq!(info.left_counts, [7, 0]);
        assert_eq!(info.right_counts, [0, 5]);
        assert!((info.split_gain - gini([7, 5])).abs() < 1e-12);
    }

    #[test]
    fn test_no_useful_split() {
        let hist = FeatureHistogram {
            feature: 0,
            bins: vec![[2, 2], [2, 2]],
        };
        let splitter = GiniSplitter { min_samples_leaf: 1 };
        assert!(splitter.best_feature_split(&hist, &[1.0], [4, 4]).is_none());
    }

    #[test]
    fn test_min_samples_leaf() {
        let hist = FeatureHistogram {
            feature: 0,
            bins: vec![[0, 1], [5, 0]],
        };
        assert!(GiniSplitter { min_samples_leaf: 2 }
            .best_feature_split(&hist, &[1.0], [5, 1])
            .is_none());
        assert!(GiniSplitter { min_samples_leaf: 1 }
            .best_feature_split(&hist, &[1.0], [5, 1])
            .is_some());
    }

    #[test]
    fn test_best_split_across_features() {
        let weak = FeatureHistogram {
            feature: 0,
            bins: vec![[3, 1], [1, 3]],
        };
        let strong = FeatureHistogram {
            feature: 1,
            bins: vec![[4, 0], [0, 4]],
        };
        let cuts = vec![vec![1.0], vec![10.0]];
        let info = GiniSplitter { min_samples_leaf: 1 }
            .best_split(&[weak, strong], &cuts, [4, 4])
            .unwrap();
        assert_eq!(info.split_feature, 1);
        assert_eq!(info.split_value, 10.0);
    }
}
