//! Histogram
//!
//! Per-bin label counts for the rows that reach a node.
use crate::binning::BinnedData;

/// Negative and positive label counts.
pub type LabelCounts = [u32; 2];

/// Label counts for each bin of a single feature.
#[derive(Debug, Clone)]
pub struct FeatureHistogram {
    pub feature: usize,
    pub bins: Vec<LabelCounts>,
}

impl FeatureHistogram {
    /// Build the histogram of `feature` over `index`.
    pub fn build(data: &BinnedData, feature: usize, index: &[usize], y: &[f64]) -> Self {
        let mut bins = vec![[0_u32; 2]; data.n_bins(feature)];
        for &i in index {
            let b = data.get(i, feature) as usize;
            bins[b][label_slot(y[i])] += 1;
        }
        FeatureHistogram { feature, bins }
    }
}

#[inline]
pub fn label_slot(y: f64) -> usize {
    if y > 0.5 {
        1
    } else {
        0
    }
}

/// Label counts of the rows in `index`.
pub fn count_labels(index: &[usize], y: &[f64]) -> LabelCounts {
    let mut counts = [0_u32; 2];
    for &i in index {
        counts[label_slot(y[i])] += 1;
    }
    counts
}
