//! Binning
//!
//! Features are discretized once per fit, so split search only has to walk
//! per-bin label counts instead of sorting raw values at every node.
use crate::data::FeatureMatrix;
use crate::errors::RetrainError;

// A value `v` falls in bin `b` where `b` is the number of cuts `<= v`.
// With cuts [2.0, 5.0] we get bins 0 (-inf, 2.0), 1 [2.0, 5.0) and 2 [5.0, inf).
// A split at bin `b` sends bins `0..=b` left, which is the same as `v < cuts[b]`.
#[derive(Debug)]
pub struct BinnedData {
    /// Column major bin numbers, same layout as the source matrix.
    pub binned_data: Vec<u16>,
    pub cuts: Vec<Vec<f64>>,
    pub rows: usize,
}

impl BinnedData {
    pub fn cols(&self) -> usize {
        self.cuts.len()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u16 {
        self.binned_data[col * self.rows + row]
    }

    /// Number of bins in a column.
    pub fn n_bins(&self, col: usize) -> usize {
        self.cuts[col].len() + 1
    }
}

/// Cut points for a column: every distinct value when there are few of them,
/// otherwise evenly spaced percentiles.
fn column_cuts(values: &[f64], max_bin: u16) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let mut unique = sorted.clone();
    unique.dedup();

    let mut cuts: Vec<f64> = if unique.len() <= max_bin as usize {
        unique.into_iter().skip(1).collect()
    } else {
        (1..max_bin as usize)
            .map(|k| sorted[k * sorted.len() / max_bin as usize])
            .collect()
    };
    cuts.dedup();
    // A cut at the minimum would leave the first bin empty.
    if let Some(min) = sorted.first() {
        cuts.retain(|c| c > min);
    }
    cuts
}

#[inline]
fn map_bin(cuts: &[f64], v: f64) -> u16 {
    cuts.partition_point(|c| *c <= v) as u16
}

/// Convert a matrix of data into a binned matrix.
///
/// * `data` - Numeric data to be binned.
/// * `max_bin` - Upper bound on the number of bins per column.
pub fn bin_matrix(data: &FeatureMatrix, max_bin: u16) -> Result<BinnedData, RetrainError> {
    if max_bin < 2 {
        return Err(RetrainError::InvalidParameter(
            "max_bin".to_string(),
            "a value of at least 2".to_string(),
            max_bin.to_string(),
        ));
    }
    if let Some(v) = data.data.iter().find(|v| !v.is_finite()) {
        return Err(RetrainError::Training(format!("value {} found in the feature matrix", v)));
    }

    let cuts: Vec<Vec<f64>> = (0..data.cols()).map(|c| column_cuts(data.get_col(c), max_bin)).collect();
    let binned_data = data
        .data
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let col = i / data.rows;
            map_bin(&cuts[col], *v)
        })
        .collect();

    Ok(BinnedData {
        binned_data,
        cuts,
        rows: data.rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureSchema;

    fn matrix(cols: Vec<Vec<f64>>) -> FeatureMatrix {
        let rows = cols[0].len();
        let names = (0..cols.len()).map(|i| format!("f{}", i)).collect();
        FeatureMatrix::new(FeatureSchema::new(names), cols.into_iter().flatten().collect(), rows).unwrap()
    }

    #[test]
    fn test_few_unique_values() {
        let m = matrix(vec![vec![3.0, 1.0, 2.0, 1.0, 3.0]]);
        let b = bin_matrix(&m, 64).unwrap();
        assert_eq!(b.cuts[0], vec![2.0, 3.0]);
        assert_eq!(b.binned_data, vec![2, 0, 1, 0, 2]);
        assert_eq!(b.n_bins(0), 3);
    }

    #[test]
    fn test_constant_column_has_single_bin() {
        let m = matrix(vec![vec![7.0; 4]]);
        let b = bin_matrix(&m, 8).unwrap();
        assert!(b.cuts[0].is_empty());
        assert!(b.binned_data.iter().all(|v| *v == 0));
    }

    #[test]
    fn test_percentile_cuts_bounded() {
        let values: Vec<f64> = (0..1000).map(|i| i as f64).collect();
        let m = matrix(vec![values.clone()]);
        let b = bin_matrix(&m, 16).unwrap();
        assert!(b.n_bins(0) <= 16);
        // Bins are monotone in the value.
        for w in values.windows(2) {
            assert!(map_bin(&b.cuts[0], w[0]) <= map_bin(&b.cuts[0], w[1]));
        }
        // The split rule `v < cut` matches the bin assignment.
        for (i, v) in values.iter().enumerate() {
            let bin = b.get(i, 0) as usize;
            if bin < b.cuts[0].len() {
                assert!(*v < b.cuts[0][bin]);
            }
        }
    }

    #[test]
    fn test_non_finite_values_rejected() {
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let m = matrix(vec![vec![1.0, v, 2.0]]);
            assert!(matches!(bin_matrix(&m, 8), Err(RetrainError::Training(_))));
        }
    }

    #[test]
    fn test_invalid_max_bin() {
        let m = matrix(vec![vec![1.0, 2.0]]);
        assert!(matches!(bin_matrix(&m, 1), Err(RetrainError::InvalidParameter(..))));
    }
}
