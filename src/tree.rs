//! Tree
//!
//! A single classification tree grown depth-first over binned data.
use crate::binning::BinnedData;
use crate::histogram::{count_labels, FeatureHistogram};
use crate::node::{Node, SplittableNode};
use crate::splitter::Splitter;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};
use std::cmp::max;
use std::collections::VecDeque;
use std::fmt::{self, Display};

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
    pub depth: usize,
    pub n_leaves: usize,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        Tree {
            nodes: Vec::new(),
            depth: 0,
            n_leaves: 0,
        }
    }

    /// Grow the tree on the rows in `index`, which may contain repeats.
    ///
    /// * `max_depth` - Nodes at this depth are never split.
    /// * `max_features` - Number of features drawn as split candidates at each node.
    #[allow(clippy::too_many_arguments)]
    pub fn fit<T: Splitter>(
        &mut self,
        data: &BinnedData,
        mut index: Vec<usize>,
        y: &[f64],
        splitter: &T,
        max_depth: usize,
        max_features: usize,
        min_samples_split: usize,
        rng: &mut StdRng,
    ) {
        self.nodes.clear();
        self.depth = 0;
        self.n_leaves = 1;

        let root = SplittableNode {
            num: 0,
            depth: 0,
            start_idx: 0,
            stop_idx: index.len(),
            counts: count_labels(&index, y),
        };
        self.nodes.push(root.as_node());

        let n_features = data.cols();
        let max_features = max_features.clamp(1, max(n_features, 1));
        let mut growable = VecDeque::new();
        growable.push_back(root);

        while let Some(node) = growable.pop_back() {
            if node.depth >= max_depth || node.is_pure() || node.size() < min_samples_split || n_features == 0 {
                continue;
            }

            // Draw `max_features` candidates, falling back to the remaining
            // features only when none of them yields a valid split.
            let rows = &index[node.start_idx..node.stop_idx];
            let order = sample(rng, n_features, n_features).into_vec();
            let (drawn, rest) = order.split_at(max_features);
            let split = [drawn, rest].iter().find_map(|features| {
                let hists: Vec<FeatureHistogram> = features
                    .iter()
                    .map(|f| FeatureHistogram::build(data, *f, rows, y))
                    .collect();
                splitter.best_split(&hists, &data.cuts, node.counts)
            });
            let split = match split {
                Some(s) => s,
                None => continue,
            };

            // Move the rows going left to the front of the node's range.
            let slice = &mut index[node.start_idx..node.stop_idx];
            let mut n_left = 0;
            for j in 0..slice.len() {
                if data.get(slice[j], split.split_feature) <= split.split_bin {
                    slice.swap(n_left, j);
                    n_left += 1;
                }
            }

            let left = SplittableNode {
                num: self.nodes.len(),
                depth: node.depth + 1,
                start_idx: node.start_idx,
                stop_idx: node.start_idx + n_left,
                counts: split.left_counts,
            };
            let right = SplittableNode {
                num: self.nodes.len() + 1,
                depth: node.depth + 1,
                start_idx: node.start_idx + n_left,
                stop_idx: node.stop_idx,
                counts: split.right_counts,
            };
            self.nodes[node.num].make_parent_node(&split, left.num, right.num);
            self.nodes.push(left.as_node());
            self.nodes.push(right.as_node());
            self.n_leaves += 1;
            self.depth = max(self.depth, node.depth + 1);

            growable.push_back(right);
            growable.push_back(left);
        }
    }

    /// Probability of the positive class for a single row.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node_idx = 0;
        loop {
            let node = &self.nodes[node_idx];
            if node.is_leaf {
                return node.value;
            }
            node_idx = node.get_child_idx(row[node.split_feature]);
        }
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut print_buffer: Vec<usize> = vec![0];
        let mut r = String::new();
        while let Some(idx) = print_buffer.pop() {
            let node = &self.nodes[idx];
            r += format!("{}{}\n", "      ".repeat(node.depth).as_str(), node).as_str();
            if !node.is_leaf {
                print_buffer.push(node.right_child);
                print_buffer.push(node.left_child);
            }
        }
        write!(f, "{}", r)
    }
}
