use crate::histogram::LabelCounts;
use crate::splitter::SplitInfo;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A node waiting to be split, covering `index[start_idx..stop_idx]`.
#[derive(Debug)]
pub struct SplittableNode {
    pub num: usize,
    pub depth: usize,
    pub start_idx: usize,
    pub stop_idx: usize,
    pub counts: LabelCounts,
}

impl SplittableNode {
    pub fn as_node(&self) -> Node {
        Node {
            num: self.num,
            depth: self.depth,
            value: positive_rate(self.counts),
            counts: self.counts,
            split_feature: 0,
            split_value: 0.0,
            split_gain: 0.0,
            left_child: 0,
            right_child: 0,
            is_leaf: true,
        }
    }

    pub fn is_pure(&self) -> bool {
        self.counts[0] == 0 || self.counts[1] == 0
    }

    pub fn size(&self) -> usize {
        self.stop_idx - self.start_idx
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Node {
    pub num: usize,
    pub depth: usize,
    /// Fraction of positive labels among the training rows of the node.
    pub value: f64,
    pub counts: LabelCounts,
    pub split_feature: usize,
    pub split_value: f64,
    pub split_gain: f64,
    pub left_child: usize,
    pub right_child: usize,
    pub is_leaf: bool,
}

impl Node {
    /// Update all the info that is needed if this node becomes a parent node.
    pub fn make_parent_node(&mut self, split: &SplitInfo, left_child: usize, right_child: usize) {
        self.is_leaf = false;
        self.split_feature = split.split_feature;
        self.split_value = split.split_value;
        self.split_gain = split.split_gain;
        self.left_child = left_child;
        self.right_child = right_child;
    }

    /// Get the path that should be traveled down, given a value.
    pub fn get_child_idx(&self, v: f64) -> usize {
        if v < self.split_value {
            self.left_child
        } else {
            self.right_child
        }
    }
}

fn positive_rate(counts: LabelCounts) -> f64 {
    let n = counts[0] + counts[1];
    if n == 0 {
        0.0
    } else {
        counts[1] as f64 / n as f64
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_leaf {
            write!(f, "{}:leaf={},counts={:?}", self.num, self.value, self.counts)
        } else {
            write!(
                f,
                "{}:[{} < {}] yes={},no={},gain={}",
                self.num, self.split_feature, self.split_value, self.left_child, self.right_child, self.split_gain
            )
        }
    }
}
