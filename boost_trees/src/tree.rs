//! Binary regression trees produced by the depth-wise learner

use crate::dataset::{Dataset, FeatureColumn};
use serde::{Deserialize, Serialize};

/// Rule deciding whether a row goes to the left child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SplitRule {
    /// Numeric rule: `value <= threshold` goes left, missing goes right
    Threshold(f64),
    /// Categorical rule: listed categories (sorted) go left, everything else right
    Categories(Vec<u32>),
}

impl SplitRule {
    /// Whether the given row of `column` goes to the left child
    pub fn goes_left(&self, column: &FeatureColumn, row: usize) -> bool {
        match (self, column) {
            (SplitRule::Threshold(threshold), FeatureColumn::Numeric(values)) => {
                values[row] <= *threshold
            }
            (SplitRule::Categories(left), FeatureColumn::Categorical(codes)) => match codes[row] {
                Some(code) => left.binary_search(&code).is_ok(),
                None => false,
            },
            _ => false,
        }
    }
}

/// Tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        rule: SplitRule,
        left: usize,
        right: usize,
    },
}

/// Regression tree stored as a flat node list; node 0 is the root
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of leaves
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Output of the tree for one row of `data`
    pub fn predict_row(&self, data: &Dataset, row: usize) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    rule,
                    left,
                    right,
                }) => {
                    let goes_left = data
                        .column(*feature)
                        .map(|column| rule.goes_left(column, row))
                        .unwrap_or(false);
                    index = if goes_left { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }
}
