//! Oblivious (symmetric) gradient boosting
//!
//! Every level of a tree applies the same `(feature, border)` test to all of
//! its nodes, so a tree of depth `d` is `d` tests and `2^d` leaf values and a
//! row's leaf is the bit pattern of its test outcomes. Categorical columns are
//! replaced by ordered target statistics before the numeric borders are
//! computed.

use crate::binning::{bin_index, quantile_borders};
use crate::dataset::{Dataset, FeatureColumn, FeatureKind};
use crate::target_stats::TargetStatistics;
use crate::{base_score, validate_targets, BoostError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

const MIN_GAIN: f64 = 1e-9;

/// Hyperparameters of the oblivious learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObliviousParams {
    pub depth: usize,
    pub learning_rate: f64,
    pub iterations: usize,
    pub l2_leaf_reg: f64,
    /// Weight of the prior in the categorical target statistics
    pub prior_weight: f64,
    pub max_bins: usize,
    /// Seed of the permutation used for the ordered target statistics
    pub seed: u64,
}

impl Default for ObliviousParams {
    fn default() -> Self {
        Self {
            depth: 6,
            learning_rate: 0.03,
            iterations: 1000,
            l2_leaf_reg: 3.0,
            prior_weight: 1.0,
            max_bins: 32,
            seed: 42,
        }
    }
}

impl ObliviousParams {
    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 || self.depth > 16 {
            return Err(BoostError::InvalidParameter(format!(
                "depth must be between 1 and 16, got {}",
                self.depth
            )));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(BoostError::InvalidParameter(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if self.iterations == 0 {
            return Err(BoostError::InvalidParameter(
                "iterations must be greater than zero".to_string(),
            ));
        }
        if self.l2_leaf_reg < 0.0 {
            return Err(BoostError::InvalidParameter(
                "l2_leaf_reg must be non-negative".to_string(),
            ));
        }
        if self.prior_weight <= 0.0 {
            return Err(BoostError::InvalidParameter(
                "prior_weight must be positive".to_string(),
            ));
        }
        if self.max_bins < 2 {
            return Err(BoostError::InvalidParameter(
                "max_bins must be at least 2".to_string(),
            ));
        }
        Ok(())
    }

    fn leaf_score(&self, gradient: f64, hessian: f64) -> f64 {
        gradient * gradient / (hessian + self.l2_leaf_reg)
    }
}

/// One symmetric tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObliviousTree {
    /// `(feature, border)` per level; level `i` sets bit `i` of the leaf index
    splits: Vec<(usize, f64)>,
    leaf_values: Vec<f64>,
}

impl ObliviousTree {
    fn leaf_index(&self, row: &[f64]) -> usize {
        self.splits
            .iter()
            .enumerate()
            .fold(0, |index, (level, &(feature, border))| {
                let value = row[feature];
                if value > border || value.is_nan() {
                    index | (1 << level)
                } else {
                    index
                }
            })
    }

    pub fn depth(&self) -> usize {
        self.splits.len()
    }
}

/// Trained oblivious booster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObliviousBooster {
    params: ObliviousParams,
    base_score: f64,
    kinds: Vec<FeatureKind>,
    /// Target statistics for each categorical column, `None` for numeric ones
    encoders: Vec<Option<TargetStatistics>>,
    trees: Vec<ObliviousTree>,
}

impl ObliviousBooster {
    /// Fit a booster to `targets` with squared-error loss
    pub fn fit(data: &Dataset, targets: &[f64], params: ObliviousParams) -> Result<Self> {
        params.validate()?;
        validate_targets(data, targets)?;

        let n_rows = data.n_rows();
        let base = base_score(targets);

        let mut permutation: Vec<usize> = (0..n_rows).collect();
        permutation.shuffle(&mut StdRng::seed_from_u64(params.seed));

        let mut encoders = Vec::with_capacity(data.n_features());
        let mut numeric: Vec<Vec<f64>> = Vec::with_capacity(data.n_features());
        for column in data.columns() {
            match column {
                FeatureColumn::Numeric(values) => {
                    encoders.push(None);
                    numeric.push(values.clone());
                }
                FeatureColumn::Categorical(codes) => {
                    numeric.push(TargetStatistics::ordered_encode(
                        codes,
                        targets,
                        &permutation,
                        base,
                        params.prior_weight,
                    ));
                    encoders.push(Some(TargetStatistics::fit(
                        codes,
                        targets,
                        base,
                        params.prior_weight,
                    )));
                }
            }
        }

        let borders: Vec<Vec<f64>> = numeric
            .iter()
            .map(|values| quantile_borders(values, params.max_bins))
            .collect();
        let bins: Vec<Vec<usize>> = numeric
            .iter()
            .zip(&borders)
            .map(|(values, b)| values.iter().map(|&v| bin_index(b, v)).collect())
            .collect();

        let mut predictions = vec![base; n_rows];
        let mut trees = Vec::with_capacity(params.iterations);

        for _ in 0..params.iterations {
            let gradients: Vec<f64> = predictions
                .iter()
                .zip(targets)
                .map(|(p, y)| p - y)
                .collect();

            let (tree, leaf_of) = grow_tree(&params, &borders, &bins, &gradients);
            for (prediction, leaf) in predictions.iter_mut().zip(&leaf_of) {
                *prediction += tree.leaf_values[*leaf];
            }
            trees.push(tree);
        }

        Ok(Self {
            params,
            base_score: base,
            kinds: data.kinds(),
            encoders,
            trees,
        })
    }

    /// Predict every row of `data`
    pub fn predict(&self, data: &Dataset) -> Result<Vec<f64>> {
        data.check_kinds(&self.kinds)?;

        let columns: Vec<Vec<f64>> = data
            .columns()
            .iter()
            .zip(&self.encoders)
            .map(|(column, encoder)| match (column, encoder) {
                (FeatureColumn::Numeric(values), _) => values.clone(),
                (FeatureColumn::Categorical(codes), Some(stats)) => {
                    codes.iter().map(|&c| stats.encode(c)).collect()
                }
                (FeatureColumn::Categorical(codes), None) => vec![self.base_score; codes.len()],
            })
            .collect();

        let mut row = vec![0.0; columns.len()];
        Ok((0..data.n_rows())
            .map(|r| {
                for (slot, column) in row.iter_mut().zip(&columns) {
                    *slot = column[r];
                }
                self.base_score
                    + self
                        .trees
                        .iter()
                        .map(|tree| tree.leaf_values[tree.leaf_index(&row)])
                        .sum::<f64>()
            })
            .collect())
    }

    pub fn params(&self) -> &ObliviousParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[ObliviousTree] {
        &self.trees
    }
}

/// Choose one split per level greedily, then set the shrunk leaf values.
///
/// Also returns the leaf of every training row.
fn grow_tree(
    params: &ObliviousParams,
    borders: &[Vec<f64>],
    bins: &[Vec<usize>],
    gradients: &[f64],
) -> (ObliviousTree, Vec<usize>) {
    let n_rows = gradients.len();
    let mut leaf_of = vec![0usize; n_rows];
    let mut splits: Vec<(usize, f64)> = Vec::with_capacity(params.depth);

    for level in 0..params.depth {
        let n_leaves = 1usize << level;
        let mut best: Option<(f64, usize, usize)> = None;

        for (feature, feature_borders) in borders.iter().enumerate() {
            let n_borders = feature_borders.len();
            if n_borders == 0 {
                continue;
            }
            let slots = n_borders + 1;

            let mut histogram = vec![(0.0_f64, 0.0_f64); n_leaves * slots];
            for row in 0..n_rows {
                let slot = &mut histogram[leaf_of[row] * slots + bins[feature][row]];
                slot.0 += gradients[row];
                slot.1 += 1.0;
            }

            let mut gains = vec![0.0_f64; n_borders];
            for leaf in 0..n_leaves {
                let leaf_hist = &histogram[leaf * slots..(leaf + 1) * slots];
                let (total_g, total_h) = leaf_hist
                    .iter()
                    .fold((0.0, 0.0), |(g, h), &(sg, sh)| (g + sg, h + sh));
                let parent = params.leaf_score(total_g, total_h);

                let (mut left_g, mut left_h) = (0.0, 0.0);
                for (k, gain) in gains.iter_mut().enumerate() {
                    left_g += leaf_hist[k].0;
                    left_h += leaf_hist[k].1;
                    *gain += params.leaf_score(left_g, left_h)
                        + params.leaf_score(total_g - left_g, total_h - left_h)
                        - parent;
                }
            }

            for (k, &gain) in gains.iter().enumerate() {
                if gain > MIN_GAIN && best.map_or(true, |(b, _, _)| gain > b) {
                    best = Some((gain, feature, k));
                }
            }
        }

        let Some((_, feature, k)) = best else {
            break;
        };
        for (row, leaf) in leaf_of.iter_mut().enumerate() {
            if bins[feature][row] > k {
                *leaf |= 1 << level;
            }
        }
        splits.push((feature, borders[feature][k]));
    }

    let n_leaves = 1usize << splits.len();
    let mut sums = vec![(0.0_f64, 0.0_f64); n_leaves];
    for (row, &leaf) in leaf_of.iter().enumerate() {
        sums[leaf].0 += gradients[row];
        sums[leaf].1 += 1.0;
    }
    let leaf_values = sums
        .iter()
        .map(|&(g, h)| {
            if h > 0.0 {
                -params.learning_rate * g / (h + params.l2_leaf_reg)
            } else {
                0.0
            }
        })
        .collect();

    (
        ObliviousTree {
            splits,
            leaf_values,
        },
        leaf_of,
    )
}
