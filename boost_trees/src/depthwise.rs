//! Depth-wise gradient boosting
//!
//! Trees grow node by node up to `max_depth`. Numeric columns are split on
//! quantile borders, categorical columns on a partition of their categories:
//! the categories seen in a node are ordered by their mean gradient and the
//! best prefix of that ordering is sent left. Leaf weights carry L1
//! (`reg_alpha`) and L2 (`reg_lambda`) regularisation.

use crate::binning::{bin_index, quantile_borders};
use crate::dataset::{Dataset, FeatureColumn, FeatureKind};
use crate::tree::{Node, RegressionTree, SplitRule};
use crate::{base_score, soft_threshold, validate_targets, BoostError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MIN_GAIN: f64 = 1e-9;

/// Hyperparameters of the depth-wise learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthwiseParams {
    pub max_depth: usize,
    pub learning_rate: f64,
    pub n_estimators: usize,
    pub reg_alpha: f64,
    pub reg_lambda: f64,
    /// Minimum hessian (row count for squared error) in each child
    pub min_child_weight: f64,
    pub max_bins: usize,
}

impl Default for DepthwiseParams {
    fn default() -> Self {
        Self {
            max_depth: 6,
            learning_rate: 0.3,
            n_estimators: 100,
            reg_alpha: 0.0,
            reg_lambda: 1.0,
            min_child_weight: 1.0,
            max_bins: 32,
        }
    }
}

impl DepthwiseParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(BoostError::InvalidParameter(
                "max_depth must be greater than zero".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(BoostError::InvalidParameter(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if self.n_estimators == 0 {
            return Err(BoostError::InvalidParameter(
                "n_estimators must be greater than zero".to_string(),
            ));
        }
        if self.reg_alpha < 0.0 || self.reg_lambda < 0.0 {
            return Err(BoostError::InvalidParameter(
                "regularisation terms must be non-negative".to_string(),
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
        let g = soft_threshold(gradient, self.reg_alpha);
        g * g / (hessian + self.reg_lambda)
    }

    fn leaf_weight(&self, gradient: f64, hessian: f64) -> f64 {
        -soft_threshold(gradient, self.reg_alpha) / (hessian + self.reg_lambda)
    }
}

/// Trained depth-wise booster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthwiseBooster {
    params: DepthwiseParams,
    base_score: f64,
    kinds: Vec<FeatureKind>,
    trees: Vec<RegressionTree>,
}

enum BinnedFeature<'a> {
    Numeric {
        borders: Vec<f64>,
        bins: Vec<usize>,
    },
    Categorical {
        codes: &'a [Option<u32>],
    },
}

impl<'a> BinnedFeature<'a> {
    fn new(column: &'a FeatureColumn, max_bins: usize) -> Self {
        match column {
            FeatureColumn::Numeric(values) => {
                let borders = quantile_borders(values, max_bins);
                let bins = values.iter().map(|&v| bin_index(&borders, v)).collect();
                BinnedFeature::Numeric { borders, bins }
            }
            FeatureColumn::Categorical(codes) => BinnedFeature::Categorical { codes },
        }
    }
}

struct Candidate {
    gain: f64,
    feature: usize,
    rule: SplitRule,
}

struct TreeBuilder<'a> {
    params: &'a DepthwiseParams,
    features: &'a [BinnedFeature<'a>],
    columns: &'a [FeatureColumn],
    gradients: &'a [f64],
    nodes: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    /// Grow the subtree for `rows`, adding the shrunk leaf values to `predictions`
    fn grow(&mut self, rows: Vec<usize>, depth: usize, predictions: &mut [f64]) -> usize {
        let gradient: f64 = rows.iter().map(|&r| self.gradients[r]).sum();
        let hessian = rows.len() as f64;

        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: 0.0 });

        if depth < self.params.max_depth && rows.len() >= 2 {
            if let Some(best) = self.best_split(&rows, gradient, hessian) {
                let column = &self.columns[best.feature];
                let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                    .into_iter()
                    .partition(|&r| best.rule.goes_left(column, r));

                let left = self.grow(left_rows, depth + 1, predictions);
                let right = self.grow(right_rows, depth + 1, predictions);
                self.nodes[node_id] = Node::Split {
                    feature: best.feature,
                    rule: best.rule,
                    left,
                    right,
                };
                return node_id;
            }
        }

        let value = self.params.learning_rate * self.params.leaf_weight(gradient, hessian);
        for &r in &rows {
            predictions[r] += value;
        }
        self.nodes[node_id] = Node::Leaf { value };
        node_id
    }

    fn best_split(&self, rows: &[usize], gradient: f64, hessian: f64) -> Option<Candidate> {
        let parent_score = self.params.leaf_score(gradient, hessian);
        let mut best: Option<Candidate> = None;

        for (feature, binned) in self.features.iter().enumerate() {
            let candidate = match binned {
                BinnedFeature::Numeric { borders, bins } => {
                    self.numeric_split(rows, borders, bins, gradient, hessian, parent_score)
                }
                BinnedFeature::Categorical { codes } => {
                    self.categorical_split(rows, codes, gradient, hessian, parent_score)
                }
            };

            if let Some((gain, rule)) = candidate {
                if best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(Candidate {
                        gain,
                        feature,
                        rule,
                    });
                }
            }
        }

        best
    }

    fn numeric_split(
        &self,
        rows: &[usize],
        borders: &[f64],
        bins: &[usize],
        gradient: f64,
        hessian: f64,
        parent_score: f64,
    ) -> Option<(f64, SplitRule)> {
        if borders.is_empty() {
            return None;
        }

        // Missing values share the last slot with values past the last border
        let mut histogram = vec![(0.0_f64, 0.0_f64); borders.len() + 1];
        for &r in rows {
            let slot = &mut histogram[bins[r]];
            slot.0 += self.gradients[r];
            slot.1 += 1.0;
        }

        let mut best: Option<(f64, usize)> = None;
        let (mut left_g, mut left_h) = (0.0, 0.0);
        for (k, &(g, h)) in histogram.iter().take(borders.len()).enumerate() {
            left_g += g;
            left_h += h;
            let (right_g, right_h) = (gradient - left_g, hessian - left_h);
            if left_h < self.params.min_child_weight || right_h < self.params.min_child_weight {
                continue;
            }
            let gain = self.params.leaf_score(left_g, left_h)
                + self.params.leaf_score(right_g, right_h)
                - parent_score;
            if gain > MIN_GAIN && best.map_or(true, |(b, _)| gain > b) {
                best = Some((gain, k));
            }
        }

        best.map(|(gain, k)| (gain, SplitRule::Threshold(borders[k])))
    }

    fn categorical_split(
        &self,
        rows: &[usize],
        codes: &[Option<u32>],
        gradient: f64,
        hessian: f64,
        parent_score: f64,
    ) -> Option<(f64, SplitRule)> {
        let mut stats: BTreeMap<u32, (f64, f64)> = BTreeMap::new();
        for &r in rows {
            if let Some(code) = codes[r] {
                let entry = stats.entry(code).or_insert((0.0, 0.0));
                entry.0 += self.gradients[r];
                entry.1 += 1.0;
            }
        }
        if stats.is_empty() {
            return None;
        }

        let lambda = self.params.reg_lambda;
        let mut ordered: Vec<(u32, f64, f64)> =
            stats.into_iter().map(|(code, (g, h))| (code, g, h)).collect();
        ordered.sort_by(|a, b| (a.1 / (a.2 + lambda)).total_cmp(&(b.1 / (b.2 + lambda))));

        let mut best: Option<(f64, usize)> = None;
        let (mut left_g, mut left_h) = (0.0, 0.0);
        for (k, &(_, g, h)) in ordered.iter().enumerate() {
            left_g += g;
            left_h += h;
            let (right_g, right_h) = (gradient - left_g, hessian - left_h);
            if left_h < self.params.min_child_weight || right_h < self.params.min_child_weight {
                continue;
            }
            let gain = self.params.leaf_score(left_g, left_h)
                + self.params.leaf_score(right_g, right_h)
                - parent_score;
            if gain > MIN_GAIN && best.map_or(true, |(b, _)| gain > b) {
                best = Some((gain, k));
            }
        }

        best.map(|(gain, k)| {
            let mut left: Vec<u32> = ordered[..=k].iter().map(|(code, _, _)| *code).collect();
            left.sort_unstable();
            (gain, SplitRule::Categories(left))
        })
    }
}

impl DepthwiseBooster {
    /// Fit a booster to `targets` with squared-error loss
    pub fn fit(data: &Dataset, targets: &[f64], params: DepthwiseParams) -> Result<Self> {
        params.validate()?;
        validate_targets(data, targets)?;

        let base = base_score(targets);
        let features: Vec<BinnedFeature> = data
            .columns()
            .iter()
            .map(|c| BinnedFeature::new(c, params.max_bins))
            .collect();

        let mut predictions = vec![base; data.n_rows()];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let gradients: Vec<f64> = predictions
                .iter()
                .zip(targets)
                .map(|(p, y)| p - y)
                .collect();

            let mut builder = TreeBuilder {
                params: &params,
                features: &features,
                columns: data.columns(),
                gradients: &gradients,
                nodes: Vec::new(),
            };
            builder.grow((0..data.n_rows()).collect(), 0, &mut predictions);
            trees.push(RegressionTree::from_nodes(builder.nodes));
        }

        Ok(Self {
            params,
            base_score: base,
            kinds: data.kinds(),
            trees,
        })
    }

    /// Predict every row of `data`
    pub fn predict(&self, data: &Dataset) -> Result<Vec<f64>> {
        data.check_kinds(&self.kinds)?;
        Ok((0..data.n_rows())
            .map(|row| {
                self.base_score
                    + self
                        .trees
                        .iter()
                        .map(|tree| tree.predict_row(data, row))
                        .sum::<f64>()
            })
            .collect())
    }

    pub fn params(&self) -> &DepthwiseParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn step_data() -> (Dataset, Vec<f64>) {
        let x: Vec<f64> = (0..20).map(|v| v as f64).collect();
        let y: Vec<f64> = x.iter().map(|&v| if v < 10.0 { 5.0 } else { 25.0 }).collect();
        (Dataset::new(vec![FeatureColumn::Numeric(x)]).unwrap(), y)
    }

    #[test]
    fn test_fits_step_function() {
        let (data, y) = step_data();
        let params = DepthwiseParams {
            max_depth: 2,
            learning_rate: 0.5,
            n_estimators: 30,
            reg_lambda: 0.0,
            ..Default::default()
        };
        let model = DepthwiseBooster::fit(&data, &y, params).unwrap();
        let predictions = model.predict(&data).unwrap();

        assert_relative_eq!(predictions[0], 5.0, epsilon = 1e-3);
        assert_relative_eq!(predictions[19], 25.0, epsilon = 1e-3);
        assert_eq!(model.n_trees(), 30);
    }

    #[test]
    fn test_splits_on_categories() {
        let codes: Vec<Option<u32>> = (0..30).map(|i| Some(i % 3)).collect();
        let y: Vec<f64> = codes
            .iter()
            .map(|c| if *c == Some(1) { 100.0 } else { 10.0 })
            .collect();
        let data = Dataset::new(vec![FeatureColumn::Categorical(codes)]).unwrap();

        let params = DepthwiseParams {
            max_depth: 1,
            learning_rate: 1.0,
            n_estimators: 1,
            reg_lambda: 0.0,
            ..Default::default()
        };
        let model = DepthwiseBooster::fit(&data, &y, params).unwrap();

        match &model.trees()[0].nodes()[0] {
            Node::Split { rule, .. } => {
                assert!(matches!(rule, SplitRule::Categories(left) if left == &vec![0, 2] || left == &vec![1]))
            }
            other => panic!("expected a split at the root, got {:?}", other),
        }

        let predictions = model.predict(&data).unwrap();
        assert_relative_eq!(predictions[1], 100.0, epsilon = 1e-9);
        assert_relative_eq!(predictions[0], 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_l1_regularisation_shrinks_leaves() {
        let (data, y) = step_data();
        let plain = DepthwiseParams {
            max_depth: 1,
            learning_rate: 1.0,
            n_estimators: 1,
            reg_lambda: 0.0,
            ..Default::default()
        };
        let shrunk = DepthwiseParams {
            reg_alpha: 50.0,
            ..plain.clone()
        };

        let a = DepthwiseBooster::fit(&data, &y, plain).unwrap().predict(&data).unwrap();
        let b = DepthwiseBooster::fit(&data, &y, shrunk).unwrap().predict(&data).unwrap();
        assert_relative_eq!(a[19], 25.0, epsilon = 1e-9);
        assert_relative_eq!(b[19], 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let (data, y) = step_data();
        let bad = DepthwiseParams {
            learning_rate: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            DepthwiseBooster::fit(&data, &y, bad),
            Err(BoostError::InvalidParameter(_))
        ));
        assert!(DepthwiseBooster::fit(&data, &y[..3], DepthwiseParams::default()).is_err());

        let model = DepthwiseBooster::fit(&data, &y, DepthwiseParams::default()).unwrap();
        let other = Dataset::new(vec![FeatureColumn::Categorical(vec![Some(0)])]).unwrap();
        assert!(model.predict(&other).is_err());
    }

    #[test]
    fn test_serde_keeps_predictions() {
        let (data, y) = step_data();
        let params = DepthwiseParams {
            n_estimators: 5,
            ..Default::default()
        };
        let model = DepthwiseBooster::fit(&data, &y, params).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let restored: DepthwiseBooster = serde_json::from_str(&json).unwrap();
        let before = model.predict(&data).unwrap();
        let after = restored.predict(&data).unwrap();
        for (a, b) in before.iter().zip(&after) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }
}
