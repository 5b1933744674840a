//! Oblivious-tree boosting with ordered target statistics for categories

use super::{param_f64, param_usize, CategoryEncoder, ParamSet, RegressorFamily, SearchSpace, SeasonModel};
use crate::error::Result;
use crate::features::FeatureMatrix;
use boost_trees::{ObliviousBooster, ObliviousParams};
use serde::{Deserialize, Serialize};

pub const FAMILY: &str = "OrderedBoost";

/// Family of symmetric-tree boosters
#[derive(Debug, Clone)]
pub struct OrderedBoost {
    seed: u64,
    space: SearchSpace,
}

impl OrderedBoost {
    pub fn new(seed: u64) -> Self {
        let space = SearchSpace::new()
            .with_ints("depth", &[4, 6, 8])
            .with_floats("learning_rate", &[0.01, 0.05, 0.1])
            .with_ints("iterations", &[100, 200, 300])
            .with_ints("l2_leaf_reg", &[1, 3, 5]);
        Self { seed, space }
    }

    /// Replace the hyperparameter grid
    pub fn with_search_space(mut self, space: SearchSpace) -> Self {
        self.space = space;
        self
    }

    fn booster_params(&self, params: &ParamSet) -> Result<ObliviousParams> {
        let defaults = ObliviousParams::default();
        Ok(ObliviousParams {
            depth: param_usize(params, "depth", defaults.depth)?,
            learning_rate: param_f64(params, "learning_rate", defaults.learning_rate)?,
            iterations: param_usize(params, "iterations", defaults.iterations)?,
            l2_leaf_reg: param_f64(params, "l2_leaf_reg", defaults.l2_leaf_reg)?,
            seed: self.seed,
            ..defaults
        })
    }
}

impl RegressorFamily for OrderedBoost {
    fn name(&self) -> &'static str {
        FAMILY
    }

    fn search_space(&self) -> SearchSpace {
        self.space.clone()
    }

    fn fit(&self, x: &FeatureMatrix, y: &[f64], params: &ParamSet) -> Result<SeasonModel> {
        let encoder = CategoryEncoder::fit(x);
        let data = encoder.transform(x)?;
        let booster = ObliviousBooster::fit(&data, y, self.booster_params(params)?)?;
        Ok(SeasonModel::OrderedBoost(OrderedBoostModel {
            params: params.clone(),
            encoder,
            booster,
        }))
    }
}

/// Trained model of the [`OrderedBoost`] family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedBoostModel {
    pub params: ParamSet,
    pub encoder: CategoryEncoder,
    pub booster: ObliviousBooster,
}

impl OrderedBoostModel {
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        let data = self.encoder.transform(x)?;
        Ok(self.booster.predict(&data)?)
    }
}
