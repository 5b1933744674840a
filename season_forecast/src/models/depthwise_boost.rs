//! Depth-wise tree boosting with native categorical splits and L1/L2 leaf
//! regularisation

use super::{param_f64, param_usize, CategoryEncoder, ParamSet, RegressorFamily, SearchSpace, SeasonModel};
use crate::error::Result;
use crate::features::FeatureMatrix;
use boost_trees::{DepthwiseBooster, DepthwiseParams};
use serde::{Deserialize, Serialize};

pub const FAMILY: &str = "DepthwiseBoost";

/// Family of depth-wise boosters
#[derive(Debug, Clone)]
pub struct DepthwiseBoost {
    space: SearchSpace,
}

impl Default for DepthwiseBoost {
    fn default() -> Self {
        Self::new()
    }
}

impl DepthwiseBoost {
    pub fn new() -> Self {
        let space = SearchSpace::new()
            .with_ints("max_depth", &[3, 5, 7])
            .with_floats("learning_rate", &[0.01, 0.05, 0.1])
            .with_ints("n_estimators", &[100, 200, 300])
            .with_floats("reg_alpha", &[0.0, 0.1, 0.5])
            .with_floats("reg_lambda", &[1.0, 1.5, 2.0]);
        Self { space }
    }

    /// Replace the hyperparameter grid
    pub fn with_search_space(mut self, space: SearchSpace) -> Self {
        self.space = space;
        self
    }
}

fn booster_params(params: &ParamSet) -> Result<DepthwiseParams> {
    let defaults = DepthwiseParams::default();
    Ok(DepthwiseParams {
        max_depth: param_usize(params, "max_depth", defaults.max_depth)?,
        learning_rate: param_f64(params, "learning_rate", defaults.learning_rate)?,
        n_estimators: param_usize(params, "n_estimators", defaults.n_estimators)?,
        reg_alpha: param_f64(params, "reg_alpha", defaults.reg_alpha)?,
        reg_lambda: param_f64(params, "reg_lambda", defaults.reg_lambda)?,
        ..defaults
    })
}

impl RegressorFamily for DepthwiseBoost {
    fn name(&self) -> &'static str {
        FAMILY
    }

    fn search_space(&self) -> SearchSpace {
        self.space.clone()
    }

    fn fit(&self, x: &FeatureMatrix, y: &[f64], params: &ParamSet) -> Result<SeasonModel> {
        let encoder = CategoryEncoder::fit(x);
        let data = encoder.transform(x)?;
        let booster = DepthwiseBooster::fit(&data, y, booster_params(params)?)?;
        Ok(SeasonModel::DepthwiseBoost(DepthwiseBoostModel {
            params: params.clone(),
            encoder,
            booster,
        }))
    }
}

/// Trained model of the [`DepthwiseBoost`] family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthwiseBoostModel {
    pub params: ParamSet,
    pub encoder: CategoryEncoder,
    pub booster: DepthwiseBooster,
}

impl DepthwiseBoostModel {
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        let data = self.encoder.transform(x)?;
        Ok(self.booster.predict(&data)?)
    }
}
