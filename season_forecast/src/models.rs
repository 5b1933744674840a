//! Regression model families compared by the trainer
//!
//! Each family knows its own hyperparameter grid and how to fit a model on a
//! feature matrix. Trained models of every family share the [`SeasonModel`]
//! type so they can be scored, compared and persisted uniformly.

pub mod depthwise_boost;
pub mod encoding;
pub mod ordered_boost;

use crate::error::{ForecastError, Result};
use crate::features::FeatureMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use depthwise_boost::{DepthwiseBoost, DepthwiseBoostModel};
pub use encoding::CategoryEncoder;
pub use ordered_boost::{OrderedBoost, OrderedBoostModel};

/// A single hyperparameter value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

impl ParamValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            ParamValue::Int(v) => *v as f64,
            ParamValue::Float(v) => *v,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// One point of a search space, keyed by parameter name
pub type ParamSet = BTreeMap<String, ParamValue>;

/// Read an integer parameter, falling back to `default` when absent
pub fn param_usize(params: &ParamSet, name: &str, default: usize) -> Result<usize> {
    match params.get(name) {
        None => Ok(default),
        Some(ParamValue::Int(v)) if *v >= 0 => Ok(*v as usize),
        Some(other) => Err(ForecastError::InvalidParameter(format!(
            "{} must be a non-negative integer, got {}",
            name, other
        ))),
    }
}

/// Read a float parameter, falling back to `default` when absent
pub fn param_f64(params: &ParamSet, name: &str, default: f64) -> Result<f64> {
    Ok(params.get(name).map(ParamValue::as_f64).unwrap_or(default))
}

/// Discrete hyperparameter grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSpace {
    dimensions: Vec<(String, Vec<ParamValue>)>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dimension. Dimensions without values are ignored.
    pub fn with<I>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = ParamValue>,
    {
        let values: Vec<ParamValue> = values.into_iter().collect();
        if !values.is_empty() {
            self.dimensions.push((name.to_string(), values));
        }
        self
    }

    pub fn with_ints(self, name: &str, values: &[i64]) -> Self {
        self.with(name, values.iter().copied().map(ParamValue::Int))
    }

    pub fn with_floats(self, name: &str, values: &[f64]) -> Self {
        self.with(name, values.iter().copied().map(ParamValue::Float))
    }

    /// Number of grid points
    pub fn size(&self) -> usize {
        self.dimensions.iter().map(|(_, v)| v.len()).product()
    }

    pub fn names(&self) -> Vec<&str> {
        self.dimensions.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Grid point at `index`, in row-major order over the dimensions
    pub fn point(&self, index: usize) -> Option<ParamSet> {
        if index >= self.size() {
            return None;
        }
        let mut remainder = index;
        let mut point = ParamSet::new();
        for (name, values) in self.dimensions.iter().rev() {
            point.insert(name.clone(), values[remainder % values.len()]);
            remainder /= values.len();
        }
        Some(point)
    }
}

/// A trainable regressor family
pub trait RegressorFamily: Send + Sync {
    /// Name used in reports and artifact names
    fn name(&self) -> &'static str;

    /// Grid explored by the randomized search
    fn search_space(&self) -> SearchSpace;

    /// Fit a model with the given hyperparameters
    fn fit(&self, x: &FeatureMatrix, y: &[f64], params: &ParamSet) -> Result<SeasonModel>;
}

/// A trained model of any family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family")]
pub enum SeasonModel {
    OrderedBoost(OrderedBoostModel),
    DepthwiseBoost(DepthwiseBoostModel),
}

impl SeasonModel {
    /// Name of the family that produced the model
    pub fn family(&self) -> &'static str {
        match self {
            SeasonModel::OrderedBoost(_) => ordered_boost::FAMILY,
            SeasonModel::DepthwiseBoost(_) => depthwise_boost::FAMILY,
        }
    }

    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        match self {
            SeasonModel::OrderedBoost(model) => model.predict(x),
            SeasonModel::DepthwiseBoost(model) => model.predict(x),
        }
    }

    /// Hyperparameters the model was fitted with
    pub fn params(&self) -> &ParamSet {
        match self {
            SeasonModel::OrderedBoost(model) => &model.params,
            SeasonModel::DepthwiseBoost(model) => &model.params,
        }
    }
}

/// The families compared for every season, seeded for reproducibility
pub fn default_families(seed: u64) -> Vec<Box<dyn RegressorFamily>> {
    vec![
        Box::new(OrderedBoost::new(seed)),
        Box::new(DepthwiseBoost::new()),
    ]
}
