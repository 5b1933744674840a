//! # Boost Trees
//!
//! Gradient-boosted regression trees for tabular data that mixes numeric and
//! categorical columns. Two learners are provided:
//!
//! - [`DepthwiseBooster`]: depth-wise trees that split categorical columns by
//!   partitioning their categories, with L1/L2 regularised leaf weights.
//! - [`ObliviousBooster`]: symmetric trees (one split per level) that turn
//!   categorical columns into ordered target statistics before binning.
//!
//! Both learners minimise squared error and work on a column-major [`Dataset`].
//!
//! ```
//! use boost_trees::{Dataset, DepthwiseBooster, DepthwiseParams, FeatureColumn};
//!
//! let data = Dataset::new(vec![FeatureColumn::Numeric(vec![1.0, 2.0, 3.0, 4.0])]).unwrap();
//! let targets = [10.0, 10.0, 20.0, 20.0];
//! let params = DepthwiseParams { n_estimators: 20, ..Default::default() };
//! let model = DepthwiseBooster::fit(&data, &targets, params).unwrap();
//! assert_eq!(model.predict(&data).unwrap().len(), 4);
//! ```

use thiserror::Error;

pub mod binning;
pub mod dataset;
pub mod depthwise;
pub mod oblivious;
pub mod target_stats;
pub mod tree;

pub use dataset::{Dataset, FeatureColumn, FeatureKind};
pub use depthwise::{DepthwiseBooster, DepthwiseParams};
pub use oblivious::{ObliviousBooster, ObliviousParams};
pub use target_stats::TargetStatistics;
pub use tree::{Node, RegressionTree, SplitRule};

/// Errors that can occur while fitting or evaluating a booster
#[derive(Error, Debug)]
pub enum BoostError {
    #[error("Insufficient data for training: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for booster operations
pub type Result<T> = std::result::Result<T, BoostError>;

/// Squared-error leaf objective shared by both learners.
///
/// `soft` applies L1 shrinkage to the gradient sum before it is used.
pub(crate) fn soft_threshold(gradient_sum: f64, alpha: f64) -> f64 {
    if gradient_sum > alpha {
        gradient_sum - alpha
    } else if gradient_sum < -alpha {
        gradient_sum + alpha
    } else {
        0.0
    }
}

/// Mean of the targets, used as the starting prediction of every booster
pub(crate) fn base_score(targets: &[f64]) -> f64 {
    if targets.is_empty() {
        0.0
    } else {
        targets.iter().sum::<f64>() / targets.len() as f64
    }
}

pub(crate) fn validate_targets(data: &Dataset, targets: &[f64]) -> Result<()> {
    if data.n_rows() == 0 {
        return Err(BoostError::InsufficientData(
            "training set has no rows".to_string(),
        ));
    }
    if targets.len() != data.n_rows() {
        return Err(BoostError::InvalidInput(format!(
            "targets length ({}) doesn't match number of rows ({})",
            targets.len(),
            data.n_rows()
        )));
    }
    if targets.iter().any(|t| !t.is_finite()) {
        return Err(BoostError::InvalidInput(
            "targets must be finite".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_threshold() {
        assert_eq!(soft_threshold(5.0, 1.0), 4.0);
        assert_eq!(soft_threshold(-5.0, 1.0), -4.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
        assert_eq!(soft_threshold(3.0, 0.0), 3.0);
    }

    #[test]
    fn test_base_score() {
        assert_eq!(base_score(&[]), 0.0);
        assert_eq!(base_score(&[1.0, 2.0, 3.0]), 2.0);
    }
}
