//! Regression metrics used for model selection

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Held-out error of a trained model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean absolute percentage error, in percent
    pub mape: f64,
    pub mae: f64,
    pub rmse: f64,
}

/// Score predictions against actual values
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<ModelMetrics> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::ValidationError(
            "Actual and predicted values must have the same non-zero length".to_string(),
        ));
    }

    Ok(ModelMetrics {
        mape: mean_absolute_percentage_error(actual, predicted),
        mae: mean_absolute_error(actual, predicted),
        rmse: root_mean_squared_error(actual, predicted),
    })
}

/// Mean absolute error
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    sum / actual.len() as f64
}

/// Root mean squared error
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    (sum / actual.len() as f64).sqrt()
}

/// Mean absolute percentage error over rows with a non-zero actual value,
/// in percent. Returns 100 when every actual value is zero.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let (sum, count) = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| **a != 0.0)
        .fold((0.0, 0usize), |(sum, count), (a, p)| {
            (sum + ((a - p) / a).abs(), count + 1)
        });

    if count == 0 {
        return 100.0;
    }
    sum / count as f64 * 100.0
}
