//! Chronological train/test split

use crate::error::{ForecastError, Result};
use crate::features::FeatureMatrix;
use tracing::info;

/// Output of [`temporal_split`]
#[derive(Debug, Clone)]
pub struct TemporalSplit {
    pub x_train: FeatureMatrix,
    pub x_test: FeatureMatrix,
    pub y_train: Vec<f64>,
    pub y_test: Vec<f64>,
}

/// Sort rows by season year and hold out the latest `test_fraction` of them.
///
/// The sort is stable, so rows of the same year keep their relative order.
/// The first `floor(n * (1 - test_fraction))` rows form the training set.
pub fn temporal_split(x: &FeatureMatrix, y: &[f64], test_fraction: f64) -> Result<TemporalSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "test_fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    if x.n_rows() != y.len() {
        return Err(ForecastError::ValidationError(format!(
            "Feature matrix has {} rows but target has {}",
            x.n_rows(),
            y.len()
        )));
    }
    let years = x.season_years().ok_or_else(|| {
        ForecastError::DataError("Feature matrix has no season_year column".to_string())
    })?;

    let mut order: Vec<usize> = (0..x.n_rows()).collect();
    order.sort_by(|&a, &b| years[a].total_cmp(&years[b]));

    let split_idx = (x.n_rows() as f64 * (1.0 - test_fraction)) as usize;
    let (train_rows, test_rows) = order.split_at(split_idx);

    let split = TemporalSplit {
        x_train: x.take_rows(train_rows),
        x_test: x.take_rows(test_rows),
        y_train: train_rows.iter().map(|&r| y[r]).collect(),
        y_test: test_rows.iter().map(|&r| y[r]).collect(),
    };

    info!(
        train = split.y_train.len(),
        test = split.y_test.len(),
        train_last_year = train_rows.last().map(|&r| years[r]),
        test_first_year = test_rows.first().map(|&r| years[r]),
        "temporal split"
    );
    Ok(split)
}
