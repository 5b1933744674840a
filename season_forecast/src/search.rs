//! Randomized hyperparameter search with K-fold cross-validation

use crate::error::{ForecastError, Result};
use crate::features::FeatureMatrix;
use crate::metrics::mean_absolute_error;
use crate::models::{ParamSet, RegressorFamily, SeasonModel, SearchSpace};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use tracing::{debug, warn};

/// Contiguous, unshuffled K-fold splits as `(train_rows, validation_rows)`.
///
/// The first `n % k` folds hold one extra row.
pub fn kfold_indices(n_rows: usize, folds: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
    if folds < 2 {
        return Err(ForecastError::InvalidParameter(format!(
            "Cross-validation needs at least 2 folds, got {}",
            folds
        )));
    }
    if n_rows < folds {
        return Err(ForecastError::ValidationError(format!(
            "Cannot split {} rows into {} folds",
            n_rows, folds
        )));
    }

    let base = n_rows / folds;
    let extra = n_rows % folds;
    let mut splits = Vec::with_capacity(folds);
    let mut start = 0;
    for fold in 0..folds {
        let size = base + usize::from(fold < extra);
        let end = start + size;
        let validation: Vec<usize> = (start..end).collect();
        let train: Vec<usize> = (0..start).chain(end..n_rows).collect();
        splits.push((train, validation));
        start = end;
    }
    Ok(splits)
}

/// Result of a search over one family
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_params: ParamSet,
    /// Mean negative MAE across folds of the best candidate
    pub cv_score: f64,
    /// Best candidate refitted on all rows
    pub model: SeasonModel,
    pub candidates_evaluated: usize,
}

/// Samples a fixed number of grid points and keeps the best by
/// cross-validated negative MAE
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomizedSearch {
    iterations: usize,
    folds: usize,
    seed: u64,
}

impl RandomizedSearch {
    pub fn new(iterations: usize, folds: usize, seed: u64) -> Result<Self> {
        if iterations == 0 {
            return Err(ForecastError::InvalidParameter(
                "Search needs at least one iteration".to_string(),
            ));
        }
        if folds < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Cross-validation needs at least 2 folds, got {}",
                folds
            )));
        }
        Ok(Self {
            iterations,
            folds,
            seed,
        })
    }

    /// Distinct grid points to evaluate: all of them when the grid is not
    /// larger than the budget, otherwise a seeded sample without replacement
    pub fn sample_points(&self, space: &SearchSpace) -> Vec<ParamSet> {
        let size = space.size();
        let indices: Vec<usize> = if size <= self.iterations {
            (0..size).collect()
        } else {
            let mut rng = StdRng::seed_from_u64(self.seed);
            index::sample(&mut rng, size, self.iterations).into_vec()
        };
        indices.into_iter().filter_map(|i| space.point(i)).collect()
    }

    /// Mean negative MAE of `params` across the folds
    fn cross_validate(
        &self,
        family: &dyn RegressorFamily,
        x: &FeatureMatrix,
        y: &[f64],
        params: &ParamSet,
    ) -> Result<f64> {
        let splits = kfold_indices(x.n_rows(), self.folds)?;
        let mut total = 0.0;
        for (train, validation) in &splits {
            let x_train = x.take_rows(train);
            let y_train: Vec<f64> = train.iter().map(|&r| y[r]).collect();
            let model = family.fit(&x_train, &y_train, params)?;

            let predicted = model.predict(&x.take_rows(validation))?;
            let actual: Vec<f64> = validation.iter().map(|&r| y[r]).collect();
            total -= mean_absolute_error(&actual, &predicted);
        }
        Ok(total / splits.len() as f64)
    }

    /// Search the family's grid on `(x, y)` and refit the winner on all rows
    pub fn run(&self, family: &dyn RegressorFamily, x: &FeatureMatrix, y: &[f64]) -> Result<SearchOutcome> {
        if x.n_rows() != y.len() {
            return Err(ForecastError::ValidationError(format!(
                "Feature matrix has {} rows but target has {}",
                x.n_rows(),
                y.len()
            )));
        }
        if x.n_rows() < self.folds {
            return Err(ForecastError::ValidationError(format!(
                "{} training rows are too few for {}-fold cross-validation",
                x.n_rows(),
                self.folds
            )));
        }

        let candidates = self.sample_points(&family.search_space());
        let mut best: Option<(ParamSet, f64)> = None;
        let mut failures = Vec::new();

        for params in &candidates {
            match self.cross_validate(family, x, y, params) {
                Ok(score) => {
                    debug!(family = family.name(), ?params, score, "evaluated candidate");
                    let improves = best.as_ref().map_or(true, |(_, b)| score > *b);
                    if improves {
                        best = Some((params.clone(), score));
                    }
                }
                Err(err) => {
                    warn!(family = family.name(), ?params, error = %err, "candidate failed");
                    failures.push(err.to_string());
                }
            }
        }

        let (best_params, cv_score) = best.ok_or_else(|| {
            ForecastError::ModelError(format!(
                "No {} candidate could be evaluated: {}",
                family.name(),
                failures.join("; ")
            ))
        })?;
        let model = family.fit(x, y, &best_params)?;

        Ok(SearchOutcome {
            best_params,
            cv_score,
            model,
            candidates_evaluated: candidates.len(),
        })
    }
}
