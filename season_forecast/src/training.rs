//! Per-season model training and family selection

use crate::config::TrainingConfig;
use crate::error::{ForecastError, Result};
use crate::features::FeatureMatrix;
use crate::metrics::{evaluate, ModelMetrics};
use crate::models::{default_families, ParamSet, RegressorFamily, SeasonModel};
use crate::search::RandomizedSearch;
use crate::season::SeasonType;
use crate::split::temporal_split;
use serde::Serialize;
use tracing::{info, warn};

/// Held-out result of one family
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateResult {
    pub model: String,
    pub metrics: ModelMetrics,
    pub best_params: ParamSet,
    pub cv_score: f64,
}

/// Winner of a season's training run plus every family's result
#[derive(Debug, Clone)]
pub struct SeasonTraining {
    pub season_type: SeasonType,
    pub model: SeasonModel,
    pub model_name: String,
    pub metrics: ModelMetrics,
    pub samples: usize,
    pub candidates: Vec<CandidateResult>,
}

/// Trains every configured family on a season and keeps the lowest MAPE
pub struct ModelTrainer {
    config: TrainingConfig,
    families: Vec<Box<dyn RegressorFamily>>,
}

impl ModelTrainer {
    /// Trainer comparing the default families
    pub fn new(config: TrainingConfig) -> Result<Self> {
        let families = default_families(config.seed);
        Self::with_families(config, families)
    }

    pub fn with_families(
        config: TrainingConfig,
        families: Vec<Box<dyn RegressorFamily>>,
    ) -> Result<Self> {
        config.validate()?;
        if families.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "At least one model family is required".to_string(),
            ));
        }
        Ok(Self { config, families })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn family_names(&self) -> Vec<&'static str> {
        self.families.iter().map(|f| f.name()).collect()
    }

    fn train_family(
        &self,
        family: &dyn RegressorFamily,
        search: &RandomizedSearch,
        x_train: &FeatureMatrix,
        y_train: &[f64],
        x_test: &FeatureMatrix,
        y_test: &[f64],
    ) -> Result<(SeasonModel, CandidateResult)> {
        let outcome = search.run(family, x_train, y_train)?;
        let predicted = outcome.model.predict(x_test)?;
        let metrics = evaluate(y_test, &predicted)?;

        let result = CandidateResult {
            model: family.name().to_string(),
            metrics,
            best_params: outcome.best_params,
            cv_score: outcome.cv_score,
        };
        Ok((outcome.model, result))
    }

    /// Split chronologically, search and score each family, keep the best.
    ///
    /// A failing family is logged and left out. If every family fails the
    /// season fails with [`ForecastError::TrainingFailed`].
    pub fn train_season(
        &self,
        x: &FeatureMatrix,
        y: &[f64],
        season_type: SeasonType,
    ) -> Result<SeasonTraining> {
        if x.is_empty() {
            return Err(ForecastError::ValidationError(format!(
                "No training rows for season {}",
                season_type
            )));
        }

        let split = temporal_split(x, y, self.config.test_fraction)?;
        let search = RandomizedSearch::new(
            self.config.search_iterations,
            self.config.cv_folds,
            self.config.seed,
        )?;

        let mut best: Option<(SeasonModel, CandidateResult)> = None;
        let mut candidates = Vec::new();
        let mut failures = Vec::new();

        for family in &self.families {
            info!(season_type = %season_type, family = family.name(), "training family");
            match self.train_family(
                family.as_ref(),
                &search,
                &split.x_train,
                &split.y_train,
                &split.x_test,
                &split.y_test,
            ) {
                Ok((model, result)) => {
                    info!(
                        season_type = %season_type,
                        family = family.name(),
                        mape = result.metrics.mape,
                        mae = result.metrics.mae,
                        rmse = result.metrics.rmse,
                        "family trained"
                    );
                    candidates.push(result.clone());
                    let improves = best
                        .as_ref()
                        .map_or(true, |(_, b)| result.metrics.mape < b.metrics.mape);
                    if improves {
                        best = Some((model, result));
                    }
                }
                Err(err) => {
                    warn!(season_type = %season_type, family = family.name(), error = %err, "family failed");
                    failures.push(format!("{}: {}", family.name(), err));
                }
            }
        }

        let (model, winner) = best.ok_or_else(|| ForecastError::TrainingFailed {
            season_type: season_type.to_string(),
            failures,
        })?;

        info!(
            season_type = %season_type,
            model = %winner.model,
            mape = winner.metrics.mape,
            "selected best model"
        );
        Ok(SeasonTraining {
            season_type,
            model,
            model_name: winner.model,
            metrics: winner.metrics,
            samples: x.n_rows(),
            candidates,
        })
    }
}
