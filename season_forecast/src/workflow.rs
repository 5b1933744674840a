//! Training and prediction workflows behind the CLI
//!
//! Both workflows report through serialisable results instead of errors:
//! callers branch on the `status` field.

use crate::cleaning::clean;
use crate::config::ForecastConfig;
use crate::data::{DataLoader, SalesTable};
use crate::error::Result;
use crate::features::build_features;
use crate::metrics::ModelMetrics;
use crate::models::RegressorFamily;
use crate::plan::{build_purchase_plan, PlanSummary, PurchasePlanRow};
use crate::prediction::{ForecastGenerator, TargetSeason};
use crate::registry::ModelRegistry;
use crate::season::{extract_seasons, SeasonType};
use crate::training::{CandidateResult, ModelTrainer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{error, info, warn};

/// Load the history, tag seasons and clean it
pub fn prepare_table<P: AsRef<Path>>(path: P, config: &ForecastConfig) -> Result<SalesTable> {
    let table = DataLoader::from_csv(path, config.delimiter()?)?;
    Ok(clean(extract_seasons(table)))
}

/// Outcome of one season in a training run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SeasonStatus {
    Success {
        model: String,
        metrics: ModelMetrics,
        samples: usize,
        candidates: Vec<CandidateResult>,
    },
    NoData,
    Error {
        error: String,
    },
}

/// Per-season outcomes of a training run
pub type TrainReport = BTreeMap<SeasonType, SeasonStatus>;

fn train_one(
    table: &SalesTable,
    season_type: SeasonType,
    trainer: &ModelTrainer,
    registry: &ModelRegistry,
) -> Result<SeasonStatus> {
    let (x, y) = build_features(table, season_type);
    if x.is_empty() {
        warn!(season_type = %season_type, "no data available for season");
        return Ok(SeasonStatus::NoData);
    }

    let trained = trainer.train_season(&x, &y, season_type)?;
    registry.save(
        &trained.model,
        season_type,
        &trained.model_name,
        &trained.metrics,
    )?;
    Ok(SeasonStatus::Success {
        model: trained.model_name,
        metrics: trained.metrics,
        samples: trained.samples,
        candidates: trained.candidates,
    })
}

/// Train and persist a model for each season type with the default families
pub fn train_workflow<P: AsRef<Path>>(dataset: P, config: &ForecastConfig) -> TrainReport {
    let families = crate::models::default_families(config.training.seed);
    train_workflow_with(dataset, config, families)
}

/// Train and persist a model for each season type with the given families.
///
/// Seasons are independent: one failing never stops the other.
pub fn train_workflow_with<P: AsRef<Path>>(
    dataset: P,
    config: &ForecastConfig,
    families: Vec<Box<dyn RegressorFamily>>,
) -> TrainReport {
    let failed = |error: String| -> TrainReport {
        SeasonType::ALL
            .into_iter()
            .map(|s| (s, SeasonStatus::Error { error: error.clone() }))
            .collect()
    };

    let table = match prepare_table(dataset, config) {
        Ok(table) => table,
        Err(err) => {
            error!(error = %err, "failed to prepare training data");
            return failed(err.to_string());
        }
    };
    let trainer = match ModelTrainer::with_families(config.training.clone(), families) {
        Ok(trainer) => trainer,
        Err(err) => {
            error!(error = %err, "invalid training configuration");
            return failed(err.to_string());
        }
    };
    let registry = ModelRegistry::new(&config.model_dir);

    let mut report = TrainReport::new();
    for season_type in SeasonType::ALL {
        info!(season_type = %season_type, "training season");
        let status = train_one(&table, season_type, &trainer, &registry).unwrap_or_else(|err| {
            error!(season_type = %season_type, error = %err, "season training failed");
            SeasonStatus::Error {
                error: err.to_string(),
            }
        });
        report.insert(season_type, status);
    }
    report
}

/// Forecast and plan of a successful prediction run
#[derive(Debug, Clone, Serialize)]
pub struct PredictionSummary {
    pub temporada_objetivo: String,
    pub cobertura_productos: f64,
    pub modelo_ganador: String,
    pub mape: Option<f64>,
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
    pub plan_compras: Vec<PurchasePlanRow>,
    pub season_type: SeasonType,
    pub season_year: i32,
    pub total_skus: usize,
    pub total_predicted_units: f64,
    pub summary: PlanSummary,
}

/// Outcome of a prediction run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictReport {
    Success(Box<PredictionSummary>),
    Error { error: String },
}

fn predict_inner(
    dataset: &Path,
    target: &str,
    config: &ForecastConfig,
    predictions_out: Option<&Path>,
) -> Result<PredictionSummary> {
    let target: TargetSeason = target.parse()?;
    let table = prepare_table(dataset, config)?;

    let registry = ModelRegistry::new(&config.model_dir);
    let generator = ForecastGenerator::new(registry.clone());
    let forecast = generator.generate(&table, target)?;
    let metadata = registry.load_metrics(forecast.season.kind);

    if let Some(path) = predictions_out {
        forecast.write_csv(path)?;
        info!(path = %path.display(), "wrote SKU predictions");
    }

    let plan = build_purchase_plan(&forecast.predictions_frame()?, &config.plan)?;

    Ok(PredictionSummary {
        temporada_objetivo: forecast.label(),
        cobertura_productos: forecast.coverage(),
        modelo_ganador: metadata.model_name,
        mape: metadata.metrics.mape,
        mae: metadata.metrics.mae,
        rmse: metadata.metrics.rmse,
        plan_compras: plan.rows(),
        season_type: forecast.season.kind,
        season_year: forecast.season.year,
        total_skus: forecast.total_skus(),
        total_predicted_units: forecast.total_predicted_units(),
        summary: plan.summary(),
    })
}

/// Forecast `target` (`next_PV` or `next_OI`) and build its purchase plan.
///
/// Any failure aborts the run and is reported as an error status.
pub fn predict_workflow<P: AsRef<Path>>(
    dataset: P,
    target: &str,
    config: &ForecastConfig,
    predictions_out: Option<&Path>,
) -> PredictReport {
    match predict_inner(dataset.as_ref(), target, config, predictions_out) {
        Ok(summary) => {
            info!(
                season = %summary.temporada_objetivo,
                model = %summary.modelo_ganador,
                coverage = summary.cobertura_productos,
                sections = summary.summary.total_sections,
                total_uds = summary.summary.total_uds,
                "prediction workflow complete"
            );
            PredictReport::Success(Box::new(summary))
        }
        Err(err) => {
            error!(error = %err, "prediction workflow failed");
            PredictReport::Error {
                error: err.to_string(),
            }
        }
    }
}
