//! On-disk store of trained models, keyed by season type
//!
//! Layout of the model directory:
//!
//! - `model_{season}_{family}.json`: a serialised [`SeasonModel`]
//! - `metrics_{season}.json`: metrics of the last model saved for the season
//! - `active_{season}.json`: pointer naming the artifact to serve
//!
//! Metrics and pointer are replaced atomically on every save.

use crate::error::{ForecastError, Result};
use crate::metrics::ModelMetrics;
use crate::models::SeasonModel;
use crate::season::SeasonType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Model name reported when no metrics were stored
pub const UNKNOWN_MODEL: &str = "Unknown";

/// Metrics as stored; fields are null in the placeholder record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredMetrics {
    pub mape: Option<f64>,
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
}

impl From<ModelMetrics> for StoredMetrics {
    fn from(m: ModelMetrics) -> Self {
        Self {
            mape: Some(m.mape),
            mae: Some(m.mae),
            rmse: Some(m.rmse),
        }
    }
}

/// Contents of `metrics_{season}.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub season_type: SeasonType,
    pub model_name: String,
    pub metrics: StoredMetrics,
}

impl MetricsRecord {
    /// Placeholder returned when a season has no stored metrics
    pub fn unknown(season_type: SeasonType) -> Self {
        Self {
            season_type,
            model_name: UNKNOWN_MODEL.to_string(),
            metrics: StoredMetrics::default(),
        }
    }
}

/// Contents of `active_{season}.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveModel {
    pub season_type: SeasonType,
    pub model_name: String,
    /// File name of the model artifact inside the registry directory
    pub artifact: String,
}

/// A model read back from the registry
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub model: SeasonModel,
    pub artifact: String,
}

/// Directory-backed model registry
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    dir: PathBuf,
}

fn artifact_name(season_type: SeasonType, model_name: &str) -> String {
    format!("model_{}_{}.json", season_type, model_name)
}

fn artifact_prefix(season_type: SeasonType) -> String {
    format!("model_{}_", season_type)
}

/// Write through a sibling temp file and rename over the target
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl ModelRegistry {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn metrics_path(&self, season_type: SeasonType) -> PathBuf {
        self.dir.join(format!("metrics_{}.json", season_type))
    }

    fn pointer_path(&self, season_type: SeasonType) -> PathBuf {
        self.dir.join(format!("active_{}.json", season_type))
    }

    /// Persist a model, its season's metrics and the active pointer.
    /// Returns the path of the model artifact.
    pub fn save(
        &self,
        model: &SeasonModel,
        season_type: SeasonType,
        model_name: &str,
        metrics: &ModelMetrics,
    ) -> Result<PathBuf> {
        if model_name.is_empty()
            || model_name
                .chars()
                .any(|c| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        {
            return Err(ForecastError::InvalidParameter(format!(
                "Invalid model name '{}'",
                model_name
            )));
        }
        fs::create_dir_all(&self.dir)?;

        let artifact = artifact_name(season_type, model_name);
        let model_path = self.dir.join(&artifact);
        write_atomic(&model_path, &serde_json::to_vec(model)?)?;

        let record = MetricsRecord {
            season_type,
            model_name: model_name.to_string(),
            metrics: StoredMetrics::from(*metrics),
        };
        write_atomic(
            &self.metrics_path(season_type),
            &serde_json::to_vec_pretty(&record)?,
        )?;

        let pointer = ActiveModel {
            season_type,
            model_name: model_name.to_string(),
            artifact: artifact.clone(),
        };
        write_atomic(
            &self.pointer_path(season_type),
            &serde_json::to_vec_pretty(&pointer)?,
        )?;

        info!(
            season_type = %season_type,
            model = model_name,
            path = %model_path.display(),
            "saved model"
        );
        Ok(model_path)
    }

    /// Sorted model artifact names of a season type
    pub fn list(&self, season_type: SeasonType) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let prefix = artifact_prefix(season_type);
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if name.starts_with(&prefix) && name.ends_with(".json") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// The pointer of a season, if present and readable
    pub fn active(&self, season_type: SeasonType) -> Option<ActiveModel> {
        let path = self.pointer_path(season_type);
        let contents = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(pointer) => Some(pointer),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable model pointer");
                None
            }
        }
    }

    /// Load the model to serve for a season type.
    ///
    /// Follows the active pointer when it names an existing artifact;
    /// otherwise takes the lexicographically last artifact of the season.
    pub fn load(&self, season_type: SeasonType) -> Result<LoadedModel> {
        let pointed = self
            .active(season_type)
            .map(|p| p.artifact)
            .filter(|artifact| self.dir.join(artifact).is_file());

        let artifact = match pointed {
            Some(artifact) => artifact,
            None => {
                debug!(season_type = %season_type, "no usable pointer, falling back to artifact order");
                self.list(season_type)?
                    .pop()
                    .ok_or_else(|| ForecastError::ModelNotFound {
                        season_type: season_type.to_string(),
                    })?
            }
        };

        let contents = fs::read_to_string(self.dir.join(&artifact))?;
        let model: SeasonModel = serde_json::from_str(&contents)?;
        info!(season_type = %season_type, artifact = %artifact, "loaded model");
        Ok(LoadedModel { model, artifact })
    }

    /// Stored metrics of a season type, or the placeholder record
    pub fn load_metrics(&self, season_type: SeasonType) -> MetricsRecord {
        let path = self.metrics_path(season_type);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(_) => {
                warn!(season_type = %season_type, "no metrics stored for season");
                return MetricsRecord::unknown(season_type);
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "ignoring unreadable metrics");
            MetricsRecord::unknown(season_type)
        })
    }
}
