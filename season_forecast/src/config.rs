//! Pipeline configuration

use crate::error::{ForecastError, Result};
pub use crate::plan::{PlanConfig, SectionOverrides};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings of the training procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Share of the most recent rows held out for scoring
    pub test_fraction: f64,
    /// Grid points sampled per family
    pub search_iterations: usize,
    pub cv_folds: usize,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            search_iterations: 10,
            cv_folds: 3,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.search_iterations == 0 {
            return Err(ForecastError::InvalidParameter(
                "search_iterations must be greater than zero".to_string(),
            ));
        }
        if self.cv_folds < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        Ok(())
    }
}

/// Top-level configuration, every field optional in the JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Directory of persisted models and metrics
    pub model_dir: PathBuf,
    /// Field delimiter of the input CSV
    pub csv_delimiter: char,
    pub training: TrainingConfig,
    pub plan: PlanConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            csv_delimiter: ',',
            training: TrainingConfig::default(),
            plan: PlanConfig::default(),
        }
    }
}

impl ForecastConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: ForecastConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.training.validate()?;
        self.delimiter().map(|_| ())
    }

    /// The delimiter as a single byte
    pub fn delimiter(&self) -> Result<u8> {
        u8::try_from(self.csv_delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "csv_delimiter must be an ASCII character, got '{}'",
                    self.csv_delimiter
                ))
            })
    }
}
