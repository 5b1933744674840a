//! Error types for the season_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the season_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// A table is missing columns an operation requires
    #[error("Missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error raised while fitting or evaluating a model
    #[error("Model error: {0}")]
    ModelError(String),

    /// No persisted model matches the requested season type
    #[error("No model found for season {season_type}")]
    ModelNotFound { season_type: String },

    /// Every model family failed for a season
    #[error("All models failed to train for season {season_type}: {}", failures.join("; "))]
    TrainingFailed {
        season_type: String,
        failures: Vec<String>,
    },

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from JSON (de)serialization
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Error writing CSV output
    #[error("CSV error: {0}")]
    CsvError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<boost_trees::BoostError> for ForecastError {
    fn from(err: boost_trees::BoostError) -> Self {
        ForecastError::ModelError(err.to_string())
    }
}
