//! # Season Forecast
//!
//! Seasonal demand forecasting for fashion retail buying.
//!
//! ## Features
//!
//! - Order history loading from CSV exports with business column headers
//! - Season extraction from theme codes (`PV` spring/summer, `OI` fall/winter)
//! - Cleaning, feature building and chronological train/test splitting
//! - Two gradient-boosting families compared per season by held-out MAPE,
//!   each tuned with a seeded randomized search and K-fold cross-validation
//! - A directory-backed model registry with an explicit active-model pointer
//! - Next-season forecasts aggregated into a section-level purchase plan
//!
//! ## Quick Start
//!
//! ```no_run
//! use season_forecast::config::ForecastConfig;
//! use season_forecast::workflow::{predict_workflow, train_workflow};
//!
//! let config = ForecastConfig::default();
//!
//! // Train a model for each season type
//! let report = train_workflow("history.csv", &config);
//! println!("{}", serde_json::to_string_pretty(&report).unwrap());
//!
//! // Forecast next spring/summer and build its purchase plan
//! let result = predict_workflow("history.csv", "next_PV", &config, None);
//! println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! ```

pub mod cleaning;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod plan;
pub mod prediction;
pub mod registry;
pub mod search;
pub mod season;
pub mod split;
pub mod training;
pub mod workflow;

// Re-export commonly used types
pub use crate::config::{ForecastConfig, TrainingConfig};
pub use crate::data::{Column, DataLoader, SalesRecord, SalesTable};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{build_features, FeatureMatrix};
pub use crate::metrics::ModelMetrics;
pub use crate::models::{RegressorFamily, SeasonModel};
pub use crate::plan::{build_purchase_plan, PlanConfig, PurchasePlan};
pub use crate::prediction::{Forecast, ForecastGenerator, TargetSeason};
pub use crate::registry::ModelRegistry;
pub use crate::season::{extract_season, Season, SeasonType};
pub use crate::training::ModelTrainer;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
