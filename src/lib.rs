//! # Plan de Compras
//!
//! Workspace facade over the forecasting pipeline and its tree learners.
//!
//! - [`season_forecast`]: order history loading, season-aware model training,
//!   next-season forecasts and the section-level purchase plan
//! - [`boost_trees`]: the gradient-boosted regression trees the pipeline fits
//!
//! ## Example
//!
//! ```
//! use plan_compras_workspace::season_forecast::{extract_season, SeasonType};
//!
//! let season = extract_season("T_PV25 05 MARFIL_P").unwrap();
//! assert_eq!(season.kind, SeasonType::PV);
//! assert_eq!(season.year, 2025);
//! ```

pub use boost_trees;
pub use season_forecast;
