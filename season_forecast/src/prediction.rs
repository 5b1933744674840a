//! Forecasts for the season after the latest one in the history

use crate::data::{Column, SalesRecord, SalesTable};
use crate::error::{ForecastError, Result};
use crate::features::feature_matrix;
use crate::plan::{PREDICTED_QUANTITY, SECTION};
use crate::registry::ModelRegistry;
use crate::season::{Season, SeasonType};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Columns tried, in order, as plan section
pub const SECTION_CANDIDATES: [Column; 3] =
    [Column::Family, Column::ProductLine, Column::StoreName];

/// Section given to every row when no candidate column qualifies
pub const FALLBACK_SECTION: &str = "Producto";

/// Section of rows whose section column is empty
pub const UNKNOWN_SECTION: &str = "UNKNOWN";

/// Identifier columns copied into the predictions table when present
const IDENTIFIER_COLUMNS: [Column; 4] = [Column::Article, Column::Model, Column::Color, Column::Size];

/// Which season to forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSeason {
    NextPv,
    NextOi,
}

impl TargetSeason {
    pub fn season_type(&self) -> SeasonType {
        match self {
            TargetSeason::NextPv => SeasonType::PV,
            TargetSeason::NextOi => SeasonType::OI,
        }
    }

    /// The target season given the latest season in the history
    pub fn resolve(&self, latest: Season) -> Season {
        Season::new(self.season_type(), latest.year + 1)
    }
}

impl fmt::Display for TargetSeason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "next_{}", self.season_type())
    }
}

impl FromStr for TargetSeason {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "next_PV" => Ok(TargetSeason::NextPv),
            "next_OI" => Ok(TargetSeason::NextOi),
            other => Err(ForecastError::InvalidParameter(format!(
                "Invalid target season '{}', expected next_PV or next_OI",
                other
            ))),
        }
    }
}

/// Season with the highest year; the first such row wins ties
pub fn detect_latest_season(table: &SalesTable) -> Result<Season> {
    let mut latest: Option<Season> = None;
    for season in table.records().iter().filter_map(|r| r.season) {
        if latest.map_or(true, |l| season.year > l.year) {
            latest = Some(season);
        }
    }
    latest.ok_or_else(|| ForecastError::DataError("No valid seasons found in data".to_string()))
}

/// First candidate column present with more than one distinct value
pub fn select_section_column(table: &SalesTable, records: &[&SalesRecord]) -> Option<Column> {
    SECTION_CANDIDATES.into_iter().find(|&column| {
        if !table.has_column(column) {
            return false;
        }
        let distinct = records
            .iter()
            .filter_map(|r| r.text(column))
            .collect::<BTreeSet<_>>()
            .len();
        if distinct > 1 {
            info!(column = column.header(), distinct, "selected plan section column");
            true
        } else {
            debug!(column = column.header(), distinct, "skipping section candidate");
            false
        }
    })
}

/// One SKU of the forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow {
    pub section: String,
    pub article: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    /// Never negative
    pub predicted_quantity: f64,
    pub cost_price: Option<f64>,
    pub list_price: Option<f64>,
    pub theme: Option<String>,
}

/// Predictions for a target season
#[derive(Debug, Clone)]
pub struct Forecast {
    pub season: Season,
    pub model_artifact: String,
    /// Column the sections came from, `None` for the fallback section
    pub section_column: Option<Column>,
    pub rows: Vec<PredictionRow>,
    /// Source columns the predictions carry
    columns: BTreeSet<Column>,
}

impl Forecast {
    pub fn label(&self) -> String {
        self.season.label()
    }

    pub fn total_skus(&self) -> usize {
        self.rows.len()
    }

    pub fn total_predicted_units(&self) -> f64 {
        self.rows.iter().map(|r| r.predicted_quantity).sum()
    }

    /// Percentage of rows with a positive prediction
    pub fn coverage(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let positive = self.rows.iter().filter(|r| r.predicted_quantity > 0.0).count();
        positive as f64 / self.rows.len() as f64 * 100.0
    }

    /// Header of each output column, in output order
    pub fn output_headers(&self) -> Vec<&'static str> {
        let mut headers = vec![SECTION];
        headers.extend(
            IDENTIFIER_COLUMNS
                .iter()
                .filter(|c| self.columns.contains(*c))
                .map(Column::header),
        );
        headers.push(PREDICTED_QUANTITY);
        for column in [Column::CostPrice, Column::ListPrice, Column::Theme] {
            if self.columns.contains(&column) {
                headers.push(column.header());
            }
        }
        headers
    }

    fn text_values<F>(&self, get: F) -> Vec<Option<String>>
    where
        F: Fn(&PredictionRow) -> Option<String>,
    {
        self.rows.iter().map(get).collect()
    }

    /// The predictions as a table with the business headers
    pub fn predictions_frame(&self) -> Result<DataFrame> {
        let mut columns = vec![Series::new(
            SECTION,
            self.rows.iter().map(|r| r.section.clone()).collect::<Vec<_>>(),
        )];
        for column in IDENTIFIER_COLUMNS {
            if !self.columns.contains(&column) {
                continue;
            }
            let values = match column {
                Column::Article => self.text_values(|r| r.article.clone()),
                Column::Model => self.text_values(|r| r.model.clone()),
                Column::Color => self.text_values(|r| r.color.clone()),
                _ => self.text_values(|r| r.size.clone()),
            };
            columns.push(Series::new(column.header(), values));
        }
        columns.push(Series::new(
            PREDICTED_QUANTITY,
            self.rows.iter().map(|r| r.predicted_quantity).collect::<Vec<_>>(),
        ));
        if self.columns.contains(&Column::CostPrice) {
            let values: Vec<Option<f64>> = self.rows.iter().map(|r| r.cost_price).collect();
            columns.push(Series::new(Column::CostPrice.header(), values));
        }
        if self.columns.contains(&Column::ListPrice) {
            let values: Vec<Option<f64>> = self.rows.iter().map(|r| r.list_price).collect();
            columns.push(Series::new(Column::ListPrice.header(), values));
        }
        if self.columns.contains(&Column::Theme) {
            columns.push(Series::new(Column::Theme.header(), self.text_values(|r| r.theme.clone())));
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Write the predictions table as CSV
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(self.output_headers())?;
        for row in &self.rows {
            let mut record = vec![row.section.clone()];
            for column in IDENTIFIER_COLUMNS {
                if self.columns.contains(&column) {
                    let value = match column {
                        Column::Article => &row.article,
                        Column::Model => &row.model,
                        Column::Color => &row.color,
                        _ => &row.size,
                    };
                    record.push(value.clone().unwrap_or_default());
                }
            }
            record.push(row.predicted_quantity.to_string());
            for (column, value) in [
                (Column::CostPrice, row.cost_price),
                (Column::ListPrice, row.list_price),
            ] {
                if self.columns.contains(&column) {
                    record.push(value.map(|v| v.to_string()).unwrap_or_default());
                }
            }
            if self.columns.contains(&Column::Theme) {
                record.push(row.theme.clone().unwrap_or_default());
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Produces forecasts with models served by a registry
#[derive(Debug, Clone)]
pub struct ForecastGenerator {
    registry: ModelRegistry,
}

impl ForecastGenerator {
    pub fn new(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Forecast the target season from a cleaned, season-tagged history.
    ///
    /// The latest season's type-matched rows are re-dated to the target year
    /// and scored with the season type's model; negative predictions are
    /// floored at zero.
    pub fn generate(&self, table: &SalesTable, target: TargetSeason) -> Result<Forecast> {
        let latest = detect_latest_season(table)?;
        let season = target.resolve(latest);
        info!(latest = %latest, target = %season, "resolved target season");

        let loaded = self.registry.load(season.kind)?;

        let records: Vec<SalesRecord> = table
            .records()
            .iter()
            .filter(|r| r.season.is_some_and(|s| s.kind == season.kind))
            .map(|r| SalesRecord {
                season: Some(season),
                ..r.clone()
            })
            .collect();
        if records.is_empty() {
            return Err(ForecastError::DataError(format!(
                "No historical data found for season type {}",
                season.kind
            )));
        }
        info!(skus = records.len(), "preparing SKUs for prediction");

        let refs: Vec<&SalesRecord> = records.iter().collect();
        let x = feature_matrix(table, &refs);
        let predicted = loaded.model.predict(&x)?;
        if predicted.len() != records.len() {
            return Err(ForecastError::ModelError(format!(
                "Model returned {} predictions for {} rows",
                predicted.len(),
                records.len()
            )));
        }

        let section_column = select_section_column(table, &refs);
        if section_column.is_none() {
            warn!(
                section = FALLBACK_SECTION,
                "no section column with several values, the plan will have a single row"
            );
        }

        let rows: Vec<PredictionRow> = records
            .iter()
            .zip(predicted)
            .map(|(record, quantity)| PredictionRow {
                section: match section_column {
                    Some(column) => record.text(column).unwrap_or(UNKNOWN_SECTION).to_string(),
                    None => FALLBACK_SECTION.to_string(),
                },
                article: record.article.clone(),
                model: record.model.clone(),
                color: record.color.clone(),
                size: record.size.clone(),
                predicted_quantity: quantity.max(0.0),
                cost_price: record.cost_price,
                list_price: record.list_price,
                theme: record.theme.clone(),
            })
            .collect();

        let forecast = Forecast {
            season,
            model_artifact: loaded.artifact,
            section_column,
            rows,
            columns: table.columns().clone(),
        };
        info!(
            season = %forecast.label(),
            skus = forecast.total_skus(),
            coverage = forecast.coverage(),
            total_units = forecast.total_predicted_units(),
            "forecast complete"
        );
        Ok(forecast)
    }
}
