//! Section-level purchase plan built from SKU predictions
//!
//! Every ratio is zero when its denominator is zero. Aggregates stay exact;
//! rounding is applied only to the emitted [`PurchasePlanRow`]s.

use crate::data::Column;
use crate::error::{ForecastError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Section label column of the predictions table
pub const SECTION: &str = "SECCION";
/// Predicted quantity column of the predictions table
pub const PREDICTED_QUANTITY: &str = "Cantidad_Predicha";

/// Label given to rows whose section is missing
const UNKNOWN_SECTION: &str = "UNKNOWN";

/// A percentage with a fallback and per-section overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOverrides {
    pub default: f64,
    #[serde(default)]
    pub per_section: BTreeMap<String, f64>,
}

impl SectionOverrides {
    pub fn new(default: f64) -> Self {
        Self {
            default,
            per_section: BTreeMap::new(),
        }
    }

    pub fn with_section(mut self, section: impl Into<String>, value: f64) -> Self {
        self.per_section.insert(section.into(), value);
        self
    }

    pub fn value_for(&self, section: &str) -> f64 {
        self.per_section.get(section).copied().unwrap_or(self.default)
    }
}

/// Inputs of the plan besides the predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Number of stores the units are spread over
    pub store_count: usize,
    /// Expected markdown percentage
    pub markdown: SectionOverrides,
    /// Expected leftover stock percentage
    pub leftover: SectionOverrides,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            store_count: 10,
            markdown: SectionOverrides::new(15.0),
            leftover: SectionOverrides::new(8.0),
        }
    }
}

/// Exact aggregates of one section
#[derive(Debug, Clone, PartialEq)]
pub struct SectionPlan {
    pub section: String,
    pub units: f64,
    pub revenue: f64,
    pub cost: f64,
    /// Distinct articles, or row count when articles are unknown
    pub options: usize,
    pub avg_cost: f64,
    pub avg_price: f64,
    /// Markup over cost, in percent
    pub margin: f64,
    /// Units per option
    pub depth: f64,
    pub markdown: f64,
    pub leftover: f64,
    pub per_store: f64,
    pub per_size: f64,
    /// Share of total plan revenue, in percent
    pub revenue_share: f64,
    /// Share of total plan cost, in percent
    pub cost_share: f64,
}

/// Emitted plan row, keyed by the buying team's headers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchasePlanRow {
    #[serde(rename = "SECCION")]
    pub section: String,
    #[serde(rename = "% seccion")]
    pub revenue_share: f64,
    #[serde(rename = "CONTRI.")]
    pub cost_share: f64,
    #[serde(rename = "UDS")]
    pub units: i64,
    #[serde(rename = "PVP")]
    pub revenue: f64,
    #[serde(rename = "COSTE")]
    pub cost: f64,
    #[serde(rename = "Prof")]
    pub depth: f64,
    #[serde(rename = "Opc")]
    pub options: usize,
    #[serde(rename = "PM Cte")]
    pub avg_cost: f64,
    #[serde(rename = "PM Vta")]
    pub avg_price: f64,
    #[serde(rename = "Mk")]
    pub margin: f64,
    #[serde(rename = "MARKDOWN")]
    pub markdown: f64,
    #[serde(rename = "SOBRANTE")]
    pub leftover: f64,
    #[serde(rename = "x tienda")]
    pub per_store: f64,
    #[serde(rename = "x talla")]
    pub per_size: f64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

impl SectionPlan {
    /// Presentation form: money and unit averages to 2 decimals, percentages
    /// and per-unit spreads to 1 decimal, units to the nearest integer
    pub fn to_row(&self) -> PurchasePlanRow {
        PurchasePlanRow {
            section: self.section.clone(),
            revenue_share: round_to(self.revenue_share, 1),
            cost_share: round_to(self.cost_share, 1),
            units: self.units.round() as i64,
            revenue: round_to(self.revenue, 2),
            cost: round_to(self.cost, 2),
            depth: round_to(self.depth, 1),
            options: self.options,
            avg_cost: round_to(self.avg_cost, 2),
            avg_price: round_to(self.avg_price, 2),
            margin: round_to(self.margin, 1),
            markdown: round_to(self.markdown, 1),
            leftover: round_to(self.leftover, 1),
            per_store: round_to(self.per_store, 1),
            per_size: round_to(self.per_size, 1),
        }
    }
}

/// Plan totals reported next to the rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_sections: usize,
    pub total_uds: i64,
    pub total_pvp: f64,
    pub total_coste: f64,
    /// Mean section margin
    pub avg_margin: f64,
}

/// Sections ordered by revenue, highest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PurchasePlan {
    sections: Vec<SectionPlan>,
}

impl PurchasePlan {
    pub fn sections(&self) -> &[SectionPlan] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&SectionPlan> {
        self.sections.iter().find(|s| s.section == name)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Rounded rows for output
    pub fn rows(&self) -> Vec<PurchasePlanRow> {
        self.sections.iter().map(SectionPlan::to_row).collect()
    }

    pub fn summary(&self) -> PlanSummary {
        let total_units: f64 = self.sections.iter().map(|s| s.units).sum();
        let avg_margin = if self.sections.is_empty() {
            0.0
        } else {
            self.sections.iter().map(|s| s.margin).sum::<f64>() / self.sections.len() as f64
        };
        PlanSummary {
            total_sections: self.sections.len(),
            total_uds: total_units.round() as i64,
            total_pvp: round_to(self.sections.iter().map(|s| s.revenue).sum(), 2),
            total_coste: round_to(self.sections.iter().map(|s| s.cost).sum(), 2),
            avg_margin: round_to(avg_margin, 1),
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df.column(name)?.cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|v| v.is_finite()).unwrap_or(0.0))
        .collect())
}

fn text_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<String>>>> {
    if !df.get_column_names().contains(&name) {
        return Ok(None);
    }
    let series = df.column(name)?.cast(&DataType::Utf8)?;
    Ok(Some(
        series
            .utf8()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect(),
    ))
}

fn distinct(values: &Option<Vec<Option<String>>>, rows: &[usize]) -> Option<usize> {
    values.as_ref().map(|values| {
        rows.iter()
            .filter_map(|&r| values[r].as_deref())
            .collect::<BTreeSet<_>>()
            .len()
    })
}

/// Aggregate a predictions table into the section plan.
///
/// The table must have `SECCION`, `Cantidad_Predicha`, `Precio Coste` and
/// `P.V.P.`; `Artículo` and `Talla` are used when present. Non-numeric
/// quantities and prices count as zero.
pub fn build_purchase_plan(predictions: &DataFrame, config: &PlanConfig) -> Result<PurchasePlan> {
    let required = [
        SECTION,
        PREDICTED_QUANTITY,
        Column::CostPrice.header(),
        Column::ListPrice.header(),
    ];
    let present = predictions.get_column_names();
    let missing: Vec<String> = required
        .iter()
        .filter(|c| !present.contains(*c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ForecastError::MissingColumns(missing));
    }

    let sections = text_column(predictions, SECTION)?.unwrap_or_default();
    let quantities = numeric_column(predictions, PREDICTED_QUANTITY)?;
    let cost_prices = numeric_column(predictions, Column::CostPrice.header())?;
    let list_prices = numeric_column(predictions, Column::ListPrice.header())?;
    let articles = text_column(predictions, Column::Article.header())?;
    let sizes = text_column(predictions, Column::Size.header())?;

    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (row, section) in sections.into_iter().enumerate() {
        let section = section.unwrap_or_else(|| UNKNOWN_SECTION.to_string());
        groups.entry(section).or_default().push(row);
    }

    let mut plan: Vec<SectionPlan> = groups
        .into_iter()
        .map(|(section, rows)| {
            let units: f64 = rows.iter().map(|&r| quantities[r]).sum();
            let revenue: f64 = rows.iter().map(|&r| quantities[r] * list_prices[r]).sum();
            let cost: f64 = rows.iter().map(|&r| quantities[r] * cost_prices[r]).sum();
            let options = distinct(&articles, &rows).unwrap_or(rows.len());
            let per_size = distinct(&sizes, &rows)
                .map(|n| ratio(units, n as f64))
                .unwrap_or(0.0);

            SectionPlan {
                units,
                revenue,
                cost,
                options,
                avg_cost: ratio(cost, units),
                avg_price: ratio(revenue, units),
                margin: ratio(revenue - cost, cost) * 100.0,
                depth: ratio(units, options as f64),
                markdown: config.markdown.value_for(&section),
                leftover: config.leftover.value_for(&section),
                per_store: ratio(units, config.store_count as f64),
                per_size,
                revenue_share: 0.0,
                cost_share: 0.0,
                section,
            }
        })
        .collect();

    let total_revenue: f64 = plan.iter().map(|s| s.revenue).sum();
    let total_cost: f64 = plan.iter().map(|s| s.cost).sum();
    for section in &mut plan {
        section.revenue_share = ratio(section.revenue, total_revenue) * 100.0;
        section.cost_share = ratio(section.cost, total_cost) * 100.0;
    }
    plan.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));

    let plan = PurchasePlan { sections: plan };
    let summary = plan.summary();
    info!(
        skus = predictions.height(),
        sections = summary.total_sections,
        total_uds = summary.total_uds,
        total_pvp = summary.total_pvp,
        total_coste = summary.total_coste,
        avg_margin = summary.avg_margin,
        "built purchase plan"
    );
    Ok(plan)
}
