//! Feature matrix assembly for one season type

use crate::data::{Column, SalesRecord, SalesTable};
use crate::error::{ForecastError, Result};
use crate::season::SeasonType;
use tracing::info;

/// Name of the numeric season-year feature
pub const SEASON_YEAR: &str = "season_year";
/// Name of the month feature derived from the budget date
pub const MONTH: &str = "Month";

/// Categorical feature allow-list, kept when present in the table
pub const CATEGORICAL_FEATURES: [Column; 7] = [
    Column::Brand,
    Column::Article,
    Column::Model,
    Column::Color,
    Column::Size,
    Column::ProductLine,
    Column::StoreName,
];

/// Numeric source columns used as features besides season year and month
pub const NUMERIC_FEATURES: [Column; 3] =
    [Column::CostPrice, Column::ListPrice, Column::CostAmount];

/// Values of one feature column
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValues {
    Categorical(Vec<Option<String>>),
    /// Missing values are NaN
    Numeric(Vec<f64>),
}

impl FeatureValues {
    pub fn len(&self) -> usize {
        match self {
            FeatureValues::Categorical(v) => v.len(),
            FeatureValues::Numeric(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, rows: &[usize]) -> FeatureValues {
        match self {
            FeatureValues::Categorical(v) => {
                FeatureValues::Categorical(rows.iter().map(|&r| v[r].clone()).collect())
            }
            FeatureValues::Numeric(v) => {
                FeatureValues::Numeric(rows.iter().map(|&r| v[r]).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedFeature {
    pub name: String,
    pub values: FeatureValues,
}

impl NamedFeature {
    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values: FeatureValues::Categorical(values),
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values: FeatureValues::Numeric(values),
        }
    }
}

/// Column-oriented feature table, every column the same length
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<NamedFeature>,
    n_rows: usize,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<NamedFeature>) -> Result<Self> {
        let n_rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.values.len() != n_rows) {
            return Err(ForecastError::ValidationError(format!(
                "Feature '{}' has {} rows, expected {}",
                bad.name,
                bad.values.len(),
                n_rows
            )));
        }
        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[NamedFeature] {
        &self.columns
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&NamedFeature> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Values of a numeric column by name
    pub fn numeric(&self, name: &str) -> Option<&[f64]> {
        match self.column(name).map(|c| &c.values) {
            Some(FeatureValues::Numeric(v)) => Some(v),
            _ => None,
        }
    }

    /// Season years of the rows
    pub fn season_years(&self) -> Option<&[f64]> {
        self.numeric(SEASON_YEAR)
    }

    /// New matrix holding the given rows, in the given order
    pub fn take_rows(&self, rows: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            columns: self
                .columns
                .iter()
                .map(|c| NamedFeature {
                    name: c.name.clone(),
                    values: c.values.take(rows),
                })
                .collect(),
            n_rows: rows.len(),
        }
    }
}

/// Build the feature matrix for the given records.
///
/// The schema comes from the columns of `table`: allow-listed columns the
/// source lacks are left out.
pub fn feature_matrix(table: &SalesTable, records: &[&SalesRecord]) -> FeatureMatrix {
    let mut columns = Vec::new();

    for column in CATEGORICAL_FEATURES {
        if table.has_column(column) {
            let values = records
                .iter()
                .map(|r| r.text(column).map(str::to_string))
                .collect();
            columns.push(NamedFeature::categorical(column.header(), values));
        }
    }

    let years = records
        .iter()
        .map(|r| r.season.map(|s| s.year as f64).unwrap_or(f64::NAN))
        .collect();
    columns.push(NamedFeature::numeric(SEASON_YEAR, years));

    for column in NUMERIC_FEATURES {
        if table.has_column(column) {
            let values = records
                .iter()
                .map(|r| r.number(column).unwrap_or(f64::NAN))
                .collect();
            columns.push(NamedFeature::numeric(column.header(), values));
        }
    }

    if table.has_month() {
        let months = records
            .iter()
            .map(|r| r.month().map(f64::from).unwrap_or(f64::NAN))
            .collect();
        columns.push(NamedFeature::numeric(MONTH, months));
    }

    let n_rows = records.len();
    FeatureMatrix { columns, n_rows }
}

/// Features and target for every row of the given season type.
///
/// No matching rows gives an empty matrix and target, which callers treat
/// as "no data" for the season. Rows without an ordered quantity are skipped
/// so the target never has gaps.
pub fn build_features(table: &SalesTable, season_type: SeasonType) -> (FeatureMatrix, Vec<f64>) {
    let records: Vec<&SalesRecord> = table
        .records()
        .iter()
        .filter(|r| r.season.is_some_and(|s| s.kind == season_type))
        .filter(|r| r.ordered_quantity.is_some())
        .collect();

    let target: Vec<f64> = records
        .iter()
        .filter_map(|r| r.ordered_quantity)
        .collect();
    let matrix = feature_matrix(table, &records);

    info!(
        season_type = %season_type,
        rows = matrix.n_rows(),
        features = ?matrix.feature_names(),
        "built feature matrix"
    );
    (matrix, target)
}
