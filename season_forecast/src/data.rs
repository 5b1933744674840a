//! Sales history loading
//!
//! The order history arrives as a CSV export whose column headers are the
//! business names used by the buying team. Known columns are parsed into a
//! typed [`SalesRecord`]; anything else in the file is ignored.

use crate::error::{ForecastError, Result};
use crate::season::Season;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Columns of the order history understood by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    OrderedQuantity,
    CostPrice,
    ListPrice,
    CostAmount,
    Brand,
    Article,
    Model,
    Color,
    Size,
    ProductLine,
    StoreName,
    Theme,
    Family,
    BudgetDate,
    DeadlineDate,
    WarehouseEntryDate,
}

impl Column {
    pub const ALL: [Column; 16] = [
        Column::OrderedQuantity,
        Column::CostPrice,
        Column::ListPrice,
        Column::CostAmount,
        Column::Brand,
        Column::Article,
        Column::Model,
        Column::Color,
        Column::Size,
        Column::ProductLine,
        Column::StoreName,
        Column::Theme,
        Column::Family,
        Column::BudgetDate,
        Column::DeadlineDate,
        Column::WarehouseEntryDate,
    ];

    /// Header of the column in the source file
    pub fn header(&self) -> &'static str {
        match self {
            Column::OrderedQuantity => "Cantidad Pedida",
            Column::CostPrice => "Precio Coste",
            Column::ListPrice => "P.V.P.",
            Column::CostAmount => "Importe de Coste",
            Column::Brand => "Marca",
            Column::Article => "Artículo",
            Column::Model => "Modelo Artículo",
            Column::Color => "Color",
            Column::Size => "Talla",
            Column::ProductLine => "Línea Producto",
            Column::StoreName => "Nombre TPV",
            Column::Theme => "Tema",
            Column::Family => "Familia",
            Column::BudgetDate => "Fecha Presupuesto",
            Column::DeadlineDate => "Fecha Tope",
            Column::WarehouseEntryDate => "Fecha REAL entrada en almacén",
        }
    }

    pub fn from_header(header: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|c| c.header() == header)
    }

    fn kind(&self) -> ColumnKind {
        match self {
            Column::OrderedQuantity | Column::CostPrice | Column::ListPrice | Column::CostAmount => {
                ColumnKind::Number
            }
            Column::BudgetDate | Column::DeadlineDate | Column::WarehouseEntryDate => {
                ColumnKind::Date
            }
            _ => ColumnKind::Text,
        }
    }
}

enum ColumnKind {
    Number,
    Text,
    Date,
}

/// One historical order line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesRecord {
    pub ordered_quantity: Option<f64>,
    pub cost_price: Option<f64>,
    pub list_price: Option<f64>,
    pub cost_amount: Option<f64>,
    pub brand: Option<String>,
    pub article: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub product_line: Option<String>,
    pub store_name: Option<String>,
    pub theme: Option<String>,
    pub family: Option<String>,
    pub budget_date: Option<NaiveDate>,
    pub deadline_date: Option<NaiveDate>,
    pub warehouse_entry_date: Option<NaiveDate>,
    /// Derived from `theme` by [`crate::season::extract_seasons`]
    pub season: Option<Season>,
}

impl SalesRecord {
    /// Value of a text column, `None` for missing values and non-text columns
    pub fn text(&self, column: Column) -> Option<&str> {
        self.text_slot(column).and_then(|v| v.as_deref())
    }

    /// Mutable access to a text column
    pub fn text_mut(&mut self, column: Column) -> Option<&mut Option<String>> {
        let slot = match column {
            Column::Brand => &mut self.brand,
            Column::Article => &mut self.article,
            Column::Model => &mut self.model,
            Column::Color => &mut self.color,
            Column::Size => &mut self.size,
            Column::ProductLine => &mut self.product_line,
            Column::StoreName => &mut self.store_name,
            Column::Theme => &mut self.theme,
            Column::Family => &mut self.family,
            _ => return None,
        };
        Some(slot)
    }

    fn text_slot(&self, column: Column) -> Option<&Option<String>> {
        match column {
            Column::Brand => Some(&self.brand),
            Column::Article => Some(&self.article),
            Column::Model => Some(&self.model),
            Column::Color => Some(&self.color),
            Column::Size => Some(&self.size),
            Column::ProductLine => Some(&self.product_line),
            Column::StoreName => Some(&self.store_name),
            Column::Theme => Some(&self.theme),
            Column::Family => Some(&self.family),
            _ => None,
        }
    }

    /// Value of a numeric column
    pub fn number(&self, column: Column) -> Option<f64> {
        match column {
            Column::OrderedQuantity => self.ordered_quantity,
            Column::CostPrice => self.cost_price,
            Column::ListPrice => self.list_price,
            Column::CostAmount => self.cost_amount,
            _ => None,
        }
    }

    fn number_mut(&mut self, column: Column) -> Option<&mut Option<f64>> {
        match column {
            Column::OrderedQuantity => Some(&mut self.ordered_quantity),
            Column::CostPrice => Some(&mut self.cost_price),
            Column::ListPrice => Some(&mut self.list_price),
            Column::CostAmount => Some(&mut self.cost_amount),
            _ => None,
        }
    }

    fn date_mut(&mut self, column: Column) -> Option<&mut Option<NaiveDate>> {
        match column {
            Column::BudgetDate => Some(&mut self.budget_date),
            Column::DeadlineDate => Some(&mut self.deadline_date),
            Column::WarehouseEntryDate => Some(&mut self.warehouse_entry_date),
            _ => None,
        }
    }

    /// Month (1-12) of the budget date
    pub fn month(&self) -> Option<u32> {
        self.budget_date.map(|d| d.month())
    }
}

/// The order history as typed records plus the set of columns the source had
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesTable {
    columns: BTreeSet<Column>,
    records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn new<I>(columns: I, records: Vec<SalesRecord>) -> Self
    where
        I: IntoIterator<Item = Column>,
    {
        Self {
            columns: columns.into_iter().collect(),
            records,
        }
    }

    /// Columns present in the source
    pub fn columns(&self) -> &BTreeSet<Column> {
        &self.columns
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Whether the month feature can be derived
    pub fn has_month(&self) -> bool {
        self.has_column(Column::BudgetDate)
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [SalesRecord] {
        &mut self.records
    }

    /// Replace the records, keeping the column set
    pub fn with_records(&self, records: Vec<SalesRecord>) -> Self {
        Self {
            columns: self.columns.clone(),
            records,
        }
    }

    pub fn into_records(self) -> Vec<SalesRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loader for the order history export
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load the order history from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<SalesTable> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // Zero-row schema inference reads every column as text
        let df = CsvReader::new(file)
            .infer_schema(Some(0))
            .has_header(true)
            .with_delimiter(delimiter)
            .finish()?;

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded order history"
        );
        Self::from_dataframe(&df)
    }

    /// Convert an existing DataFrame into a typed table
    pub fn from_dataframe(df: &DataFrame) -> Result<SalesTable> {
        let mut records = vec![SalesRecord::default(); df.height()];
        let mut columns = BTreeSet::new();

        for name in df.get_column_names() {
            let Some(column) = Column::from_header(name.trim()) else {
                debug!(column = name, "ignoring unknown column");
                continue;
            };
            if !columns.insert(column) {
                return Err(ForecastError::DataError(format!(
                    "Duplicate column '{}'",
                    column.header()
                )));
            }

            let series = df.column(name)?.cast(&DataType::Utf8)?;
            let cells = series.utf8()?;
            for (record, cell) in records.iter_mut().zip(cells.into_iter()) {
                let cell = cell.map(str::trim).filter(|s| !s.is_empty());
                match column.kind() {
                    ColumnKind::Number => {
                        if let Some(slot) = record.number_mut(column) {
                            *slot = cell.and_then(parse_number);
                        }
                    }
                    ColumnKind::Date => {
                        if let Some(slot) = record.date_mut(column) {
                            *slot = cell.and_then(parse_date);
                        }
                    }
                    ColumnKind::Text => {
                        if let Some(slot) = record.text_mut(column) {
                            *slot = cell.map(str::to_string);
                        }
                    }
                }
            }
        }

        Ok(SalesTable::new(columns, records))
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d"];
const DATETIME_FORMATS: [&str; 5] = [
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parse a day-first date, with or without a time part. ISO dates are
/// accepted as well.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
                .map(|dt| dt.date())
        })
}
