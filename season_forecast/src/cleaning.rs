//! Row filtering and categorical imputation

use crate::data::{Column, SalesRecord, SalesTable};
use tracing::info;

/// Sentinel written into missing categorical cells
pub const UNKNOWN: &str = "UNKNOWN";

/// Numeric columns a row cannot be used without
pub const CRITICAL_COLUMNS: [Column; 3] =
    [Column::OrderedQuantity, Column::CostPrice, Column::ListPrice];

/// Categorical columns imputed with [`UNKNOWN`] when present in the table
pub const IMPUTED_COLUMNS: [Column; 8] = [
    Column::Brand,
    Column::Article,
    Column::Model,
    Column::Color,
    Column::Size,
    Column::ProductLine,
    Column::StoreName,
    Column::Theme,
];

/// Drop rows with missing or non-positive critical values and fill missing
/// categorical values.
///
/// An empty result is not an error: downstream stages read it as "no data".
/// Running the cleaner on its own output changes nothing.
pub fn clean(table: SalesTable) -> SalesTable {
    let initial = table.len();
    let imputed: Vec<Column> = IMPUTED_COLUMNS
        .into_iter()
        .filter(|c| table.has_column(*c))
        .collect();

    let (complete, missing): (Vec<SalesRecord>, Vec<SalesRecord>) = table
        .records()
        .iter()
        .cloned()
        .partition(|r| CRITICAL_COLUMNS.iter().all(|c| r.number(*c).is_some()));
    let after_missing = complete.len();

    let mut kept: Vec<SalesRecord> = complete
        .into_iter()
        .filter(|r| CRITICAL_COLUMNS.iter().all(|c| r.number(*c).is_some_and(|v| v > 0.0)))
        .collect();

    let mut filled = 0usize;
    for record in &mut kept {
        for column in &imputed {
            if let Some(slot) = record.text_mut(*column) {
                if slot.is_none() {
                    *slot = Some(UNKNOWN.to_string());
                    filled += 1;
                }
            }
        }
    }

    info!(
        initial,
        dropped_missing = missing.len(),
        dropped_non_positive = after_missing - kept.len(),
        imputed_cells = filled,
        remaining = kept.len(),
        "cleaned order history"
    );
    table.with_records(kept)
}
