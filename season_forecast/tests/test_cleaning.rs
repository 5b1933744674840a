use pretty_assertions::assert_eq;
use season_forecast::cleaning::{clean, UNKNOWN};
use season_forecast::data::{Column, SalesRecord, SalesTable};

fn record(quantity: Option<f64>, cost: Option<f64>, price: Option<f64>) -> SalesRecord {
    SalesRecord {
        ordered_quantity: quantity,
        cost_price: cost,
        list_price: price,
        article: Some("A1".to_string()),
        ..Default::default()
    }
}

fn table() -> SalesTable {
    SalesTable::new(
        [
            Column::OrderedQuantity,
            Column::CostPrice,
            Column::ListPrice,
            Column::Article,
            Column::Color,
            Column::Theme,
        ],
        vec![
            record(Some(5.0), Some(10.0), Some(20.0)),
            record(None, Some(10.0), Some(20.0)),
            record(Some(5.0), None, Some(20.0)),
            record(Some(5.0), Some(10.0), None),
            record(Some(0.0), Some(10.0), Some(20.0)),
            record(Some(3.0), Some(-1.0), Some(20.0)),
            record(Some(2.0), Some(4.0), Some(8.0)),
        ],
    )
}

#[test]
fn test_clean_drops_invalid_rows() {
    let cleaned = clean(table());
    assert_eq!(cleaned.len(), 2);
    assert!(cleaned
        .records()
        .iter()
        .all(|r| r.ordered_quantity.unwrap() > 0.0 && r.cost_price.unwrap() > 0.0));
}

#[test]
fn test_clean_imputes_present_columns_only() {
    let cleaned = clean(table());
    let first = &cleaned.records()[0];
    assert_eq!(first.color.as_deref(), Some(UNKNOWN));
    assert_eq!(first.theme.as_deref(), Some(UNKNOWN));
    assert_eq!(first.article.as_deref(), Some("A1"));
    // Brand is not a column of the table
    assert_eq!(first.brand, None);
}

#[test]
fn test_clean_is_idempotent() {
    let once = clean(table());
    let twice = clean(once.clone());
    assert_eq!(once, twice);
}

#[test]
fn test_clean_empty_result_is_not_an_error() {
    let table = SalesTable::new(
        [Column::OrderedQuantity],
        vec![record(Some(-1.0), Some(1.0), Some(1.0))],
    );
    assert!(clean(table).is_empty());
}
