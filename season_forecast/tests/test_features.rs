use season_forecast::data::{Column, SalesRecord, SalesTable};
use season_forecast::features::{build_features, FeatureValues, MONTH, SEASON_YEAR};
use season_forecast::season::{extract_season, SeasonType};

fn record(theme: &str, quantity: f64, article: &str) -> SalesRecord {
    SalesRecord {
        ordered_quantity: Some(quantity),
        cost_price: Some(10.0),
        list_price: Some(20.0),
        cost_amount: Some(quantity * 10.0),
        brand: Some("BRAND".to_string()),
        article: Some(article.to_string()),
        theme: Some(theme.to_string()),
        season: extract_season(theme),
        ..Default::default()
    }
}

const COLUMNS: [Column; 7] = [
    Column::OrderedQuantity,
    Column::CostPrice,
    Column::ListPrice,
    Column::CostAmount,
    Column::Brand,
    Column::Article,
    Column::Theme,
];

#[test]
fn test_build_features_filters_by_season_type() {
    let mut records = Vec::new();
    for i in 0..40 {
        records.push(record("T_PV24 01 BASIC", i as f64 + 1.0, "PV-A"));
    }
    for i in 0..20 {
        // PV rows without a parseable season code
        records.push(record("PV SIN CODIGO", i as f64 + 1.0, "PV-B"));
    }
    for i in 0..40 {
        records.push(record("T_OI24 02 BASIC", i as f64 + 1.0, "OI-A"));
    }
    let table = SalesTable::new(COLUMNS, records);
    assert_eq!(table.len(), 100);

    let (x, y) = build_features(&table, SeasonType::PV);
    assert_eq!(x.n_rows(), 40);
    assert_eq!(y.len(), 40);
    assert_eq!(y[0], 1.0);
    assert_eq!(y[39], 40.0);

    let (x_oi, y_oi) = build_features(&table, SeasonType::OI);
    assert_eq!(x_oi.n_rows(), 40);
    assert_eq!(y_oi.len(), 40);
}

#[test]
fn test_build_features_schema_tolerant() {
    let table = SalesTable::new(COLUMNS, vec![record("T_PV25 03", 5.0, "A")]);
    let (x, _) = build_features(&table, SeasonType::PV);

    assert_eq!(
        x.feature_names(),
        vec![
            "Marca",
            "Artículo",
            SEASON_YEAR,
            "Precio Coste",
            "P.V.P.",
            "Importe de Coste"
        ]
    );
    assert_eq!(x.season_years(), Some(&[2025.0][..]));
    assert!(x.column(MONTH).is_none());
    match &x.column("Artículo").unwrap().values {
        FeatureValues::Categorical(values) => assert_eq!(values, &vec![Some("A".to_string())]),
        other => panic!("unexpected values {:?}", other),
    }
}

#[test]
fn test_build_features_month_from_budget_date() {
    let mut columns = COLUMNS.to_vec();
    columns.push(Column::BudgetDate);
    let mut with_date = record("T_PV25 03", 5.0, "A");
    with_date.budget_date = chrono::NaiveDate::from_ymd_opt(2025, 4, 2);
    let without_date = record("T_PV25 03", 6.0, "B");

    let table = SalesTable::new(columns, vec![with_date, without_date]);
    let (x, _) = build_features(&table, SeasonType::PV);

    let months = x.numeric(MONTH).unwrap();
    assert_eq!(months[0], 4.0);
    assert!(months[1].is_nan());
}

#[test]
fn test_build_features_no_rows_is_empty() {
    let table = SalesTable::new(COLUMNS, vec![record("T_PV25 03", 5.0, "A")]);
    let (x, y) = build_features(&table, SeasonType::OI);
    assert!(x.is_empty());
    assert!(y.is_empty());
}
