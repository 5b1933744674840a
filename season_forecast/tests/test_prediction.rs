use assert_approx_eq::assert_approx_eq;
use season_forecast::data::{Column, SalesRecord, SalesTable};
use season_forecast::error::ForecastError;
use season_forecast::features::build_features;
use season_forecast::metrics::ModelMetrics;
use season_forecast::models::{DepthwiseBoost, ParamSet, ParamValue, RegressorFamily};
use season_forecast::prediction::{
    detect_latest_season, ForecastGenerator, TargetSeason, FALLBACK_SECTION,
};
use season_forecast::registry::ModelRegistry;
use season_forecast::season::{extract_season, Season, SeasonType};
use tempfile::TempDir;

const COLUMNS: [Column; 9] = [
    Column::OrderedQuantity,
    Column::CostPrice,
    Column::ListPrice,
    Column::Article,
    Column::Size,
    Column::Family,
    Column::ProductLine,
    Column::Theme,
    Column::StoreName,
];

fn record(theme: &str, family: &str, article: &str) -> SalesRecord {
    SalesRecord {
        ordered_quantity: Some(5.0),
        cost_price: Some(10.0),
        list_price: Some(25.0),
        article: Some(article.to_string()),
        size: Some("M".to_string()),
        family: Some(family.to_string()),
        product_line: Some("LINE".to_string()),
        store_name: Some("STORE".to_string()),
        theme: Some(theme.to_string()),
        season: extract_season(theme),
        ..Default::default()
    }
}

fn history() -> SalesTable {
    SalesTable::new(
        COLUMNS,
        vec![
            record("T_PV23 01", "DRESSES", "A1"),
            record("T_OI23 01", "COATS", "B1"),
            record("T_PV24 01", "DRESSES", "A2"),
            record("T_PV24 01", "SHIRTS", "A3"),
            record("T_OI24 01", "COATS", "B2"),
        ],
    )
}

/// Register a model for `season_type` that predicts `constant` everywhere
fn register_constant_model(registry: &ModelRegistry, table: &SalesTable, season_type: SeasonType, constant: f64) {
    let (x, y) = build_features(table, season_type);
    let y: Vec<f64> = y.iter().map(|_| constant).collect();
    let mut params = ParamSet::new();
    params.insert("n_estimators".to_string(), ParamValue::Int(5));
    let model = DepthwiseBoost::new().fit(&x, &y, &params).unwrap();
    let metrics = ModelMetrics {
        mape: 10.0,
        mae: 1.0,
        rmse: 1.0,
    };
    registry
        .save(&model, season_type, "DepthwiseBoost", &metrics)
        .unwrap();
}

#[test]
fn test_target_season_parsing() {
    assert_eq!("next_PV".parse::<TargetSeason>().unwrap(), TargetSeason::NextPv);
    assert_eq!("next_OI".parse::<TargetSeason>().unwrap(), TargetSeason::NextOi);
    assert!("next_XX".parse::<TargetSeason>().is_err());
    assert_eq!(TargetSeason::NextOi.to_string(), "next_OI");
}

#[test]
fn test_detect_latest_season_first_on_ties() {
    let latest = detect_latest_season(&history()).unwrap();
    assert_eq!(latest, Season::new(SeasonType::PV, 2024));

    let empty = SalesTable::new(COLUMNS, vec![]);
    assert!(matches!(
        detect_latest_season(&empty),
        Err(ForecastError::DataError(_))
    ));
}

#[test]
fn test_generate_forecast() {
    let dir = TempDir::new().unwrap();
    let registry = ModelRegistry::new(dir.path());
    let table = history();
    register_constant_model(&registry, &table, SeasonType::PV, 7.0);

    let forecast = ForecastGenerator::new(registry)
        .generate(&table, TargetSeason::NextPv)
        .unwrap();

    assert_eq!(forecast.label(), "PV25");
    assert_eq!(forecast.season, Season::new(SeasonType::PV, 2025));
    assert_eq!(forecast.total_skus(), 3);
    assert_approx_eq!(forecast.total_predicted_units(), 21.0, 1e-9);
    assert_approx_eq!(forecast.coverage(), 100.0, 1e-9);
    assert_eq!(forecast.section_column, Some(Column::Family));

    let sections: Vec<&str> = forecast.rows.iter().map(|r| r.section.as_str()).collect();
    assert_eq!(sections, vec!["DRESSES", "DRESSES", "SHIRTS"]);

    let frame = forecast.predictions_frame().unwrap();
    assert_eq!(frame.height(), 3);
    assert_eq!(
        frame.get_column_names(),
        vec![
            "SECCION",
            "Artículo",
            "Talla",
            "Cantidad_Predicha",
            "Precio Coste",
            "P.V.P.",
            "Tema"
        ]
    );
}

#[test]
fn test_predictions_are_never_negative() {
    let dir = TempDir::new().unwrap();
    let registry = ModelRegistry::new(dir.path());
    let table = history();
    register_constant_model(&registry, &table, SeasonType::OI, -5.0);

    let forecast = ForecastGenerator::new(registry)
        .generate(&table, TargetSeason::NextOi)
        .unwrap();

    assert_eq!(forecast.label(), "OI25");
    assert!(forecast.rows.iter().all(|r| r.predicted_quantity == 0.0));
    assert_eq!(forecast.coverage(), 0.0);
}

#[test]
fn test_single_valued_sections_fall_back() {
    let dir = TempDir::new().unwrap();
    let registry = ModelRegistry::new(dir.path());
    // Every OI row is in the COATS family, one product line and one store
    let table = history();
    register_constant_model(&registry, &table, SeasonType::OI, 3.0);

    let forecast = ForecastGenerator::new(registry)
        .generate(&table, TargetSeason::NextOi)
        .unwrap();

    assert_eq!(forecast.section_column, None);
    assert!(forecast.rows.iter().all(|r| r.section == FALLBACK_SECTION));
}

#[test]
fn test_missing_model_is_fatal() {
    let dir = TempDir::new().unwrap();
    let generator = ForecastGenerator::new(ModelRegistry::new(dir.path()));
    assert!(matches!(
        generator.generate(&history(), TargetSeason::NextPv),
        Err(ForecastError::ModelNotFound { .. })
    ));
}

#[test]
fn test_write_predictions_csv() {
    let dir = TempDir::new().unwrap();
    let registry = ModelRegistry::new(dir.path().join("models"));
    let table = history();
    register_constant_model(&registry, &table, SeasonType::PV, 2.0);
    let forecast = ForecastGenerator::new(registry)
        .generate(&table, TargetSeason::NextPv)
        .unwrap();

    let path = dir.path().join("predictions.csv");
    forecast.write_csv(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next().unwrap(),
        "SECCION,Artículo,Talla,Cantidad_Predicha,Precio Coste,P.V.P.,Tema"
    );
    assert_eq!(lines.count(), 3);
}
