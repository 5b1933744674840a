use season_forecast::config::TrainingConfig;
use season_forecast::error::{ForecastError, Result};
use season_forecast::features::{build_features, FeatureMatrix};
use season_forecast::models::{
    DepthwiseBoost, OrderedBoost, ParamSet, RegressorFamily, SearchSpace, SeasonModel,
};
use season_forecast::season::{extract_season, SeasonType};
use season_forecast::data::{Column, SalesRecord, SalesTable};
use season_forecast::training::ModelTrainer;

fn history(rows_per_year: usize) -> SalesTable {
    let mut records = Vec::new();
    for (year, theme) in [(22, "T_PV22 01"), (23, "T_PV23 01"), (24, "T_PV24 01")] {
        for i in 0..rows_per_year {
            let price = 10.0 + (i % 5) as f64 * 5.0;
            let size = ["S", "M", "L"][i % 3];
            let quantity = 40.0 - price + if size == "M" { 6.0 } else { 0.0 } + (year - 22) as f64;
            records.push(SalesRecord {
                ordered_quantity: Some(quantity),
                cost_price: Some(price / 2.0),
                list_price: Some(price),
                cost_amount: Some(quantity * price / 2.0),
                article: Some(format!("ART{}", i % 7)),
                size: Some(size.to_string()),
                theme: Some(theme.to_string()),
                season: extract_season(theme),
                ..Default::default()
            });
        }
    }
    SalesTable::new(
        [
            Column::OrderedQuantity,
            Column::CostPrice,
            Column::ListPrice,
            Column::CostAmount,
            Column::Article,
            Column::Size,
            Column::Theme,
        ],
        records,
    )
}

fn small_families() -> Vec<Box<dyn RegressorFamily>> {
    vec![
        Box::new(
            OrderedBoost::new(42).with_search_space(
                SearchSpace::new()
                    .with_ints("depth", &[2, 3])
                    .with_floats("learning_rate", &[0.1])
                    .with_ints("iterations", &[30])
                    .with_ints("l2_leaf_reg", &[3]),
            ),
        ),
        Box::new(
            DepthwiseBoost::new().with_search_space(
                SearchSpace::new()
                    .with_ints("max_depth", &[2, 3])
                    .with_floats("learning_rate", &[0.1])
                    .with_ints("n_estimators", &[30])
                    .with_floats("reg_alpha", &[0.0])
                    .with_floats("reg_lambda", &[1.0]),
            ),
        ),
    ]
}

struct FailingFamily;

impl RegressorFamily for FailingFamily {
    fn name(&self) -> &'static str {
        "Failing"
    }

    fn search_space(&self) -> SearchSpace {
        SearchSpace::new().with_ints("depth", &[1])
    }

    fn fit(&self, _x: &FeatureMatrix, _y: &[f64], _params: &ParamSet) -> Result<SeasonModel> {
        Err(ForecastError::ModelError("fit always fails".to_string()))
    }
}

#[test]
fn test_default_search_spaces() {
    assert_eq!(OrderedBoost::new(42).search_space().size(), 81);
    assert_eq!(DepthwiseBoost::new().search_space().size(), 243);
}

#[test]
fn test_train_season_selects_lowest_mape() {
    let table = history(20);
    let (x, y) = build_features(&table, SeasonType::PV);
    let trainer = ModelTrainer::with_families(TrainingConfig::default(), small_families()).unwrap();

    let trained = trainer.train_season(&x, &y, SeasonType::PV).unwrap();

    assert_eq!(trained.samples, 60);
    assert_eq!(trained.candidates.len(), 2);
    let best = trained
        .candidates
        .iter()
        .map(|c| c.metrics.mape)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(trained.metrics.mape, best);
    assert_eq!(trained.model.family(), trained.model_name);
    for candidate in &trained.candidates {
        assert!(candidate.metrics.mape.is_finite());
        assert!(candidate.cv_score <= 0.0);
        assert!(candidate.best_params.contains_key("learning_rate"));
    }
}

#[test]
fn test_failing_family_is_excluded() {
    let table = history(10);
    let (x, y) = build_features(&table, SeasonType::PV);
    let mut families = small_families();
    families.truncate(1);
    families.push(Box::new(FailingFamily));
    let trainer = ModelTrainer::with_families(TrainingConfig::default(), families).unwrap();

    let trained = trainer.train_season(&x, &y, SeasonType::PV).unwrap();
    assert_eq!(trained.model_name, "OrderedBoost");
    assert_eq!(trained.candidates.len(), 1);
}

#[test]
fn test_all_families_failing_is_fatal() {
    let table = history(10);
    let (x, y) = build_features(&table, SeasonType::PV);
    let trainer =
        ModelTrainer::with_families(TrainingConfig::default(), vec![Box::new(FailingFamily)])
            .unwrap();

    match trainer.train_season(&x, &y, SeasonType::PV) {
        Err(ForecastError::TrainingFailed {
            season_type,
            failures,
        }) => {
            assert_eq!(season_type, "PV");
            assert_eq!(failures.len(), 1);
            assert!(failures[0].contains("fit always fails"));
        }
        other => panic!("expected TrainingFailed, got {:?}", other.map(|t| t.model_name)),
    }
}

#[test]
fn test_too_few_rows_for_cross_validation() {
    let table = history(1);
    let (x, y) = build_features(&table, SeasonType::PV);
    let trainer = ModelTrainer::with_families(TrainingConfig::default(), small_families()).unwrap();
    assert!(matches!(
        trainer.train_season(&x, &y, SeasonType::PV),
        Err(ForecastError::TrainingFailed { .. })
    ));
}

#[test]
fn test_trainer_rejects_bad_configuration() {
    let config = TrainingConfig {
        cv_folds: 1,
        ..Default::default()
    };
    assert!(ModelTrainer::new(config).is_err());
    assert!(ModelTrainer::with_families(TrainingConfig::default(), Vec::new()).is_err());
}

#[test]
fn test_season_model_survives_serialization() {
    let table = history(10);
    let (x, y) = build_features(&table, SeasonType::PV);
    let family = DepthwiseBoost::new();
    let mut params = ParamSet::new();
    params.insert("n_estimators".to_string(), season_forecast::models::ParamValue::Int(20));
    let model = family.fit(&x, &y, &params).unwrap();

    let json = serde_json::to_string(&model).unwrap();
    assert!(json.contains("\"family\":\"DepthwiseBoost\""));
    let restored: SeasonModel = serde_json::from_str(&json).unwrap();

    let before = model.predict(&x).unwrap();
    let after = restored.predict(&x).unwrap();
    for (a, b) in before.iter().zip(&after) {
        assert!((a - b).abs() < 1e-9);
    }
}
