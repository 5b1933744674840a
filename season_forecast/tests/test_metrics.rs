use assert_approx_eq::assert_approx_eq;
use season_forecast::metrics::{
    evaluate, mean_absolute_error, mean_absolute_percentage_error, root_mean_squared_error,
};

#[test]
fn test_regression_metrics() {
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    assert_approx_eq!(mean_absolute_error(&actual, &predicted), 2.4, 1e-9);
    assert_approx_eq!(root_mean_squared_error(&actual, &predicted), 6f64.sqrt(), 1e-9);

    // (0.2 + 0.1 + 0.1 + 0.075 + 0.04) / 5 * 100
    assert_approx_eq!(mean_absolute_percentage_error(&actual, &predicted), 10.3, 1e-9);
}

#[test]
fn test_mape_perfect_prediction_is_zero() {
    let actual = vec![3.0, 7.0, 11.0];
    assert_eq!(mean_absolute_percentage_error(&actual, &actual), 0.0);
}

#[test]
fn test_mape_all_zero_actuals_is_hundred() {
    let actual = vec![0.0, 0.0, 0.0];
    let predicted = vec![1.0, 2.0, 3.0];
    assert_eq!(mean_absolute_percentage_error(&actual, &predicted), 100.0);
}

#[test]
fn test_mape_ignores_zero_actuals() {
    let actual = vec![0.0, 10.0];
    let predicted = vec![5.0, 15.0];
    assert_approx_eq!(mean_absolute_percentage_error(&actual, &predicted), 50.0, 1e-9);
}

#[test]
fn test_evaluate() {
    let metrics = evaluate(&[2.0, 4.0], &[2.0, 4.0]).unwrap();
    assert_eq!(metrics.mape, 0.0);
    assert_eq!(metrics.mae, 0.0);
    assert_eq!(metrics.rmse, 0.0);

    assert!(evaluate(&[], &[]).is_err());
    assert!(evaluate(&[1.0], &[1.0, 2.0]).is_err());
}
