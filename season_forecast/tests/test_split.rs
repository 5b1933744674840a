use season_forecast::features::{FeatureMatrix, NamedFeature, SEASON_YEAR};
use season_forecast::split::temporal_split;

fn matrix(years: &[f64]) -> FeatureMatrix {
    let ids: Vec<f64> = (0..years.len()).map(|i| i as f64).collect();
    FeatureMatrix::new(vec![
        NamedFeature::numeric("id", ids),
        NamedFeature::numeric(SEASON_YEAR, years.to_vec()),
    ])
    .unwrap()
}

#[test]
fn test_temporal_split_is_chronological_and_stable() {
    let years = [2024.0, 2022.0, 2023.0, 2022.0, 2024.0, 2023.0, 2022.0, 2023.0, 2024.0, 2022.0];
    let x = matrix(&years);
    let y: Vec<f64> = (0..10).map(|i| i as f64 * 10.0).collect();

    let split = temporal_split(&x, &y, 0.2).unwrap();
    assert_eq!(split.x_train.n_rows(), 8);
    assert_eq!(split.x_test.n_rows(), 2);

    let mut ids = split.x_train.numeric("id").unwrap().to_vec();
    ids.extend_from_slice(split.x_test.numeric("id").unwrap());
    // Stable sort by year: 2022 rows, then 2023, then 2024, each in input order
    assert_eq!(ids, vec![1.0, 3.0, 6.0, 9.0, 2.0, 5.0, 7.0, 0.0, 4.0, 8.0]);

    let mut targets = split.y_train.clone();
    targets.extend_from_slice(&split.y_test);
    let expected: Vec<f64> = ids.iter().map(|id| id * 10.0).collect();
    assert_eq!(targets, expected);

    let last_train = split.x_train.season_years().unwrap().iter().cloned().fold(f64::MIN, f64::max);
    assert!(split.x_test.season_years().unwrap().iter().all(|&y| y >= last_train));
}

#[test]
fn test_temporal_split_floors_train_size() {
    let x = matrix(&[2020.0, 2021.0, 2022.0, 2023.0, 2024.0, 2025.0, 2026.0]);
    let y = vec![1.0; 7];
    let split = temporal_split(&x, &y, 0.2).unwrap();
    // floor(7 * 0.8) = 5
    assert_eq!(split.y_train.len(), 5);
    assert_eq!(split.y_test.len(), 2);
}

#[test]
fn test_temporal_split_rejects_bad_inputs() {
    let x = matrix(&[2020.0, 2021.0]);
    assert!(temporal_split(&x, &[1.0, 2.0], 0.0).is_err());
    assert!(temporal_split(&x, &[1.0, 2.0], 1.0).is_err());
    assert!(temporal_split(&x, &[1.0], 0.5).is_err());

    let no_year = FeatureMatrix::new(vec![NamedFeature::numeric("id", vec![1.0])]).unwrap();
    assert!(temporal_split(&no_year, &[1.0], 0.5).is_err());
}
