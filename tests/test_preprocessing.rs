//! Integration test: feature preparation end-to-end

use poultry_weight::preprocessing::{FeaturePreparer, FEATURE_COLUMNS, TARGET_COLUMN};
use poultry_weight::PredictorError;
use polars::prelude::*;
use std::collections::HashSet;

fn raw_df() -> DataFrame {
    df!(
        "Date" => &["d1", "d2", "d3", "d4", "d5", "d6", "d7", "d8", "d9", "d10"],
        "Feed Intake" => &[100.0, 102.0, 104.0, 106.0, 108.0, 110.0, 112.0, 114.0, 116.0, 118.0],
        "Internal Temp" => &[29.0, 29.5, 30.0, 30.5, 31.0, 31.5, 32.0, 32.5, 33.0, 33.5],
        "Int Humidity" => &[60.0, 61.0, 59.0, 62.0, 63.0, 58.0, 64.0, 60.5, 61.5, 62.5],
        "Air Temp" => &[24.0, 24.5, 25.0, 23.5, 26.0, 25.5, 24.8, 25.2, 26.1, 23.9],
        "Wind Speed" => &[2.0, 2.5, 3.0, 1.5, 2.2, 2.8, 3.1, 1.9, 2.4, 2.6],
        "Weight" => &[1.50, 1.55, 1.61, 1.66, 1.70, 1.76, 1.80, 1.86, 1.91, 1.95]
    )
    .unwrap()
}

#[test]
fn test_preprocess_orders_required_columns() {
    let preparer = FeaturePreparer::new();
    let clean = preparer.preprocess(&raw_df()).unwrap();

    let names: Vec<String> = clean
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();
    let mut expected: Vec<String> = FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect();
    expected.push(TARGET_COLUMN.to_string());

    assert_eq!(names, expected, "extra columns dropped and required ones reordered");
    assert_eq!(clean.height(), 10, "complete rows must all be kept");
}

#[test]
fn test_preprocess_names_every_missing_column() {
    let df = raw_df().drop("Air Temp").unwrap().drop("Weight").unwrap();
    let err = FeaturePreparer::new().preprocess(&df).unwrap_err();

    match err {
        PredictorError::SchemaError(msg) => {
            assert!(msg.contains("Air Temp"), "message should name Air Temp: {}", msg);
            assert!(msg.contains("Weight"), "message should name Weight: {}", msg);
        }
        other => panic!("expected SchemaError, got {:?}", other),
    }
}

#[test]
fn test_preprocess_rejects_non_numeric_values() {
    let mut df = raw_df();
    df.with_column(Column::new(
        "Wind Speed".into(),
        &["2.0", "2.5", "windy", "1.5", "2.2", "2.8", "3.1", "1.9", "2.4", "2.6"],
    ))
    .unwrap();

    let err = FeaturePreparer::new().preprocess(&df).unwrap_err();
    assert!(
        matches!(&err, PredictorError::DataError(msg) if msg.contains("Wind Speed")),
        "unexpected error: {:?}",
        err
    );
}

#[test]
fn test_preprocess_coerces_numeric_text_and_integers() {
    let mut df = raw_df();
    df.with_column(Column::new(
        "Wind Speed".into(),
        &["2.0", " 2.5", "3", "1.5", "2.2", "2.8", "3.1", "1.9", "2.4", "2.6 "],
    ))
    .unwrap();
    df.with_column(Column::new(
        "Int Humidity".into(),
        &[60i64, 61, 59, 62, 63, 58, 64, 60, 61, 62],
    ))
    .unwrap();

    let clean = FeaturePreparer::new().preprocess(&df).unwrap();
    assert_eq!(clean.height(), 10);
    assert_eq!(clean.column("Wind Speed").unwrap().dtype(), &DataType::Float64);
    assert_eq!(clean.column("Int Humidity").unwrap().dtype(), &DataType::Float64);
}

#[test]
fn test_preprocess_drops_incomplete_rows() {
    let mut df = raw_df();
    df.with_column(Column::new(
        "Weight".into(),
        &[Some(1.5), None, Some(1.61), Some(1.66), Some(f64::NAN), Some(1.76), Some(1.8), Some(1.86), Some(1.91), Some(1.95)],
    ))
    .unwrap();

    let (clean, report) = FeaturePreparer::new().preprocess_with_report(&df).unwrap();
    assert_eq!(report.rows_in, 10);
    assert_eq!(report.rows_out, 8);
    assert_eq!(report.dropped_rows, vec![1, 4]);
    assert_eq!(clean.height(), 8);
}

#[test]
fn test_split_sizes_and_disjointness() {
    let preparer = FeaturePreparer::new();
    let clean = preparer.preprocess(&raw_df()).unwrap();
    let split = preparer.prepare_features(&clean, 0.3).unwrap();

    assert_eq!(split.n_test(), 3, "ceil(0.3 * 10) test rows");
    assert_eq!(split.n_train() + split.n_test(), 10);
    assert_eq!(split.x_train.ncols(), 5);

    let train: HashSet<usize> = split.train_indices.iter().copied().collect();
    let test: HashSet<usize> = split.test_indices.iter().copied().collect();
    assert!(train.is_disjoint(&test));
}

#[test]
fn test_split_is_reproducible_with_seed() {
    let preparer = FeaturePreparer::new().with_random_state(Some(2024));
    let clean = preparer.preprocess(&raw_df()).unwrap();

    let a = preparer.prepare_features(&clean, 0.2).unwrap();
    let b = preparer.prepare_features(&clean, 0.2).unwrap();
    assert_eq!(a.test_indices, b.test_indices);
    assert_eq!(a.x_test, b.x_test);
}

#[test]
fn test_split_boundaries() {
    let preparer = FeaturePreparer::new();
    let clean = preparer.preprocess(&raw_df()).unwrap();

    for bad in [0.0, -0.1, 0.05, 0.41, 0.5, f64::NAN] {
        assert!(
            matches!(
                preparer.prepare_features(&clean, bad),
                Err(PredictorError::InvalidSplitError(_))
            ),
            "fraction {} should be rejected",
            bad
        );
    }
    assert!(preparer.prepare_features(&clean, 0.1).is_ok());
    assert!(preparer.prepare_features(&clean, 0.4).is_ok());

    // With 4 rows the lower bound is 1/4
    let small = clean.head(Some(4));
    assert!(matches!(
        preparer.prepare_features(&small, 0.2),
        Err(PredictorError::InvalidSplitError(_))
    ));
    assert_eq!(preparer.prepare_features(&small, 0.25).unwrap().n_test(), 1);

    let single = clean.head(Some(1));
    assert!(matches!(
        preparer.prepare_features(&single, 0.2),
        Err(PredictorError::InsufficientDataError(_))
    ));
}

#[test]
fn test_inference_schema_checks() {
    let preparer = FeaturePreparer::new();

    let without_weight = raw_df().drop("Weight").unwrap();
    let x = preparer.features_for_inference(&without_weight).unwrap();
    assert_eq!(x.dim(), (10, 5));
    assert_eq!(x[[0, 4]], 100.0, "Feed Intake is the fifth feature");

    let missing = without_weight.drop("Feed Intake").unwrap();
    assert!(matches!(
        preparer.features_for_inference(&missing),
        Err(PredictorError::SchemaError(_))
    ));

    let empty = without_weight.head(Some(0));
    assert!(matches!(
        preparer.features_for_inference(&empty),
        Err(PredictorError::EmptyDataError(_))
    ));
}
