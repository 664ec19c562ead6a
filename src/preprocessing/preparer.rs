//! Raw table validation, cleaning and feature extraction

use super::split::{min_test_fraction, Split};
use super::{columns_to_array2, feature_columns, TARGET_COLUMN};
use crate::config::{PredictorConfig, MAX_TEST_FRACTION};
use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of cleaning a raw training table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessReport {
    pub rows_in: usize,
    pub rows_out: usize,
    /// Raw-table row numbers removed because a required field was missing or non-finite
    pub dropped_rows: Vec<usize>,
}

/// Validates raw tables and turns them into feature matrices.
///
/// Only schema metadata is retained between calls; no row data is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePreparer {
    feature_columns: Vec<String>,
    target_column: String,
    random_state: Option<u64>,
}

impl Default for FeaturePreparer {
    fn default() -> Self {
        Self::new()
    }
}

impl FeaturePreparer {
    /// Create a preparer for the published feature columns
    pub fn new() -> Self {
        Self {
            feature_columns: feature_columns(),
            target_column: TARGET_COLUMN.to_string(),
            random_state: PredictorConfig::default().random_state,
        }
    }

    /// Create a preparer using the seed policy of a configuration
    pub fn from_config(config: &PredictorConfig) -> Self {
        Self::new().with_random_state(config.random_state)
    }

    /// Set (or clear) the seed used for train/test shuffling
    pub fn with_random_state(mut self, seed: Option<u64>) -> Self {
        self.random_state = seed;
        self
    }

    /// Feature columns in matrix order
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Name of the target column
    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// Seed used for splitting
    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }

    /// Number of features per row
    pub fn n_features(&self) -> usize {
        self.feature_columns.len()
    }

    fn required_columns(&self) -> Vec<String> {
        let mut cols = self.feature_columns.clone();
        cols.push(self.target_column.clone());
        cols
    }

    /// Validate and clean a raw training table
    pub fn preprocess(&self, df: &DataFrame) -> Result<DataFrame> {
        self.preprocess_with_report(df).map(|(clean, _)| clean)
    }

    /// Validate and clean a raw training table, reporting which rows were dropped.
    ///
    /// The result holds exactly the feature columns followed by the target,
    /// all `Float64` and free of nulls.
    pub fn preprocess_with_report(&self, df: &DataFrame) -> Result<(DataFrame, PreprocessReport)> {
        let start = Instant::now();
        let required = self.required_columns();
        check_columns_present(df, &required)?;

        let coerced: Vec<Vec<Option<f64>>> = required
            .iter()
            .map(|name| coerce_column(df, name))
            .collect::<Result<_>>()?;

        let n_rows = df.height();
        let keep: Vec<bool> = (0..n_rows)
            .map(|row| {
                coerced
                    .iter()
                    .all(|col| matches!(col[row], Some(v) if v.is_finite()))
            })
            .collect();
        let dropped_rows: Vec<usize> = (0..n_rows).filter(|&row| !keep[row]).collect();

        let columns: Vec<Column> = required
            .iter()
            .zip(coerced)
            .map(|(name, values)| {
                let kept: Vec<f64> = values
                    .into_iter()
                    .zip(keep.iter())
                    .filter_map(|(v, &k)| if k { v } else { None })
                    .collect();
                Column::new(name.as_str().into(), kept)
            })
            .collect();
        let clean = DataFrame::new(columns)?;

        if !dropped_rows.is_empty() {
            warn!(
                dropped = dropped_rows.len(),
                rows_in = n_rows,
                "Dropped rows with missing or non-finite required values"
            );
        }
        info!(
            rows_in = n_rows,
            rows_out = clean.height(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Preprocessed training table"
        );

        let report = PreprocessReport {
            rows_in: n_rows,
            rows_out: clean.height(),
            dropped_rows,
        };
        Ok((clean, report))
    }

    /// Split a clean table into train and test matrices.
    ///
    /// `test_fraction` must lie in `[max(0.1, 1/n), 0.4]` so that the test
    /// side receives at least one row.
    pub fn prepare_features(&self, clean: &DataFrame, test_fraction: f64) -> Result<Split> {
        let n_rows = clean.height();
        if n_rows < 2 {
            return Err(PredictorError::InsufficientDataError(format!(
                "need at least 2 rows to split, got {}",
                n_rows
            )));
        }

        let lower = min_test_fraction(n_rows);
        if !test_fraction.is_finite()
            || test_fraction <= 0.0
            || test_fraction > MAX_TEST_FRACTION
            || test_fraction < lower
        {
            return Err(PredictorError::InvalidSplitError(format!(
                "test fraction {} outside [{:.4}, {}] for {} rows",
                test_fraction, lower, MAX_TEST_FRACTION, n_rows
            )));
        }

        let (x, y) = self.extract_xy(clean)?;
        let split = Split::new(&x, &y, test_fraction, self.random_state);

        debug!(
            n_train = split.n_train(),
            n_test = split.n_test(),
            test_fraction,
            seeded = self.random_state.is_some(),
            "Prepared train/test split"
        );
        Ok(split)
    }

    /// Feature matrix and target vector of a clean table, without splitting
    pub fn extract_xy(&self, clean: &DataFrame) -> Result<(Array2<f64>, Array1<f64>)> {
        check_columns_present(clean, &self.required_columns())?;
        let x = columns_to_array2(clean, &self.feature_columns)?;
        let y = Array1::from(super::column_values(clean, &self.target_column)?);
        Ok((x, y))
    }

    /// Validate a prediction table against the feature schema and build its matrix.
    ///
    /// Rows are never dropped here: a missing value is an error so that
    /// predictions stay aligned with the input rows. A target column, if
    /// present, is ignored.
    pub fn features_for_inference(&self, df: &DataFrame) -> Result<Array2<f64>> {
        check_columns_present(df, &self.feature_columns)?;
        if df.height() == 0 {
            return Err(PredictorError::EmptyDataError(
                "prediction table has no rows".to_string(),
            ));
        }

        let col_data: Vec<Vec<f64>> = self
            .feature_columns
            .iter()
            .map(|name| {
                coerce_column(df, name)?
                    .into_iter()
                    .enumerate()
                    .map(|(row, v)| match v {
                        Some(v) if v.is_finite() => Ok(v),
                        _ => Err(PredictorError::DataError(format!(
                            "column '{}' row {} is missing or not finite",
                            name, row
                        ))),
                    })
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<_>>()?;

        Ok(Array2::from_shape_fn(
            (df.height(), self.feature_columns.len()),
            |(r, c)| col_data[c][r],
        ))
    }
}

fn check_columns_present(df: &DataFrame, required: &[String]) -> Result<()> {
    let present: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    let missing: Vec<&str> = required
        .iter()
        .filter(|name| !present.contains(name))
        .map(|name| name.as_str())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PredictorError::SchemaError(format!(
            "missing required columns: {}",
            missing.join(", ")
        )))
    }
}

/// Read a column as `Option<f64>` per row. `None` marks a missing value;
/// a present value that cannot be read as a number is an error.
fn coerce_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| PredictorError::SchemaError(format!("missing column '{}'", name)))?;

    match column.dtype() {
        DataType::Float64 => Ok(column.f64()?.into_iter().collect()),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 |
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 |
        DataType::Float32 => {
            let casted = column.cast(&DataType::Float64)?;
            Ok(casted.f64()?.into_iter().collect())
        }
        DataType::String => column
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| match value.map(str::trim) {
                None | Some("") => Ok(None),
                Some(text) => text.parse::<f64>().map(Some).map_err(|_| {
                    PredictorError::DataError(format!(
                        "column '{}' row {}: '{}' is not numeric",
                        name, row, text
                    ))
                }),
            })
            .collect(),
        DataType::Null => Ok(vec![None; column.len()]),
        other => Err(PredictorError::DataError(format!(
            "column '{}' has non-numeric type {}",
            name, other
        ))),
    }
}
