//! Feature preparation
//!
//! Turns a raw sensor/feed table into the numeric inputs of the regression
//! pipeline:
//! - Schema validation against [`FEATURE_COLUMNS`] and [`TARGET_COLUMN`]
//! - Numeric coercion and deterministic dropping of incomplete rows
//! - Seeded train/test splitting
//! - Schema checks for inference tables

mod preparer;
mod record;
mod split;

pub use preparer::{FeaturePreparer, PreprocessReport};
pub use record::{records_to_frame, RawRecord};
pub use split::{min_test_fraction, test_row_count, Split};

use crate::error::{PredictorError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Feature columns in the order used by every feature matrix
pub const FEATURE_COLUMNS: [&str; 5] = [
    "Internal Temp",
    "Int Humidity",
    "Air Temp",
    "Wind Speed",
    "Feed Intake",
];

/// Target column holding the bird weight
pub const TARGET_COLUMN: &str = "Weight";

/// Feature columns as owned strings
pub fn feature_columns() -> Vec<String> {
    FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// Feature statistics computed over one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub name: String,
    pub count: usize,
    pub null_count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub median: Option<f64>,
}

impl FeatureStats {
    /// Create empty statistics for a column
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
            null_count: 0,
            mean: None,
            std: None,
            min: None,
            max: None,
            median: None,
        }
    }

    /// Compute statistics from a numeric column
    pub fn from_column(name: &str, column: &Column) -> Result<Self> {
        let mut stats = Self::new(name);
        stats.count = column.len();
        stats.null_count = column.null_count();

        let casted = column.cast(&DataType::Float64)?;
        let ca = casted.f64()?;
        stats.mean = ca.mean();
        stats.std = ca.std(1);
        stats.min = ca.min();
        stats.max = ca.max();
        stats.median = ca.median();

        Ok(stats)
    }
}

/// Read a numeric column of a clean table into a vector.
/// Nulls are rejected rather than replaced.
pub(crate) fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| PredictorError::SchemaError(format!("missing column '{}'", name)))?;
    let casted = column.cast(&DataType::Float64)?;
    casted
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                PredictorError::DataError(format!("column '{}' row {} is missing", name, row))
            })
        })
        .collect()
}

/// Extract named columns of a clean table into a row-major `Array2<f64>`.
pub(crate) fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|name| column_values(df, name))
        .collect::<Result<_>>()?;

    Ok(Array2::from_shape_fn((n_rows, col_names.len()), |(r, c)| col_data[c][r]))
}
