//! Exploratory statistics over a clean training table

use crate::error::{PredictorError, Result};
use crate::preprocessing::{column_values, feature_columns, FeatureStats, TARGET_COLUMN};
use ndarray::{Array2, ArrayView1};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-column summary statistics for every column of `df`
pub fn describe(df: &DataFrame) -> Result<Vec<FeatureStats>> {
    df.get_columns()
        .iter()
        .map(|col| FeatureStats::from_column(col.name().as_str(), col))
        .collect()
}

/// Symmetric Pearson correlation matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

impl CorrelationMatrix {
    /// Correlation between two named columns
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[[i, j]])
    }
}

/// Pearson correlation across the feature columns and the target
pub fn correlation_matrix(df: &DataFrame) -> Result<CorrelationMatrix> {
    let mut columns = feature_columns();
    columns.push(TARGET_COLUMN.to_string());
    correlation_matrix_for(df, &columns)
}

/// Pearson correlation across `columns`.
///
/// A zero-variance column correlates 0 with every other column and 1 with itself.
pub fn correlation_matrix_for(df: &DataFrame, columns: &[String]) -> Result<CorrelationMatrix> {
    let data: Vec<Vec<f64>> = columns
        .iter()
        .map(|name| column_values(df, name))
        .collect::<Result<_>>()?;

    let k = columns.len();
    let mut values = Array2::<f64>::eye(k);
    for i in 0..k {
        for j in (i + 1)..k {
            let r = pearson(
                ArrayView1::from(data[i].as_slice()),
                ArrayView1::from(data[j].as_slice()),
            );
            values[[i, j]] = r;
            values[[j, i]] = r;
        }
    }

    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    })
}

fn pearson(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let n = x.len() as f64;
    if n < 2.0 {
        return 0.0;
    }

    let x_mean = x.mean().unwrap_or(0.0);
    let y_mean = y.mean().unwrap_or(0.0);

    let x_std = (x.iter().map(|&v| (v - x_mean).powi(2)).sum::<f64>() / n).sqrt();
    let y_std = (y.iter().map(|&v| (v - y_mean).powi(2)).sum::<f64>() / n).sqrt();
    if x_std <= 0.0 || y_std <= 0.0 {
        return 0.0;
    }

    let covariance: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(&a, &b)| (a - x_mean) * (b - y_mean))
        .sum::<f64>()
        / n;

    (covariance / (x_std * y_std)).clamp(-1.0, 1.0)
}

/// Rows of one column outside Tukey's fences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    pub outlier_rows: Vec<usize>,
}

impl OutlierReport {
    pub fn n_outliers(&self) -> usize {
        self.outlier_rows.len()
    }
}

/// Flag values outside `[Q1 - k*IQR, Q3 + k*IQR]`
pub fn detect_outliers(df: &DataFrame, column: &str, k: f64) -> Result<OutlierReport> {
    if !(k.is_finite() && k > 0.0) {
        return Err(PredictorError::invalid_parameter(
            "k",
            k,
            "IQR multiplier must be positive",
        ));
    }

    let values = column_values(df, column)?;
    if values.is_empty() {
        return Err(PredictorError::EmptyDataError(format!(
            "column '{}' has no rows",
            column
        )));
    }

    let ca = Float64Chunked::from_vec(column.into(), values.clone());
    let quantile = |q: f64| -> Result<f64> {
        ca.quantile(q, QuantileMethod::Linear)?.ok_or_else(|| {
            PredictorError::ComputationError(format!("no quantile for column '{}'", column))
        })
    };
    let q1 = quantile(0.25)?;
    let q3 = quantile(0.75)?;
    let iqr = q3 - q1;
    let lower_fence = q1 - k * iqr;
    let upper_fence = q3 + k * iqr;

    let outlier_rows = values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v < lower_fence || v > upper_fence)
        .map(|(row, _)| row)
        .collect();

    Ok(OutlierReport {
        column: column.to_string(),
        q1,
        q3,
        lower_fence,
        upper_fence,
        outlier_rows,
    })
}
