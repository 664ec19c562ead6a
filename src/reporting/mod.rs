//! Evaluation reporting
//!
//! Per-row error breakdowns, bounded previews and plain-text renderings of
//! metrics and feature importance. Everything here is plain serializable data
//! so that a chart or UI layer can consume it directly.

use crate::config::{PredictorConfig, MAX_PREVIEW_ROWS};
use crate::error::{PredictorError, Result};
use crate::training::{FeatureImportance, RegressionMetrics};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative error of one prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RelativeError {
    /// `|actual - predicted| / |actual| * 100`.
    ///
    /// The magnitude of `actual` is used, so a negative actual still yields a
    /// non-negative percentage.
    Percent(f64),
    /// The actual value is zero
    Undefined,
}

impl RelativeError {
    fn compute(actual: f64, absolute_error: f64) -> Self {
        if actual == 0.0 {
            RelativeError::Undefined
        } else {
            RelativeError::Percent(absolute_error / actual.abs() * 100.0)
        }
    }

    pub fn percent(&self) -> Option<f64> {
        match self {
            RelativeError::Percent(p) => Some(*p),
            RelativeError::Undefined => None,
        }
    }
}

impl fmt::Display for RelativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelativeError::Percent(p) => write!(f, "{:.2}%", p),
            RelativeError::Undefined => write!(f, "n/a"),
        }
    }
}

/// Actual versus predicted for one record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub actual: f64,
    pub predicted: f64,
    pub absolute_error: f64,
    pub relative_error: RelativeError,
}

/// Everything a front end needs to present a finished training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub metrics: RegressionMetrics,
    pub preview: Vec<PredictionRow>,
    pub importance: Vec<FeatureImportance>,
    pub n_train: usize,
    pub n_test: usize,
    pub test_fraction: f64,
}

impl TrainingReport {
    /// Render the report as text
    pub fn render(&self) -> String {
        let mut report = String::new();
        report.push_str("=== Poultry Weight Training Report ===\n\n");

        report.push_str("--- Data Split ---\n");
        report.push_str(&format!("Train rows:    {}\n", self.n_train));
        report.push_str(&format!("Test rows:     {}\n", self.n_test));
        report.push_str(&format!("Test fraction: {:.2}\n\n", self.test_fraction));

        report.push_str("--- Metrics Summary ---\n");
        report.push_str(&MetricsReporter::metrics_summary(&self.metrics));
        report.push('\n');

        report.push_str("--- Prediction Preview ---\n");
        report.push_str(&MetricsReporter::preview_table(&self.preview));
        report.push('\n');

        report.push_str("--- Feature Importance ---\n");
        report.push_str(&MetricsReporter::importance_table(&self.importance, None));
        report
    }
}

/// Builds breakdowns and previews from actuals and predictions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsReporter {
    preview_rows: usize,
}

impl Default for MetricsReporter {
    fn default() -> Self {
        Self {
            preview_rows: MAX_PREVIEW_ROWS,
        }
    }
}

impl MetricsReporter {
    /// Create a reporter showing at most `preview_rows` rows (never more than 10)
    pub fn new(preview_rows: usize) -> Result<Self> {
        if preview_rows == 0 {
            return Err(PredictorError::invalid_parameter(
                "preview_rows",
                preview_rows,
                "must be at least 1",
            ));
        }
        Ok(Self {
            preview_rows: preview_rows.min(MAX_PREVIEW_ROWS),
        })
    }

    pub fn from_config(config: &PredictorConfig) -> Result<Self> {
        Self::new(config.preview_rows)
    }

    pub fn preview_rows(&self) -> usize {
        self.preview_rows
    }

    /// One row per record
    pub fn error_breakdown(
        &self,
        actuals: &Array1<f64>,
        predictions: &Array1<f64>,
    ) -> Result<Vec<PredictionRow>> {
        if actuals.len() != predictions.len() {
            return Err(PredictorError::SchemaMismatch {
                expected: format!("{} predictions", actuals.len()),
                actual: format!("{} predictions", predictions.len()),
            });
        }

        Ok(actuals
            .iter()
            .zip(predictions.iter())
            .map(|(&actual, &predicted)| {
                let absolute_error = (actual - predicted).abs();
                PredictionRow {
                    actual,
                    predicted,
                    absolute_error,
                    relative_error: RelativeError::compute(actual, absolute_error),
                }
            })
            .collect())
    }

    /// The first rows of the breakdown
    pub fn preview(
        &self,
        actuals: &Array1<f64>,
        predictions: &Array1<f64>,
    ) -> Result<Vec<PredictionRow>> {
        let mut rows = self.error_breakdown(actuals, predictions)?;
        rows.truncate(self.preview_rows);
        Ok(rows)
    }

    /// Assemble a [`TrainingReport`]
    pub fn training_report(
        &self,
        metrics: RegressionMetrics,
        actuals: &Array1<f64>,
        predictions: &Array1<f64>,
        importance: Vec<FeatureImportance>,
        n_train: usize,
        test_fraction: f64,
    ) -> Result<TrainingReport> {
        Ok(TrainingReport {
            metrics,
            preview: self.preview(actuals, predictions)?,
            importance,
            n_train,
            n_test: actuals.len(),
            test_fraction,
        })
    }

    /// MSE and RMSE to 2 decimals, R² to 4
    pub fn metrics_summary(metrics: &RegressionMetrics) -> String {
        format!(
            "MSE:       {:.2}\nRMSE:      {:.2}\nMAE:       {:.2}\nR²:        {:.4}\nSamples:   {}\n",
            metrics.mse, metrics.rmse, metrics.mae, metrics.r2, metrics.n_samples
        )
    }

    /// Ranked importances, optionally limited to the top `limit`
    pub fn importance_table(importance: &[FeatureImportance], limit: Option<usize>) -> String {
        let shown = limit.unwrap_or(importance.len()).min(importance.len());
        let width = importance[..shown]
            .iter()
            .map(|f| f.feature.chars().count())
            .max()
            .unwrap_or(0)
            .max("Feature".len());

        let mut table = format!("  {:<width$}  {:>12}\n", "Feature", "Importance", width = width);
        for f in &importance[..shown] {
            table.push_str(&format!(
                "  {:<width$}  {:>12.4}\n",
                f.feature,
                f.importance,
                width = width
            ));
        }
        if shown < importance.len() {
            table.push_str(&format!("  ... {} more\n", importance.len() - shown));
        }
        table
    }

    pub fn preview_table(rows: &[PredictionRow]) -> String {
        let mut table = format!(
            "  {:>10}  {:>10}  {:>14}  {:>18}\n",
            "Actual", "Predicted", "Absolute Error", "Relative Error (%)"
        );
        for row in rows {
            table.push_str(&format!(
                "  {:>10.2}  {:>10.2}  {:>14.2}  {:>18}\n",
                row.actual,
                row.predicted,
                row.absolute_error,
                row.relative_error.to_string()
            ));
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn metrics() -> RegressionMetrics {
        RegressionMetrics {
            mse: 1.23456,
            rmse: 1.11111,
            mae: 0.98765,
            r2: 0.876543,
            n_samples: 20,
        }
    }

    #[test]
    fn test_error_breakdown() {
        let reporter = MetricsReporter::default();
        let rows = reporter
            .error_breakdown(&array![2.0, 0.0, 4.0], &array![1.5, 0.5, 5.0])
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].absolute_error, 0.5);
        assert_eq!(rows[0].relative_error, RelativeError::Percent(25.0));
        assert_eq!(rows[1].relative_error, RelativeError::Undefined);
        assert_eq!(rows[2].relative_error.percent(), Some(25.0));
    }

    #[test]
    fn test_relative_error_uses_magnitude() {
        let rows = MetricsReporter::default()
            .error_breakdown(&array![-2.0], &array![-1.5])
            .unwrap();
        assert_eq!(rows[0].relative_error, RelativeError::Percent(25.0));
    }

    #[test]
    fn test_breakdown_length_mismatch() {
        let reporter = MetricsReporter::default();
        let err = reporter
            .error_breakdown(&array![1.0, 2.0], &array![1.0])
            .unwrap_err();
        assert!(matches!(err, PredictorError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_preview_is_bounded() {
        let actuals = Array1::from_iter((1..=25).map(f64::from));
        let predictions = &actuals + 1.0;

        let rows = MetricsReporter::default().preview(&actuals, &predictions).unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].actual, 1.0);

        let reporter = MetricsReporter::new(50).unwrap();
        assert_eq!(reporter.preview_rows(), 10);

        let reporter = MetricsReporter::new(3).unwrap();
        assert_eq!(reporter.preview(&actuals, &predictions).unwrap().len(), 3);

        let few = array![1.0, 2.0];
        assert_eq!(MetricsReporter::default().preview(&few, &few).unwrap().len(), 2);

        assert!(MetricsReporter::new(0).is_err());
    }

    #[test]
    fn test_metrics_summary_precision() {
        let text = MetricsReporter::metrics_summary(&metrics());
        assert!(text.contains("MSE:       1.23"));
        assert!(text.contains("RMSE:      1.11"));
        assert!(text.contains("R²:        0.8765"));
    }

    #[test]
    fn test_importance_table_limit() {
        let importance = vec![
            FeatureImportance { feature: "Feed Intake".to_string(), importance: 0.9 },
            FeatureImportance { feature: "Air Temp^2".to_string(), importance: 0.4 },
            FeatureImportance { feature: "Wind Speed".to_string(), importance: 0.1 },
        ];
        let table = MetricsReporter::importance_table(&importance, Some(2));
        assert!(table.contains("Feed Intake"));
        assert!(table.contains("Air Temp^2"));
        assert!(!table.contains("Wind Speed"));
        assert!(table.contains("1 more"));
    }

    #[test]
    fn test_training_report_render() {
        let reporter = MetricsReporter::default();
        let report = reporter
            .training_report(metrics(), &array![2.0, 0.0], &array![1.0, 0.5], Vec::new(), 8, 0.2)
            .unwrap();
        assert_eq!(report.n_test, 2);

        let text = report.render();
        assert!(text.contains("Train rows:    8"));
        assert!(text.contains("n/a"));
        assert!(text.contains("50.00%"));
    }
}
