//! Polynomial regression pipeline

use super::linear_models::{fit_ols, Coefficients};
use super::models::RegressionMetrics;
use super::polynomial::{ExpansionConfig, PolynomialFeatures};
use crate::config::PredictorConfig;
use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Absolute coefficient of one expanded term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Fitted expansion plus the coefficients learned over it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    expansion: PolynomialFeatures,
    coefficients: Coefficients,
}

impl FittedModel {
    pub fn expansion(&self) -> &PolynomialFeatures {
        &self.expansion
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }
}

/// Lifecycle of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineState {
    Untrained,
    Trained(FittedModel),
}

/// Polynomial expansion followed by ordinary least squares.
///
/// A new pipeline is untrained. [`train`](Self::train) moves it to the
/// trained state and may be called again to replace every coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionPipeline {
    config: ExpansionConfig,
    state: PipelineState,
}

impl Default for RegressionPipeline {
    fn default() -> Self {
        Self::new(ExpansionConfig::default())
    }
}

impl RegressionPipeline {
    /// Create an untrained pipeline
    pub fn new(config: ExpansionConfig) -> Self {
        Self {
            config,
            state: PipelineState::Untrained,
        }
    }

    /// Create an untrained pipeline with the configured degree
    pub fn from_config(config: &PredictorConfig) -> Result<Self> {
        Ok(Self::new(ExpansionConfig::new(config.degree)?))
    }

    pub fn expansion_config(&self) -> ExpansionConfig {
        self.config
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.state, PipelineState::Trained(_))
    }

    fn fitted(&self) -> Result<&FittedModel> {
        match &self.state {
            PipelineState::Trained(model) => Ok(model),
            PipelineState::Untrained => Err(PredictorError::NotTrained),
        }
    }

    /// Fitted coefficients
    pub fn coefficients(&self) -> Result<&Coefficients> {
        self.fitted().map(FittedModel::coefficients)
    }

    /// Width of the feature matrix seen during training
    pub fn n_features_in(&self) -> Option<usize> {
        match &self.state {
            PipelineState::Trained(model) => Some(model.expansion.n_features_in()),
            PipelineState::Untrained => None,
        }
    }

    /// Fit the pipeline. The inputs are not modified.
    ///
    /// On failure the pipeline keeps whatever state it had before the call.
    pub fn train(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 || x.ncols() == 0 || x.nrows() != y.len() {
            return Err(PredictorError::EmptyDataError(format!(
                "training needs matching non-empty inputs, got {}x{} features and {} targets",
                x.nrows(),
                x.ncols(),
                y.len()
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(PredictorError::DataError(
                "training data contains non-finite values".to_string(),
            ));
        }

        let start = Instant::now();
        let expansion = PolynomialFeatures::fit(self.config, x.ncols());
        let expanded = expansion.transform(x)?;
        let coefficients = fit_ols(&expanded, y)?;

        info!(
            n_samples = x.nrows(),
            n_features = x.ncols(),
            n_terms = expansion.n_output_features(),
            degree = self.config.degree,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Trained polynomial regression"
        );

        self.state = PipelineState::Trained(FittedModel {
            expansion,
            coefficients,
        });
        Ok(self)
    }

    /// Predict one value per row of `x`
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let model = self.fitted()?;
        if x.nrows() == 0 {
            return Err(PredictorError::EmptyDataError(
                "cannot predict on zero rows".to_string(),
            ));
        }
        if x.ncols() != model.expansion.n_features_in() {
            return Err(PredictorError::SchemaMismatch {
                expected: format!("{} feature columns", model.expansion.n_features_in()),
                actual: format!("{} feature columns", x.ncols()),
            });
        }

        let expanded = model.expansion.transform(x)?;
        Ok(model.coefficients.apply(&expanded))
    }

    /// Score the pipeline on held-out data, returning the metrics and the predictions
    pub fn evaluate(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<(RegressionMetrics, Array1<f64>)> {
        self.fitted()?;
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(PredictorError::EmptyDataError(format!(
                "evaluation needs matching non-empty inputs, got {} rows and {} targets",
                x.nrows(),
                y.len()
            )));
        }

        let predictions = self.predict(x)?;
        let metrics = RegressionMetrics::compute(y, &predictions)?;
        debug!(
            n_samples = metrics.n_samples,
            mse = metrics.mse,
            r2 = metrics.r2,
            "Evaluated pipeline"
        );
        Ok((metrics, predictions))
    }

    /// Expanded term names ranked by absolute coefficient.
    ///
    /// Ties keep expansion order. The intercept is not ranked.
    pub fn feature_importance(&self, feature_names: &[String]) -> Result<Vec<FeatureImportance>> {
        let model = self.fitted()?;
        let names = model.expansion.feature_names(feature_names)?;

        let mut ranked: Vec<FeatureImportance> = names
            .into_iter()
            .zip(model.coefficients.weights.iter())
            .map(|(feature, w)| FeatureImportance {
                feature,
                importance: w.abs(),
            })
            .collect();
        ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        Ok(ranked)
    }

    /// Describe why a deserialized pipeline cannot be used, if it cannot
    pub(crate) fn integrity_problem(&self) -> Option<String> {
        let model = match &self.state {
            PipelineState::Untrained => return Some("pipeline is not trained".to_string()),
            PipelineState::Trained(model) => model,
        };

        if let Err(e) = ExpansionConfig::new(self.config.degree) {
            return Some(e.to_string());
        }
        if model.expansion.config() != self.config {
            return Some("expansion degree disagrees with pipeline configuration".to_string());
        }
        let expected = PolynomialFeatures::fit(self.config, model.expansion.n_features_in());
        if expected != model.expansion {
            return Some("expansion terms are inconsistent".to_string());
        }
        if model.coefficients.weights.len() != model.expansion.n_output_features() {
            return Some(format!(
                "{} coefficients for {} expanded terms",
                model.coefficients.weights.len(),
                model.expansion.n_output_features()
            ));
        }
        if !model.coefficients.intercept.is_finite()
            || model.coefficients.weights.iter().any(|w| !w.is_finite())
        {
            return Some("coefficients are not finite".to_string());
        }
        None
    }
}
