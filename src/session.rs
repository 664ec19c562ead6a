//! Per-user training context

use crate::config::PredictorConfig;
use crate::error::{PredictorError, Result};
use crate::persistence::{ModelStore, PersistedBundle};
use crate::preprocessing::{FeaturePreparer, PreprocessReport, Split};
use crate::reporting::{MetricsReporter, TrainingReport};
use crate::training::{FeatureImportance, RegressionMetrics, RegressionPipeline};
use ndarray::Array1;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Result of one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub metrics: RegressionMetrics,
    /// Test-set targets, in split order
    pub actuals: Array1<f64>,
    /// Test-set predictions, aligned with `actuals`
    pub predictions: Array1<f64>,
    pub importance: Vec<FeatureImportance>,
    pub test_fraction: f64,
    pub n_train: usize,
}

/// Holds the data, model and results one caller is working with.
///
/// Loading a table, training and predicting are separate steps; a failed
/// step leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct Session {
    config: PredictorConfig,
    preparer: FeaturePreparer,
    pipeline: RegressionPipeline,
    clean: Option<DataFrame>,
    preprocess_report: Option<PreprocessReport>,
    split: Option<Split>,
    outcome: Option<TrainingOutcome>,
}

impl Session {
    pub fn new(config: PredictorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            preparer: FeaturePreparer::from_config(&config),
            pipeline: RegressionPipeline::from_config(&config)?,
            config,
            clean: None,
            preprocess_report: None,
            split: None,
            outcome: None,
        })
    }

    /// Resume from a persisted bundle; the session can predict straight away
    pub fn from_bundle(config: PredictorConfig, bundle: PersistedBundle) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            preparer: bundle.preparer,
            pipeline: bundle.pipeline,
            clean: None,
            preprocess_report: None,
            split: None,
            outcome: None,
        })
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn preparer(&self) -> &FeaturePreparer {
        &self.preparer
    }

    pub fn pipeline(&self) -> &RegressionPipeline {
        &self.pipeline
    }

    pub fn clean_table(&self) -> Option<&DataFrame> {
        self.clean.as_ref()
    }

    pub fn preprocess_report(&self) -> Option<&PreprocessReport> {
        self.preprocess_report.as_ref()
    }

    pub fn split(&self) -> Option<&Split> {
        self.split.as_ref()
    }

    pub fn outcome(&self) -> Option<&TrainingOutcome> {
        self.outcome.as_ref()
    }

    /// Clean a raw training table and keep it for [`train`](Self::train)
    pub fn load_table(&mut self, raw: &DataFrame) -> Result<&PreprocessReport> {
        let (clean, report) = self.preparer.preprocess_with_report(raw)?;
        self.clean = Some(clean);
        self.split = None;
        Ok(&*self.preprocess_report.insert(report))
    }

    /// Split the loaded table, fit a fresh pipeline and evaluate it on the test rows.
    ///
    /// `test_fraction` falls back to the configured default.
    pub fn train(&mut self, test_fraction: Option<f64>) -> Result<&TrainingOutcome> {
        let clean = self.clean.as_ref().ok_or_else(|| {
            PredictorError::EmptyDataError("no training table loaded".to_string())
        })?;
        let test_fraction = test_fraction.unwrap_or(self.config.test_fraction);

        let split = self.preparer.prepare_features(clean, test_fraction)?;
        let mut pipeline = RegressionPipeline::from_config(&self.config)?;
        pipeline.train(&split.x_train, &split.y_train)?;
        let (metrics, predictions) = pipeline.evaluate(&split.x_test, &split.y_test)?;
        let importance = pipeline.feature_importance(self.preparer.feature_columns())?;

        info!(
            n_train = split.n_train(),
            n_test = split.n_test(),
            r2 = metrics.r2,
            rmse = metrics.rmse,
            "Training run finished"
        );

        let outcome = TrainingOutcome {
            metrics,
            actuals: split.y_test.clone(),
            predictions,
            importance,
            test_fraction,
            n_train: split.n_train(),
        };
        self.pipeline = pipeline;
        self.split = Some(split);
        Ok(&*self.outcome.insert(outcome))
    }

    /// Predict weights for a raw table with the current pipeline
    pub fn predict(&self, raw: &DataFrame) -> Result<Array1<f64>> {
        let x = self.preparer.features_for_inference(raw)?;
        self.pipeline.predict(&x)
    }

    /// Report of the last training run
    pub fn training_report(&self) -> Result<TrainingReport> {
        let outcome = self.outcome.as_ref().ok_or(PredictorError::NotTrained)?;
        MetricsReporter::from_config(&self.config)?.training_report(
            outcome.metrics,
            &outcome.actuals,
            &outcome.predictions,
            outcome.importance.clone(),
            outcome.n_train,
            outcome.test_fraction,
        )
    }

    /// Package the current pipeline for persistence
    pub fn to_bundle(&self) -> Result<PersistedBundle> {
        if !self.pipeline.is_trained() {
            return Err(PredictorError::NotTrained);
        }
        Ok(PersistedBundle::new(
            self.pipeline.clone(),
            self.preparer.clone(),
            self.outcome.as_ref().map(|o| o.metrics),
            self.outcome.as_ref().map(|o| o.test_fraction),
        ))
    }

    /// Save the current pipeline under `name`, or a timestamped default name
    pub fn save(&self, store: &ModelStore, name: Option<&str>) -> Result<PathBuf> {
        let bundle = self.to_bundle()?;
        let name = match name {
            Some(name) => name.to_string(),
            None => ModelStore::default_model_name(bundle.trained_at),
        };
        store.save_named(&bundle, &name)
    }
}
