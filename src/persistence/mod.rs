//! Model persistence
//!
//! A trained pipeline is stored together with the preparer that produced its
//! inputs and the metadata of the run that trained it, as one JSON document.
//! Writes go through a temporary file in the destination directory and are
//! renamed into place, so readers never observe a partially written artifact.

mod store;

pub use store::{ModelStore, MODEL_EXTENSION};

use crate::error::{PredictorError, Result};
use crate::preprocessing::FeaturePreparer;
use crate::training::{RegressionMetrics, RegressionPipeline};
use chrono::{DateTime, Utc};
use ndarray::Array1;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Layout version written into every artifact
pub const FORMAT_VERSION: u32 = 1;

/// Durable form of a trained model and its companions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedBundle {
    pub format_version: u32,
    pub pipeline: RegressionPipeline,
    pub preparer: FeaturePreparer,
    pub feature_columns: Vec<String>,
    pub trained_at: DateTime<Utc>,
    /// Held-out metrics of the training run, if it was evaluated
    pub metrics: Option<RegressionMetrics>,
    /// Test fraction of the training run
    pub test_fraction: Option<f64>,
}

impl PersistedBundle {
    /// Bundle a pipeline with its preparer, stamped with the current time
    pub fn new(
        pipeline: RegressionPipeline,
        preparer: FeaturePreparer,
        metrics: Option<RegressionMetrics>,
        test_fraction: Option<f64>,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            feature_columns: preparer.feature_columns().to_vec(),
            pipeline,
            preparer,
            trained_at: Utc::now(),
            metrics,
            test_fraction,
        }
    }

    /// Predict weights for a raw table
    pub fn predict(&self, raw: &DataFrame) -> Result<Array1<f64>> {
        let x = self.preparer.features_for_inference(raw)?;
        self.pipeline.predict(&x)
    }

    /// Score the stored pipeline on a labelled raw table
    pub fn evaluate(&self, raw: &DataFrame) -> Result<(RegressionMetrics, Array1<f64>)> {
        let clean = self.preparer.preprocess(raw)?;
        let (x, y) = self.preparer.extract_xy(&clean)?;
        self.pipeline.evaluate(&x, &y)
    }

    fn check(&self) -> Result<()> {
        let corrupt = |msg: String| Err(PredictorError::CorruptArtifact(msg));

        if self.format_version != FORMAT_VERSION {
            return corrupt(format!(
                "format version {} is not supported (expected {})",
                self.format_version, FORMAT_VERSION
            ));
        }
        if let Some(problem) = self.pipeline.integrity_problem() {
            return corrupt(problem);
        }
        if self.feature_columns.as_slice() != self.preparer.feature_columns() {
            return corrupt(format!(
                "feature columns [{}] disagree with preparer columns [{}]",
                self.feature_columns.join(", "),
                self.preparer.feature_columns().join(", ")
            ));
        }
        if self.pipeline.n_features_in() != Some(self.feature_columns.len()) {
            return corrupt(format!(
                "pipeline expects {:?} features but bundle lists {}",
                self.pipeline.n_features_in(),
                self.feature_columns.len()
            ));
        }
        Ok(())
    }
}

/// Write a bundle to `path`, replacing any existing file atomically.
///
/// Missing parent directories are created.
pub fn save(bundle: &PersistedBundle, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !bundle.pipeline.is_trained() {
        return Err(PredictorError::NotTrained);
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, bundle)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| PredictorError::IoError(e.error))?;

    info!(path = %path.display(), "Saved model artifact");
    Ok(())
}

/// Read and verify a bundle written by [`save`]
pub fn load(path: impl AsRef<Path>) -> Result<PersistedBundle> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PredictorError::NotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| PredictorError::CorruptArtifact(format!("not valid JSON: {}", e)))?;

    match value.get("format_version").and_then(serde_json::Value::as_u64) {
        Some(v) if v == u64::from(FORMAT_VERSION) => {}
        Some(v) => {
            return Err(PredictorError::CorruptArtifact(format!(
                "format version {} is not supported (expected {})",
                v, FORMAT_VERSION
            )))
        }
        None => {
            return Err(PredictorError::CorruptArtifact(
                "missing format version".to_string(),
            ))
        }
    }

    let bundle: PersistedBundle = serde_json::from_value(value)
        .map_err(|e| PredictorError::CorruptArtifact(e.to_string()))?;
    bundle.check()?;

    debug!(
        path = %path.display(),
        trained_at = %bundle.trained_at,
        "Loaded model artifact"
    );
    Ok(bundle)
}
