//! Predictor configuration

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound accepted for the test fraction of a train/test split
pub const MAX_TEST_FRACTION: f64 = 0.4;

/// Lower bound on the test fraction, before the one-row guarantee is applied
pub const MIN_TEST_FRACTION: f64 = 0.1;

/// Hard cap on the number of rows shown in a prediction preview
pub const MAX_PREVIEW_ROWS: usize = 10;

/// Highest polynomial degree accepted by the expansion
pub const MAX_DEGREE: usize = 6;

/// Configuration shared by the preparer, the pipeline and the model store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Degree of the polynomial feature expansion
    pub degree: usize,

    /// Default fraction of rows held out for evaluation
    pub test_fraction: f64,

    /// Seed for the train/test shuffle. `None` draws from OS entropy,
    /// which makes splits differ between runs.
    pub random_state: Option<u64>,

    /// Directory where trained models are stored
    pub model_dir: PathBuf,

    /// Number of rows shown in a prediction preview (capped at 10)
    pub preview_rows: usize,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            degree: 2,
            test_fraction: 0.2,
            random_state: Some(42),
            model_dir: PathBuf::from("models"),
            preview_rows: MAX_PREVIEW_ROWS,
        }
    }
}

impl PredictorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PredictorError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            PredictorError::ConfigError(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method to set the polynomial degree
    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    /// Builder method to set the default test fraction
    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    /// Builder method to set (or clear) the split seed
    pub fn with_random_state(mut self, seed: Option<u64>) -> Self {
        self.random_state = seed;
        self
    }

    /// Builder method to set the model directory
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    /// Builder method to set the preview size
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if self.degree == 0 || self.degree > MAX_DEGREE {
            return Err(PredictorError::invalid_parameter(
                "degree",
                self.degree,
                format!("must be between 1 and {}", MAX_DEGREE),
            ));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction <= MAX_TEST_FRACTION) {
            return Err(PredictorError::invalid_parameter(
                "test_fraction",
                self.test_fraction,
                format!("must be in (0, {}]", MAX_TEST_FRACTION),
            ));
        }
        if self.preview_rows == 0 {
            return Err(PredictorError::invalid_parameter(
                "preview_rows",
                self.preview_rows,
                "must be at least 1",
            ));
        }
        if self.model_dir.as_os_str().is_empty() {
            return Err(PredictorError::ConfigError(
                "model_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
