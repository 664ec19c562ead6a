//! Error types for the poultry weight predictor

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for predictor operations
pub type Result<T> = std::result::Result<T, PredictorError>;

/// Main error type for the predictor
#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid split: {0}")]
    InvalidSplitError(String),

    #[error("Insufficient data: {0}")]
    InsufficientDataError(String),

    #[error("Empty data: {0}")]
    EmptyDataError(String),

    #[error("Model not trained")]
    NotTrained,

    #[error("Schema mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: String, actual: String },

    #[error("Model artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Corrupt model artifact: {0}")]
    CorruptArtifact(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for PredictorError {
    fn from(err: polars::error::PolarsError) -> Self {
        PredictorError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PredictorError {
    fn from(err: serde_json::Error) -> Self {
        PredictorError::SerializationError(err.to_string())
    }
}

impl PredictorError {
    /// Shorthand for building an [`PredictorError::InvalidParameter`]
    pub(crate) fn invalid_parameter(
        name: &str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        PredictorError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
