//! Poultry Weight - body-weight prediction for poultry farms
//!
//! Predicts bird weight from environmental sensor readings and feed intake
//! with a polynomial regression model.
//!
//! # Modules
//!
//! ## Core
//! - [`preprocessing`] - Schema validation, cleaning and seeded train/test splits
//! - [`training`] - Polynomial expansion, least-squares fitting, evaluation
//! - [`persistence`] - Durable model artifacts and the named model store
//! - [`reporting`] - Error breakdowns, previews and text summaries
//!
//! ## Supporting
//! - [`session`] - Per-user training context
//! - [`analysis`] - Descriptive statistics, correlations, outliers
//! - [`config`] - Typed configuration
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use poultry_weight::prelude::*;
//! use polars::prelude::*;
//!
//! # fn main() -> poultry_weight::Result<()> {
//! let raw = CsvReadOptions::default()
//!     .try_into_reader_with_file_path(Some("farm.csv".into()))?
//!     .finish()?;
//!
//! let mut session = Session::new(PredictorConfig::default())?;
//! session.load_table(&raw)?;
//! let outcome = session.train(Some(0.2))?;
//! println!("R² = {:.4}", outcome.metrics.r2);
//!
//! session.save(&ModelStore::new("models"), Some("flock_a"))?;
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;
pub mod config;

// Core ML modules
pub mod preprocessing;
pub mod training;
pub mod persistence;
pub mod reporting;

// Supporting
pub mod session;
pub mod analysis;

// Services
pub mod cli;

pub use error::{PredictorError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PredictorError, Result};

    // Configuration
    pub use crate::config::PredictorConfig;

    // Preprocessing
    pub use crate::preprocessing::{
        records_to_frame, FeaturePreparer, RawRecord, Split, FEATURE_COLUMNS, TARGET_COLUMN,
    };

    // Training
    pub use crate::training::{
        ExpansionConfig, FeatureImportance, RegressionMetrics, RegressionPipeline,
    };

    // Persistence
    pub use crate::persistence::{ModelStore, PersistedBundle};

    // Reporting
    pub use crate::reporting::{MetricsReporter, PredictionRow, RelativeError, TrainingReport};

    // Session
    pub use crate::session::{Session, TrainingOutcome};
}
