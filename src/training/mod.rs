//! Model training module
//!
//! A single model family: polynomial expansion of the input features
//! followed by an ordinary least squares fit.
//! - [`PolynomialFeatures`] generates the monomial terms
//! - [`fit_ols`] solves for the coefficients
//! - [`RegressionPipeline`] ties both together behind a train/predict lifecycle
//! - [`RegressionMetrics`] scores predictions

mod engine;
mod models;
pub mod linear_models;
pub mod polynomial;

pub use engine::{FeatureImportance, FittedModel, PipelineState, RegressionPipeline};
pub use linear_models::{fit_ols, Coefficients};
pub use models::RegressionMetrics;
pub use polynomial::{ExpansionConfig, PolynomialFeatures};
