//! Ordinary least squares

use crate::error::{PredictorError, Result};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Fitted linear coefficients over an expanded feature space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    /// One weight per expanded feature
    pub weights: Array1<f64>,
    pub intercept: f64,
}

impl Coefficients {
    /// Apply the coefficients to an already-expanded matrix
    pub fn apply(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.weights) + self.intercept
    }
}

/// Fit `y ≈ X w + b` by ordinary least squares.
///
/// The intercept comes from centering. Columns of the centered design are
/// scaled to unit norm before the solve and the weights are rescaled after,
/// which changes conditioning but not the least-squares solution. The solve
/// is an SVD pseudo-inverse, so a rank-deficient design (fewer rows than
/// terms, or collinear terms) yields the minimum-norm solution instead of
/// failing. No regularization is applied.
pub fn fit_ols(x: &Array2<f64>, y: &Array1<f64>) -> Result<Coefficients> {
    let n_samples = x.nrows();
    let n_features = x.ncols();

    if n_samples != y.len() {
        return Err(PredictorError::EmptyDataError(format!(
            "{} feature rows but {} targets",
            n_samples,
            y.len()
        )));
    }

    let x_mean = x.mean_axis(Axis(0)).ok_or_else(|| {
        PredictorError::EmptyDataError("cannot fit on zero rows".to_string())
    })?;
    let y_mean = y.mean().ok_or_else(|| {
        PredictorError::EmptyDataError("cannot fit on zero targets".to_string())
    })?;

    let x_centered = x - &x_mean.clone().insert_axis(Axis(0));
    let y_centered = y - y_mean;

    // A column whose centered norm is at rounding level is constant; it gets
    // scale 0 and therefore a zero weight.
    let tolerance = n_samples as f64 * f64::EPSILON;
    let scales: Vec<f64> = x_centered
        .axis_iter(Axis(1))
        .zip(x.axis_iter(Axis(1)))
        .map(|(centered, raw)| {
            let norm = centered.dot(&centered).sqrt();
            let raw_norm = raw.dot(&raw).sqrt();
            if norm > tolerance * raw_norm { norm } else { 0.0 }
        })
        .collect();

    let a = DMatrix::from_fn(n_samples, n_features, |i, j| {
        if scales[j] > 0.0 { x_centered[[i, j]] / scales[j] } else { 0.0 }
    });
    let b = DVector::from_iterator(n_samples, y_centered.iter().copied());

    let svd = a.svd(true, true);
    let largest = svd.singular_values.max();
    let eps = largest * n_samples.max(n_features) as f64 * f64::EPSILON;
    let solution = svd
        .solve(&b, eps)
        .map_err(|e| PredictorError::ComputationError(e.to_string()))?;

    let weights = Array1::from_iter(
        solution
            .iter()
            .zip(&scales)
            .map(|(w, &s)| if s > 0.0 { w / s } else { 0.0 }),
    );
    if weights.iter().any(|w| !w.is_finite()) {
        return Err(PredictorError::ComputationError(
            "least squares produced non-finite coefficients".to_string(),
        ));
    }
    let intercept = y_mean - weights.dot(&x_mean);

    Ok(Coefficients { weights, intercept })
}

/// R² of predictions against targets; 1.0 for a perfect fit of a constant target
pub(crate) fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    let y_mean = y_true.sum() / n;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - y_mean).powi(2)).sum();

    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    }
}
