//! Polynomial feature expansion

use crate::config::MAX_DEGREE;
use crate::error::{PredictorError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Immutable expansion settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionConfig {
    pub degree: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self { degree: 2 }
    }
}

impl ExpansionConfig {
    /// Create a validated expansion configuration
    pub fn new(degree: usize) -> Result<Self> {
        if degree == 0 || degree > MAX_DEGREE {
            return Err(PredictorError::invalid_parameter(
                "degree",
                degree,
                format!("must be between 1 and {}", MAX_DEGREE),
            ));
        }
        Ok(Self { degree })
    }
}

/// An expansion bound to a fixed input width.
///
/// Terms are all monomials of total degree 1..=D, ordered by degree and then
/// lexicographically by feature index. Each term is stored as the
/// non-decreasing list of feature indices it multiplies, so `[0, 0, 2]` is
/// `x0^2 * x2`. No bias column is produced; the regression fits its own
/// intercept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialFeatures {
    config: ExpansionConfig,
    n_features_in: usize,
    terms: Vec<Vec<usize>>,
}

impl PolynomialFeatures {
    /// Build the term list for `n_features_in` inputs
    pub fn fit(config: ExpansionConfig, n_features_in: usize) -> Self {
        let terms = (1..=config.degree)
            .flat_map(|d| combinations_with_replacement(n_features_in, d))
            .collect();
        Self {
            config,
            n_features_in,
            terms,
        }
    }

    pub fn config(&self) -> ExpansionConfig {
        self.config
    }

    pub fn n_features_in(&self) -> usize {
        self.n_features_in
    }

    pub fn n_output_features(&self) -> usize {
        self.terms.len()
    }

    /// Term index lists, in output column order
    pub fn terms(&self) -> &[Vec<usize>] {
        &self.terms
    }

    /// Expand every row of `x` into its monomial values
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features_in {
            return Err(PredictorError::SchemaMismatch {
                expected: format!("{} feature columns", self.n_features_in),
                actual: format!("{} feature columns", x.ncols()),
            });
        }

        Ok(Array2::from_shape_fn(
            (x.nrows(), self.terms.len()),
            |(row, t)| self.terms[t].iter().map(|&j| x[[row, j]]).product(),
        ))
    }

    /// Names of the output columns: `"A"`, `"A^2"`, `"A B"`, `"A^2 B"`, ...
    pub fn feature_names(&self, input_names: &[String]) -> Result<Vec<String>> {
        if input_names.len() != self.n_features_in {
            return Err(PredictorError::SchemaMismatch {
                expected: format!("{} feature names", self.n_features_in),
                actual: format!("{} feature names", input_names.len()),
            });
        }

        Ok(self
            .terms
            .iter()
            .map(|term| term_name(term, input_names))
            .collect())
    }
}

fn term_name(term: &[usize], names: &[String]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut i = 0;
    while i < term.len() {
        let feature = term[i];
        let mut power = 1;
        while i + power < term.len() && term[i + power] == feature {
            power += 1;
        }
        if power == 1 {
            parts.push(names[feature].clone());
        } else {
            parts.push(format!("{}^{}", names[feature], power));
        }
        i += power;
    }
    parts.join(" ")
}

/// All non-decreasing index tuples of length `k` over `0..n`, in lexicographic order
fn combinations_with_replacement(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if n == 0 || k == 0 {
        return out;
    }

    let mut combo = vec![0; k];
    loop {
        out.push(combo.clone());

        let mut i = k;
        while i > 0 && combo[i - 1] == n - 1 {
            i -= 1;
        }
        if i == 0 {
            break;
        }
        combo[i - 1] += 1;
        let v = combo[i - 1];
        for slot in combo.iter_mut().skip(i) {
            *slot = v;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_expansion_config_bounds() {
        assert!(ExpansionConfig::new(0).is_err());
        assert!(ExpansionConfig::new(MAX_DEGREE + 1).is_err());
        assert_eq!(ExpansionConfig::new(3).unwrap().degree, 3);
    }

    #[test]
    fn test_term_count() {
        // 5 linear + 15 quadratic
        let poly = PolynomialFeatures::fit(ExpansionConfig::default(), 5);
        assert_eq!(poly.n_output_features(), 20);

        // 3 + 6 + 10
        let cubic = PolynomialFeatures::fit(ExpansionConfig::new(3).unwrap(), 3);
        assert_eq!(cubic.n_output_features(), 19);
    }

    #[test]
    fn test_transform_values() {
        let poly = PolynomialFeatures::fit(ExpansionConfig::default(), 2);
        let x = array![[2.0, 3.0], [1.0, -1.0]];
        let expanded = poly.transform(&x).unwrap();
        // x0, x1, x0^2, x0 x1, x1^2
        assert_eq!(expanded.row(0).to_vec(), vec![2.0, 3.0, 4.0, 6.0, 9.0]);
        assert_eq!(expanded.row(1).to_vec(), vec![1.0, -1.0, 1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_transform_width_mismatch() {
        let poly = PolynomialFeatures::fit(ExpansionConfig::default(), 2);
        let x = array![[1.0, 2.0, 3.0]];
        assert!(matches!(
            poly.transform(&x),
            Err(PredictorError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_feature_names() {
        let poly = PolynomialFeatures::fit(ExpansionConfig::new(3).unwrap(), 2);
        let out = poly.feature_names(&names(&["a", "b"])).unwrap();
        assert_eq!(
            out,
            names(&["a", "b", "a^2", "a b", "b^2", "a^3", "a^2 b", "a b^2", "b^3"])
        );
    }

    #[test]
    fn test_degree_one_is_identity() {
        let poly = PolynomialFeatures::fit(ExpansionConfig::new(1).unwrap(), 3);
        let x = array![[1.0, 2.0, 3.0]];
        assert_eq!(poly.transform(&x).unwrap(), x);
    }
}
