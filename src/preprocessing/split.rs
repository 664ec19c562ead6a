//! Seeded train/test partitioning

use crate::config::MIN_TEST_FRACTION;
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A disjoint train/test partition of a feature matrix and its targets
#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    /// Rows of the clean table that went to training
    pub train_indices: Vec<usize>,
    /// Rows of the clean table that went to testing
    pub test_indices: Vec<usize>,
    /// Fraction requested when the split was made
    pub test_fraction: f64,
}

impl Split {
    /// Partition `x`/`y` so that `ceil(test_fraction * n)` shuffled rows form the test side
    pub(crate) fn new(
        x: &Array2<f64>,
        y: &Array1<f64>,
        test_fraction: f64,
        random_state: Option<u64>,
    ) -> Self {
        let n = x.nrows();
        let n_test = test_row_count(n, test_fraction);

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = match random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        indices.shuffle(&mut rng);

        let test_indices = indices[..n_test].to_vec();
        let train_indices = indices[n_test..].to_vec();

        Self {
            x_train: x.select(Axis(0), &train_indices),
            x_test: x.select(Axis(0), &test_indices),
            y_train: y.select(Axis(0), &train_indices),
            y_test: y.select(Axis(0), &test_indices),
            train_indices,
            test_indices,
            test_fraction,
        }
    }

    /// Number of training rows
    pub fn n_train(&self) -> usize {
        self.train_indices.len()
    }

    /// Number of test rows
    pub fn n_test(&self) -> usize {
        self.test_indices.len()
    }

    /// Consume the split into `(x_train, x_test, y_train, y_test)`
    pub fn into_parts(self) -> (Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>) {
        (self.x_train, self.x_test, self.y_train, self.y_test)
    }
}

/// Rows assigned to the test side. The small epsilon keeps products such as
/// `0.3 * 10` from rounding up past the intended count.
pub fn test_row_count(n_rows: usize, test_fraction: f64) -> usize {
    let raw = (test_fraction * n_rows as f64 - 1e-9).ceil();
    (raw.max(1.0) as usize).min(n_rows.saturating_sub(1))
}

/// Smallest test fraction that still leaves one test row: `max(0.1, 1/n)`
pub fn min_test_fraction(n_rows: usize) -> f64 {
    if n_rows == 0 {
        return 1.0;
    }
    MIN_TEST_FRACTION.max(1.0 / n_rows as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(r, c)| (r * 10 + c) as f64);
        let y = Array1::from_iter((0..n).map(|r| r as f64));
        (x, y)
    }

    #[test]
    fn test_row_counts() {
        assert_eq!(test_row_count(100, 0.2), 20);
        assert_eq!(test_row_count(10, 0.3), 3);
        assert_eq!(test_row_count(7, 0.2), 2);
        assert_eq!(test_row_count(3, 0.4), 2);
    }

    #[test]
    fn test_min_test_fraction() {
        assert_eq!(min_test_fraction(100), 0.1);
        assert_eq!(min_test_fraction(5), 0.2);
    }

    #[test]
    fn test_split_is_disjoint_and_complete() {
        let (x, y) = data(50);
        let split = Split::new(&x, &y, 0.2, Some(7));
        assert_eq!(split.n_train() + split.n_test(), 50);
        assert_eq!(split.n_test(), 10);

        let train: HashSet<_> = split.train_indices.iter().collect();
        let test: HashSet<_> = split.test_indices.iter().collect();
        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), 50);
    }

    #[test]
    fn test_split_rows_stay_aligned() {
        let (x, y) = data(20);
        let split = Split::new(&x, &y, 0.25, Some(3));
        for (pos, &row) in split.test_indices.iter().enumerate() {
            assert_eq!(split.y_test[pos], row as f64);
            assert_eq!(split.x_test[[pos, 1]], (row * 10 + 1) as f64);
        }
    }

    #[test]
    fn test_split_reproducible_with_seed() {
        let (x, y) = data(30);
        let a = Split::new(&x, &y, 0.2, Some(11));
        let b = Split::new(&x, &y, 0.2, Some(11));
        assert_eq!(a.test_indices, b.test_indices);
        assert_eq!(a.train_indices, b.train_indices);
    }
}
