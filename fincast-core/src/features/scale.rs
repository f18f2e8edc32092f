//! Per-column standardization to zero mean / unit variance.
//!
//! Statistics are computed over the rows handed in — one symbol's retained
//! history, never pooled across symbols. Fitting once over the full retained
//! history is an accepted simplification of this pipeline (documented in
//! DESIGN.md), not a lookahead bug: the scaler only feeds the same fit pass.

/// Mean and sample standard deviation of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub mean: f64,
    pub std: f64,
}

/// Fit column statistics. Uses the n−1 denominator so standardized columns
/// have sample variance exactly 1.
pub fn fit(values: &[f64]) -> ColumnStats {
    let n = values.len();
    if n == 0 {
        return ColumnStats { mean: 0.0, std: 0.0 };
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n < 2 {
        0.0
    } else {
        let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
        (ss / (n - 1) as f64).sqrt()
    };
    ColumnStats { mean, std }
}

/// Standardize a column in place of a copy.
///
/// A zero-variance column maps to all zeros rather than dividing by zero.
pub fn standardize(values: &[f64]) -> Vec<f64> {
    let stats = fit(values);
    values
        .iter()
        .map(|v| {
            if stats.std == 0.0 {
                0.0
            } else {
                (v - stats.mean) / stats.std
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn standardized_column_has_zero_mean_unit_variance() {
        let values: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64) * 1.7).collect();
        let scaled = standardize(&values);

        let n = scaled.len() as f64;
        let mean = scaled.iter().sum::<f64>() / n;
        let var = scaled.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);

        assert_approx(mean, 0.0, 1e-10);
        assert_approx(var, 1.0, 1e-10);
    }

    #[test]
    fn zero_variance_column_maps_to_zeros() {
        let values = [7.0; 12];
        let scaled = standardize(&values);
        assert!(scaled.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn fit_known_values() {
        // mean 2, sample variance ((1)^2 + 0 + (1)^2)/2 = 1
        let stats = fit(&[1.0, 2.0, 3.0]);
        assert_approx(stats.mean, 2.0, DEFAULT_EPSILON);
        assert_approx(stats.std, 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn empty_and_single_value_do_not_fault() {
        assert_eq!(fit(&[]), ColumnStats { mean: 0.0, std: 0.0 });
        let one = fit(&[5.0]);
        assert_approx(one.mean, 5.0, DEFAULT_EPSILON);
        assert_eq!(one.std, 0.0);
    }
}
