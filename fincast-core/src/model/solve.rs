//! Linear least squares via normal equations and Cholesky factorization.
//!
//! Small dense systems only: the ARIMAX design matrix tops out around a
//! dozen columns, so forming X'X and factoring it directly is both the
//! simplest and the fastest route. A non-positive-definite X'X means the
//! regressors are linearly dependent and the fit is degenerate.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    #[error("normal equations are not positive definite (collinear regressors)")]
    NotPositiveDefinite,

    #[error("design matrix is empty or ragged")]
    BadShape,
}

/// Solve `min ||X b - y||²` for `b`.
///
/// `rows` is the design matrix X, row-major; every row must have the same
/// width. Fails if X'X is singular to working precision.
pub fn least_squares(rows: &[Vec<f64>], targets: &[f64]) -> Result<Vec<f64>, SolveError> {
    let n = rows.len();
    if n == 0 || targets.len() != n {
        return Err(SolveError::BadShape);
    }
    let k = rows[0].len();
    if k == 0 || rows.iter().any(|r| r.len() != k) {
        return Err(SolveError::BadShape);
    }

    // Form X'X and X'y.
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &y) in rows.iter().zip(targets) {
        for i in 0..k {
            xty[i] += row[i] * y;
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in (i + 1)..k {
            xtx[i][j] = xtx[j][i];
        }
    }

    // Tolerance scaled to the largest diagonal entry: pivots below it mean
    // a numerically singular system, not a meaningful fit.
    let diag_max = (0..k).map(|i| xtx[i][i].abs()).fold(0.0_f64, f64::max);
    let tol = 1e-10 * diag_max.max(1.0);

    // Cholesky: xtx = L L'.
    let mut l = vec![vec![0.0; k]; k];
    for i in 0..k {
        for j in 0..=i {
            let mut s = xtx[i][j];
            for m in 0..j {
                s -= l[i][m] * l[j][m];
            }
            if i == j {
                if !s.is_finite() || s <= tol {
                    return Err(SolveError::NotPositiveDefinite);
                }
                l[i][i] = s.sqrt();
            } else {
                l[i][j] = s / l[j][j];
            }
        }
    }

    // Forward substitution: L z = X'y.
    let mut z = vec![0.0; k];
    for i in 0..k {
        let mut s = xty[i];
        for m in 0..i {
            s -= l[i][m] * z[m];
        }
        z[i] = s / l[i][i];
    }

    // Back substitution: L' b = z.
    let mut b = vec![0.0; k];
    for i in (0..k).rev() {
        let mut s = z[i];
        for m in (i + 1)..k {
            s -= l[m][i] * b[m];
        }
        b[i] = s / l[i][i];
    }

    Ok(b)
}
