//! ARIMAX fitting and forecasting.
//!
//! Model: the once-differenced close regressed on exogenous inputs with
//! ARMA(p,q) errors, estimated by the Hannan–Rissanen two-stage conditional
//! least-squares procedure:
//!
//!   1. a long autoregression on the differenced series recovers innovation
//!      proxies (estimated one-step residuals);
//!   2. the final regression of the differenced series on
//!      [intercept | exog | AR lags | lagged innovations] yields the
//!      coefficients in one linear solve.
//!
//! Estimation is a pair of deterministic least-squares solves, so the same
//! input always produces the same coefficients, AIC, and forecasts.

use super::solve::{self, SolveError};
use super::ModelError;
use crate::domain::ModelSpec;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;

/// Autoregressive integrated moving-average order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// Confidence level for forecast bounds, fixed at 95%.
const CONFIDENCE_LEVEL: f64 = 0.95;

/// Floor keeping the AIC finite for degenerate perfect fits.
const SIGMA2_FLOOR: f64 = 1e-12;

/// A fitted ARIMAX model, carrying the state needed to forecast forward.
#[derive(Debug, Clone)]
pub struct FittedArimax {
    pub order: ArimaOrder,
    pub aic: f64,
    /// Innovation variance estimate (conditional sum of squares / N).
    pub sigma2: f64,
    intercept: f64,
    beta: Vec<f64>,
    phi: Vec<f64>,
    theta: Vec<f64>,
    /// Differenced series the model was fitted on.
    diffs: Vec<f64>,
    /// One-step residuals aligned with `diffs` (zero where not estimated).
    residuals: Vec<f64>,
    last_close: f64,
    last_exog: Vec<f64>,
}

/// Point forecasts with symmetric 95% bounds, in level (price) space.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub mean: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl FittedArimax {
    /// Fit an ARIMAX(p,1,q) to one symbol's closes and exogenous matrix.
    ///
    /// `exog` is row-major and aligned with `closes`; every row must have
    /// the same width. Only d=1 is supported — the search grid never asks
    /// for anything else.
    pub fn fit(
        closes: &[f64],
        exog: &[Vec<f64>],
        order: ArimaOrder,
    ) -> Result<FittedArimax, ModelError> {
        let n = closes.len();
        let k = exog.first().map_or(0, Vec::len);
        if exog.len() != n || exog.iter().any(|r| r.len() != k) {
            return Err(ModelError::NonConvergence(
                "exogenous matrix is not aligned with the target series".into(),
            ));
        }

        let (p, q) = (order.p, order.q);
        // Long-AR order for the innovation-proxy stage.
        let long_ar = p + q + 2;
        // First row of the final regression: AR lags need `p` diffs, MA lags
        // need innovation proxies, which only exist from `long_ar` onward.
        let start = long_ar + q;
        let n_params = 1 + k + p + q;

        let m = n.saturating_sub(1);
        let n_obs = m.saturating_sub(start);
        let required = start + n_params + 2 + 1; // in closes, incl. the diff
        if n_obs < n_params + 2 {
            return Err(ModelError::InsufficientObservations {
                available: n,
                required,
            });
        }

        // Difference once; exog row t pairs with the diff ending at t+1.
        let diffs: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
        let exog_w: Vec<&[f64]> = exog[1..].iter().map(Vec::as_slice).collect();

        // Stage 1: long AR with exog, for innovation proxies.
        let mut rows1 = Vec::with_capacity(m - long_ar);
        let mut y1 = Vec::with_capacity(m - long_ar);
        for t in long_ar..m {
            let mut row = Vec::with_capacity(1 + k + long_ar);
            row.push(1.0);
            row.extend_from_slice(exog_w[t]);
            for lag in 1..=long_ar {
                row.push(diffs[t - lag]);
            }
            rows1.push(row);
            y1.push(diffs[t]);
        }
        let coef1 = Self::solve(&rows1, &y1)?;

        let mut innovations = vec![0.0; m];
        for (i, t) in (long_ar..m).enumerate() {
            let pred: f64 = rows1[i]
                .iter()
                .zip(&coef1)
                .map(|(x, c)| x * c)
                .sum();
            innovations[t] = y1[i] - pred;
        }

        // Stage 2: final regression with AR and MA lags.
        let mut rows2 = Vec::with_capacity(n_obs);
        let mut y2 = Vec::with_capacity(n_obs);
        for t in start..m {
            let mut row = Vec::with_capacity(n_params);
            row.push(1.0);
            row.extend_from_slice(exog_w[t]);
            for lag in 1..=p {
                row.push(diffs[t - lag]);
            }
            for lag in 1..=q {
                row.push(innovations[t - lag]);
            }
            rows2.push(row);
            y2.push(diffs[t]);
        }
        let coef = Self::solve(&rows2, &y2)?;
        if coef.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::NonConvergence(
                "non-finite coefficients from the final regression".into(),
            ));
        }

        let intercept = coef[0];
        let beta = coef[1..=k].to_vec();
        let phi = coef[k + 1..k + 1 + p].to_vec();
        let theta = coef[k + 1 + p..].to_vec();

        let mut residuals = vec![0.0; m];
        let mut sse = 0.0;
        for (i, t) in (start..m).enumerate() {
            let pred: f64 = rows2[i].iter().zip(&coef).map(|(x, c)| x * c).sum();
            let e = y2[i] - pred;
            residuals[t] = e;
            sse += e * e;
        }
        let sigma2 = (sse / n_obs as f64).max(SIGMA2_FLOOR);
        if !sigma2.is_finite() {
            return Err(ModelError::NonConvergence(
                "non-finite innovation variance".into(),
            ));
        }

        let aic = n_obs as f64 * sigma2.ln() + 2.0 * (n_params as f64 + 1.0);

        Ok(FittedArimax {
            order,
            aic,
            sigma2,
            intercept,
            beta,
            phi,
            theta,
            diffs,
            residuals,
            last_close: closes[n - 1],
            last_exog: exog[n - 1].clone(),
        })
    }

    fn solve(rows: &[Vec<f64>], targets: &[f64]) -> Result<Vec<f64>, ModelError> {
        solve::least_squares(rows, targets).map_err(|e| match e {
            SolveError::NotPositiveDefinite => ModelError::DegenerateRegressors,
            SolveError::BadShape => {
                ModelError::NonConvergence("malformed design matrix".into())
            }
        })
    }

    /// Forecast `horizon` steps ahead in level space with 95% bounds.
    ///
    /// Exogenous regressors are held constant at their last observed
    /// standardized values over the whole horizon — a deliberate
    /// simplification (no regressor forecasting), recorded in DESIGN.md.
    pub fn forecast(&self, horizon: usize) -> Result<Forecast, ModelError> {
        if horizon == 0 {
            return Err(ModelError::InvalidHorizon);
        }

        let m = self.diffs.len();
        let exog_effect: f64 = self
            .beta
            .iter()
            .zip(&self.last_exog)
            .map(|(b, x)| b * x)
            .sum();

        // Recursive mean forecast of the differenced series. Past values
        // come from the observed diffs/residuals; future residuals are zero.
        let mut w_future = Vec::with_capacity(horizon);
        for step in 0..horizon {
            let t = m + step;
            let mut w = self.intercept + exog_effect;
            for (lag, phi) in self.phi.iter().enumerate() {
                let idx = t - (lag + 1);
                w += phi
                    * if idx < m {
                        self.diffs[idx]
                    } else {
                        w_future[idx - m]
                    };
            }
            for (lag, theta) in self.theta.iter().enumerate() {
                let idx = t - (lag + 1);
                if idx < m {
                    w += theta * self.residuals[idx];
                }
            }
            w_future.push(w);
        }

        // Psi weights of the ARMA part, then cumulated through the single
        // difference: Var(y[n+h]) = sigma² · Σ_{u<h} (Σ_{j≤u} psi_j)².
        let mut psi = vec![0.0; horizon];
        psi[0] = 1.0;
        for j in 1..horizon {
            let mut v = if j <= self.theta.len() {
                self.theta[j - 1]
            } else {
                0.0
            };
            for (i, phi) in self.phi.iter().enumerate() {
                if j > i {
                    v += phi * psi[j - 1 - i];
                }
            }
            psi[j] = v;
        }
        let mut cum_psi = Vec::with_capacity(horizon);
        let mut acc = 0.0;
        for &w in &psi {
            acc += w;
            cum_psi.push(acc);
        }

        let normal = Normal::new(0.0, 1.0).expect("standard normal is well-formed");
        let z = normal.inverse_cdf(0.5 + CONFIDENCE_LEVEL / 2.0);

        let mut mean = Vec::with_capacity(horizon);
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        let mut level = self.last_close;
        let mut var = 0.0;
        for step in 0..horizon {
            level += w_future[step];
            var += self.sigma2 * cum_psi[step] * cum_psi[step];
            let half_width = z * var.sqrt();
            mean.push(level);
            lower.push(level - half_width);
            upper.push(level + half_width);
        }

        if mean.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonConvergence(
                "non-finite forecast values".into(),
            ));
        }

        Ok(Forecast { mean, lower, upper })
    }

    /// Model metadata for the ForecastRun record.
    pub fn spec(&self, regressor_names: Vec<String>) -> ModelSpec {
        ModelSpec {
            p: self.order.p,
            d: self.order.d,
            q: self.order.q,
            regressors: regressor_names,
            aic: self.aic,
        }
    }
}
