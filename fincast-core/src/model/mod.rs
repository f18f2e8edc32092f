//! Model selection and fitting: deterministic AIC grid search over ARIMAX
//! orders.
//!
//! The search is an explicit grid (p ascending, then q ascending, d fixed at
//! 1) rather than a stepwise heuristic, so the selected order is reproducible
//! from the input alone. Ties on AIC break to the first-found — i.e. the
//! lowest-order — candidate.

pub mod arimax;
pub mod solve;

pub use arimax::{ArimaOrder, FittedArimax, Forecast};

use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Minimum retained indicator rows for a fit to be attempted.
///
/// Sized so the largest default-grid candidate (p=3, q=3) with the default
/// seven regressors still has more observations than free parameters.
pub const MIN_FIT_ROWS: usize = 30;

/// Typed model failures, scoped to one symbol.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("insufficient observations: {available} available, {required} required")]
    InsufficientObservations { available: usize, required: usize },

    #[error("degenerate regressor matrix (collinear or constant columns)")]
    DegenerateRegressors,

    #[error("model failed to converge: {0}")]
    NonConvergence(String),

    #[error("order search exhausted: all {candidates} candidates failed (last: {last})")]
    SearchExhausted { candidates: usize, last: String },

    #[error("forecast horizon must be at least 1")]
    InvalidHorizon,

    #[error("deadline exceeded during order search")]
    DeadlineExceeded,
}

/// Bounds of the (p, q) search grid; d is always 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchGrid {
    pub p_min: usize,
    pub p_max: usize,
    pub q_min: usize,
    pub q_max: usize,
}

impl Default for SearchGrid {
    fn default() -> Self {
        Self {
            p_min: 1,
            p_max: 3,
            q_min: 1,
            q_max: 3,
        }
    }
}

impl SearchGrid {
    /// Candidate orders in deterministic search order: p ascending, then q.
    pub fn candidates(&self) -> Vec<ArimaOrder> {
        let mut out = Vec::new();
        for p in self.p_min..=self.p_max {
            for q in self.q_min..=self.q_max {
                out.push(ArimaOrder { p, d: 1, q });
            }
        }
        out
    }

    pub fn is_valid(&self) -> bool {
        self.p_min >= 1 && self.q_min >= 1 && self.p_min <= self.p_max && self.q_min <= self.q_max
    }
}

/// Search the grid, fit every candidate, and return the minimum-AIC fit.
///
/// Candidates that fail to fit are skipped; if every candidate fails the
/// search reports exhaustion with the last failure. The optional deadline is
/// checked between candidates so one symbol's search cannot overshoot the
/// run budget unboundedly.
pub fn select_and_fit(
    closes: &[f64],
    exog: &[Vec<f64>],
    grid: SearchGrid,
    deadline: Option<Instant>,
) -> Result<FittedArimax, ModelError> {
    let candidates = grid.candidates();
    let total = candidates.len();
    let mut best: Option<FittedArimax> = None;
    let mut last_failure = String::from("no candidates attempted");

    for order in candidates {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Err(ModelError::DeadlineExceeded);
            }
        }
        match FittedArimax::fit(closes, exog, order) {
            Ok(fitted) => {
                debug!(order = %order, aic = fitted.aic, "candidate fitted");
                // Strict comparison keeps the first-found candidate on ties.
                if best.as_ref().map_or(true, |b| fitted.aic < b.aic) {
                    best = Some(fitted);
                }
            }
            Err(e) => {
                debug!(order = %order, error = %e, "candidate failed");
                last_failure = e.to_string();
            }
        }
    }

    best.ok_or(ModelError::SearchExhausted {
        candidates: total,
        last: last_failure,
    })
}
