//! Forecast result types: points, runs, model metadata.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Coarse directional label: final forecast value vs last observed price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Upward,
    Downward,
    Neutral,
}

/// The model order and fit score selected for one (symbol, run).
///
/// Immutable once selected; carried on the ForecastRun so a stored forecast
/// records which model produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Autoregressive order.
    pub p: usize,
    /// Differencing order (fixed at 1 by the search grid).
    pub d: usize,
    /// Moving-average order.
    pub q: usize,
    /// Exogenous regressor column names, in design-matrix order.
    pub regressors: Vec<String>,
    /// Akaike Information Criterion of the winning fit.
    pub aic: f64,
}

impl ModelSpec {
    pub fn order_label(&self) -> String {
        format!("ARIMAX({},{},{})", self.p, self.d, self.q)
    }
}

/// One dated forecast value with its 95% confidence bounds.
///
/// Dates are strictly after the last observed date and contiguous in
/// calendar days. Values are rounded to currency precision (2 decimals).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub symbol: String,
    pub date: NaiveDate,
    pub predicted_value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Complete forecast output for one symbol from one scheduled invocation.
///
/// Superseded, never merged: the next run's output replaces this one in the
/// persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRun {
    pub symbol: String,
    pub trend: Trend,
    pub expected_return_pct: f64,
    pub current_price: f64,
    pub model: ModelSpec,
    /// JSON-encoded snapshot of the series the model was fitted on.
    /// Opaque to the persistence collaborator.
    pub retrieved_data: String,
    pub points: Vec<ForecastPoint>,
}
