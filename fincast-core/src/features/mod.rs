//! Indicator engine — per-symbol technical indicators and model regressors.
//!
//! Each symbol's bars run through the same pure pipeline: compute the
//! indicator columns in date order, drop every row with an undefined
//! required field, then standardize the designated regressor subset from
//! that symbol's own retained rows. Rolling/EWM state never crosses symbol
//! boundaries — the engine only ever sees one symbol's series.

pub mod rolling;
pub mod scale;

use crate::domain::PriceBar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-symbol failures from the indicator engine.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("no bars provided")]
    EmptySeries,

    #[error("insufficient rows after indicator computation: {retained} retained, {required} required")]
    InsufficientRows { retained: usize, required: usize },
}

/// A column usable as an exogenous model regressor.
///
/// Serialized by its column name so config files read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regressor {
    #[serde(rename = "Open")]
    Open,
    #[serde(rename = "Volume")]
    Volume,
    #[serde(rename = "MA5")]
    Ma5,
    #[serde(rename = "MA20")]
    Ma20,
    #[serde(rename = "EMA12")]
    Ema12,
    #[serde(rename = "EMA26")]
    Ema26,
    #[serde(rename = "MACD")]
    Macd,
    #[serde(rename = "Signal")]
    Signal,
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "Daily_Return")]
    DailyReturn,
    #[serde(rename = "Volatility")]
    Volatility,
}

impl Regressor {
    pub fn name(&self) -> &'static str {
        match self {
            Regressor::Open => "Open",
            Regressor::Volume => "Volume",
            Regressor::Ma5 => "MA5",
            Regressor::Ma20 => "MA20",
            Regressor::Ema12 => "EMA12",
            Regressor::Ema26 => "EMA26",
            Regressor::Macd => "MACD",
            Regressor::Signal => "Signal",
            Regressor::Rsi => "RSI",
            Regressor::DailyReturn => "Daily_Return",
            Regressor::Volatility => "Volatility",
        }
    }

    /// The default exogenous set fed to the model.
    pub fn default_set() -> Vec<Regressor> {
        vec![
            Regressor::Open,
            Regressor::Volume,
            Regressor::Ma20,
            Regressor::Signal,
            Regressor::Rsi,
            Regressor::DailyReturn,
            Regressor::Volatility,
        ]
    }

    fn extract(&self, row: &IndicatorRow) -> f64 {
        match self {
            Regressor::Open => row.bar.open,
            Regressor::Volume => row.bar.volume as f64,
            Regressor::Ma5 => row.ma5,
            Regressor::Ma20 => row.ma20,
            Regressor::Ema12 => row.ema12,
            Regressor::Ema26 => row.ema26,
            Regressor::Macd => row.macd,
            Regressor::Signal => row.signal,
            Regressor::Rsi => row.rsi,
            Regressor::DailyReturn => row.daily_return,
            Regressor::Volatility => row.volatility,
        }
    }
}

/// One bar plus its derived indicator columns (raw, unstandardized).
///
/// Only rows where every derived field is defined survive into
/// `SymbolFeatures`; values here are therefore always finite.
#[derive(Debug, Clone)]
pub struct IndicatorRow {
    pub bar: PriceBar,
    pub ma5: f64,
    pub ma20: f64,
    pub ema12: f64,
    pub ema26: f64,
    pub macd: f64,
    pub signal: f64,
    pub rsi: f64,
    pub daily_return: f64,
    pub volatility: f64,
}

/// One symbol's modeling input: retained indicator rows plus the
/// standardized exogenous regressor matrix aligned with them.
#[derive(Debug, Clone)]
pub struct SymbolFeatures {
    pub symbol: String,
    pub rows: Vec<IndicatorRow>,
    pub regressors: Vec<Regressor>,
    /// Standardized regressor values, row-major; `exog[t]` pairs with `rows[t]`.
    pub exog: Vec<Vec<f64>>,
}

impl SymbolFeatures {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.bar.close).collect()
    }

    /// The most recent retained row. Construction guarantees non-empty.
    pub fn last_row(&self) -> &IndicatorRow {
        &self.rows[self.rows.len() - 1]
    }

    pub fn regressor_names(&self) -> Vec<String> {
        self.regressors.iter().map(|r| r.name().to_string()).collect()
    }
}

/// Compute indicator rows for one symbol and standardize its regressors.
///
/// `bars` must all belong to one symbol; they are re-sorted by date
/// defensively. Missing (NaN) prices are forward-filled within the symbol
/// before any window runs; leading gaps stay undefined and fall out with
/// the warmup rows. Errors if fewer than `min_rows` rows survive.
pub fn compute_features(
    bars: &[PriceBar],
    regressors: &[Regressor],
    min_rows: usize,
) -> Result<SymbolFeatures, FeatureError> {
    if bars.is_empty() {
        return Err(FeatureError::EmptySeries);
    }

    let mut bars: Vec<PriceBar> = bars.to_vec();
    bars.sort_by_key(|b| b.date);
    let symbol = bars[0].symbol.clone();

    let mut open: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let mut high: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let mut low: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let mut close: Vec<f64> = bars.iter().map(|b| b.close).collect();
    rolling::forward_fill(&mut open);
    rolling::forward_fill(&mut high);
    rolling::forward_fill(&mut low);
    rolling::forward_fill(&mut close);

    let ma5 = rolling::rolling_mean(&close, 5);
    let ma20 = rolling::rolling_mean(&close, 20);
    let ema12 = rolling::ewm_mean(&close, 12);
    let ema26 = rolling::ewm_mean(&close, 26);
    let macd: Vec<f64> = ema12
        .iter()
        .zip(&ema26)
        .map(|(a, b)| a - b)
        .collect();
    let signal = rolling::ewm_mean(&macd, 9);
    let rsi = rolling::rsi(&close, 14);
    let daily_return = rolling::pct_change(&close);
    let volatility = rolling::rolling_std(&daily_return, 21);

    let mut rows = Vec::new();
    for (i, bar) in bars.iter().enumerate() {
        let derived = [
            ma5[i],
            ma20[i],
            ema12[i],
            ema26[i],
            macd[i],
            signal[i],
            rsi[i],
            daily_return[i],
            volatility[i],
        ];
        if derived.iter().any(|v| v.is_nan()) || open[i].is_nan() || close[i].is_nan() {
            continue;
        }
        let mut bar = bar.clone();
        bar.open = open[i];
        bar.high = high[i];
        bar.low = low[i];
        bar.close = close[i];
        rows.push(IndicatorRow {
            bar,
            ma5: ma5[i],
            ma20: ma20[i],
            ema12: ema12[i],
            ema26: ema26[i],
            macd: macd[i],
            signal: signal[i],
            rsi: rsi[i],
            daily_return: daily_return[i],
            volatility: volatility[i],
        });
    }

    if rows.len() < min_rows {
        return Err(FeatureError::InsufficientRows {
            retained: rows.len(),
            required: min_rows,
        });
    }

    // Standardize each regressor column from this symbol's retained rows only.
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(regressors.len());
    for reg in regressors {
        let raw: Vec<f64> = rows.iter().map(|r| reg.extract(r)).collect();
        columns.push(scale::standardize(&raw));
    }

    let exog: Vec<Vec<f64>> = (0..rows.len())
        .map(|t| columns.iter().map(|c| c[t]).collect())
        .collect();

    Ok(SymbolFeatures {
        symbol,
        rows,
        regressors: regressors.to_vec(),
        exog,
    })
}
