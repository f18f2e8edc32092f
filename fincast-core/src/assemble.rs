//! Forecast assembler — raw forecast arrays to dated, bounded, labeled
//! results. Pure transformation, no side effects.

use crate::domain::{ForecastPoint, Trend};
use crate::model::Forecast;
use chrono::{Duration, NaiveDate};

/// Currency rounding to 2 decimal places.
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Assembled per-symbol forecast output, prior to run-level packaging.
#[derive(Debug, Clone)]
pub struct AssembledForecast {
    pub points: Vec<ForecastPoint>,
    pub trend: Trend,
    pub expected_return_pct: f64,
    pub current_price: f64,
}

/// Date the forecast values onto the next `horizon` calendar days, round to
/// currency precision, and derive the trend label and expected return.
///
/// Dates are calendar days (weekends included), starting the day after
/// `last_observed`: the forecast horizon counts periods, not trading
/// sessions. Trend and expected return compare the final raw (unrounded)
/// forecast value against `current_price`.
pub fn assemble(
    symbol: &str,
    forecast: &Forecast,
    last_observed: NaiveDate,
    current_price: f64,
) -> AssembledForecast {
    let horizon = forecast.mean.len();
    let mut points = Vec::with_capacity(horizon);
    for i in 0..horizon {
        points.push(ForecastPoint {
            symbol: symbol.to_string(),
            date: last_observed + Duration::days(i as i64 + 1),
            predicted_value: round_cents(forecast.mean[i]),
            lower_bound: round_cents(forecast.lower[i]),
            upper_bound: round_cents(forecast.upper[i]),
        });
    }

    let final_value = forecast.mean[horizon - 1];
    let expected_return_pct = (final_value - current_price) / current_price * 100.0;
    let trend = if final_value > current_price {
        Trend::Upward
    } else if final_value < current_price {
        Trend::Downward
    } else {
        Trend::Neutral
    };

    AssembledForecast {
        points,
        trend,
        expected_return_pct,
        current_price,
    }
}
