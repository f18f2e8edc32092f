//! Rolling and exponential series primitives.
//!
//! All functions operate on one symbol's series in date order and mark
//! undefined positions with NaN. A window containing any NaN yields NaN —
//! partial-window results are never emitted.

/// Simple moving average over a trailing window.
///
/// Undefined (NaN) until the window is full; first valid value at index
/// `window - 1`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || n < window {
        return result;
    }
    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = slice.iter().sum::<f64>() / window as f64;
    }
    result
}

/// Rolling sample standard deviation (n−1 denominator) over a trailing window.
///
/// Undefined until the window is full. A window of identical values yields 0.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window < 2 || n < window {
        return result;
    }
    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = slice.iter().sum::<f64>() / window as f64;
        let ss: f64 = slice.iter().map(|v| (v - mean) * (v - mean)).sum();
        result[i] = (ss / (window - 1) as f64).sqrt();
    }
    result
}

/// Exponential moving average, recursive bias-uncorrected form.
///
/// Seeded from the first finite value: `e[0] = x[0]`,
/// `e[t] = alpha * x[t] + (1 - alpha) * e[t-1]` with `alpha = 2/(span+1)`.
/// Positions before the seed are NaN; a NaN after the seed carries the
/// previous level forward.
pub fn ewm_mean(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if span == 0 || n == 0 {
        return result;
    }
    let alpha = 2.0 / (span as f64 + 1.0);

    let mut prev: Option<f64> = None;
    for (i, &v) in values.iter().enumerate() {
        match prev {
            None => {
                if v.is_nan() {
                    continue;
                }
                prev = Some(v);
                result[i] = v;
            }
            Some(level) => {
                let next = if v.is_nan() {
                    level
                } else {
                    alpha * v + (1.0 - alpha) * level
                };
                prev = Some(next);
                result[i] = next;
            }
        }
    }
    result
}

/// Percent change from the prior position, ×100.
///
/// First position is undefined; a zero or NaN prior value yields NaN.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    for i in 1..n {
        let prev = values[i - 1];
        let curr = values[i];
        if prev.is_nan() || curr.is_nan() || prev == 0.0 {
            continue;
        }
        result[i] = (curr - prev) / prev * 100.0;
    }
    result
}

/// Relative Strength Index over trailing simple averages of gains/losses.
///
/// `RS = mean(gains over `period` deltas) / mean(|losses| over same window)`,
/// `RSI = 100 - 100/(1+RS)`. Undefined until `period` full deltas exist
/// (first valid value at index `period`). Zero average loss saturates to
/// 100 rather than faulting.
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period + 1 {
        return result;
    }

    let mut deltas = vec![f64::NAN; n];
    for i in 1..n {
        if closes[i].is_nan() || closes[i - 1].is_nan() {
            continue;
        }
        deltas[i] = closes[i] - closes[i - 1];
    }

    for i in period..n {
        let window = &deltas[i + 1 - period..=i];
        if window.iter().any(|d| d.is_nan()) {
            continue;
        }
        let avg_gain: f64 =
            window.iter().filter(|&&d| d > 0.0).sum::<f64>() / period as f64;
        let avg_loss: f64 =
            -window.iter().filter(|&&d| d < 0.0).sum::<f64>() / period as f64;
        result[i] = if avg_loss == 0.0 {
            100.0
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - 100.0 / (1.0 + rs)
        };
    }
    result
}

/// Carry the last finite value forward over NaN gaps. Leading NaNs remain.
pub fn forward_fill(values: &mut [f64]) {
    let mut last = f64::NAN;
    for v in values.iter_mut() {
        if v.is_nan() {
            if !last.is_nan() {
                *v = last;
            }
        } else {
            last = *v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn rolling_mean_5_basic() {
        let values = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0];
        let result = rolling_mean(&values, 5);
        for i in 0..4 {
            assert!(result[i].is_nan(), "expected NaN at index {i}");
        }
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_mean_nan_poisons_window() {
        let values = [10.0, 11.0, f64::NAN, 13.0, 14.0, 15.0];
        let result = rolling_mean(&values, 3);
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
        assert_approx(result[5], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_mean_too_few_values() {
        let result = rolling_mean(&[10.0, 11.0], 5);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rolling_std_of_constant_is_zero() {
        let values = [5.0; 10];
        let result = rolling_std(&values, 4);
        assert!(result[2].is_nan());
        assert_approx(result[3], 0.0, DEFAULT_EPSILON);
        assert_approx(result[9], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_std_known_value() {
        // Sample std of [1, 2, 3, 4] = sqrt(5/3).
        let values = [1.0, 2.0, 3.0, 4.0];
        let result = rolling_std(&values, 4);
        assert_approx(result[3], (5.0_f64 / 3.0).sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn ewm_mean_seeds_from_first_value() {
        // span 3 → alpha = 0.5. e = [10, 10.5, 11.25, 12.125]
        let values = [10.0, 11.0, 12.0, 13.0];
        let result = ewm_mean(&values, 3);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 10.5, DEFAULT_EPSILON);
        assert_approx(result[2], 11.25, DEFAULT_EPSILON);
        assert_approx(result[3], 12.125, DEFAULT_EPSILON);
    }

    #[test]
    fn ewm_mean_carries_over_nan() {
        let values = [10.0, f64::NAN, 12.0];
        let result = ewm_mean(&values, 3);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 10.0, DEFAULT_EPSILON);
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ewm_mean_leading_nans_stay_undefined() {
        let values = [f64::NAN, f64::NAN, 12.0, 13.0];
        let result = ewm_mean(&values, 3);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn pct_change_basic() {
        let values = [100.0, 110.0, 99.0];
        let result = pct_change(&values);
        assert!(result[0].is_nan());
        assert_approx(result[1], 10.0, DEFAULT_EPSILON);
        assert_approx(result[2], -10.0, DEFAULT_EPSILON);
    }

    #[test]
    fn pct_change_zero_prior_is_undefined() {
        let values = [0.0, 10.0];
        let result = pct_change(&values);
        assert!(result[1].is_nan());
    }

    #[test]
    fn rsi_all_gains_saturates_to_100() {
        let closes = [100.0, 101.0, 102.0, 103.0, 104.0, 105.0];
        let result = rsi(&closes, 3);
        assert!(result[2].is_nan());
        assert_approx(result[3], 100.0, 1e-9);
        assert_approx(result[5], 100.0, 1e-9);
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes = [105.0, 104.0, 103.0, 102.0, 101.0];
        let result = rsi(&closes, 3);
        assert_approx(result[3], 0.0, 1e-9);
    }

    #[test]
    fn rsi_mixed_known_value() {
        // Closes: 44, 44.34, 44.09, 43.61, 44.33
        // Deltas: +0.34, -0.25, -0.48, +0.72
        // Window at index 3 (period 3): gains 0.34, losses 0.73
        // RSI = 100 - 100/(1 + 0.34/0.73) ≈ 31.7757
        let closes = [44.0, 44.34, 44.09, 43.61, 44.33];
        let result = rsi(&closes, 3);
        assert_approx(result[3], 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-6);
    }

    #[test]
    fn rsi_first_defined_at_period_index() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i % 3) as f64).collect();
        let result = rsi(&closes, 14);
        for (i, v) in result.iter().enumerate() {
            if i < 14 {
                assert!(v.is_nan(), "expected NaN at index {i}");
            } else {
                assert!(!v.is_nan(), "expected value at index {i}");
            }
        }
    }

    #[test]
    fn rsi_bounded_zero_to_hundred() {
        let closes = [100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0];
        let result = rsi(&closes, 3);
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "RSI out of bounds at {i}: {v}");
            }
        }
    }

    #[test]
    fn forward_fill_carries_and_keeps_leading_nan() {
        let mut values = [f64::NAN, 10.0, f64::NAN, f64::NAN, 12.0];
        forward_fill(&mut values);
        assert!(values[0].is_nan());
        assert_approx(values[2], 10.0, DEFAULT_EPSILON);
        assert_approx(values[3], 10.0, DEFAULT_EPSILON);
        assert_approx(values[4], 12.0, DEFAULT_EPSILON);
    }
}
