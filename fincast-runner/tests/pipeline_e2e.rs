//! End-to-end pipeline tests against a synthetic provider.
//!
//! Four symbols, a six-month lookback, horizon 7 — the same shape as the
//! production job — plus the failure-isolation and replace-on-success
//! semantics the runner guarantees.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use fincast_core::data::{FetchError, PriceProvider};
use fincast_core::domain::PriceBar;
use fincast_runner::{
    run_once, ConfigError, FailureReason, ForecastStore, MemoryStore, PipelineConfig, RunError,
    StoredForecast,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Deterministic wavy weekday series per symbol. Pure function of the
/// requested range, so repeated fetches see identical history.
struct SyntheticProvider {
    /// Symbols limited to their last N weekday bars (to force short series).
    truncate: Vec<(String, usize)>,
    calls: AtomicUsize,
    last_end: Mutex<Option<NaiveDate>>,
}

impl SyntheticProvider {
    fn new() -> Self {
        Self {
            truncate: Vec::new(),
            calls: AtomicUsize::new(0),
            last_end: Mutex::new(None),
        }
    }

    fn with_short_history(symbol: &str, bars: usize) -> Self {
        Self {
            truncate: vec![(symbol.to_string(), bars)],
            calls: AtomicUsize::new(0),
            last_end: Mutex::new(None),
        }
    }

    fn series_base(symbol: &str) -> f64 {
        100.0 + (symbol.bytes().next().unwrap_or(0) as f64)
    }

    fn weekday_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
        let base = Self::series_base(symbol);
        let mut bars = Vec::new();
        let mut date = start;
        let mut i = 0usize;
        let mut prev_close = base;
        // Deterministic broadband noise: pure sinusoids are predictable from
        // a handful of lags, which would make the AR design singular.
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15 ^ symbol.bytes().next().unwrap_or(1) as u64;
        while date <= end {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                let t = i as f64;
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                let noise = ((state >> 33) as f64 / (1u64 << 30) as f64) - 1.0;
                let close = base
                    + 0.15 * t
                    + 3.0 * (0.7 * t).sin()
                    + 1.5 * (0.23 * t).cos()
                    + 0.8 * noise;
                bars.push(PriceBar {
                    symbol: symbol.to_string(),
                    date,
                    open: prev_close,
                    high: close.max(prev_close) + 1.0,
                    low: close.min(prev_close) - 1.0,
                    close,
                    volume: 1_000 + (i as u64 % 7) * 50,
                });
                prev_close = close;
                i += 1;
            }
            date += Duration::days(1);
        }
        bars
    }
}

impl PriceProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_end.lock().unwrap() = Some(end);
        let mut bars = Self::weekday_bars(symbol, start, end);
        if let Some((_, keep)) = self.truncate.iter().find(|(s, _)| s == symbol) {
            let skip = bars.len().saturating_sub(*keep);
            bars.drain(..skip);
        }
        if bars.is_empty() {
            return Err(FetchError::NoData);
        }
        Ok(bars)
    }
}

/// Provider that fails every fetch with a transport error.
struct DeadProvider;

impl PriceProvider for DeadProvider {
    fn name(&self) -> &str {
        "dead"
    }

    fn fetch(
        &self,
        _symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<PriceBar>, FetchError> {
        Err(FetchError::NetworkUnreachable("connection refused".into()))
    }
}

fn basket() -> Vec<String> {
    vec!["AAPL".into(), "GOOG".into(), "MSFT".into(), "TSLA".into()]
}

fn thursday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 7).unwrap()
}

fn stale_record(ticker: &str) -> StoredForecast {
    StoredForecast {
        ticker: ticker.to_string(),
        retrieved_data: "old-snapshot".into(),
        forecast: vec![],
    }
}

#[test]
fn end_to_end_four_symbols_six_months_horizon_seven() {
    let provider = SyntheticProvider::new();
    let store = MemoryStore::new();
    let config = PipelineConfig::new(basket(), "6m");

    let report = run_once(&config, &provider, &store, thursday()).unwrap();

    assert!(report.runs.len() <= 4);
    assert_eq!(report.runs.len(), 4, "all synthetic symbols should fit");
    assert!(report.stored);

    for run in &report.runs {
        assert_eq!(run.points.len(), 7);
        assert_eq!(run.model.d, 1);
        assert!((1..=3).contains(&run.model.p));
        assert!((1..=3).contains(&run.model.q));
        assert!(run.model.aic.is_finite());

        for point in &run.points {
            assert!(point.lower_bound <= point.predicted_value);
            assert!(point.predicted_value <= point.upper_bound);
        }
        // Contiguous calendar days, starting after the last observed bar.
        for pair in run.points.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
        }
        assert!(run.points[0].date > thursday() - Duration::days(1));

        // The snapshot decodes back to the fitted series.
        let snapshot: Vec<PriceBar> = serde_json::from_str(&run.retrieved_data).unwrap();
        assert!(!snapshot.is_empty());
        assert!(snapshot.iter().all(|b| b.symbol == run.symbol));
    }

    assert_eq!(store.tickers(), {
        let mut expected = basket();
        expected.sort();
        expected
    });
}

#[test]
fn one_failing_symbol_does_not_abort_the_run() {
    // TSLA only has 10 bars of history — not enough to model.
    let provider = SyntheticProvider::with_short_history("TSLA", 10);
    let store = MemoryStore::new();
    store.replace_batch(&[stale_record("TSLA")]).unwrap();

    let config = PipelineConfig::new(basket(), "6m");
    let report = run_once(&config, &provider, &store, thursday()).unwrap();

    assert_eq!(report.runs.len(), 3);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.symbol, "TSLA");
    assert!(matches!(failure.reason, FailureReason::Preprocessing(_)));

    // The failing symbol's previous forecast is untouched, not deleted.
    let tsla = store.forecast_for("TSLA").unwrap().unwrap();
    assert_eq!(tsla.retrieved_data, "old-snapshot");

    // Succeeding symbols were replaced.
    let aapl = store.forecast_for("AAPL").unwrap().unwrap();
    assert_eq!(aapl.forecast.len(), 7);
}

#[test]
fn malformed_period_aborts_before_any_network_call() {
    let provider = SyntheticProvider::new();
    let store = MemoryStore::new();
    let config = PipelineConfig::new(basket(), "6w");

    let err = run_once(&config, &provider, &store, thursday()).unwrap_err();
    assert!(matches!(err, RunError::Config(ConfigError::Period(_))));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn whole_batch_fetch_failure_aborts_the_run() {
    let store = MemoryStore::new();
    store.replace_batch(&[stale_record("AAPL")]).unwrap();

    let config = PipelineConfig::new(basket(), "6m");
    let err = run_once(&config, &DeadProvider, &store, thursday()).unwrap_err();
    assert!(matches!(err, RunError::Fetch(FetchError::NoData)));

    // Nothing was written.
    let aapl = store.forecast_for("AAPL").unwrap().unwrap();
    assert_eq!(aapl.retrieved_data, "old-snapshot");
}

#[test]
fn all_symbols_failing_writes_nothing() {
    // Every symbol gets a too-short history.
    let mut provider = SyntheticProvider::new();
    provider.truncate = basket().into_iter().map(|s| (s, 10)).collect();
    let store = MemoryStore::new();
    store.replace_batch(&[stale_record("MSFT")]).unwrap();

    let config = PipelineConfig::new(basket(), "6m");
    let report = run_once(&config, &provider, &store, thursday()).unwrap();

    assert!(report.runs.is_empty());
    assert_eq!(report.failures.len(), 4);
    assert!(!report.stored);
    let msft = store.forecast_for("MSFT").unwrap().unwrap();
    assert_eq!(msft.retrieved_data, "old-snapshot");
}

#[test]
fn reruns_on_identical_data_are_identical() {
    let provider = SyntheticProvider::new();
    let config = PipelineConfig::new(basket(), "6m");

    let first = run_once(&config, &provider, &MemoryStore::new(), thursday()).unwrap();
    let second = run_once(&config, &provider, &MemoryStore::new(), thursday()).unwrap();

    assert_eq!(first.runs.len(), second.runs.len());
    for (a, b) in first.runs.iter().zip(&second.runs) {
        assert_eq!(a.symbol, b.symbol);
        assert_eq!(a.model.p, b.model.p);
        assert_eq!(a.model.q, b.model.q);
        assert_eq!(a.model.aic, b.model.aic);
        assert_eq!(a.trend, b.trend);
        assert_eq!(a.expected_return_pct, b.expected_return_pct);
        for (pa, pb) in a.points.iter().zip(&b.points) {
            assert_eq!(pa.date, pb.date);
            assert_eq!(pa.predicted_value, pb.predicted_value);
            assert_eq!(pa.lower_bound, pb.lower_bound);
            assert_eq!(pa.upper_bound, pb.upper_bound);
        }
    }
}

#[test]
fn weekend_as_of_targets_the_prior_friday() {
    let provider = SyntheticProvider::new();
    let store = MemoryStore::new();
    let config = PipelineConfig::new(vec!["AAPL".into()], "6m");

    // 2025-08-10 is a Sunday; the fetch window must end on Friday the 8th.
    let sunday = NaiveDate::from_ymd_opt(2025, 8, 10).unwrap();
    run_once(&config, &provider, &store, sunday).unwrap();
    assert_eq!(
        *provider.last_end.lock().unwrap(),
        Some(NaiveDate::from_ymd_opt(2025, 8, 8).unwrap())
    );
}
