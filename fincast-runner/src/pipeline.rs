//! One pipeline invocation: fetch → indicators → per-symbol fit/forecast →
//! persistence handoff.
//!
//! Per-symbol failures are recorded, never propagated: one symbol's bad
//! series must not cost the rest of the basket its forecasts. Only
//! run-level conditions (misconfiguration, whole-batch fetch failure, a
//! store rejection) abort the invocation.

use crate::config::{ConfigError, PipelineConfig};
use crate::store::{ForecastStore, StoreError, StoredForecast};
use chrono::NaiveDate;
use fincast_core::assemble;
use fincast_core::data::{fetch_batch, last_weekday, FetchError, Lookback, PeriodError, PriceProvider};
use fincast_core::domain::{ForecastRun, PriceBar};
use fincast_core::features::{compute_features, FeatureError};
use fincast_core::model::{select_and_fit, ModelError, MIN_FIT_ROWS};
use rayon::prelude::*;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, warn};

/// Run-aborting failures.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Period(#[from] PeriodError),

    #[error("batch fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("worker pool unavailable: {0}")]
    WorkerPool(String),

    #[error("a prior invocation is still running")]
    RunInProgress,
}

/// Why one symbol produced no forecast this run.
#[derive(Debug, Error)]
pub enum FailureReason {
    #[error("fetch: {0}")]
    Fetch(FetchError),

    #[error("preprocessing: {0}")]
    Preprocessing(FeatureError),

    #[error("model fit: {0}")]
    ModelFit(ModelError),

    #[error("snapshot encoding: {0}")]
    Snapshot(String),

    #[error("run deadline reached before this symbol was processed")]
    DeadlineBeforeStart,
}

/// One skipped symbol with its recorded reason.
#[derive(Debug)]
pub struct SymbolFailure {
    pub symbol: String,
    pub reason: FailureReason,
}

/// Outcome of one invocation: forecasts produced, symbols skipped, and
/// whether the batch reached the store.
#[derive(Debug)]
pub struct RunReport {
    pub runs: Vec<ForecastRun>,
    pub failures: Vec<SymbolFailure>,
    pub stored: bool,
}

/// Execute one full pipeline invocation as of `as_of`.
///
/// The fetch happens once for all symbols before any per-symbol fan-out;
/// fit/forecast then run in parallel on a private worker pool bounded by
/// `max_concurrency`, under an overall deadline. Successful runs replace
/// the prior stored set in a single store call; an all-failed batch writes
/// nothing, leaving previous forecasts intact.
pub fn run_once(
    config: &PipelineConfig,
    provider: &dyn PriceProvider,
    store: &dyn ForecastStore,
    as_of: NaiveDate,
) -> Result<RunReport, RunError> {
    config.validate()?;
    let lookback: Lookback = config.lookback.parse()?;
    let end = last_weekday(as_of);
    let start = lookback.start_from(end)?;

    info!(
        symbols = config.symbols.len(),
        lookback = %config.lookback,
        horizon = config.horizon,
        %start,
        %end,
        "pipeline run started"
    );

    let batch = fetch_batch(provider, &config.symbols, start, end)?;
    let mut failures: Vec<SymbolFailure> = batch
        .failures
        .into_iter()
        .map(|(symbol, e)| SymbolFailure {
            symbol,
            reason: FailureReason::Fetch(e),
        })
        .collect();

    // Per-symbol series in config order; symbols with no rows at all were
    // already recorded as fetch failures.
    let series: Vec<(String, Vec<PriceBar>)> = config
        .symbols
        .iter()
        .filter(|s| failures.iter().all(|f| &f.symbol != *s))
        .map(|s| (s.clone(), batch.table.for_symbol(s)))
        .collect();

    let deadline = Instant::now() + config.run_deadline();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_concurrency.unwrap_or(0))
        .build()
        .map_err(|e| RunError::WorkerPool(e.to_string()))?;

    let results: Vec<(String, Result<ForecastRun, FailureReason>)> = pool.install(|| {
        series
            .par_iter()
            .map(|(symbol, bars)| {
                let result = process_symbol(config, symbol, bars, deadline);
                (symbol.clone(), result)
            })
            .collect()
    });

    let mut runs = Vec::new();
    for (symbol, result) in results {
        match result {
            Ok(run) => {
                info!(
                    symbol = %symbol,
                    model = %run.model.order_label(),
                    aic = run.model.aic,
                    trend = ?run.trend,
                    expected_return_pct = run.expected_return_pct,
                    "forecast produced"
                );
                runs.push(run);
            }
            Err(reason) => {
                warn!(symbol = %symbol, reason = %reason, "symbol skipped");
                failures.push(SymbolFailure { symbol, reason });
            }
        }
    }

    // Whole-run replace-on-success: an empty batch writes nothing, so failed
    // symbols keep their previously stored forecasts.
    let stored = if runs.is_empty() {
        error!("no symbol produced a forecast; store left untouched");
        false
    } else {
        let records: Vec<StoredForecast> = runs.iter().map(StoredForecast::from_run).collect();
        store.replace_batch(&records)?;
        true
    };

    info!(
        succeeded = runs.len(),
        failed = failures.len(),
        stored,
        "pipeline run completed"
    );

    Ok(RunReport {
        runs,
        failures,
        stored,
    })
}

/// The pure per-symbol path: indicators → order search → forecast → package.
fn process_symbol(
    config: &PipelineConfig,
    symbol: &str,
    bars: &[PriceBar],
    deadline: Instant,
) -> Result<ForecastRun, FailureReason> {
    if Instant::now() >= deadline {
        return Err(FailureReason::DeadlineBeforeStart);
    }

    let features = compute_features(bars, &config.regressors, MIN_FIT_ROWS)
        .map_err(FailureReason::Preprocessing)?;

    let closes = features.closes();
    let fitted = select_and_fit(&closes, &features.exog, config.grid, Some(deadline))
        .map_err(FailureReason::ModelFit)?;

    let forecast = fitted.forecast(config.horizon).map_err(FailureReason::ModelFit)?;

    let last = features.last_row();
    let assembled = assemble::assemble(symbol, &forecast, last.bar.date, last.bar.close);

    let snapshot: Vec<&PriceBar> = features.rows.iter().map(|r| &r.bar).collect();
    let retrieved_data = serde_json::to_string(&snapshot)
        .map_err(|e| FailureReason::Snapshot(e.to_string()))?;

    Ok(ForecastRun {
        symbol: symbol.to_string(),
        trend: assembled.trend,
        expected_return_pct: assembled.expected_return_pct,
        current_price: assembled.current_price,
        model: fitted.spec(features.regressor_names()),
        retrieved_data,
        points: assembled.points,
    })
}
