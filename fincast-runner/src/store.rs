//! Persistence contract for forecast runs.
//!
//! The pipeline defines the record shape and a replace/read trait; the
//! backing implementation (database, file, service) belongs to the host.
//! An in-memory implementation ships for tests and embedding.

use fincast_core::domain::ForecastRun;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistence backend error: {0}")]
    Backend(String),
}

/// One dated forecast value as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// ISO-8601 calendar date.
    pub date: String,
    /// Predicted price, 2-decimal currency precision.
    pub price: f64,
}

/// The persisted record for one symbol's latest forecast run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredForecast {
    pub ticker: String,
    /// Opaque-encoded snapshot of the series the model was fitted on.
    pub retrieved_data: String,
    /// Ordered forecast values, one per horizon day.
    pub forecast: Vec<ForecastEntry>,
}

impl StoredForecast {
    pub fn from_run(run: &ForecastRun) -> Self {
        Self {
            ticker: run.symbol.clone(),
            retrieved_data: run.retrieved_data.clone(),
            forecast: run
                .points
                .iter()
                .map(|p| ForecastEntry {
                    date: p.date.format("%Y-%m-%d").to_string(),
                    price: p.predicted_value,
                })
                .collect(),
        }
    }
}

/// Save/load contract the runner hands completed batches to.
///
/// `replace_batch` replaces the stored forecast for every ticker in the
/// batch and must leave tickers absent from the batch untouched. All writes
/// for a run arrive in a single call, after per-symbol work completes.
pub trait ForecastStore: Send + Sync {
    fn replace_batch(&self, records: &[StoredForecast]) -> Result<(), StoreError>;

    fn forecast_for(&self, ticker: &str) -> Result<Option<StoredForecast>, StoreError>;
}

/// In-memory store keyed by ticker.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, StoredForecast>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tickers(&self) -> Vec<String> {
        let records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut tickers: Vec<String> = records.keys().cloned().collect();
        tickers.sort();
        tickers
    }
}

impl ForecastStore for MemoryStore {
    fn replace_batch(&self, batch: &[StoredForecast]) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for record in batch {
            records.insert(record.ticker.clone(), record.clone());
        }
        Ok(())
    }

    fn forecast_for(&self, ticker: &str) -> Result<Option<StoredForecast>, StoreError> {
        let records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(records.get(ticker).cloned())
    }
}
