//! Serializable pipeline configuration.

use fincast_core::data::{Lookback, PeriodError};
use fincast_core::features::Regressor;
use fincast_core::model::SearchGrid;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors, all rejected at load/validate time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("symbol list must not be empty")]
    EmptySymbols,

    #[error("ticker '{0}' must be a non-empty uppercase symbol")]
    BadTicker(String),

    #[error("forecast horizon must be at least 1")]
    ZeroHorizon,

    #[error("run cadence must be at least 1 hour")]
    ZeroCadence,

    #[error("regressor set must not be empty")]
    EmptyRegressors,

    #[error("search grid bounds are inverted or start below 1")]
    InvalidGrid,

    #[error(transparent)]
    Period(#[from] PeriodError),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Everything one scheduled invocation needs: what to fetch, how to model
/// it, and how hard to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Uppercase ticker symbols to forecast.
    pub symbols: Vec<String>,

    /// Lookback period string, e.g. "6m", "1y", "30d".
    pub lookback: String,

    /// Days to forecast ahead.
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// Hours between scheduled invocations.
    #[serde(default = "default_cadence_hours")]
    pub cadence_hours: u64,

    /// Exogenous regressor columns fed to the model.
    #[serde(default = "Regressor::default_set")]
    pub regressors: Vec<Regressor>,

    /// ARIMAX order search bounds.
    #[serde(default)]
    pub grid: SearchGrid,

    /// Worker threads for the per-symbol fan-out. None uses the rayon
    /// default (one per core).
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// Overall budget for one invocation; symbols still pending at the
    /// deadline are recorded as failed-by-timeout.
    #[serde(default = "default_run_deadline_secs")]
    pub run_deadline_secs: u64,

    /// Per-request HTTP timeout for the fetcher.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_horizon() -> usize {
    7
}

fn default_cadence_hours() -> u64 {
    12
}

fn default_run_deadline_secs() -> u64 {
    600
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl PipelineConfig {
    /// Minimal config with defaults for everything but the basket and window.
    pub fn new(symbols: Vec<String>, lookback: impl Into<String>) -> Self {
        Self {
            symbols,
            lookback: lookback.into(),
            horizon: default_horizon(),
            cadence_hours: default_cadence_hours(),
            regressors: Regressor::default_set(),
            grid: SearchGrid::default(),
            max_concurrency: None,
            run_deadline_secs: default_run_deadline_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Parse from TOML and validate.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject misconfiguration before a run touches the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::EmptySymbols);
        }
        for symbol in &self.symbols {
            let ok = !symbol.is_empty()
                && symbol
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-');
            if !ok {
                return Err(ConfigError::BadTicker(symbol.clone()));
            }
        }
        if self.horizon == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        if self.cadence_hours == 0 {
            return Err(ConfigError::ZeroCadence);
        }
        if self.regressors.is_empty() {
            return Err(ConfigError::EmptyRegressors);
        }
        if !self.grid.is_valid() {
            return Err(ConfigError::InvalidGrid);
        }
        self.lookback.parse::<Lookback>()?;
        Ok(())
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_secs(self.cadence_hours * 3600)
    }

    pub fn run_deadline(&self) -> Duration {
        Duration::from_secs(self.run_deadline_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
