//! fincast core — the forecasting pipeline's inner stages.
//!
//! - Domain types (price bars, forecast points/runs, model metadata)
//! - Series fetcher: lookback parsing, provider abstraction, tidy tables
//! - Indicator engine: per-symbol rolling/exponential indicators and
//!   standardized model regressors
//! - Model selector/fitter: deterministic AIC grid search over ARIMAX orders
//! - Forecast assembler: dated, bounded, labeled results
//!
//! Orchestration (config, scheduling, persistence handoff) lives in
//! `fincast-runner`; this crate holds only the pure pipeline stages and the
//! network fetcher behind its trait seam.

pub mod assemble;
pub mod data;
pub mod domain;
pub mod features;
pub mod model;
