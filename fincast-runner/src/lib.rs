//! fincast runner — pipeline orchestration on top of `fincast-core`.
//!
//! This crate provides:
//! - Serializable pipeline configuration with TOML loading and validation
//! - The single-invocation runner: batch fetch, per-symbol parallel
//!   fit/forecast with an overall deadline, replace-on-success persistence
//! - The persistence save/load contract and an in-memory implementation
//! - An owned scheduled-task handle with start/stop and a run-lock
//!
//! No CLI or wire protocol lives here: the pipeline is invoked in-process
//! by whatever hosts it.

pub mod config;
pub mod pipeline;
pub mod scheduler;
pub mod store;

pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{run_once, FailureReason, RunError, RunReport, SymbolFailure};
pub use scheduler::ScheduledPipeline;
pub use store::{ForecastEntry, ForecastStore, MemoryStore, StoreError, StoredForecast};
