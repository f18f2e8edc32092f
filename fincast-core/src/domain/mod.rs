//! Domain types shared across the pipeline.

pub mod bar;
pub mod forecast;

pub use bar::PriceBar;
pub use forecast::{ForecastPoint, ForecastRun, ModelSpec, Trend};
