//! Series fetching: lookback parsing, provider abstraction, tidy tables.

pub mod fetch;
pub mod period;
pub mod provider;
pub mod yahoo;

pub use fetch::{fetch_batch, BatchFetch, PriceTable};
pub use period::{last_weekday, Lookback, PeriodError, PeriodUnit};
pub use provider::{FetchError, PriceProvider};
pub use yahoo::YahooProvider;
