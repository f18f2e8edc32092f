//! Price provider trait and structured fetch errors.
//!
//! The PriceProvider trait abstracts over history sources so the pipeline
//! can swap the network implementation and mock for tests.

use crate::domain::PriceBar;
use chrono::NaiveDate;
use thiserror::Error;

/// Structured errors for price-history fetches.
///
/// `NoData` is deliberately distinct from the transport variants: an empty
/// range is a data condition, not a failure of the fetch machinery, and the
/// runner treats the two differently.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("HTTP {status} from provider for {symbol}")]
    HttpStatus { symbol: String, status: u16 },

    #[error("no bars returned for the requested range")]
    NoData,
}

impl FetchError {
    /// True for the empty-result outcome (vs a transport failure).
    pub fn is_no_data(&self) -> bool {
        matches!(self, FetchError::NoData | FetchError::SymbolNotFound { .. })
    }
}

/// Trait for price-history providers.
///
/// Implementations fetch daily bars for one symbol over an inclusive date
/// range, already authenticated if the source requires it. Bars may arrive
/// unordered or with gaps; the batch fetcher normalizes them.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for `symbol` over `[start, end]`.
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, FetchError>;
}
