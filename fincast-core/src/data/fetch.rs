//! Batch fetch and tidy-table normalization.
//!
//! One fetch per symbol, then one long table: a row per (date, symbol),
//! sorted by date then symbol. Downstream stages treat symbols uniformly by
//! splitting this table, never by pivoting to per-symbol columns.

use super::provider::{FetchError, PriceProvider};
use crate::domain::PriceBar;
use chrono::NaiveDate;
use tracing::{info, warn};

/// Tidy price table: one row per (date, symbol), date-ascending.
///
/// Construction guarantees: rows sorted by (date, symbol), no duplicate
/// (date, symbol) pairs (first occurrence wins).
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    bars: Vec<PriceBar>,
}

impl PriceTable {
    /// Normalize a pile of bars into a tidy table.
    pub fn from_bars(mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.symbol.cmp(&b.symbol)));
        bars.dedup_by(|next, prev| next.date == prev.date && next.symbol == prev.symbol);
        Self { bars }
    }

    pub fn rows(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Distinct symbols present, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.bars.iter().map(|b| b.symbol.clone()).collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }

    /// All bars for one symbol, date-ascending.
    pub fn for_symbol(&self, symbol: &str) -> Vec<PriceBar> {
        self.bars
            .iter()
            .filter(|b| b.symbol == symbol)
            .cloned()
            .collect()
    }
}

/// Outcome of a batch fetch: the tidy table plus per-symbol failures.
///
/// A symbol missing from the table but present in `failures` was skipped;
/// the caller decides whether that is fatal for the run.
#[derive(Debug)]
pub struct BatchFetch {
    pub table: PriceTable,
    pub failures: Vec<(String, FetchError)>,
}

/// Fetch history for every symbol in `symbols` over `[start, end]`.
///
/// Per-symbol failures are collected rather than aborting the batch; an
/// entirely empty result is `FetchError::NoData` so the caller can
/// distinguish "nothing to model" from a transport failure (which appears
/// in `failures` per symbol).
pub fn fetch_batch(
    provider: &dyn PriceProvider,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BatchFetch, FetchError> {
    let mut all_bars = Vec::new();
    let mut failures = Vec::new();

    for symbol in symbols {
        match provider.fetch(symbol, start, end) {
            Ok(bars) => {
                info!(symbol = %symbol, bars = bars.len(), "fetched history");
                all_bars.extend(bars);
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "fetch failed, symbol skipped");
                failures.push((symbol.clone(), e));
            }
        }
    }

    let table = PriceTable::from_bars(all_bars);
    if table.is_empty() {
        return Err(FetchError::NoData);
    }

    Ok(BatchFetch { table, failures })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn bar(symbol: &str, day: i64, close: f64) -> PriceBar {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        PriceBar {
            symbol: symbol.to_string(),
            date: base + Duration::days(day),
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        }
    }

    struct StaticProvider {
        bars: Vec<PriceBar>,
    }

    impl PriceProvider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        fn fetch(
            &self,
            symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PriceBar>, FetchError> {
            let bars: Vec<PriceBar> = self
                .bars
                .iter()
                .filter(|b| b.symbol == symbol)
                .cloned()
                .collect();
            if bars.is_empty() {
                return Err(FetchError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }
            Ok(bars)
        }
    }

    #[test]
    fn table_sorts_by_date_then_symbol() {
        let table = PriceTable::from_bars(vec![
            bar("MSFT", 1, 300.0),
            bar("AAPL", 1, 100.0),
            bar("AAPL", 0, 99.0),
        ]);
        let rows = table.rows();
        assert_eq!(rows[0].symbol, "AAPL");
        assert_eq!(rows[0].close, 99.0);
        assert_eq!(rows[1].symbol, "AAPL");
        assert_eq!(rows[2].symbol, "MSFT");
    }

    #[test]
    fn table_drops_duplicate_date_symbol_pairs() {
        let mut dup = bar("AAPL", 0, 101.0);
        dup.close = 999.0;
        let table = PriceTable::from_bars(vec![bar("AAPL", 0, 101.0), dup]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].close, 101.0);
    }

    #[test]
    fn table_rows_strictly_ordered_no_duplicates() {
        let table = PriceTable::from_bars(vec![
            bar("TSLA", 2, 250.0),
            bar("AAPL", 0, 100.0),
            bar("TSLA", 0, 245.0),
            bar("AAPL", 2, 102.0),
            bar("AAPL", 1, 101.0),
        ]);
        let rows = table.rows();
        for pair in rows.windows(2) {
            let key_a = (pair[0].date, pair[0].symbol.clone());
            let key_b = (pair[1].date, pair[1].symbol.clone());
            assert!(key_a < key_b, "rows out of order or duplicated");
        }
    }

    #[test]
    fn for_symbol_is_date_ascending() {
        let table = PriceTable::from_bars(vec![
            bar("AAPL", 2, 102.0),
            bar("AAPL", 0, 100.0),
            bar("AAPL", 1, 101.0),
        ]);
        let aapl = table.for_symbol("AAPL");
        assert_eq!(aapl.len(), 3);
        assert!(aapl.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn batch_collects_per_symbol_failures() {
        let provider = StaticProvider {
            bars: vec![bar("AAPL", 0, 100.0), bar("AAPL", 1, 101.0)],
        };
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let batch = fetch_batch(
            &provider,
            &["AAPL".to_string(), "ZZZZ".to_string()],
            start,
            end,
        )
        .unwrap();
        assert_eq!(batch.table.symbols(), vec!["AAPL".to_string()]);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].0, "ZZZZ");
    }

    #[test]
    fn batch_with_no_bars_at_all_is_no_data() {
        let provider = StaticProvider { bars: vec![] };
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let err = fetch_batch(&provider, &["ZZZZ".to_string()], start, end).unwrap_err();
        assert!(matches!(err, FetchError::NoData));
    }
}
