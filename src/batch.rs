//! Runs the fetch, extract, summarize and persist steps for a list of tickers.
//!
//! Tickers are handled one at a time in input order. A failure for one ticker is
//! recorded in its outcome and never stops the rest of the batch.

use log::{error, info, warn};
use thiserror::Error;

use crate::base::{SummaryRecord, Ticker, TickerError};
use crate::market_data::{self, FetchError, PriceHistory, QuoteDataError, QuoteHistoryProvider};
use crate::stats;
use crate::store::{StoreError, SummaryStore};

/// Why no record was written for a ticker
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("invalid symbol: {0}")]
    Symbol(#[from] TickerError),
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("unexpected quote data: {0}")]
    Data(#[from] QuoteDataError),
    #[error("no close prices in the look-back window")]
    NoPrices,
}

#[derive(Debug)]
pub enum TickerOutcome {
    /// The record was appended to the store
    Recorded(SummaryRecord),
    Skipped(SkipReason),
    /// A record was computed but could not be persisted
    Failed(StoreError),
}

#[derive(Debug)]
pub struct TickerReport {
    /// Normalized symbol, or the argument as given when it is not a valid symbol
    pub ticker: String,
    pub outcome: TickerOutcome,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub tickers: Vec<TickerReport>,
}

impl BatchReport {
    pub fn recorded(&self) -> usize {
        self.count(|outcome| matches!(outcome, TickerOutcome::Recorded(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, TickerOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, TickerOutcome::Failed(_)))
    }

    fn count<F: Fn(&TickerOutcome) -> bool>(&self, pred: F) -> usize {
        self.tickers.iter().filter(|report| pred(&report.outcome)).count()
    }
}

fn fetch_history<P>(ticker: &Ticker, provider: &mut P) -> Result<PriceHistory, SkipReason>
where
    P: QuoteHistoryProvider + ?Sized,
{
    let response = provider.fetch_quote_history(ticker)?;
    Ok(market_data::extract_close_prices(&response)?)
}

pub fn process_ticker<P>(ticker: &Ticker, provider: &mut P, store: &SummaryStore) -> TickerOutcome
where
    P: QuoteHistoryProvider + ?Sized,
{
    let history = match fetch_history(ticker, provider) {
        Ok(history) => history,
        Err(reason) => {
            warn!("Skipping {}: {}", ticker, reason);
            return TickerOutcome::Skipped(reason);
        }
    };

    if matches!(history, PriceHistory::InvalidTicker) {
        warn!("Ticker symbol {} does not exist, storing an empty record", ticker);
    }

    let record = match stats::summary_record(ticker, &history) {
        Some(record) => record,
        None => {
            warn!("Skipping {}: {}", ticker, SkipReason::NoPrices);
            return TickerOutcome::Skipped(SkipReason::NoPrices);
        }
    };

    match store.append(&record) {
        Ok(count) => {
            info!("{}: {} (store now holds {} records)", ticker,
                serde_json::to_string(&record).unwrap_or_default(), count);
            TickerOutcome::Recorded(record)
        }
        Err(err) => {
            error!("Unable to store record for {} in {}: {}", ticker, store.path().display(), err);
            TickerOutcome::Failed(err)
        }
    }
}

/// Processes each symbol in order. Symbols are validated one by one, so a bad symbol
/// only skips itself.
pub fn process_batch<S, P>(symbols: &[S], provider: &mut P, store: &SummaryStore) -> BatchReport
where
    S: AsRef<str>,
    P: QuoteHistoryProvider + ?Sized,
{
    let mut report = BatchReport::default();
    for symbol in symbols {
        let symbol = symbol.as_ref();
        let (ticker, outcome) = match Ticker::new(symbol) {
            Ok(ticker) => {
                info!("Processing {}", ticker);
                let outcome = process_ticker(&ticker, provider, store);
                (ticker.to_string(), outcome)
            }
            Err(err) => {
                warn!("Skipping {:?}: {}", symbol, err);
                (symbol.to_owned(), TickerOutcome::Skipped(SkipReason::Symbol(err)))
            }
        };
        report.tickers.push(TickerReport { ticker, outcome });
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::time::Duration;

    use serde_json::{json, Value};
    use tempfile::tempdir;

    /// Serves canned responses; unknown symbols time out
    struct FakeProvider {
        responses: HashMap<String, Value>,
        requested: Vec<String>,
    }

    impl FakeProvider {
        fn new() -> Self {
            FakeProvider { responses: HashMap::new(), requested: Vec::new() }
        }

        fn with_closes(mut self, symbol: &str, closes: &[&str]) -> Self {
            let rows: Vec<Value> = closes.iter().map(|close| json!({ "close": close })).collect();
            self.responses.insert(symbol.to_owned(), json!({ "data": { "tradesTable": { "rows": rows } } }));
            self
        }

        fn with_response(mut self, symbol: &str, response: Value) -> Self {
            self.responses.insert(symbol.to_owned(), response);
            self
        }
    }

    impl QuoteHistoryProvider for FakeProvider {
        fn fetch_quote_history(&mut self, ticker: &Ticker) -> Result<Value, FetchError> {
            self.requested.push(ticker.to_string());
            self.responses.get(ticker.as_str())
                .cloned()
                .ok_or(FetchError::Timeout(Duration::from_secs(10)))
        }
    }

    #[test]
    fn timeout_skips_ticker_and_batch_continues() {
        let dir = tempdir().unwrap();
        let store = SummaryStore::new(dir.path().join("stocks.json"));
        let mut provider = FakeProvider::new().with_closes("AAPL", &["$10.00", "$20.00", "$30.00"]);

        let report = process_batch(&["slow", "aapl"], &mut provider, &store);

        assert_eq!(provider.requested, vec!["SLOW", "AAPL"]);
        assert!(matches!(report.tickers[0].outcome, TickerOutcome::Skipped(SkipReason::Fetch(FetchError::Timeout(_)))));
        assert!(matches!(report.tickers[1].outcome, TickerOutcome::Recorded(_)));
        assert_eq!((report.recorded(), report.skipped(), report.failed()), (1, 1, 0));

        let stored = store.load().unwrap();
        assert_eq!(stored.len(), 1);
        let summary = stored[0].summary().unwrap();
        assert_eq!(summary.ticker.as_str(), "AAPL");
        assert_eq!((summary.min, summary.max, summary.average, summary.median), (10.0, 30.0, 20.0, 20.0));
    }

    #[test]
    fn invalid_ticker_appends_empty_record() {
        let dir = tempdir().unwrap();
        let store = SummaryStore::new(dir.path().join("stocks.json"));
        let mut provider = FakeProvider::new()
            .with_response("NOPE", json!({ "data": null, "status": { "rCode": 400 } }));

        let report = process_batch(&["nope"], &mut provider, &store);

        assert!(matches!(&report.tickers[0].outcome, TickerOutcome::Recorded(record) if record.is_empty()));
        assert_eq!(store.load().unwrap(), vec![SummaryRecord::empty()]);
    }

    #[test]
    fn bad_price_skips_without_writing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stocks.json");
        let store = SummaryStore::new(&path);
        let mut provider = FakeProvider::new().with_closes("MSFT", &["$1.00", "n/a"]);

        let report = process_batch(&["msft"], &mut provider, &store);

        assert!(matches!(report.tickers[0].outcome, TickerOutcome::Skipped(SkipReason::Data(_))));
        assert!(!path.exists());
    }

    #[test]
    fn empty_history_is_skipped() {
        let dir = tempdir().unwrap();
        let store = SummaryStore::new(dir.path().join("stocks.json"));
        let mut provider = FakeProvider::new().with_closes("IPO", &[]);

        let report = process_batch(&["ipo"], &mut provider, &store);

        assert!(matches!(report.tickers[0].outcome, TickerOutcome::Skipped(SkipReason::NoPrices)));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn repeated_tickers_accumulate() {
        let dir = tempdir().unwrap();
        let store = SummaryStore::new(dir.path().join("stocks.json"));
        let mut provider = FakeProvider::new().with_closes("TSLA", &["$10.00", "$20.00", "$30.00", "$40.00"]);

        process_batch(&["tsla"], &mut provider, &store);
        let report = process_batch(&["TSLA"], &mut provider, &store);

        assert_eq!(report.recorded(), 1);
        let stored = store.load().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0], stored[1]);
        assert_eq!(stored[1].summary().map(|s| s.median), Some(25.0));
    }

    #[test]
    fn corrupt_store_fails_ticker_but_not_batch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stocks.json");
        fs::write(&path, "not json").unwrap();
        let store = SummaryStore::new(&path);
        let mut provider = FakeProvider::new()
            .with_closes("AAPL", &["$1.00"])
            .with_closes("MSFT", &["$2.00"]);

        let report = process_batch(&["aapl", "msft"], &mut provider, &store);

        assert_eq!(report.failed(), 2);
        assert_eq!(provider.requested.len(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json");
    }

    #[test]
    fn bad_symbol_skips_only_itself() {
        let dir = tempdir().unwrap();
        let store = SummaryStore::new(dir.path().join("stocks.json"));
        let mut provider = FakeProvider::new()
            .with_closes("MSFT", &["$1.00"])
            .with_closes("AAPL", &["$2.00"]);

        let report = process_batch(&["msft", "", "../etc", "aapl"], &mut provider, &store);

        assert_eq!(provider.requested, vec!["MSFT", "AAPL"]);
        assert!(matches!(report.tickers[1].outcome, TickerOutcome::Skipped(SkipReason::Symbol(TickerError::Empty))));
        assert!(matches!(report.tickers[2].outcome, TickerOutcome::Skipped(SkipReason::Symbol(TickerError::Malformed(_)))));
        assert_eq!(report.tickers[2].ticker, "../etc");
        assert_eq!((report.recorded(), report.skipped()), (2, 2));
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn works_through_trait_object() {
        let dir = tempdir().unwrap();
        let store = SummaryStore::new(dir.path().join("stocks.json"));
        let mut provider = FakeProvider::new().with_closes("AMZN", &["$5.00"]);
        let dyn_provider: &mut dyn QuoteHistoryProvider = &mut provider;

        let report = process_batch(&["amzn"], dyn_provider, &store);
        assert_eq!(report.recorded(), 1);
    }
}
