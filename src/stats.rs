//! Summary statistics over a close-price series.

use crate::base::{PriceSummary, SummaryRecord, Ticker};
use crate::market_data::PriceHistory;

pub fn min(prices: &[f64]) -> Option<f64> {
    prices.iter().copied().reduce(f64::min)
}

pub fn max(prices: &[f64]) -> Option<f64> {
    prices.iter().copied().reduce(f64::max)
}

pub fn average(prices: &[f64]) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<f64>() / prices.len() as f64)
}

/// Middle value of the sorted series, or the mean of the two middle values when
/// the length is even.
pub fn median(prices: &[f64]) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }
    let mut sorted = prices.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Returns `None` for an empty series.
pub fn summarize(ticker: &Ticker, prices: &[f64]) -> Option<PriceSummary> {
    Some(PriceSummary {
        ticker: ticker.clone(),
        min: min(prices)?,
        max: max(prices)?,
        average: average(prices)?,
        median: median(prices)?,
    })
}

/// Builds the record persisted for a ticker.
///
/// An unknown ticker yields the empty record. A known ticker with no prices in the
/// window has nothing to summarize and yields `None`.
pub fn summary_record(ticker: &Ticker, history: &PriceHistory) -> Option<SummaryRecord> {
    match history {
        PriceHistory::InvalidTicker => Some(SummaryRecord::empty()),
        PriceHistory::Prices(prices) => summarize(ticker, prices).map(SummaryRecord::from),
    }
}
