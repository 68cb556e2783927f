//! Five-year close-price statistics for stock tickers, appended to a JSON store.

pub mod base;
pub mod batch;
pub mod export;
pub mod market_data;
pub mod stats;
pub mod store;
