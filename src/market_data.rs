use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::base::Ticker;

pub mod api_parser;
pub mod reader;

pub use api_parser::{extract_close_prices, QuoteDataError};
pub use reader::{NasdaqHistoryClient, SavedResponseSource};

/// Close prices extracted from a quote-history response, in source row order
#[derive(Clone, Debug, PartialEq)]
pub enum PriceHistory {
    Prices(Vec<f64>),
    /// The source returned no data block for the symbol
    InvalidTicker,
}

/// Failure to obtain a raw quote-history response for a ticker
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid quote API address: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("quote API returned status {status} {text}")]
    BadStatus { status: u16, text: String },
    #[error("expected a JSON response, got content type {0:?}")]
    UnexpectedContentType(String),
    #[error("unable to read response body: {0}")]
    Body(#[source] io::Error),
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unable to read saved response {}: {source}", .path.display())]
    Replay {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Source of raw quote-history payloads, one call per ticker
pub trait QuoteHistoryProvider {
    fn fetch_quote_history(&mut self, ticker: &Ticker) -> Result<Value, FetchError>;
}
