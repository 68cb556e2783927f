use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Exchange ticker symbol, always held in uppercase
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TickerError {
    #[error("ticker symbol is empty")]
    Empty,
    #[error("ticker symbol {0:?} contains whitespace")]
    Whitespace(String),
    #[error("ticker symbol {0:?} is not a valid symbol")]
    Malformed(String),
}

impl Ticker {
    pub fn new(symbol: &str) -> Result<Self, TickerError> {
        let trimmed = symbol.trim();
        if trimmed.is_empty() {
            return Err(TickerError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(TickerError::Whitespace(trimmed.to_owned()));
        }
        // Symbols end up in file names and URL paths
        if trimmed.contains(['/', '\\']) || trimmed.chars().all(|c| c == '.') {
            return Err(TickerError::Malformed(trimmed.to_owned()));
        }
        Ok(Ticker(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(symbol: String) -> Result<Self, Self::Error> {
        Ticker::new(&symbol)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl FromStr for Ticker {
    type Err = TickerError;

    fn from_str(input: &str) -> Result<Ticker, Self::Err> {
        Ticker::new(input)
    }
}

/// Close-price statistics for one ticker over the look-back window
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub ticker: Ticker,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub median: f64,
}

/// Placeholder persisted for a ticker the quote source does not know.
/// Serializes as `{}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmptyRecord {}

/// One entry of the persisted summary array
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryRecord {
    Summary(PriceSummary),
    Empty(EmptyRecord),
}

impl SummaryRecord {
    pub fn empty() -> Self {
        SummaryRecord::Empty(EmptyRecord {})
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SummaryRecord::Empty(_))
    }

    pub fn summary(&self) -> Option<&PriceSummary> {
        match self {
            SummaryRecord::Summary(summary) => Some(summary),
            SummaryRecord::Empty(_) => None,
        }
    }
}

impl From<PriceSummary> for SummaryRecord {
    fn from(summary: PriceSummary) -> Self {
        SummaryRecord::Summary(summary)
    }
}
