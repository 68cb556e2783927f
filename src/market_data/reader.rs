use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Months, NaiveDate, Utc};
use chrono_tz::US::Eastern;
use log::{debug, info};
use serde_json::Value;
use url::Url;

use crate::base::Ticker;
use super::{FetchError, QuoteHistoryProvider};

pub const DEFAULT_API_ADDRESS: &str = "https://api.nasdaq.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
const ROW_LIMIT: u32 = 9999;
const LOOKBACK_MONTHS: u32 = 5 * 12;
const JSON_CONTENT_TYPE: &str = "application/json";

// The quote API rejects requests that do not look like they come from a browser
const REQUEST_HEADERS: [(&str, &str); 7] = [
    ("User-Agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36"),
    ("Accept", "application/json, text/plain, */*"),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Referer", "https://www.nasdaq.com/market-activity/stocks"),
    ("Connection", "keep-alive"),
    ("DNT", "1"),
    ("Cache-Control", "no-cache"),
];

/// First day of the look-back window ending on `today`. Month-end days clamp, so
/// 29 February maps to 28 February.
pub fn lookback_start(today: NaiveDate) -> NaiveDate {
    today.checked_sub_months(Months::new(LOOKBACK_MONTHS)).unwrap_or(NaiveDate::MIN)
}

/// Current date on the exchange's calendar
pub fn exchange_today() -> NaiveDate {
    Utc::now().with_timezone(&Eastern).date_naive()
}

/// Fetches daily history from the Nasdaq quote API
pub struct NasdaqHistoryClient {
    agent: ureq::Agent,
    base_url: String,
    timeout: Duration,
    from_date: NaiveDate,
}

impl NasdaqHistoryClient {
    pub fn new() -> Self {
        NasdaqHistoryClient::with_options(DEFAULT_API_ADDRESS, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_options(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .build();
        NasdaqHistoryClient {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout,
            from_date: lookback_start(exchange_today()),
        }
    }

    pub fn from_date(&self) -> NaiveDate {
        self.from_date
    }

    /// History endpoint for `ticker`. The symbol is percent-encoded as a single path
    /// segment.
    pub fn history_url(&self, ticker: &Ticker) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["api", "quote", ticker.as_str(), "historical"]);
        url.query_pairs_mut()
            .append_pair("assetclass", "stocks")
            .append_pair("fromdate", &self.from_date.format("%Y-%m-%d").to_string())
            .append_pair("limit", &ROW_LIMIT.to_string());
        Ok(url)
    }

    fn transport_error(&self, err: ureq::Transport) -> FetchError {
        let timed_out = std::error::Error::source(&err)
            .and_then(|source| source.downcast_ref::<io::Error>())
            .map_or(false, |io_err| matches!(io_err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock));
        if timed_out {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(err.to_string())
        }
    }

    fn body_error(&self, err: io::Error) -> FetchError {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => FetchError::Timeout(self.timeout),
            _ => FetchError::Body(err),
        }
    }
}

impl Default for NasdaqHistoryClient {
    fn default() -> Self {
        NasdaqHistoryClient::new()
    }
}

impl QuoteHistoryProvider for NasdaqHistoryClient {
    fn fetch_quote_history(&mut self, ticker: &Ticker) -> Result<Value, FetchError> {
        let url = self.history_url(ticker)?;
        info!("Requesting: {}", url);

        let mut request = self.agent.get(url.as_str());
        for (name, value) in REQUEST_HEADERS.iter() {
            request = request.set(name, value);
        }

        let resp = match request.call() {
            Ok(resp) => resp,
            // Unknown symbols come back as an error status with a JSON body
            Err(ureq::Error::Status(_, resp)) if is_json(&resp) => resp,
            Err(ureq::Error::Status(status, resp)) => {
                return Err(FetchError::BadStatus { status, text: resp.status_text().to_owned() });
            }
            Err(ureq::Error::Transport(transport)) => return Err(self.transport_error(transport)),
        };
        info!("Response received! Status code: {}", resp.status());

        if !is_json(&resp) {
            let content_type = resp.header("Content-Type").unwrap_or("").to_owned();
            return Err(FetchError::UnexpectedContentType(content_type));
        }

        let data_string = resp.into_string().map_err(|err| self.body_error(err))?;
        debug!("Read {} bytes for {}", data_string.len(), ticker);
        Ok(serde_json::from_str::<Value>(&data_string)?)
    }
}

fn is_json(resp: &ureq::Response) -> bool {
    resp.header("Content-Type").map_or(false, |content_type| content_type.contains(JSON_CONTENT_TYPE))
}

/// Replays responses saved as `<dir>/<TICKER>.json`
pub struct SavedResponseSource {
    dir: PathBuf,
}

impl SavedResponseSource {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        SavedResponseSource { dir: dir.into() }
    }

    pub fn response_path(&self, ticker: &Ticker) -> PathBuf {
        self.dir.join(format!("{}.json", ticker))
    }
}

impl QuoteHistoryProvider for SavedResponseSource {
    fn fetch_quote_history(&mut self, ticker: &Ticker) -> Result<Value, FetchError> {
        let path = self.response_path(ticker);
        info!("Replaying: {}", path.display());
        let data_string = fs::read_to_string(&path)
            .map_err(|source| FetchError::Replay { path: path.clone(), source })?;
        Ok(serde_json::from_str::<Value>(&data_string)?)
    }
}
