use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{info, warn};

use stock_summary::batch;
use stock_summary::market_data::reader::{DEFAULT_API_ADDRESS, DEFAULT_TIMEOUT_SECS};
use stock_summary::market_data::{NasdaqHistoryClient, QuoteHistoryProvider, SavedResponseSource};
use stock_summary::store::{SummaryStore, DEFAULT_STORE_PATH};

/// Computes min, max, average and median close prices over the last five years
/// and appends them to a JSON store.
#[derive(Debug, Parser)]
#[command(name = "close_summary", version)]
struct Args {
    /// Ticker symbols to summarize, e.g. msft aapl
    #[arg(required = true, num_args = 1..)]
    tickers: Vec<String>,

    /// JSON file the summaries are appended to
    #[arg(long, env = "STOCK_SUMMARY_STORE", default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Quote API base address
    #[arg(long, default_value = DEFAULT_API_ADDRESS)]
    base_url: String,

    /// Read saved <TICKER>.json responses from this directory instead of the API
    #[arg(long)]
    replay_dir: Option<PathBuf>,
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

fn main() -> ExitCode {
    init_logger();
    let args = Args::parse();

    let mut provider: Box<dyn QuoteHistoryProvider> = match &args.replay_dir {
        Some(dir) => {
            info!("Replaying saved responses from {}", dir.display());
            Box::new(SavedResponseSource::new(dir))
        }
        None => {
            let client = NasdaqHistoryClient::with_options(&args.base_url, Duration::from_secs(args.timeout_secs));
            info!("Fetching history from {}", client.from_date());
            Box::new(client)
        }
    };
    let store = SummaryStore::new(&args.store);

    let report = batch::process_batch(&args.tickers, provider.as_mut(), &store);

    info!("Finished {} tickers: {} recorded, {} skipped, {} failed",
        report.tickers.len(), report.recorded(), report.skipped(), report.failed());
    if report.failed() > 0 {
        warn!("Some records could not be written to {}", store.path().display());
    }
    ExitCode::SUCCESS
}
