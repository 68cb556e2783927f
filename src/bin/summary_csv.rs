use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use stock_summary::export;
use stock_summary::store::{SummaryStore, DEFAULT_STORE_PATH};

/// Writes the populated records of a summary store as CSV
#[derive(Debug, Parser)]
#[command(name = "summary_csv", version)]
struct Args {
    /// Summary store to read
    #[arg(long, default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,

    /// Output file, stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
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

    let records = match SummaryStore::new(&args.store).load() {
        Ok(records) => records,
        Err(err) => {
            error!("Unable to read {}: {}", args.store.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let output: Box<dyn Write> = match &args.output {
        Some(path) => match File::create(path) {
            Ok(file) => Box::new(file),
            Err(err) => {
                error!("Unable to create {}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(io::stdout()),
    };

    match export::export_csv(&records, output) {
        Ok(stats) => {
            info!("Wrote {} rows, skipped {} empty records", stats.rows, stats.empty_records);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("CSV export failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
