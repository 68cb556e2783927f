use std::io::Write;

use thiserror::Error;

use crate::base::SummaryRecord;

const HEADER: [&str; 5] = ["ticker", "min", "max", "average", "median"];

#[derive(Debug, Error)]
pub enum CsvExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub rows: usize,
    pub empty_records: usize,
}

/// Writes one CSV row per populated record. Empty records are counted, not written.
pub fn export_csv<W: Write>(records: &[SummaryRecord], writer: W) -> Result<ExportStats, CsvExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut stats = ExportStats::default();

    csv_writer.write_record(&HEADER)?;
    for record in records {
        match record.summary() {
            Some(summary) => {
                csv_writer.write_record(&[
                    summary.ticker.to_string(),
                    summary.min.to_string(),
                    summary.max.to_string(),
                    summary.average.to_string(),
                    summary.median.to_string(),
                ])?;
                stats.rows += 1;
            }
            None => stats.empty_records += 1,
        }
    }
    csv_writer.flush()?;
    Ok(stats)
}
