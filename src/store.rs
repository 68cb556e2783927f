//! JSON-array file holding every summary record written so far.
//!
//! Each append reads the whole array, pushes one record and rewrites the file. The
//! rewrite goes through a temporary file in the same directory that is renamed over
//! the store, so readers only ever see a complete array. Appends from concurrent
//! processes are not serialized and can lose records.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::base::SummaryRecord;

pub const DEFAULT_STORE_PATH: &str = "stocks.json";
const INDENT: &[u8] = b"   ";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("store {} is not a JSON array of summary records: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unable to encode summary records: {0}")]
    Encode(#[source] serde_json::Error),
}

pub struct SummaryStore {
    path: PathBuf,
}

impl SummaryStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        SummaryStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every stored record. A missing or blank file is an empty store.
    pub fn load(&self) -> Result<Vec<SummaryRecord>, StoreError> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::Io(err)),
        };
        if contents.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&contents)
            .map_err(|source| StoreError::Corrupt { path: self.path.clone(), source })
    }

    /// Appends `record` and rewrites the store, returning the new record count.
    /// A corrupt store is left untouched.
    pub fn append(&self, record: &SummaryRecord) -> Result<usize, StoreError> {
        let mut records = self.load()?;
        records.push(record.clone());
        self.rewrite(&records)?;
        debug!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(records.len())
    }

    fn rewrite(&self, records: &[SummaryRecord]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file_mut());
            write_records(&mut writer, records)?;
            writer.flush()?;
        }
        temp_file.as_file().sync_all()?;
        temp_file.persist(&self.path).map_err(|err| StoreError::Io(err.error))?;
        Ok(())
    }
}

impl Default for SummaryStore {
    fn default() -> Self {
        SummaryStore::new(DEFAULT_STORE_PATH)
    }
}

/// Writes records as a JSON array indented with three spaces
pub fn write_records<W: Write>(writer: W, records: &[SummaryRecord]) -> Result<(), StoreError> {
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    records.serialize(&mut serializer).map_err(StoreError::Encode)
}
