//! Durable Log — append-only delimited text record
//!
//! One row per accepted, non-duplicate sample. The header line is
//! written once when the file is created; the file is otherwise opened
//! for append only and rows are never mutated. Absent values are the
//! literal `NA`.
//!
//! Single-writer discipline: every append takes the writer lock around
//! the open-append-close sequence and nothing else. The lock is never
//! held across bus or adapter I/O.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::info;
use types::ids::AssetSet;
use types::sample::DurableRow;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Handle to the append-only price log file.
pub struct PriceLog {
    path: PathBuf,
    writer: Mutex<()>,
}

impl PriceLog {
    /// Open the log, creating it with its header if absent.
    ///
    /// Failing here (e.g. an uncreatable path) is an unrecoverable
    /// startup condition for the consumer.
    pub fn open(path: impl Into<PathBuf>, assets: &AssetSet) -> Result<Self, LogError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if !path.exists() {
            let mut file = File::create(&path)?;
            writeln!(file, "{}", DurableRow::csv_header(assets))?;
            info!(path = %path.display(), "Created price log with header");
        }
        Ok(Self {
            path,
            writer: Mutex::new(()),
        })
    }

    /// Append one row under the writer lock.
    ///
    /// The failure mode here is the documented `PersistenceFailure`
    /// class (e.g. the file is exclusively locked by another process):
    /// the caller logs it and keeps its in-memory state.
    pub fn append(&self, row: &DurableRow) -> Result<(), LogError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(file, "{}", row.to_csv_line())?;
        file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
