//! Row sinks: where projected rows end up.
//!
//! [`JsonLinesSink`] is the backup format: one `{table}.jsonl` file per
//! table, one JSON object per line, keys in column order.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::data::rows::{Row, TableKind};

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Storage boundary for projected rows.
pub trait RowSink {
    fn write_rows<R: Row>(&mut self, rows: &[R]) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

// =============================================================================
// JSON Lines backup
// =============================================================================

pub struct JsonLinesSink {
    dir: PathBuf,
    writers: HashMap<TableKind, BufWriter<File>>,
    written: HashMap<TableKind, usize>,
}

impl JsonLinesSink {
    /// Open `dir` for appending, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SinkError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            writers: HashMap::new(),
            written: HashMap::new(),
        })
    }

    /// Like [`open`](Self::open), but first removes any table files left by
    /// a previous run.
    pub fn fresh(dir: impl AsRef<Path>) -> Result<Self, SinkError> {
        let sink = Self::open(dir)?;
        for table in TableKind::ALL {
            let path = sink.path_of(table);
            if path.exists() {
                fs::remove_file(&path)?;
                debug!(path = %path.display(), "Removed previous backup table");
            }
        }
        Ok(sink)
    }

    pub fn path_of(&self, table: TableKind) -> PathBuf {
        self.dir.join(format!("{}.jsonl", table.name()))
    }

    /// Rows written to `table` through this sink.
    pub fn written(&self, table: TableKind) -> usize {
        self.written.get(&table).copied().unwrap_or(0)
    }

    fn writer(&mut self, table: TableKind) -> Result<&mut BufWriter<File>, SinkError> {
        let path = self.path_of(table);
        let writer = match self.writers.entry(table) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                entry.insert(BufWriter::new(file))
            }
        };
        Ok(writer)
    }
}

impl RowSink for JsonLinesSink {
    fn write_rows<R: Row>(&mut self, rows: &[R]) -> Result<(), SinkError> {
        if rows.is_empty() {
            return Ok(());
        }
        let writer = self.writer(R::TABLE)?;
        for row in rows {
            serde_json::to_writer(&mut *writer, row)?;
            writer.write_all(b"\n")?;
        }
        *self.written.entry(R::TABLE).or_default() += rows.len();
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for JsonLinesSink {
    fn drop(&mut self) {
        let _ = RowSink::flush(self);
    }
}

// =============================================================================
// In-memory sink
// =============================================================================

/// Keeps every row as a JSON value, per table. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: HashMap<TableKind, Vec<serde_json::Value>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self, table: TableKind) -> &[serde_json::Value] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl RowSink for MemorySink {
    fn write_rows<R: Row>(&mut self, rows: &[R]) -> Result<(), SinkError> {
        let values = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.tables.entry(R::TABLE).or_default().extend(values);
        Ok(())
    }
}
