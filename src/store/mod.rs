//! Durable command logs.
//!
//! A [`LogStore`] is the ground truth the history tree is built from. Stores
//! speak positional indices into their entry sequence; resolving a tree node
//! to such an index is the index's job, not the store's.

mod json;
mod memory;
mod sqlite;

use std::path::Path;

use serde::Deserialize;

use crate::entry::LogEntry;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Ordered, append-mostly sequence of [`LogEntry`] records.
pub trait LogStore {
    /// Read every entry in log order. A log that does not exist yet is empty.
    ///
    /// # Errors
    /// Returns an error if the log exists but cannot be read or decoded.
    fn read_all(&self) -> anyhow::Result<Vec<LogEntry>>;

    /// # Errors
    /// Returns an error if the entry could not be persisted.
    fn append(&mut self, entry: &LogEntry) -> anyhow::Result<()>;

    /// Delete the entry at `index`, shifting later entries down by one.
    ///
    /// # Errors
    /// Returns an error if `index` is out of range or the write fails.
    fn remove_at(&mut self, index: usize) -> anyhow::Result<()>;

    /// Overwrite the entry at `index` in place.
    ///
    /// # Errors
    /// Returns an error if `index` is out of range or the write fails.
    fn replace_at(&mut self, index: usize, entry: &LogEntry) -> anyhow::Result<()>;

    /// Short human-readable location, used in log lines.
    fn describe(&self) -> String {
        String::from("history log")
    }
}

impl<S: LogStore + ?Sized> LogStore for Box<S> {
    fn read_all(&self) -> anyhow::Result<Vec<LogEntry>> {
        (**self).read_all()
    }

    fn append(&mut self, entry: &LogEntry) -> anyhow::Result<()> {
        (**self).append(entry)
    }

    fn remove_at(&mut self, index: usize) -> anyhow::Result<()> {
        (**self).remove_at(index)
    }

    fn replace_at(&mut self, index: usize, entry: &LogEntry) -> anyhow::Result<()> {
        (**self).replace_at(index, entry)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// On-disk encoding of a log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    #[default]
    Json,
    Sqlite,
}

impl StoreFormat {
    /// Guess the format from a file extension; anything unrecognised is JSON.
    pub fn infer(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("db" | "sqlite" | "sqlite3") => Self::Sqlite,
            _ => Self::Json,
        }
    }
}

impl std::str::FromStr for StoreFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("unknown log format '{other}' (expected json or sqlite)")),
        }
    }
}

/// Open the log at `path` in the given format.
///
/// # Errors
/// Returns an error if a `SQLite` log cannot be opened or initialised. JSON logs
/// are opened lazily and never fail here.
pub fn open(path: &Path, format: StoreFormat) -> anyhow::Result<Box<dyn LogStore>> {
    Ok(match format {
        StoreFormat::Json => Box::new(JsonFileStore::new(path)),
        StoreFormat::Sqlite => Box::new(SqliteStore::open(path)?),
    })
}

fn out_of_range(index: usize, len: usize) -> anyhow::Error {
    anyhow::anyhow!("entry {index} out of range ({len} entries)")
}
