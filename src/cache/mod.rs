//! Versioned metadata store.
//!
//! Statistics, prejoin definitions, and sample definitions are persisted as an
//! append-only log of `(type, key, value, ts)` records. Reads return the most
//! recent record per key; a record whose value is [`DELETED`] hides the key.
//!
//! # Design
//!
//! - Records are never updated in place; `put` always appends
//! - Values are JSON documents decoded with defaults for absent fields
//! - Two interchangeable backends: [`SqliteStore`] (local file) and
//!   [`WarehouseStore`] (log table next to the data)
//! - [`Meta`] is the typed facade the rest of the crate uses; it treats every
//!   store failure as a cache miss
//!
//! # Key Format
//!
//! ```text
//! stat     {database}_{query unique name}.tablestat  -> Stat
//! prejoin  {database}.{prejoin name}                 -> Prejoin
//! sample   {sample name}.sample                      -> Sample
//! ```

mod hash;
mod meta;
mod sqlite;
mod warehouse;

pub use hash::{compute_hash, short_hash};
pub use meta::Meta;
pub use sqlite::SqliteStore;
pub use warehouse::WarehouseStore;

use std::collections::HashSet;
use std::fmt;

use crate::executor::ExecutorError;

/// Value written to logically delete a key.
pub const DELETED: &str = "DELETED";

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to determine metadata directory")]
    NoCacheDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Warehouse error: {0}")]
    Executor(#[from] ExecutorError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Record type column of the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Stat,
    Prejoin,
    Sample,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Stat => "stat",
            RecordKind::Prejoin => "prejoin",
            RecordKind::Sample => "sample",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of records in the log, deleted ones included.
    pub record_count: usize,
    /// Number of distinct `(type, key)` pairs.
    pub key_count: usize,
    /// Total size of all values in bytes.
    pub total_size_bytes: usize,
}

/// Append-only key/value log with "latest wins" reads.
pub trait MetadataStore {
    /// Append a record. Never overwrites.
    fn put(&self, kind: RecordKind, key: &str, value: &str) -> StoreResult<()>;

    /// Value of the latest record for `key`, unless that record is a delete.
    fn get(&self, kind: RecordKind, key: &str) -> StoreResult<Option<String>>;

    /// Latest live `(key, value)` for every key starting with `prefix`,
    /// ordered by key.
    fn list_by_prefix(&self, kind: RecordKind, prefix: &str)
        -> StoreResult<Vec<(String, String)>>;

    fn stats(&self) -> StoreResult<StoreStats>;

    /// Logically delete `key` by appending the [`DELETED`] sentinel.
    fn delete(&self, kind: RecordKind, key: &str) -> StoreResult<()> {
        self.put(kind, key, DELETED)
    }
}

/// Reduce `(key, value)` rows ordered newest first to the live value per key.
pub(crate) fn latest_per_key<I>(rows: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut seen = HashSet::new();
    let mut live: Vec<(String, String)> = rows
        .into_iter()
        .filter(|(key, _)| seen.insert(key.clone()))
        .filter(|(_, value)| value != DELETED)
        .collect();
    live.sort_by(|a, b| a.0.cmp(&b.0));
    live
}

/// Current time in microseconds since the Unix epoch.
pub(crate) fn now_micros() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or_default()
}
