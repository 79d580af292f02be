//! SQLite-backed metadata log.
//!
//! The default store lives at `~/.aqp/meta.db`.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use super::{
    latest_per_key, now_micros, MetadataStore, RecordKind, StoreError, StoreResult, StoreStats,
    DELETED,
};

/// Current log schema version. Bump this when the record format changes.
const CACHE_VERSION: i32 = 1;

/// Metadata log in a local SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the log at `path`.
    ///
    /// If the stored schema version doesn't match, the log is cleared.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self {
            conn: Connection::open(path)?,
        };
        store.init()?;
        Ok(store)
    }

    /// Open the log at the default location.
    pub fn open_default() -> StoreResult<Self> {
        Self::open(Self::default_path()?)
    }

    /// Open an in-memory log (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init()?;
        Ok(store)
    }

    pub fn default_path() -> StoreResult<PathBuf> {
        let base = dirs::home_dir().ok_or(StoreError::NoCacheDir)?;
        Ok(base.join(".aqp").join("meta.db"))
    }

    fn init(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS meta_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                ts INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS meta_log_type_key ON meta_log (type, key);

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        let stored_version: Option<i32> = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                let s: String = row.get(0)?;
                Ok(s.parse().unwrap_or(0))
            })
            .optional()?;

        match stored_version {
            Some(v) if v == CACHE_VERSION => {}
            Some(v) => {
                tracing::warn!(
                    found = v,
                    expected = CACHE_VERSION,
                    "metadata log version mismatch, clearing"
                );
                self.clear_all()?;
                self.set_version()?;
            }
            None => self.set_version()?,
        }

        Ok(())
    }

    fn set_version(&self) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', ?)",
            params![CACHE_VERSION.to_string()],
        )?;
        Ok(())
    }

    /// Drop every record, live or deleted.
    pub fn clear_all(&self) -> StoreResult<()> {
        self.conn.execute("DELETE FROM meta_log", [])?;
        Ok(())
    }

    /// Number of records stored for `key`, including superseded ones.
    pub fn history_len(&self, kind: RecordKind, key: &str) -> StoreResult<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM meta_log WHERE type = ? AND key = ?",
            params![kind.as_str(), key],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }
}

impl MetadataStore for SqliteStore {
    fn put(&self, kind: RecordKind, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO meta_log (type, key, value, ts) VALUES (?, ?, ?, ?)",
            params![kind.as_str(), key, value, now_micros()],
        )?;
        Ok(())
    }

    fn get(&self, kind: RecordKind, key: &str) -> StoreResult<Option<String>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta_log WHERE type = ? AND key = ?
                 ORDER BY ts DESC, id DESC LIMIT 1",
                params![kind.as_str(), key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.filter(|v| v != DELETED))
    }

    fn list_by_prefix(
        &self,
        kind: RecordKind,
        prefix: &str,
    ) -> StoreResult<Vec<(String, String)>> {
        // substr instead of LIKE: keys contain `_`.
        let mut stmt = self.conn.prepare(
            "SELECT key, value FROM meta_log
             WHERE type = ?1 AND substr(key, 1, length(?2)) = ?2
             ORDER BY ts DESC, id DESC",
        )?;
        let rows = stmt
            .query_map(params![kind.as_str(), prefix], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<(String, String)>, _>>()?;
        Ok(latest_per_key(rows))
    }

    fn stats(&self) -> StoreResult<StoreStats> {
        let (records, keys, size): (i64, i64, i64) = self.conn.query_row(
            "SELECT COUNT(*),
                    COUNT(DISTINCT type || ':' || key),
                    COALESCE(SUM(LENGTH(value)), 0)
             FROM meta_log",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        Ok(StoreStats {
            record_count: records as usize,
            key_count: keys as usize,
            total_size_bytes: size as usize,
        })
    }
}
