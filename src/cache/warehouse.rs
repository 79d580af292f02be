//! Metadata log stored as a table in the warehouse.
//!
//! Keeps the log next to the prejoins and samples it describes, so every
//! client of the same database sees the same catalogue.

use std::cell::Cell;

use super::{
    latest_per_key, now_micros, MetadataStore, RecordKind, StoreResult, StoreStats, DELETED,
};
use crate::executor::SqlExecutor;
use crate::sql::quote_literal;

/// Metadata log in `<database>.<table>`.
pub struct WarehouseStore<'a> {
    executor: &'a dyn SqlExecutor,
    table: String,
    last_ts: Cell<i64>,
}

impl<'a> WarehouseStore<'a> {
    /// Bind to `database.table`, creating the log table if needed.
    pub fn open(executor: &'a dyn SqlExecutor, database: &str, table: &str) -> StoreResult<Self> {
        let table = format!("{}.{}", database, table);
        executor.execute(&format!(
            "CREATE TABLE IF NOT EXISTS {} (type string, key string, value string, ts bigint)",
            table
        ))?;
        Ok(Self {
            executor,
            table,
            last_ts: Cell::new(0),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Strictly increasing timestamps, so two writes in the same microsecond
    /// still order.
    fn next_ts(&self) -> i64 {
        let ts = now_micros().max(self.last_ts.get() + 1);
        self.last_ts.set(ts);
        ts
    }
}

impl MetadataStore for WarehouseStore<'_> {
    fn put(&self, kind: RecordKind, key: &str, value: &str) -> StoreResult<()> {
        self.executor.execute(&format!(
            "INSERT INTO {} VALUES ({}, {}, {}, {})",
            self.table,
            quote_literal(kind.as_str()),
            quote_literal(key),
            quote_literal(value),
            self.next_ts()
        ))?;
        Ok(())
    }

    fn get(&self, kind: RecordKind, key: &str) -> StoreResult<Option<String>> {
        let rs = self.executor.query(&format!(
            "SELECT value FROM {} WHERE type = {} AND key = {} ORDER BY ts DESC LIMIT 1",
            self.table,
            quote_literal(kind.as_str()),
            quote_literal(key)
        ))?;
        if rs.is_empty() {
            return Ok(None);
        }
        Ok(rs.get_str(0, "value")?.filter(|v| v != DELETED))
    }

    fn list_by_prefix(
        &self,
        kind: RecordKind,
        prefix: &str,
    ) -> StoreResult<Vec<(String, String)>> {
        let rs = self.executor.query(&format!(
            "SELECT key, value FROM {} WHERE type = {} AND substr(key, 1, {}) = {} ORDER BY ts DESC",
            self.table,
            quote_literal(kind.as_str()),
            prefix.chars().count(),
            quote_literal(prefix)
        ))?;
        let mut rows = Vec::with_capacity(rs.len());
        for i in 0..rs.len() {
            let key = rs.get_str(i, "key")?.unwrap_or_default();
            let value = rs.get_str(i, "value")?.unwrap_or_default();
            rows.push((key, value));
        }
        Ok(latest_per_key(rows))
    }

    fn stats(&self) -> StoreResult<StoreStats> {
        let rs = self.executor.query(&format!(
            "SELECT count(*) AS records, \
             count(DISTINCT concat(type, ':', key)) AS keys, \
             sum(length(value)) AS size \
             FROM {}",
            self.table
        ))?;
        Ok(StoreStats {
            record_count: rs.get_u64(0, "records")? as usize,
            key_count: rs.get_u64(0, "keys")? as usize,
            total_size_bytes: rs.get_u64(0, "size")? as usize,
        })
    }
}
