//! Wire format spoken with the SQL worker.
//!
//! Newline-delimited JSON in both directions. A client first opens a session
//! bound to one warehouse; every later request names that session instead of
//! repeating the connection. Replies carry the request id and either a
//! `result` or an `error`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod method {
    pub const OPEN_SESSION: &str = "session.open";
    pub const EXECUTE: &str = "sql.execute";
    pub const QUERY: &str = "sql.query";
    pub const TABLE_EXISTS: &str = "table.exists";
    pub const TABLE_COLUMNS: &str = "table.columns";
}

#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

#[derive(Debug, Deserialize)]
pub struct Reply {
    pub id: u64,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Fault>,
}

/// Failure reported by the worker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Fault {
    pub kind: FaultKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The warehouse could not be reached.
    Connection,
    /// The engine rejected a statement.
    Sql,
    /// The request itself was malformed.
    BadRequest,
    #[serde(other)]
    Other,
}

/// Which warehouse a session talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Driver name understood by the worker ("impala", "hive", "duckdb").
    pub driver: String,
    pub connection_string: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionOpened {
    pub session: String,
}

#[derive(Debug, Serialize)]
pub struct SqlParams<'a> {
    pub session: &'a str,
    pub sql: &'a str,
}

#[derive(Debug, Serialize)]
pub struct TableParams<'a> {
    pub session: &'a str,
    pub database: &'a str,
    pub table: &'a str,
}

/// Reply to `sql.execute`. INSERT and CTAS report the rows written.
#[derive(Debug, Default, Deserialize)]
pub struct Executed {
    #[serde(default)]
    pub rows_affected: Option<u64>,
}

/// Reply to `sql.query`.
#[derive(Debug, Deserialize)]
pub struct Rows {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub struct TableExists {
    pub exists: bool,
}

#[derive(Debug, Deserialize)]
pub struct TableColumns {
    pub columns: Vec<String>,
}
