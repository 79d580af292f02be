//! SQL executor boundary.
//!
//! The planner never talks to the warehouse directly. It emits SQL text
//! through [`SqlExecutor`], which the binary backs with a
//! [`WorkerExecutor`](worker::WorkerExecutor) and tests back with a
//! [`MockExecutor`](mock::MockExecutor).
//!
//! Every call blocks until the statement completes.

pub mod mock;
mod result;
pub mod worker;

pub use mock::MockExecutor;
pub use result::ResultSet;
pub use worker::WorkerExecutor;

use crate::worker::WorkerError;

/// Result type for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Errors raised while running SQL against the warehouse.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// Transport failure talking to the database worker.
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    /// The engine rejected a statement.
    #[error("SQL failed: {message}\nSQL: {sql}")]
    Sql { sql: String, message: String },

    /// A result set lacked an expected column.
    #[error("missing column in result: {0}")]
    MissingColumn(String),

    /// A result value could not be converted to the requested type.
    #[error("invalid value for column {column}: {value}")]
    InvalidValue { column: String, value: String },

    /// Failed to start the async runtime driving the worker.
    #[error("runtime error: {0}")]
    Runtime(#[source] std::io::Error),
}

impl ExecutorError {
    pub fn sql(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sql {
            sql: sql.into(),
            message: message.into(),
        }
    }
}

/// A blocking SQL executor.
pub trait SqlExecutor {
    /// Run a statement that returns no rows.
    fn execute(&self, sql: &str) -> ExecutorResult<()>;

    /// Run a query and collect its rows.
    fn query(&self, sql: &str) -> ExecutorResult<ResultSet>;

    /// Whether `database.table` exists.
    fn table_exists(&self, database: &str, table: &str) -> ExecutorResult<bool>;

    /// Column names of `database.table`, in table order.
    fn describe_columns(&self, database: &str, table: &str) -> ExecutorResult<Vec<String>>;
}

impl<T: SqlExecutor + ?Sized> SqlExecutor for &T {
    fn execute(&self, sql: &str) -> ExecutorResult<()> {
        (**self).execute(sql)
    }

    fn query(&self, sql: &str) -> ExecutorResult<ResultSet> {
        (**self).query(sql)
    }

    fn table_exists(&self, database: &str, table: &str) -> ExecutorResult<bool> {
        (**self).table_exists(database, table)
    }

    fn describe_columns(&self, database: &str, table: &str) -> ExecutorResult<Vec<String>> {
        (**self).describe_columns(database, table)
    }
}
