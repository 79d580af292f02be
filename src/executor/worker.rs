//! Blocking executor backed by the SQL worker process.

use tokio::runtime::Runtime;

use super::{ExecutorError, ExecutorResult, ResultSet, SqlExecutor};
use crate::config::{ConnectionConfig, Settings};
use crate::worker::{WorkerClient, WorkerError};

/// [`SqlExecutor`] that forwards every call to a [`WorkerClient`] session.
///
/// The client is async; this adapter owns a current-thread runtime and
/// blocks on each request so the planner can stay synchronous. The reply
/// router only makes progress while a request is being awaited.
pub struct WorkerExecutor {
    runtime: Runtime,
    client: WorkerClient,
    session: String,
}

impl WorkerExecutor {
    /// Spawn the configured worker and open a session on `connection`.
    pub fn spawn(settings: &Settings, connection: &ConnectionConfig) -> ExecutorResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ExecutorError::Runtime)?;
        let target = connection.to_target();
        let (client, session) = runtime.block_on(async {
            let client = WorkerClient::spawn(settings).await?;
            let session = client.open_session(&target).await?;
            Ok::<_, WorkerError>((client, session))
        })?;
        tracing::info!(driver = %target.driver, database = %connection.database, "connected to warehouse");
        Ok(Self {
            runtime,
            client,
            session,
        })
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    fn statement_error(sql: &str, error: WorkerError) -> ExecutorError {
        match error {
            WorkerError::Sql(message) => ExecutorError::sql(sql, message),
            other => ExecutorError::Worker(other),
        }
    }
}

impl SqlExecutor for WorkerExecutor {
    fn execute(&self, sql: &str) -> ExecutorResult<()> {
        tracing::debug!(%sql, "execute");
        let executed = self
            .runtime
            .block_on(self.client.execute(&self.session, sql))
            .map_err(|e| Self::statement_error(sql, e))?;
        if let Some(rows) = executed.rows_affected {
            tracing::debug!(rows, "rows written");
        }
        Ok(())
    }

    fn query(&self, sql: &str) -> ExecutorResult<ResultSet> {
        tracing::debug!(%sql, "query");
        let rows = self
            .runtime
            .block_on(self.client.query(&self.session, sql))
            .map_err(|e| Self::statement_error(sql, e))?;
        Ok(ResultSet::new(rows.columns, rows.rows))
    }

    fn table_exists(&self, database: &str, table: &str) -> ExecutorResult<bool> {
        Ok(self
            .runtime
            .block_on(self.client.table_exists(&self.session, database, table))?)
    }

    fn describe_columns(&self, database: &str, table: &str) -> ExecutorResult<Vec<String>> {
        Ok(self
            .runtime
            .block_on(self.client.table_columns(&self.session, database, table))?)
    }
}
