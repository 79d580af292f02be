//! Async client for the SQL worker process.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use super::error::{WorkerError, WorkerResult};
use super::protocol::{
    method, Executed, Reply, Request, Rows, SessionOpened, SqlParams, TableColumns, TableExists,
    TableParams, Target,
};
use crate::config::Settings;

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Reply>>>>;

/// Client for the SQL worker.
///
/// The worker runs as a child process. Requests are numbered so replies can
/// arrive in any order; a background task routes each reply to its caller.
/// When the worker exits every outstanding call fails with
/// [`WorkerError::Exited`].
pub struct WorkerClient {
    stdin: Mutex<BufWriter<ChildStdin>>,
    pending: Pending,
    next_id: AtomicU64,
    timeout: Duration,
    router: JoinHandle<()>,
    _child: Child,
}

impl WorkerClient {
    /// Start the worker configured in `settings`.
    pub async fn spawn(settings: &Settings) -> WorkerResult<Self> {
        let path = settings.worker_path().ok_or(WorkerError::NotFound)?;
        Self::launch(
            &path,
            &settings.worker.args,
            Duration::from_secs(settings.worker.timeout_seconds),
        )
        .await
    }

    pub async fn launch(path: &Path, args: &[String], timeout: Duration) -> WorkerResult<Self> {
        let spawn_error = |source: std::io::Error| WorkerError::Spawn {
            path: path.to_path_buf(),
            source,
        };
        let mut child = Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(spawn_error(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "worker pipes not captured",
            )));
        };

        let pending = Pending::default();
        let router = Self::route_replies(stdout, pending.clone());
        tracing::debug!(path = %path.display(), "spawned SQL worker");

        Ok(Self {
            stdin: Mutex::new(BufWriter::new(stdin)),
            pending,
            next_id: AtomicU64::new(1),
            timeout,
            router,
            _child: child,
        })
    }

    fn route_replies(stdout: ChildStdout, pending: Pending) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => match serde_json::from_str::<Reply>(&line) {
                        Ok(reply) => {
                            if let Some(tx) = pending.lock().await.remove(&reply.id) {
                                let _ = tx.send(reply);
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "unparseable worker reply"),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!(error = %e, "worker stdout closed");
                        break;
                    }
                }
            }
            // Dropping the senders fails every waiting call.
            pending.lock().await.clear();
        })
    }

    /// Send one request and decode its result.
    pub async fn call<P, R>(&self, method: &str, params: &P) -> WorkerResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        if !self.is_alive() {
            return Err(WorkerError::Exited);
        }
        let encode_error = |source: serde_json::Error| WorkerError::Encode {
            method: method.to_string(),
            source,
        };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = Request {
            id,
            method,
            params: serde_json::to_value(params).map_err(encode_error)?,
        };
        let mut line = serde_json::to_string(&request).map_err(encode_error)?;
        line.push('\n');

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);
        {
            let mut stdin = self.stdin.lock().await;
            stdin
                .write_all(line.as_bytes())
                .await
                .map_err(WorkerError::Write)?;
            stdin.flush().await.map_err(WorkerError::Write)?;
        }

        let reply = match tokio::time::timeout(self.timeout, rx).await {
            Ok(reply) => reply?,
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(WorkerError::Timeout {
                    method: method.to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        if let Some(fault) = reply.error {
            return Err(fault.into());
        }
        let result = reply
            .result
            .unwrap_or_else(|| Value::Object(Default::default()));
        serde_json::from_value(result).map_err(|source| WorkerError::Decode {
            method: method.to_string(),
            source,
        })
    }

    pub fn is_alive(&self) -> bool {
        !self.router.is_finished()
    }

    /// Open a session on `target`; returns the session id.
    pub async fn open_session(&self, target: &Target) -> WorkerResult<String> {
        let opened: SessionOpened = self.call(method::OPEN_SESSION, target).await?;
        tracing::debug!(driver = %target.driver, session = %opened.session, "worker session opened");
        Ok(opened.session)
    }

    pub async fn execute(&self, session: &str, sql: &str) -> WorkerResult<Executed> {
        self.call(method::EXECUTE, &SqlParams { session, sql }).await
    }

    pub async fn query(&self, session: &str, sql: &str) -> WorkerResult<Rows> {
        self.call(method::QUERY, &SqlParams { session, sql }).await
    }

    pub async fn table_exists(
        &self,
        session: &str,
        database: &str,
        table: &str,
    ) -> WorkerResult<bool> {
        let params = TableParams {
            session,
            database,
            table,
        };
        let reply: TableExists = self.call(method::TABLE_EXISTS, &params).await?;
        Ok(reply.exists)
    }

    pub async fn table_columns(
        &self,
        session: &str,
        database: &str,
        table: &str,
    ) -> WorkerResult<Vec<String>> {
        let params = TableParams {
            session,
            database,
            table,
        };
        let reply: TableColumns = self.call(method::TABLE_COLUMNS, &params).await?;
        Ok(reply.columns)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    // Answers table.exists with true, fails sql.execute, and echoes an
    // empty result for anything else.
    const FAKE_WORKER: &str = r#"
while read -r line; do
  id=${line#*\"id\":}
  id=${id%%,*}
  case "$line" in
    *'"table.exists"'*) printf '{"id":%s,"result":{"exists":true}}\n' "$id" ;;
    *'"sql.execute"'*) printf '{"id":%s,"error":{"kind":"sql","message":"no such table"}}\n' "$id" ;;
    *'"session.open"'*) printf '{"id":%s,"result":{"session":"s1"}}\n' "$id" ;;
    *) printf '{"id":%s}\n' "$id" ;;
  esac
done
"#;

    async fn fake_worker() -> WorkerClient {
        WorkerClient::launch(
            Path::new("sh"),
            &["-c".to_string(), FAKE_WORKER.to_string()],
            Duration::from_secs(10),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_round_trips_through_child_process() {
        let client = fake_worker().await;
        let target = Target {
            driver: "duckdb".to_string(),
            connection_string: ":memory:".to_string(),
        };
        let session = client.open_session(&target).await.unwrap();
        assert_eq!(session, "s1");
        assert!(client.table_exists(&session, "tpcds", "store_sales").await.unwrap());
    }

    #[tokio::test]
    async fn test_sql_fault_maps_to_sql_error() {
        let client = fake_worker().await;
        let err = client.execute("s1", "DROP TABLE tpcds.x").await.unwrap_err();
        assert!(matches!(err, WorkerError::Sql(ref m) if m == "no such table"));
    }

    #[tokio::test]
    async fn test_missing_result_decodes_as_empty_object() {
        let client = fake_worker().await;
        let err = client.query("s1", "SELECT 1").await.unwrap_err();
        assert!(matches!(err, WorkerError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let err = WorkerClient::launch(Path::new("/nonexistent/aqp-worker"), &[], Duration::from_secs(1))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, WorkerError::Spawn { .. }));
    }
}
