use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::protocol::{Fault, FaultKind};

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("SQL worker binary not found; set worker.path in the config file")]
    NotFound,

    #[error("cannot start SQL worker {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write to SQL worker: {0}")]
    Write(#[source] io::Error),

    #[error("cannot encode {method} request: {source}")]
    Encode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot decode {method} reply: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{method} timed out after {seconds} s")]
    Timeout { method: String, seconds: u64 },

    #[error("SQL worker exited")]
    Exited,

    #[error("cannot connect to warehouse: {0}")]
    Connection(String),

    /// Statement rejected by the engine.
    #[error("{0}")]
    Sql(String),

    #[error("worker rejected request: {0}")]
    BadRequest(String),

    #[error("worker fault: {0}")]
    Other(String),
}

impl From<Fault> for WorkerError {
    fn from(fault: Fault) -> Self {
        match fault.kind {
            FaultKind::Connection => Self::Connection(fault.message),
            FaultKind::Sql => Self::Sql(fault.message),
            FaultKind::BadRequest => Self::BadRequest(fault.message),
            FaultKind::Other => Self::Other(fault.message),
        }
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for WorkerError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Self::Exited
    }
}
