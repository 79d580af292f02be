//! SQL worker communication.
//!
//! The warehouse is reached through an external worker process that owns the
//! database drivers. This crate stays driver-agnostic and speaks a small
//! NDJSON protocol to it, one session per warehouse.
//!
//! ```text
//!  WorkerExecutor (blocking)
//!        │
//!  WorkerClient (Tokio) ──stdin──▶  worker process
//!        ▲                            session.open
//!        └──────────stdout───────     sql.execute / sql.query
//!                                     table.exists / table.columns
//! ```

mod client;
mod error;
pub mod protocol;

pub use client::WorkerClient;
pub use error::{WorkerError, WorkerResult};
pub use protocol::Target;
