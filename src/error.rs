//! Error types.
//!
//! Planning failures are split by how the workload driver reacts to them:
//! SQL failures skip the current query, a missing prejoin may stop the run,
//! everything else is reported to the caller.

use crate::cache::StoreError;
use crate::config::{ConnectionError, SettingsError, WorkloadError};
use crate::executor::ExecutorError;
use crate::prejoin::PrejoinFileError;

/// Result type for planning operations.
pub type PlanResult<T> = Result<T, PlanError>;

/// Errors raised while planning, materializing, or evaluating samples.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The warehouse rejected a statement or could not be reached.
    #[error(transparent)]
    Sql(#[from] ExecutorError),

    /// A multi-table query has no prejoin to compute statistics from.
    #[error("Prejoin required for query {query} does not exist")]
    StatUnavailable { query: String },

    /// A sample must be drawn through a join that no prejoin provides.
    #[error("Prejoin required for sample does not exist: {sample}")]
    PrejoinRequired { sample: String },

    #[error("Unsupported sample type: {0}")]
    UnsupportedSampleType(String),

    #[error("No fact table among: {0}")]
    MissingFactTable(String),

    #[error("Query {query} has no {template} template")]
    MissingTemplate {
        query: String,
        template: &'static str,
    },

    #[error("Sample not found: {0}")]
    SampleNotFound(String),

    #[error("Query not found: {0}")]
    QueryNotFound(String),

    #[error("Stat table does not exist for query {query}")]
    StatTableMissing { query: String },

    /// A stratified sample is scored on a query whose groups do not
    /// determine the sample's strata, so no per-group weight applies.
    #[error("Cannot scale sample {sample} for query {query}: its strata are not among the query's groups")]
    UnscalableSample { sample: String, query: String },

    #[error("Failed to clear caches: {0}")]
    CacheFlush(#[source] std::io::Error),

    #[error(transparent)]
    PrejoinFile(#[from] PrejoinFileError),
}

impl PlanError {
    /// Whether the workload driver should stop instead of moving on.
    pub fn is_missing_prejoin(&self) -> bool {
        matches!(self, PlanError::StatUnavailable { .. })
    }
}

/// Top-level error for the command-line tool.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Workload(#[from] WorkloadError),

    #[error("Metadata store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}
