//! # aqp
//!
//! Approximate query processing planner for a star-schema warehouse.
//!
//! Given a fixed workload of analytic queries, aqp decides per query whether a
//! sample of the fact table can answer it within an error budget, and which
//! kind: uniform or stratified on the query's grouping columns. Join graphs
//! shared by several queries are materialized once as prejoins.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Workload (config::load_workload)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [prejoin]
//! ┌─────────────────────────────────────────────────────────┐
//! │     PrejoinCatalog: validate, consolidate, lookup        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Stat (cached in Meta) ──> Decision ──> Sample          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql + executor]
//! ┌─────────────────────────────────────────────────────────┐
//! │       SQL text ──> SqlExecutor ──> database worker       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Statistics, prejoins, and samples are remembered in an append-only
//! metadata log ([`cache`]), so repeated runs skip the expensive scans.

pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod model;
pub mod planner;
pub mod prejoin;
pub mod sql;
pub mod worker;

pub use cache::{Meta, MetadataStore, SqliteStore, WarehouseStore};
pub use error::{Error, PlanError, PlanResult};
pub use executor::{MockExecutor, SqlExecutor, WorkerExecutor};
pub use model::{ColumnPair, Prejoin, Query, Sample, SampleType, Stat};
pub use planner::{Decision, PlanOptions, Planner, Thresholds};
pub use prejoin::PrejoinCatalog;
