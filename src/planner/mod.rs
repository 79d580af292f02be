//! Sampling planner.
//!
//! For every workload query the planner obtains group statistics (from the
//! metadata store, or with one aggregate scan over the query's source table),
//! decides between a uniform sample, a stratified sample, or none, and can
//! materialize the decision:
//!
//! ```text
//! workload ──> PrejoinCatalog ──> collect_stat ──> decide ──> create_sample
//!                 (validate,        (Meta cache,      (thresholds)   (CTAS / INSERT
//!                  consolidate)      stat table)                      OVERWRITE)
//! ```
//!
//! Every step runs synchronously through the [`SqlExecutor`] in workload
//! order.

mod decision;
mod evaluate;
mod materialize;
mod stats;
mod workload;

pub use decision::{decide, Decision};
pub use evaluate::{CacheFlusher, Evaluation, ScriptCacheFlusher};
pub use materialize::Materialization;
pub use stats::{s0, target_group_sample_size};
pub use workload::{QueryOutcome, QueryReport, WorkloadReport};

use crate::cache::Meta;
use crate::config::{PlannerSettings, SamplingSettings};
use crate::executor::SqlExecutor;
use crate::model::{DEFAULT_E, DEFAULT_Z};
use crate::prejoin::PrejoinCatalog;

/// Parameters of the sampling decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Confidence coefficient of the per-group targets.
    pub z: f64,
    /// Margin of error of the per-group targets.
    pub e: f64,
    /// Average group size above which a uniform sample is considered.
    pub uniform_threshold: f64,
    /// Largest sample/population ratio still worth materializing.
    pub min_io_reduction_ratio: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            z: DEFAULT_Z,
            e: DEFAULT_E,
            uniform_threshold: 100_000.0,
            min_io_reduction_ratio: 2.0 / 3.0,
        }
    }
}

impl From<&SamplingSettings> for Thresholds {
    fn from(s: &SamplingSettings) -> Self {
        Self {
            z: s.z,
            e: s.e,
            uniform_threshold: s.uniform_threshold,
            min_io_reduction_ratio: s.min_io_reduction_ratio,
        }
    }
}

/// What a run is allowed to do beyond planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOptions {
    /// Materialize proposed samples.
    pub create: bool,
    /// Drop and recreate samples whose table already exists.
    pub overwrite: bool,
    /// Stop the workload when a multi-table query has no prejoin.
    pub abort_on_missing_prejoin: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            create: false,
            overwrite: false,
            abort_on_missing_prejoin: true,
        }
    }
}

impl From<&PlannerSettings> for PlanOptions {
    fn from(s: &PlannerSettings) -> Self {
        Self {
            abort_on_missing_prejoin: s.abort_on_missing_prejoin,
            ..Default::default()
        }
    }
}

/// Plans and materializes samples for one database.
pub struct Planner<'a> {
    executor: &'a dyn SqlExecutor,
    meta: &'a Meta<'a>,
    database: String,
    catalog: PrejoinCatalog,
    thresholds: Thresholds,
    options: PlanOptions,
}

impl<'a> Planner<'a> {
    /// Planner over `database` seeded with the prejoins persisted in `meta`.
    pub fn new(executor: &'a dyn SqlExecutor, meta: &'a Meta<'a>, database: impl Into<String>) -> Self {
        let database = database.into();
        Self {
            executor,
            meta,
            catalog: PrejoinCatalog::load(meta, &database),
            database,
            thresholds: Thresholds::default(),
            options: PlanOptions::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_options(mut self, options: PlanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn options(&self) -> &PlanOptions {
        &self.options
    }

    pub fn catalog(&self) -> &PrejoinCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut PrejoinCatalog {
        &mut self.catalog
    }

    fn table(&self, name: &str) -> String {
        crate::sql::qualified(&self.database, name)
    }
}
