//! Per-query group statistics.

use serde::{Deserialize, Serialize};

/// Key suffix for statistics records in the metadata store.
pub const TABLE_STAT_SUFFIX: &str = ".tablestat";

/// Group statistics of one query's QCS over its source table.
///
/// Unknown fields in stored records are ignored and missing ones default, so
/// older records still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Stat {
    pub database: String,
    /// Structural name of the query the statistics were computed for.
    pub query_name: String,
    /// Table holding one row per group with `groupsize` and
    /// `target_group_sample_size`.
    pub table_name: String,
    pub population_size: u64,
    pub target_sample_size: f64,
    pub group_count: u64,
    pub avg_group_size: f64,
    pub min_group_size: u64,
    pub max_group_size: u64,
    /// Confidence coefficient the per-group targets were computed with.
    pub z: f64,
    /// Margin of error the per-group targets were computed with.
    pub e: f64,
}

impl Stat {
    /// Metadata-store key for the statistics of `query_name` in `database`.
    pub fn key(database: &str, query_name: &str) -> String {
        format!("{}_{}{}", database, query_name, TABLE_STAT_SUFFIX)
    }

    /// A cached record is usable only if it describes a non-empty population
    /// computed with the requested parameters.
    pub fn is_usable_for(&self, z: f64, e: f64) -> bool {
        self.population_size > 0 && same_param(self.z, z) && same_param(self.e, e)
    }

    /// Fraction of the population a stratified sample would keep.
    pub fn stratified_ratio(&self) -> f64 {
        self.target_sample_size / self.population_size as f64
    }
}

fn same_param(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
