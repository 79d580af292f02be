//! Per-group statistics table.
//!
//! One row per distinct QCS value with its `groupsize` and the Cochran target
//! `target_group_sample_size`, computed with a finite-population correction:
//!
//! ```text
//! s0     = z^2 * 0.25 / e^2
//! target = groupsize * s0 / (groupsize + s0 - 1)
//! ```

use std::collections::BTreeSet;

use super::create_table_as;
use crate::cache::short_hash;
use crate::model::dotless;

/// Name (unqualified) of the statistics table for a query shape and `z`/`e`.
pub fn stat_table_name(query_unique_name: &str, z: f64, e: f64) -> String {
    format!(
        "stat_{}_{}",
        short_hash(&query_unique_name, 8),
        dotless(&format!("{:.4}_{:.4}", z, e))
    )
}

fn s0_expr(z: f64, e: f64) -> String {
    format!("(pow({}, 2) * 0.25 / pow({}, 2))", z, e)
}

/// Aggregate scan producing one row per group of `qcs` in `source`.
pub fn select_group_targets(source: &str, qcs: &BTreeSet<String>, z: f64, e: f64) -> String {
    let cols = qcs.iter().cloned().collect::<Vec<_>>().join(", ");
    let s0 = s0_expr(z, e);
    format!(
        "SELECT {cols}, groupsize, (groupsize * {s0}) / (groupsize + {s0} - 1) AS target_group_sample_size \
         FROM (SELECT {cols}, count(*) AS groupsize FROM {source} GROUP BY {cols}) t"
    )
}

pub fn create_stat_table(
    stat_table: &str,
    source: &str,
    qcs: &BTreeSet<String>,
    z: f64,
    e: f64,
) -> String {
    create_table_as(stat_table, &select_group_targets(source, qcs, z, e))
}

/// Population-level summary of a statistics table.
pub fn summarize(stat_table: &str) -> String {
    format!(
        "SELECT count(*) AS group_count, sum(groupsize) AS population_size, \
         sum(target_group_sample_size) AS target_sample_size, avg(groupsize) AS avg_group_size, \
         min(groupsize) AS min_group_size, max(groupsize) AS max_group_size FROM {}",
        stat_table
    )
}
