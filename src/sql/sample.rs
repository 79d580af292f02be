//! Sample table DDL and fill statements.
//!
//! A sample is created empty with the source's schema, then filled with
//! `INSERT OVERWRITE` so a failed fill leaves an empty table rather than a
//! half-written one.

use std::collections::BTreeSet;

use super::{column_equalities, prefixed_columns};

/// Empty copy of `source`'s schema.
pub fn create_like(sample: &str, source: &str) -> String {
    format!("CREATE TABLE {} LIKE {} STORED AS parquet", sample, source)
}

/// Bernoulli sample keeping each row with probability `ratio`.
pub fn select_uniform(source: &str, columns: &[String], ratio: f64) -> String {
    format!(
        "SELECT {} FROM {} WHERE rand(unix_timestamp()) < {:.6}",
        columns.join(", "),
        source,
        ratio
    )
}

/// Rows within each group's Cochran target, plus a thin random tail so
/// groups just past their target are not cut off abruptly.
pub fn select_stratified(
    source: &str,
    stat_table: &str,
    columns: &[String],
    qcs: &BTreeSet<String>,
) -> String {
    let partition = prefixed_columns("fact", qcs);
    format!(
        "SELECT {cols} FROM (\
         SELECT fact.*, row_number() OVER (PARTITION BY {partition} ORDER BY rand()) AS rownum, \
         count(*) OVER (PARTITION BY {partition}) AS groupsize, \
         stat.target_group_sample_size AS target_group_sample_size \
         FROM {source} AS fact, {stat_table} AS stat WHERE {join}) tmp \
         WHERE tmp.rownum <= tmp.target_group_sample_size OR \
         (tmp.rownum > tmp.target_group_sample_size AND \
         rand(unix_timestamp()) < (tmp.target_group_sample_size / 20) / tmp.groupsize)",
        cols = columns.join(", "),
        join = column_equalities("fact", "stat", qcs),
    )
}

/// Up to `min_row` random rows of every group of `group_columns`.
pub fn select_stratified2(
    source: &str,
    columns: &[String],
    group_columns: &BTreeSet<String>,
    min_row: u64,
) -> String {
    format!(
        "SELECT {cols} FROM (\
         SELECT src.*, row_number() OVER (PARTITION BY {partition} ORDER BY rand()) AS rownum \
         FROM {source} AS src) tmp WHERE tmp.rownum <= {min_row}",
        cols = columns.join(", "),
        partition = prefixed_columns("src", group_columns),
    )
}

/// `INSERT OVERWRITE TABLE <sample> <select>`.
pub fn insert_overwrite(sample: &str, select: &str) -> String {
    format!("INSERT OVERWRITE TABLE {} {}", sample, select)
}
