//! SQL text generation.
//!
//! Every statement the planner issues is rendered here, in the warehouse's
//! Hive/Impala dialect:
//!
//! - [`prejoin`] - materialized joins
//! - [`stats`] - per-group statistics table and its summary scan
//! - [`sample`] - sample DDL and the uniform/stratified fill statements
//! - [`evaluate`] - result tables and accuracy queries
//!
//! Table arguments are expected to be qualified (`database.table`).

pub mod evaluate;
pub mod prejoin;
pub mod sample;
pub mod stats;

#[cfg(test)]
pub mod test_utils;

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{ColumnPair, FACT_TABLE_TOKEN, STAT_TABLE_TOKEN};

static FACT_TABLE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b{}\b", FACT_TABLE_TOKEN)).unwrap());

static STAT_TABLE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b{}\b", STAT_TABLE_TOKEN)).unwrap());

/// `database.table`.
pub fn qualified(database: &str, table: &str) -> String {
    format!("{}.{}", database, table)
}

/// Single-quoted string literal with backslash escapes.
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Join predicates as `a = b AND c = d`.
pub fn join_predicates<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = &'a ColumnPair>,
{
    pairs
        .into_iter()
        .map(ColumnPair::predicate)
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Comma-separated columns, each prefixed with `alias.`.
pub fn prefixed_columns<'a, I>(alias: &str, columns: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    columns
        .into_iter()
        .map(|c| format!("{}.{}", alias, c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `l.c = r.c AND ...` for every column.
pub fn column_equalities(left: &str, right: &str, columns: &BTreeSet<String>) -> String {
    columns
        .iter()
        .map(|c| format!("{}.{} = {}.{}", left, c, right, c))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// `CREATE TABLE <table> STORED AS parquet AS <select>`.
pub fn create_table_as(table: &str, select: &str) -> String {
    format!("CREATE TABLE {} STORED AS parquet AS {}", table, select)
}

pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", table)
}

/// Refresh optimizer statistics of `table`.
pub fn compute_stats(table: &str) -> String {
    format!("COMPUTE STATS {}", table)
}

/// Substitute the `FACT_TABLE` and `STAT_TABLE` placeholders of a query
/// template. Tokens only match as whole words. A trailing `;` is dropped so the
/// result can be embedded in a larger statement.
pub fn render_template(template: &str, fact_table: &str, stat_table: Option<&str>) -> String {
    let rendered = FACT_TABLE_PLACEHOLDER.replace_all(template, regex::NoExpand(fact_table));
    let rendered = match stat_table {
        Some(stat) => STAT_TABLE_PLACEHOLDER
            .replace_all(&rendered, regex::NoExpand(stat))
            .into_owned(),
        None => rendered.into_owned(),
    };
    rendered.trim().trim_end_matches(';').trim_end().to_string()
}

/// Whether a template refers to the statistics table.
pub fn uses_stat_table(template: &str) -> bool {
    STAT_TABLE_PLACEHOLDER.is_match(template)
}
