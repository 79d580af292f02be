//! Accuracy evaluation queries.
//!
//! Exact and sampled answers are materialized into result tables, then
//! compared group by group.

use std::collections::BTreeSet;

use super::column_equalities;

pub fn count_rows(table: &str) -> String {
    format!("SELECT count(*) AS group_count FROM {}", table)
}

/// Factor applied to sampled aggregates before comparing them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale<'a> {
    /// Same factor for every group.
    Constant(f64),
    /// `weight` column of the `weights` query, joined on `strata`.
    PerGroup {
        weights: &'a str,
        strata: &'a BTreeSet<String>,
    },
}

/// Mean relative error of the sampled aggregates over matching groups.
///
/// Groups with an exact value of zero contribute `NULL` and are skipped by
/// `avg`.
pub fn avg_relative_error(
    original: &str,
    sampled: &str,
    group_by: &BTreeSet<String>,
    aggregates: &BTreeSet<String>,
    scale: Scale<'_>,
) -> String {
    let mut from = format!("{original} o, {sampled} s");
    let mut conditions = Vec::new();
    if !group_by.is_empty() {
        conditions.push(column_equalities("o", "s", group_by));
    }
    let factor = match scale {
        Scale::Constant(factor) => factor.to_string(),
        Scale::PerGroup { weights, strata } => {
            from.push_str(&format!(", ({weights}) w"));
            if !strata.is_empty() {
                conditions.push(column_equalities("o", "w", strata));
            }
            "w.weight".to_string()
        }
    };

    let terms = aggregates
        .iter()
        .map(|c| format!("abs(s.{c} * {factor} - o.{c}) / abs(o.{c})"))
        .collect::<Vec<_>>()
        .join(" + ");
    let filter = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    format!(
        "SELECT avg(err) AS avg_error FROM (SELECT ({terms}) / {n} AS err FROM {from}{filter}) t",
        n = aggregates.len().max(1),
    )
}

/// Population rows per sampled row for each stratum of a Cochran sample.
///
/// A group keeps `floor(target)` rows outright and each further row with
/// probability `(target / 20) / groupsize`.
pub fn stratified_weights(stat_table: &str, strata: &BTreeSet<String>) -> String {
    let cols = strata.iter().cloned().collect::<Vec<_>>().join(", ");
    format!(
        "SELECT {cols}, groupsize / (least(groupsize, floor(target_group_sample_size)) + \
         greatest(groupsize - floor(target_group_sample_size), 0) * \
         (target_group_sample_size / 20) / groupsize) AS weight FROM {stat_table}"
    )
}

/// Population rows per sampled row when each group keeps at most `min_row`.
pub fn capped_weights(source: &str, strata: &BTreeSet<String>, min_row: u64) -> String {
    let cols = strata.iter().cloned().collect::<Vec<_>>().join(", ");
    format!(
        "SELECT {cols}, count(*) / least(count(*), {min_row}) AS weight FROM {source} GROUP BY {cols}"
    )
}
