//! Sample type decision.

use std::fmt;

use super::Thresholds;
use crate::model::{Query, Sample, Stat};

/// Outcome of the threshold rule for one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Groups are large enough that a uniform sample keeps each of them
    /// above the threshold.
    Uniform { ratio: f64 },
    /// Per-group targets from the statistics table.
    Stratified { ratio: f64 },
    /// The best candidate would not reduce I/O enough.
    NoViableSample { ratio: f64 },
    /// The source has no rows.
    Empty,
}

/// Apply the threshold rule to `stat`.
pub fn decide(stat: &Stat, thresholds: &Thresholds) -> Decision {
    if stat.population_size == 0 {
        return Decision::Empty;
    }

    if stat.avg_group_size > thresholds.uniform_threshold {
        let ratio = thresholds.uniform_threshold / stat.avg_group_size;
        if ratio <= thresholds.min_io_reduction_ratio {
            Decision::Uniform { ratio }
        } else {
            Decision::NoViableSample { ratio }
        }
    } else {
        let ratio = stat.stratified_ratio();
        if ratio <= thresholds.min_io_reduction_ratio {
            Decision::Stratified { ratio }
        } else {
            Decision::NoViableSample { ratio }
        }
    }
}

impl Decision {
    /// Sample implementing the decision, if any.
    pub fn sample(
        &self,
        database: &str,
        query: &Query,
        fact_table: &str,
        thresholds: &Thresholds,
    ) -> Option<Sample> {
        match *self {
            Decision::Uniform { ratio } => Some(Sample::uniform(database, query, fact_table, ratio)),
            Decision::Stratified { .. } => Some(Sample::stratified(
                database,
                query,
                fact_table,
                thresholds.z,
                thresholds.e,
            )),
            Decision::NoViableSample { .. } | Decision::Empty => None,
        }
    }

    pub fn ratio(&self) -> Option<f64> {
        match *self {
            Decision::Uniform { ratio }
            | Decision::Stratified { ratio }
            | Decision::NoViableSample { ratio } => Some(ratio),
            Decision::Empty => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Uniform { ratio } => write!(f, "uniform ({:.6} %)", ratio * 100.0),
            Decision::Stratified { ratio } => write!(f, "stratified ({:.2} %)", ratio * 100.0),
            Decision::NoViableSample { ratio } => {
                write!(f, "No viable samples (ratio = {:.2} %).", ratio * 100.0)
            }
            Decision::Empty => f.write_str("empty population"),
        }
    }
}
