//! Sample accuracy and timing.

use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use super::Planner;
use crate::error::{PlanError, PlanResult};
use crate::model::{Query, Sample, SampleType};
use crate::sql;
use crate::sql::evaluate::Scale;

/// Clears engine and OS caches before a timed run.
pub trait CacheFlusher {
    fn flush(&self) -> std::io::Result<()>;
}

/// Runs an external script to clear caches.
#[derive(Debug, Clone)]
pub struct ScriptCacheFlusher {
    script: PathBuf,
}

impl ScriptCacheFlusher {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl CacheFlusher for ScriptCacheFlusher {
    fn flush(&self) -> std::io::Result<()> {
        tracing::debug!(script = %self.script.display(), "clearing caches");
        let status = Command::new(&self.script).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(std::io::Error::other(format!(
                "{} exited with {}",
                self.script.display(),
                status
            )))
        }
    }
}

/// Accuracy of one sample for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub sample: String,
    pub query_id: String,
    pub original_groups: u64,
    pub sample_groups: u64,
    /// Fraction of the original groups absent from the sample result.
    pub missing_group_ratio: f64,
    /// Mean relative error over aggregate columns and matching groups.
    /// `None` when the query has no aggregate columns or no group matched.
    pub avg_error: Option<f64>,
    pub original_time: Option<Duration>,
    pub sample_time: Option<Duration>,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Query {} on {}: missing groups = {:.4} % ({} of {})",
            self.query_id,
            self.sample,
            self.missing_group_ratio * 100.0,
            self.original_groups.saturating_sub(self.sample_groups),
            self.original_groups
        )?;
        if let Some(err) = self.avg_error {
            write!(f, ", avg error = {:.4} %", err * 100.0)?;
        }
        if let (Some(orig), Some(sample)) = (self.original_time, self.sample_time) {
            write!(
                f,
                ", time = {:.3} s (original {:.3} s)",
                sample.as_secs_f64(),
                orig.as_secs_f64()
            )?;
        }
        Ok(())
    }
}

impl Planner<'_> {
    /// Compare `query` run on its fact table with the same query run on
    /// `sample`.
    ///
    /// Both results are materialized into scratch tables that are dropped
    /// afterwards, whether or not the comparison succeeds. With a `flusher`,
    /// caches are cleared before each materialization and both are timed.
    ///
    /// Sampled aggregates are scaled back to population size: by `1 / ratio`
    /// for a uniform sample, and by a per-stratum weight for stratified
    /// samples. Templates reading `STAT_TABLE` scale themselves.
    pub fn evaluate(
        &self,
        sample: &Sample,
        query: &Query,
        flusher: Option<&dyn CacheFlusher>,
    ) -> PlanResult<Evaluation> {
        if query.query.trim().is_empty() {
            return Err(PlanError::MissingTemplate {
                query: query.id.clone(),
                template: "sql",
            });
        }
        if query.sample_query.trim().is_empty() {
            return Err(PlanError::MissingTemplate {
                query: query.id.clone(),
                template: "sample_sql",
            });
        }
        let fact = query
            .fact_table()
            .ok_or_else(|| PlanError::MissingFactTable(query.join_table_name()))?;

        let uses_stat = sql::uses_stat_table(&query.sample_query);
        let stat_table = if uses_stat {
            Some(self.stat_table_for(sample, query)?)
        } else {
            None
        };
        let weights = if uses_stat || query.agg_columns.is_empty() {
            None
        } else {
            self.sample_weights(sample, query)?
        };
        let scale = match (&weights, sample.sample_type) {
            (Some(weights), _) => Scale::PerGroup {
                weights: weights.as_str(),
                strata: &sample.columns,
            },
            (None, SampleType::Uniform) if !uses_stat && sample.ratio > 0.0 => {
                Scale::Constant(1.0 / sample.ratio)
            }
            _ => Scale::Constant(1.0),
        };

        let original_sql = sql::render_template(&query.query, &self.table(fact), None);
        let sample_sql = sql::render_template(
            &query.sample_query,
            &self.table(&sample.name()),
            stat_table.as_deref(),
        );

        let original_table = self.table(&format!("eval_q{}_orig", query.id));
        let sample_table = self.table(&format!("eval_q{}_sample", query.id));
        self.executor.execute(&sql::drop_table(&original_table))?;
        self.executor.execute(&sql::drop_table(&sample_table))?;

        let compare = || -> PlanResult<Evaluation> {
            let original_time = self.materialize_result(&original_table, &original_sql, flusher)?;
            let sample_time = self.materialize_result(&sample_table, &sample_sql, flusher)?;

            let original_groups = self
                .executor
                .query(&sql::evaluate::count_rows(&original_table))?
                .get_u64(0, "group_count")?;
            let sample_groups = self
                .executor
                .query(&sql::evaluate::count_rows(&sample_table))?
                .get_u64(0, "group_count")?;
            let missing_group_ratio = if original_groups == 0 {
                0.0
            } else {
                original_groups.saturating_sub(sample_groups) as f64 / original_groups as f64
            };

            let avg_error = if query.agg_columns.is_empty() {
                None
            } else {
                let rs = self.executor.query(&sql::evaluate::avg_relative_error(
                    &original_table,
                    &sample_table,
                    &query.group_by_columns,
                    &query.agg_columns,
                    scale,
                ))?;
                if rs.value(0, "avg_error")?.is_null() {
                    None
                } else {
                    Some(rs.get_f64(0, "avg_error")?)
                }
            };

            Ok(Evaluation {
                sample: sample.name(),
                query_id: query.id.clone(),
                original_groups,
                sample_groups,
                missing_group_ratio,
                avg_error,
                original_time,
                sample_time,
            })
        };
        let outcome = compare();
        let dropped = self.drop_scratch(&[original_table.as_str(), sample_table.as_str()]);
        let evaluation = outcome?;
        dropped?;

        tracing::info!(%evaluation, "evaluated sample");
        Ok(evaluation)
    }

    /// Evaluate every persisted sample against the workload query it was
    /// proposed for. Samples without a matching query are skipped, and
    /// failures are logged.
    pub fn evaluate_all(
        &self,
        queries: &[Query],
        flusher: Option<&dyn CacheFlusher>,
    ) -> Vec<Evaluation> {
        let mut evaluations = Vec::new();
        for sample in self.meta.samples(&self.database) {
            let Some(source) = sample.query.as_ref() else {
                tracing::debug!(sample = %sample, "sample has no query, skipping");
                continue;
            };
            let query = queries.iter().find(|q| q.id == source.id).unwrap_or(source);
            match self.evaluate(&sample, query, flusher) {
                Ok(evaluation) => evaluations.push(evaluation),
                Err(e) => tracing::error!(sample = %sample, query = %query.id, error = %e, "evaluation failed"),
            }
        }
        evaluations
    }

    /// Evaluate the sample named `name` against the workload queries `ids`.
    pub fn evaluate_named(
        &self,
        name: &str,
        ids: &[String],
        queries: &[Query],
        flusher: Option<&dyn CacheFlusher>,
    ) -> PlanResult<Vec<Evaluation>> {
        let sample = self
            .meta
            .sample(&self.database, name)
            .ok_or_else(|| PlanError::SampleNotFound(name.to_string()))?;
        ids.iter()
            .map(|id| {
                let query = queries
                    .iter()
                    .find(|q| &q.id == id)
                    .ok_or_else(|| PlanError::QueryNotFound(id.clone()))?;
                self.evaluate(&sample, query, flusher)
            })
            .collect()
    }

    /// Qualified statistics table the sample was drawn with; it must exist.
    fn stat_table_for(&self, sample: &Sample, query: &Query) -> PlanResult<String> {
        let source = sample.query.as_ref().unwrap_or(query);
        let name = sql::stats::stat_table_name(&source.unique_name(), sample.z(), sample.e());
        if !self.executor.table_exists(&self.database, &name)? {
            return Err(PlanError::StatTableMissing {
                query: query.id.clone(),
            });
        }
        Ok(self.table(&name))
    }

    /// Query yielding one `weight` per stratum, or `None` for uniform samples.
    ///
    /// Weights join on the sample's strata, so those must all be grouped on
    /// by `query`.
    fn sample_weights(&self, sample: &Sample, query: &Query) -> PlanResult<Option<String>> {
        if sample.sample_type == SampleType::Uniform {
            return Ok(None);
        }
        if sample.columns.is_empty() || !sample.columns.is_subset(&query.group_by_columns) {
            return Err(PlanError::UnscalableSample {
                sample: sample.name(),
                query: query.id.clone(),
            });
        }
        let weights = match sample.sample_type {
            SampleType::Stratified => {
                let stat_table = self.stat_table_for(sample, query)?;
                sql::evaluate::stratified_weights(&stat_table, &sample.columns)
            }
            _ => sql::evaluate::capped_weights(
                &self.stratified2_source(sample)?,
                &sample.columns,
                sample.min_row,
            ),
        };
        Ok(Some(weights))
    }

    /// Drop every table, returning the first failure.
    fn drop_scratch(&self, tables: &[&str]) -> PlanResult<()> {
        let mut first = Ok(());
        for table in tables {
            if let Err(e) = self.executor.execute(&sql::drop_table(table)) {
                tracing::warn!(table = %table, error = %e, "cannot drop scratch table");
                if first.is_ok() {
                    first = Err(e.into());
                }
            }
        }
        first
    }

    fn materialize_result(
        &self,
        table: &str,
        select: &str,
        flusher: Option<&dyn CacheFlusher>,
    ) -> PlanResult<Option<Duration>> {
        let statement = sql::create_table_as(table, select);
        match flusher {
            Some(flusher) => {
                flusher.flush().map_err(PlanError::CacheFlush)?;
                let start = Instant::now();
                self.executor.execute(&statement)?;
                Ok(Some(start.elapsed()))
            }
            None => {
                self.executor.execute(&statement)?;
                Ok(None)
            }
        }
    }
}
