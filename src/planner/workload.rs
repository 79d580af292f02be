//! Workload driver.

use std::fmt;

use super::{decide, Decision, Materialization, Planner};
use crate::error::{PlanError, PlanResult};
use crate::model::{Prejoin, Query, Sample, Stat};

/// What happened to one query.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Planned {
        stat: Stat,
        decision: Decision,
        /// Proposed sample, if the decision produced one.
        sample: Option<Sample>,
        /// Set when samples were materialized.
        materialized: Option<Materialization>,
        /// Why materializing the sample failed.
        create_error: Option<String>,
    },
    /// Planning failed; the run moved on.
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct QueryReport {
    pub query_id: String,
    pub fact_table: String,
    pub qcs: String,
    pub outcome: QueryOutcome,
}

impl fmt::Display for QueryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (stat, decision, sample, materialized, create_error) = match &self.outcome {
            QueryOutcome::Failed { error } => {
                return write!(f, "For query {}: {}", self.query_id, error);
            }
            QueryOutcome::Planned {
                stat,
                decision,
                sample,
                materialized,
                create_error,
            } => (stat, decision, sample, materialized, create_error),
        };

        writeln!(
            f,
            "For query {} (population = {}, target sample size = {:.3}, group count = {}, \
             avg group size = {:.3}, min group size = {}, max group size = {}):",
            self.query_id,
            stat.population_size,
            stat.target_sample_size,
            stat.group_count,
            stat.avg_group_size,
            stat.min_group_size,
            stat.max_group_size
        )?;
        match decision {
            Decision::Uniform { ratio } => write!(
                f,
                "\tCreate {:.6} % uniform sample on {}.",
                ratio * 100.0,
                self.fact_table
            )?,
            Decision::Stratified { ratio } => write!(
                f,
                "\tCreate stratified sample on {} with ({}) for estimated sample size of {:.2} %.",
                self.fact_table,
                self.qcs,
                ratio * 100.0
            )?,
            Decision::NoViableSample { .. } => write!(f, "\t{}", decision)?,
            Decision::Empty => write!(f, "\tSource table is empty.")?,
        }
        if let (Some(sample), Some(materialized)) = (sample, materialized) {
            match materialized {
                Materialization::Created => write!(f, "\n\tCreated {}.", sample)?,
                Materialization::AlreadyExists => write!(f, "\n\t{} already exists.", sample)?,
            }
        }
        if let (Some(sample), Some(error)) = (sample, create_error) {
            write!(f, "\n\tFailed to create {}: {}", sample, error)?;
        }
        Ok(())
    }
}

/// Result of a full workload run.
#[derive(Debug, Clone, Default)]
pub struct WorkloadReport {
    pub prejoins_evicted: Vec<Prejoin>,
    pub prejoins_created: Vec<Prejoin>,
    pub queries: Vec<QueryReport>,
}

impl WorkloadReport {
    /// Queries that failed to plan or whose sample could not be created.
    pub fn failed(&self) -> usize {
        self.queries
            .iter()
            .filter(|q| {
                matches!(
                    q.outcome,
                    QueryOutcome::Failed { .. }
                        | QueryOutcome::Planned {
                            create_error: Some(_),
                            ..
                        }
                )
            })
            .count()
    }
}

impl Planner<'_> {
    /// Plan every query of the workload in order.
    ///
    /// Stale prejoins are evicted and the workload's joins consolidated first.
    /// Queries without a QCS are skipped. A query failure is recorded and the
    /// run continues, except a missing prejoin when
    /// [`PlanOptions::abort_on_missing_prejoin`](super::PlanOptions) is set.
    pub fn plan_workload(&mut self, queries: &[Query]) -> PlanResult<WorkloadReport> {
        let mut report = WorkloadReport {
            prejoins_evicted: self.catalog.validate(self.executor, self.meta)?,
            ..Default::default()
        };
        report.prejoins_created = self.catalog.consolidate(queries, self.executor, self.meta);
        tracing::info!(
            evicted = report.prejoins_evicted.len(),
            created = report.prejoins_created.len(),
            known = self.catalog.len(),
            "prejoins ready"
        );

        for query in queries {
            if query.query_column_set.is_empty() {
                tracing::debug!(query = %query.id, "empty QCS, skipping");
                continue;
            }
            let outcome = match self.plan_query(query) {
                Ok(outcome) => outcome,
                Err(e) if e.is_missing_prejoin() && self.options.abort_on_missing_prejoin => {
                    return Err(e);
                }
                Err(e) => {
                    tracing::error!(query = %query.id, error = %e, "planning failed");
                    QueryOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            report.queries.push(QueryReport {
                query_id: query.id.clone(),
                fact_table: query.fact_table().unwrap_or_default().to_string(),
                qcs: query.query_column_set.iter().cloned().collect::<Vec<_>>().join(", "),
                outcome,
            });
        }
        Ok(report)
    }

    /// Statistics, decision, and optional materialization for one query.
    ///
    /// A failed materialization is kept in the outcome next to the decision;
    /// only a missing prejoin is returned as an error.
    pub fn plan_query(&self, query: &Query) -> PlanResult<QueryOutcome> {
        let fact = query
            .fact_table()
            .ok_or_else(|| PlanError::MissingFactTable(query.join_table_name()))?;
        let stat = self.collect_stat(query)?;
        let decision = decide(&stat, &self.thresholds);
        tracing::info!(query = %query.id, %decision, "sampling decision");

        let sample = decision.sample(&self.database, query, fact, &self.thresholds);
        let (materialized, create_error) = match (&sample, self.options.create) {
            (Some(sample), true) => match self.create_sample(sample) {
                Ok(outcome) => (Some(outcome), None),
                Err(e) if e.is_missing_prejoin() => return Err(e),
                Err(e) => {
                    tracing::error!(query = %query.id, sample = %sample, error = %e, "sample creation failed");
                    (None, Some(e.to_string()))
                }
            },
            _ => (None, None),
        };
        Ok(QueryOutcome::Planned {
            stat,
            decision,
            sample,
            materialized,
            create_error,
        })
    }
}
