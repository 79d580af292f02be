//! Workload queries.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::ColumnPair;

/// Fact tables of the star schema. A query's fact table is the member of its
/// joined tables that appears in this list.
pub const FACT_TABLES: &[&str] = &[
    "store_sales",
    "store_returns",
    "catalog_sales",
    "catalog_returns",
    "web_sales",
    "web_returns",
    "inventory",
];

/// Placeholder token for the fact (or sample) table in query templates.
pub const FACT_TABLE_TOKEN: &str = "FACT_TABLE";

/// Placeholder token for the statistics table in sample query templates.
pub const STAT_TABLE_TOKEN: &str = "STAT_TABLE";

/// Return the first fact table among `tables`, if any.
pub fn find_fact_table<'a, I>(tables: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    tables
        .into_iter()
        .find(|t| FACT_TABLES.contains(&t.to_lowercase().as_str()))
        .map(|t| t.as_str())
}

/// An analytic query of the workload.
///
/// Identity is the `id`: two queries with the same id are equal regardless of
/// their shape, and queries order lexicographically by id.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Query {
    /// Query identifier, e.g. `"42"` or `"31_1"` for a sub-query variant.
    pub id: String,

    /// Query column set: the columns the query groups by.
    #[serde(alias = "qcs")]
    pub query_column_set: BTreeSet<String>,

    /// Tables participating in the join graph.
    #[serde(alias = "tables")]
    pub joined_tables: BTreeSet<String>,

    /// Equi-join predicates.
    #[serde(alias = "joins")]
    pub join_columns: BTreeSet<ColumnPair>,

    /// Output grouping columns used when comparing exact and sampled answers.
    #[serde(alias = "group_by")]
    pub group_by_columns: BTreeSet<String>,

    /// Aggregate output columns compared when evaluating a sample.
    #[serde(alias = "aggregates")]
    pub agg_columns: BTreeSet<String>,

    /// Exact query text with a `FACT_TABLE` placeholder.
    #[serde(alias = "sql")]
    pub query: String,

    /// Sampled query text with `FACT_TABLE` and `STAT_TABLE` placeholders.
    #[serde(alias = "sample_sql")]
    pub sample_query: String,
}

impl Query {
    pub fn new<Q, T, J, P>(id: impl Into<String>, qcs: Q, tables: T, joins: J) -> Self
    where
        Q: IntoIterator,
        Q::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
        J: IntoIterator<Item = P>,
        P: Into<ColumnPair>,
    {
        Self {
            id: id.into(),
            query_column_set: qcs.into_iter().map(Into::into).collect(),
            joined_tables: tables.into_iter().map(Into::into).collect(),
            join_columns: joins.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_sql(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_sample_sql(mut self, sample_query: impl Into<String>) -> Self {
        self.sample_query = sample_query.into();
        self
    }

    pub fn with_group_by<I: IntoIterator<Item = S>, S: Into<String>>(mut self, cols: I) -> Self {
        self.group_by_columns = cols.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_aggregates<I: IntoIterator<Item = S>, S: Into<String>>(mut self, cols: I) -> Self {
        self.agg_columns = cols.into_iter().map(Into::into).collect();
        self
    }

    /// The fact table of this query's join graph.
    pub fn fact_table(&self) -> Option<&str> {
        find_fact_table(&self.joined_tables)
    }

    /// Whether answering this query requires a join.
    pub fn is_join(&self) -> bool {
        self.joined_tables.len() > 1
    }

    /// Query column set joined with `_`.
    pub fn qcs_string(&self) -> String {
        join_set(&self.query_column_set, "_")
    }

    /// Default name for a materialized join of this query's tables.
    pub fn join_table_name(&self) -> String {
        join_set(&self.joined_tables, "_")
    }

    /// Structural fingerprint: sorted tables and sorted QCS.
    ///
    /// Independent of `id`, so differently named queries with the same join
    /// graph and grouping share statistics.
    pub fn unique_name(&self) -> String {
        format!("{}__{}", self.join_table_name(), self.qcs_string())
    }
}

pub(crate) fn join_set<'a, I: IntoIterator<Item = &'a String>>(items: I, sep: &str) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(sep)
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Query {}

impl Hash for Query {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Query {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Query {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}
