//! Sample table definitions.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::query::join_set;
use super::Query;

/// Default confidence coefficient (99% confidence).
pub const DEFAULT_Z: f64 = 2.576;

/// Default margin of error (1%).
pub const DEFAULT_E: f64 = 0.01;

/// Key suffix for sample records in the metadata store.
pub const SAMPLE_SUFFIX: &str = ".sample";

/// Kind of sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SampleType {
    /// Every row kept independently with probability `ratio`.
    Uniform,
    /// Per-group target sizes derived from `z` and `e`.
    Stratified,
    /// A fixed minimum number of rows per group.
    Stratified2,
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SampleType::Uniform => "uniform",
            SampleType::Stratified => "stratified",
            SampleType::Stratified2 => "stratified2",
        };
        f.write_str(s)
    }
}

/// A reproducible sample of a fact table.
///
/// [`Sample::name`] is a pure function of table, type, parameters, and
/// columns; it is the physical table name inside `database` and, prefixed
/// with the database, the metadata key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sample {
    /// Database holding the sample table.
    pub database: String,

    /// Query the sample was proposed for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,

    /// Fact table the sample is drawn from.
    pub table: String,

    /// Tables of the join graph the sample must be drawn through.
    pub join_tables: BTreeSet<String>,

    /// Grouping (stratification) columns.
    pub columns: BTreeSet<String>,

    #[serde(rename = "type")]
    pub sample_type: SampleType,

    /// Row retention probability (uniform).
    pub ratio: f64,

    /// Confidence coefficient (stratified).
    pub z: f64,

    /// Margin of error (stratified).
    pub e: f64,

    /// Rows kept per group (stratified2).
    pub min_row: u64,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            database: String::new(),
            query: None,
            table: String::new(),
            join_tables: BTreeSet::new(),
            columns: BTreeSet::new(),
            sample_type: SampleType::Uniform,
            ratio: 0.0,
            z: DEFAULT_Z,
            e: DEFAULT_E,
            min_row: 0,
        }
    }
}

impl Sample {
    fn base(sample_type: SampleType, database: &str, query: Option<&Query>, table: &str) -> Self {
        Self {
            database: database.to_string(),
            query: query.cloned(),
            table: table.to_string(),
            sample_type,
            ..Default::default()
        }
    }

    /// Uniform sample of `query`'s fact table.
    pub fn uniform(database: &str, query: &Query, table: &str, ratio: f64) -> Self {
        Self {
            join_tables: query.joined_tables.clone(),
            columns: query.query_column_set.clone(),
            ratio,
            ..Self::base(SampleType::Uniform, database, Some(query), table)
        }
    }

    /// Stratified sample over `query`'s QCS with confidence `z` and error `e`.
    pub fn stratified(database: &str, query: &Query, table: &str, z: f64, e: f64) -> Self {
        Self {
            join_tables: query.joined_tables.clone(),
            columns: query.query_column_set.clone(),
            z,
            e,
            ..Self::base(SampleType::Stratified, database, Some(query), table)
        }
    }

    /// Stratified sample keeping `min_row` rows per group, without a query.
    pub fn stratified2<T, C>(
        database: &str,
        table: &str,
        join_tables: T,
        columns: C,
        min_row: u64,
    ) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            join_tables: join_tables.into_iter().map(Into::into).collect(),
            columns: columns.into_iter().map(Into::into).collect(),
            min_row,
            ..Self::base(SampleType::Stratified2, database, None, table)
        }
    }

    /// Confidence coefficient, falling back to the default when unset.
    pub fn z(&self) -> f64 {
        if self.z == 0.0 {
            DEFAULT_Z
        } else {
            self.z
        }
    }

    /// Margin of error, falling back to the default when unset.
    pub fn e(&self) -> f64 {
        if self.e == 0.0 {
            DEFAULT_E
        } else {
            self.e
        }
    }

    pub fn column_string(&self) -> String {
        join_set(&self.columns, "_")
    }

    /// Canonical sample name.
    ///
    /// Uniform samples do not depend on the grouping columns, so their name
    /// omits them and one uniform sample serves every QCS.
    pub fn name(&self) -> String {
        match self.sample_type {
            SampleType::Uniform => {
                format!("{}__{}", self.table, dotless(&format!("uf_{:.4}", self.ratio)))
            }
            SampleType::Stratified => format!(
                "{}__{}__{}",
                self.table,
                dotless(&format!("st_{:.4}_{:.4}", self.z(), self.e())),
                self.column_string()
            ),
            SampleType::Stratified2 => format!(
                "{}__st2_{}__{}",
                self.table,
                self.min_row,
                self.column_string()
            ),
        }
    }

    /// Metadata-store key for this sample.
    pub fn key(&self) -> String {
        Self::key_for(&self.database, &self.name())
    }

    /// Metadata-store key of the sample called `name` in `database`.
    pub fn key_for(database: &str, name: &str) -> String {
        format!("{}{}{}", Self::key_prefix(database), name, SAMPLE_SUFFIX)
    }

    /// Prefix shared by the keys of every sample in `database`.
    pub fn key_prefix(database: &str) -> String {
        format!("{}.", database)
    }

    /// Whether the sample must be drawn from a join of several tables.
    pub fn needs_join(&self) -> bool {
        self.join_tables.len() > 1
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Replace `.` so a formatted number can appear in a table name.
pub(crate) fn dotless(s: &str) -> String {
    s.replace('.', "_")
}
