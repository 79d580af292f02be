//! Materialized join tables ("prejoins").

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{ColumnPair, Query};
use crate::cache::short_hash;

/// Name prefix shared by every prejoin table.
pub const PREJOIN_PREFIX: &str = "prejoin_";

/// A materialized join result that can stand in for a query's join graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prejoin {
    pub name: String,
    pub database: String,
    pub fact_table_name: String,
    pub table_set: BTreeSet<String>,
    pub join_column_set: BTreeSet<ColumnPair>,
}

impl Prejoin {
    /// Build a prejoin definition with an explicit name.
    pub fn new<T, J>(
        name: impl Into<String>,
        database: impl Into<String>,
        fact_table: impl Into<String>,
        tables: T,
        joins: J,
    ) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        J: IntoIterator<Item = ColumnPair>,
    {
        Self {
            name: name.into(),
            database: database.into(),
            fact_table_name: fact_table.into(),
            table_set: tables.into_iter().map(Into::into).collect(),
            join_column_set: joins.into_iter().collect(),
        }
    }

    /// Candidate prejoin covering exactly `query`'s join graph.
    ///
    /// Returns `None` for single-table queries and for queries without a fact
    /// table. The name is derived from the content, so the same join graph
    /// always maps to the same table.
    pub fn for_query(database: &str, query: &Query) -> Option<Self> {
        if !query.is_join() {
            return None;
        }
        let fact = query.fact_table()?;
        let mut prejoin = Self::new(
            "",
            database,
            fact,
            query.joined_tables.iter().cloned(),
            query.join_columns.iter().cloned(),
        );
        prejoin.name = prejoin.generated_name();
        Some(prejoin)
    }

    /// `prejoin_<database>_<8 hex chars of the content hash>`.
    pub fn generated_name(&self) -> String {
        let content = (&self.fact_table_name, &self.table_set, &self.join_column_set);
        format!(
            "{}{}_{}",
            PREJOIN_PREFIX,
            self.database,
            short_hash(&content, 8)
        )
    }

    /// Metadata-store key: `<database>.<name>`.
    ///
    /// Imported prejoins keep their own names, so the key is scoped by
    /// database rather than by the generated-name prefix.
    pub fn key(&self) -> String {
        format!("{}{}", Self::key_prefix(&self.database), self.name)
    }

    /// Metadata-store key prefix for all prejoins of `database`.
    pub fn key_prefix(database: &str) -> String {
        format!("{}.", database)
    }

    pub fn table_count(&self) -> usize {
        self.table_set.len()
    }

    /// Whether this prejoin can replace `other`.
    ///
    /// Requires the same database and fact table, and superset table and
    /// join-column sets. A differing join predicate means no containment even
    /// when the joins would be equivalent.
    pub fn contains(&self, other: &Prejoin) -> bool {
        self.database == other.database
            && self.fact_table_name == other.fact_table_name
            && self.table_set.is_superset(&other.table_set)
            && self.join_column_set.is_superset(&other.join_column_set)
    }

    /// Whether this prejoin can serve as the source table for `query`.
    pub fn supports(&self, database: &str, query: &Query) -> bool {
        if self.database != database {
            return false;
        }
        if query.fact_table() != Some(self.fact_table_name.as_str()) {
            return false;
        }
        // Query pairs are canonical on construction, so a plain subset check
        // compares normalized predicates.
        self.table_set.is_superset(&query.joined_tables)
            && self.join_column_set.is_superset(&query.join_columns)
    }

    /// Whether the prejoin includes every table in `tables` for `fact_table`.
    ///
    /// Used for manual samples that name tables but no join predicates.
    pub fn covers_tables(&self, database: &str, fact_table: &str, tables: &BTreeSet<String>) -> bool {
        self.database == database
            && self.fact_table_name == fact_table
            && self.table_set.is_superset(tables)
    }
}
