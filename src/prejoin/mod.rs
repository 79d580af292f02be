//! Prejoin catalog and consolidation.
//!
//! The catalog holds every prejoin known for one database: those persisted in
//! the metadata store by earlier runs and those created during this one.
//! [`PrejoinCatalog::consolidate`] turns a workload into the smallest set of
//! new join tables by visiting the largest join graphs first, so a smaller
//! graph is usually already covered when its turn comes.

mod file;

pub use file::{import_prejoins, load_prejoin_file, parse_prejoin_line, parse_prejoins, PrejoinFileError};

use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};

use crate::cache::Meta;
use crate::error::PlanResult;
use crate::executor::SqlExecutor;
use crate::model::{Prejoin, Query};
use crate::sql;

/// Prejoins of one database.
#[derive(Debug, Clone, Default)]
pub struct PrejoinCatalog {
    database: String,
    prejoins: Vec<Prejoin>,
}

impl PrejoinCatalog {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            prejoins: Vec::new(),
        }
    }

    /// Catalog seeded with the live prejoins persisted for `database`.
    pub fn load(meta: &Meta<'_>, database: &str) -> Self {
        Self {
            database: database.to_string(),
            prejoins: meta.prejoins(database),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn prejoins(&self) -> &[Prejoin] {
        &self.prejoins
    }

    pub fn len(&self) -> usize {
        self.prejoins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prejoins.is_empty()
    }

    /// Add a prejoin without touching the warehouse or the store.
    pub fn register(&mut self, prejoin: Prejoin) {
        if !self.prejoins.iter().any(|p| p.name == prejoin.name) {
            self.prejoins.push(prejoin);
        }
    }

    /// Soft-delete every prejoin whose table no longer exists.
    ///
    /// Returns the evicted prejoins.
    pub fn validate<E: SqlExecutor + ?Sized>(
        &mut self,
        executor: &E,
        meta: &Meta<'_>,
    ) -> PlanResult<Vec<Prejoin>> {
        let mut evicted = Vec::new();
        let mut kept = Vec::with_capacity(self.prejoins.len());
        for prejoin in self.prejoins.drain(..) {
            if executor.table_exists(&prejoin.database, &prejoin.name)? {
                kept.push(prejoin);
            } else {
                tracing::info!(prejoin = %prejoin.name, "prejoin table missing, evicting");
                meta.remove_prejoin(&prejoin);
                evicted.push(prejoin);
            }
        }
        self.prejoins = kept;
        Ok(evicted)
    }

    /// First prejoin that contains `candidate`.
    pub fn find_containing(&self, candidate: &Prejoin) -> Option<&Prejoin> {
        self.prejoins.iter().find(|p| p.contains(candidate))
    }

    /// Smallest prejoin able to answer `query`'s join.
    pub fn smallest_supporting(&self, query: &Query) -> Option<&Prejoin> {
        smallest(
            self.prejoins
                .iter()
                .filter(|p| p.supports(&self.database, query)),
        )
    }

    /// Smallest prejoin whose tables include `tables` for `fact_table`.
    pub fn smallest_covering(
        &self,
        fact_table: &str,
        tables: &BTreeSet<String>,
    ) -> Option<&Prejoin> {
        smallest(
            self.prejoins
                .iter()
                .filter(|p| p.covers_tables(&self.database, fact_table, tables)),
        )
    }

    /// Materialize the prejoins the workload needs and is not yet covered for.
    ///
    /// Candidates are visited largest join graph first. A candidate already
    /// contained by a known prejoin is skipped; otherwise its table is created
    /// (unless it already exists), persisted, and added to the catalog. A
    /// failed `CREATE` is logged and the candidate dropped.
    ///
    /// Returns the prejoins added by this call.
    pub fn consolidate<E: SqlExecutor + ?Sized>(
        &mut self,
        queries: &[Query],
        executor: &E,
        meta: &Meta<'_>,
    ) -> Vec<Prejoin> {
        let mut added = Vec::new();
        for candidate in candidates(&self.database, queries) {
            if let Some(existing) = self.find_containing(&candidate) {
                tracing::debug!(
                    candidate = %candidate.name,
                    existing = %existing.name,
                    "join already covered"
                );
                continue;
            }

            match materialize(&candidate, executor) {
                Ok(()) => {
                    meta.add_prejoin(&candidate);
                    self.prejoins.push(candidate.clone());
                    added.push(candidate);
                }
                Err(e) => {
                    tracing::error!(prejoin = %candidate.name, error = %e, "failed to create prejoin");
                }
            }
        }
        added
    }
}

fn materialize<E: SqlExecutor + ?Sized>(prejoin: &Prejoin, executor: &E) -> PlanResult<()> {
    if executor.table_exists(&prejoin.database, &prejoin.name)? {
        tracing::info!(prejoin = %prejoin.name, "found existing join table");
        return Ok(());
    }
    tracing::info!(prejoin = %prejoin.name, tables = prejoin.table_count(), "creating join table");
    executor.execute(&sql::prejoin::create_prejoin(prejoin))?;
    Ok(())
}

fn smallest<'a, I: Iterator<Item = &'a Prejoin>>(prejoins: I) -> Option<&'a Prejoin> {
    prejoins.min_by(|a, b| {
        a.table_count()
            .cmp(&b.table_count())
            .then_with(|| a.name.cmp(&b.name))
    })
}

/// Heap entry: more tables first, then earlier in the workload.
#[derive(Debug)]
struct Candidate {
    prejoin: Prejoin,
    order: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.prejoin
            .table_count()
            .cmp(&other.prejoin.table_count())
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Candidate prejoins for every join query, in consolidation order.
pub fn candidates(database: &str, queries: &[Query]) -> Vec<Prejoin> {
    let mut heap: BinaryHeap<Candidate> = queries
        .iter()
        .filter_map(|q| Prejoin::for_query(database, q))
        .enumerate()
        .map(|(order, prejoin)| Candidate { prejoin, order })
        .collect();

    let mut ordered = Vec::with_capacity(heap.len());
    while let Some(Candidate { prejoin, .. }) = heap.pop() {
        ordered.push(prejoin);
    }
    ordered
}
