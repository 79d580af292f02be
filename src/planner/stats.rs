//! Group statistics.

use super::Planner;
use crate::error::{PlanError, PlanResult};
use crate::model::{Query, Stat};
use crate::sql;

/// Cochran sample size for an infinite population at the worst-case
/// proportion `p = 0.5`.
pub fn s0(z: f64, e: f64) -> f64 {
    z.powi(2) * 0.25 / e.powi(2)
}

/// Per-group stratified target with the finite-population correction.
///
/// Never exceeds `group_size` and grows with it, approaching `s0`.
pub fn target_group_sample_size(group_size: f64, z: f64, e: f64) -> f64 {
    let s0 = s0(z, e);
    group_size * s0 / (group_size + s0 - 1.0)
}

impl Planner<'_> {
    /// Table the statistics and stratified sample of `query` are computed
    /// from: the fact table for single-table queries, otherwise the smallest
    /// prejoin supporting the query's join.
    pub fn source_table(&self, query: &Query) -> PlanResult<String> {
        let fact = query
            .fact_table()
            .ok_or_else(|| PlanError::MissingFactTable(query.join_table_name()))?;
        if !query.is_join() {
            return Ok(self.table(fact));
        }
        self.catalog
            .smallest_supporting(query)
            .map(|p| self.table(&p.name))
            .ok_or_else(|| PlanError::StatUnavailable {
                query: query.id.clone(),
            })
    }

    /// Group statistics of `query`'s QCS.
    ///
    /// A cached record computed with the current `z`/`e` is reused; if its
    /// statistics table has disappeared the table is rebuilt and the cached
    /// numbers kept. Otherwise the statistics table is created (or reused when
    /// it already exists), summarized, and the result persisted.
    pub fn collect_stat(&self, query: &Query) -> PlanResult<Stat> {
        let unique_name = query.unique_name();
        let (z, e) = (self.thresholds.z, self.thresholds.e);

        if let Some(stat) = self
            .meta
            .load_stat(&self.database, &unique_name)
            .filter(|s| s.is_usable_for(z, e))
        {
            if !self.executor.table_exists(&self.database, &stat.table_name)? {
                tracing::info!(table = %stat.table_name, "stat table missing, rebuilding");
                let source = self.source_table(query)?;
                self.executor.execute(&sql::stats::create_stat_table(
                    &self.table(&stat.table_name),
                    &source,
                    &query.query_column_set,
                    z,
                    e,
                ))?;
            }
            tracing::debug!(query = %query.id, "using cached statistics");
            return Ok(stat);
        }

        let table_name = sql::stats::stat_table_name(&unique_name, z, e);
        let stat_table = self.table(&table_name);
        if self.executor.table_exists(&self.database, &table_name)? {
            tracing::info!(table = %stat_table, "reusing existing stat table");
        } else {
            let source = self.source_table(query)?;
            tracing::info!(query = %query.id, source = %source, "computing group statistics");
            self.executor.execute(&sql::stats::create_stat_table(
                &stat_table,
                &source,
                &query.query_column_set,
                z,
                e,
            ))?;
        }

        let rs = self.executor.query(&sql::stats::summarize(&stat_table))?;
        let stat = Stat {
            database: self.database.clone(),
            query_name: unique_name,
            table_name,
            population_size: rs.get_u64(0, "population_size")?,
            target_sample_size: rs.get_f64(0, "target_sample_size")?,
            group_count: rs.get_u64(0, "group_count")?,
            avg_group_size: rs.get_f64(0, "avg_group_size")?,
            min_group_size: rs.get_u64(0, "min_group_size")?,
            max_group_size: rs.get_u64(0, "max_group_size")?,
            z,
            e,
        };
        self.meta.save_stat(&stat);
        Ok(stat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Meta, SqliteStore};
    use crate::executor::MockExecutor;
    use crate::model::{ColumnPair, Prejoin, DEFAULT_E, DEFAULT_Z};
    use crate::planner::test_support::respond_summary;

    #[test]
    fn test_target_bounded_by_group_size() {
        for g in [1.0, 2.0, 10.0, 1_000.0, 16_589.0, 1e6, 1e9] {
            let t = target_group_sample_size(g, DEFAULT_Z, DEFAULT_E);
            assert!(t <= g + 1e-9, "target {} exceeds group size {}", t, g);
        }
        assert!((target_group_sample_size(1.0, DEFAULT_Z, DEFAULT_E) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_target_monotonic_and_saturating() {
        let mut prev = 0.0;
        for g in (1..2_000_000).step_by(997) {
            let t = target_group_sample_size(g as f64, DEFAULT_Z, DEFAULT_E);
            assert!(t >= prev);
            prev = t;
        }
        let s0 = s0(DEFAULT_Z, DEFAULT_E);
        assert!((s0 - 16_589.44).abs() < 0.01);
        assert!(target_group_sample_size(1e12, DEFAULT_Z, DEFAULT_E) < s0);
        assert!((target_group_sample_size(s0 + 1.0, DEFAULT_Z, DEFAULT_E) - (s0 + 1.0) / 2.0).abs() < 1e-6);
    }

    fn single() -> Query {
        Query::new("1", ["ss_store_sk"], ["store_sales"], Vec::<ColumnPair>::new())
    }

    fn joined() -> Query {
        Query::new(
            "3",
            ["d_year", "i_brand"],
            ["store_sales", "date_dim", "item"],
            [
                ColumnPair::new("ss_sold_date_sk", "d_date_sk"),
                ColumnPair::new("ss_item_sk", "i_item_sk"),
            ],
        )
    }

    #[test]
    fn test_source_table() {
        let exec = MockExecutor::new();
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        let mut planner = Planner::new(&exec, &meta, "tpcds");

        assert_eq!(planner.source_table(&single()).unwrap(), "tpcds.store_sales");
        assert!(matches!(
            planner.source_table(&joined()),
            Err(PlanError::StatUnavailable { query }) if query == "3"
        ));

        let prejoin = Prejoin::for_query("tpcds", &joined()).unwrap();
        let name = prejoin.name.clone();
        planner.catalog_mut().register(prejoin);
        assert_eq!(planner.source_table(&joined()).unwrap(), format!("tpcds.{}", name));

        let dims = Query::new("x", ["d_year"], ["date_dim", "item"], Vec::<ColumnPair>::new());
        assert!(matches!(planner.source_table(&dims), Err(PlanError::MissingFactTable(_))));
    }

    #[test]
    fn test_collect_stat_computes_then_caches() {
        let exec = MockExecutor::new();
        respond_summary(&exec, 1_000_000, 50_000.0, 2_000, 500.0);
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        let planner = Planner::new(&exec, &meta, "tpcds");

        let stat = planner.collect_stat(&single()).unwrap();
        assert_eq!(stat.population_size, 1_000_000);
        assert_eq!(stat.group_count, 2_000);
        assert_eq!(stat.query_name, "store_sales__ss_store_sk");
        assert!(exec.has_table("tpcds", &stat.table_name));
        assert_eq!(exec.statements_matching("CREATE TABLE").len(), 1);

        let again = planner.collect_stat(&single()).unwrap();
        assert_eq!(again, stat);
        assert_eq!(exec.statements_matching("CREATE TABLE").len(), 1);
        assert_eq!(exec.statements_matching("AS group_count").len(), 1);
    }

    #[test]
    fn test_missing_stat_table_rebuilt_from_cache() {
        let exec = MockExecutor::new();
        respond_summary(&exec, 1_000_000, 50_000.0, 2_000, 500.0);
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        let planner = Planner::new(&exec, &meta, "tpcds");

        let stat = planner.collect_stat(&single()).unwrap();
        exec.forget_table("tpcds", &stat.table_name);

        assert_eq!(planner.collect_stat(&single()).unwrap(), stat);
        assert_eq!(exec.statements_matching("CREATE TABLE").len(), 2);
        assert_eq!(exec.statements_matching("AS group_count").len(), 1);
    }

    #[test]
    fn test_zero_population_cache_is_recomputed() {
        let exec = MockExecutor::new();
        respond_summary(&exec, 0, 0.0, 0, 0.0);
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        let planner = Planner::new(&exec, &meta, "tpcds");

        planner.collect_stat(&single()).unwrap();
        planner.collect_stat(&single()).unwrap();
        assert_eq!(exec.statements_matching("AS group_count").len(), 2);
    }

    #[test]
    fn test_join_without_prejoin_is_unavailable() {
        let exec = MockExecutor::new();
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        let planner = Planner::new(&exec, &meta, "tpcds");

        let err = planner.collect_stat(&joined()).unwrap_err();
        assert!(err.is_missing_prejoin());
        assert!(exec.statements_matching("CREATE TABLE").is_empty());
    }
}
