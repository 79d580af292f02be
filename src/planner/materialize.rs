//! Sample materialization.

use super::Planner;
use crate::error::{PlanError, PlanResult};
use crate::model::{find_fact_table, Query, Sample, SampleType};
use crate::sql;

/// What [`Planner::create_sample`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialization {
    Created,
    /// The table existed and overwrite was off; the sample was only registered.
    AlreadyExists,
}

impl Planner<'_> {
    /// Materialize `sample` and record it in the metadata store.
    ///
    /// The table is created `LIKE` its fact table and filled with one
    /// `INSERT OVERWRITE`, then its optimizer statistics are refreshed.
    pub fn create_sample(&self, sample: &Sample) -> PlanResult<Materialization> {
        let name = sample.name();
        let table = self.table(&name);

        if self.executor.table_exists(&self.database, &name)? {
            if !self.options.overwrite {
                tracing::info!(sample = %name, "sample already exists");
                self.meta.add_sample(sample);
                return Ok(Materialization::AlreadyExists);
            }
            tracing::info!(sample = %name, "overwriting existing sample");
            self.executor.execute(&sql::drop_table(&table))?;
        }

        let columns = self.executor.describe_columns(&self.database, &sample.table)?;
        let select = self.select_sample(sample, &columns)?;

        tracing::info!(sample = %name, kind = %sample.sample_type, "creating sample");
        self.executor
            .execute(&sql::sample::create_like(&table, &self.table(&sample.table)))?;
        self.executor
            .execute(&sql::sample::insert_overwrite(&table, &select))?;
        self.executor.execute(&sql::compute_stats(&table))?;

        self.meta.add_sample(sample);
        Ok(Materialization::Created)
    }

    /// Create a stratified sample keeping up to `min_rows` random rows for each
    /// group of `columns`, drawn through the join of `tables`.
    pub fn create_stratified2(
        &self,
        tables: &[String],
        columns: &[String],
        min_rows: u64,
    ) -> PlanResult<(Sample, Materialization)> {
        let fact = find_fact_table(tables).ok_or_else(|| PlanError::MissingFactTable(tables.join(",")))?;
        let sample = Sample::stratified2(
            &self.database,
            fact,
            tables.iter().cloned(),
            columns.iter().cloned(),
            min_rows,
        );
        let outcome = self.create_sample(&sample)?;
        Ok((sample, outcome))
    }

    fn select_sample(&self, sample: &Sample, columns: &[String]) -> PlanResult<String> {
        match sample.sample_type {
            SampleType::Uniform => Ok(sql::sample::select_uniform(
                &self.table(&sample.table),
                columns,
                sample.ratio,
            )),
            SampleType::Stratified => {
                let query = sample.query.as_ref().ok_or_else(|| {
                    PlanError::UnsupportedSampleType(format!("{} without a query", sample.sample_type))
                })?;
                let stat = self.collect_stat(query)?;
                let source = self.sample_source(sample, query)?;
                Ok(sql::sample::select_stratified(
                    &source,
                    &self.table(&stat.table_name),
                    columns,
                    &query.query_column_set,
                ))
            }
            SampleType::Stratified2 => {
                let source = self.stratified2_source(sample)?;
                Ok(sql::sample::select_stratified2(
                    &source,
                    columns,
                    &sample.columns,
                    sample.min_row,
                ))
            }
        }
    }

    /// Fact table, or the smallest prejoin covering the sample's tables.
    pub(super) fn stratified2_source(&self, sample: &Sample) -> PlanResult<String> {
        if !sample.needs_join() {
            return Ok(self.table(&sample.table));
        }
        self.catalog
            .smallest_covering(&sample.table, &sample.join_tables)
            .map(|p| self.table(&p.name))
            .ok_or_else(|| PlanError::PrejoinRequired {
                sample: sample.name(),
            })
    }

    fn sample_source(&self, sample: &Sample, query: &Query) -> PlanResult<String> {
        if !query.is_join() {
            return Ok(self.table(&sample.table));
        }
        self.catalog
            .smallest_supporting(query)
            .map(|p| self.table(&p.name))
            .ok_or_else(|| PlanError::PrejoinRequired {
                sample: sample.name(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Meta, SqliteStore};
    use crate::executor::MockExecutor;
    use crate::model::{ColumnPair, Prejoin};
    use crate::planner::test_support::respond_summary;
    use crate::planner::PlanOptions;

    const FACT_COLUMNS: &[&str] = &["ss_sold_date_sk", "ss_item_sk", "ss_store_sk", "ss_net_paid"];

    fn executor() -> MockExecutor {
        MockExecutor::new().with_columns("tpcds", "store_sales", FACT_COLUMNS)
    }

    fn query() -> Query {
        Query::new("1", ["ss_store_sk"], ["store_sales"], Vec::<ColumnPair>::new())
    }

    fn joined() -> Query {
        Query::new(
            "3",
            ["d_year"],
            ["store_sales", "date_dim"],
            [ColumnPair::new("ss_sold_date_sk", "d_date_sk")],
        )
    }

    #[test]
    fn test_create_uniform_sample() {
        let exec = executor();
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        let planner = Planner::new(&exec, &meta, "tpcds");
        let sample = Sample::uniform("tpcds", &query(), "store_sales", 0.5);

        assert_eq!(planner.create_sample(&sample).unwrap(), Materialization::Created);

        let table = format!("tpcds.{}", sample.name());
        assert_eq!(
            exec.statements(),
            vec![
                format!("CREATE TABLE {} LIKE tpcds.store_sales STORED AS parquet", table),
                format!(
                    "INSERT OVERWRITE TABLE {} SELECT ss_sold_date_sk, ss_item_sk, ss_store_sk, ss_net_paid \
                     FROM tpcds.store_sales WHERE rand(unix_timestamp()) < 0.500000",
                    table
                ),
                format!("COMPUTE STATS {}", table),
            ]
        );
        assert_eq!(meta.sample("tpcds", &sample.name()), Some(sample));
    }

    #[test]
    fn test_existing_sample_is_skipped_unless_overwrite() {
        let sample = Sample::uniform("tpcds", &query(), "store_sales", 0.5);
        let exec = executor().with_table("tpcds", &sample.name());
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());

        let planner = Planner::new(&exec, &meta, "tpcds");
        assert_eq!(
            planner.create_sample(&sample).unwrap(),
            Materialization::AlreadyExists
        );
        assert!(exec.statements_matching("INSERT").is_empty());
        assert!(meta.sample("tpcds", &sample.name()).is_some());

        let planner = planner.with_options(PlanOptions {
            overwrite: true,
            ..Default::default()
        });
        assert_eq!(planner.create_sample(&sample).unwrap(), Materialization::Created);
        assert_eq!(exec.statements_matching("DROP TABLE IF EXISTS").len(), 1);
        assert_eq!(exec.statements_matching("INSERT OVERWRITE").len(), 1);
    }

    #[test]
    fn test_create_stratified_sample_joins_stat_table() {
        let exec = executor();
        respond_summary(&exec, 1_000_000, 50_000.0, 2_000, 500.0);
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        let planner = Planner::new(&exec, &meta, "tpcds");
        let sample = Sample::stratified("tpcds", &query(), "store_sales", 2.576, 0.01);

        planner.create_sample(&sample).unwrap();

        let stat = meta.load_stat("tpcds", &query().unique_name()).unwrap();
        let insert = &exec.statements_matching("INSERT OVERWRITE")[0];
        assert!(insert.contains(&format!("FROM tpcds.store_sales AS fact, tpcds.{} AS stat", stat.table_name)));
        assert!(insert.contains("fact.ss_store_sk = stat.ss_store_sk"));
    }

    #[test]
    fn test_stratified_join_sample_uses_prejoin() {
        let exec = executor();
        respond_summary(&exec, 1_000_000, 50_000.0, 2_000, 500.0);
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        let mut planner = Planner::new(&exec, &meta, "tpcds");
        let sample = Sample::stratified("tpcds", &joined(), "store_sales", 2.576, 0.01);

        let err = planner.create_sample(&sample).unwrap_err();
        assert!(matches!(err, PlanError::StatUnavailable { .. }));

        let prejoin = Prejoin::for_query("tpcds", &joined()).unwrap();
        let source = format!("tpcds.{} AS fact", prejoin.name);
        planner.catalog_mut().register(prejoin);
        planner.create_sample(&sample).unwrap();
        assert!(exec.statements_matching("INSERT OVERWRITE")[0].contains(&source));
    }

    #[test]
    fn test_stratified2_requires_covering_prejoin() {
        let exec = executor();
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        let mut planner = Planner::new(&exec, &meta, "tpcds");
        let tables = vec!["store_sales".to_string(), "date_dim".to_string()];
        let columns = vec!["d_year".to_string()];

        let err = planner.create_stratified2(&tables, &columns, 100).unwrap_err();
        assert!(matches!(err, PlanError::PrejoinRequired { .. }));
        assert!(exec.statements_matching("CREATE TABLE").is_empty());

        let prejoin = Prejoin::for_query("tpcds", &joined()).unwrap();
        let name = prejoin.name.clone();
        planner.catalog_mut().register(prejoin);
        let (sample, outcome) = planner.create_stratified2(&tables, &columns, 100).unwrap();

        assert_eq!(outcome, Materialization::Created);
        assert_eq!(sample.name(), "store_sales__st2_100__d_year");
        let insert = &exec.statements_matching("INSERT OVERWRITE")[0];
        assert!(insert.contains(&format!("FROM tpcds.{} AS src", name)));
        assert!(insert.contains("tmp.rownum <= 100"));
    }

    #[test]
    fn test_stratified2_without_fact_table() {
        let exec = executor();
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        let planner = Planner::new(&exec, &meta, "tpcds");
        let err = planner
            .create_stratified2(&["item".to_string()], &["i_brand".to_string()], 10)
            .unwrap_err();
        assert!(matches!(err, PlanError::MissingFactTable(_)));
    }
}
