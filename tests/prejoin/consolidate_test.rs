#[cfg(test)]
mod tests {
    use aqp::cache::{Meta, SqliteStore};
    use aqp::executor::MockExecutor;
    use aqp::model::{ColumnPair, Query};
    use aqp::prejoin::PrejoinCatalog;

    fn ss_dd_item(id: &str, qcs: &[&str]) -> Query {
        Query::new(
            id,
            qcs.iter().copied(),
            ["store_sales", "date_dim", "item"],
            [
                ColumnPair::new("ss_sold_date_sk", "d_date_sk"),
                ColumnPair::new("ss_item_sk", "i_item_sk"),
            ],
        )
    }

    #[test]
    fn test_shared_join_graph_materialized_once() {
        let queries = vec![
            ss_dd_item("3", &["d_year", "i_brand"]),
            ss_dd_item("42", &["d_year", "i_category"]),
        ];
        let exec = MockExecutor::new();
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        let mut catalog = PrejoinCatalog::new("tpcds");

        let created = catalog.consolidate(&queries, &exec, &meta);

        assert_eq!(created.len(), 1);
        assert_eq!(exec.statements_matching("CREATE TABLE").len(), 1);
        let prejoin = catalog.smallest_supporting(&queries[0]).unwrap();
        assert_eq!(catalog.smallest_supporting(&queries[1]), Some(prejoin));
    }

    #[test]
    fn test_persisted_prejoins_reused_across_runs() {
        let queries = vec![ss_dd_item("3", &["d_year"])];
        let exec = MockExecutor::new();
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());

        let mut first = PrejoinCatalog::load(&meta, "tpcds");
        assert_eq!(first.consolidate(&queries, &exec, &meta).len(), 1);

        let mut second = PrejoinCatalog::load(&meta, "tpcds");
        assert!(second.validate(&exec, &meta).unwrap().is_empty());
        assert!(second.consolidate(&queries, &exec, &meta).is_empty());
        assert_eq!(exec.statements_matching("CREATE TABLE").len(), 1);
    }

    #[test]
    fn test_dropped_prejoin_is_evicted_and_rebuilt() {
        let queries = vec![ss_dd_item("3", &["d_year"])];
        let exec = MockExecutor::new();
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());

        let mut first = PrejoinCatalog::load(&meta, "tpcds");
        let name = first.consolidate(&queries, &exec, &meta)[0].name.clone();
        exec.forget_table("tpcds", &name);

        let mut second = PrejoinCatalog::load(&meta, "tpcds");
        let evicted = second.validate(&exec, &meta).unwrap();
        assert_eq!(evicted.len(), 1);
        assert!(meta.prejoins("tpcds").is_empty());

        assert_eq!(second.consolidate(&queries, &exec, &meta).len(), 1);
        assert_eq!(meta.prejoins("tpcds").len(), 1);
    }

    #[test]
    fn test_single_table_queries_need_no_prejoin() {
        let queries = vec![Query::new("1", ["ss_store_sk"], ["store_sales"], Vec::<ColumnPair>::new())];
        let exec = MockExecutor::new();
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        let mut catalog = PrejoinCatalog::new("tpcds");

        assert!(catalog.consolidate(&queries, &exec, &meta).is_empty());
        assert!(exec.statements().is_empty());
    }
}
