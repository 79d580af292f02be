#[cfg(test)]
mod tests {
    use aqp::cache::{Meta, SqliteStore};
    use aqp::executor::MockExecutor;
    use aqp::model::{ColumnPair, Query, Sample};
    use aqp::prejoin::{import_prejoins, parse_prejoins, PrejoinCatalog};

    #[test]
    fn test_imported_prejoin_serves_matching_query() {
        let path = std::env::temp_dir().join(format!("aqp-prejoin-file-{}.txt", std::process::id()));
        std::fs::write(
            &path,
            "tpcds;ss_date_item;store_sales,date_dim,item;ss_sold_date_sk = d_date_sk AND ss_item_sk = i_item_sk\n",
        )
        .unwrap();

        let exec = MockExecutor::new().with_table("tpcds", "ss_date_item");
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        assert_eq!(import_prejoins(&path, &exec, &meta).unwrap().len(), 1);

        let query = Query::new(
            "3",
            ["d_year"],
            ["store_sales", "date_dim"],
            [ColumnPair::new("d_date_sk", "ss_sold_date_sk")],
        );
        let mut catalog = PrejoinCatalog::load(&meta, "tpcds");
        assert_eq!(
            catalog.smallest_supporting(&query).map(|p| p.name.as_str()),
            Some("ss_date_item")
        );
        assert!(catalog.consolidate(&[query], &exec, &meta).is_empty());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_other_database_definitions_are_kept_apart() {
        let prejoins = parse_prejoins(
            "tpcds;a;store_sales,item;ss_item_sk = i_item_sk\n\
             tpcds_10;b;store_sales,item;ss_item_sk = i_item_sk\n",
        )
        .unwrap();
        let exec = MockExecutor::new();
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        for p in &prejoins {
            meta.add_prejoin(p);
        }
        assert!(exec.statements().is_empty());
        assert_eq!(meta.prejoins("tpcds").len(), 1);
        assert_eq!(meta.prejoins("tpcds_10").len(), 1);
    }

    #[test]
    fn test_same_sample_in_other_databases_is_kept_apart() {
        let q = Query::new("1", ["ss_store_sk"], ["store_sales"], Vec::<ColumnPair>::new());
        let small = Sample::uniform("tpcds", &q, "store_sales", 0.01);
        let large = Sample::uniform("tpcds_10", &q, "store_sales", 0.01);
        assert_eq!(small.name(), large.name());

        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        meta.add_sample(&small);
        meta.add_sample(&large);
        assert_eq!(meta.samples("tpcds"), vec![small.clone()]);
        assert_eq!(meta.samples("tpcds_10"), vec![large.clone()]);

        meta.remove_sample("tpcds", &small.name());
        assert!(meta.samples("tpcds").is_empty());
        assert_eq!(meta.sample("tpcds_10", &large.name()), Some(large));
    }
}
