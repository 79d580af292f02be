#[cfg(test)]
mod tests {
    use aqp::cache::{Meta, MetadataStore, RecordKind, SqliteStore};
    use aqp::model::{ColumnPair, Prejoin, Stat};

    #[test]
    fn test_put_get_round_trip_and_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put(RecordKind::Stat, "k", r#"{"a":1}"#).unwrap();
        assert_eq!(store.get(RecordKind::Stat, "k").unwrap().as_deref(), Some(r#"{"a":1}"#));

        store.put(RecordKind::Stat, "k", r#"{"a":2}"#).unwrap();
        assert_eq!(store.get(RecordKind::Stat, "k").unwrap().as_deref(), Some(r#"{"a":2}"#));

        store.delete(RecordKind::Stat, "k").unwrap();
        assert!(store.get(RecordKind::Stat, "k").unwrap().is_none());
        assert_eq!(store.history_len(RecordKind::Stat, "k").unwrap(), 3);
    }

    #[test]
    fn test_kinds_are_separate_namespaces() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put(RecordKind::Stat, "k", "stat").unwrap();
        store.put(RecordKind::Sample, "k", "sample").unwrap();
        assert_eq!(store.get(RecordKind::Stat, "k").unwrap().as_deref(), Some("stat"));
        assert_eq!(store.get(RecordKind::Sample, "k").unwrap().as_deref(), Some("sample"));
    }

    #[test]
    fn test_list_by_prefix_returns_latest_live_values() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put(RecordKind::Prejoin, "db.a", "a1").unwrap();
        store.put(RecordKind::Prejoin, "db.a", "a2").unwrap();
        store.put(RecordKind::Prejoin, "db.b", "b1").unwrap();
        store.put(RecordKind::Prejoin, "db2.c", "c1").unwrap();
        store.delete(RecordKind::Prejoin, "db.b").unwrap();

        let rows = store.list_by_prefix(RecordKind::Prejoin, "db.").unwrap();
        assert_eq!(rows, vec![("db.a".to_string(), "a2".to_string())]);
    }

    #[test]
    fn test_meta_tolerates_extra_and_missing_fields() {
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        meta.store()
            .put(
                RecordKind::Stat,
                &Stat::key("tpcds", "store_sales__d_year"),
                r#"{"database":"tpcds","query_name":"store_sales__d_year","population_size":10,"future_field":true}"#,
            )
            .unwrap();

        let stat = meta.load_stat("tpcds", "store_sales__d_year").unwrap();
        assert_eq!(stat.population_size, 10);
        assert_eq!(stat.group_count, 0);
    }

    #[test]
    fn test_evicted_prejoin_stays_in_log() {
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());
        let prejoin = Prejoin::new(
            "prejoin_tpcds_x",
            "tpcds",
            "store_sales",
            ["store_sales", "item"],
            [ColumnPair::new("ss_item_sk", "i_item_sk")],
        );
        meta.add_prejoin(&prejoin);
        meta.remove_prejoin(&prejoin);

        assert!(meta.prejoins("tpcds").is_empty());
        let stats = meta.stats().unwrap();
        assert_eq!(stats.record_count, 2);
        assert_eq!(stats.key_count, 1);
    }
}
