#[cfg(test)]
mod tests {
    use aqp::model::{ColumnPair, Prejoin, Query};

    fn prejoin(tables: &[&str], joins: &[(&str, &str)]) -> Prejoin {
        let mut p = Prejoin::new(
            "",
            "tpcds",
            "store_sales",
            tables.iter().copied(),
            joins.iter().map(|(a, b)| ColumnPair::new(*a, *b)),
        );
        p.name = p.generated_name();
        p
    }

    fn three() -> Prejoin {
        prejoin(
            &["store_sales", "date_dim", "item"],
            &[("ss_sold_date_sk", "d_date_sk"), ("ss_item_sk", "i_item_sk")],
        )
    }

    fn two() -> Prejoin {
        prejoin(&["store_sales", "date_dim"], &[("d_date_sk", "ss_sold_date_sk")])
    }

    #[test]
    fn test_containment_is_reflexive() {
        for p in [three(), two()] {
            assert!(p.contains(&p));
        }
    }

    #[test]
    fn test_containment_is_transitive() {
        let four = prejoin(
            &["store_sales", "date_dim", "item", "store"],
            &[
                ("ss_sold_date_sk", "d_date_sk"),
                ("ss_item_sk", "i_item_sk"),
                ("ss_store_sk", "s_store_sk"),
            ],
        );
        assert!(four.contains(&three()));
        assert!(three().contains(&two()));
        assert!(four.contains(&two()));
        assert!(!two().contains(&three()));
    }

    #[test]
    fn test_different_join_predicate_is_not_contained() {
        let other = prejoin(&["store_sales", "date_dim"], &[("ss_sold_time_sk", "d_date_sk")]);
        assert!(!three().contains(&other));
    }

    #[test]
    fn test_supports_ignores_pair_order() {
        let query = Query::new(
            "3",
            ["d_year"],
            ["date_dim", "store_sales"],
            [ColumnPair::new("d_date_sk", "ss_sold_date_sk")],
        );
        assert!(three().supports("tpcds", &query));
        assert!(two().supports("tpcds", &query));
        assert!(!three().supports("other_db", &query));
        for pair in &query.join_columns {
            assert!(three().join_column_set.contains(pair));
        }
    }

    #[test]
    fn test_generated_name_is_content_derived() {
        assert_eq!(three().name, three().name);
        assert_ne!(three().name, two().name);
        assert!(three().name.starts_with("prejoin_tpcds_"));
    }
}
