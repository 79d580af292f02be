#[cfg(test)]
mod tests {
    use aqp::cache::{Meta, SqliteStore};
    use aqp::config::parse_workload;
    use aqp::executor::{MockExecutor, ResultSet};
    use aqp::model::SampleType;
    use aqp::planner::{Decision, Materialization, PlanOptions, Planner, QueryOutcome};
    use serde_json::json;

    const WORKLOAD: &str = r#"
[[query]]
id = "3"
qcs = ["d_year", "i_brand"]
tables = ["store_sales", "date_dim", "item"]
joins = [["ss_sold_date_sk", "d_date_sk"], ["ss_item_sk", "i_item_sk"]]

[[query]]
id = "42"
qcs = ["d_year", "i_category"]
tables = ["store_sales", "date_dim", "item"]
joins = [["d_date_sk", "ss_sold_date_sk"], ["i_item_sk", "ss_item_sk"]]

[[query]]
id = "96"
qcs = ["ss_store_sk"]
tables = ["store_sales"]
group_by = ["ss_store_sk"]
aggregates = ["cnt"]
sql = "SELECT ss_store_sk, count(*) AS cnt FROM FACT_TABLE GROUP BY ss_store_sk"
sample_sql = "SELECT ss_store_sk, count(*) AS cnt FROM FACT_TABLE GROUP BY ss_store_sk"
"#;

    fn summary(population: u64, target: f64, groups: u64, avg: f64) -> ResultSet {
        ResultSet::from_rows(
            [
                "group_count",
                "population_size",
                "target_sample_size",
                "avg_group_size",
                "min_group_size",
                "max_group_size",
            ],
            vec![vec![
                json!(groups),
                json!(population),
                json!(target),
                json!(avg),
                json!(10),
                json!(1_000),
            ]],
        )
    }

    fn executor() -> MockExecutor {
        MockExecutor::new().with_columns(
            "tpcds",
            "store_sales",
            &["ss_sold_date_sk", "ss_item_sk", "ss_store_sk", "ss_net_paid"],
        )
    }

    #[test]
    fn test_full_run_plans_creates_and_reuses() {
        let queries = parse_workload(WORKLOAD).unwrap();
        let exec = executor();
        exec.respond("AS group_count, sum(groupsize)", summary(1_000_000, 50_000.0, 2_000, 500.0));
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());

        let mut planner = Planner::new(&exec, &meta, "tpcds").with_options(PlanOptions {
            create: true,
            ..Default::default()
        });
        let report = planner.plan_workload(&queries).unwrap();

        // Queries 3 and 42 share one join graph.
        assert_eq!(report.prejoins_created.len(), 1);
        assert_eq!(exec.statements_matching("CREATE TABLE tpcds.prejoin_").len(), 1);

        assert_eq!(report.queries.len(), 3);
        assert_eq!(report.failed(), 0);
        for q in &report.queries {
            assert!(matches!(
                q.outcome,
                QueryOutcome::Planned {
                    decision: Decision::Stratified { .. },
                    materialized: Some(Materialization::Created),
                    ..
                }
            ));
        }
        assert_eq!(exec.statements_matching("COMPUTE STATS").len(), 3);

        let samples = meta.samples("tpcds");
        assert_eq!(samples.len(), 3);
        assert!(samples.iter().all(|s| s.sample_type == SampleType::Stratified));

        // A second run finds everything in place.
        let statements_before = exec.statements().len();
        let mut planner = Planner::new(&exec, &meta, "tpcds").with_options(PlanOptions {
            create: true,
            ..Default::default()
        });
        let report = planner.plan_workload(&queries).unwrap();
        assert!(report.prejoins_created.is_empty());
        for q in &report.queries {
            assert!(matches!(
                q.outcome,
                QueryOutcome::Planned {
                    materialized: Some(Materialization::AlreadyExists),
                    ..
                }
            ));
        }
        assert_eq!(exec.statements().len(), statements_before);
    }

    #[test]
    fn test_evaluate_sample_after_planning() {
        let queries = parse_workload(WORKLOAD).unwrap();
        let store_query = &queries[2];
        let exec = executor();
        exec.respond("AS group_count, sum(groupsize)", summary(10_000_000, 0.0, 40, 250_000.0));
        let meta = Meta::new(SqliteStore::open_in_memory().unwrap());

        let planner = Planner::new(&exec, &meta, "tpcds").with_options(PlanOptions {
            create: true,
            ..Default::default()
        });
        let QueryOutcome::Planned { decision, sample, .. } = planner.plan_query(store_query).unwrap() else {
            panic!("query not planned");
        };
        assert_eq!(decision, Decision::Uniform { ratio: 0.4 });
        let sample = sample.unwrap();
        assert_eq!(meta.sample("tpcds", &sample.name()), Some(sample.clone()));

        exec.respond(
            "FROM tpcds.eval_q96_orig",
            ResultSet::from_rows(["group_count"], vec![vec![json!(40)]]),
        );
        exec.respond(
            "FROM tpcds.eval_q96_sample",
            ResultSet::from_rows(["group_count"], vec![vec![json!(38)]]),
        );
        exec.respond(
            "avg(err) AS avg_error",
            ResultSet::from_rows(["avg_error"], vec![vec![json!(0.01)]]),
        );

        let evals = planner.evaluate_all(&queries, None);
        assert_eq!(evals.len(), 1);
        assert_eq!(evals[0].query_id, "96");
        assert!((evals[0].missing_group_ratio - 0.05).abs() < 1e-12);
        assert!(exec.statements_matching("avg(err)")[0].contains("s.cnt * 2.5 - o.cnt"));
    }
}
