#[cfg(test)]
mod tests {
    use aqp::config::{load_workload, WorkloadError};
    use std::path::PathBuf;

    const WORKLOAD: &str = r#"
[[query]]
id = "31_1"
qcs = ["ca_county", "d_qoy", "d_year"]
tables = ["store_sales", "date_dim", "customer_address"]
joins = [["ss_sold_date_sk", "d_date_sk"], ["ss_addr_sk", "ca_address_sk"]]
group_by = ["ca_county", "d_qoy", "d_year"]
aggregates = ["store_sales"]
sql = """
SELECT ca_county, d_qoy, d_year, sum(ss_ext_sales_price) AS store_sales
FROM FACT_TABLE, date_dim, customer_address
WHERE ss_sold_date_sk = d_date_sk AND ss_addr_sk = ca_address_sk
GROUP BY ca_county, d_qoy, d_year;
"""
sample_sql = """
SELECT ca_county, d_qoy, d_year, sum(ss_ext_sales_price * s.groupsize / s.target_group_sample_size) AS store_sales
FROM FACT_TABLE f, STAT_TABLE s, date_dim, customer_address
GROUP BY ca_county, d_qoy, d_year
"""
"#;

    fn write_temp(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aqp-workload-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("workload.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_workload_file() {
        let path = write_temp(WORKLOAD);
        let queries = load_workload(&path).unwrap();

        assert_eq!(queries.len(), 1);
        let q = &queries[0];
        assert_eq!(q.id, "31_1");
        assert_eq!(q.fact_table(), Some("store_sales"));
        assert_eq!(q.unique_name(), "customer_address_date_dim_store_sales__ca_county_d_qoy_d_year");
        assert!(q.query.contains("FROM FACT_TABLE, date_dim"));
        assert!(q.sample_query.contains("STAT_TABLE s"));
        assert_eq!(q.group_by_columns.len(), 3);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_workload_file() {
        let err = load_workload("/nonexistent/workload.toml").unwrap_err();
        assert!(matches!(err, WorkloadError::FileNotFound(_)));
    }

    #[test]
    fn test_malformed_workload_file() {
        assert!(matches!(
            aqp::config::parse_workload("[[query]]\nid = 5\n"),
            Err(WorkloadError::ParseError(_))
        ));
    }
}
