//! Test utilities for SQL emission validation.
//!
//! Parses generated SELECT bodies with sqlparser-rs so a templating slip
//! (unbalanced parentheses, a dangling `AND`) fails in tests rather than on
//! the cluster. Hive DDL (`STORED AS parquet`, `COMPUTE STATS`) is not
//! checked here.

use sqlparser::dialect::{GenericDialect, HiveDialect};
use sqlparser::parser::Parser;

/// Validates that a SQL string parses with the Hive dialect, falling back to
/// the generic dialect for window-function syntax Hive's grammar lacks.
///
/// # Example
///
/// ```ignore
/// use crate::sql::test_utils::validate_sql;
///
/// validate_sql("SELECT * FROM tpcds.store_sales").unwrap();
/// ```
pub fn validate_sql(sql: &str) -> Result<(), String> {
    if Parser::parse_sql(&HiveDialect {}, sql).is_ok() {
        return Ok(());
    }
    Parser::parse_sql(&GenericDialect {}, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid SQL: {}\nSQL: {}", e, sql))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_sql() {
        validate_sql("SELECT * FROM tpcds.store_sales").unwrap();
        validate_sql("SELECT a, count(*) OVER (PARTITION BY a) AS n FROM t").unwrap();
    }

    #[test]
    fn test_validate_invalid_sql() {
        assert!(validate_sql("SELEC * FORM users").is_err());
        assert!(validate_sql("SELECT a FROM t WHERE a = 1 AND").is_err());
    }
}
