//! Scripted in-process executor.
//!
//! Records every statement, tracks tables created and dropped by DDL, and
//! answers queries from substring rules. Used by tests and dry runs.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use super::{ExecutorError, ExecutorResult, ResultSet, SqlExecutor};

static CREATE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?([\w.]+)").unwrap()
});

static DROP_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*DROP\s+TABLE\s+(?:IF\s+EXISTS\s+)?([\w.]+)").unwrap());

#[derive(Debug, Default)]
pub struct MockExecutor {
    statements: RefCell<Vec<String>>,
    tables: RefCell<BTreeSet<String>>,
    columns: RefCell<HashMap<String, Vec<String>>>,
    responses: RefCell<Vec<(String, ResultSet)>>,
    failures: RefCell<Vec<String>>,
}

fn qualified(database: &str, table: &str) -> String {
    format!("{}.{}", database, table).to_lowercase()
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing table.
    pub fn with_table(self, database: &str, table: &str) -> Self {
        self.tables.borrow_mut().insert(qualified(database, table));
        self
    }

    /// Register an existing table and its columns.
    pub fn with_columns(self, database: &str, table: &str, columns: &[&str]) -> Self {
        self.columns.borrow_mut().insert(
            qualified(database, table),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self.with_table(database, table)
    }

    /// Answer any query containing `pattern` with `result`. Later rules win.
    pub fn respond(&self, pattern: &str, result: ResultSet) {
        self.responses
            .borrow_mut()
            .push((pattern.to_string(), result));
    }

    /// Fail any statement containing `pattern`.
    pub fn fail_on(&self, pattern: &str) {
        self.failures.borrow_mut().push(pattern.to_string());
    }

    /// Remove a table as if it had been dropped outside this process.
    pub fn forget_table(&self, database: &str, table: &str) {
        self.tables.borrow_mut().remove(&qualified(database, table));
    }

    /// Every statement seen so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    /// Statements containing `pattern`.
    pub fn statements_matching(&self, pattern: &str) -> Vec<String> {
        self.statements
            .borrow()
            .iter()
            .filter(|s| s.contains(pattern))
            .cloned()
            .collect()
    }

    pub fn has_table(&self, database: &str, table: &str) -> bool {
        self.tables.borrow().contains(&qualified(database, table))
    }

    fn record(&self, sql: &str) -> ExecutorResult<()> {
        self.statements.borrow_mut().push(sql.to_string());
        let failures = self.failures.borrow();
        match failures.iter().find(|p| sql.contains(p.as_str())) {
            Some(pattern) => Err(ExecutorError::sql(
                sql,
                format!("scripted failure on '{}'", pattern),
            )),
            None => Ok(()),
        }
    }
}

impl SqlExecutor for MockExecutor {
    fn execute(&self, sql: &str) -> ExecutorResult<()> {
        self.record(sql)?;
        if let Some(caps) = CREATE_TABLE.captures(sql) {
            self.tables.borrow_mut().insert(caps[1].to_lowercase());
        } else if let Some(caps) = DROP_TABLE.captures(sql) {
            self.tables.borrow_mut().remove(&caps[1].to_lowercase());
        }
        Ok(())
    }

    fn query(&self, sql: &str) -> ExecutorResult<ResultSet> {
        self.record(sql)?;
        let responses = self.responses.borrow();
        Ok(responses
            .iter()
            .rev()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, rs)| rs.clone())
            .unwrap_or_default())
    }

    fn table_exists(&self, database: &str, table: &str) -> ExecutorResult<bool> {
        Ok(self.has_table(database, table))
    }

    fn describe_columns(&self, database: &str, table: &str) -> ExecutorResult<Vec<String>> {
        let key = qualified(database, table);
        self.columns
            .borrow()
            .get(&key)
            .cloned()
            .ok_or_else(|| ExecutorError::sql(format!("DESCRIBE {}", key), "table not found"))
    }
}
