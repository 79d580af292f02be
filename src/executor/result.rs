//! Tabular query results.

use serde_json::Value;

use super::{ExecutorError, ExecutorResult};

/// Rows returned by a query, with values as JSON scalars.
///
/// Drivers disagree on how they encode large integers and decimals (numbers
/// vs. strings), so the typed accessors accept both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Build a result set from column names and rows of JSON values.
    pub fn from_rows<C, S>(columns: C, rows: Vec<Vec<Value>>) -> Self
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(columns.into_iter().map(Into::into).collect(), rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched case-insensitively.
    pub fn column_index(&self, name: &str) -> ExecutorResult<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| ExecutorError::MissingColumn(name.to_string()))
    }

    /// Raw value at `row`, `column`. Missing rows read as `NULL`.
    pub fn value(&self, row: usize, column: &str) -> ExecutorResult<&Value> {
        let idx = self.column_index(column)?;
        Ok(self
            .rows
            .get(row)
            .and_then(|r| r.get(idx))
            .unwrap_or(&Value::Null))
    }

    /// Value as `f64`; `NULL` reads as `0.0`.
    pub fn get_f64(&self, row: usize, column: &str) -> ExecutorResult<f64> {
        let value = self.value(row, column)?;
        match value {
            Value::Null => Ok(0.0),
            Value::Number(n) => n.as_f64().ok_or_else(|| invalid(column, value)),
            Value::String(s) => s.trim().parse().map_err(|_| invalid(column, value)),
            _ => Err(invalid(column, value)),
        }
    }

    /// Value as `u64`; `NULL` reads as `0`. Fractional values are truncated.
    pub fn get_u64(&self, row: usize, column: &str) -> ExecutorResult<u64> {
        let value = self.value(row, column)?;
        match value {
            Value::Null => Ok(0),
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .ok_or_else(|| invalid(column, value)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<u64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u64))
                    .ok_or_else(|| invalid(column, value))
            }
            _ => Err(invalid(column, value)),
        }
    }

    /// Value as a string; `NULL` reads as `None`.
    pub fn get_str(&self, row: usize, column: &str) -> ExecutorResult<Option<String>> {
        Ok(match self.value(row, column)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
    }
}

fn invalid(column: &str, value: &Value) -> ExecutorError {
    ExecutorError::InvalidValue {
        column: column.to_string(),
        value: value.to_string(),
    }
}
