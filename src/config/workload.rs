//! Workload definition files.
//!
//! ```toml
//! [[query]]
//! id = "42"
//! qcs = ["d_year", "i_category", "i_category_id", "d_moy"]
//! tables = ["store_sales", "date_dim", "item"]
//! joins = [["ss_sold_date_sk", "d_date_sk"], ["ss_item_sk", "i_item_sk"]]
//! group_by = ["d_year", "i_category_id", "i_category"]
//! aggregates = ["sum_price"]
//! sql = "SELECT ... FROM FACT_TABLE ..."
//! sample_sql = "SELECT ... FROM FACT_TABLE s JOIN STAT_TABLE t ..."
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::model::Query;

/// Errors raised while loading a workload file.
#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    #[error("Workload file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read workload file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse workload file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Query has no id")]
    MissingId,

    #[error("Duplicate query id: {0}")]
    DuplicateId(String),

    #[error("Query {0} joins several tables but none is a fact table")]
    MissingFactTable(String),
}

pub type WorkloadResult<T> = Result<T, WorkloadError>;

#[derive(Debug, Default, Deserialize)]
struct WorkloadFile {
    #[serde(default, rename = "query")]
    queries: Vec<Query>,
}

/// Load and validate a workload file. Queries keep file order.
pub fn load_workload<P: AsRef<Path>>(path: P) -> WorkloadResult<Vec<Query>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(WorkloadError::FileNotFound(path.to_path_buf()));
    }
    parse_workload(&fs::read_to_string(path)?)
}

/// Parse and validate workload TOML.
pub fn parse_workload(content: &str) -> WorkloadResult<Vec<Query>> {
    let file: WorkloadFile = toml::from_str(content)?;
    validate(&file.queries)?;
    Ok(file.queries)
}

fn validate(queries: &[Query]) -> WorkloadResult<()> {
    let mut seen = BTreeSet::new();
    for query in queries {
        if query.id.is_empty() {
            return Err(WorkloadError::MissingId);
        }
        if !seen.insert(query.id.as_str()) {
            return Err(WorkloadError::DuplicateId(query.id.clone()));
        }
        if query.is_join() && query.fact_table().is_none() {
            return Err(WorkloadError::MissingFactTable(query.id.clone()));
        }
    }
    Ok(())
}
