//! Prejoin definition files.
//!
//! One prejoin per line:
//!
//! ```text
//! tpcds;my_join;store_sales,date_dim,item;ss_sold_date_sk = d_date_sk AND ss_item_sk = i_item_sk
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::cache::Meta;
use crate::error::PlanResult;
use crate::executor::SqlExecutor;
use crate::model::{find_fact_table, ColumnPair, Prejoin};

/// `column = column`, each side optionally qualified.
static EQUI_JOIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][\w.]*)\s*=\s*([A-Za-z_][\w.]*)$").unwrap()
});

#[derive(Debug, Error)]
pub enum PrejoinFileError {
    #[error("Failed to read prejoin file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed prejoin definition on line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Parse one definition line.
///
/// Returns `Ok(None)` when the tables name no fact table; such joins cannot
/// serve as a sample source.
pub fn parse_prejoin_line(line_no: usize, line: &str) -> Result<Option<Prejoin>, PrejoinFileError> {
    let malformed = |reason: &str| PrejoinFileError::Malformed {
        line: line_no,
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = line.split(';').map(str::trim).collect();
    let [database, name, tables, joins] = fields[..] else {
        return Err(malformed("expected 4 ';'-separated fields"));
    };
    if database.is_empty() || name.is_empty() {
        return Err(malformed("database and name must not be empty"));
    }

    let tables: Vec<String> = tables
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    let Some(fact) = find_fact_table(&tables).map(str::to_string) else {
        return Ok(None);
    };

    let mut pairs = Vec::new();
    for predicate in joins.split(" AND ").map(str::trim).filter(|p| !p.is_empty()) {
        let caps = EQUI_JOIN
            .captures(predicate)
            .ok_or_else(|| malformed(&format!("not an equi-join: {}", predicate)))?;
        pairs.push(ColumnPair::new(&caps[1], &caps[2]));
    }

    Ok(Some(Prejoin::new(name, database, fact, tables, pairs)))
}

/// Parse every definition in `content`.
pub fn parse_prejoins(content: &str) -> Result<Vec<Prejoin>, PrejoinFileError> {
    let mut prejoins = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_prejoin_line(i + 1, line)? {
            Some(prejoin) => prejoins.push(prejoin),
            None => tracing::debug!(line = i + 1, "no fact table, skipping prejoin definition"),
        }
    }
    Ok(prejoins)
}

pub fn load_prejoin_file(path: &Path) -> Result<Vec<Prejoin>, PrejoinFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| PrejoinFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_prejoins(&content)
}

/// Register the prejoins of a definition file whose tables exist.
///
/// Returns the registered prejoins.
pub fn import_prejoins<E: SqlExecutor + ?Sized>(
    path: &Path,
    executor: &E,
    meta: &Meta<'_>,
) -> PlanResult<Vec<Prejoin>> {
    let mut imported = Vec::new();
    for prejoin in load_prejoin_file(path)? {
        if executor.table_exists(&prejoin.database, &prejoin.name)? {
            tracing::info!(prejoin = %prejoin.name, database = %prejoin.database, "registering prejoin");
            meta.add_prejoin(&prejoin);
            imported.push(prejoin);
        } else {
            tracing::warn!(prejoin = %prejoin.name, "prejoin table does not exist, skipping");
        }
    }
    Ok(imported)
}
