//! Prejoin materialization.

use super::{create_table_as, join_predicates, qualified};
use crate::model::Prejoin;

/// `SELECT *` over the prejoin's tables, filtered by its join predicates.
pub fn select_join(prejoin: &Prejoin) -> String {
    let tables = prejoin
        .table_set
        .iter()
        .map(|t| qualified(&prejoin.database, t))
        .collect::<Vec<_>>()
        .join(", ");
    if prejoin.join_column_set.is_empty() {
        format!("SELECT * FROM {}", tables)
    } else {
        format!(
            "SELECT * FROM {} WHERE {}",
            tables,
            join_predicates(&prejoin.join_column_set)
        )
    }
}

pub fn create_prejoin(prejoin: &Prejoin) -> String {
    create_table_as(
        &qualified(&prejoin.database, &prejoin.name),
        &select_join(prejoin),
    )
}
