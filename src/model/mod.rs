//! Entity model: workload queries, join predicates, prejoins, samples, and
//! statistics.
//!
//! Collections that define identity (table sets, column sets, join pairs) are
//! ordered sets of canonical values, so equality and hashing never depend on
//! insertion order.

mod column_pair;
mod prejoin;
mod query;
mod sample;
mod stat;

pub use column_pair::ColumnPair;
pub use prejoin::{Prejoin, PREJOIN_PREFIX};
pub use query::{find_fact_table, Query, FACT_TABLES, FACT_TABLE_TOKEN, STAT_TABLE_TOKEN};
pub use sample::{Sample, SampleType, DEFAULT_E, DEFAULT_Z, SAMPLE_SUFFIX};
pub use stat::{Stat, TABLE_STAT_SUFFIX};

pub(crate) use sample::dotless;
