//! Unordered column pairs used as equi-join predicates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An unordered pair of column names.
///
/// The pair is always stored in canonical form: the lexicographically smaller
/// name is `left`. Equality, hashing, and ordering therefore ignore the order
/// in which the columns were written in a join predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "ColumnPairRepr")]
pub struct ColumnPair {
    left: String,
    right: String,
}

/// Accepted on-disk shapes for a column pair.
///
/// Workload files write pairs as `["a", "b"]`; persisted records carry the
/// `{ "left": .., "right": .. }` object form.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColumnPairRepr {
    Tuple(String, String),
    Named { left: String, right: String },
}

impl From<ColumnPairRepr> for ColumnPair {
    fn from(repr: ColumnPairRepr) -> Self {
        match repr {
            ColumnPairRepr::Tuple(left, right) => ColumnPair::new(left, right),
            ColumnPairRepr::Named { left, right } => ColumnPair::new(left, right),
        }
    }
}

impl ColumnPair {
    /// Create a canonical pair from two column names in any order.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let a = a.into();
        let b = b.into();
        if a <= b {
            Self { left: a, right: b }
        } else {
            Self { left: b, right: a }
        }
    }

    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn right(&self) -> &str {
        &self.right
    }

    /// Render as a SQL equality predicate (`left = right`).
    pub fn predicate(&self) -> String {
        format!("{} = {}", self.left, self.right)
    }
}

impl fmt::Display for ColumnPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}

impl<A: Into<String>, B: Into<String>> From<(A, B)> for ColumnPair {
    fn from((a, b): (A, B)) -> Self {
        ColumnPair::new(a, b)
    }
}
