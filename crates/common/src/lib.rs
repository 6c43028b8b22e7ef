
pub mod config;
pub mod ports;

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use thiserror::Error;
use types::Value;

pub use config::Config;

/// Named row keyed by column name.
/// Examples:
/// - `let mut row = RowMap::new(); row.insert("id".into(), Value::Int(1));`
/// - `let row = RowMap::from([("name".into(), Value::Text("Ann".into()))]);`
/// - `let row = RowMap::from([("deleted_at".into(), Value::Null)]);`
pub type RowMap = BTreeMap<String, Value>;

/// Equality filters over named columns, ANDed together.
///
/// The same shape doubles as full row data for inserts, which is what lets a
/// tracked insert reuse its data as the delete filter during cleanup.
/// Examples:
/// - `let c = Criteria::new().with("id", 1);`
/// - `let c = Criteria::new().with("status", "pending").with("user_id", 7);`
/// - `let c = Criteria::new().with("deleted_at", Value::Null); // IS NULL`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Criteria(RowMap);

impl Criteria {
    pub fn new() -> Self {
        Self(RowMap::new())
    }

    /// Builder-style insert. A repeated column keeps the last value.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(column.into(), value.into())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true when every filter equals the row's value. A NULL filter
    /// matches a NULL (or absent) column, mirroring `IS NULL`.
    pub fn matches(&self, row: &RowMap) -> bool {
        self.0
            .iter()
            .all(|(column, expected)| row.get(column).map_or(expected.is_null(), |v| v == expected))
    }

    pub fn as_map(&self) -> &RowMap {
        &self.0
    }

    pub fn into_inner(self) -> RowMap {
        self.0
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(any row)");
        }
        for (i, (column, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            match value {
                Value::Null => write!(f, "{column} IS NULL")?,
                other => write!(f, "{column} = {other}")?,
            }
        }
        Ok(())
    }
}

impl From<RowMap> for Criteria {
    fn from(map: RowMap) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// What an assertion helper expected to see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expectation {
    /// No row should match; `found` rows did.
    Absent { found: u64 },
    /// At least one row should match; none did.
    Present,
    /// Exactly `expected` rows should match; `found` did.
    RowCount { expected: u64, found: u64 },
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Absent { found } => {
                write!(f, "row was found in database ({found} matching)")
            }
            Expectation::Present => f.write_str("row not found in database"),
            Expectation::RowCount { expected, found } => write!(
                f,
                "wrong number of matching rows in database: expected {expected}, found {found}"
            ),
        }
    }
}

/// A failed database assertion, naming the table and the filters used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssertionFailure {
    pub table: String,
    pub criteria: Criteria,
    pub expectation: Expectation,
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: table '{}' where {}",
            self.expectation, self.table, self.criteria
        )
    }
}

impl std::error::Error for AssertionFailure {}

/// Error taxonomy shared by the ports and the test-case helpers.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("configuration: {0}")]
    Configuration(String),
    #[error("migration: {0}")]
    Migration(String),
    #[error("seed: {0}")]
    Seed(String),
    #[error("data access: {0}")]
    DataAccess(String),
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),
}

impl DbError {
    /// Returns the assertion failure if this error came from an assertion helper.
    pub fn as_assertion(&self) -> Option<&AssertionFailure> {
        match self {
            DbError::Assertion(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Result alias that carries a `DbError`.
pub type DbResult<T> = Result<T, DbError>;

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::ports::{Connector, DataAccess, FixtureLoader, Ports, SchemaReset};
    pub use crate::{AssertionFailure, Criteria, DbError, DbResult, Expectation, RowMap};
    pub use types::{SqlType, Value};
}
