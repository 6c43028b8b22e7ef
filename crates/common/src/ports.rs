//! Capabilities the test-case helpers consume from a database backend.
//!
//! All calls are blocking. Implementations report failures with the matching
//! [`DbError`](crate::DbError) variant and must not retry on their own.

use crate::{Criteria, DbResult, RowMap};
use std::path::Path;

/// Filtered row access against one connection group.
pub trait DataAccess {
    /// Number of rows in `table` matching every filter in `criteria`.
    fn count(&mut self, table: &str, criteria: &Criteria) -> DbResult<u64>;

    /// First matching row, projected onto `columns`. Row order is whatever
    /// the backend returns by default.
    fn fetch_one(
        &mut self,
        table: &str,
        columns: &[&str],
        criteria: &Criteria,
    ) -> DbResult<Option<RowMap>>;

    /// Insert a single row. Constraint violations are `DataAccess` errors.
    fn insert(&mut self, table: &str, data: &Criteria) -> DbResult<()>;

    /// Delete every matching row and return how many went away. Zero is fine.
    fn delete(&mut self, table: &str, criteria: &Criteria) -> DbResult<u64>;
}

/// Migration runner able to roll a schema all the way down and back up.
pub trait SchemaReset {
    fn set_source(&mut self, path: &Path);

    /// Roll back every applied migration, leaving version 0.
    fn reset_to_empty(&mut self) -> DbResult<()>;

    /// Apply every migration not yet applied, in version order.
    fn apply_all_pending(&mut self) -> DbResult<()>;

    /// Highest applied migration version, 0 when the schema is empty.
    fn current_version(&self) -> u64;
}

/// Runs named seed routines.
pub trait FixtureLoader {
    fn set_source(&mut self, path: &Path);

    /// Run the seed called `name` against `db`. Unknown names are `Seed` errors.
    fn run(&mut self, name: &str, db: &mut dyn DataAccess) -> DbResult<()>;
}

/// The three ports a test case needs, all bound to the same group.
pub struct Ports {
    pub db: Box<dyn DataAccess>,
    pub migrations: Box<dyn SchemaReset>,
    pub seeder: Box<dyn FixtureLoader>,
}

/// Resolves a group identifier to its ports.
pub trait Connector {
    /// Unknown groups are `Configuration` errors.
    fn connect(&self, group: &str) -> DbResult<Ports>;
}
