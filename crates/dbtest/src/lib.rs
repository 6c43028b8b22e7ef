//! Database lifecycle and assertion helpers for tests.
//!
//! This crate gives each test a known database baseline and a small set of
//! checks over it:
//! - Schema reset to empty and re-migration before each test
//! - Optional seeding from a named seed routine
//! - Tracked inserts that are deleted again after the test, pass or fail
//! - Row presence, absence, count and single-column assertions
//!
//! The database itself sits behind the ports in [`common::ports`]; the
//! [`memdb`] crate provides an in-memory implementation.
//!
//! # Example Usage
//!
//! ```
//! use dbtest::prelude::*;
//! use dbtest::fixtures::sample_server;
//!
//! let server = sample_server();
//! let config = Config::builder().seed("DatabaseSeeder").build();
//!
//! let mut case = CaseGuard::begin(&server, config).unwrap();
//! case.assert_row_count(0, "orders", &criteria! { "status" => "pending" }).unwrap();
//!
//! case.insert_tracked("orders", criteria! { "id" => 5, "status" => "pending" }).unwrap();
//! case.assert_row_count(1, "orders", &criteria! { "status" => "pending" }).unwrap();
//!
//! let status = case.fetch_column("orders", "status", &criteria! { "id" => 5 }).unwrap();
//! assert_eq!(status, Some(Value::Text("pending".into())));
//! // Dropping `case` deletes order 5 again.
//! ```

#[macro_use]
mod macros;

pub mod assertions;
pub mod context;
pub mod fixtures;
pub mod guard;
pub mod ledger;
pub mod logging;
pub mod proptest_generators;

pub use common::{Config, Criteria, DbError, DbResult};

/// Convenient re-exports for common testing patterns.
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::context::*;
    pub use crate::criteria;
    pub use crate::guard::*;
    pub use crate::ledger::*;
    pub use common::ports::{Connector, DataAccess};
    pub use common::{AssertionFailure, Config, Criteria, DbError, DbResult, Expectation};
    pub use types::Value;
}
