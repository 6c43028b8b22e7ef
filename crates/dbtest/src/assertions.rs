//! Database assertion helpers.
//!
//! Each helper counts or fetches through a [`DataAccess`] port and turns the
//! outcome into a `DbResult`: `Ok(())` on pass, [`DbError::Assertion`] on
//! fail. Port errors pass through untouched, so a broken query is never
//! reported as a failed expectation.

use common::{
    AssertionFailure, Criteria, DbError, DbResult, Expectation, ports::DataAccess,
};
use types::Value;

/// Fails unless no row in `table` matches `criteria`.
///
/// # Example
///
/// ```no_run
/// use dbtest::prelude::*;
///
/// # fn example(db: &mut dyn common::ports::DataAccess) -> DbResult<()> {
/// assert_absent(db, "users", &criteria! { "email" => "ann@example.com" })?;
/// # Ok(())
/// # }
/// ```
pub fn assert_absent<D: DataAccess + ?Sized>(
    db: &mut D,
    table: &str,
    criteria: &Criteria,
) -> DbResult<()> {
    let found = db.count(table, criteria)?;
    if found == 0 {
        Ok(())
    } else {
        Err(failure(table, criteria, Expectation::Absent { found }))
    }
}

/// Fails unless at least one row in `table` matches `criteria`.
pub fn assert_present<D: DataAccess + ?Sized>(
    db: &mut D,
    table: &str,
    criteria: &Criteria,
) -> DbResult<()> {
    if db.count(table, criteria)? > 0 {
        Ok(())
    } else {
        Err(failure(table, criteria, Expectation::Present))
    }
}

/// Fails unless exactly `expected` rows in `table` match `criteria`.
pub fn assert_row_count<D: DataAccess + ?Sized>(
    db: &mut D,
    expected: u64,
    table: &str,
    criteria: &Criteria,
) -> DbResult<()> {
    let found = db.count(table, criteria)?;
    if found == expected {
        Ok(())
    } else {
        Err(failure(
            table,
            criteria,
            Expectation::RowCount { expected, found },
        ))
    }
}

/// Value of `column` in the first row matching `criteria`.
///
/// Returns `Ok(None)` when nothing matches; a NULL column comes back as
/// `Some(Value::Null)`. With several matches the backend's default order
/// decides which row is used, so pass criteria that select one row.
pub fn fetch_column<D: DataAccess + ?Sized>(
    db: &mut D,
    table: &str,
    column: &str,
    criteria: &Criteria,
) -> DbResult<Option<Value>> {
    Ok(db
        .fetch_one(table, &[column], criteria)?
        .and_then(|mut row| row.remove(column)))
}

/// Panics unless `result` failed with a message containing `needle`.
///
/// Returns the error so the caller can check its variant too.
///
/// # Example
///
/// ```
/// use dbtest::prelude::*;
///
/// let result: DbResult<()> = Err(DbError::Seed("seed 'Missing' not found".into()));
/// let err = assert_error_contains(result, "'Missing' not found");
/// assert!(matches!(err, DbError::Seed(_)));
/// ```
#[track_caller]
pub fn assert_error_contains<T>(result: DbResult<T>, needle: &str) -> DbError {
    let Err(err) = result else {
        panic!("operation succeeded, expected an error mentioning {needle:?}");
    };
    let message = err.to_string();
    assert!(
        message.contains(needle),
        "error {message:?} does not mention {needle:?}"
    );
    err
}

fn failure(table: &str, criteria: &Criteria, expectation: Expectation) -> DbError {
    AssertionFailure {
        table: table.to_string(),
        criteria: criteria.clone(),
        expectation,
    }
    .into()
}
