//! RAII guard that runs cleanup when a test ends, however it ends.

use crate::context::TestContext;
use common::{Config, DbResult, ports::Connector};
use std::ops::{Deref, DerefMut};
use tracing::warn;

/// A prepared [`TestContext`] whose cleanup runs on drop.
///
/// `begin` returns an error instead of a guard when the schema reset or the
/// seed fails, so the test fails before its body starts and shows the
/// underlying error. Once a guard exists, its tracked rows are removed when it
/// goes out of scope, including during a panic.
///
/// # Example
///
/// ```
/// use dbtest::prelude::*;
/// use dbtest::fixtures::sample_server;
///
/// let server = sample_server();
/// {
///     let mut case = CaseGuard::begin(&server, Config::default()).unwrap();
///     case.insert_tracked("users", criteria! { "id" => 1, "name" => "Ann" }).unwrap();
///     case.assert_present("users", &criteria! { "id" => 1 }).unwrap();
/// }
///
/// let mut next = CaseGuard::begin(&server, Config::default()).unwrap();
/// next.assert_absent("users", &criteria! { "id" => 1 }).unwrap();
/// ```
pub struct CaseGuard {
    ctx: TestContext,
    finished: bool,
}

impl CaseGuard {
    /// Connect to the configured group and prepare it.
    pub fn begin(connector: &dyn Connector, config: Config) -> DbResult<Self> {
        Self::from_context(TestContext::new(connector, config)?)
    }

    /// Prepare an existing context and guard it.
    pub fn from_context(mut ctx: TestContext) -> DbResult<Self> {
        ctx.prepare()?;
        Ok(Self {
            ctx,
            finished: false,
        })
    }

    /// Run cleanup now and report its outcome instead of logging it.
    pub fn finish(mut self) -> DbResult<()> {
        self.finished = true;
        self.ctx.cleanup()
    }
}

impl Deref for CaseGuard {
    type Target = TestContext;

    fn deref(&self) -> &TestContext {
        &self.ctx
    }
}

impl DerefMut for CaseGuard {
    fn deref_mut(&mut self) -> &mut TestContext {
        &mut self.ctx
    }
}

impl Drop for CaseGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.ctx.cleanup() {
            warn!(group = %self.ctx.config().group, error = %err, "cleanup after test failed");
        }
    }
}
