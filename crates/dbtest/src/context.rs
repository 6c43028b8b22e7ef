//! Per-test database lifecycle.
//!
//! A [`TestContext`] owns the ports for one connection group and drives the
//! reset → seed → test body → cleanup sequence for each test it runs. The
//! body runs outside the context; [`CaseGuard`](crate::guard::CaseGuard)
//! wires cleanup into `Drop` so it happens whether the body passes or panics.

use crate::assertions;
use crate::ledger::Ledger;
use common::{
    Config, Criteria, DbError, DbResult,
    ports::{Connector, DataAccess, FixtureLoader, Ports, SchemaReset},
};
use tracing::{debug, debug_span, trace};
use types::Value;

/// Where a context is in its prepare → cleanup cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Connected, nothing run yet.
    Idle,
    /// Schema reset and seeding finished; a test body may run.
    Prepared,
    /// Tracked rows removed; ready for the next `prepare`.
    CleanedUp,
}

/// Database state and helpers for one test case.
///
/// # Example
///
/// ```
/// use dbtest::prelude::*;
/// use dbtest::fixtures::sample_server;
///
/// let server = sample_server();
/// let mut ctx = TestContext::new(&server, Config::default()).unwrap();
/// ctx.prepare().unwrap();
///
/// ctx.insert_tracked("users", criteria! { "id" => 10, "name" => "Ann" }).unwrap();
/// ctx.assert_present("users", &criteria! { "id" => 10 }).unwrap();
///
/// ctx.cleanup().unwrap();
/// ctx.assert_absent("users", &criteria! { "id" => 10 }).unwrap();
/// ```
pub struct TestContext {
    config: Config,
    db: Box<dyn DataAccess>,
    migrations: Box<dyn SchemaReset>,
    seeder: Box<dyn FixtureLoader>,
    ledger: Ledger,
    phase: Phase,
}

impl TestContext {
    /// Validate `config` and connect to its group.
    pub fn new(connector: &dyn Connector, config: Config) -> DbResult<Self> {
        config.validate()?;
        let ports = connector.connect(&config.group)?;
        Self::from_ports(config, ports)
    }

    /// Build a context around ports that are already connected.
    pub fn from_ports(config: Config, ports: Ports) -> DbResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            db: ports.db,
            migrations: ports.migrations,
            seeder: ports.seeder,
            ledger: Ledger::new(),
            phase: Phase::Idle,
        })
    }

    /// Bring the database to its baseline: reset and migrate when `refresh`
    /// is set, then run the configured seed.
    ///
    /// Errors from the migration runner or the seeder are returned as-is.
    pub fn prepare(&mut self) -> DbResult<()> {
        if self.phase == Phase::Prepared {
            return Err(DbError::Configuration(
                "prepare called again before the previous test was cleaned up".into(),
            ));
        }
        let _span = debug_span!("prepare", group = %self.config.group).entered();

        if self.config.refresh {
            if let Some(path) = self.config.migrations_path() {
                self.migrations.set_source(&path);
            }
            debug!("resetting schema");
            self.migrations.reset_to_empty()?;
            self.migrations.apply_all_pending()?;
            debug!(version = self.migrations.current_version(), "schema migrated");
        }

        if let Some(name) = self.config.seed_name().map(str::to_owned) {
            self.seed(&name)?;
        }

        self.phase = Phase::Prepared;
        Ok(())
    }

    /// Run the seed called `name` now.
    pub fn seed(&mut self, name: &str) -> DbResult<()> {
        if let Some(path) = self.config.seeds_path() {
            self.seeder.set_source(&path);
        }
        debug!(seed = name, "seeding");
        self.seeder.run(name, self.db.as_mut())
    }

    /// Delete every row recorded by [`insert_tracked`](Self::insert_tracked).
    ///
    /// Every entry is attempted even if an earlier delete fails; the first
    /// error is returned once the ledger is empty. Deletes that match no rows
    /// (or several) are not errors.
    pub fn cleanup(&mut self) -> DbResult<()> {
        let entries = self.ledger.drain();
        if !entries.is_empty() {
            debug!(group = %self.config.group, rows = entries.len(), "removing tracked rows");
        }

        let mut first_error = None;
        for entry in entries {
            match self.db.delete(&entry.table, &entry.criteria) {
                Ok(deleted) => {
                    trace!(table = %entry.table, criteria = %entry.criteria, deleted, "deleted")
                }
                Err(err) => {
                    debug!(table = %entry.table, error = %err, "delete failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        self.phase = Phase::CleanedUp;
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Insert `data` into `table` and remember it for cleanup.
    ///
    /// The whole row is used as the delete filter afterwards, so it should
    /// identify the row uniquely; otherwise identical sibling rows are
    /// deleted with it. A failed insert records nothing.
    pub fn insert_tracked(&mut self, table: &str, data: Criteria) -> DbResult<()> {
        self.db.insert(table, &data)?;
        trace!(table, row = %data, "tracked insert");
        self.ledger.record(table, data);
        Ok(())
    }

    pub fn assert_absent(&mut self, table: &str, criteria: &Criteria) -> DbResult<()> {
        assertions::assert_absent(self.db.as_mut(), table, criteria)
    }

    pub fn assert_present(&mut self, table: &str, criteria: &Criteria) -> DbResult<()> {
        assertions::assert_present(self.db.as_mut(), table, criteria)
    }

    pub fn assert_row_count(
        &mut self,
        expected: u64,
        table: &str,
        criteria: &Criteria,
    ) -> DbResult<()> {
        assertions::assert_row_count(self.db.as_mut(), expected, table, criteria)
    }

    pub fn fetch_column(
        &mut self,
        table: &str,
        column: &str,
        criteria: &Criteria,
    ) -> DbResult<Option<Value>> {
        assertions::fetch_column(self.db.as_mut(), table, column, criteria)
    }

    /// Direct access to the data port, for queries the helpers don't cover.
    pub fn db(&mut self) -> &mut dyn DataAccess {
        self.db.as_mut()
    }

    pub fn schema_version(&self) -> u64 {
        self.migrations.current_version()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, sample_server};
    use common::RowMap;
    use memdb::MemoryServer;
    use std::{cell::RefCell, path::Path, rc::Rc};

    fn prepared(server: &MemoryServer, config: Config) -> TestContext {
        let mut ctx = TestContext::new(server, config).unwrap();
        ctx.prepare().unwrap();
        ctx
    }

    #[test]
    fn prepare_migrates_to_latest() {
        let server = sample_server();
        let ctx = prepared(&server, Config::default());
        assert_eq!(ctx.schema_version(), fixtures::LATEST_VERSION);
        assert_eq!(ctx.phase(), Phase::Prepared);
    }

    #[test]
    fn prepare_without_refresh_keeps_existing_rows() {
        let server = sample_server();
        let mut first = prepared(&server, Config::default());
        first
            .db()
            .insert("users", &Criteria::new().with("id", 42).with("name", "Kept"))
            .unwrap();

        let mut second = prepared(&server, Config::builder().refresh(false).build());
        second
            .assert_present("users", &Criteria::new().with("id", 42))
            .unwrap();
    }

    #[test]
    fn configured_seed_runs_after_migrations() {
        let server = sample_server();
        let mut ctx = prepared(&server, Config::builder().seed("UserSeeder").build());
        ctx.assert_row_count(3, "users", &Criteria::new()).unwrap();
    }

    #[test]
    fn prepare_twice_without_cleanup_is_rejected() {
        let server = sample_server();
        let mut ctx = prepared(&server, Config::default());
        assert!(matches!(ctx.prepare(), Err(DbError::Configuration(_))));

        ctx.cleanup().unwrap();
        ctx.prepare().unwrap();
    }

    #[test]
    fn failed_insert_is_not_tracked() {
        let server = sample_server();
        let mut ctx = prepared(&server, Config::default());
        let err = ctx
            .insert_tracked("users", Criteria::new().with("id", 1))
            .unwrap_err();
        assert!(matches!(err, DbError::DataAccess(_)));
        assert!(ctx.ledger().is_empty());
    }

    /// Port that logs deletes and refuses to delete from one table.
    struct Recording {
        deletes: Rc<RefCell<Vec<String>>>,
        failing_table: &'static str,
    }

    impl DataAccess for Recording {
        fn count(&mut self, _table: &str, _criteria: &Criteria) -> DbResult<u64> {
            Ok(0)
        }

        fn fetch_one(
            &mut self,
            _table: &str,
            _columns: &[&str],
            _criteria: &Criteria,
        ) -> DbResult<Option<RowMap>> {
            Ok(None)
        }

        fn insert(&mut self, _table: &str, _data: &Criteria) -> DbResult<()> {
            Ok(())
        }

        fn delete(&mut self, table: &str, criteria: &Criteria) -> DbResult<u64> {
            self.deletes.borrow_mut().push(format!("{table}: {criteria}"));
            if table == self.failing_table {
                Err(DbError::DataAccess(format!("unknown table '{table}'")))
            } else {
                Ok(1)
            }
        }
    }

    struct NoMigrations;

    impl SchemaReset for NoMigrations {
        fn set_source(&mut self, _path: &Path) {}

        fn reset_to_empty(&mut self) -> DbResult<()> {
            Ok(())
        }

        fn apply_all_pending(&mut self) -> DbResult<()> {
            Ok(())
        }

        fn current_version(&self) -> u64 {
            0
        }
    }

    struct NoSeeds;

    impl FixtureLoader for NoSeeds {
        fn set_source(&mut self, _path: &Path) {}

        fn run(&mut self, name: &str, _db: &mut dyn DataAccess) -> DbResult<()> {
            Err(DbError::Seed(format!("seed '{name}' not found")))
        }
    }

    fn recording(failing_table: &'static str) -> (TestContext, Rc<RefCell<Vec<String>>>) {
        let deletes = Rc::new(RefCell::new(Vec::new()));
        let ports = Ports {
            db: Box::new(Recording {
                deletes: deletes.clone(),
                failing_table,
            }),
            migrations: Box::new(NoMigrations),
            seeder: Box::new(NoSeeds),
        };
        (TestContext::from_ports(Config::default(), ports).unwrap(), deletes)
    }

    #[test]
    fn cleanup_deletes_in_record_order() {
        let (mut ctx, deletes) = recording("none");
        ctx.prepare().unwrap();
        ctx.insert_tracked("users", Criteria::new().with("id", 1)).unwrap();
        ctx.insert_tracked("orders", Criteria::new().with("id", 5)).unwrap();

        ctx.cleanup().unwrap();
        assert_eq!(
            *deletes.borrow(),
            vec!["users: id = 1".to_string(), "orders: id = 5".to_string()]
        );

        ctx.cleanup().unwrap();
        assert_eq!(deletes.borrow().len(), 2);
    }

    #[test]
    fn cleanup_continues_past_failures() {
        let (mut ctx, deletes) = recording("orders");
        ctx.prepare().unwrap();
        ctx.insert_tracked("orders", Criteria::new().with("id", 5)).unwrap();
        ctx.insert_tracked("users", Criteria::new().with("id", 1)).unwrap();

        let err = ctx.cleanup().unwrap_err();
        assert!(matches!(err, DbError::DataAccess(msg) if msg.contains("orders")));
        assert_eq!(deletes.borrow().len(), 2);
        assert!(ctx.ledger().is_empty());
        assert_eq!(ctx.phase(), Phase::CleanedUp);
    }

    #[test]
    fn seed_errors_surface_unchanged() {
        let (mut ctx, _) = recording("none");
        let err = ctx.seed("Missing").unwrap_err();
        assert_eq!(err.to_string(), "seed: seed 'Missing' not found");
    }
}
