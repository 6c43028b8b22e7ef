//! In-memory database backend for the test-case helpers.
//!
//! A [`MemoryServer`] owns any number of isolated groups, each with its own
//! tables and migration history, plus the migration sets and seed routines
//! registered under source paths. Connecting to a group hands out the three
//! ports the helpers need. Everything is single-threaded; give each parallel
//! test worker its own server or its own group.
//!
//! # Example
//!
//! ```
//! use common::{Criteria, ports::{Connector, DataAccess, SchemaReset}};
//! use memdb::{ColumnDef, MemoryServer, Migration, SchemaChange};
//! use types::SqlType;
//!
//! let server = MemoryServer::new();
//! server.register_migrations(
//!     "database/migrations",
//!     vec![Migration::new(1, "create_users")
//!         .up(SchemaChange::create_table("users", vec![ColumnDef::new("id", SqlType::Int)]))
//!         .down(SchemaChange::drop_table("users"))],
//! );
//!
//! let mut ports = server.connect("tests").unwrap();
//! ports.migrations.apply_all_pending().unwrap();
//! ports.db.insert("users", &Criteria::new().with("id", 1)).unwrap();
//! assert_eq!(ports.db.count("users", &Criteria::new()).unwrap(), 1);
//! ```

pub mod migrations;
pub mod pretty;
pub mod schema;
pub mod seeds;
pub mod store;

use ahash::RandomState;
use common::{
    DbError, DbResult, RowMap,
    config::DEFAULT_GROUP,
    ports::{Connector, Ports},
};
use hashbrown::HashMap;
use std::{cell::RefCell, path::Path, path::PathBuf, rc::Rc};

pub use migrations::{MemoryMigrations, Migration, SchemaChange};
pub use pretty::TableStyleKind;
pub use schema::{ColumnDef, Table, TableSchema};
pub use seeds::{MemorySeeder, SeedContext, SeedRoutine};
pub use store::{MemoryConnection, Store};

type Map<K, V> = HashMap<K, V, RandomState>;
type Shared<T> = Rc<RefCell<T>>;

/// Migration source used when a test case leaves its base path empty.
pub const DEFAULT_MIGRATIONS_PATH: &str = "database/migrations";

/// Seed source used when a test case leaves its base path empty.
pub const DEFAULT_SEEDS_PATH: &str = "database/seeds";

/// A set of in-memory databases keyed by group name.
pub struct MemoryServer {
    groups: RefCell<Map<String, Shared<Store>>>,
    migrations: Shared<migrations::MigrationSets>,
    seeds: Shared<seeds::SeedSets>,
}

impl MemoryServer {
    /// Create a server with the default `tests` group.
    pub fn new() -> Self {
        let server = Self::empty();
        server.add_group(DEFAULT_GROUP);
        server
    }

    /// Create a server without any groups.
    pub fn empty() -> Self {
        Self {
            groups: RefCell::new(Map::default()),
            migrations: Rc::new(RefCell::new(Map::default())),
            seeds: Rc::new(RefCell::new(Map::default())),
        }
    }

    /// Add an empty group. Adding an existing group keeps its data.
    pub fn add_group(&self, name: &str) {
        self.groups
            .borrow_mut()
            .entry(name.to_string())
            .or_default();
    }

    /// Register (or replace) the migrations found at `path`.
    pub fn register_migrations(&self, path: impl AsRef<Path>, migrations: Vec<Migration>) {
        self.migrations
            .borrow_mut()
            .insert(path.as_ref().to_path_buf(), migrations);
    }

    /// Register a named seed routine under `path`.
    pub fn register_seed<F>(&self, path: impl AsRef<Path>, name: &str, routine: F)
    where
        F: Fn(&mut SeedContext<'_>) -> DbResult<()> + 'static,
    {
        self.seeds
            .borrow_mut()
            .entry(path.as_ref().to_path_buf())
            .or_default()
            .insert(name.to_string(), Rc::new(routine));
    }

    /// Current rows of `table` in `group`, in insertion order.
    pub fn rows(&self, group: &str, table: &str) -> DbResult<Vec<RowMap>> {
        let store = self.store(group)?;
        let store = store.borrow();
        Ok(store.table(table)?.rows().to_vec())
    }

    /// Sorted table names currently present in `group`.
    pub fn table_names(&self, group: &str) -> DbResult<Vec<String>> {
        Ok(self.store(group)?.borrow().table_names())
    }

    /// Render `table` in `group` for diagnostics.
    pub fn dump_table(&self, group: &str, table: &str, style: TableStyleKind) -> DbResult<String> {
        let store = self.store(group)?;
        let store = store.borrow();
        Ok(pretty::render_table(store.table(table)?, style))
    }

    fn store(&self, group: &str) -> DbResult<Shared<Store>> {
        self.groups
            .borrow()
            .get(group)
            .cloned()
            .ok_or_else(|| DbError::Configuration(format!("unknown database group '{group}'")))
    }
}

impl Default for MemoryServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for MemoryServer {
    fn connect(&self, group: &str) -> DbResult<Ports> {
        let store = self.store(group)?;
        Ok(Ports {
            db: Box::new(MemoryConnection::new(store.clone())),
            migrations: Box::new(MemoryMigrations::new(
                store,
                self.migrations.clone(),
                PathBuf::from(DEFAULT_MIGRATIONS_PATH),
            )),
            seeder: Box::new(MemorySeeder::new(
                self.seeds.clone(),
                PathBuf::from(DEFAULT_SEEDS_PATH),
            )),
        })
    }
}
