//! Versioned schema changes and the in-memory migration runner.

use crate::schema::ColumnDef;
use crate::store::Store;
use crate::{Map, Shared};
use common::{DbError, DbResult, ports::SchemaReset};
use std::path::{Path, PathBuf};
use tracing::trace;

/// A single schema operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaChange {
    CreateTable {
        name: String,
        columns: Vec<ColumnDef>,
        primary_key: Vec<String>,
    },
    DropTable {
        name: String,
    },
    AddColumn {
        table: String,
        column: ColumnDef,
    },
}

impl SchemaChange {
    pub fn create_table(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        SchemaChange::CreateTable {
            name: name.into(),
            columns,
            primary_key: Vec::new(),
        }
    }

    /// Same as [`create_table`](Self::create_table) with a primary key.
    pub fn create_table_with_key(
        name: impl Into<String>,
        columns: Vec<ColumnDef>,
        primary_key: &[&str],
    ) -> Self {
        SchemaChange::CreateTable {
            name: name.into(),
            columns,
            primary_key: primary_key.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn drop_table(name: impl Into<String>) -> Self {
        SchemaChange::DropTable { name: name.into() }
    }

    pub fn add_column(table: impl Into<String>, column: ColumnDef) -> Self {
        SchemaChange::AddColumn {
            table: table.into(),
            column,
        }
    }
}

/// A versioned migration with its forward and rollback steps.
///
/// # Example
/// ```
/// use memdb::{ColumnDef, Migration, SchemaChange};
/// use types::SqlType;
///
/// let migration = Migration::new(1, "create_users")
///     .up(SchemaChange::create_table(
///         "users",
///         vec![ColumnDef::new("id", SqlType::Int)],
///     ))
///     .down(SchemaChange::drop_table("users"));
/// assert_eq!(migration.version(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Migration {
    version: u64,
    name: String,
    up: Vec<SchemaChange>,
    down: Vec<SchemaChange>,
}

impl Migration {
    pub fn new(version: u64, name: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
            up: Vec::new(),
            down: Vec::new(),
        }
    }

    pub fn up(mut self, change: SchemaChange) -> Self {
        self.up.push(change);
        self
    }

    pub fn down(mut self, change: SchemaChange) -> Self {
        self.down.push(change);
        self
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> String {
        format!("{}_{}", self.version, self.name)
    }
}

pub(crate) type MigrationSets = Map<PathBuf, Vec<Migration>>;

/// `SchemaReset` handle for one group.
///
/// Rollback replays the `down` steps recorded when each migration was
/// applied, so a reset works even if the source changed in between.
pub struct MemoryMigrations {
    store: Shared<Store>,
    sets: Shared<MigrationSets>,
    source: PathBuf,
}

impl MemoryMigrations {
    pub(crate) fn new(store: Shared<Store>, sets: Shared<MigrationSets>, source: PathBuf) -> Self {
        Self {
            store,
            sets,
            source,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    fn pending_set(&self) -> DbResult<Vec<Migration>> {
        let sets = self.sets.borrow();
        let set = sets.get(&self.source).ok_or_else(|| {
            DbError::Migration(format!(
                "no migrations registered at '{}'",
                self.source.display()
            ))
        })?;

        let mut ordered = set.clone();
        ordered.sort_by_key(Migration::version);
        for pair in ordered.windows(2) {
            if pair[0].version == pair[1].version {
                return Err(DbError::Migration(format!(
                    "duplicate migration version {} ({} and {})",
                    pair[0].version, pair[0].name, pair[1].name
                )));
            }
        }
        if let Some(zero) = ordered.iter().find(|m| m.version == 0) {
            return Err(DbError::Migration(format!(
                "migration '{}' uses reserved version 0",
                zero.name
            )));
        }
        Ok(ordered)
    }
}

impl SchemaReset for MemoryMigrations {
    fn set_source(&mut self, path: &Path) {
        self.source = path.to_path_buf();
    }

    fn reset_to_empty(&mut self) -> DbResult<()> {
        let mut store = self.store.borrow_mut();
        for migration in store.take_applied() {
            trace!(migration = %migration.label(), "rolling back");
            for change in &migration.down {
                store.apply(change).map_err(|err| {
                    DbError::Migration(format!("rollback of {} failed: {err}", migration.label()))
                })?;
            }
        }
        store.drop_all_tables();
        Ok(())
    }

    fn apply_all_pending(&mut self) -> DbResult<()> {
        let ordered = self.pending_set()?;
        let mut store = self.store.borrow_mut();
        for migration in ordered {
            if store.is_applied(migration.version) {
                continue;
            }
            trace!(migration = %migration.label(), "applying");
            for change in &migration.up {
                store.apply(change).map_err(|err| {
                    DbError::Migration(format!("{} failed: {err}", migration.label()))
                })?;
            }
            store.mark_applied(migration);
        }
        Ok(())
    }

    fn current_version(&self) -> u64 {
        self.store.borrow().version()
    }
}
