//! Per-group database state and the `DataAccess` handle over it.

use crate::migrations::{Migration, SchemaChange};
use crate::schema::{Table, TableSchema};
use crate::{Map, Shared};
use common::{Criteria, DbError, DbResult, RowMap, ports::DataAccess};
use std::collections::BTreeMap;

/// Tables plus the migrations that produced them, for one group.
#[derive(Debug, Default)]
pub struct Store {
    tables: Map<String, Table>,
    applied: BTreeMap<u64, Migration>,
}

impl Store {
    pub fn table(&self, name: &str) -> DbResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::DataAccess(format!("unknown table '{name}'")))
    }

    pub fn table_mut(&mut self, name: &str) -> DbResult<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DbError::DataAccess(format!("unknown table '{name}'")))
    }

    /// Table names, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn version(&self) -> u64 {
        self.applied.keys().next_back().copied().unwrap_or(0)
    }

    pub(crate) fn is_applied(&self, version: u64) -> bool {
        self.applied.contains_key(&version)
    }

    pub(crate) fn mark_applied(&mut self, migration: Migration) {
        self.applied.insert(migration.version(), migration);
    }

    /// Removes and returns applied migrations, newest first.
    pub(crate) fn take_applied(&mut self) -> Vec<Migration> {
        std::mem::take(&mut self.applied).into_values().rev().collect()
    }

    pub(crate) fn drop_all_tables(&mut self) {
        self.tables.clear();
    }

    pub(crate) fn apply(&mut self, change: &SchemaChange) -> Result<(), String> {
        match change {
            SchemaChange::CreateTable {
                name,
                columns,
                primary_key,
            } => {
                if self.tables.contains_key(name) {
                    return Err(format!("table '{name}' already exists"));
                }
                let schema = TableSchema::try_new(columns.clone(), primary_key.clone())
                    .map_err(|err| format!("table '{name}': {err}"))?;
                self.tables.insert(name.clone(), Table::new(name, schema));
                Ok(())
            }
            SchemaChange::DropTable { name } => self
                .tables
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| format!("cannot drop unknown table '{name}'")),
            SchemaChange::AddColumn { table, column } => self
                .tables
                .get_mut(table)
                .ok_or_else(|| format!("cannot alter unknown table '{table}'"))?
                .add_column(column.clone()),
        }
    }
}

/// `DataAccess` handle bound to one group's store.
pub struct MemoryConnection {
    store: Shared<Store>,
}

impl MemoryConnection {
    pub(crate) fn new(store: Shared<Store>) -> Self {
        Self { store }
    }
}

impl DataAccess for MemoryConnection {
    fn count(&mut self, table: &str, criteria: &Criteria) -> DbResult<u64> {
        self.store.borrow().table(table)?.count(criteria)
    }

    fn fetch_one(
        &mut self,
        table: &str,
        columns: &[&str],
        criteria: &Criteria,
    ) -> DbResult<Option<RowMap>> {
        self.store.borrow().table(table)?.first(columns, criteria)
    }

    fn insert(&mut self, table: &str, data: &Criteria) -> DbResult<()> {
        self.store.borrow_mut().table_mut(table)?.insert(data)
    }

    fn delete(&mut self, table: &str, criteria: &Criteria) -> DbResult<u64> {
        self.store.borrow_mut().table_mut(table)?.delete(criteria)
    }
}
