//! Table layouts and row storage for the in-memory backend.

use crate::Map;
use common::{Criteria, DbError, DbResult, RowMap};
use types::{SqlType, Value};

/// Describes a logical column within a table schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: SqlType,
    pub nullable: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: SqlType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Column layout for a table, along with its primary key.
#[derive(Clone, Debug)]
pub struct TableSchema {
    columns: Vec<ColumnDef>,
    name_to_ordinal: Map<String, usize>,
    primary_key: Vec<String>,
}

impl TableSchema {
    pub fn try_new(columns: Vec<ColumnDef>, primary_key: Vec<String>) -> Result<Self, String> {
        if columns.is_empty() {
            return Err("table must contain at least one column".into());
        }
        let mut name_to_ordinal = Map::default();
        for (idx, column) in columns.iter().enumerate() {
            if name_to_ordinal.insert(column.name.clone(), idx).is_some() {
                return Err(format!("duplicate column '{}'", column.name));
            }
        }
        for key in &primary_key {
            if !name_to_ordinal.contains_key(key) {
                return Err(format!("primary key column '{key}' is not a column"));
            }
        }
        Ok(Self {
            columns,
            name_to_ordinal,
            primary_key,
        })
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.name_to_ordinal.get(name).map(|&idx| &self.columns[idx])
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    fn push_column(&mut self, column: ColumnDef) -> Result<(), String> {
        if self.name_to_ordinal.contains_key(&column.name) {
            return Err(format!("duplicate column '{}'", column.name));
        }
        self.name_to_ordinal
            .insert(column.name.clone(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }
}

/// A table and its rows, kept in insertion order.
#[derive(Clone, Debug)]
pub struct Table {
    pub name: String,
    pub schema: TableSchema,
    rows: Vec<RowMap>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: TableSchema) -> Self {
        Self {
            name: name.into(),
            schema,
            rows: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[RowMap] {
        &self.rows
    }

    pub fn count(&self, criteria: &Criteria) -> DbResult<u64> {
        self.check_columns(criteria.columns())?;
        Ok(self.rows.iter().filter(|row| criteria.matches(row)).count() as u64)
    }

    pub fn first(&self, columns: &[&str], criteria: &Criteria) -> DbResult<Option<RowMap>> {
        self.check_columns(columns.iter().copied())?;
        self.check_columns(criteria.columns())?;
        Ok(self
            .rows
            .iter()
            .find(|row| criteria.matches(row))
            .map(|row| {
                columns
                    .iter()
                    .map(|&name| {
                        let value = row.get(name).cloned().unwrap_or(Value::Null);
                        (name.to_string(), value)
                    })
                    .collect()
            }))
    }

    pub fn insert(&mut self, data: &Criteria) -> DbResult<()> {
        self.check_columns(data.columns())?;

        let mut row = RowMap::new();
        for column in self.schema.columns() {
            let value = data.get(&column.name).cloned().unwrap_or(Value::Null);
            match value.sql_type() {
                None if !column.nullable => {
                    return Err(DbError::DataAccess(format!(
                        "constraint violation: column '{}' on '{}' is NOT NULL",
                        column.name, self.name
                    )));
                }
                Some(ty) if ty != column.ty => {
                    return Err(DbError::DataAccess(format!(
                        "type mismatch for column '{}' on '{}': expected {}, got {}",
                        column.name, self.name, column.ty, ty
                    )));
                }
                _ => {}
            }
            row.insert(column.name.clone(), value);
        }

        if !self.schema.primary_key().is_empty() {
            let key: Criteria = self
                .schema
                .primary_key()
                .iter()
                .map(|name| (name.clone(), row[name].clone()))
                .collect();
            if self.rows.iter().any(|existing| key.matches(existing)) {
                return Err(DbError::DataAccess(format!(
                    "constraint violation: duplicate primary key ({key}) on '{}'",
                    self.name
                )));
            }
        }

        self.rows.push(row);
        Ok(())
    }

    pub fn delete(&mut self, criteria: &Criteria) -> DbResult<u64> {
        self.check_columns(criteria.columns())?;
        let before = self.rows.len();
        self.rows.retain(|row| !criteria.matches(row));
        Ok((before - self.rows.len()) as u64)
    }

    /// Adds a column, back-filling existing rows with NULL.
    pub(crate) fn add_column(&mut self, column: ColumnDef) -> Result<(), String> {
        if !column.nullable && !self.rows.is_empty() {
            return Err(format!(
                "cannot add NOT NULL column '{}' to non-empty table '{}'",
                column.name, self.name
            ));
        }
        let name = column.name.clone();
        self.schema.push_column(column)?;
        for row in &mut self.rows {
            row.insert(name.clone(), Value::Null);
        }
        Ok(())
    }

    fn check_columns<'a>(&self, mut columns: impl Iterator<Item = &'a str>) -> DbResult<()> {
        match columns.find(|name| self.schema.column(name).is_none()) {
            Some(unknown) => Err(DbError::DataAccess(format!(
                "unknown column '{unknown}' on table '{}'",
                self.name
            ))),
            None => Ok(()),
        }
    }
}
