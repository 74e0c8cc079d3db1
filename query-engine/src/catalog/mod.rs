//! Catalog for storing and managing in-memory tables.
//!
//! Each table keeps its schema and its rows; scans take a snapshot of the rows
//! so queries never hold a table lock while they run.

use common::{QueryError, Result, Row, SType, Schema};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

fn read_lock<'a, T>(lock: &'a RwLock<T>, what: &str) -> Result<RwLockReadGuard<'a, T>> {
    lock.read()
        .map_err(|_| QueryError::Runtime(format!("{} lock poisoned", what)))
}

fn write_lock<'a, T>(lock: &'a RwLock<T>, what: &str) -> Result<RwLockWriteGuard<'a, T>> {
    lock.write()
        .map_err(|_| QueryError::Runtime(format!("{} lock poisoned", what)))
}

/// A table in the database.
#[derive(Debug)]
pub struct TableInfo {
    pub table_id: u32,
    pub name: String,
    pub schema: Schema,
    rows: RwLock<Vec<Row>>,
}

impl TableInfo {
    pub fn new(table_id: u32, name: String, schema: Schema) -> Self {
        Self {
            table_id,
            name,
            schema,
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Appends a row after checking it against the schema. NULL is accepted
    /// in any column.
    pub fn insert(&self, row: Row) -> Result<()> {
        self.validate(&row)?;
        write_lock(&self.rows, "table")?.push(row);
        Ok(())
    }

    /// Appends all rows or none: every row is checked before any is stored.
    pub fn insert_all(&self, rows: impl IntoIterator<Item = Row>) -> Result<()> {
        let rows: Vec<Row> = rows.into_iter().collect();
        for row in &rows {
            self.validate(row)?;
        }
        write_lock(&self.rows, "table")?.extend(rows);
        Ok(())
    }

    fn validate(&self, row: &Row) -> Result<()> {
        if row.len() != self.schema.len() {
            return Err(QueryError::IllegalArgument(format!(
                "table '{}' has {} columns, row has {}",
                self.name,
                self.schema.len(),
                row.len()
            )));
        }

        for (value, column) in row.iter().zip(&self.schema.columns) {
            let stype = value.get_type();
            if stype != SType::Null && stype != column.column_type {
                return Err(QueryError::Type(format!(
                    "column '{}' of table '{}' is {}, got {} '{}'",
                    column.name, self.name, column.column_type, stype, value
                )));
            }
        }
        Ok(())
    }

    /// A copy of the current rows in insertion order.
    pub fn snapshot(&self) -> Result<Vec<Row>> {
        Ok(read_lock(&self.rows, "table")?.clone())
    }

    pub fn row_count(&self) -> Result<usize> {
        Ok(read_lock(&self.rows, "table")?.len())
    }
}

/// The database catalog.
///
/// Uses RwLock for concurrent reads (queries) and exclusive writes (DDL).
#[derive(Debug)]
pub struct Catalog {
    tables: RwLock<HashMap<String, Arc<TableInfo>>>,
    next_table_id: RwLock<u32>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            next_table_id: RwLock::new(1),
        }
    }

    pub fn create_table(&self, name: &str, schema: Schema) -> Result<Arc<TableInfo>> {
        let mut tables = write_lock(&self.tables, "catalog")?;

        if tables.contains_key(name) {
            return Err(QueryError::IllegalArgument(format!(
                "table '{}' already exists",
                name
            )));
        }

        let mut next_id = write_lock(&self.next_table_id, "catalog")?;
        let table_id = *next_id;
        *next_id += 1;
        drop(next_id);

        let table_info = Arc::new(TableInfo::new(table_id, name.to_string(), schema));
        tables.insert(name.to_string(), Arc::clone(&table_info));
        debug!(table = name, table_id, "created table");

        Ok(table_info)
    }

    pub fn get_table(&self, name: &str) -> Result<Arc<TableInfo>> {
        read_lock(&self.tables, "catalog")?
            .get(name)
            .cloned()
            .ok_or_else(|| QueryError::TableNotFound(name.to_string()))
    }

    /// Table names, sorted.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = read_lock(&self.tables, "catalog")?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    pub fn drop_table(&self, name: &str) -> Result<()> {
        write_lock(&self.tables, "catalog")?
            .remove(name)
            .ok_or_else(|| QueryError::TableNotFound(name.to_string()))?;
        debug!(table = name, "dropped table");
        Ok(())
    }
}
