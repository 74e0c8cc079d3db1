//! Database struct - the main entry point for query execution.

use crate::catalog::{Catalog, TableInfo};
use crate::config::ExecutionConfig;
use crate::dataframe::DataFrame;
use crate::function::FunctionRegistry;
use crate::transaction::{HeartbeatCallback, Transaction};
use common::time::{Clock, SystemClock};
use common::{Result, Row, Schema};
use std::sync::Arc;

/// The main database interface.
///
/// Owns the in-memory catalog and the shared services every query
/// transaction is built from.
pub struct Database {
    catalog: Arc<Catalog>,
    registry: Arc<FunctionRegistry>,
    config: ExecutionConfig,
    clock: Arc<dyn Clock>,
    heartbeat: Option<HeartbeatCallback>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    /// An empty database with the builtin functions.
    pub fn new() -> Self {
        Self {
            catalog: Arc::new(Catalog::new()),
            registry: Arc::new(FunctionRegistry::with_builtins()),
            config: ExecutionConfig::default(),
            clock: Arc::new(SystemClock),
            heartbeat: None,
        }
    }

    pub fn with_registry(mut self, registry: Arc<FunctionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Installs a heartbeat polled by every query of this database.
    pub fn with_heartbeat(mut self, heartbeat: HeartbeatCallback) -> Self {
        self.heartbeat = Some(heartbeat);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    /// Starts a transaction for one query.
    pub fn transaction(&self) -> Arc<Transaction> {
        let txn = Transaction::new(Arc::clone(&self.registry))
            .with_config(self.config.clone())
            .with_clock(Arc::clone(&self.clock));
        Arc::new(match &self.heartbeat {
            Some(heartbeat) => txn.with_heartbeat(Arc::clone(heartbeat)),
            None => txn,
        })
    }

    /// Creates a new table in the database.
    pub fn create_table(&self, name: &str, schema: Schema) -> Result<Arc<TableInfo>> {
        self.catalog.create_table(name, schema)
    }

    /// Appends rows to a table.
    pub fn insert(&self, table: &str, rows: impl IntoIterator<Item = Row>) -> Result<()> {
        self.catalog.get_table(table)?.insert_all(rows)
    }

    /// Returns a DataFrame for querying the specified table.
    pub fn table(&self, name: &str) -> Result<DataFrame> {
        let table_info = self.catalog.get_table(name)?;
        Ok(DataFrame::new(table_info, self.transaction()))
    }

    /// Lists all tables in the database, sorted.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        self.catalog.list_tables()
    }

    pub fn drop_table(&self, name: &str) -> Result<()> {
        self.catalog.drop_table(name)
    }
}
