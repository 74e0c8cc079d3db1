//! Leaf scan over in-memory rows.

use super::{write_row, Executor};
use crate::catalog::TableInfo;
use common::{QueryError, Result, Row, SValue, SVector, Schema};
use std::vec;
use tracing::debug;

/// Streams a fixed set of rows in insertion order.
pub struct ValuesScanExecutor {
    schema: Schema,
    pending: Option<Vec<Row>>,
    rows: Option<vec::IntoIter<Row>>,
}

impl ValuesScanExecutor {
    pub fn new(schema: Schema, rows: Vec<Row>) -> Self {
        Self {
            schema,
            pending: Some(rows),
            rows: None,
        }
    }

    /// Scans a snapshot of `table` taken now.
    pub fn scan(table: &TableInfo) -> Result<Self> {
        Ok(Self::new(table.schema.clone(), table.snapshot()?))
    }

    fn rows(&mut self) -> Result<&mut vec::IntoIter<Row>> {
        self.rows.as_mut().ok_or_else(|| {
            QueryError::Runtime("ValuesScanExecutor: next called before execute".to_string())
        })
    }
}

impl Executor for ValuesScanExecutor {
    fn name(&self) -> &'static str {
        "ValuesScanExecutor"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn execute(&mut self) -> Result<()> {
        let rows = self.pending.take().ok_or_else(|| {
            QueryError::Runtime("ValuesScanExecutor: execute called twice".to_string())
        })?;
        debug!(rows = rows.len(), "scanning values");
        self.rows = Some(rows.into_iter());
        Ok(())
    }

    fn next(&mut self, row: &mut [SValue]) -> Result<bool> {
        match self.rows()?.next() {
            Some(source) => {
                write_row(row, source);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn next_batch(&mut self, limit: usize, columns: &mut [SVector]) -> Result<usize> {
        let rows = self.rows()?;
        let mut appended = 0;
        while appended < limit {
            let Some(source) = rows.next() else {
                break;
            };
            for (column, value) in columns.iter_mut().zip(source) {
                column.push(value);
            }
            appended += 1;
        }
        Ok(appended)
    }
}
