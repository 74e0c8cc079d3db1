//! Execution engine using the Volcano iterator model.
//!
//! Each executor implements the Executor trait and owns its child, so a query
//! plan is a tree of boxed executors. The root is executed once, then rows are
//! pulled through the tree one at a time.

use common::{QueryError, Result, Row, SType, SValue, SVector, Schema};

pub mod filter;
pub mod limit;
pub mod order_by;
pub mod projection;
pub mod values_scan;

pub use filter::FilterExecutor;
pub use limit::LimitExecutor;
pub use order_by::{OrderByExecutor, SortExpr, SortOrder};
pub use projection::ProjectionExecutor;
pub use values_scan::ValuesScanExecutor;

/// The core executor trait for the Volcano iterator model.
///
/// Executors are pull-based: parents call `next()` on children to retrieve
/// rows. Errors from a child are returned unchanged.
pub trait Executor {
    /// Operator name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Returns the schema of rows produced by this executor.
    fn schema(&self) -> &Schema;

    fn column_count(&self) -> usize {
        self.schema().len()
    }

    fn column_type(&self, index: usize) -> Option<SType> {
        self.schema().column_type(index)
    }

    /// Prepares the executor. Called exactly once, before any `next` call.
    fn execute(&mut self) -> Result<()>;

    /// Writes the next row into `row` and returns `true`, or returns `false`
    /// once exhausted, leaving `row` untouched.
    ///
    /// At most `row.len()` columns are written.
    fn next(&mut self, row: &mut [SValue]) -> Result<bool>;

    /// Appends up to `limit` rows column-wise to `columns` and returns how
    /// many were appended. Zero means exhausted.
    fn next_batch(&mut self, _limit: usize, _columns: &mut [SVector]) -> Result<usize> {
        Err(QueryError::NotImplemented(format!(
            "{}::next_batch not yet implemented",
            self.name()
        )))
    }
}

/// A boxed executor for dynamic dispatch.
pub type BoxedExecutor = Box<dyn Executor>;

/// Moves `source` into `row`, writing at most `row.len()` columns.
pub(crate) fn write_row(row: &mut [SValue], source: Row) {
    for (slot, value) in row.iter_mut().zip(source) {
        *slot = value;
    }
}

/// Executes `executor` and drains it into a vector of rows.
pub fn collect_rows(executor: &mut dyn Executor) -> Result<Vec<Row>> {
    executor.execute()?;
    let mut rows = Vec::new();
    let mut row = executor.schema().empty_row();
    while executor.next(&mut row)? {
        rows.push(row.clone());
    }
    Ok(rows)
}
