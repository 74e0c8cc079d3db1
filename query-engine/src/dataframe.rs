//! DataFrame API for building queries programmatically.
//!
//! Provides a fluent, method-chaining interface inspired by Polars and DataFusion.

use crate::catalog::TableInfo;
use crate::context::{ExecutionContext, ExecutionProgress};
use crate::executor::{
    BoxedExecutor, Executor, FilterExecutor, LimitExecutor, OrderByExecutor, ProjectionExecutor,
    SortExpr, ValuesScanExecutor,
};
use crate::expression::{col, Expression};
use crate::transaction::Transaction;
use common::{Result, Row, SValue};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Rows produced by [`DataFrame::collect`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Counters of the executed plan, read after the last row.
    pub progress: ExecutionProgress,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of the column called `name`, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&SValue>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().filter_map(|row| row.get(index)).collect())
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.columns.join(" | "))?;
        for row in &self.rows {
            let values: Vec<String> = row.iter().map(SValue::to_string).collect();
            writeln!(f, "{}", values.join(" | "))?;
        }
        write!(f, "({} rows)", self.rows.len())
    }
}

/// A lazy query builder that produces an execution plan.
///
/// Methods can be chained to build complex queries:
/// ```no_run
/// # use query_engine::{col, lit, Database, SortExpr};
/// # let db = Database::new();
/// let result = db.table("users")?
///     .filter(col("age").gt(lit(25)))
///     .order_by(vec![SortExpr::desc(col("age"))])
///     .select(&["name", "email"])
///     .limit(10)
///     .collect()?;
/// # Ok::<(), query_engine::QueryError>(())
/// ```
///
/// The plan is always scan, filter, order-by, projection, then limit.
pub struct DataFrame {
    table_info: Arc<TableInfo>,
    txn: Arc<Transaction>,
    filter_expr: Option<Expression>,
    sort_specs: Option<Vec<SortExpr>>,
    projection_exprs: Option<Vec<(Expression, String)>>, // (expr, output_name)
    limit: Option<usize>,
    offset: usize,
}

impl DataFrame {
    pub(crate) fn new(table_info: Arc<TableInfo>, txn: Arc<Transaction>) -> Self {
        Self {
            table_info,
            txn,
            filter_expr: None,
            sort_specs: None,
            projection_exprs: None,
            limit: None,
            offset: 0,
        }
    }

    /// Adds a filter (WHERE clause) to the query.
    pub fn filter(mut self, predicate: Expression) -> Self {
        self.filter_expr = Some(predicate);
        self
    }

    /// Sorts the rows (ORDER BY clause). Keys may use any input column,
    /// projected or not.
    pub fn order_by(mut self, sort_specs: Vec<SortExpr>) -> Self {
        self.sort_specs = Some(sort_specs);
        self
    }

    /// Projects specific columns (SELECT clause).
    ///
    /// # Example
    /// ```no_run
    /// # let df = query_engine::Database::new().table("users").unwrap();
    /// df.select(&["name", "email"]);
    /// ```
    pub fn select(mut self, columns: &[&str]) -> Self {
        let exprs = columns
            .iter()
            .map(|col_name| (col(col_name), col_name.to_string()))
            .collect();
        self.projection_exprs = Some(exprs);
        self
    }

    /// Projects with custom expressions.
    ///
    /// # Example
    /// ```no_run
    /// # use query_engine::{call, col, lit};
    /// # let df = query_engine::Database::new().table("events").unwrap();
    /// df.select_exprs(&[
    ///     (col("name"), "name"),
    ///     (call("date_trunc", vec![lit("1h"), col("ts")]), "hour"),
    /// ]);
    /// ```
    pub fn select_exprs(mut self, exprs: &[(Expression, &str)]) -> Self {
        let exprs = exprs
            .iter()
            .map(|(expr, name)| (expr.clone(), name.to_string()))
            .collect();
        self.projection_exprs = Some(exprs);
        self
    }

    /// Limits the number of results (LIMIT clause).
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Skips the first `n` results (OFFSET clause).
    pub fn offset(mut self, n: usize) -> Self {
        self.offset = n;
        self
    }

    /// Inserts a row into the table.
    pub fn insert(&self, row: Row) -> Result<()> {
        self.table_info.insert(row)
    }

    /// Builds the executor tree and executes the query, collecting all results.
    ///
    /// This is the terminal operation that actually runs the query.
    pub fn collect(self) -> Result<QueryResult> {
        let context = Arc::new(ExecutionContext::new());
        let mut executor = self.build_executor(&context)?;
        debug!(table = %self.table_info.name, root = executor.name(), "executing query");

        executor.execute()?;

        let columns = executor.schema().column_names();
        let mut rows = Vec::new();
        let mut row = executor.schema().empty_row();
        while executor.next(&mut row)? {
            rows.push(row.clone());
        }

        Ok(QueryResult {
            columns,
            rows,
            progress: context.progress(),
        })
    }

    /// Builds the executor tree for this DataFrame.
    fn build_executor(&self, context: &Arc<ExecutionContext>) -> Result<BoxedExecutor> {
        let mut executor: BoxedExecutor = Box::new(ValuesScanExecutor::scan(&self.table_info)?);

        if let Some(ref filter_expr) = self.filter_expr {
            executor = Box::new(FilterExecutor::new(
                executor,
                filter_expr.clone(),
                Arc::clone(&self.txn),
            )?);
        }

        if let Some(ref sort_specs) = self.sort_specs {
            executor = Box::new(OrderByExecutor::new(
                executor,
                sort_specs.clone(),
                Arc::clone(&self.txn),
                Arc::clone(context),
            )?);
        }

        if let Some(ref proj_exprs) = self.projection_exprs {
            let (exprs, names): (Vec<_>, Vec<_>) = proj_exprs.iter().cloned().unzip();
            executor = Box::new(ProjectionExecutor::new(
                executor,
                exprs,
                names,
                Arc::clone(&self.txn),
            )?);
        }

        if self.limit.is_some() || self.offset > 0 {
            executor = Box::new(LimitExecutor::with_offset(
                executor,
                self.limit.unwrap_or(usize::MAX),
                self.offset,
            ));
        }

        Ok(executor)
    }

    /// Executes the query and prints results (for debugging/demo).
    pub fn show(self) -> Result<()> {
        println!("{}", self.collect()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::expression::{col, lit};
    use crate::{Database, SortExpr};
    use common::{Column, SType, SValue, Schema};

    fn db_with_users() -> Database {
        let db = Database::new();
        let schema = Schema::new(vec![
            Column::new("id", SType::Int64),
            Column::new("age", SType::Int64),
        ]);
        let users = db.create_table("users", schema).unwrap();
        users
            .insert_all(vec![
                vec![SValue::Int64(1), SValue::Int64(25)],
                vec![SValue::Int64(2), SValue::Int64(30)],
                vec![SValue::Int64(3), SValue::Int64(20)],
            ])
            .unwrap();
        db
    }

    #[test]
    fn test_dataframe_insert_and_collect() {
        let db = db_with_users();
        db.table("users")
            .unwrap()
            .insert(vec![SValue::Int64(4), SValue::Int64(41)])
            .unwrap();

        // SELECT * FROM users WHERE age > 22
        let result = db
            .table("users")
            .unwrap()
            .filter(col("age").gt(lit(22)))
            .collect()
            .unwrap();

        assert_eq!(result.columns, vec!["id", "age"]);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_dataframe_order_select_limit() {
        let db = db_with_users();

        // SELECT id FROM users ORDER BY age DESC LIMIT 2
        let result = db
            .table("users")
            .unwrap()
            .order_by(vec![SortExpr::desc(col("age"))])
            .select(&["id"])
            .limit(2)
            .collect()
            .unwrap();

        assert_eq!(result.columns, vec!["id"]);
        assert_eq!(result.rows, vec![vec![SValue::Int64(2)], vec![SValue::Int64(1)]]);
        assert_eq!(result.progress.registered, 1);
        assert_eq!(result.progress.running, 1);
    }

    #[test]
    fn test_dataframe_offset() {
        let db = db_with_users();
        let result = db
            .table("users")
            .unwrap()
            .order_by(vec![SortExpr::asc(col("age"))])
            .offset(1)
            .collect()
            .unwrap();

        assert_eq!(
            result.column("id").unwrap(),
            vec![&SValue::Int64(1), &SValue::Int64(2)]
        );
        assert_eq!(result.progress.completed, 1);
    }
}
