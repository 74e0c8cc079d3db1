//! Projection executor for SELECT column lists.
//!
//! Evaluates expressions and produces output rows with only the projected columns.

use super::{BoxedExecutor, Executor};
use crate::expression::Expression;
use crate::transaction::Transaction;
use crate::vm::Evaluator;
use common::{Column, QueryError, Result, Row, SValue, Schema};
use std::sync::Arc;

pub struct ProjectionExecutor {
    child: BoxedExecutor,
    projections: Vec<Expression>,
    output_schema: Schema,
    txn: Arc<Transaction>,
    evaluator: Evaluator,
    buffer: Row,
    // Output is built here and copied out only once every column succeeded.
    output: Row,
}

impl ProjectionExecutor {
    /// Creates a new projection executor.
    ///
    /// # Arguments
    /// * `child` - The child executor to pull rows from
    /// * `projections` - Expressions to evaluate for each output column,
    ///   bound here against the child's schema
    /// * `output_column_names` - Names for the output columns
    pub fn new(
        child: BoxedExecutor,
        projections: Vec<Expression>,
        output_column_names: Vec<String>,
        txn: Arc<Transaction>,
    ) -> Result<Self> {
        if projections.len() != output_column_names.len() {
            return Err(QueryError::IllegalArgument(format!(
                "{} projections but {} column names",
                projections.len(),
                output_column_names.len()
            )));
        }

        let projections = projections
            .iter()
            .map(|expr| expr.bind(child.schema(), txn.registry()))
            .collect::<Result<Vec<_>>>()?;

        let columns = projections
            .iter()
            .zip(output_column_names)
            .map(|(expr, name)| Ok(Column::new(name, expr.return_type()?)))
            .collect::<Result<Vec<_>>>()?;

        let buffer = child.schema().empty_row();
        let output = vec![SValue::Null; projections.len()];
        Ok(Self {
            child,
            projections,
            output_schema: Schema::new(columns),
            txn,
            evaluator: Evaluator::new(),
            buffer,
            output,
        })
    }
}

impl Executor for ProjectionExecutor {
    fn name(&self) -> &'static str {
        "ProjectionExecutor"
    }

    fn schema(&self) -> &Schema {
        &self.output_schema
    }

    fn execute(&mut self) -> Result<()> {
        self.child.execute()
    }

    fn next(&mut self, row: &mut [SValue]) -> Result<bool> {
        if !self.child.next(&mut self.buffer)? {
            return Ok(false);
        }

        for (slot, expr) in self.output.iter_mut().zip(&self.projections) {
            *slot = self.evaluator.evaluate(&self.txn, expr, &self.buffer)?;
        }
        for (slot, value) in row.iter_mut().zip(&self.output) {
            *slot = value.clone();
        }
        Ok(true)
    }
}
