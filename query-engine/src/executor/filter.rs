//! Filter executor for WHERE clauses.
//!
//! Applies a predicate to rows from a child executor, returning only matching rows.

use super::{BoxedExecutor, Executor};
use crate::expression::Expression;
use crate::transaction::Transaction;
use crate::vm::Evaluator;
use common::{QueryError, Result, Row, SType, SValue, Schema};
use std::sync::Arc;

/// Returns only rows for which the predicate evaluates to TRUE; FALSE and
/// NULL both drop the row.
pub struct FilterExecutor {
    child: BoxedExecutor,
    predicate: Expression,
    txn: Arc<Transaction>,
    evaluator: Evaluator,
    buffer: Row,
}

impl FilterExecutor {
    /// Binds `predicate` against the child's schema.
    pub fn new(child: BoxedExecutor, predicate: Expression, txn: Arc<Transaction>) -> Result<Self> {
        let predicate = predicate.bind(child.schema(), txn.registry())?;
        let predicate_type = predicate.return_type()?;
        if !matches!(predicate_type, SType::Bool | SType::Null) {
            return Err(QueryError::Type(format!(
                "filter predicate must be BOOL, got {}",
                predicate_type
            )));
        }

        let buffer = child.schema().empty_row();
        Ok(Self {
            child,
            predicate,
            txn,
            evaluator: Evaluator::new(),
            buffer,
        })
    }
}

impl Executor for FilterExecutor {
    fn name(&self) -> &'static str {
        "FilterExecutor"
    }

    fn schema(&self) -> &Schema {
        self.child.schema()
    }

    fn execute(&mut self) -> Result<()> {
        self.child.execute()
    }

    fn next(&mut self, row: &mut [SValue]) -> Result<bool> {
        while self.child.next(&mut self.buffer)? {
            if self
                .evaluator
                .evaluate_predicate(&self.txn, &self.predicate, &self.buffer)?
            {
                for (slot, value) in row.iter_mut().zip(&self.buffer) {
                    *slot = value.clone();
                }
                return Ok(true);
            }
        }
        Ok(false)
    }
}
