use super::VmStack;
use crate::expression::Expression;
use crate::transaction::Transaction;
use common::{QueryError, Result, SValue};

/// Owns a value stack and evaluates expressions against rows.
///
/// Every evaluation must leave exactly one value behind, which is popped and
/// returned. On failure the stack is cut back to where it started.
#[derive(Debug, Default)]
pub struct Evaluator {
    stack: VmStack,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(&mut self, txn: &Transaction, expr: &Expression, row: &[SValue]) -> Result<SValue> {
        let depth = self.stack.len();
        let result = expr
            .evaluate(txn, &mut self.stack, row)
            .and_then(|()| self.take_result(depth));

        if result.is_err() {
            self.stack.truncate(depth);
        }
        result
    }

    /// Evaluates a predicate. Only `true` passes; `false` and NULL don't.
    pub fn evaluate_predicate(&mut self, txn: &Transaction, expr: &Expression, row: &[SValue]) -> Result<bool> {
        match self.evaluate(txn, expr, row)? {
            SValue::Bool(value) => Ok(value),
            SValue::Null => Ok(false),
            other => Err(QueryError::Type(format!(
                "predicate must evaluate to BOOL, got {} '{}'",
                other.get_type(),
                other
            ))),
        }
    }

    /// Depth of the underlying stack; zero between evaluations.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn take_result(&mut self, depth: usize) -> Result<SValue> {
        if self.stack.len() != depth + 1 {
            return Err(QueryError::Runtime(format!(
                "expression left {} values on the stack, expected 1",
                self.stack.len() as i64 - depth as i64
            )));
        }
        self.stack.pop_boxed()
    }
}
