//! ORDER BY executor.
//!
//! Materializes its whole input, sorts it with a composite comparator built
//! from the sort keys, then streams the sorted rows. The transaction
//! heartbeat is polled every `heartbeat_interval` comparisons so a long sort
//! can still be cancelled.

use super::{write_row, BoxedExecutor, Executor};
use crate::context::ExecutionContext;
use crate::expression::Expression;
use crate::function::boolean;
use crate::transaction::Transaction;
use crate::vm::Evaluator;
use common::{QueryError, Result, Row, SValue, SVector, Schema};
use std::sync::Arc;
use std::vec;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// One sort key.
#[derive(Debug, Clone)]
pub struct SortExpr {
    pub expr: Expression,
    pub order: SortOrder,
}

impl SortExpr {
    pub fn asc(expr: Expression) -> Self {
        Self {
            expr,
            order: SortOrder::Ascending,
        }
    }

    pub fn desc(expr: Expression) -> Self {
        Self {
            expr,
            order: SortOrder::Descending,
        }
    }

    pub fn is_descending(&self) -> bool {
        self.order == SortOrder::Descending
    }
}

/// Lifecycle of an [`OrderByExecutor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortState {
    Constructed,
    /// Materializing and sorting. An executor whose `execute` failed stays here.
    Executing,
    Sorted,
    Streaming,
    Exhausted,
}

pub struct OrderByExecutor {
    input: BoxedExecutor,
    sort_specs: Vec<SortExpr>,
    txn: Arc<Transaction>,
    context: Arc<ExecutionContext>,
    evaluator: Evaluator,
    state: SortState,
    rows: vec::IntoIter<Row>,
    comparisons: u64,
}

impl OrderByExecutor {
    /// Binds the sort keys against the input schema and registers one task
    /// with `context`.
    pub fn new(
        input: BoxedExecutor,
        sort_specs: Vec<SortExpr>,
        txn: Arc<Transaction>,
        context: Arc<ExecutionContext>,
    ) -> Result<Self> {
        if sort_specs.is_empty() {
            return Err(QueryError::IllegalArgument(
                "can't execute ORDER BY: no sort specs".to_string(),
            ));
        }

        let sort_specs = sort_specs
            .into_iter()
            .map(|spec| {
                Ok(SortExpr {
                    expr: spec.expr.bind(input.schema(), txn.registry())?,
                    order: spec.order,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        context.increment_num_tasks();

        Ok(Self {
            input,
            sort_specs,
            txn,
            context,
            evaluator: Evaluator::new(),
            state: SortState::Constructed,
            rows: Vec::new().into_iter(),
            comparisons: 0,
        })
    }

    pub fn state(&self) -> SortState {
        self.state
    }

    /// Pairwise comparisons performed by the sort so far.
    pub fn comparisons(&self) -> u64 {
        self.comparisons
    }

    /// Rows still waiting to be streamed.
    pub fn buffered_rows(&self) -> usize {
        self.rows.len()
    }

    fn sort(&mut self, rows: Vec<Row>) -> Result<Vec<Row>> {
        let txn: &Transaction = &self.txn;
        let sort_specs = &self.sort_specs;
        let evaluator = &mut self.evaluator;
        let comparisons = &mut self.comparisons;
        let interval = txn.config().heartbeat_interval.max(1);

        let mut less = |left: &Row, right: &Row| -> Result<bool> {
            *comparisons += 1;
            if *comparisons % interval == 0 {
                if let Err(err) = txn.trigger_heartbeat() {
                    warn!(%err, comparisons = *comparisons, "heartbeat failed, aborting ORDER BY");
                    return Err(err);
                }
            }

            for spec in sort_specs {
                let l = evaluator.evaluate(txn, &spec.expr, left)?;
                let r = evaluator.evaluate(txn, &spec.expr, right)?;

                if boolean::eq(&l, &r)? {
                    continue;
                }

                return match spec.order {
                    SortOrder::Ascending => boolean::lt(&l, &r),
                    SortOrder::Descending => boolean::gt(&l, &r),
                };
            }

            // all keys equal
            Ok(false)
        };

        merge_sort(rows, &mut less)
    }

    fn finish(&mut self) {
        self.context.increment_num_tasks_completed();
        self.rows = Vec::new().into_iter();
        self.state = SortState::Exhausted;
        debug!(comparisons = self.comparisons, "ORDER BY exhausted");
    }
}

impl Executor for OrderByExecutor {
    fn name(&self) -> &'static str {
        "OrderByExecutor"
    }

    fn schema(&self) -> &Schema {
        self.input.schema()
    }

    fn execute(&mut self) -> Result<()> {
        if self.state != SortState::Constructed {
            return Err(QueryError::Runtime(
                "OrderByExecutor: execute called twice".to_string(),
            ));
        }
        self.state = SortState::Executing;

        self.input.execute()?;
        self.context.increment_num_tasks_running();

        let mut row = self.input.schema().empty_row();
        let mut rows = Vec::new();
        while self.input.next(&mut row)? {
            rows.push(row.clone());
        }
        debug!(rows = rows.len(), keys = self.sort_specs.len(), "sorting");

        let sorted = self.sort(rows)?;
        self.rows = sorted.into_iter();
        self.state = SortState::Sorted;

        if self.rows.as_slice().is_empty() {
            self.finish();
        }
        Ok(())
    }

    fn next(&mut self, row: &mut [SValue]) -> Result<bool> {
        match self.state {
            SortState::Constructed | SortState::Executing => Err(QueryError::Runtime(
                "OrderByExecutor: next called before a successful execute".to_string(),
            )),
            SortState::Exhausted => Ok(false),
            SortState::Sorted | SortState::Streaming => {
                let Some(source) = self.rows.next() else {
                    self.finish();
                    return Ok(false);
                };
                write_row(row, source);
                self.state = SortState::Streaming;

                if self.rows.as_slice().is_empty() {
                    self.finish();
                }
                Ok(true)
            }
        }
    }

    fn next_batch(&mut self, _limit: usize, _columns: &mut [SVector]) -> Result<usize> {
        Err(QueryError::NotImplemented(
            "OrderByExecutor::next_batch not yet implemented".to_string(),
        ))
    }
}

/// Stable merge sort with a fallible comparator. The first comparator error
/// aborts the sort.
fn merge_sort<T, F>(mut items: Vec<T>, less: &mut F) -> Result<Vec<T>>
where
    F: FnMut(&T, &T) -> Result<bool>,
{
    if items.len() <= 1 {
        return Ok(items);
    }

    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, less)?;
    let right = merge_sort(right, less)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => less(r, l)?,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    Ok(merged)
}
