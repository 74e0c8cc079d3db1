//! Limit executor for LIMIT / OFFSET clauses.

use super::{BoxedExecutor, Executor};
use common::{Result, Row, SValue, Schema};

/// Skips the first `offset` rows, then returns at most `limit` rows.
pub struct LimitExecutor {
    child: BoxedExecutor,
    limit: usize,
    offset: usize,
    skipped: usize,
    count: usize,
    scratch: Row,
}

impl LimitExecutor {
    pub fn new(child: BoxedExecutor, limit: usize) -> Self {
        Self::with_offset(child, limit, 0)
    }

    pub fn with_offset(child: BoxedExecutor, limit: usize, offset: usize) -> Self {
        let scratch = child.schema().empty_row();
        Self {
            child,
            limit,
            offset,
            skipped: 0,
            count: 0,
            scratch,
        }
    }
}

impl Executor for LimitExecutor {
    fn name(&self) -> &'static str {
        "LimitExecutor"
    }

    fn schema(&self) -> &Schema {
        self.child.schema()
    }

    fn execute(&mut self) -> Result<()> {
        self.skipped = 0;
        self.count = 0;
        self.child.execute()
    }

    fn next(&mut self, row: &mut [SValue]) -> Result<bool> {
        if self.count >= self.limit {
            return Ok(false);
        }

        while self.skipped < self.offset {
            if !self.child.next(&mut self.scratch)? {
                return Ok(false);
            }
            self.skipped += 1;
        }

        if self.child.next(row)? {
            self.count += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
