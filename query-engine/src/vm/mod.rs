//! The value stack used to pass arguments into and results out of native
//! scalar functions.
//!
//! Expressions are evaluated post-order: children push their results, then the
//! parent function pops its declared arity (last argument on top) and pushes a
//! single result. Evaluating any well-formed subtree therefore grows the stack
//! by exactly one value.

use common::{QueryError, Result, SType, SValue};

mod evaluator;

pub use evaluator::Evaluator;

/// A LIFO stack of typed values.
#[derive(Debug, Default)]
pub struct VmStack {
    values: Vec<SValue>,
}

impl VmStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: SValue) {
        self.values.push(value);
    }

    /// Removes the top value, failing if its tag isn't `stype`.
    ///
    /// A mismatched value stays on the stack.
    pub fn pop(&mut self, stype: SType) -> Result<SValue> {
        match self.values.last() {
            None => Err(QueryError::Runtime(format!(
                "stack underflow: expected {} on top",
                stype
            ))),
            Some(top) if top.get_type() != stype => Err(QueryError::Type(format!(
                "expected {} on top of the stack, got {} '{}'",
                stype,
                top.get_type(),
                top
            ))),
            Some(_) => self.pop_boxed(),
        }
    }

    /// Removes the top value whatever its type.
    pub fn pop_boxed(&mut self) -> Result<SValue> {
        self.values
            .pop()
            .ok_or_else(|| QueryError::Runtime("stack underflow".to_string()))
    }

    /// Returns the value `depth` positions below the top (0 is the top).
    pub fn peek(&self, depth: usize) -> Option<&SValue> {
        self.values
            .len()
            .checked_sub(depth + 1)
            .and_then(|idx| self.values.get(idx))
    }

    /// Drops everything above `len`.
    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn pop_bool(&mut self) -> Result<bool> {
        match self.pop(SType::Bool)? {
            SValue::Bool(value) => Ok(value),
            other => Err(unexpected(SType::Bool, &other)),
        }
    }

    pub fn pop_int64(&mut self) -> Result<i64> {
        match self.pop(SType::Int64)? {
            SValue::Int64(value) => Ok(value),
            other => Err(unexpected(SType::Int64, &other)),
        }
    }

    pub fn pop_float64(&mut self) -> Result<f64> {
        match self.pop(SType::Float64)? {
            SValue::Float64(value) => Ok(value),
            other => Err(unexpected(SType::Float64, &other)),
        }
    }

    pub fn pop_string(&mut self) -> Result<String> {
        match self.pop(SType::String)? {
            SValue::String(value) => Ok(value),
            other => Err(unexpected(SType::String, &other)),
        }
    }

    pub fn pop_timestamp64(&mut self) -> Result<u64> {
        match self.pop(SType::Timestamp64)? {
            SValue::Timestamp64(value) => Ok(value),
            other => Err(unexpected(SType::Timestamp64, &other)),
        }
    }

    pub fn push_bool(&mut self, value: bool) {
        self.push(SValue::Bool(value));
    }

    pub fn push_int64(&mut self, value: i64) {
        self.push(SValue::Int64(value));
    }

    pub fn push_float64(&mut self, value: f64) {
        self.push(SValue::Float64(value));
    }

    pub fn push_string(&mut self, value: String) {
        self.push(SValue::String(value));
    }

    pub fn push_timestamp64(&mut self, value: u64) {
        self.push(SValue::Timestamp64(value));
    }
}

// pop() already checked the tag, so this is unreachable in practice.
fn unexpected(expected: SType, got: &SValue) -> QueryError {
    QueryError::Type(format!("expected {}, got {}", expected, got.get_type()))
}
