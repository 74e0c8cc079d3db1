//! Expression trees for predicates, projections and sort keys.
//!
//! Expressions are built unbound with the fluent helpers (`col("ts").lt(...)`,
//! `call("date_trunc", ...)`), then bound against a schema and a function
//! registry. Binding resolves column names to positions and function names to
//! the overload matching the argument types. Only bound expressions can be
//! evaluated.

use crate::function::{FunctionRegistry, SFunction};
use crate::transaction::Transaction;
use crate::vm::VmStack;
use common::{QueryError, Result, SType, SValue, Schema};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Expression {
    /// Reference to a column by name
    Column(String),
    /// Reference to a column by index (after binding)
    BoundColumn { index: usize, column_type: SType },
    /// Literal value
    Literal(SValue),
    /// Scalar function call by name
    Call { name: String, args: Vec<Expression> },
    /// Scalar function call resolved to an overload (after binding)
    BoundCall {
        function: Arc<SFunction>,
        args: Vec<Expression>,
    },
}

impl Expression {
    pub fn column(name: &str) -> Expression {
        Expression::Column(name.to_string())
    }

    /// Resolves column names against `schema` and function calls against
    /// `registry`.
    pub fn bind(&self, schema: &Schema, registry: &FunctionRegistry) -> Result<Expression> {
        match self {
            Expression::Column(name) => {
                let index = schema
                    .column_index(name)
                    .ok_or_else(|| QueryError::ColumnNotFound(name.clone()))?;
                let column_type = schema
                    .column_type(index)
                    .ok_or_else(|| QueryError::ColumnNotFound(name.clone()))?;
                Ok(Expression::BoundColumn { index, column_type })
            }
            Expression::BoundColumn { .. } | Expression::Literal(_) | Expression::BoundCall { .. } => {
                Ok(self.clone())
            }
            Expression::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.bind(schema, registry))
                    .collect::<Result<Vec<_>>>()?;
                let arg_types = args
                    .iter()
                    .map(Expression::return_type)
                    .collect::<Result<Vec<_>>>()?;
                let function = registry.lookup(name, &arg_types)?;
                Ok(Expression::BoundCall { function, args })
            }
        }
    }

    /// Static type of the value this expression produces.
    pub fn return_type(&self) -> Result<SType> {
        match self {
            Expression::BoundColumn { column_type, .. } => Ok(*column_type),
            Expression::Literal(value) => Ok(value.get_type()),
            Expression::BoundCall { function, .. } => Ok(function.return_type()),
            Expression::Column(name) => Err(unbound(name)),
            Expression::Call { name, .. } => Err(unbound(name)),
        }
    }

    /// Evaluates post-order, leaving exactly one value on `stack`.
    ///
    /// Functions are strict unless registered with
    /// [`SFunction::with_null_arguments`]: when any argument is NULL the
    /// callback is skipped and NULL is pushed in place of the arguments.
    pub fn evaluate(&self, txn: &Transaction, stack: &mut VmStack, row: &[SValue]) -> Result<()> {
        match self {
            Expression::BoundColumn { index, .. } => {
                let value = row.get(*index).ok_or_else(|| {
                    QueryError::Runtime(format!(
                        "column index {} out of bounds for row of {} values",
                        index,
                        row.len()
                    ))
                })?;
                stack.push(value.clone());
                Ok(())
            }
            Expression::Literal(value) => {
                stack.push(value.clone());
                Ok(())
            }
            Expression::BoundCall { function, args } => {
                let base = stack.len();
                for arg in args {
                    arg.evaluate(txn, stack, row)?;
                }

                let has_null = function.is_null_strict()
                    && (0..args.len())
                        .filter_map(|depth| stack.peek(depth))
                        .any(SValue::is_null);
                if has_null {
                    stack.truncate(base);
                    stack.push(SValue::Null);
                    return Ok(());
                }

                function.invoke(txn, stack)
            }
            Expression::Column(name) => Err(unbound(name)),
            Expression::Call { name, .. } => Err(unbound(name)),
        }
    }

    // ===== Builder Methods for Fluent API =====

    fn binary(self, name: &str, other: Expression) -> Expression {
        call(name, vec![self, other])
    }

    /// `self = other`
    pub fn eq(self, other: Expression) -> Expression {
        self.binary("eq", other)
    }

    /// `self != other`
    pub fn not_eq(self, other: Expression) -> Expression {
        self.binary("neq", other)
    }

    /// `self < other`
    pub fn lt(self, other: Expression) -> Expression {
        self.binary("lt", other)
    }

    /// `self <= other`
    pub fn lt_eq(self, other: Expression) -> Expression {
        self.binary("lte", other)
    }

    /// `self > other`
    pub fn gt(self, other: Expression) -> Expression {
        self.binary("gt", other)
    }

    /// `self >= other`
    pub fn gt_eq(self, other: Expression) -> Expression {
        self.binary("gte", other)
    }

    pub fn and(self, other: Expression) -> Expression {
        self.binary("and", other)
    }

    pub fn or(self, other: Expression) -> Expression {
        self.binary("or", other)
    }
}

fn unbound(name: &str) -> QueryError {
    QueryError::Runtime(format!("unbound expression {}: call bind() first", name))
}

// ===== Helper Functions for Building Expressions =====

/// Creates a column reference expression.
pub fn col(name: &str) -> Expression {
    Expression::column(name)
}

/// Creates a literal expression.
pub fn lit(value: impl Into<SValue>) -> Expression {
    Expression::Literal(value.into())
}

/// Creates a scalar function call expression.
pub fn call(name: &str, args: Vec<Expression>) -> Expression {
    Expression::Call {
        name: name.to_string(),
        args,
    }
}
