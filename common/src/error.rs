//! Error taxonomy shared by every stage of query execution.

use thiserror::Error;

/// A specialized error type for query execution.
///
/// Every variant carries a human readable message that names the offending
/// input (window string, unit, literal text, column name ...) so a failing
/// query is diagnosable from the message alone.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// A value had a different type than required, e.g. a stack pop with the
    /// wrong tag or text that can't be converted to a timestamp.
    #[error("type error: {0}")]
    Type(String),

    /// Malformed interval, unit or composite duration text.
    #[error("parse error: {0}")]
    Parse(String),

    /// Runtime or domain failure during evaluation.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// A contract violation detected while constructing an operator.
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// The operation exists in the interface but this operator doesn't
    /// support it.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// The heartbeat reported cancellation or a deadline.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Column not found in schema
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// Table not found in catalog
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// No registered function matches the call signature
    #[error("function not found: {0}")]
    FunctionNotFound(String),
}

impl QueryError {
    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            QueryError::Type(msg)
            | QueryError::Parse(msg)
            | QueryError::Runtime(msg)
            | QueryError::IllegalArgument(msg)
            | QueryError::NotImplemented(msg)
            | QueryError::Cancelled(msg)
            | QueryError::ColumnNotFound(msg)
            | QueryError::TableNotFound(msg)
            | QueryError::FunctionNotFound(msg) => msg,
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_literal() {
        let err = QueryError::Parse("unknown time window 5parsecs".to_string());
        assert_eq!(err.to_string(), "parse error: unknown time window 5parsecs");
        assert_eq!(err.message(), "unknown time window 5parsecs");
    }
}
