//! Comparison and logical functions.
//!
//! The comparison routines are also called directly by the sort operator on
//! values it has already popped.

use super::{register_builtin, register_function, FunctionRegistry, SFunction, SFunctionCall};
use crate::transaction::Transaction;
use crate::vm::VmStack;
use common::{QueryError, Result, SType, SValue};
use std::cmp::Ordering;

const COMPARABLE: [SType; 5] = [
    SType::Bool,
    SType::Int64,
    SType::Float64,
    SType::String,
    SType::Timestamp64,
];

pub fn eq(left: &SValue, right: &SValue) -> Result<bool> {
    Ok(left.compare(right)? == Ordering::Equal)
}

pub fn neq(left: &SValue, right: &SValue) -> Result<bool> {
    Ok(left.compare(right)? != Ordering::Equal)
}

pub fn lt(left: &SValue, right: &SValue) -> Result<bool> {
    Ok(left.compare(right)? == Ordering::Less)
}

pub fn lte(left: &SValue, right: &SValue) -> Result<bool> {
    Ok(left.compare(right)? != Ordering::Greater)
}

pub fn gt(left: &SValue, right: &SValue) -> Result<bool> {
    Ok(left.compare(right)? == Ordering::Greater)
}

pub fn gte(left: &SValue, right: &SValue) -> Result<bool> {
    Ok(left.compare(right)? != Ordering::Less)
}

fn compare_call(stack: &mut VmStack, op: fn(&SValue, &SValue) -> Result<bool>) -> Result<()> {
    let right = stack.pop_boxed()?;
    let left = stack.pop_boxed()?;
    stack.push_bool(op(&left, &right)?);
    Ok(())
}

fn eq_call(_txn: &Transaction, stack: &mut VmStack) -> Result<()> {
    compare_call(stack, eq)
}

fn neq_call(_txn: &Transaction, stack: &mut VmStack) -> Result<()> {
    compare_call(stack, neq)
}

fn lt_call(_txn: &Transaction, stack: &mut VmStack) -> Result<()> {
    compare_call(stack, lt)
}

fn lte_call(_txn: &Transaction, stack: &mut VmStack) -> Result<()> {
    compare_call(stack, lte)
}

fn gt_call(_txn: &Transaction, stack: &mut VmStack) -> Result<()> {
    compare_call(stack, gt)
}

fn gte_call(_txn: &Transaction, stack: &mut VmStack) -> Result<()> {
    compare_call(stack, gte)
}

// Logical operators follow SQL three-valued logic; `None` is NULL.
fn pop_logical(stack: &mut VmStack) -> Result<Option<bool>> {
    match stack.pop_boxed()? {
        SValue::Null => Ok(None),
        SValue::Bool(value) => Ok(Some(value)),
        other => Err(QueryError::Type(format!(
            "expected BOOL or NULL, got {} '{}'",
            other.get_type(),
            other
        ))),
    }
}

fn push_logical(stack: &mut VmStack, value: Option<bool>) {
    stack.push(value.map_or(SValue::Null, SValue::Bool));
}

pub fn and(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

pub fn or(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn and_call(_txn: &Transaction, stack: &mut VmStack) -> Result<()> {
    let right = pop_logical(stack)?;
    let left = pop_logical(stack)?;
    push_logical(stack, and(left, right));
    Ok(())
}

fn or_call(_txn: &Transaction, stack: &mut VmStack) -> Result<()> {
    let right = pop_logical(stack)?;
    let left = pop_logical(stack)?;
    push_logical(stack, or(left, right));
    Ok(())
}

fn not_call(_txn: &Transaction, stack: &mut VmStack) -> Result<()> {
    let value = pop_logical(stack)?;
    push_logical(stack, value.map(|v| !v));
    Ok(())
}

pub(crate) fn register(registry: &mut FunctionRegistry) {
    for stype in COMPARABLE {
        let params = [stype, stype];
        register_builtin(registry, "eq", &params, SType::Bool, eq_call);
        register_builtin(registry, "neq", &params, SType::Bool, neq_call);
        register_builtin(registry, "lt", &params, SType::Bool, lt_call);
        register_builtin(registry, "lte", &params, SType::Bool, lte_call);
        register_builtin(registry, "gt", &params, SType::Bool, gt_call);
        register_builtin(registry, "gte", &params, SType::Bool, gte_call);
    }

    let logical: [(&str, &[SType], SFunctionCall); 3] = [
        ("and", &[SType::Bool, SType::Bool], and_call),
        ("or", &[SType::Bool, SType::Bool], or_call),
        ("not", &[SType::Bool], not_call),
    ];
    for (name, params, call) in logical {
        register_function(
            registry,
            SFunction::new(name, params, SType::Bool, call).with_null_arguments(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expression;
    use std::sync::Arc;
    use test_case::test_case;

    #[test]
    fn test_comparisons() {
        let one = SValue::Int64(1);
        let two = SValue::Int64(2);

        assert!(eq(&one, &one).unwrap());
        assert!(neq(&one, &two).unwrap());
        assert!(lt(&one, &two).unwrap());
        assert!(lte(&one, &one).unwrap());
        assert!(gt(&two, &one).unwrap());
        assert!(gte(&two, &two).unwrap());
        assert!(!gt(&one, &one).unwrap());
        assert!(lt(&SValue::Null, &one).unwrap());
    }

    #[test]
    fn test_mixed_tags_are_a_type_error() {
        let err = lt(&SValue::Int64(1), &SValue::Bool(true)).unwrap_err();
        assert!(matches!(err, QueryError::Type(_)));
    }

    #[test]
    fn test_registered_comparison_through_stack() {
        let registry = Arc::new(FunctionRegistry::with_builtins());
        let txn = Transaction::new(Arc::clone(&registry));
        let function = registry
            .lookup("lt", &[SType::Timestamp64, SType::Timestamp64])
            .unwrap();

        let mut stack = VmStack::new();
        stack.push_timestamp64(10);
        stack.push_timestamp64(20);
        function.invoke(&txn, &mut stack).unwrap();

        assert!(stack.pop_bool().unwrap());
        assert!(stack.is_empty());
    }

    #[test]
    fn test_logical_functions() {
        let registry = Arc::new(FunctionRegistry::with_builtins());
        let txn = Transaction::new(Arc::clone(&registry));
        let mut stack = VmStack::new();

        stack.push_bool(true);
        stack.push_bool(false);
        registry
            .lookup("or", &[SType::Bool, SType::Bool])
            .unwrap()
            .invoke(&txn, &mut stack)
            .unwrap();
        registry
            .lookup("not", &[SType::Bool])
            .unwrap()
            .invoke(&txn, &mut stack)
            .unwrap();

        assert!(!stack.pop_bool().unwrap());
    }

    fn invoke_logical(name: &str, args: &[Option<bool>]) -> SValue {
        let registry = Arc::new(FunctionRegistry::with_builtins());
        let txn = Transaction::new(Arc::clone(&registry));
        let params = vec![SType::Bool; args.len()];
        let function = registry.lookup(name, &params).unwrap();

        let mut stack = VmStack::new();
        for arg in args {
            push_logical(&mut stack, *arg);
        }
        function.invoke(&txn, &mut stack).unwrap();
        assert_eq!(stack.len(), 1);
        stack.pop_boxed().unwrap()
    }

    fn logical(value: Option<bool>) -> SValue {
        value.map_or(SValue::Null, SValue::Bool)
    }

    #[test_case(Some(true), Some(true), Some(true) ; "true and true")]
    #[test_case(Some(true), Some(false), Some(false) ; "true and false")]
    #[test_case(Some(true), None, None ; "true and null")]
    #[test_case(Some(false), Some(true), Some(false) ; "false and true")]
    #[test_case(Some(false), Some(false), Some(false) ; "false and false")]
    #[test_case(Some(false), None, Some(false) ; "false and null")]
    #[test_case(None, Some(true), None ; "null and true")]
    #[test_case(None, Some(false), Some(false) ; "null and false")]
    #[test_case(None, None, None ; "null and null")]
    fn test_and_three_valued(left: Option<bool>, right: Option<bool>, expected: Option<bool>) {
        assert_eq!(and(left, right), expected);
        assert_eq!(invoke_logical("and", &[left, right]), logical(expected));
    }

    #[test_case(Some(true), Some(true), Some(true) ; "true or true")]
    #[test_case(Some(true), Some(false), Some(true) ; "true or false")]
    #[test_case(Some(true), None, Some(true) ; "true or null")]
    #[test_case(Some(false), Some(true), Some(true) ; "false or true")]
    #[test_case(Some(false), Some(false), Some(false) ; "false or false")]
    #[test_case(Some(false), None, None ; "false or null")]
    #[test_case(None, Some(true), Some(true) ; "null or true")]
    #[test_case(None, Some(false), None ; "null or false")]
    #[test_case(None, None, None ; "null or null")]
    fn test_or_three_valued(left: Option<bool>, right: Option<bool>, expected: Option<bool>) {
        assert_eq!(or(left, right), expected);
        assert_eq!(invoke_logical("or", &[left, right]), logical(expected));
    }

    #[test_case(Some(true), Some(false) ; "not true")]
    #[test_case(Some(false), Some(true) ; "not false")]
    #[test_case(None, None ; "not null")]
    fn test_not_three_valued(value: Option<bool>, expected: Option<bool>) {
        assert_eq!(invoke_logical("not", &[value]), logical(expected));
    }

    #[test]
    fn test_null_operand_reaches_logical_callback() {
        let registry = Arc::new(FunctionRegistry::with_builtins());
        let txn = Transaction::new(Arc::clone(&registry));
        let schema = common::Schema::new(vec![
            common::Column::new("done", SType::Bool),
            common::Column::new("flag", SType::Bool),
        ]);
        let expr = crate::expression::col("done")
            .or(crate::expression::col("flag"))
            .bind(&schema, &registry)
            .unwrap();

        let mut stack = VmStack::new();
        expr.evaluate(&txn, &mut stack, &[SValue::Bool(true), SValue::Null])
            .unwrap();
        assert_eq!(stack.pop_boxed().unwrap(), SValue::Bool(true));

        // comparisons stay strict
        let expr: Expression = crate::expression::col("done")
            .eq(crate::expression::col("flag"))
            .bind(&schema, &registry)
            .unwrap();
        expr.evaluate(&txn, &mut stack, &[SValue::Bool(true), SValue::Null])
            .unwrap();
        assert_eq!(stack.pop_boxed().unwrap(), SValue::Null);
    }

    #[test]
    fn test_logical_rejects_non_boolean() {
        let registry = Arc::new(FunctionRegistry::with_builtins());
        let txn = Transaction::new(Arc::clone(&registry));
        let function = registry.lookup("and", &[SType::Bool, SType::Bool]).unwrap();

        let mut stack = VmStack::new();
        stack.push_bool(true);
        stack.push_int64(1);
        let err = function.invoke(&txn, &mut stack).unwrap_err();
        assert!(matches!(err, QueryError::Type(_)));
    }
}
