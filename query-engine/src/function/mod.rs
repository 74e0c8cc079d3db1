//! Scalar function descriptors and the registry that resolves them by name.
//!
//! A descriptor has a fixed parameter list, a return type and a native
//! callback that talks to the caller only through the value stack. The
//! calling convention is checked in [`SFunction::invoke`], at the call site,
//! so a misbehaving callback can't corrupt the stack for the rest of the
//! expression tree.

use crate::transaction::Transaction;
use crate::vm::VmStack;
use common::{QueryError, Result, SType, SValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub mod boolean;
pub mod datetime;
pub mod human;

/// Native callback: pops the declared arguments, pushes one result.
pub type SFunctionCall = fn(&Transaction, &mut VmStack) -> Result<()>;

/// An immutable scalar function descriptor.
#[derive(Clone)]
pub struct SFunction {
    name: String,
    params: Vec<SType>,
    return_type: SType,
    call: SFunctionCall,
    null_strict: bool,
}

impl SFunction {
    pub fn new(name: &str, params: &[SType], return_type: SType, call: SFunctionCall) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            params: params.to_vec(),
            return_type,
            call,
            null_strict: true,
        }
    }

    /// Marks the function as handling NULL itself: NULL is accepted in any
    /// parameter position and may be returned.
    pub fn with_null_arguments(mut self) -> Self {
        self.null_strict = false;
        self
    }

    /// Whether a NULL argument short-circuits the call to a NULL result.
    pub fn is_null_strict(&self) -> bool {
        self.null_strict
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[SType] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn return_type(&self) -> SType {
        self.return_type
    }

    /// Calls the function on the arguments at the top of `stack`.
    ///
    /// The top `arity` values must match the parameter list (first parameter
    /// deepest). Afterwards they must have been replaced by exactly one value
    /// of the return type.
    pub fn invoke(&self, txn: &Transaction, stack: &mut VmStack) -> Result<()> {
        let arity = self.arity();
        if stack.len() < arity {
            return Err(QueryError::Runtime(format!(
                "{}: expected {} arguments on the stack, found {}",
                self, arity, stack.len()
            )));
        }

        for (pos, param) in self.params.iter().enumerate() {
            let arg = stack.peek(arity - 1 - pos);
            let mismatch = |arg: &&SValue| {
                arg.get_type() != *param && (self.null_strict || !arg.is_null())
            };
            if let Some(arg) = arg.filter(mismatch) {
                return Err(QueryError::Type(format!(
                    "{}: argument {} must be {}, got {} '{}'",
                    self,
                    pos + 1,
                    param,
                    arg.get_type(),
                    arg
                )));
            }
        }

        let expected_depth = stack.len() - arity + 1;
        (self.call)(txn, stack)?;

        if stack.len() != expected_depth {
            return Err(QueryError::Runtime(format!(
                "{}: callback left the stack at depth {}, expected {}",
                self,
                stack.len(),
                expected_depth
            )));
        }

        match stack.peek(0) {
            Some(result) if result.get_type() == self.return_type => Ok(()),
            Some(result) if !self.null_strict && result.is_null() => Ok(()),
            Some(result) => Err(QueryError::Type(format!(
                "{}: callback returned {}",
                self,
                result.get_type()
            ))),
            None => Err(QueryError::Runtime(format!("{}: callback returned nothing", self))),
        }
    }
}

impl fmt::Display for SFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (pos, param) in self.params.iter().enumerate() {
            if pos > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}

impl fmt::Debug for SFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SFunction({})", self)
    }
}

/// Name to overload-set table of scalar functions.
///
/// Built once and shared by reference; lookups are case-insensitive and match
/// the argument types exactly.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Vec<Arc<SFunction>>>,
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the boolean and date/time families.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        boolean::register(&mut registry);
        datetime::register(&mut registry);
        registry
    }

    /// Adds an overload. Registering the same signature twice is an error.
    pub fn register(&mut self, function: SFunction) -> Result<()> {
        let overloads = self.functions.entry(function.name.clone()).or_default();
        if overloads.iter().any(|f| f.params == function.params) {
            return Err(QueryError::IllegalArgument(format!(
                "function {} is already registered",
                function
            )));
        }
        overloads.push(Arc::new(function));
        Ok(())
    }

    /// Resolves `name` for the given argument types.
    pub fn lookup(&self, name: &str, args: &[SType]) -> Result<Arc<SFunction>> {
        self.overloads(name)
            .iter()
            .find(|f| f.params == args)
            .cloned()
            .ok_or_else(|| {
                let args: Vec<_> = args.iter().map(SType::name).collect();
                QueryError::FunctionNotFound(format!("{}({})", name, args.join(", ")))
            })
    }

    pub fn overloads(&self, name: &str) -> &[Arc<SFunction>] {
        self.functions
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        !self.overloads(name).is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Registers a builtin whose signature is known to be unique.
pub(crate) fn register_builtin(
    registry: &mut FunctionRegistry,
    name: &str,
    params: &[SType],
    return_type: SType,
    call: SFunctionCall,
) {
    register_function(registry, SFunction::new(name, params, return_type, call));
}

pub(crate) fn register_function(registry: &mut FunctionRegistry, function: SFunction) {
    if let Err(err) = registry.register(function) {
        tracing::warn!(%err, "skipping duplicate builtin");
    }
}
