//! Function registry for the expression engine
//!
//! Maps function names used in `$filter`/`$orderby` to their implementations.
//! The standard OData canonical functions are registered by
//! [`FunctionRegistry::with_standard_functions`]; providers may add their own.

use odata_types::Primitive;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use crate::operators::{register_datetime_functions, register_math_functions, register_string_functions};
use crate::value::Operand;

/// Type alias for function implementations
///
/// Arguments are already evaluated; a `None` result is null.
pub type FunctionFn = Arc<
    dyn Fn(&[Operand<'_>], &EvaluationContext<'_>) -> EvalResult<Option<Primitive>> + Send + Sync,
>;

/// A named function with its accepted argument count
#[derive(Clone)]
pub struct FunctionDefinition {
    /// Function name as written in expressions
    pub name: String,
    /// Minimum number of arguments
    pub min_args: usize,
    /// Maximum number of arguments
    pub max_args: usize,
    implementation: FunctionFn,
}

impl FunctionDefinition {
    /// Create a function accepting between `min_args` and `max_args` arguments
    pub fn new<F>(name: impl Into<String>, min_args: usize, max_args: usize, implementation: F) -> Self
    where
        F: Fn(&[Operand<'_>], &EvaluationContext<'_>) -> EvalResult<Option<Primitive>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            min_args,
            max_args,
            implementation: Arc::new(implementation),
        }
    }

    /// Create a function with a fixed argument count
    pub fn fixed<F>(name: impl Into<String>, arity: usize, implementation: F) -> Self
    where
        F: Fn(&[Operand<'_>], &EvaluationContext<'_>) -> EvalResult<Option<Primitive>>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, arity, arity, implementation)
    }

    /// Check an argument count against this definition
    pub fn check_arity(&self, found: usize) -> EvalResult<()> {
        if (self.min_args..=self.max_args).contains(&found) {
            return Ok(());
        }
        let expected = if self.min_args == self.max_args {
            self.min_args.to_string()
        } else {
            format!("{} to {}", self.min_args, self.max_args)
        };
        Err(EvalError::InvalidArgumentCount {
            function: self.name.clone(),
            expected,
            found,
        })
    }

    /// Invoke the function after checking the argument count
    pub fn call(&self, args: &[Operand<'_>], ctx: &EvaluationContext<'_>) -> EvalResult<Option<Primitive>> {
        self.check_arity(args.len())?;
        (self.implementation)(args, ctx)
    }
}

impl fmt::Debug for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish_non_exhaustive()
    }
}

/// Registry of callable functions
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDefinition>,
}

impl FunctionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the standard canonical functions
    pub fn with_standard_functions() -> Self {
        let mut registry = Self::new();
        registry.register_standard_functions();
        registry
    }

    /// Register the standard canonical functions
    pub fn register_standard_functions(&mut self) {
        register_string_functions(self);
        register_datetime_functions(self);
        register_math_functions(self);
    }

    /// Register a function, replacing any previous definition of the same name
    pub fn register(&mut self, definition: FunctionDefinition) {
        self.functions.insert(definition.name.clone(), definition);
    }

    /// Get a function definition by name
    pub fn get(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered function names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_functions_registered() {
        let registry = FunctionRegistry::with_standard_functions();
        for name in [
            "contains", "startswith", "endswith", "length", "indexof", "substring", "tolower",
            "toupper", "trim", "concat", "matchesPattern", "year", "month", "day", "hour",
            "minute", "second", "now", "round", "floor", "ceiling",
        ] {
            assert!(registry.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_arity_message() {
        let registry = FunctionRegistry::with_standard_functions();
        let substring = registry.get("substring").unwrap();
        assert!(substring.check_arity(2).is_ok());
        assert!(substring.check_arity(3).is_ok());
        assert_eq!(
            substring.check_arity(1),
            Err(EvalError::InvalidArgumentCount {
                function: "substring".to_string(),
                expected: "2 to 3".to_string(),
                found: 1,
            })
        );
    }
}
