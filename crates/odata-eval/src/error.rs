//! Evaluation errors for the expression engine

use odata_diagnostics::{
    ODATA0203, ODATA0204, ODATA0205, ODATA0206, ODATA0207, ODATA0208, ODATA0209, ODATA0210,
    ODATA0212, ODataError,
};
use thiserror::Error;

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur while evaluating a query expression
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// Function or operator name not known to the registry
    #[error("Unknown function or operator: {name}")]
    UnknownOperator { name: String },

    /// Property path naming a property the type does not declare
    #[error("Property '{path}' does not exist on type {type_name}")]
    UnknownProperty { path: String, type_name: String },

    /// Operand types the operator cannot combine
    #[error("Type mismatch in {operator}: expected {expected}, found {found}")]
    TypeMismatch {
        operator: String,
        expected: String,
        found: String,
    },

    /// Function called with the wrong number of arguments
    #[error("{function} expects {expected} argument(s), found {found}")]
    InvalidArgumentCount {
        function: String,
        expected: String,
        found: usize,
    },

    /// Lambda variable referenced outside its lambda
    #[error("Lambda variable '{name}' is not in scope")]
    UnboundVariable { name: String },

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Arithmetic overflow
    #[error("Arithmetic overflow in {operation}")]
    Overflow { operation: String },

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {pattern}")]
    InvalidPattern { pattern: String },

    #[error("Expression is more than {limit} levels deep")]
    TooDeep { limit: usize },
}

impl EvalError {
    /// Create a type mismatch error
    pub fn type_mismatch(
        operator: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            operator: operator.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an unknown property error
    pub fn unknown_property(path: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::UnknownProperty {
            path: path.into(),
            type_name: type_name.into(),
        }
    }

    /// Create an overflow error
    pub fn overflow(operation: impl Into<String>) -> Self {
        Self::Overflow {
            operation: operation.into(),
        }
    }
}

impl From<EvalError> for ODataError {
    fn from(error: EvalError) -> Self {
        let message = error.to_string();
        match error {
            EvalError::UnknownOperator { name } => ODataError::request_at(ODATA0204, message, name),
            EvalError::UnknownProperty { path, .. } => ODataError::request_at(ODATA0203, message, path),
            EvalError::TypeMismatch { operator, .. } => {
                ODataError::request_at(ODATA0205, message, operator)
            }
            EvalError::InvalidArgumentCount { function, .. } => {
                ODataError::request_at(ODATA0206, message, function)
            }
            EvalError::UnboundVariable { name } => ODataError::request_at(ODATA0207, message, name),
            EvalError::DivisionByZero => ODataError::request(ODATA0208, message),
            EvalError::Overflow { .. } => ODataError::request(ODATA0209, message),
            EvalError::InvalidPattern { pattern } => {
                ODataError::request_at(ODATA0210, message, pattern)
            }
            EvalError::TooDeep { .. } => ODataError::request(ODATA0212, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_codes() {
        let err: ODataError = EvalError::unknown_property("color", "shop.Product").into();
        assert_eq!(err.code(), ODATA0203);
        assert_eq!(err.code().slug(), "unknown_property");
        assert_eq!(err.status(), 400);

        let err: ODataError = EvalError::DivisionByZero.into();
        assert_eq!(err.code().slug(), "division_by_zero");
    }
}
