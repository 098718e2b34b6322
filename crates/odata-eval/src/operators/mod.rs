//! Operator and function implementations
//!
//! This module contains implementations organized by category:
//! - Logical operators (and, or, not) with three-valued logic
//! - Comparison operators (eq, ne, gt, ge, lt, le, in)
//! - Arithmetic operators (add, sub, mul, div, divby, mod, negation)
//! - Lambda operators (any, all)
//! - String, date/time and rounding functions

pub mod arithmetic;
pub mod comparison;
pub mod datetime;
pub mod lambda;
pub mod logical;
pub mod string;

pub use arithmetic::*;
pub use comparison::*;
pub use datetime::*;
pub use logical::*;
pub use string::*;

use odata_types::Primitive;

use crate::error::{EvalError, EvalResult};
use crate::value::Operand;

/// String argument at `index`; `None` for null
pub(crate) fn string_arg<'a>(function: &str, args: &'a [Operand<'_>], index: usize) -> EvalResult<Option<&'a str>> {
    match args.get(index) {
        None | Some(Operand::Null) => Ok(None),
        Some(Operand::Primitive(Primitive::String(s))) => Ok(Some(s)),
        Some(other) => Err(EvalError::type_mismatch(function, "Edm.String", other.type_name())),
    }
}

/// Integer argument at `index`; `None` for null
pub(crate) fn int_arg(function: &str, args: &[Operand<'_>], index: usize) -> EvalResult<Option<i64>> {
    match args.get(index) {
        None | Some(Operand::Null) => Ok(None),
        Some(Operand::Primitive(p)) => p
            .as_i64()
            .map(Some)
            .ok_or_else(|| EvalError::type_mismatch(function, "Edm.Int32", p.primitive_type().qualified_name())),
        Some(other) => Err(EvalError::type_mismatch(function, "Edm.Int32", other.type_name())),
    }
}

/// Convert a count or position to an `Edm.Int32` result
pub(crate) fn int32_result(function: &str, value: usize) -> EvalResult<Primitive> {
    i32::try_from(value)
        .map(Primitive::Int32)
        .map_err(|_| EvalError::overflow(function))
}
