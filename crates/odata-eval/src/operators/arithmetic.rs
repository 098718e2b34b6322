//! Arithmetic operators and rounding functions
//!
//! Implements: add, sub, mul, div, divby, mod, unary minus, round, floor, ceiling
//!
//! Operands are promoted integer < decimal < double. Integer results are
//! `Edm.Int64` and overflow is an error. `div` truncates integers; `divby`
//! always divides as decimals (or doubles). A zero divisor is an error for
//! every numeric type.

use odata_ast::{BinaryNode, BinaryOp, UnaryNode};
use odata_types::{Numeric, Primitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::context::EvaluationContext;
use crate::engine::ExpressionEngine;
use crate::error::{EvalError, EvalResult};
use crate::registry::{FunctionDefinition, FunctionRegistry};
use crate::value::Operand;

/// Apply a binary arithmetic operator to two primitive values
pub fn arithmetic(op: BinaryOp, left: &Primitive, right: &Primitive) -> EvalResult<Primitive> {
    let keyword = op.keyword();
    let a = left
        .numeric()
        .ok_or_else(|| EvalError::type_mismatch(keyword, "numeric value", left.primitive_type().qualified_name()))?;
    let b = right
        .numeric()
        .ok_or_else(|| EvalError::type_mismatch(keyword, "numeric value", right.primitive_type().qualified_name()))?;

    let promoted = match a.promote(b) {
        (Numeric::Integer(x), Numeric::Integer(y)) if op == BinaryOp::DivideBy => {
            (Numeric::Decimal(Decimal::from(x)), Numeric::Decimal(Decimal::from(y)))
        }
        promoted => promoted,
    };

    match promoted {
        (Numeric::Integer(x), Numeric::Integer(y)) => integer_op(op, x, y).map(Primitive::Int64),
        (Numeric::Decimal(x), Numeric::Decimal(y)) => decimal_op(op, x, y).map(Primitive::Decimal),
        (Numeric::Double(x), Numeric::Double(y)) => double_op(op, x, y).map(Primitive::Double),
        _ => Err(EvalError::type_mismatch(
            keyword,
            left.primitive_type().qualified_name(),
            right.primitive_type().qualified_name(),
        )),
    }
}

fn not_arithmetic(op: BinaryOp) -> EvalError {
    EvalError::UnknownOperator {
        name: op.keyword().to_string(),
    }
}

fn integer_op(op: BinaryOp, x: i64, y: i64) -> EvalResult<i64> {
    let result = match op {
        BinaryOp::Add => x.checked_add(y),
        BinaryOp::Subtract => x.checked_sub(y),
        BinaryOp::Multiply => x.checked_mul(y),
        BinaryOp::Divide | BinaryOp::DivideBy | BinaryOp::Modulo if y == 0 => {
            return Err(EvalError::DivisionByZero);
        }
        BinaryOp::Divide | BinaryOp::DivideBy => x.checked_div(y),
        BinaryOp::Modulo => x.checked_rem(y),
        _ => return Err(not_arithmetic(op)),
    };
    result.ok_or_else(|| EvalError::overflow(op.keyword()))
}

fn decimal_op(op: BinaryOp, x: Decimal, y: Decimal) -> EvalResult<Decimal> {
    let result = match op {
        BinaryOp::Add => x.checked_add(y),
        BinaryOp::Subtract => x.checked_sub(y),
        BinaryOp::Multiply => x.checked_mul(y),
        BinaryOp::Divide | BinaryOp::DivideBy | BinaryOp::Modulo if y.is_zero() => {
            return Err(EvalError::DivisionByZero);
        }
        BinaryOp::Divide | BinaryOp::DivideBy => x.checked_div(y),
        BinaryOp::Modulo => x.checked_rem(y),
        _ => return Err(not_arithmetic(op)),
    };
    result.ok_or_else(|| EvalError::overflow(op.keyword()))
}

fn double_op(op: BinaryOp, x: f64, y: f64) -> EvalResult<f64> {
    match op {
        BinaryOp::Add => Ok(x + y),
        BinaryOp::Subtract => Ok(x - y),
        BinaryOp::Multiply => Ok(x * y),
        BinaryOp::Divide | BinaryOp::DivideBy | BinaryOp::Modulo if y == 0.0 => Err(EvalError::DivisionByZero),
        BinaryOp::Divide | BinaryOp::DivideBy => Ok(x / y),
        BinaryOp::Modulo => Ok(x % y),
        _ => Err(not_arithmetic(op)),
    }
}

/// Arithmetic negation
pub fn negate(value: &Primitive) -> EvalResult<Primitive> {
    match value.numeric() {
        Some(Numeric::Integer(i)) => i
            .checked_neg()
            .map(Primitive::Int64)
            .ok_or_else(|| EvalError::overflow("-")),
        Some(Numeric::Decimal(d)) => Ok(Primitive::Decimal(-d)),
        Some(Numeric::Double(v)) => Ok(Primitive::Double(-v)),
        None => Err(EvalError::type_mismatch(
            "-",
            "numeric value",
            value.primitive_type().qualified_name(),
        )),
    }
}

impl ExpressionEngine {
    /// Evaluate add, sub, mul, div, divby or mod
    pub fn eval_arithmetic<'v>(&self, node: &BinaryNode, ctx: &mut EvaluationContext<'v>) -> EvalResult<Operand<'v>> {
        let (left, right) = self.eval_operands(node, ctx)?;
        match (&left, &right) {
            (Operand::Null, _) | (_, Operand::Null) => Ok(Operand::Null),
            (Operand::Primitive(l), Operand::Primitive(r)) => arithmetic(node.op, l, r).map(Operand::Primitive),
            (Operand::Primitive(_), other) | (other, _) => Err(EvalError::type_mismatch(
                node.op.keyword(),
                "numeric value",
                other.type_name(),
            )),
        }
    }

    /// Evaluate unary minus
    pub fn eval_negate<'v>(&self, node: &UnaryNode, ctx: &mut EvaluationContext<'v>) -> EvalResult<Operand<'v>> {
        match self.evaluate(&node.operand, ctx)? {
            Operand::Null => Ok(Operand::Null),
            Operand::Primitive(p) => negate(&p).map(Operand::Primitive),
            other => Err(EvalError::type_mismatch("-", "numeric value", other.type_name())),
        }
    }
}

/// Rounding function over decimals and doubles; integers pass through
fn rounding(name: &'static str, decimal: fn(Decimal) -> Decimal, double: fn(f64) -> f64) -> FunctionDefinition {
    FunctionDefinition::fixed(name, 1, move |args, _| match args.first() {
        None | Some(Operand::Null) => Ok(None),
        Some(Operand::Primitive(Primitive::Decimal(d))) => Ok(Some(Primitive::Decimal(decimal(*d)))),
        Some(Operand::Primitive(Primitive::Double(v))) => Ok(Some(Primitive::Double(double(*v)))),
        Some(Operand::Primitive(Primitive::Single(v))) => Ok(Some(Primitive::Single(double(f64::from(*v)) as f32))),
        Some(Operand::Primitive(p)) if p.as_i64().is_some() => Ok(Some(p.clone())),
        Some(other) => Err(EvalError::type_mismatch(name, "numeric value", other.type_name())),
    })
}

/// Register round, floor and ceiling
pub fn register_math_functions(registry: &mut FunctionRegistry) {
    registry.register(rounding(
        "round",
        |d| d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        f64::round,
    ));
    registry.register(rounding("floor", |d| d.floor(), f64::floor));
    registry.register(rounding("ceiling", |d| d.ceil(), f64::ceil));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Primitive {
        Primitive::Decimal(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_integer_results_are_int64() {
        assert_eq!(
            arithmetic(BinaryOp::Add, &Primitive::Int32(2), &Primitive::Int32(3)),
            Ok(Primitive::Int64(5))
        );
        assert_eq!(
            arithmetic(BinaryOp::Divide, &Primitive::Int32(7), &Primitive::Int32(2)),
            Ok(Primitive::Int64(3))
        );
    }

    #[test]
    fn test_divby_is_decimal_division() {
        assert_eq!(
            arithmetic(BinaryOp::DivideBy, &Primitive::Int32(7), &Primitive::Int32(2)),
            Ok(dec("3.5"))
        );
    }

    #[test]
    fn test_promotion() {
        assert_eq!(arithmetic(BinaryOp::Add, &Primitive::Int32(1), &dec("0.5")), Ok(dec("1.5")));
        assert_eq!(
            arithmetic(BinaryOp::Multiply, &dec("2"), &Primitive::Double(1.5)),
            Ok(Primitive::Double(3.0))
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            arithmetic(BinaryOp::Modulo, &Primitive::Int32(1), &Primitive::Int32(0)),
            Err(EvalError::DivisionByZero)
        );
        assert_eq!(
            arithmetic(BinaryOp::Add, &Primitive::Int64(i64::MAX), &Primitive::Int32(1)),
            Err(EvalError::overflow("add"))
        );
        assert!(matches!(
            arithmetic(BinaryOp::Add, &Primitive::string("a"), &Primitive::Int32(1)),
            Err(EvalError::TypeMismatch { .. })
        ));
        assert_eq!(negate(&Primitive::Int64(i64::MIN)), Err(EvalError::overflow("-")));
    }
}
