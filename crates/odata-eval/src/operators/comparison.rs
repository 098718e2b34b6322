//! Comparison operators
//!
//! Implements: eq, ne, gt, ge, lt, le, in
//! A null operand makes the comparison null. Operands of incomparable types
//! are a type mismatch rather than `false`.

use odata_ast::{BinaryNode, BinaryOp};
use odata_types::Primitive;
use std::cmp::Ordering;

use crate::context::EvaluationContext;
use crate::engine::ExpressionEngine;
use crate::error::{EvalError, EvalResult};
use crate::value::Operand;

/// Compare two primitive values
///
/// Numeric values of any width compare after promotion. `Ok(None)` is only
/// returned for numbers without an order (NaN).
pub fn odata_compare(operator: &str, left: &Primitive, right: &Primitive) -> EvalResult<Option<Ordering>> {
    if let Some(ordering) = left.compare(right) {
        return Ok(Some(ordering));
    }
    if left.numeric().is_some() && right.numeric().is_some() {
        return Ok(None);
    }
    Err(EvalError::type_mismatch(
        operator,
        left.primitive_type().qualified_name(),
        right.primitive_type().qualified_name(),
    ))
}

/// Total order used for sorting: like [`odata_compare`] but NaN sorts by IEEE total order
pub fn sort_compare(left: &Primitive, right: &Primitive) -> EvalResult<Ordering> {
    match odata_compare("$orderby", left, right)? {
        Some(ordering) => Ok(ordering),
        None => Ok(left
            .as_f64()
            .unwrap_or(f64::NAN)
            .total_cmp(&right.as_f64().unwrap_or(f64::NAN))),
    }
}

/// Whether `ordering` satisfies a comparison operator
fn holds(op: BinaryOp, ordering: Ordering) -> bool {
    match op {
        BinaryOp::Equal => ordering == Ordering::Equal,
        BinaryOp::NotEqual => ordering != Ordering::Equal,
        BinaryOp::Greater => ordering == Ordering::Greater,
        BinaryOp::GreaterOrEqual => ordering != Ordering::Less,
        BinaryOp::Less => ordering == Ordering::Less,
        BinaryOp::LessOrEqual => ordering != Ordering::Greater,
        _ => false,
    }
}

impl ExpressionEngine {
    /// Evaluate eq, ne, gt, ge, lt or le
    pub fn eval_comparison<'v>(&self, node: &BinaryNode, ctx: &mut EvaluationContext<'v>) -> EvalResult<Operand<'v>> {
        let (left, right) = self.eval_operands(node, ctx)?;
        let keyword = node.op.keyword();

        let (left, right) = match (&left, &right) {
            (Operand::Null, _) | (_, Operand::Null) => return Ok(Operand::Null),
            (Operand::Primitive(l), Operand::Primitive(r)) => (l, r),
            (Operand::Primitive(_), other) | (other, _) => {
                return Err(EvalError::type_mismatch(keyword, "primitive value", other.type_name()));
            }
        };

        let result = match odata_compare(keyword, left, right)? {
            Some(ordering) => holds(node.op, ordering),
            // NaN is unequal to everything, itself included
            None => node.op == BinaryOp::NotEqual,
        };
        Ok(Operand::boolean(result))
    }

    /// Evaluate `in` against a literal list or a collection-valued property
    ///
    /// True when some member equals the left operand; null when no member
    /// does but some member is null; false otherwise.
    pub fn eval_in<'v>(&self, node: &BinaryNode, ctx: &mut EvaluationContext<'v>) -> EvalResult<Operand<'v>> {
        let (left, right) = self.eval_operands(node, ctx)?;

        let needle = match left {
            Operand::Null => return Ok(Operand::Null),
            Operand::Primitive(p) => p,
            other => return Err(EvalError::type_mismatch("in", "primitive value", other.type_name())),
        };
        let members: Vec<Operand<'v>> = match right {
            Operand::Null => return Ok(Operand::Null),
            Operand::List(items) => items,
            Operand::Collection(values) => values.iter().map(|v| Operand::from_value(Some(v))).collect(),
            other => return Err(EvalError::type_mismatch("in", "list or collection", other.type_name())),
        };

        let mut unknown = false;
        for member in &members {
            match member {
                Operand::Null => unknown = true,
                Operand::Primitive(p) => {
                    if odata_compare("in", &needle, p)? == Some(Ordering::Equal) {
                        return Ok(Operand::boolean(true));
                    }
                }
                other => return Err(EvalError::type_mismatch("in", "primitive value", other.type_name())),
            }
        }
        Ok(if unknown { Operand::Null } else { Operand::boolean(false) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_numeric_promotion() {
        let ordering = odata_compare("eq", &Primitive::Int32(2), &Primitive::Decimal(Decimal::new(20, 1)));
        assert_eq!(ordering, Ok(Some(Ordering::Equal)));
        let ordering = odata_compare("lt", &Primitive::Int64(1), &Primitive::Double(1.5));
        assert_eq!(ordering, Ok(Some(Ordering::Less)));
    }

    #[test]
    fn test_incomparable_types() {
        let err = odata_compare("eq", &Primitive::string("5"), &Primitive::Int32(5)).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn test_nan_has_no_order() {
        assert_eq!(odata_compare("eq", &Primitive::Double(f64::NAN), &Primitive::Int32(1)), Ok(None));
        assert!(sort_compare(&Primitive::Double(f64::NAN), &Primitive::Int32(1)).is_ok());
    }
}
