//! Logical operators
//!
//! Implements: and, or, not
//! All logical operators implement three-valued logic: null stands for
//! "unknown" and only dominates when the other operand cannot decide.

use odata_ast::{BinaryNode, UnaryNode};

use crate::context::EvaluationContext;
use crate::engine::ExpressionEngine;
use crate::error::EvalResult;
use crate::value::Operand;

/// Three-valued conjunction
///
/// Truth table:
/// | A     | B     | A and B |
/// |-------|-------|---------|
/// | true  | true  | true    |
/// | true  | false | false   |
/// | true  | null  | null    |
/// | false | true  | false   |
/// | false | false | false   |
/// | false | null  | false   |
/// | null  | true  | null    |
/// | null  | false | false   |
/// | null  | null  | null    |
pub fn logical_and(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

/// Three-valued disjunction
///
/// Truth table:
/// | A     | B     | A or B  |
/// |-------|-------|---------|
/// | true  | true  | true    |
/// | true  | false | true    |
/// | true  | null  | true    |
/// | false | true  | true    |
/// | false | false | false   |
/// | false | null  | null    |
/// | null  | true  | true    |
/// | null  | false | null    |
/// | null  | null  | null    |
pub fn logical_or(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

/// Three-valued negation: `not null` is null
pub fn logical_not(operand: Option<bool>) -> Option<bool> {
    operand.map(|b| !b)
}

impl ExpressionEngine {
    /// Evaluate `and`; a false left operand decides without evaluating the right
    pub fn eval_and<'v>(&self, node: &BinaryNode, ctx: &mut EvaluationContext<'v>) -> EvalResult<Operand<'v>> {
        let left = self.evaluate(&node.left, ctx)?.to_logical("and")?;
        if left == Some(false) {
            return Ok(Operand::boolean(false));
        }
        let right = self.evaluate(&node.right, ctx)?.to_logical("and")?;
        Ok(logical_and(left, right).into())
    }

    /// Evaluate `or`; a true left operand decides without evaluating the right
    pub fn eval_or<'v>(&self, node: &BinaryNode, ctx: &mut EvaluationContext<'v>) -> EvalResult<Operand<'v>> {
        let left = self.evaluate(&node.left, ctx)?.to_logical("or")?;
        if left == Some(true) {
            return Ok(Operand::boolean(true));
        }
        let right = self.evaluate(&node.right, ctx)?.to_logical("or")?;
        Ok(logical_or(left, right).into())
    }

    /// Evaluate `not`
    pub fn eval_not<'v>(&self, node: &UnaryNode, ctx: &mut EvaluationContext<'v>) -> EvalResult<Operand<'v>> {
        let operand = self.evaluate(&node.operand, ctx)?.to_logical("not")?;
        Ok(logical_not(operand).into())
    }
}
