//! Expression engine
//!
//! This module provides the [`ExpressionEngine`], which evaluates parsed
//! `$filter`/`$orderby` expressions against one instance at a time.

use odata_ast::{BinaryNode, BinaryOp, FunctionCall, LambdaProperty, Node, PropertyPath, UnaryOp};
use odata_model::ComplexValue;

use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use crate::registry::FunctionRegistry;
use crate::value::Operand;

/// The expression evaluation engine
///
/// Stateless apart from its function registry, so one engine can serve any
/// number of requests.
#[derive(Debug, Clone)]
pub struct ExpressionEngine {
    registry: FunctionRegistry,
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEngine {
    /// Create a new engine with the standard functions
    pub fn new() -> Self {
        Self {
            registry: FunctionRegistry::with_standard_functions(),
        }
    }

    /// Create an engine with a custom registry
    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Get a mutable reference to the registry
    pub fn registry_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.registry
    }

    /// Evaluate an expression node
    pub fn evaluate<'v>(&self, node: &Node, ctx: &mut EvaluationContext<'v>) -> EvalResult<Operand<'v>> {
        ctx.enter()?;
        let result = self.evaluate_node(node, ctx);
        ctx.leave();
        result
    }

    fn evaluate_node<'v>(&self, node: &Node, ctx: &mut EvaluationContext<'v>) -> EvalResult<Operand<'v>> {
        match node {
            Node::Null => Ok(Operand::Null),
            Node::Literal(value) => Ok(Operand::Primitive(value.clone())),
            Node::List(items) => items
                .iter()
                .map(|item| self.evaluate(item, ctx))
                .collect::<EvalResult<Vec<_>>>()
                .map(Operand::List),
            Node::Property(path) => self.eval_property(path, ctx),
            Node::LambdaProperty(property) => self.eval_lambda_property(property, ctx),
            Node::Binary(node) => self.eval_binary(node, ctx),
            Node::Unary(node) => match node.op {
                UnaryOp::Not => self.eval_not(node, ctx),
                UnaryOp::Negate => self.eval_negate(node, ctx),
            },
            Node::Function(call) => self.eval_function(call, ctx),
            Node::Lambda(node) => self.eval_lambda(node, ctx),
        }
    }

    /// Evaluate a boolean expression with three-valued logic
    pub fn evaluate_predicate(&self, node: &Node, ctx: &mut EvaluationContext<'_>) -> EvalResult<Option<bool>> {
        self.evaluate(node, ctx)?.to_logical("$filter")
    }

    /// Whether the instance passes a filter: only `true` passes, null and false do not
    pub fn matches(&self, node: &Node, ctx: &mut EvaluationContext<'_>) -> EvalResult<bool> {
        Ok(self.evaluate_predicate(node, ctx)? == Some(true))
    }

    fn eval_binary<'v>(&self, node: &BinaryNode, ctx: &mut EvaluationContext<'v>) -> EvalResult<Operand<'v>> {
        match node.op {
            BinaryOp::And => self.eval_and(node, ctx),
            BinaryOp::Or => self.eval_or(node, ctx),
            BinaryOp::In => self.eval_in(node, ctx),
            op if op.is_comparison() => self.eval_comparison(node, ctx),
            _ => self.eval_arithmetic(node, ctx),
        }
    }

    /// Evaluate both operands of a binary node, left first
    pub(crate) fn eval_operands<'v>(
        &self,
        node: &BinaryNode,
        ctx: &mut EvaluationContext<'v>,
    ) -> EvalResult<(Operand<'v>, Operand<'v>)> {
        let left = self.evaluate(&node.left, ctx)?;
        let right = self.evaluate(&node.right, ctx)?;
        Ok((left, right))
    }

    fn eval_property<'v>(&self, path: &PropertyPath, ctx: &EvaluationContext<'v>) -> EvalResult<Operand<'v>> {
        navigate(Operand::Complex(ctx.current()), path)
    }

    fn eval_lambda_property<'v>(
        &self,
        property: &LambdaProperty,
        ctx: &EvaluationContext<'v>,
    ) -> EvalResult<Operand<'v>> {
        let bound = ctx
            .lookup(&property.variable)
            .cloned()
            .ok_or_else(|| EvalError::UnboundVariable {
                name: property.variable.clone(),
            })?;
        navigate(bound, &property.path)
    }

    fn eval_function<'v>(&self, call: &FunctionCall, ctx: &mut EvaluationContext<'v>) -> EvalResult<Operand<'v>> {
        let definition = self
            .registry
            .get(&call.name)
            .ok_or_else(|| EvalError::UnknownOperator {
                name: call.name.clone(),
            })?;
        definition.check_arity(call.args.len())?;

        let args = call
            .args
            .iter()
            .map(|arg| self.evaluate(arg, ctx))
            .collect::<EvalResult<Vec<_>>>()?;
        Ok(definition.call(&args, ctx)?.into())
    }
}

/// Follow a property path from `start`
///
/// Null short-circuits the rest of the path. A declared but unbound
/// property, or any unbound name on an open type, reads as null.
fn navigate<'v>(start: Operand<'v>, path: &PropertyPath) -> EvalResult<Operand<'v>> {
    let mut current = start;
    for segment in path.segments() {
        current = match current {
            Operand::Null => return Ok(Operand::Null),
            Operand::Complex(value) => member(value, segment)?,
            other => return Err(EvalError::unknown_property(segment.as_str(), other.type_name())),
        };
    }
    Ok(current)
}

fn member<'v>(value: &'v ComplexValue, name: &str) -> EvalResult<Operand<'v>> {
    if let Some(property_value) = value.get(name) {
        return Ok(Operand::from_value(property_value.value()));
    }

    let complex_type = value.complex_type();
    if complex_type.property(name).is_some() || complex_type.is_open() {
        Ok(Operand::Null)
    } else {
        Err(EvalError::unknown_property(name, complex_type.name()))
    }
}
