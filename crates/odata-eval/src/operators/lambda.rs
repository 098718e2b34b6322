//! Lambda operators: `any` and `all`
//!
//! The variable is bound to each element of the collection in turn. `any`
//! stops at the first element whose predicate is true, `all` at the first
//! that is false. Over an empty (or null) collection `any` is false and
//! `all` is true. When no element decides and some predicate was null, the
//! result is null.

use odata_ast::{LambdaNode, LambdaOp};

use crate::context::EvaluationContext;
use crate::engine::ExpressionEngine;
use crate::error::{EvalError, EvalResult};
use crate::value::Operand;

impl ExpressionEngine {
    /// Evaluate `any`/`all` over a collection
    pub fn eval_lambda<'v>(&self, node: &LambdaNode, ctx: &mut EvaluationContext<'v>) -> EvalResult<Operand<'v>> {
        let keyword = node.op.keyword();
        let items = match self.evaluate(&node.collection, ctx)? {
            Operand::Null => return Ok(Operand::boolean(node.op == LambdaOp::All)),
            Operand::Collection(items) => items,
            other => return Err(EvalError::type_mismatch(keyword, "collection", other.type_name())),
        };

        let (Some(variable), Some(predicate)) = (&node.variable, &node.predicate) else {
            // `any()` tests for a non-empty collection
            return Ok(Operand::boolean(match node.op {
                LambdaOp::Any => !items.is_empty(),
                LambdaOp::All => true,
            }));
        };

        let mut unknown = false;
        for item in items {
            ctx.bind(variable.as_str(), Operand::from_value(Some(item)));
            let result = self
                .evaluate(predicate, ctx)
                .and_then(|value| value.to_logical(keyword));
            ctx.unbind();

            match (node.op, result?) {
                (LambdaOp::Any, Some(true)) => return Ok(Operand::boolean(true)),
                (LambdaOp::All, Some(false)) => return Ok(Operand::boolean(false)),
                (_, None) => unknown = true,
                _ => {}
            }
        }

        Ok(if unknown {
            Operand::Null
        } else {
            Operand::boolean(node.op == LambdaOp::All)
        })
    }
}
