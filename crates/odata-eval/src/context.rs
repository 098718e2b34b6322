//! Evaluation context for query expressions

use chrono::{DateTime, FixedOffset, Utc};
use odata_model::ComplexValue;

use crate::error::{EvalError, EvalResult};
use crate::search::SearchHandler;
use crate::value::Operand;

/// Deepest expression tree the engine walks
pub const MAX_EVALUATION_DEPTH: usize = 128;

/// Per-instance evaluation state
///
/// Holds the instance under evaluation (`$it`), the stack of lambda
/// variable bindings and the collaborator used for `$search` terms.
pub struct EvaluationContext<'v> {
    current: &'v ComplexValue,
    scopes: Vec<(String, Operand<'v>)>,
    search_handler: Option<&'v dyn SearchHandler>,
    now: DateTime<FixedOffset>,
    nesting: usize,
}

impl<'v> EvaluationContext<'v> {
    /// Create a context evaluating against `current`
    pub fn new(current: &'v ComplexValue) -> Self {
        Self {
            current,
            scopes: Vec::new(),
            search_handler: None,
            now: DateTime::<FixedOffset>::from(Utc::now()),
            nesting: 0,
        }
    }

    /// Delegate search terms to a provider before the default match
    pub fn with_search_handler(mut self, handler: &'v dyn SearchHandler) -> Self {
        self.search_handler = Some(handler);
        self
    }

    /// Fix the value of `now()`
    pub fn with_now(mut self, now: DateTime<FixedOffset>) -> Self {
        self.now = now;
        self
    }

    pub fn current(&self) -> &'v ComplexValue {
        self.current
    }

    pub fn search_handler(&self) -> Option<&'v dyn SearchHandler> {
        self.search_handler
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }

    /// Bind a lambda variable; the innermost binding of a name wins
    pub fn bind(&mut self, name: impl Into<String>, value: Operand<'v>) {
        self.scopes.push((name.into(), value));
    }

    /// Drop the innermost binding
    pub fn unbind(&mut self) {
        self.scopes.pop();
    }

    /// Look up a lambda variable
    pub fn lookup(&self, name: &str) -> Option<&Operand<'v>> {
        self.scopes
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// Number of live lambda bindings
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Step into a child node
    pub(crate) fn enter(&mut self) -> EvalResult<()> {
        if self.nesting >= MAX_EVALUATION_DEPTH {
            return Err(EvalError::TooDeep {
                limit: MAX_EVALUATION_DEPTH,
            });
        }
        self.nesting += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.nesting = self.nesting.saturating_sub(1);
    }
}
