//! `$search` term dispatch
//!
//! Each term is first offered to the provider's [`SearchHandler`]. A definite
//! answer is used as is; `None` falls back to [`default_match`], a
//! case-insensitive substring match over the instance's primitive values.

use odata_ast::{SearchExpression, SearchTerm};
use odata_model::{ComplexValue, Value};

use crate::context::EvaluationContext;
use crate::engine::ExpressionEngine;

/// Provider hook for native full-text search
pub trait SearchHandler: Send + Sync {
    /// Decide whether `current` matches `term`; `None` means no opinion
    fn search(&self, term: &SearchTerm, current: &ComplexValue) -> Option<bool>;
}

impl<F> SearchHandler for F
where
    F: Fn(&SearchTerm, &ComplexValue) -> Option<bool> + Send + Sync,
{
    fn search(&self, term: &SearchTerm, current: &ComplexValue) -> Option<bool> {
        self(term, current)
    }
}

/// Case-insensitive substring match against every primitive property
///
/// Nested complex values and collections are searched too; navigation
/// properties are not.
pub fn default_match(term: &SearchTerm, value: &ComplexValue) -> bool {
    let needle = term.text.to_lowercase();
    complex_contains(value, &needle)
}

fn complex_contains(value: &ComplexValue, needle: &str) -> bool {
    value
        .property_values()
        .filter(|pv| !pv.property().is_navigation())
        .filter_map(|pv| pv.value())
        .any(|v| value_contains(v, needle))
}

fn value_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::Primitive(p) => p.to_string().to_lowercase().contains(needle),
        Value::Complex(c) => complex_contains(c, needle),
        Value::Collection(items) => items.iter().any(|item| value_contains(item, needle)),
    }
}

impl ExpressionEngine {
    /// Evaluate a search expression against the context's instance
    ///
    /// Search is two-valued: a term either matches or it does not.
    pub fn evaluate_search(&self, expr: &SearchExpression, ctx: &EvaluationContext<'_>) -> bool {
        match expr {
            SearchExpression::Term(term) => self.search_term(term, ctx),
            SearchExpression::And(left, right) => {
                self.evaluate_search(left, ctx) && self.evaluate_search(right, ctx)
            }
            SearchExpression::Or(left, right) => {
                self.evaluate_search(left, ctx) || self.evaluate_search(right, ctx)
            }
            SearchExpression::Not(inner) => !self.evaluate_search(inner, ctx),
        }
    }

    fn search_term(&self, term: &SearchTerm, ctx: &EvaluationContext<'_>) -> bool {
        let current = ctx.current();
        if let Some(handler) = ctx.search_handler() {
            if let Some(result) = handler.search(term, current) {
                log::trace!("search term {} answered by provider: {}", term, result);
                return result;
            }
        }
        let result = default_match(term, current);
        log::trace!("search term {} answered by default match: {}", term, result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_match_is_case_insensitive() {
        let mut value = ComplexValue::new();
        value.set("title", "Blue Sky Airline").unwrap();
        value.set("seats", 180i64).unwrap();

        assert!(default_match(&SearchTerm::word("sky"), &value));
        assert!(default_match(&SearchTerm::word("BLUE"), &value));
        assert!(default_match(&SearchTerm::word("180"), &value));
        assert!(!default_match(&SearchTerm::word("red"), &value));
    }

    #[test]
    fn test_default_match_searches_nested_values() {
        let mut address = ComplexValue::new();
        address.set("city", "Lisbon").unwrap();
        let mut value = ComplexValue::new();
        value.set("address", address).unwrap();

        assert!(default_match(&SearchTerm::word("lisb"), &value));
    }
}
