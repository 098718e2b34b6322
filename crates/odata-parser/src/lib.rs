//! OData query option parsers using Winnow
//!
//! Recursive descent parsers for the `$filter`, `$orderby` and `$search`
//! system query options. Every entry point consumes the whole option value
//! and reports failures as [`ODataError::Parse`] with the column of the
//! offending token. Nesting is capped at [`MAX_DEPTH`] levels.

mod combinators;
mod expression;
mod search;

pub use combinators::MAX_DEPTH;

use odata_ast::{Node, OrderByItem, SearchExpression};
use odata_diagnostics::{
    ErrorCode, ODATA0001, ODATA0002, ODATA0003, ODATA0004, ODATA0005, ODATA0006, ODATA0007,
    ODATA0009, ODATA0204, ODataError, Result, SourceLocation,
};
use winnow::error::{ContextError, ErrMode, StrContext};

use crate::combinators::{
    Input, LAMBDA, LITERAL, PResult, STRING_LITERAL, TOO_DEEP, identifier, ws,
};

/// Parse a `$filter` value into an expression tree
///
/// Paths rooted at a lambda variable come back as [`Node::LambdaProperty`].
pub fn parse_filter(source: &str) -> Result<Node> {
    let node = parse_complete(source, ODATA0001, expression::filter_expression, true)?;
    log::trace!("parsed $filter {:?} as {}", source, node);
    Ok(expression::resolve_lambda_variables(node))
}

/// Parse an `$orderby` value into its sort items
pub fn parse_orderby(source: &str) -> Result<Vec<OrderByItem>> {
    let items = parse_complete(source, ODATA0006, expression::orderby_items, false)?;
    Ok(items
        .into_iter()
        .map(|item| OrderByItem::new(expression::resolve_lambda_variables(item.expr), item.direction))
        .collect())
}

/// Parse a `$search` value
pub fn parse_search(source: &str) -> Result<SearchExpression> {
    let expr = parse_complete(source, ODATA0007, search::search_expression, false)?;
    log::trace!("parsed $search {:?} as {}", source, expr);
    Ok(expr)
}

/// Run `parser` over the whole of `source`
///
/// With `operators` set, an identifier left over after a complete expression
/// is reported as an unknown operator rather than a syntax error.
fn parse_complete<O>(
    source: &str,
    fallback: ErrorCode,
    mut parser: impl FnMut(&mut Input<'_>) -> PResult<O>,
    operators: bool,
) -> Result<O> {
    let mut input: Input<'_> = source;
    let output = parser(&mut input).map_err(|e| syntax_error(e, source, input, fallback))?;

    ws(&mut input).map_err(|e| syntax_error(e, source, input, fallback))?;
    if input.is_empty() {
        return Ok(output);
    }

    let location = SourceLocation::at_remaining(source, input);
    let mut rest = input;
    match identifier(&mut rest) {
        Ok(word) if operators => Err(ODataError::request_at(
            ODATA0204,
            format!("Unknown operator \"{}\" at {}", word, location),
            word,
        )),
        _ => Err(ODataError::parse_at(
            fallback,
            format!("Unexpected \"{}\" at {}", input, location),
            source,
            location,
        )),
    }
}

fn syntax_error(
    error: ErrMode<ContextError>,
    source: &str,
    remaining: &str,
    fallback: ErrorCode,
) -> ODataError {
    let error = match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
        ErrMode::Incomplete(_) => ContextError::new(),
    };
    let label = error.context().find_map(|context| match context {
        StrContext::Label(label) => Some(*label),
        _ => None,
    });

    let code = match label {
        Some(STRING_LITERAL) => ODATA0004,
        Some(LAMBDA) => ODATA0005,
        Some(LITERAL) => ODATA0003,
        Some(TOO_DEEP) => ODATA0009,
        _ if remaining.trim().is_empty() => ODATA0002,
        _ => fallback,
    };

    let location = SourceLocation::at_remaining(source, remaining);
    log::debug!("{} in {:?} at {}", code, source, location);
    ODataError::parse_at(
        code,
        format!("{} at {}", code.info().description, location),
        source,
        location,
    )
}
