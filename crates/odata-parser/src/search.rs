//! `$search` expression parser
//!
//! Terms are bare words or double-quoted phrases combined with `AND`, `OR`
//! and `NOT` (uppercase). Adjacent terms are an implicit `AND`.

use odata_ast::SearchExpression;
use winnow::prelude::*;
use winnow::token::take_while;

use crate::combinators::{
    CLOSING_PARENTHESIS, Input, PResult, STRING_LITERAL, backtrack, cut_with, descend, expect, lit,
    ws,
};

/// Parse a search expression (entry point)
pub fn search_expression(input: &mut Input<'_>) -> PResult<SearchExpression> {
    ws.parse_next(input)?;
    or_expression(input, 0)
}

fn word<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    take_while(1.., |c: char| !c.is_whitespace() && !matches!(c, '(' | ')' | '"')).parse_next(input)
}

/// Match an operator word, leaving the input untouched otherwise
fn operator(input: &mut Input<'_>, op: &str) -> bool {
    let checkpoint = *input;
    if ws(input).is_ok() && word(input).is_ok_and(|w| w == op) {
        return true;
    }
    *input = checkpoint;
    false
}

fn or_expression(input: &mut Input<'_>, depth: usize) -> PResult<SearchExpression> {
    let mut left = and_expression(input, depth)?;
    while operator(input, "OR") {
        let right = and_expression(input, depth)?;
        left = SearchExpression::or(left, right);
    }
    Ok(left)
}

fn and_expression(input: &mut Input<'_>, depth: usize) -> PResult<SearchExpression> {
    let mut left = not_expression(input, depth)?;
    loop {
        if operator(input, "AND") {
            let right = not_expression(input, depth)?;
            left = SearchExpression::and(left, right);
            continue;
        }

        // Implicit AND between adjacent terms
        let checkpoint = *input;
        ws.parse_next(input)?;
        let at_boundary = input.is_empty() || input.starts_with(')');
        *input = checkpoint;
        if at_boundary {
            break;
        }
        if operator(input, "OR") {
            *input = checkpoint;
            break;
        }
        let right = not_expression(input, depth)?;
        left = SearchExpression::and(left, right);
    }
    Ok(left)
}

fn not_expression(input: &mut Input<'_>, depth: usize) -> PResult<SearchExpression> {
    if operator(input, "NOT") {
        let depth = descend(input, depth)?;
        let inner = not_expression(input, depth)?;
        return Ok(SearchExpression::negate(inner));
    }
    primary(input, depth)
}

fn primary(input: &mut Input<'_>, depth: usize) -> PResult<SearchExpression> {
    ws.parse_next(input)?;

    if lit("(").parse_next(input).is_ok() {
        let depth = descend(input, depth)?;
        let inner = or_expression(input, depth)?;
        expect(input, ")", CLOSING_PARENTHESIS)?;
        return Ok(inner);
    }

    if lit("\"").parse_next(input).is_ok() {
        return phrase(input).map(SearchExpression::phrase);
    }

    let checkpoint = *input;
    let text = word(input)?;
    if matches!(text, "AND" | "OR" | "NOT") {
        *input = checkpoint;
        return backtrack(input);
    }
    Ok(SearchExpression::word(text))
}

/// Body of a quoted phrase after the opening quote; `\"` and `\\` are escapes
fn phrase<'a>(input: &mut Input<'a>) -> PResult<String> {
    let text: &'a str = input;
    let mut out = String::new();
    let mut chars = text.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                *input = &text[i + 1..];
                return Ok(out);
            }
            '\\' => match chars.next() {
                Some((_, escaped)) => out.push(escaped),
                None => break,
            },
            c => out.push(c),
        }
    }
    *input = &text[text.len()..];
    cut_with(input, STRING_LITERAL)
}
