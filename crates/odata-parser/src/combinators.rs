//! Common parser combinators and literal parsers

use odata_types::{Primitive, PrimitiveType};
use rust_decimal::Decimal;
use serde_json::Value as Json;
use std::str::FromStr;
use winnow::ascii::multispace0;
use winnow::combinator::{cut_err, fail, opt};
use winnow::error::{ContextError, ErrMode, StrContext};
use winnow::prelude::*;
use winnow::token::{literal, one_of, take_while};

pub type Input<'a> = &'a str;
pub type PResult<T> = ModalResult<T>;

// Context labels attached to committed failures
pub const STRING_LITERAL: &str = "string literal";
pub const LITERAL: &str = "literal";
pub const LAMBDA: &str = "lambda expression";
pub const CLOSING_PARENTHESIS: &str = "closing parenthesis";
pub const TOO_DEEP: &str = "nesting depth";

/// Deepest nesting of groups, calls, lambdas and prefix operators
pub const MAX_DEPTH: usize = 50;

/// Skip whitespace
pub fn ws(input: &mut Input<'_>) -> PResult<()> {
    multispace0.void().parse_next(input)
}

/// Match a literal token
pub fn lit<'a>(token: &'static str) -> impl FnMut(&mut Input<'a>) -> PResult<&'a str> {
    move |input: &mut Input<'a>| literal(token).parse_next(input)
}

/// Identifier: letter, `_` or `$` followed by letters, digits or `_`
pub fn identifier<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_' || c == '$'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

/// Match a whole-word keyword
pub fn keyword<'a>(kw: &'static str) -> impl FnMut(&mut Input<'a>) -> PResult<&'a str> {
    move |input: &mut Input<'a>| {
        let checkpoint = *input;
        let word = identifier(input)?;
        if word == kw {
            Ok(word)
        } else {
            *input = checkpoint;
            backtrack(input)
        }
    }
}

/// Keyword preceded by optional whitespace
pub fn padded_keyword<'a>(kw: &'static str) -> impl FnMut(&mut Input<'a>) -> PResult<&'a str> {
    move |input: &mut Input<'a>| {
        let checkpoint = *input;
        ws(input)?;
        keyword(kw).parse_next(input).inspect_err(|_| *input = checkpoint)
    }
}

/// Recoverable failure
pub fn backtrack<'a, O>(input: &mut Input<'a>) -> PResult<O> {
    fail::<Input<'a>, O, ErrMode<ContextError>>(input)
}

/// Committed failure labelled with what was expected
pub fn cut_with<'a, O>(input: &mut Input<'a>, label: &'static str) -> PResult<O> {
    cut_err(fail::<Input<'a>, O, ErrMode<ContextError>>.context(StrContext::Label(label))).parse_next(input)
}

/// Enter one nesting level, committing to a failure past [`MAX_DEPTH`]
pub fn descend(input: &mut Input<'_>, depth: usize) -> PResult<usize> {
    if depth >= MAX_DEPTH {
        return cut_with(input, TOO_DEEP);
    }
    Ok(depth + 1)
}

/// Require a literal token, committing on failure
pub fn expect<'a>(input: &mut Input<'a>, token: &'static str, label: &'static str) -> PResult<()> {
    ws(input)?;
    if lit(token).parse_next(input).is_ok() {
        Ok(())
    } else {
        cut_with(input, label)
    }
}

/// Single-quoted string with `''` escapes
pub fn string_literal(input: &mut Input<'_>) -> PResult<String> {
    lit("'").parse_next(input)?;
    let mut out = String::new();
    loop {
        let Some(end) = input.find('\'') else {
            return cut_with(input, STRING_LITERAL);
        };
        out.push_str(&input[..end]);
        *input = &input[end + 1..];
        if let Some(rest) = input.strip_prefix('\'') {
            out.push('\'');
            *input = rest;
        } else {
            return Ok(out);
        }
    }
}

/// Integer, decimal or double literal
///
/// Integers take the smallest of Int32, Int64 and Decimal that holds them.
pub fn number_literal(input: &mut Input<'_>) -> PResult<Primitive> {
    let checkpoint = *input;
    let text = (
        take_while(1.., |c: char| c.is_ascii_digit()),
        opt(('.', take_while(1.., |c: char| c.is_ascii_digit()))),
        opt((
            one_of(['e', 'E']),
            opt(one_of(['+', '-'])),
            take_while(1.., |c: char| c.is_ascii_digit()),
        )),
    )
        .take()
        .parse_next(input)?;

    let value = if text.contains(['e', 'E']) {
        text.parse::<f64>().ok().map(Primitive::Double)
    } else if text.contains('.') {
        Decimal::from_str(text).ok().map(Primitive::Decimal)
    } else if let Ok(i) = text.parse::<i32>() {
        Some(Primitive::Int32(i))
    } else if let Ok(i) = text.parse::<i64>() {
        Some(Primitive::Int64(i))
    } else {
        Decimal::from_str(text).ok().map(Primitive::Decimal)
    };

    match value {
        Some(value) => Ok(value),
        None => {
            *input = checkpoint;
            cut_with(input, LITERAL)
        }
    }
}

fn digits_at(token: &[u8], range: std::ops::Range<usize>) -> bool {
    token.get(range).is_some_and(|s| s.iter().all(u8::is_ascii_digit))
}

fn is_date_like(token: &str) -> bool {
    let b = token.as_bytes();
    digits_at(b, 0..4) && b.get(4) == Some(&b'-') && digits_at(b, 5..7) && b.get(7) == Some(&b'-')
}

fn is_time_like(token: &str) -> bool {
    let b = token.as_bytes();
    digits_at(b, 0..2) && b.get(2) == Some(&b':') && digits_at(b, 3..5)
}

fn is_guid_like(token: &str) -> bool {
    token.len() == 36
        && token.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        })
}

/// Date, DateTimeOffset, TimeOfDay or Guid literal
pub fn temporal_literal(input: &mut Input<'_>) -> PResult<Primitive> {
    let checkpoint = *input;
    let token = take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '-' | ':' | '.' | '+')
    })
    .parse_next(input)?;

    let ty = if is_guid_like(token) {
        PrimitiveType::Guid
    } else if is_date_like(token) {
        if token.contains('T') {
            PrimitiveType::DateTimeOffset
        } else {
            PrimitiveType::Date
        }
    } else if is_time_like(token) {
        PrimitiveType::TimeOfDay
    } else {
        *input = checkpoint;
        return backtrack(input);
    };

    match ty.instance(&Json::String(token.to_string())) {
        Ok(Some(value)) => Ok(value),
        _ => {
            *input = checkpoint;
            cut_with(input, LITERAL)
        }
    }
}

/// `binary'<base64url>'`
pub fn binary_literal(input: &mut Input<'_>) -> PResult<Primitive> {
    let checkpoint = *input;
    lit("binary").parse_next(input)?;
    if !input.starts_with('\'') {
        *input = checkpoint;
        return backtrack(input);
    }
    let text = string_literal(input)?;
    match PrimitiveType::Binary.instance(&Json::String(text)) {
        Ok(Some(value)) => Ok(value),
        _ => {
            *input = checkpoint;
            cut_with(input, LITERAL)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_escapes() {
        let mut input = "'O''Hare' rest";
        assert_eq!(string_literal(&mut input).unwrap(), "O'Hare");
        assert_eq!(input, " rest");
    }

    #[test]
    fn test_number_kinds() {
        let parse = |s: &str| number_literal(&mut { s }).unwrap();
        assert_eq!(parse("42"), Primitive::Int32(42));
        assert_eq!(parse("3000000000"), Primitive::Int64(3_000_000_000));
        assert_eq!(parse("1.50"), Primitive::Decimal(Decimal::from_str("1.50").unwrap()));
        assert_eq!(parse("1e3"), Primitive::Double(1000.0));
    }

    #[test]
    fn test_keyword_is_whole_word() {
        let mut input = "notes";
        assert!(keyword("not").parse_next(&mut input).is_err());
        assert_eq!(input, "notes");
    }

    #[test]
    fn test_descend_stops_at_the_limit() {
        let mut input = "rest";
        assert_eq!(descend(&mut input, 0).unwrap(), 1);
        assert!(matches!(descend(&mut input, MAX_DEPTH), Err(ErrMode::Cut(_))));
    }

    #[test]
    fn test_temporal_shapes() {
        let parse = |s: &str| temporal_literal(&mut { s }).unwrap().primitive_type();
        assert_eq!(parse("2024-05-01"), PrimitiveType::Date);
        assert_eq!(parse("2024-05-01T10:00:00Z"), PrimitiveType::DateTimeOffset);
        assert_eq!(parse("10:30:00"), PrimitiveType::TimeOfDay);
        assert_eq!(parse("01234567-89ab-cdef-0123-456789abcdef"), PrimitiveType::Guid);
    }
}
