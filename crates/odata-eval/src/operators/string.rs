//! String functions
//!
//! Implements: contains, startswith, endswith, length, indexof, substring,
//! tolower, toupper, trim, concat, matchesPattern
//!
//! Positions and lengths count characters, not bytes. A null argument makes
//! the result null.

use odata_types::Primitive;
use regex::Regex;

use super::{int32_result, int_arg, string_arg};
use crate::error::{EvalError, EvalResult};
use crate::registry::{FunctionDefinition, FunctionRegistry};

/// `name(haystack, needle)` returning a boolean
fn string_test(name: &'static str, test: fn(&str, &str) -> bool) -> FunctionDefinition {
    FunctionDefinition::fixed(name, 2, move |args, _| {
        let (Some(s), Some(other)) = (string_arg(name, args, 0)?, string_arg(name, args, 1)?) else {
            return Ok(None);
        };
        Ok(Some(Primitive::Boolean(test(s, other))))
    })
}

/// `name(s)` returning a transformed string
fn string_map(name: &'static str, map: fn(&str) -> String) -> FunctionDefinition {
    FunctionDefinition::fixed(name, 1, move |args, _| {
        Ok(string_arg(name, args, 0)?.map(|s| Primitive::String(map(s))))
    })
}

/// Character index of the first occurrence of `needle`, or -1
pub fn index_of(haystack: &str, needle: &str) -> EvalResult<Primitive> {
    match haystack.find(needle) {
        Some(byte) => int32_result("indexof", haystack[..byte].chars().count()),
        None => Ok(Primitive::Int32(-1)),
    }
}

/// Characters from `start` (zero-based), at most `length` of them
///
/// A negative start counts as zero; a negative length as an empty result.
pub fn substring(s: &str, start: i64, length: Option<i64>) -> String {
    let start = usize::try_from(start).unwrap_or(0);
    let chars = s.chars().skip(start);
    match length {
        Some(length) => chars.take(usize::try_from(length).unwrap_or(0)).collect(),
        None => chars.collect(),
    }
}

/// Whether `s` matches the regular expression `pattern` anywhere
pub fn matches_pattern(s: &str, pattern: &str) -> EvalResult<bool> {
    let regex = Regex::new(pattern).map_err(|_| EvalError::InvalidPattern {
        pattern: pattern.to_string(),
    })?;
    Ok(regex.is_match(s))
}

/// Register the string functions
pub fn register_string_functions(registry: &mut FunctionRegistry) {
    registry.register(string_test("contains", |s, sub| s.contains(sub)));
    registry.register(string_test("startswith", |s, prefix| s.starts_with(prefix)));
    registry.register(string_test("endswith", |s, suffix| s.ends_with(suffix)));

    registry.register(FunctionDefinition::fixed("length", 1, |args, _| {
        string_arg("length", args, 0)?
            .map(|s| int32_result("length", s.chars().count()))
            .transpose()
    }));

    registry.register(FunctionDefinition::fixed("indexof", 2, |args, _| {
        let (Some(s), Some(needle)) = (string_arg("indexof", args, 0)?, string_arg("indexof", args, 1)?) else {
            return Ok(None);
        };
        index_of(s, needle).map(Some)
    }));

    registry.register(FunctionDefinition::new("substring", 2, 3, |args, _| {
        let (Some(s), Some(start)) = (string_arg("substring", args, 0)?, int_arg("substring", args, 1)?) else {
            return Ok(None);
        };
        let length = match args.len() {
            3 => match int_arg("substring", args, 2)? {
                Some(length) => Some(length),
                None => return Ok(None),
            },
            _ => None,
        };
        Ok(Some(Primitive::String(substring(s, start, length))))
    }));

    registry.register(string_map("tolower", str::to_lowercase));
    registry.register(string_map("toupper", str::to_uppercase));
    registry.register(string_map("trim", |s| s.trim().to_string()));

    registry.register(FunctionDefinition::fixed("concat", 2, |args, _| {
        let (Some(a), Some(b)) = (string_arg("concat", args, 0)?, string_arg("concat", args, 1)?) else {
            return Ok(None);
        };
        Ok(Some(Primitive::String(format!("{}{}", a, b))))
    }));

    registry.register(FunctionDefinition::fixed("matchesPattern", 2, |args, _| {
        let (Some(s), Some(pattern)) = (
            string_arg("matchesPattern", args, 0)?,
            string_arg("matchesPattern", args, 1)?,
        ) else {
            return Ok(None);
        };
        matches_pattern(s, pattern).map(|b| Some(Primitive::Boolean(b)))
    }));
}
