//! `$filter` evaluation tests
//!
//! Parses filter expressions and evaluates them against the airline fixtures:
//! - Comparison, logical and arithmetic operators
//! - Three-valued logic and null exclusion
//! - Lambda operators over complex and primitive collections
//! - Built-in functions
//! - Evaluation errors
//! - Depth limit on expression trees

mod common;

use common::{airline, eval, eval_value, flight, flights, ids};
use odata_ast::{Node, UnaryNode, UnaryOp};
use odata_eval::{
    EvalError, EvaluationContext, ExpressionEngine, FunctionDefinition, FunctionRegistry,
    MAX_EVALUATION_DEPTH,
};
use odata_model::ComplexValue;
use odata_types::Primitive;
use pretty_assertions::assert_eq;
use rstest::rstest;
use rust_decimal::Decimal;
use serde_json::json;

fn filter(source: &str) -> Vec<i64> {
    let predicate = odata_parser::parse_filter(source).unwrap();
    let kept = ExpressionEngine::new().filter(flights(), &predicate).unwrap();
    ids(&kept)
}

fn filter_err(source: &str) -> EvalError {
    let predicate = odata_parser::parse_filter(source).unwrap();
    ExpressionEngine::new().filter(flights(), &predicate).unwrap_err()
}

// === Comparison ===

#[rstest]
#[case("origin eq 'LHR'", vec![1])]
#[case("origin ne 'LHR'", vec![2, 3])]
#[case("destination eq 'SFO'", vec![1, 3])]
#[case("duration gt 400", vec![1])]
#[case("duration le 330", vec![2])]
#[case("price ge 640", vec![1, 3])]
#[case("price lt 310.01", vec![2])]
#[case("id in (1, 3)", vec![1, 3])]
#[case("origin in ('JFK')", vec![2])]
#[case("'wifi' in tags", vec![1, 2])]
#[case("departs lt 2024-05-01T00:00:00Z", vec![3])]
#[case("captain/name eq 'Cy'", vec![2])]
fn test_comparison(#[case] source: &str, #[case] expected: Vec<i64>) {
    assert_eq!(filter(source), expected);
}

// === Logic and null propagation ===

#[rstest]
#[case("origin eq 'LHR' and destination eq 'SFO'", vec![1])]
#[case("origin eq 'LHR' or origin eq 'JFK'", vec![1, 2])]
#[case("not (origin eq 'LHR')", vec![2, 3])]
// duration is null on flight 3, so neither side keeps it
#[case("duration gt 400", vec![1])]
#[case("not (duration gt 400)", vec![2])]
#[case("duration eq null", vec![])]
// null or true is true
#[case("duration gt 400 or origin eq 'CDG'", vec![1, 3])]
// null and false is false, so not(...) keeps it
#[case("not (duration gt 400 and origin eq 'LHR')", vec![2, 3])]
// a missing complex value propagates null through the path
#[case("captain/age gt 40", vec![1, 2])]
#[case("not (captain/age gt 40)", vec![])]
fn test_three_valued_logic(#[case] source: &str, #[case] expected: Vec<i64>) {
    assert_eq!(filter(source), expected);
}

#[test]
fn test_predicate_result_is_tri_state() {
    let items = flights();
    assert_eq!(eval("duration gt 400", &items[0]), Ok(Some(true)));
    assert_eq!(eval("duration gt 400", &items[1]), Ok(Some(false)));
    assert_eq!(eval("duration gt 400", &items[2]), Ok(None));
    assert_eq!(eval("duration gt 400 and false", &items[2]), Ok(Some(false)));
    assert_eq!(eval("duration gt 400 or true", &items[2]), Ok(Some(true)));
}

#[test]
fn test_and_short_circuits_errors_on_the_right() {
    // The right operand would be a type mismatch, but false decides first
    assert_eq!(filter("false and origin eq 5"), Vec::<i64>::new());
    assert_eq!(filter("true or origin eq 5"), vec![1, 2, 3]);
}

// === Arithmetic ===

#[rstest]
#[case("duration add 10", Some(Primitive::Int64(670)))]
#[case("duration sub 60 mul 2", Some(Primitive::Int64(540)))]
#[case("duration div 100", Some(Primitive::Int64(6)))]
#[case("duration mod 100", Some(Primitive::Int64(60)))]
#[case("-duration", Some(Primitive::Int64(-660)))]
#[case("duration mul 0.5", Some(Primitive::Decimal(Decimal::new(330, 0))))]
#[case("duration add null", None)]
fn test_arithmetic(#[case] source: &str, #[case] expected: Option<Primitive>) {
    let items = flights();
    assert_eq!(eval_value(source, &items[0]), expected);
}

#[test]
fn test_arithmetic_inside_filter() {
    assert_eq!(filter("duration div 60 ge 10"), vec![1]);
    assert_eq!(filter("price mul 2 gt 1000"), vec![1, 3]);
}

#[test]
fn test_division_by_zero() {
    assert_eq!(filter_err("duration div 0 gt 1"), EvalError::DivisionByZero);
    assert_eq!(filter_err("price div 0.0 gt 1"), EvalError::DivisionByZero);
}

#[test]
fn test_integer_overflow() {
    let err = filter_err("id add 9223372036854775807 gt 0");
    assert!(matches!(err, EvalError::Overflow { .. }), "{:?}", err);
}

// === Lambdas ===

#[rstest]
#[case("crew/any(c: c/age lt 40)", vec![1])]
#[case("crew/all(c: c/role eq 'captain')", vec![2, 3])]
#[case("crew/any()", vec![1, 2])]
#[case("not crew/any()", vec![3])]
#[case("tags/any(t: t eq 'long-haul')", vec![1])]
#[case("tags/all(t: startswith(t, 'w'))", vec![2, 3])]
#[case("crew/any(c: c/name eq captain/name)", vec![1, 2])]
fn test_lambdas(#[case] source: &str, #[case] expected: Vec<i64>) {
    assert_eq!(filter(source), expected);
}

#[test]
fn test_empty_collection() {
    let items = flights();
    assert_eq!(eval("crew/any(c: c/age gt 0)", &items[2]), Ok(Some(false)));
    assert_eq!(eval("crew/all(c: c/age gt 0)", &items[2]), Ok(Some(true)));
}

#[test]
fn test_lambda_with_null_predicate() {
    let value = flight(json!({
        "id": 9,
        "crew": [{"name": "Dee", "age": null}, {"name": "Eve", "age": 30}]
    }));
    // No element decides `any`, one is unknown
    assert_eq!(eval("crew/any(c: c/age gt 40)", &value), Ok(None));
    // Eve's false decides `all`
    assert_eq!(eval("crew/all(c: c/age gt 40)", &value), Ok(Some(false)));
    assert_eq!(eval("crew/any(c: c/age lt 40)", &value), Ok(Some(true)));
}

#[test]
fn test_nested_lambda_sees_outer_variable() {
    let value = flight(json!({
        "id": 9,
        "tags": ["Ada"],
        "crew": [{"name": "Ada", "age": 52}]
    }));
    assert_eq!(eval("crew/any(c: tags/any(t: t eq c/name))", &value), Ok(Some(true)));
    assert_eq!(eval("crew/all(c: tags/all(t: t ne c/name))", &value), Ok(Some(false)));
}

// === Functions ===

#[rstest]
#[case("contains(origin, 'H')", vec![1])]
#[case("startswith(destination, 'S')", vec![1, 3])]
#[case("endswith(origin, 'K')", vec![2])]
#[case("length(origin) eq 3", vec![1, 2, 3])]
#[case("indexof(origin, 'D') eq 1", vec![3])]
#[case("substring(origin, 1) eq 'FK'", vec![2])]
#[case("substring(origin, 0, 1) eq 'C'", vec![3])]
#[case("tolower(origin) eq 'lhr'", vec![1])]
#[case("toupper(captain/name) eq 'ADA'", vec![1])]
#[case("trim(concat(' ', origin)) eq 'JFK'", vec![2])]
#[case("matchesPattern(origin, '^[CJ]')", vec![2, 3])]
#[case("year(departs) eq 2024 and month(departs) eq 4", vec![3])]
#[case("day(departs) eq 2", vec![2])]
#[case("hour(departs) eq 22 and minute(departs) eq 15", vec![3])]
#[case("second(departs) eq 0", vec![1, 2, 3])]
#[case("departs lt now()", vec![1, 2, 3])]
#[case("round(price) eq 821", vec![1])]
#[case("floor(price) eq 820", vec![1])]
#[case("ceiling(price) eq 821", vec![1])]
fn test_functions(#[case] source: &str, #[case] expected: Vec<i64>) {
    assert_eq!(filter(source), expected);
}

#[test]
fn test_function_with_null_argument() {
    let items = flights();
    assert_eq!(eval("contains(captain/name, 'A')", &items[2]), Ok(None));
}

#[test]
fn test_custom_function() {
    let mut registry = FunctionRegistry::with_standard_functions();
    registry.register(FunctionDefinition::fixed("route", 2, |args, _| {
        let parts: Option<Vec<String>> = args
            .iter()
            .map(|a| a.as_primitive().and_then(Primitive::as_str).map(str::to_string))
            .collect();
        Ok(parts.map(|p| Primitive::String(p.join("-"))))
    }));
    let engine = ExpressionEngine::with_registry(registry);

    let predicate = odata_parser::parse_filter("route(origin, destination) eq 'JFK-LAX'").unwrap();
    let kept = engine.filter(flights(), &predicate).unwrap();
    assert_eq!(ids(&kept), vec![2]);
}

// === Open types ===

#[test]
fn test_open_type_reads_unknown_names_as_null() {
    let mut value = ComplexValue::with_type(airline().extras);
    value.set("label", "meal").unwrap();
    value.set("seats", 3i64).unwrap();

    assert_eq!(eval("seats eq 3", &value), Ok(Some(true)));
    assert_eq!(eval("label eq 'meal'", &value), Ok(Some(true)));
    assert_eq!(eval("lounge eq 'gold'", &value), Ok(None));
}

// === Errors ===

#[rstest]
#[case("gate eq 'B12'", "unknown_property")]
#[case("captain/rank eq 1", "unknown_property")]
#[case("origin eq 5", "type_mismatch")]
#[case("origin add 1 eq 2", "type_mismatch")]
#[case("origin", "type_mismatch")]
#[case("crew eq 1", "type_mismatch")]
#[case("origin/any(o: o eq 'L')", "type_mismatch")]
#[case("flyaway(origin)", "unknown_operator")]
#[case("substring(origin)", "invalid_argument_count")]
#[case("contains(origin, 'a', 'b')", "invalid_argument_count")]
#[case("matchesPattern(origin, '(')", "invalid_pattern")]
fn test_errors(#[case] source: &str, #[case] slug: &str) {
    let err: odata_diagnostics::ODataError = filter_err(source).into();
    assert_eq!(err.code().slug(), slug, "{}", err);
    assert_eq!(err.status(), 400);
}

#[test]
fn test_error_aborts_the_whole_filter() {
    // Flight 1 passes through, flight 2 divides by zero
    let err = filter_err("captain/age div (id sub 2) gt 1");
    assert_eq!(err, EvalError::DivisionByZero);
}

// === Depth ===

fn negations(depth: usize) -> Node {
    (0..depth).fold(Node::Literal(Primitive::Boolean(true)), |operand, _| {
        Node::Unary(UnaryNode {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        })
    })
}

#[test]
fn test_deep_trees_fail_instead_of_recursing() {
    let engine = ExpressionEngine::new();
    let value = ComplexValue::with_type(airline().flight);
    let mut ctx = EvaluationContext::new(&value);

    let err = engine.evaluate(&negations(1000), &mut ctx).unwrap_err();
    assert_eq!(err, EvalError::TooDeep { limit: MAX_EVALUATION_DEPTH });
    let err: odata_diagnostics::ODataError = err.into();
    assert_eq!(err.code().slug(), "evaluation_too_deep");
    assert_eq!(err.status(), 400);

    // The context is usable again after the failure
    let shallow = engine.evaluate_predicate(&negations(MAX_EVALUATION_DEPTH - 1), &mut ctx);
    assert_eq!(shallow, Ok(Some(false)));
}

#[test]
fn test_long_operator_chains() {
    let chain = (1..=100).map(|id| format!("id eq {}", id)).collect::<Vec<_>>().join(" or ");
    assert_eq!(filter(&chain), vec![1, 2, 3]);

    let chain = vec!["id eq 0"; MAX_EVALUATION_DEPTH + 1].join(" or ");
    assert!(matches!(filter_err(&chain), EvalError::TooDeep { .. }));
}
