//! Tests for `$orderby` parsing

use odata_ast::*;
use odata_diagnostics::*;
use odata_parser::parse_orderby;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn test_items_and_directions() {
    let items = parse_orderby("name desc, price").unwrap();
    assert_eq!(
        items,
        vec![
            OrderByItem::descending(Node::property("name")),
            OrderByItem::ascending(Node::property("price")),
        ]
    );
}

#[test]
fn test_expressions_as_keys() {
    let items = parse_orderby("address/city asc,length(name) desc").unwrap();
    let rendered: Vec<_> = items.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["address/city asc", "length(name) desc"]);
}

#[test]
fn test_arithmetic_key() {
    let items = parse_orderby("price mul quantity desc").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].to_string(), "(price mul quantity) desc");
}

#[test]
fn test_lambda_key_resolves_variable() {
    let items = parse_orderby("crew/any(c: c/age gt 40) desc").unwrap();
    assert_eq!(items[0].direction, SortDirection::Descending);
    assert!(matches!(items[0].expr, Node::Lambda(_)));
    assert_eq!(items[0].to_string(), "crew/any(c:(c/age gt 40)) desc");
}

#[rstest]
#[case::trailing_comma("name desc,", ODATA0002)]
#[case::unknown_direction("name sideways", ODATA0006)]
#[case::stray_paren("name desc )", ODATA0006)]
#[case::empty("", ODATA0002)]
fn test_errors(#[case] input: &str, #[case] code: ErrorCode) {
    let err = parse_orderby(input).unwrap_err();
    assert_eq!(err.code(), code, "{}", err);
    assert_eq!(err.status(), 400);
}
