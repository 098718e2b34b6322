//! Query pipeline tests over the airline demo data
//!
//! Wire output is checked with inline snapshots at metadata level `none`;
//! ETags are content hashes, so minimal-level responses are checked field by field.

use odata::ast::SearchTerm;
use odata::eval::{FunctionDefinition, FunctionRegistry};
use odata::types::Primitive;
use odata::{
    ComplexValue, ExpressionEngine, InMemoryProvider, JsonWriter, MetadataLevel, ODataError, QueryOptions,
    RecordSource, Schema, SearchHandler, Service,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::Value as Json;
use std::sync::Arc;

fn schema() -> Arc<Schema> {
    Arc::new(Schema::from_json(include_str!("../demos/airline.schema.json")).unwrap())
}

fn provider(schema: Arc<Schema>) -> InMemoryProvider {
    let data: Json = serde_json::from_str(include_str!("../demos/airline.data.json")).unwrap();
    InMemoryProvider::from_json(schema, &data).unwrap()
}

fn service() -> Service<InMemoryProvider> {
    let schema = schema();
    Service::new(schema.clone(), provider(schema))
}

fn plain() -> QueryOptions {
    QueryOptions::new().metadata(MetadataLevel::None)
}

fn query(options: &QueryOptions) -> Result<String, ODataError> {
    let mut out = JsonWriter::buffer();
    service().query("flights", options, &mut out)?;
    Ok(out.as_str().to_string())
}

fn ids(options: QueryOptions) -> Vec<i64> {
    let body: Json = serde_json::from_str(&query(&options.select("id")).unwrap()).unwrap();
    body["value"]
        .as_array()
        .unwrap()
        .iter()
        .map(|flight| flight["id"].as_i64().unwrap())
        .collect()
}

// === Collections ===

#[test]
fn test_filter_select_orderby() {
    let options = plain()
        .filter("destination eq 'SFO'")
        .select("id,origin")
        .orderby("id desc");
    insta::assert_snapshot!(query(&options).unwrap(), @r#"{"value":[{"id":3,"origin":"CDG"},{"id":1,"origin":"LHR"}]}"#);
}

#[test]
fn test_expand_single_navigation() {
    let options = plain().select("id").expand("pilot");
    insta::assert_snapshot!(
        query(&options).unwrap(),
        @r#"{"value":[{"id":1,"pilot":{"id":1,"name":"Ada Lovelace","hours":12000}},{"id":2,"pilot":{"id":2,"name":"Cy Young","hours":8000}},{"id":3,"pilot":null}]}"#
    );
}

#[test]
fn test_expand_collection_with_nested_select() {
    let options = plain().filter("id eq 3").select("id").expand("stops($select=code)");
    insta::assert_snapshot!(
        query(&options).unwrap(),
        @r#"{"value":[{"id":3,"stops":[{"code":"JFK"},{"code":"SFO"}]}]}"#
    );
}

#[test]
fn test_nested_expand_reads_the_related_set() {
    let options = plain()
        .filter("id le 2")
        .select("id")
        .expand("pilot($select=name;$expand=base)");
    insta::assert_snapshot!(
        query(&options).unwrap(),
        @r#"{"value":[{"id":1,"pilot":{"name":"Ada Lovelace","base":{"code":"LHR","city":"London"}}},{"id":2,"pilot":{"name":"Cy Young","base":null}}]}"#
    );
}

#[rstest]
#[case(plain().orderby("duration"), vec![3, 2, 1])]
#[case(plain().orderby("duration desc"), vec![1, 2, 3])]
#[case(plain().orderby("destination, origin desc"), vec![2, 1, 3])]
#[case(plain().filter("tags/any(t: t eq 'wifi')"), vec![1, 2])]
#[case(plain().filter("tags/all(t: t eq 'wifi')"), vec![2, 3])]
#[case(plain().filter("price gt 500 and duration gt 600"), vec![1])]
#[case(plain().filter("not (duration gt 600)"), vec![2])]
#[case(plain().search("SFO"), vec![1, 3])]
#[case(plain().search("wifi NOT LHR"), vec![2])]
#[case(plain().filter("stops/any(s: s/code eq 'JFK')"), vec![3])]
#[case(plain().filter("stops/all(s: s/code eq 'NOPE')"), vec![])]
#[case(plain().filter("stops/all(s: s/code ne 'LHR')"), vec![1, 2, 3])]
#[case(plain().filter("pilot/name eq 'Ada Lovelace'"), vec![1])]
#[case(plain().filter("pilot/base/city eq 'London'"), vec![1])]
#[case(plain().orderby("pilot/name desc"), vec![2, 1, 3])]
#[case(plain().orderby("id").skip(1).top(1), vec![2])]
#[case(plain().orderby("id").skip(5), vec![])]
#[case(plain().top(0), vec![])]
fn test_collection_options(#[case] options: QueryOptions, #[case] expected: Vec<i64>) {
    assert_eq!(ids(options), expected);
}

#[test]
fn test_navigation_read_by_filter_is_not_expanded() {
    let options = plain().filter("stops/any(s: s/city eq 'New York')").select("id,origin");
    insta::assert_snapshot!(query(&options).unwrap(), @r#"{"value":[{"id":3,"origin":"CDG"}]}"#);

    let options = plain().filter("pilot/hours gt 10000").select("id").expand("pilot($select=name)");
    insta::assert_snapshot!(query(&options).unwrap(), @r#"{"value":[{"id":1,"pilot":{"name":"Ada Lovelace"}}]}"#);
}

#[test]
fn test_filter_applies_before_paging() {
    let options = plain().filter("destination eq 'SFO'").orderby("id").top(1).skip(1);
    assert_eq!(ids(options), vec![3]);
}

#[test]
fn test_query_returns_written_count() {
    let mut out = JsonWriter::buffer();
    let count = service()
        .query("flights", &plain().filter("origin ne 'JFK'"), &mut out)
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn test_minimal_metadata_framing() {
    let options = QueryOptions::new().select("id,origin").filter("id eq 1");
    let body: Json = serde_json::from_str(&query(&options).unwrap()).unwrap();

    assert_eq!(body["@odata.context"], "$metadata#flights(id,origin)");
    let flight = &body["value"][0];
    assert_eq!(flight["@odata.id"], "flights(1)");
    assert!(flight["@odata.etag"].as_str().unwrap().starts_with("W/\""));
    assert!(flight.get("@odata.type").is_none());
    assert_eq!(flight["origin"], "LHR");
}

#[test]
fn test_full_metadata_types_values() {
    let options = QueryOptions::new()
        .metadata(MetadataLevel::Full)
        .select("id,departs")
        .filter("id eq 2");
    let body: Json = serde_json::from_str(&query(&options).unwrap()).unwrap();

    assert_eq!(body["@odata.context"], "$metadata#flights(id,departs)");
    let flight = &body["value"][0];
    assert_eq!(flight["@odata.type"], "#airline.Flight");
    assert_eq!(flight["departs"], "2024-05-02T08:30:00Z");
    assert_eq!(flight["departs@odata.type"], "#DateTimeOffset");
}

// === Errors ===

#[rstest]
#[case(plain().filter("origin eq"), "unexpected_end", 400)]
#[case(plain().filter("gate eq 'A1'"), "unknown_property", 400)]
#[case(plain().filter("origin gt 5"), "type_mismatch", 400)]
#[case(plain().orderby("gate"), "unknown_property", 400)]
#[case(plain().expand("crew"), "nonexistent_expand_path", 400)]
#[case(plain().expand("manifest"), "path_not_expandable", 400)]
#[case(plain().select("gate"), "invalid_select", 400)]
#[case(plain().search("wifi )"), "invalid_search", 400)]
#[case(plain().filter("id eq 99").select("nonexistent"), "invalid_select", 400)]
#[case(plain().filter("id eq 99").expand("nonexistentNav"), "nonexistent_expand_path", 400)]
#[case(plain().filter("id eq 3").expand("pilot($expand=bogus)"), "nonexistent_expand_path", 400)]
#[case(plain().filter("id eq 3").expand("pilot($select=rank)"), "invalid_select", 400)]
#[case(plain().filter(format!("{}true{}", "(".repeat(500), ")".repeat(500))), "expression_too_deep", 400)]
#[case(plain().search(format!("{}wifi{}", "(".repeat(500), ")".repeat(500))), "expression_too_deep", 400)]
#[case(plain().filter(vec!["id eq 0"; 300].join(" or ")), "evaluation_too_deep", 400)]
fn test_request_errors_write_nothing(
    #[case] options: QueryOptions,
    #[case] slug: &str,
    #[case] status: u16,
) {
    let mut out = JsonWriter::buffer();
    let err = service().query("flights", &options, &mut out).unwrap_err();
    assert_eq!(err.code().slug(), slug);
    assert_eq!(err.status(), status);
    assert_eq!(out.as_str(), "");
}

#[test]
fn test_unknown_entity_set() {
    let mut out = JsonWriter::buffer();
    let err = service().query("gates", &plain(), &mut out).unwrap_err();
    assert_eq!(err.code().slug(), "unknown_entity_set");
    assert_eq!(err.status(), 500);
}

#[test]
fn test_envelope_of_request_error() {
    let err = query(&plain().filter("gate eq 'A1'")).unwrap_err();
    let envelope = serde_json::to_value(err.to_envelope()).unwrap();
    assert_eq!(envelope["error"]["code"], "unknown_property");
    assert_eq!(envelope["error"]["target"], "gate");
}

// === Single reads ===

#[test]
fn test_read_by_key() {
    let mut out = JsonWriter::buffer();
    service()
        .read("flights", &Primitive::Int32(2), &plain().select("origin,destination"), &mut out)
        .unwrap();
    insta::assert_snapshot!(out.as_str(), @r#"{"origin":"JFK","destination":"LAX"}"#);
}

#[test]
fn test_read_literal_with_expand() {
    let mut out = JsonWriter::buffer();
    service()
        .read_literal("airports", "'LHR'", &plain(), &mut out)
        .unwrap();
    insta::assert_snapshot!(out.as_str(), @r#"{"code":"LHR","city":"London"}"#);

    let mut out = JsonWriter::buffer();
    service()
        .read_literal("pilots", "1", &plain().select("name").expand("base"), &mut out)
        .unwrap();
    insta::assert_snapshot!(out.as_str(), @r#"{"name":"Ada Lovelace","base":{"code":"LHR","city":"London"}}"#);
}

#[test]
fn test_read_context_url() {
    let mut out = JsonWriter::buffer();
    service()
        .read("flights", &Primitive::Int32(1), &QueryOptions::new().select("id"), &mut out)
        .unwrap();
    let body: Json = serde_json::from_str(out.as_str()).unwrap();
    assert_eq!(body["@odata.context"], "$metadata#flights(id)/$entity");
    assert_eq!(body["@odata.id"], "flights(1)");
    assert_eq!(body["id"], 1);
}

#[test]
fn test_read_ignores_collection_options() {
    let mut out = JsonWriter::buffer();
    let options = plain().filter("id eq 2").top(0).select("id");
    service().read("flights", &Primitive::Int32(1), &options, &mut out).unwrap();
    assert_eq!(out.as_str(), r#"{"id":1}"#);
}

#[test]
fn test_read_missing_key() {
    let mut out = JsonWriter::buffer();
    let err = service()
        .read_literal("flights", "9", &plain(), &mut out)
        .unwrap_err();
    assert_eq!(err.code().slug(), "entity_not_found");
    assert_eq!(err.status(), 404);
    assert_eq!(err.to_envelope().error.target.as_deref(), Some("flights(9)"));
    assert_eq!(out.as_str(), "");
}

#[test]
fn test_read_validates_options_before_the_lookup() {
    let mut out = JsonWriter::buffer();
    let err = service()
        .read_literal("flights", "9", &plain().select("nonexistent"), &mut out)
        .unwrap_err();
    assert_eq!(err.code().slug(), "invalid_select");
    assert_eq!(out.as_str(), "");
}

#[test]
fn test_read_with_mistyped_key() {
    let mut out = JsonWriter::buffer();
    let err = service()
        .read_literal("flights", "'1'", &plain(), &mut out)
        .unwrap_err();
    assert_eq!(err.code().slug(), "type_mismatch");
    assert_eq!(err.status(), 400);
    assert_eq!(out.as_str(), "");
}

#[test]
fn test_read_literal_rejects_expressions() {
    let mut out = JsonWriter::buffer();
    let err = service()
        .read_literal("flights", "id add 1", &plain(), &mut out)
        .unwrap_err();
    assert_eq!(err.code().slug(), "invalid_literal");
}

// === Collaborators ===

fn long_haul(term: &SearchTerm, value: &ComplexValue) -> Option<bool> {
    if term.text != "longhaul" {
        return None;
    }
    let duration = value.get("duration").and_then(|pv| pv.primitive());
    Some(matches!(duration, Some(Primitive::Int32(minutes)) if *minutes > 600))
}

/// Records from the demo data; searches natively, resolves no navigation
struct Catalog(InMemoryProvider);

impl RecordSource for Catalog {
    fn records(&self, entity_set: &str) -> odata::Result<Vec<Json>> {
        self.0.records(entity_set)
    }

    fn search_handler(&self) -> Option<&dyn SearchHandler> {
        Some(&long_haul as &dyn SearchHandler)
    }
}

#[test]
fn test_source_search_handler() {
    let schema = schema();
    let service = Service::new(schema.clone(), Catalog(provider(schema)));
    let search = |source: &str| {
        let mut out = JsonWriter::buffer();
        service
            .query("flights", &plain().search(source).select("id"), &mut out)
            .unwrap();
        out.as_str().to_string()
    };
    assert_eq!(search("longhaul"), r#"{"value":[{"id":1}]}"#);
    assert_eq!(search("longhaul OR LAX"), r#"{"value":[{"id":1},{"id":2}]}"#);
}

#[test]
fn test_navigation_without_resolver_reads_null() {
    let schema = schema();
    let service = Service::new(schema.clone(), Catalog(provider(schema)));
    let ids = |filter: &str| {
        let mut out = JsonWriter::buffer();
        service
            .query("flights", &plain().filter(filter).select("id"), &mut out)
            .unwrap();
        out.as_str().to_string()
    };
    assert_eq!(ids("pilot/name eq 'Ada Lovelace'"), r#"{"value":[]}"#);
    assert_eq!(ids("stops/all(s: false)"), r#"{"value":[{"id":1},{"id":2},{"id":3}]}"#);
}

#[test]
fn test_custom_engine() {
    let mut registry = FunctionRegistry::with_standard_functions();
    registry.register(FunctionDefinition::fixed("route", 2, |args, _| {
        let parts: Option<Vec<String>> = args
            .iter()
            .map(|a| a.as_primitive().and_then(Primitive::as_str).map(str::to_string))
            .collect();
        Ok(parts.map(|p| Primitive::String(p.join("-"))))
    }));
    let service = service().with_engine(ExpressionEngine::with_registry(registry));

    let mut out = JsonWriter::buffer();
    service
        .query("flights", &plain().filter("route(origin, destination) eq 'CDG-SFO'").select("id"), &mut out)
        .unwrap();
    assert_eq!(out.as_str(), r#"{"value":[{"id":3}]}"#);
}
