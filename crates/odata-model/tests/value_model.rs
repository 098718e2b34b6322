//! Value model tests
//!
//! Tests construction of typed values from source records:
//! - Declared-property filtering
//! - Source adapters
//! - Array round trips
//! - ETag determinism

use odata_model::*;
use odata_types::{Primitive, PrimitiveType};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{Value as Json, json};
use std::collections::HashMap;
use std::sync::Arc;

fn flight_type() -> Arc<ComplexType> {
    let mut builder = SchemaBuilder::new("airline");
    builder
        .add_type(
            ComplexType::entity("airline.Flight")
                .with_key("id")
                .with_property(Property::declared("id", PrimitiveType::Int32).nullable(false))
                .unwrap()
                .with_property(Property::declared("origin", PrimitiveType::String))
                .unwrap()
                .with_property(Property::declared("destination", PrimitiveType::String))
                .unwrap()
                .with_property(Property::declared("duration", PrimitiveType::Int64))
                .unwrap(),
        )
        .unwrap()
}

// === Source adapters ===

#[test]
fn test_from_source_mapping_picks_declared_properties() {
    let raw = json!({"id": 1, "origin": "LHR", "destination": "SFO", "gate": "B12"});
    let entity = Entity::from_source(flight_type(), "flights", Source::from_json(&raw).unwrap()).unwrap();

    assert!(!entity.has("gate"));
    assert!(!entity.has("duration"));
    assert_eq!(
        entity.to_array(),
        json!({"id": 1, "origin": "LHR", "destination": "SFO"}).as_object().unwrap().clone()
    );
    assert_eq!(entity.id().as_deref(), Some("flights(1)"));
}

#[test]
fn test_from_source_uses_declaration_order() {
    let mut raw = serde_json::Map::new();
    raw.insert("destination".into(), json!("SFO"));
    raw.insert("id".into(), json!(1));
    raw.insert("origin".into(), json!("LHR"));

    let mut value = ComplexValue::with_type(flight_type());
    value.from_source(Source::Mapping(&raw)).unwrap();

    let names: Vec<_> = value.property_values().map(|pv| pv.name()).collect();
    assert_eq!(names, vec!["id", "origin", "destination"]);
}

#[test]
fn test_from_source_object_reads_every_declared_property() {
    let object: HashMap<String, Json> = [
        ("id".to_string(), json!(2)),
        ("origin".to_string(), json!("JFK")),
        ("extra".to_string(), json!(true)),
    ]
    .into_iter()
    .collect();

    let mut value = ComplexValue::with_type(flight_type());
    value.from_source(Source::Object(&object)).unwrap();

    assert_eq!(value.len(), 4);
    assert!(value.get("destination").unwrap().is_null());
    assert!(value.get("duration").unwrap().is_null());
    assert!(!value.has("extra"));
}

#[test]
fn test_from_source_coercion_failure() {
    let raw = json!({"id": "one"});
    let err = Entity::from_source(flight_type(), "flights", Source::from_json(&raw).unwrap()).unwrap_err();
    assert_eq!(err.code().slug(), "invalid_value");
    assert_eq!(err.status(), 500);
}

#[test]
fn test_unsupported_source_shape() {
    let raw = json!(["id", 1]);
    let err = Source::from_json(&raw).err().unwrap();
    assert_eq!(err.code().slug(), "invalid_source");
}

// === ETag ===

#[test]
fn test_etag_changes_with_one_property() {
    let a = json!({"id": 1, "origin": "LHR", "destination": "SFO"});
    let b = json!({"id": 1, "origin": "LHR", "destination": "LAX"});
    let a = Entity::from_source(flight_type(), "flights", Source::from_json(&a).unwrap()).unwrap();
    let b = Entity::from_source(flight_type(), "flights", Source::from_json(&b).unwrap()).unwrap();
    assert_ne!(a.etag(), b.etag());
}

#[test]
fn test_etag_depends_on_insertion_order() {
    let ty = flight_type();
    let mut a = ComplexValue::with_type(ty.clone());
    a.set("origin", "LHR").unwrap();
    a.set("destination", "SFO").unwrap();

    let mut b = ComplexValue::with_type(ty);
    b.set("destination", "SFO").unwrap();
    b.set("origin", "LHR").unwrap();

    assert_ne!(a.etag(), b.etag());
}

#[test]
fn test_etag_ignores_dynamic_properties() {
    let mut open = ComplexType::entity("airline.Charter")
        .with_key("id")
        .open(true)
        .with_property(Property::declared("id", PrimitiveType::Int32))
        .unwrap();
    open.seal();
    let open = Arc::new(open);

    let mut a = ComplexValue::with_type(open.clone());
    a.set("id", 1i64).unwrap();
    let mut b = ComplexValue::with_type(open);
    b.set("id", 1i64).unwrap();
    b.set("catering", "vegan").unwrap();

    assert!(b.get("catering").unwrap().property().is_dynamic());
    assert_eq!(a.etag(), b.etag());
}

// === Properties ===

fn flight_record() -> impl Strategy<Value = (i32, Option<String>, Option<String>, Option<i64>)> {
    (
        any::<i32>(),
        proptest::option::of("[A-Z]{3}"),
        proptest::option::of("[A-Z]{3}"),
        proptest::option::of(any::<i64>()),
    )
}

fn build((id, origin, destination, duration): (i32, Option<String>, Option<String>, Option<i64>)) -> ComplexValue {
    let raw = json!({
        "id": id,
        "origin": origin,
        "destination": destination,
        "duration": duration.map(|d| d.to_string()),
    });
    let mut value = ComplexValue::with_type(flight_type());
    value.from_source(Source::from_json(&raw).unwrap()).unwrap();
    value
}

proptest! {
    #[test]
    fn prop_array_round_trip(record in flight_record()) {
        let value = build(record);
        let mut copy = ComplexValue::with_type(value.complex_type().clone());
        copy.from_array(&value.to_array()).unwrap();
        prop_assert_eq!(copy, value);
    }

    #[test]
    fn prop_etag_is_deterministic(record in flight_record()) {
        let a = build(record.clone());
        let b = build(record);
        prop_assert_eq!(a.etag(), b.etag());
    }

    #[test]
    fn prop_etag_detects_single_change(record in flight_record(), other in "[a-z]{3}") {
        let a = build(record.clone());
        let mut b = build(record);
        b.set("origin", Primitive::string(other)).unwrap();
        prop_assert_ne!(a.etag(), b.etag());
    }
}
