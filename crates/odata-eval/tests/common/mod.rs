//! Shared fixtures: a small airline schema with flights and their crews

#![allow(dead_code)]

use odata_ast::Node;
use odata_eval::{EvaluationContext, ExpressionEngine, Operand};
use odata_model::{ComplexType, ComplexValue, Entity, Property, SchemaBuilder, Source, ValueType};
use odata_types::{Primitive, PrimitiveType};
use serde_json::{Value as Json, json};
use std::sync::Arc;

pub struct Airline {
    pub crew: Arc<ComplexType>,
    pub flight: Arc<ComplexType>,
    pub extras: Arc<ComplexType>,
}

pub fn airline() -> Airline {
    let mut builder = SchemaBuilder::new("airline");
    let crew = builder
        .add_type(
            ComplexType::new("airline.Crew")
                .with_property(Property::declared("name", PrimitiveType::String))
                .unwrap()
                .with_property(Property::declared("age", PrimitiveType::Int32))
                .unwrap()
                .with_property(Property::declared("role", PrimitiveType::String))
                .unwrap(),
        )
        .unwrap();
    let flight = builder
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
                .unwrap()
                .with_property(Property::declared("price", PrimitiveType::Decimal))
                .unwrap()
                .with_property(Property::declared("departs", PrimitiveType::DateTimeOffset))
                .unwrap()
                .with_property(Property::declared(
                    "tags",
                    ValueType::collection(PrimitiveType::String.into()),
                ))
                .unwrap()
                .with_property(Property::declared("captain", crew.clone()))
                .unwrap()
                .with_property(Property::declared("crew", ValueType::collection(crew.clone().into())))
                .unwrap(),
        )
        .unwrap();
    let extras = builder
        .add_type(
            ComplexType::new("airline.Extras")
                .open(true)
                .with_property(Property::declared("label", PrimitiveType::String))
                .unwrap(),
        )
        .unwrap();
    Airline { crew, flight, extras }
}

pub fn flight(raw: Json) -> Entity {
    Entity::from_source(airline().flight, "flights", Source::from_json(&raw).unwrap()).unwrap()
}

pub fn flights() -> Vec<Entity> {
    vec![
        flight(json!({
            "id": 1, "origin": "LHR", "destination": "SFO", "duration": 660, "price": "820.50",
            "departs": "2024-05-01T10:00:00Z", "tags": ["long-haul", "wifi"],
            "captain": {"name": "Ada", "age": 52, "role": "captain"},
            "crew": [
                {"name": "Ada", "age": 52, "role": "captain"},
                {"name": "Ben", "age": 31, "role": "steward"}
            ]
        })),
        flight(json!({
            "id": 2, "origin": "JFK", "destination": "LAX", "duration": 330, "price": "310.00",
            "departs": "2024-05-02T08:30:00Z", "tags": ["wifi"],
            "captain": {"name": "Cy", "age": 45, "role": "captain"},
            "crew": [{"name": "Cy", "age": 45, "role": "captain"}]
        })),
        flight(json!({
            "id": 3, "origin": "CDG", "destination": "SFO", "duration": null, "price": "640.00",
            "departs": "2024-04-30T22:15:00Z", "tags": [],
            "crew": []
        })),
    ]
}

pub fn ids(items: &[Entity]) -> Vec<i64> {
    items
        .iter()
        .filter_map(|e| e.key().and_then(Primitive::as_i64))
        .collect()
}

/// Evaluate a `$filter` expression against a single instance
pub fn eval(source: &str, value: &ComplexValue) -> Result<Option<bool>, odata_eval::EvalError> {
    let node = odata_parser::parse_filter(source).unwrap();
    ExpressionEngine::new().evaluate_predicate(&node, &mut EvaluationContext::new(value))
}

/// Evaluate any expression and return its primitive result
pub fn eval_value(source: &str, value: &ComplexValue) -> Option<Primitive> {
    let node: Node = odata_parser::parse_filter(source).unwrap();
    let mut ctx = EvaluationContext::new(value);
    match ExpressionEngine::new().evaluate(&node, &mut ctx).unwrap() {
        Operand::Null => None,
        Operand::Primitive(p) => Some(p),
        other => panic!("expected a primitive, got {:?}", other),
    }
}
