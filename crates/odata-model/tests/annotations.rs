//! Annotation record tests

use odata_model::annotation::{self, CALLBACK_SUPPORTED, DEEP_INSERT_SUPPORT};
use odata_model::*;
use odata_types::{Primitive, PrimitiveType};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_deep_insert_support_defaults() {
    let annotation = DeepInsertSupport::new().unwrap();
    assert_eq!(annotation.supported(), Some(true));
    assert_eq!(annotation.content_id_supported(), Some(true));
    assert_eq!(annotation.annotation().term(), DEEP_INSERT_SUPPORT);
}

#[test]
fn test_deep_insert_support_setter_changes_one_property() {
    let mut annotation = DeepInsertSupport::new().unwrap();
    let record_id = annotation.annotation().record().unwrap().id();

    annotation.set_supported(false).unwrap();

    assert_eq!(annotation.supported(), Some(false));
    assert_eq!(annotation.content_id_supported(), Some(true));

    // Same record, same binding order, owner unchanged
    let record = annotation.annotation().record().unwrap();
    assert_eq!(record.id(), record_id);
    let names: Vec<_> = record.property_values().map(|pv| pv.name()).collect();
    assert_eq!(names, vec!["Supported", "ContentIDSupported"]);
    assert!(record.property_values().all(|pv| pv.owner() == Some(record_id)));
}

#[test]
fn test_deep_insert_support_content_id_setter() {
    let mut annotation = DeepInsertSupport::new().unwrap();
    annotation
        .set_content_id_supported(false)
        .unwrap()
        .set_supported(true)
        .unwrap();
    assert_eq!(annotation.supported(), Some(true));
    assert_eq!(annotation.content_id_supported(), Some(false));
}

#[test]
fn test_callback_supported_plain_json() {
    let annotation = annotation::callback_supported().unwrap();
    assert_eq!(annotation.term(), CALLBACK_SUPPORTED);
    assert_eq!(
        annotation.value().to_json(),
        json!({"CallbackProtocols": [{"Id": "http"}]})
    );
}

#[test]
fn test_records_reject_undeclared_properties() {
    let annotation = DeepInsertSupport::new().unwrap();
    let mut record = annotation.annotation().record().unwrap().clone();
    let err = record.set("MaxDepth", json!(3)).unwrap_err();
    assert_eq!(err.code().slug(), "no_such_property");
}

#[test]
fn test_schema_keeps_annotations_per_target() {
    let mut builder = SchemaBuilder::new("airline");
    builder
        .add_type(
            ComplexType::entity("airline.Flight")
                .with_key("id")
                .with_property(Property::declared("id", PrimitiveType::Int32))
                .unwrap(),
        )
        .unwrap();
    builder
        .annotate(AnnotationTarget::Service, annotation::default_namespace())
        .unwrap()
        .annotate(AnnotationTarget::Service, DeepInsertSupport::new().unwrap().into())
        .unwrap()
        .annotate(AnnotationTarget::of_type("Flight"), annotation::description("A scheduled flight"))
        .unwrap();
    let schema = builder.build().unwrap();

    let terms: Vec<_> = schema.service_annotations().iter().map(|a| a.term()).collect();
    assert_eq!(
        terms,
        vec!["Org.OData.Core.V1.DefaultNamespace", "Org.OData.Capabilities.V1.DeepInsertSupport"]
    );

    let flight = schema.annotations(&AnnotationTarget::of_type("airline.Flight"));
    assert_eq!(flight.len(), 1);
    assert_eq!(
        flight[0].value(),
        &Value::Primitive(Primitive::string("A scheduled flight"))
    );
}
