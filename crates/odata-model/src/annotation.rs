//! Annotations - typed records attached to model elements
//!
//! Each term has a builder that constructs the term's record type once, binds
//! property values against that type's declared properties and returns the
//! populated annotation. Records are read-only after construction except
//! through explicit setters that replace a bound value.

use odata_diagnostics::{ODataError, Result};
use odata_types::{Primitive, PrimitiveType};
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;

use crate::types::{ComplexType, Property, ValueType};
use crate::value::{ComplexValue, PropertyValue, Value};

/// An annotation record: a complex value typed by a term's record type
pub type Record = ComplexValue;

pub const DEFAULT_NAMESPACE: &str = "Org.OData.Core.V1.DefaultNamespace";
pub const DESCRIPTION: &str = "Org.OData.Core.V1.Description";
pub const CALLBACK_SUPPORTED: &str = "Org.OData.Capabilities.V1.CallbackSupported";
pub const DEEP_INSERT_SUPPORT: &str = "Org.OData.Capabilities.V1.DeepInsertSupport";

/// Default callback protocol identifier
pub const CALLBACK_PROTOCOL_HTTP: &str = "http";

/// Model element an annotation is attached to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnotationTarget {
    Service,
    Type(String),
    Property { type_name: String, property: String },
}

impl AnnotationTarget {
    pub fn of_type(type_name: impl Into<String>) -> Self {
        Self::Type(type_name.into())
    }

    pub fn of_property(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::Property {
            type_name: type_name.into(),
            property: property.into(),
        }
    }
}

impl fmt::Display for AnnotationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => write!(f, "$service"),
            Self::Type(name) => write!(f, "{}", name),
            Self::Property { type_name, property } => write!(f, "{}/{}", type_name, property),
        }
    }
}

/// A named, typed annotation value
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    term: String,
    value: Value,
}

impl Annotation {
    pub fn new(term: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            term: term.into(),
            value: value.into(),
        }
    }

    /// Fully qualified term name
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The annotation value as a record, for composite terms
    pub fn record(&self) -> Option<&Record> {
        self.value.as_complex()
    }

    fn record_mut(&mut self) -> Result<&mut Record> {
        let term = self.term.clone();
        self.value
            .as_complex_mut()
            .ok_or_else(|| ODataError::internal(format!("Annotation {} has no record value", term)))
    }
}

/// A term's record type, built once on first use
type TermType = Lazy<Result<Arc<ComplexType>>>;

fn term_type(name: &str, properties: Vec<Property>) -> Result<Arc<ComplexType>> {
    let mut ty = ComplexType::new(name);
    for property in properties {
        ty.add_property(property)?;
    }
    ty.seal();
    Ok(Arc::new(ty))
}

static CALLBACK_PROTOCOL_TYPE: TermType = Lazy::new(|| {
    term_type(
        "Org.OData.Capabilities.V1.CallbackProtocol",
        vec![
            Property::declared("Id", PrimitiveType::String),
            Property::declared("UrlTemplate", PrimitiveType::String),
            Property::declared("DocumentationUrl", PrimitiveType::String),
        ],
    )
});

static CALLBACK_TYPE: TermType = Lazy::new(|| {
    let protocol = CALLBACK_PROTOCOL_TYPE.clone()?;
    term_type(
        "Org.OData.Capabilities.V1.CallbackType",
        vec![Property::declared(
            "CallbackProtocols",
            ValueType::collection(ValueType::Complex(protocol)),
        )],
    )
});

static DEEP_INSERT_SUPPORT_TYPE: TermType = Lazy::new(|| {
    term_type(
        "Org.OData.Capabilities.V1.DeepInsertSupportType",
        vec![
            Property::declared("Supported", PrimitiveType::Boolean),
            Property::declared("ContentIDSupported", PrimitiveType::Boolean),
        ],
    )
});

/// Bind a value to a declared property of the record's type
fn bind(record: &mut Record, name: &str, value: impl Into<Value>) -> Result<()> {
    let property = record
        .complex_type()
        .property(name)
        .cloned()
        .ok_or_else(|| ODataError::no_such_property(record.complex_type().name(), name))?;
    record.add_property(PropertyValue::new(property, Some(value.into())))?;
    Ok(())
}

/// `Org.OData.Core.V1.DefaultNamespace`: a boolean flag
pub fn default_namespace() -> Annotation {
    Annotation::new(DEFAULT_NAMESPACE, Primitive::Boolean(true))
}

/// `Org.OData.Core.V1.Description`
pub fn description(text: impl Into<String>) -> Annotation {
    Annotation::new(DESCRIPTION, Primitive::String(text.into()))
}

/// `Org.OData.Capabilities.V1.CallbackSupported` with the `http` protocol
pub fn callback_supported() -> Result<Annotation> {
    let mut protocol = Record::with_type(CALLBACK_PROTOCOL_TYPE.clone()?);
    bind(&mut protocol, "Id", Primitive::string(CALLBACK_PROTOCOL_HTTP))?;

    let mut record = Record::with_type(CALLBACK_TYPE.clone()?);
    bind(&mut record, "CallbackProtocols", vec![Value::Complex(protocol)])?;

    Ok(Annotation::new(CALLBACK_SUPPORTED, record))
}

/// `Org.OData.Capabilities.V1.DeepInsertSupport`
#[derive(Debug, Clone, PartialEq)]
pub struct DeepInsertSupport(Annotation);

impl DeepInsertSupport {
    /// Both `Supported` and `ContentIDSupported` start out true
    pub fn new() -> Result<Self> {
        let mut record = Record::with_type(DEEP_INSERT_SUPPORT_TYPE.clone()?);
        bind(&mut record, "Supported", Primitive::Boolean(true))?;
        bind(&mut record, "ContentIDSupported", Primitive::Boolean(true))?;
        Ok(Self(Annotation::new(DEEP_INSERT_SUPPORT, record)))
    }

    pub fn set_supported(&mut self, supported: bool) -> Result<&mut Self> {
        self.0
            .record_mut()?
            .replace("Supported", Some(Primitive::Boolean(supported).into()))?;
        Ok(self)
    }

    pub fn set_content_id_supported(&mut self, supported: bool) -> Result<&mut Self> {
        self.0
            .record_mut()?
            .replace("ContentIDSupported", Some(Primitive::Boolean(supported).into()))?;
        Ok(self)
    }

    pub fn supported(&self) -> Option<bool> {
        self.flag("Supported")
    }

    pub fn content_id_supported(&self) -> Option<bool> {
        self.flag("ContentIDSupported")
    }

    fn flag(&self, name: &str) -> Option<bool> {
        self.0
            .record()?
            .get(name)?
            .primitive()
            .and_then(Primitive::as_bool)
    }

    pub fn annotation(&self) -> &Annotation {
        &self.0
    }

    pub fn into_annotation(self) -> Annotation {
        self.0
    }
}

impl From<DeepInsertSupport> for Annotation {
    fn from(annotation: DeepInsertSupport) -> Self {
        annotation.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespace_is_true() {
        let annotation = default_namespace();
        assert_eq!(annotation.term(), DEFAULT_NAMESPACE);
        assert_eq!(annotation.value(), &Value::Primitive(Primitive::Boolean(true)));
    }

    #[test]
    fn test_callback_supported_nests_protocol_records() {
        let annotation = callback_supported().unwrap();
        let record = annotation.record().unwrap();
        assert_eq!(record.complex_type().name(), "Org.OData.Capabilities.V1.CallbackType");

        let protocols = record.get_value("CallbackProtocols").unwrap().as_collection().unwrap();
        assert_eq!(protocols.len(), 1);
        let protocol = protocols[0].as_complex().unwrap();
        assert_eq!(protocol.get("Id").unwrap().primitive(), Some(&Primitive::string("http")));
    }

    #[test]
    fn test_term_type_reports_duplicate_properties() {
        let err = term_type(
            "Org.OData.Core.V1.Broken",
            vec![
                Property::declared("Id", PrimitiveType::String),
                Property::declared("Id", PrimitiveType::Int32),
            ],
        )
        .unwrap_err();
        assert_eq!(err.code().slug(), "duplicate_property");
    }

    #[test]
    fn test_term_types_are_sealed() {
        let annotation = callback_supported().unwrap();
        assert!(annotation.record().unwrap().complex_type().is_sealed());
    }
}
