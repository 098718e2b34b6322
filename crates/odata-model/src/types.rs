//! Complex and entity type descriptors and their properties

use indexmap::IndexMap;
use odata_diagnostics::{ODataError, Result};
use odata_types::PrimitiveType;
use once_cell::sync::Lazy;
use serde_json::Value as Json;
use std::fmt;
use std::sync::Arc;

use crate::value::{ComplexValue, Value};

/// Qualified name of the open fallback type
pub const UNTYPED: &str = "Edm.Untyped";

/// Kind of a structured type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Complex,
    Entity,
}

/// Declared type of a property value
#[derive(Debug, Clone)]
pub enum ValueType {
    Primitive(PrimitiveType),
    Complex(Arc<ComplexType>),
    /// Entity type referenced by qualified name (navigation targets)
    Entity(String),
    Collection(Box<ValueType>),
    Untyped,
}

impl ValueType {
    /// Collection of the given element type
    pub fn collection(element: ValueType) -> Self {
        Self::Collection(Box::new(element))
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            Self::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    /// Qualified type name as used in metadata
    pub fn name(&self) -> String {
        match self {
            Self::Primitive(p) => p.qualified_name().to_string(),
            Self::Complex(t) => t.name().to_string(),
            Self::Entity(name) => name.clone(),
            Self::Collection(inner) => format!("Collection({})", inner.name()),
            Self::Untyped => UNTYPED.to_string(),
        }
    }

    /// Coerce a raw JSON value into this type
    ///
    /// `null` yields `Ok(None)`.
    pub fn instance(&self, raw: &Json) -> Result<Option<Value>> {
        if raw.is_null() {
            return Ok(None);
        }

        match self {
            Self::Primitive(p) => Ok(p.instance(raw)?.map(Value::Primitive)),
            Self::Complex(t) => match raw {
                Json::Object(map) => {
                    let mut value = ComplexValue::with_type(t.clone());
                    value.from_array(map)?;
                    Ok(Some(Value::Complex(value)))
                }
                other => Err(ODataError::invalid_value(t.name(), other)),
            },
            Self::Collection(element) => match raw {
                Json::Array(items) => {
                    let mut values = Vec::with_capacity(items.len());
                    for item in items {
                        let value = element
                            .instance(item)?
                            .ok_or_else(|| ODataError::invalid_value(&self.name(), item))?;
                        values.push(value);
                    }
                    Ok(Some(Value::Collection(values)))
                }
                other => Err(ODataError::invalid_value(&self.name(), other)),
            },
            Self::Entity(_) | Self::Untyped => Value::infer(raw),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<PrimitiveType> for ValueType {
    fn from(p: PrimitiveType) -> Self {
        Self::Primitive(p)
    }
}

impl From<Arc<ComplexType>> for ValueType {
    fn from(t: Arc<ComplexType>) -> Self {
        Self::Complex(t)
    }
}

/// Computes the value of a generated property at emission time
pub trait PropertyGenerator: Send + Sync {
    fn generate(&self, value: &ComplexValue) -> Result<Option<Value>>;
}

impl<F> PropertyGenerator for F
where
    F: Fn(&ComplexValue) -> Result<Option<Value>> + Send + Sync,
{
    fn generate(&self, value: &ComplexValue) -> Result<Option<Value>> {
        self(value)
    }
}

/// Relationship of a navigation property to its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationBinding {
    /// Qualified name of the target entity type
    pub target_type: String,
    /// Whether the property is collection-valued
    pub collection: bool,
    /// Entity set the related entities belong to
    pub target_set: Option<String>,
    /// Whether the property may be requested through `$expand`
    pub expandable: bool,
}

impl NavigationBinding {
    pub fn new(target_type: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            collection: false,
            target_set: None,
            expandable: true,
        }
    }

    pub fn collection(mut self, collection: bool) -> Self {
        self.collection = collection;
        self
    }

    pub fn target_set(mut self, set: impl Into<String>) -> Self {
        self.target_set = Some(set.into());
        self
    }

    pub fn expandable(mut self, expandable: bool) -> Self {
        self.expandable = expandable;
        self
    }
}

/// Kind of property
#[derive(Clone)]
pub enum PropertyKind {
    /// Stored value declared on the type
    Declared,
    /// Created on demand on an open type
    Dynamic,
    /// Related entity or entity collection
    Navigation(NavigationBinding),
    /// Value computed before emission
    Generated(Arc<dyn PropertyGenerator>),
}

impl fmt::Debug for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared => write!(f, "Declared"),
            Self::Dynamic => write!(f, "Dynamic"),
            Self::Navigation(binding) => f.debug_tuple("Navigation").field(binding).finish(),
            Self::Generated(_) => write!(f, "Generated"),
        }
    }
}

/// A property of a structured type
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    value_type: ValueType,
    nullable: bool,
    kind: PropertyKind,
}

impl Property {
    /// Create a declared property
    pub fn declared(name: impl Into<String>, value_type: impl Into<ValueType>) -> Self {
        Self {
            name: name.into(),
            value_type: value_type.into(),
            nullable: true,
            kind: PropertyKind::Declared,
        }
    }

    /// Create a dynamic property (open types only)
    pub fn dynamic(name: impl Into<String>, value_type: impl Into<ValueType>) -> Self {
        Self {
            kind: PropertyKind::Dynamic,
            ..Self::declared(name, value_type)
        }
    }

    /// Create a navigation property
    pub fn navigation(name: impl Into<String>, binding: NavigationBinding) -> Self {
        let target = ValueType::Entity(binding.target_type.clone());
        let value_type = if binding.collection {
            ValueType::collection(target)
        } else {
            target
        };
        Self {
            name: name.into(),
            value_type,
            nullable: true,
            kind: PropertyKind::Navigation(binding),
        }
    }

    /// Create a generated property
    pub fn generated(
        name: impl Into<String>,
        value_type: impl Into<ValueType>,
        generator: impl PropertyGenerator + 'static,
    ) -> Self {
        Self {
            kind: PropertyKind::Generated(Arc::new(generator)),
            ..Self::declared(name, value_type)
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn is_declared(&self) -> bool {
        matches!(self.kind, PropertyKind::Declared)
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, PropertyKind::Dynamic)
    }

    pub fn is_navigation(&self) -> bool {
        matches!(self.kind, PropertyKind::Navigation(_))
    }

    pub fn is_generated(&self) -> bool {
        matches!(self.kind, PropertyKind::Generated(_))
    }

    pub fn navigation_binding(&self) -> Option<&NavigationBinding> {
        match &self.kind {
            PropertyKind::Navigation(binding) => Some(binding),
            _ => None,
        }
    }

    pub fn generator(&self) -> Option<&Arc<dyn PropertyGenerator>> {
        match &self.kind {
            PropertyKind::Generated(generator) => Some(generator),
            _ => None,
        }
    }

    /// Check whether values of this property feed the ETag
    pub fn is_etag_eligible(&self) -> bool {
        self.is_declared()
            && self
                .value_type
                .as_primitive()
                .is_some_and(|p| p.is_etag_eligible())
    }
}

/// A complex or entity type
///
/// Properties are kept in declaration order. Once sealed, the property set is frozen.
#[derive(Debug, Clone)]
pub struct ComplexType {
    name: String,
    kind: TypeKind,
    key: Option<String>,
    open: bool,
    sealed: bool,
    properties: IndexMap<String, Arc<Property>>,
}

static UNTYPED_TYPE: Lazy<Arc<ComplexType>> = Lazy::new(|| {
    let mut ty = ComplexType::new(UNTYPED).open(true);
    ty.seal();
    Arc::new(ty)
});

impl ComplexType {
    /// Create a complex type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Complex,
            key: None,
            open: false,
            sealed: false,
            properties: IndexMap::new(),
        }
    }

    /// Create an entity type
    pub fn entity(name: impl Into<String>) -> Self {
        Self {
            kind: TypeKind::Entity,
            ..Self::new(name)
        }
    }

    /// The shared, sealed, open fallback type
    pub fn untyped() -> Arc<ComplexType> {
        UNTYPED_TYPE.clone()
    }

    pub fn open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    /// Set the key property name (entity types)
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Builder-style `add_property`
    pub fn with_property(mut self, property: Property) -> Result<Self> {
        self.add_property(property)?;
        Ok(self)
    }

    /// Add a property
    ///
    /// Fails when the type is sealed or already declares the name.
    pub fn add_property(&mut self, property: Property) -> Result<&mut Self> {
        if self.sealed {
            return Err(ODataError::type_sealed(&self.name));
        }
        if self.properties.contains_key(property.name()) {
            return Err(ODataError::duplicate_property(&self.name, property.name()));
        }
        self.properties
            .insert(property.name().to_string(), Arc::new(property));
        Ok(self)
    }

    /// Freeze the property set
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_entity(&self) -> bool {
        self.kind == TypeKind::Entity
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_untyped(&self) -> bool {
        self.name == UNTYPED
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn key_property(&self) -> Option<&Arc<Property>> {
        self.key.as_deref().and_then(|k| self.property(k))
    }

    /// Get a property by name
    pub fn property(&self, name: &str) -> Option<&Arc<Property>> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = &Arc<Property>> {
        self.properties.values()
    }

    pub fn declared_properties(&self) -> impl Iterator<Item = &Arc<Property>> {
        self.properties().filter(|p| p.is_declared())
    }

    pub fn navigation_properties(&self) -> impl Iterator<Item = &Arc<Property>> {
        self.properties().filter(|p| p.is_navigation())
    }

    pub fn generated_properties(&self) -> impl Iterator<Item = &Arc<Property>> {
        self.properties().filter(|p| p.is_generated())
    }

    pub fn navigation_property(&self, name: &str) -> Option<&Arc<Property>> {
        self.property(name).filter(|p| p.is_navigation())
    }
}

impl fmt::Display for ComplexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight() -> ComplexType {
        ComplexType::entity("airline.Flight")
            .with_key("id")
            .with_property(Property::declared("id", PrimitiveType::Int32).nullable(false))
            .unwrap()
            .with_property(Property::declared("origin", PrimitiveType::String))
            .unwrap()
            .with_property(Property::navigation(
                "passengers",
                NavigationBinding::new("airline.Passenger").collection(true),
            ))
            .unwrap()
    }

    #[test]
    fn test_property_partitions() {
        let ty = flight();
        let declared: Vec<_> = ty.declared_properties().map(|p| p.name()).collect();
        assert_eq!(declared, vec!["id", "origin"]);
        let nav: Vec<_> = ty.navigation_properties().map(|p| p.name()).collect();
        assert_eq!(nav, vec!["passengers"]);
        assert_eq!(ty.key_property().map(|p| p.name()), Some("id"));
        assert!(ty.property("missing").is_none());
    }

    #[test]
    fn test_sealed_type_rejects_properties() {
        let mut ty = flight();
        ty.seal();
        let err = ty
            .add_property(Property::declared("gate", PrimitiveType::String))
            .unwrap_err();
        assert_eq!(err.code().slug(), "type_sealed");
    }

    #[test]
    fn test_duplicate_property() {
        let mut ty = flight();
        let err = ty
            .add_property(Property::declared("origin", PrimitiveType::String))
            .unwrap_err();
        assert_eq!(err.code().slug(), "duplicate_property");
    }

    #[test]
    fn test_navigation_value_type() {
        let ty = flight();
        let nav = ty.navigation_property("passengers").unwrap();
        assert_eq!(nav.value_type().name(), "Collection(airline.Passenger)");
        assert!(!nav.is_etag_eligible());
    }

    #[test]
    fn test_untyped_is_shared_and_open() {
        let a = ComplexType::untyped();
        let b = ComplexType::untyped();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.is_open() && a.is_sealed() && a.is_untyped());
    }
}
