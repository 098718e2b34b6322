//! Value model - typed bindings of properties to values
//!
//! A [`ComplexValue`] is an ordered, name-keyed container of [`PropertyValue`]s
//! conforming to a [`ComplexType`]. Every property value records the container
//! that owns it when it is attached; a value owned by one container cannot be
//! attached to another without being detached first.

use indexmap::IndexMap;
use odata_diagnostics::{ODataError, Result};
use odata_types::{Primitive, infer_primitive};
use serde_json::{Map, Value as Json};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::source::Source;
use crate::types::{ComplexType, Property, ValueType};

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a value container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(u64);

impl OwnerId {
    fn next() -> Self {
        Self(NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Link from a nested complex value back to the property holding it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    pub owner: OwnerId,
    pub property: String,
}

/// A non-null value of any shape
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Primitive(Primitive),
    Complex(ComplexValue),
    Collection(Vec<Value>),
}

impl Value {
    /// Infer a value of untyped shape from raw JSON
    ///
    /// Collections cannot hold null items, same as declared collections.
    pub fn infer(raw: &Json) -> Result<Option<Value>> {
        match raw {
            Json::Null => Ok(None),
            Json::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    let value = Self::infer(item)?.ok_or_else(|| {
                        let collection = ValueType::collection(ValueType::Untyped);
                        ODataError::invalid_value(&collection.name(), item)
                    })?;
                    values.push(value);
                }
                Ok(Some(Self::Collection(values)))
            }
            Json::Object(map) => {
                let mut value = ComplexValue::new();
                for (key, item) in map {
                    value.set(key, item.clone())?;
                }
                Ok(Some(Self::Complex(value)))
            }
            scalar => Ok(infer_primitive(scalar).map(Self::Primitive)),
        }
    }

    /// Declared type describing this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Primitive(p) => ValueType::Primitive(p.primitive_type()),
            Self::Complex(c) => ValueType::Complex(c.complex_type().clone()),
            Self::Collection(items) => ValueType::collection(
                items.first().map(Self::value_type).unwrap_or(ValueType::Untyped),
            ),
        }
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Self::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&ComplexValue> {
        match self {
            Self::Complex(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_complex_mut(&mut self) -> Option<&mut ComplexValue> {
        match self {
            Self::Complex(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&[Value]> {
        match self {
            Self::Collection(items) => Some(items),
            _ => None,
        }
    }

    /// Plain JSON without control metadata
    pub fn to_json(&self) -> Json {
        match self {
            Self::Primitive(p) => p.to_json(),
            Self::Complex(c) => Json::Object(c.to_array()),
            Self::Collection(items) => Json::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    fn adopt(&mut self, owner: OwnerId, property: &str) {
        match self {
            Self::Complex(c) => {
                c.parent = Some(ParentLink {
                    owner,
                    property: property.to_string(),
                })
            }
            Self::Collection(items) => items.iter_mut().for_each(|v| v.adopt(owner, property)),
            Self::Primitive(_) => {}
        }
    }
}

impl From<Primitive> for Value {
    fn from(p: Primitive) -> Self {
        Self::Primitive(p)
    }
}

impl From<ComplexValue> for Value {
    fn from(c: ComplexValue) -> Self {
        Self::Complex(c)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Collection(items)
    }
}

/// Input accepted by [`ComplexValue::set`]
///
/// Raw JSON is coerced into the property's declared type; a [`Value`] is
/// self-describing and stored as given.
#[derive(Debug, Clone)]
pub enum PropertyInput {
    Raw(Json),
    Value(Value),
    Null,
}

impl From<Json> for PropertyInput {
    fn from(raw: Json) -> Self {
        Self::Raw(raw)
    }
}

impl From<&Json> for PropertyInput {
    fn from(raw: &Json) -> Self {
        Self::Raw(raw.clone())
    }
}

impl From<Value> for PropertyInput {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Option<Value>> for PropertyInput {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::Null, Self::Value)
    }
}

impl From<Primitive> for PropertyInput {
    fn from(p: Primitive) -> Self {
        Self::Value(Value::Primitive(p))
    }
}

impl From<ComplexValue> for PropertyInput {
    fn from(c: ComplexValue) -> Self {
        Self::Value(Value::Complex(c))
    }
}

impl From<&str> for PropertyInput {
    fn from(s: &str) -> Self {
        Self::Raw(Json::from(s))
    }
}

impl From<i64> for PropertyInput {
    fn from(i: i64) -> Self {
        Self::Raw(Json::from(i))
    }
}

impl From<bool> for PropertyInput {
    fn from(b: bool) -> Self {
        Self::Raw(Json::from(b))
    }
}

impl From<f64> for PropertyInput {
    fn from(v: f64) -> Self {
        Self::Raw(Json::from(v))
    }
}

/// Binding of one property to one value (or null)
#[derive(Debug, Clone)]
pub struct PropertyValue {
    property: Arc<Property>,
    value: Option<Value>,
    owner: Option<OwnerId>,
    metadata: IndexMap<String, Json>,
}

impl PropertyValue {
    /// Create an unattached property value
    pub fn new(property: Arc<Property>, value: Option<Value>) -> Self {
        Self {
            property,
            value,
            owner: None,
            metadata: IndexMap::new(),
        }
    }

    /// Attach a custom metadata entry, rendered as `<name>@<key>`
    pub fn with_metadata(mut self, key: impl Into<String>, value: Json) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn property(&self) -> &Arc<Property> {
        &self.property
    }

    pub fn name(&self) -> &str {
        self.property.name()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn value_mut(&mut self) -> Option<&mut Value> {
        self.value.as_mut()
    }

    pub fn primitive(&self) -> Option<&Primitive> {
        self.value.as_ref().and_then(Value::as_primitive)
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Owning container, set once at attach time
    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    /// Release the binding from its owner so it can be attached elsewhere
    pub fn detach(mut self) -> Self {
        self.owner = None;
        self
    }

    pub fn custom_metadata(&self) -> &IndexMap<String, Json> {
        &self.metadata
    }

    pub fn into_value(self) -> Option<Value> {
        self.value
    }

    fn attach(&mut self, owner: OwnerId) {
        self.owner = Some(owner);
        if let Some(value) = self.value.as_mut() {
            value.adopt(owner, self.property.name());
        }
    }
}

/// An ordered, name-keyed collection of property values conforming to a type
#[derive(Debug)]
pub struct ComplexValue {
    id: OwnerId,
    complex_type: Arc<ComplexType>,
    property_values: IndexMap<String, PropertyValue>,
    parent: Option<ParentLink>,
    entity_set: Option<String>,
    uses_references: bool,
    metadata: IndexMap<String, Json>,
}

impl ComplexValue {
    /// Create an empty value of the untyped fallback type
    pub fn new() -> Self {
        Self::with_type(ComplexType::untyped())
    }

    /// Create an empty value of the given type
    pub fn with_type(complex_type: Arc<ComplexType>) -> Self {
        Self {
            id: OwnerId::next(),
            complex_type,
            property_values: IndexMap::new(),
            parent: None,
            entity_set: None,
            uses_references: false,
            metadata: IndexMap::new(),
        }
    }

    pub fn id(&self) -> OwnerId {
        self.id
    }

    pub fn complex_type(&self) -> &Arc<ComplexType> {
        &self.complex_type
    }

    /// Rebind the governing type
    ///
    /// Every bound property must be declared on the new type, or be dynamic
    /// with the new type open.
    pub fn set_type(&mut self, complex_type: Arc<ComplexType>) -> Result<&mut Self> {
        let stale = self.property_values.values().find(|bound| {
            complex_type.property(bound.name()).is_none()
                && !(complex_type.is_open() && bound.property.is_dynamic())
        });
        if let Some(stale) = stale {
            return Err(ODataError::no_such_property(complex_type.name(), stale.name()));
        }
        self.complex_type = complex_type;
        Ok(self)
    }

    pub fn parent(&self) -> Option<&ParentLink> {
        self.parent.as_ref()
    }

    pub fn entity_set(&self) -> Option<&str> {
        self.entity_set.as_deref()
    }

    pub fn set_entity_set(&mut self, entity_set: impl Into<String>) -> &mut Self {
        self.entity_set = Some(entity_set.into());
        self
    }

    /// Emit only control metadata for this value
    pub fn use_references(&mut self, references: bool) -> &mut Self {
        self.uses_references = references;
        self
    }

    pub fn uses_references(&self) -> bool {
        self.uses_references
    }

    /// Attach a custom metadata entry, rendered as `@<key>`
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: Json) -> &mut Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn custom_metadata(&self) -> &IndexMap<String, Json> {
        &self.metadata
    }

    /// Append a property value
    ///
    /// The property must be declared on the type, or be dynamic on an open type.
    pub fn add_property(&mut self, mut property_value: PropertyValue) -> Result<&mut Self> {
        let name = property_value.name().to_string();

        if property_value.owner.is_some_and(|owner| owner != self.id) {
            return Err(ODataError::already_owned(&name));
        }
        if self.property_values.contains_key(&name) {
            return Err(ODataError::duplicate_property(self.complex_type.name(), &name));
        }
        if self.complex_type.property(&name).is_none()
            && !(self.complex_type.is_open() && property_value.property.is_dynamic())
        {
            return Err(ODataError::no_such_property(self.complex_type.name(), &name));
        }

        property_value.attach(self.id);
        self.property_values.insert(name, property_value);
        Ok(self)
    }

    /// Get the bound property value (with its metadata)
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.property_values.get(name)
    }

    /// Get the bound value, flattening null
    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(PropertyValue::value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PropertyValue> {
        self.property_values.get_mut(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.property_values.contains_key(name)
    }

    /// Bind a value to a property by name
    ///
    /// Raw input is coerced into the property's declared type. An existing
    /// binding is replaced in place, keeping its position.
    pub fn set(&mut self, name: &str, input: impl Into<PropertyInput>) -> Result<&mut Self> {
        let input = input.into();
        let property = match self.complex_type.property(name) {
            Some(property) => property.clone(),
            None if self.complex_type.is_open() => {
                let value_type = match &input {
                    PropertyInput::Value(value) => value.value_type(),
                    PropertyInput::Raw(raw) => match infer_primitive(raw) {
                        Some(p) => ValueType::Primitive(p.primitive_type()),
                        None => ValueType::Untyped,
                    },
                    PropertyInput::Null => ValueType::Untyped,
                };
                Arc::new(Property::dynamic(name, value_type))
            }
            None => {
                return Err(ODataError::no_such_property(self.complex_type.name(), name));
            }
        };

        let value = match input {
            PropertyInput::Raw(raw) => property.value_type().instance(&raw)?,
            PropertyInput::Value(value) => Some(value),
            PropertyInput::Null => None,
        };

        let mut property_value = PropertyValue::new(property, value);
        property_value.attach(self.id);
        match self.property_values.get_mut(name) {
            Some(existing) => *existing = property_value,
            None => {
                self.property_values.insert(name.to_string(), property_value);
            }
        }
        Ok(self)
    }

    /// Replace the value of an existing binding
    pub fn replace(&mut self, name: &str, value: Option<Value>) -> Result<&mut Self> {
        let id = self.id;
        let existing = self
            .property_values
            .get_mut(name)
            .ok_or_else(|| ODataError::property_not_bound(name))?;
        existing.value = value;
        existing.attach(id);
        Ok(self)
    }

    /// Remove a binding, returning it detached
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.property_values.shift_remove(name).map(PropertyValue::detach)
    }

    /// Property values in insertion order
    pub fn property_values(&self) -> impl Iterator<Item = &PropertyValue> {
        self.property_values.values()
    }

    pub fn len(&self) -> usize {
        self.property_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.property_values.is_empty()
    }

    /// Plain key/value representation
    pub fn to_array(&self) -> Map<String, Json> {
        self.property_values
            .iter()
            .map(|(name, pv)| (name.clone(), pv.value().map_or(Json::Null, Value::to_json)))
            .collect()
    }

    /// Populate from a key/value mapping
    ///
    /// Only properties declared on the type are picked, in declaration order.
    /// The untyped fallback type takes every key.
    pub fn from_array(&mut self, object: &Map<String, Json>) -> Result<&mut Self> {
        if self.complex_type.is_untyped() {
            for (key, raw) in object {
                self.set(key, raw)?;
            }
            return Ok(self);
        }

        let declared: Vec<String> = self
            .complex_type
            .declared_properties()
            .map(|p| p.name().to_string())
            .collect();
        for name in declared {
            if let Some(raw) = object.get(&name) {
                self.set(&name, raw)?;
            }
        }
        Ok(self)
    }

    /// Populate from a source record
    pub fn from_source(&mut self, source: Source<'_>) -> Result<&mut Self> {
        match source {
            Source::Mapping(map) => self.from_array(map),
            Source::Object(object) => {
                let declared: Vec<String> = self
                    .complex_type
                    .declared_properties()
                    .map(|p| p.name().to_string())
                    .collect();
                for name in declared {
                    let raw = object.property(&name).unwrap_or(Json::Null);
                    self.set(&name, raw)?;
                }
                Ok(self)
            }
        }
    }
}

impl Default for ComplexValue {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloning produces a new container identity that owns the cloned bindings
impl Clone for ComplexValue {
    fn clone(&self) -> Self {
        let id = OwnerId::next();
        let property_values = self
            .property_values
            .iter()
            .map(|(name, pv)| {
                let mut pv = pv.clone();
                pv.attach(id);
                (name.clone(), pv)
            })
            .collect();

        Self {
            id,
            complex_type: self.complex_type.clone(),
            property_values,
            parent: self.parent.clone(),
            entity_set: self.entity_set.clone(),
            uses_references: self.uses_references,
            metadata: self.metadata.clone(),
        }
    }
}

/// Structural equality: same type name and same ordered bindings
impl PartialEq for ComplexValue {
    fn eq(&self, other: &Self) -> bool {
        self.complex_type.name() == other.complex_type.name()
            && self.property_values.len() == other.property_values.len()
            && self
                .property_values
                .iter()
                .zip(other.property_values.iter())
                .all(|((a_name, a), (b_name, b))| a_name == b_name && a.value == b.value)
    }
}
