//! Schema documents - serde description of a schema
//!
//! ```json
//! {
//!   "namespace": "airline",
//!   "complexTypes": [{ "name": "Address", "properties": [{ "name": "city", "type": "Edm.String" }] }],
//!   "entityTypes": [{
//!     "name": "Flight", "key": "id",
//!     "properties": [{ "name": "id", "type": "Edm.Int32", "nullable": false }],
//!     "navigationProperties": [{ "name": "passengers", "type": "Collection(airline.Passenger)", "targetSet": "passengers" }]
//!   }],
//!   "entitySets": [{ "name": "flights", "entityType": "Flight" }],
//!   "annotations": [{ "target": "Flight/id", "term": "Org.OData.Core.V1.Description", "value": "Flight number" }]
//! }
//! ```

use odata_diagnostics::{ODATA0402, ODataError, Result};
use odata_types::PrimitiveType;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::annotation::{Annotation, AnnotationTarget};
use crate::schema::{Schema, SchemaBuilder};
use crate::types::{ComplexType, NavigationBinding, Property, ValueType};
use crate::value::Value;

/// Root of a schema document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    pub namespace: String,
    #[serde(default)]
    pub complex_types: Vec<TypeDocument>,
    #[serde(default)]
    pub entity_types: Vec<TypeDocument>,
    #[serde(default)]
    pub entity_sets: Vec<EntitySetDocument>,
    #[serde(default)]
    pub annotations: Vec<AnnotationDocument>,
}

/// A complex or entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub open: bool,
    #[serde(default)]
    pub properties: Vec<PropertyDocument>,
    #[serde(default)]
    pub navigation_properties: Vec<NavigationDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationDocument {
    pub name: String,
    /// Target entity type, optionally wrapped in `Collection(...)`
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_set: Option<String>,
    #[serde(default = "default_true")]
    pub expandable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySetDocument {
    pub name: String,
    pub entity_type: String,
}

/// Annotation with a JSON value; the target is `$service`, `Type` or `Type/property`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationDocument {
    pub target: String,
    pub term: String,
    pub value: serde_json::Value,
}

fn default_true() -> bool {
    true
}

fn configuration_error(message: impl Into<String>) -> ODataError {
    ODataError::system(ODATA0402, message)
}

fn collection_element(type_name: &str) -> Option<&str> {
    type_name
        .strip_prefix("Collection(")
        .and_then(|rest| rest.strip_suffix(')'))
}

impl SchemaDocument {
    /// Parse a document from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| configuration_error(format!("Invalid schema document: {}", e)))
    }

    /// Load a document from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ODataError::io(&e).with_context(path.display().to_string()))?;
        Self::from_json(&json)
    }

    fn qualify(&self, name: &str) -> String {
        if name.contains('.') {
            name.to_string()
        } else {
            format!("{}.{}", self.namespace, name)
        }
    }

    /// Compile into a sealed schema
    pub fn compile(&self) -> Result<Schema> {
        let mut builder = SchemaBuilder::new(self.namespace.clone());

        // Complex types may reference each other in any order
        let mut pending: Vec<&TypeDocument> = self.complex_types.iter().collect();
        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            for doc in pending {
                match self.compile_type(&builder, doc, false) {
                    Ok(ty) => {
                        builder.add_type(ty)?;
                    }
                    Err(_) if self.references_pending(doc) => deferred.push(doc),
                    Err(e) => return Err(e),
                }
            }
            if deferred.len() == before {
                if let Some(doc) = deferred.first() {
                    return Err(self.compile_type(&builder, doc, false).err().unwrap_or_else(|| {
                        configuration_error(format!("Cyclic complex type {}", doc.name))
                    }));
                }
            }
            pending = deferred;
        }

        for doc in &self.entity_types {
            let ty = self.compile_type(&builder, doc, true)?;
            builder.add_type(ty)?;
        }

        for set in &self.entity_sets {
            builder.add_entity_set(set.name.clone(), &self.qualify(&set.entity_type))?;
        }

        for doc in &self.annotations {
            let target = match doc.target.split_once('/') {
                _ if doc.target == "$service" => AnnotationTarget::Service,
                Some((type_name, property)) => {
                    AnnotationTarget::of_property(self.qualify(type_name), property)
                }
                None => AnnotationTarget::of_type(self.qualify(&doc.target)),
            };
            let value = Value::infer(&doc.value)?.ok_or_else(|| {
                configuration_error(format!("Annotation {} has a null value", doc.term))
            })?;
            builder.annotate(target, Annotation::new(doc.term.clone(), value))?;
        }

        builder.build()
    }

    fn references_pending(&self, doc: &TypeDocument) -> bool {
        doc.properties.iter().any(|p| {
            let name = collection_element(&p.type_name).unwrap_or(&p.type_name);
            self.complex_types
                .iter()
                .any(|c| self.qualify(&c.name) == self.qualify(name))
        })
    }

    fn compile_type(&self, builder: &SchemaBuilder, doc: &TypeDocument, entity: bool) -> Result<ComplexType> {
        let name = self.qualify(&doc.name);
        let ty = if entity {
            let key = doc
                .key
                .as_deref()
                .ok_or_else(|| configuration_error(format!("Entity type {} has no key", name)))?;
            ComplexType::entity(name.clone()).with_key(key)
        } else {
            ComplexType::new(name.clone())
        };
        let mut ty = ty.open(doc.open);

        for property in &doc.properties {
            let value_type = self.resolve_type(builder, &property.type_name)?;
            ty.add_property(Property::declared(property.name.clone(), value_type).nullable(property.nullable))?;
        }

        for nav in &doc.navigation_properties {
            let (target, collection) = match collection_element(&nav.type_name) {
                Some(element) => (element, true),
                None => (nav.type_name.as_str(), false),
            };
            let mut binding = NavigationBinding::new(self.qualify(target))
                .collection(collection)
                .expandable(nav.expandable);
            if let Some(set) = &nav.target_set {
                binding = binding.target_set(set.clone());
            }
            ty.add_property(Property::navigation(nav.name.clone(), binding))?;
        }

        if let Some(key) = ty.key() {
            if ty.property(key).is_none() {
                return Err(ODataError::no_such_property(ty.name(), key));
            }
        }
        Ok(ty)
    }

    fn resolve_type(&self, builder: &SchemaBuilder, type_name: &str) -> Result<ValueType> {
        if let Some(element) = collection_element(type_name) {
            return Ok(ValueType::collection(self.resolve_type(builder, element)?));
        }
        if type_name == crate::types::UNTYPED {
            return Ok(ValueType::Untyped);
        }
        if let Some(primitive) = type_name
            .strip_prefix("Edm.")
            .and_then(PrimitiveType::from_name)
        {
            return Ok(ValueType::Primitive(primitive));
        }
        builder
            .get_type(&self.qualify(type_name))
            .filter(|t| !t.is_entity())
            .map(|t| ValueType::Complex(t.clone()))
            .ok_or_else(|| ODataError::unknown_type(type_name))
    }
}

impl Schema {
    /// Load and compile a schema document from a JSON string
    pub fn from_json(json: &str) -> Result<Schema> {
        SchemaDocument::from_json(json)?.compile()
    }

    /// Load and compile a schema document from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Schema> {
        SchemaDocument::from_file(path)?.compile()
    }
}
