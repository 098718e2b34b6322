//! Entities - complex values typed by an entity type and bound to an entity set

use odata_diagnostics::{ODATA0106, ODataError, Result};
use odata_types::Primitive;
use std::borrow::{Borrow, BorrowMut};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::source::Source;
use crate::types::ComplexType;
use crate::value::ComplexValue;

/// Format a key value as an OData key literal
pub fn key_literal(key: &Primitive) -> String {
    match key {
        Primitive::String(s) => format!("'{}'", s.replace('\'', "''")),
        Primitive::Binary(_) => format!("binary'{}'", key),
        other => other.to_string(),
    }
}

impl ComplexValue {
    /// Value of the key property, if the type declares one and it is bound
    pub fn key_value(&self) -> Option<&Primitive> {
        let key = self.complex_type().key()?;
        self.get(key).and_then(|pv| pv.primitive())
    }

    /// Canonical entity id `<set>(<key>)`
    pub fn entity_id(&self) -> Option<String> {
        let set = self.entity_set()?;
        let key = self.key_value()?;
        Some(format!("{}({})", set, key_literal(key)))
    }
}

/// An entity: a complex value with an identifying key
#[derive(Debug, Clone, PartialEq)]
pub struct Entity(ComplexValue);

impl Entity {
    /// Create an empty entity of an entity type
    pub fn new(entity_type: Arc<ComplexType>) -> Result<Self> {
        if !entity_type.is_entity() {
            return Err(ODataError::schema(
                ODATA0106,
                format!("The type \"{}\" is not an entity type", entity_type.name()),
            ));
        }
        if entity_type.key_property().is_none() {
            return Err(ODataError::schema(
                ODATA0106,
                format!("The entity type \"{}\" declares no key property", entity_type.name()),
            ));
        }
        Ok(Self(ComplexValue::with_type(entity_type)))
    }

    /// Create an entity bound to a set and populated from a source record
    pub fn from_source(
        entity_type: Arc<ComplexType>,
        entity_set: &str,
        source: Source<'_>,
    ) -> Result<Self> {
        let mut entity = Self::new(entity_type)?;
        entity.set_entity_set(entity_set);
        entity.0.from_source(source)?;
        Ok(entity)
    }

    pub fn key(&self) -> Option<&Primitive> {
        self.0.key_value()
    }

    pub fn id(&self) -> Option<String> {
        self.0.entity_id()
    }

    pub fn into_inner(self) -> ComplexValue {
        self.0
    }

    pub fn as_complex(&self) -> &ComplexValue {
        &self.0
    }
}

impl Deref for Entity {
    type Target = ComplexValue;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Entity {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Borrow<ComplexValue> for Entity {
    fn borrow(&self) -> &ComplexValue {
        &self.0
    }
}

impl BorrowMut<ComplexValue> for Entity {
    fn borrow_mut(&mut self) -> &mut ComplexValue {
        &mut self.0
    }
}

impl From<Entity> for ComplexValue {
    fn from(entity: Entity) -> Self {
        entity.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Property;
    use odata_types::PrimitiveType;
    use serde_json::json;

    fn airport() -> Arc<ComplexType> {
        let mut ty = ComplexType::entity("airline.Airport")
            .with_key("code")
            .with_property(Property::declared("code", PrimitiveType::String))
            .unwrap()
            .with_property(Property::declared("name", PrimitiveType::String))
            .unwrap();
        ty.seal();
        Arc::new(ty)
    }

    #[test]
    fn test_entity_id_quotes_strings() {
        let raw = json!({"code": "O'H", "name": "O'Hare"});
        let entity = Entity::from_source(airport(), "airports", Source::from_json(&raw).unwrap()).unwrap();
        assert_eq!(entity.id().as_deref(), Some("airports('O''H')"));
        assert_eq!(entity.key(), Some(&Primitive::string("O'H")));
    }

    #[test]
    fn test_numeric_key_literal() {
        assert_eq!(key_literal(&Primitive::Int32(7)), "7");
        assert_eq!(key_literal(&Primitive::Int64(7)), "7");
    }

    #[test]
    fn test_requires_entity_type() {
        let err = Entity::new(ComplexType::untyped()).unwrap_err();
        assert_eq!(err.code().slug(), "invalid_key");
    }
}
