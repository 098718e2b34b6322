//! Record sources
//!
//! A [`RecordSource`] hands raw JSON records of an entity set to the service.
//! It may also answer `$search` terms natively and resolve expanded
//! navigation properties.

use odata_diagnostics::{ODATA0302, ODataError, Result};
use odata_emit::{NavigationRequest, NavigationResolver};
use odata_eval::SearchHandler;
use odata_model::{ComplexType, ComplexValue, Property, Schema, Source, Value};
use parking_lot::RwLock;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Data provider collaborator
pub trait RecordSource {
    /// Every raw record of an entity set, in provider order
    fn records(&self, entity_set: &str) -> Result<Vec<Json>>;

    /// Native `$search` support, consulted before the default match
    fn search_handler(&self) -> Option<&dyn SearchHandler> {
        None
    }

    /// Resolver for expanded navigation properties
    fn navigation_resolver(&self) -> Option<&dyn NavigationResolver> {
        None
    }
}

/// Record source over JSON records held in memory
///
/// Related entities are read from the parent record inline: the record of a
/// flight carries its `pilot` object or its `crew` array under the navigation
/// property's name.
pub struct InMemoryProvider {
    schema: Arc<Schema>,
    sets: RwLock<HashMap<String, Vec<Json>>>,
}

impl InMemoryProvider {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            sets: RwLock::new(HashMap::new()),
        }
    }

    /// Load records from a JSON object mapping entity set names to arrays
    pub fn from_json(schema: Arc<Schema>, data: &Json) -> Result<Self> {
        let Json::Object(sets) = data else {
            return Err(ODataError::unsupported_source("non-object data document"));
        };
        let provider = Self::new(schema);
        for (entity_set, records) in sets {
            let Json::Array(records) = records else {
                return Err(ODataError::unsupported_source(&format!("non-array records of \"{}\"", entity_set)));
            };
            provider.extend(entity_set, records.iter().cloned())?;
        }
        Ok(provider)
    }

    /// Load records from a JSON file
    pub fn from_file(schema: Arc<Schema>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ODataError::io(&e).with_context(path.display().to_string()))?;
        let data: Json = serde_json::from_str(&text)
            .map_err(|e| ODataError::unsupported_source(&format!("invalid JSON in {}: {}", path.display(), e)))?;
        Self::from_json(schema, &data)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Append one record to a registered entity set
    pub fn insert(&self, entity_set: &str, record: Json) -> Result<()> {
        self.extend(entity_set, std::iter::once(record))
    }

    /// Append records to a registered entity set
    pub fn extend(&self, entity_set: &str, records: impl IntoIterator<Item = Json>) -> Result<()> {
        self.schema.require_entity_set(entity_set)?;
        let records: Vec<Json> = records.into_iter().collect();
        if let Some(bad) = records.iter().find(|r| !r.is_object()) {
            return Err(ODataError::unsupported_source(&format!("record {}", bad)));
        }
        log::debug!("Loaded {} record(s) into {}", records.len(), entity_set);
        self.sets.write().entry(entity_set.to_string()).or_default().extend(records);
        Ok(())
    }

    /// Number of records held for an entity set
    pub fn len(&self, entity_set: &str) -> usize {
        self.sets.read().get(entity_set).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.sets.read().values().all(Vec::is_empty)
    }

    /// The stored record behind an entity, found by entity set and key
    fn record_of(&self, value: &ComplexValue) -> Option<Json> {
        let entity_set = value.entity_set()?;
        let key = value.key_value()?;
        let key_property = value.complex_type().key_property()?.clone();

        let sets = self.sets.read();
        sets.get(entity_set)?
            .iter()
            .find(|record| {
                record
                    .get(key_property.name())
                    .and_then(|raw| key_property.value_type().instance(raw).ok().flatten())
                    .as_ref()
                    .and_then(Value::as_primitive)
                    == Some(key)
            })
            .cloned()
    }
}

fn related_value(target: &Arc<ComplexType>, target_set: Option<&str>, record: &Json) -> Result<Value> {
    let mut value = ComplexValue::with_type(target.clone());
    if let Some(set) = target_set {
        value.set_entity_set(set);
    }
    value.from_source(Source::from_json(record)?)?;
    Ok(Value::Complex(value))
}

impl RecordSource for InMemoryProvider {
    fn records(&self, entity_set: &str) -> Result<Vec<Json>> {
        self.schema.require_entity_set(entity_set)?;
        Ok(self.sets.read().get(entity_set).cloned().unwrap_or_default())
    }

    fn navigation_resolver(&self) -> Option<&dyn NavigationResolver> {
        Some(self)
    }
}

impl NavigationResolver for InMemoryProvider {
    fn resolve(
        &self,
        parent: &ComplexValue,
        property: &Property,
        _request: &NavigationRequest,
    ) -> Result<Option<Value>> {
        let Some(binding) = property.navigation_binding() else {
            return Ok(None);
        };
        let target = self
            .schema
            .get_type(&binding.target_type)
            .cloned()
            .ok_or_else(|| ODataError::unknown_type(&binding.target_type))?;

        let Some(inline) = self
            .record_of(parent)
            .and_then(|mut record| record.get_mut(property.name()).map(Json::take))
        else {
            log::trace!("No inline {} for {:?}", property.name(), parent.entity_id());
            return Ok(None);
        };

        let target_set = binding.target_set.as_deref();
        match (binding.collection, inline) {
            (_, Json::Null) => Ok(None),
            (true, Json::Array(records)) => records
                .iter()
                .map(|record| related_value(&target, target_set, record))
                .collect::<Result<Vec<_>>>()
                .map(|values| Some(Value::Collection(values))),
            (false, record @ Json::Object(_)) => related_value(&target, target_set, &record).map(Some),
            (_, other) => Err(ODataError::source(
                ODATA0302,
                format!(
                    "The inline value of navigation property \"{}\" has the wrong shape: {}",
                    property.name(),
                    other
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_model::{NavigationBinding, SchemaBuilder};
    use odata_types::PrimitiveType;
    use serde_json::json;

    fn schema() -> Arc<Schema> {
        let mut builder = SchemaBuilder::new("airline");
        builder
            .add_type(
                ComplexType::entity("airline.Pilot")
                    .with_key("id")
                    .with_property(Property::declared("id", PrimitiveType::Int32))
                    .unwrap(),
            )
            .unwrap();
        builder
            .add_type(
                ComplexType::entity("airline.Flight")
                    .with_key("id")
                    .with_property(Property::declared("id", PrimitiveType::Int32))
                    .unwrap()
                    .with_property(Property::navigation(
                        "pilot",
                        NavigationBinding::new("airline.Pilot").target_set("pilots"),
                    ))
                    .unwrap(),
            )
            .unwrap();
        builder.add_entity_set("flights", "airline.Flight").unwrap();
        builder.add_entity_set("pilots", "airline.Pilot").unwrap();
        Arc::new(builder.build().unwrap())
    }

    #[test]
    fn test_records_of_unknown_set() {
        let provider = InMemoryProvider::new(schema());
        let err = provider.records("gates").unwrap_err();
        assert_eq!(err.code().slug(), "unknown_entity_set");
    }

    #[test]
    fn test_rejects_non_object_records() {
        let provider = InMemoryProvider::new(schema());
        assert!(provider.insert("flights", json!([1, 2])).is_err());
        assert!(provider.is_empty());
        provider.insert("flights", json!({"id": 1})).unwrap();
        assert_eq!(provider.len("flights"), 1);
    }

    #[test]
    fn test_from_json_shape() {
        assert!(InMemoryProvider::from_json(schema(), &json!([])).is_err());
        assert!(InMemoryProvider::from_json(schema(), &json!({"flights": {}})).is_err());
        let provider = InMemoryProvider::from_json(schema(), &json!({"flights": [{"id": 1}, {"id": 2}]})).unwrap();
        assert_eq!(provider.len("flights"), 2);
        assert_eq!(provider.len("pilots"), 0);
    }
}
