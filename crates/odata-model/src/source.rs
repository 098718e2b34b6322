//! Source record adapters for populating values

use odata_diagnostics::{ODataError, Result};
use serde_json::{Map, Value as Json};
use std::collections::HashMap;

/// A generic object that can be read property by property
pub trait SourceObject {
    /// Raw value of the named property, `None` when absent
    fn property(&self, name: &str) -> Option<Json>;
}

impl SourceObject for HashMap<String, Json> {
    fn property(&self, name: &str) -> Option<Json> {
        self.get(name).cloned()
    }
}

impl SourceObject for Map<String, Json> {
    fn property(&self, name: &str) -> Option<Json> {
        self.get(name).cloned()
    }
}

/// A raw source record handed over by a data provider
///
/// A mapping only contributes the keys it carries; an object is asked for every
/// declared property, and absent properties become null.
#[derive(Clone, Copy)]
pub enum Source<'a> {
    Mapping(&'a Map<String, Json>),
    Object(&'a dyn SourceObject),
}

impl<'a> Source<'a> {
    /// Adapt a JSON value; anything but an object is rejected
    pub fn from_json(value: &'a Json) -> Result<Self> {
        match value {
            Json::Object(map) => Ok(Self::Mapping(map)),
            other => Err(ODataError::unsupported_source(shape_name(other))),
        }
    }
}

fn shape_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
