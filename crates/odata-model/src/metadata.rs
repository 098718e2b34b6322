//! Control and custom metadata attached to values

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;
use std::str::FromStr;

use crate::value::{ComplexValue, PropertyValue, Value};

/// Amount of control metadata requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataLevel {
    None,
    #[default]
    Minimal,
    Full,
}

impl fmt::Display for MetadataLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Minimal => write!(f, "minimal"),
            Self::Full => write!(f, "full"),
        }
    }
}

impl FromStr for MetadataLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "minimal" => Ok(Self::Minimal),
            "full" => Ok(Self::Full),
            other => Err(format!("Unknown metadata level: {}", other)),
        }
    }
}

/// Ordered metadata entries for one value, filtered by metadata level
///
/// Control words (`type`, `id`, `etag`, ...) render as `<prefix>@odata.<word>`;
/// custom entries render as `<prefix>@<key>` and are kept at every level.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataContainer {
    level: MetadataLevel,
    prefix: String,
    entries: IndexMap<String, Json>,
}

impl MetadataContainer {
    pub fn new(level: MetadataLevel) -> Self {
        Self {
            level,
            prefix: String::new(),
            entries: IndexMap::new(),
        }
    }

    /// Container for the metadata of a named property
    pub fn for_property(level: MetadataLevel, name: &str) -> Self {
        Self {
            prefix: name.to_string(),
            ..Self::new(level)
        }
    }

    pub fn level(&self) -> MetadataLevel {
        self.level
    }

    /// Insert a control word that is only kept at `required` level and above
    pub fn insert(&mut self, word: &str, value: Json, required: MetadataLevel) -> &mut Self {
        if self.level >= required {
            self.entries
                .insert(format!("{}@odata.{}", self.prefix, word), value);
        }
        self
    }

    /// Insert a custom entry, kept at every level
    pub fn insert_custom(&mut self, key: &str, value: Json) -> &mut Self {
        let key = key.strip_prefix('@').unwrap_or(key);
        self.entries.insert(format!("{}@{}", self.prefix, key), value);
        self
    }

    pub fn has_properties(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Rendered key/value pairs in insertion order
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Json)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, rendered_key: &str) -> Option<&Json> {
        self.entries.get(rendered_key)
    }
}

impl ComplexValue {
    /// Instance-level metadata for the given level
    pub fn metadata(&self, level: MetadataLevel) -> MetadataContainer {
        let mut metadata = MetadataContainer::new(level);
        let ty = self.complex_type();

        if !ty.is_untyped() {
            metadata.insert("type", Json::String(format!("#{}", ty.name())), MetadataLevel::Full);
        }

        if ty.is_entity() {
            let id_level = if self.uses_references() {
                MetadataLevel::None
            } else {
                MetadataLevel::Minimal
            };
            if let Some(id) = self.entity_id() {
                metadata.insert("id", Json::String(id), id_level);
            }
            if !self.uses_references() {
                metadata.insert("etag", Json::String(self.etag()), MetadataLevel::Minimal);
            }
        }

        for (key, value) in self.custom_metadata() {
            metadata.insert_custom(key, value.clone());
        }
        metadata
    }
}

impl PropertyValue {
    /// Property-level metadata for the given level
    ///
    /// Primitive values whose type JSON cannot carry natively get a type
    /// annotation: always at full level, and at minimal level for dynamic properties.
    pub fn metadata(&self, level: MetadataLevel) -> MetadataContainer {
        let mut metadata = MetadataContainer::for_property(level, self.name());

        if let Some(Value::Primitive(p)) = self.value() {
            let ty = p.primitive_type();
            if !ty.is_json_native() {
                let required = if self.property().is_dynamic() {
                    MetadataLevel::Minimal
                } else {
                    MetadataLevel::Full
                };
                metadata.insert("type", Json::String(format!("#{}", ty.name())), required);
            }
        }

        for (key, value) in self.custom_metadata() {
            metadata.insert_custom(key, value.clone());
        }
        metadata
    }
}
