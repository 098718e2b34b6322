//! EDM primitive type descriptors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// EDM primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    #[serde(rename = "Edm.Boolean")]
    Boolean,
    #[serde(rename = "Edm.Byte")]
    Byte,
    #[serde(rename = "Edm.SByte")]
    SByte,
    #[serde(rename = "Edm.Int16")]
    Int16,
    #[serde(rename = "Edm.Int32")]
    Int32,
    #[serde(rename = "Edm.Int64")]
    Int64,
    #[serde(rename = "Edm.Single")]
    Single,
    #[serde(rename = "Edm.Double")]
    Double,
    #[serde(rename = "Edm.Decimal")]
    Decimal,
    #[serde(rename = "Edm.String")]
    String,
    #[serde(rename = "Edm.Guid")]
    Guid,
    #[serde(rename = "Edm.Date")]
    Date,
    #[serde(rename = "Edm.DateTimeOffset")]
    DateTimeOffset,
    #[serde(rename = "Edm.TimeOfDay")]
    TimeOfDay,
    #[serde(rename = "Edm.Binary")]
    Binary,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 15] = [
        Self::Boolean,
        Self::Byte,
        Self::SByte,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Single,
        Self::Double,
        Self::Decimal,
        Self::String,
        Self::Guid,
        Self::Date,
        Self::DateTimeOffset,
        Self::TimeOfDay,
        Self::Binary,
    ];

    /// Get the qualified EDM name
    pub const fn qualified_name(&self) -> &'static str {
        match self {
            Self::Boolean => "Edm.Boolean",
            Self::Byte => "Edm.Byte",
            Self::SByte => "Edm.SByte",
            Self::Int16 => "Edm.Int16",
            Self::Int32 => "Edm.Int32",
            Self::Int64 => "Edm.Int64",
            Self::Single => "Edm.Single",
            Self::Double => "Edm.Double",
            Self::Decimal => "Edm.Decimal",
            Self::String => "Edm.String",
            Self::Guid => "Edm.Guid",
            Self::Date => "Edm.Date",
            Self::DateTimeOffset => "Edm.DateTimeOffset",
            Self::TimeOfDay => "Edm.TimeOfDay",
            Self::Binary => "Edm.Binary",
        }
    }

    /// Get the simple name (without the `Edm.` namespace)
    pub fn name(&self) -> &'static str {
        &self.qualified_name()[4..]
    }

    /// Look up a type by qualified or simple name
    pub fn from_name(name: &str) -> Option<Self> {
        let simple = name.strip_prefix("Edm.").unwrap_or(name);
        Self::ALL.into_iter().find(|t| t.name() == simple)
    }

    /// Check if this type is an integral type
    pub const fn is_integral(&self) -> bool {
        matches!(
            self,
            Self::Byte | Self::SByte | Self::Int16 | Self::Int32 | Self::Int64
        )
    }

    /// Check if this type is numeric
    pub const fn is_numeric(&self) -> bool {
        self.is_integral() || matches!(self, Self::Single | Self::Double | Self::Decimal)
    }

    /// Check if values of this type are represented natively by JSON
    ///
    /// Values of other types need a `@odata.type` annotation to be read back unambiguously.
    pub const fn is_json_native(&self) -> bool {
        matches!(
            self,
            Self::Boolean | Self::String | Self::Int32 | Self::Double
        )
    }

    /// Check if values of this type participate in ETag computation
    pub const fn is_etag_eligible(&self) -> bool {
        !matches!(self, Self::Binary)
    }

    /// Integer range accepted by integral types
    pub const fn integral_range(&self) -> Option<(i64, i64)> {
        match self {
            Self::Byte => Some((u8::MIN as i64, u8::MAX as i64)),
            Self::SByte => Some((i8::MIN as i64, i8::MAX as i64)),
            Self::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            Self::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            Self::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}

impl FromStr for PrimitiveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown primitive type: {}", s))
    }
}
