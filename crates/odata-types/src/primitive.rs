//! Primitive values - runtime representation of EDM primitive values

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SecondsFormat};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

use crate::PrimitiveType;

/// A primitive EDM value
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    String(String),
    Guid(Uuid),
    Date(NaiveDate),
    DateTimeOffset(DateTime<FixedOffset>),
    TimeOfDay(NaiveTime),
    Binary(Vec<u8>),
}

impl Primitive {
    // === Constructors ===

    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    pub fn int32(i: i32) -> Self {
        Self::Int32(i)
    }

    pub fn int64(i: i64) -> Self {
        Self::Int64(i)
    }

    pub fn boolean(b: bool) -> Self {
        Self::Boolean(b)
    }

    pub fn decimal(d: Decimal) -> Self {
        Self::Decimal(d)
    }

    /// Get the EDM type of this value
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            Self::Boolean(_) => PrimitiveType::Boolean,
            Self::Byte(_) => PrimitiveType::Byte,
            Self::SByte(_) => PrimitiveType::SByte,
            Self::Int16(_) => PrimitiveType::Int16,
            Self::Int32(_) => PrimitiveType::Int32,
            Self::Int64(_) => PrimitiveType::Int64,
            Self::Single(_) => PrimitiveType::Single,
            Self::Double(_) => PrimitiveType::Double,
            Self::Decimal(_) => PrimitiveType::Decimal,
            Self::String(_) => PrimitiveType::String,
            Self::Guid(_) => PrimitiveType::Guid,
            Self::Date(_) => PrimitiveType::Date,
            Self::DateTimeOffset(_) => PrimitiveType::DateTimeOffset,
            Self::TimeOfDay(_) => PrimitiveType::TimeOfDay,
            Self::Binary(_) => PrimitiveType::Binary,
        }
    }

    // === Accessors ===

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as a 64-bit integer (integral types only)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(*v as i64),
            Self::SByte(v) => Some(*v as i64),
            Self::Int16(v) => Some(*v as i64),
            Self::Int32(v) => Some(*v as i64),
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as a double (any numeric type)
    pub fn as_f64(&self) -> Option<f64> {
        self.numeric().map(|n| n.to_f64())
    }

    /// Numeric view of this value, if it is numeric
    pub fn numeric(&self) -> Option<Numeric> {
        match self {
            Self::Single(v) => Some(Numeric::Double(*v as f64)),
            Self::Double(v) => Some(Numeric::Double(*v)),
            Self::Decimal(v) => Some(Numeric::Decimal(*v)),
            other => other.as_i64().map(Numeric::Integer),
        }
    }

    /// Render as a JSON value using the OData JSON representation
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Boolean(b) => Json::Bool(*b),
            Self::Byte(_) | Self::SByte(_) | Self::Int16(_) | Self::Int32(_) | Self::Int64(_) => {
                self.as_i64().map(Json::from).unwrap_or(Json::Null)
            }
            Self::Single(v) => float_to_json(*v as f64),
            Self::Double(v) => float_to_json(*v),
            Self::Decimal(d) => {
                if d.scale() == 0 {
                    if let Some(i) = d.to_i64() {
                        return Json::from(i);
                    }
                }
                d.to_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Json::Number)
                    .unwrap_or_else(|| Json::String(d.to_string()))
            }
            other => Json::String(other.to_string()),
        }
    }

    /// Canonical hashing input for ETag computation
    ///
    /// `None` for types that do not participate in ETags.
    pub fn etag_canonical(&self) -> Option<String> {
        let ty = self.primitive_type();
        ty.is_etag_eligible()
            .then(|| format!("{}:{}", ty.qualified_name(), self))
    }

    /// Compare two values
    ///
    /// Numeric values compare across types after promotion; other values only
    /// compare with values of the same type. Returns `None` when not comparable.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.numeric(), other.numeric()) {
            return a.compare(&b);
        }

        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Guid(a), Self::Guid(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::DateTimeOffset(a), Self::DateTimeOffset(b)) => Some(a.cmp(b)),
            (Self::TimeOfDay(a), Self::TimeOfDay(b)) => Some(a.cmp(b)),
            (Self::Binary(a), Self::Binary(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Value equality with numeric promotion
    pub fn equals(&self, other: &Self) -> Option<bool> {
        self.compare(other).map(|o| o == Ordering::Equal)
    }
}

fn float_to_json(v: f64) -> serde_json::Value {
    match serde_json::Number::from_f64(v) {
        Some(n) => serde_json::Value::Number(n),
        None if v.is_nan() => serde_json::Value::String("NaN".into()),
        None if v > 0.0 => serde_json::Value::String("INF".into()),
        None => serde_json::Value::String("-INF".into()),
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        write!(f, "NaN")
    } else if v.is_infinite() {
        write!(f, "{}", if v > 0.0 { "INF" } else { "-INF" })
    } else {
        write!(f, "{}", v)
    }
}

/// Wire text of the value (unquoted)
impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Byte(v) => write!(f, "{}", v),
            Self::SByte(v) => write!(f, "{}", v),
            Self::Int16(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::Single(v) => write_float(f, *v as f64),
            Self::Double(v) => write_float(f, *v),
            Self::Decimal(d) => write!(f, "{}", d),
            Self::String(s) => write!(f, "{}", s),
            Self::Guid(g) => write!(f, "{}", g.hyphenated()),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTimeOffset(dt) => {
                write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::TimeOfDay(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Self::Binary(bytes) => write!(f, "{}", URL_SAFE.encode(bytes)),
        }
    }
}

/// Numeric value after promotion
///
/// Promotion order: integer < decimal < double.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Integer(i64),
    Decimal(Decimal),
    Double(f64),
}

impl Numeric {
    pub fn to_f64(&self) -> f64 {
        match self {
            Self::Integer(i) => *i as f64,
            Self::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
            Self::Double(v) => *v,
        }
    }

    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Integer(i) => Some(Decimal::from(*i)),
            Self::Decimal(d) => Some(*d),
            Self::Double(v) => Decimal::from_f64(*v),
        }
    }

    /// Promote both operands to a common representation
    pub fn promote(self, other: Self) -> (Self, Self) {
        match (self, other) {
            (Self::Integer(_), Self::Integer(_))
            | (Self::Decimal(_), Self::Decimal(_))
            | (Self::Double(_), Self::Double(_)) => (self, other),
            (Self::Double(_), _) | (_, Self::Double(_)) => {
                (Self::Double(self.to_f64()), Self::Double(other.to_f64()))
            }
            // Only integer/decimal mixes remain, both convert losslessly
            _ => (
                Self::Decimal(self.to_decimal().unwrap_or_default()),
                Self::Decimal(other.to_decimal().unwrap_or_default()),
            ),
        }
    }

    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match self.promote(*other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(&b)),
            (Self::Decimal(a), Self::Decimal(b)) => Some(a.cmp(&b)),
            (Self::Double(a), Self::Double(b)) => a.partial_cmp(&b),
            _ => None,
        }
    }

    pub fn into_primitive(self) -> Primitive {
        match self {
            Self::Integer(i) => Primitive::Int64(i),
            Self::Decimal(d) => Primitive::Decimal(d),
            Self::Double(v) => Primitive::Double(v),
        }
    }
}

impl From<bool> for Primitive {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i32> for Primitive {
    fn from(i: i32) -> Self {
        Self::Int32(i)
    }
}

impl From<i64> for Primitive {
    fn from(i: i64) -> Self {
        Self::Int64(i)
    }
}

impl From<f64> for Primitive {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<Decimal> for Primitive {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<&str> for Primitive {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Primitive {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Uuid> for Primitive {
    fn from(g: Uuid) -> Self {
        Self::Guid(g)
    }
}

impl From<NaiveDate> for Primitive {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_comparison_promotes() {
        let a = Primitive::Int32(3);
        let b = Primitive::Decimal(Decimal::new(35, 1));
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert_eq!(Primitive::Int64(2).equals(&Primitive::Double(2.0)), Some(true));
    }

    #[test]
    fn test_incomparable() {
        assert_eq!(Primitive::string("1").compare(&Primitive::Int32(1)), None);
        assert_eq!(Primitive::Boolean(true).compare(&Primitive::Int32(1)), None);
    }

    #[test]
    fn test_wire_text() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Primitive::Date(date).to_string(), "2024-02-29");

        let time = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        assert_eq!(Primitive::TimeOfDay(time).to_string(), "09:05:00");

        let dto = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z").unwrap();
        assert_eq!(Primitive::DateTimeOffset(dto).to_string(), "2024-01-02T03:04:05Z");

        assert_eq!(Primitive::Binary(vec![0xfb, 0xff]).to_string(), "-_8=");
    }

    #[test]
    fn test_json_representation() {
        assert_eq!(Primitive::Int64(7).to_json(), serde_json::json!(7));
        assert_eq!(Primitive::Double(f64::NAN).to_json(), serde_json::json!("NaN"));
        assert_eq!(
            Primitive::Decimal(Decimal::new(125, 2)).to_json(),
            serde_json::json!(1.25)
        );
        assert_eq!(Primitive::Decimal(Decimal::from(4)).to_json(), serde_json::json!(4));
    }

    #[test]
    fn test_etag_canonical() {
        assert_eq!(
            Primitive::string("LHR").etag_canonical().as_deref(),
            Some("Edm.String:LHR")
        );
        assert_eq!(Primitive::Binary(vec![1, 2]).etag_canonical(), None);
    }
}
