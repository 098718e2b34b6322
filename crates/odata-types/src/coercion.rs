//! Coercion of raw JSON input into declared primitive types

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use chrono::{DateTime, NaiveDate, NaiveTime};
use odata_diagnostics::{ODataError, Result};
use rust_decimal::Decimal;
use serde_json::Value as Json;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Primitive, PrimitiveType};

impl PrimitiveType {
    /// Canonical constructor from a raw JSON value
    ///
    /// `null` yields `Ok(None)`. Any shape the type does not accept, and any
    /// integer outside the type's range, is an `invalid_value` source error.
    pub fn instance(&self, raw: &Json) -> Result<Option<Primitive>> {
        if raw.is_null() {
            return Ok(None);
        }
        let invalid = || ODataError::invalid_value(self.qualified_name(), raw);

        let value = match self {
            Self::Boolean => raw.as_bool().map(Primitive::Boolean),
            Self::Byte | Self::SByte | Self::Int16 | Self::Int32 | Self::Int64 => {
                let int = integral(raw, *self == Self::Int64).ok_or_else(invalid)?;
                let (min, max) = self.integral_range().ok_or_else(invalid)?;
                if int < min || int > max {
                    return Err(invalid());
                }
                // Range checked above
                match self {
                    Self::Byte => Some(Primitive::Byte(int as u8)),
                    Self::SByte => Some(Primitive::SByte(int as i8)),
                    Self::Int16 => Some(Primitive::Int16(int as i16)),
                    Self::Int32 => Some(Primitive::Int32(int as i32)),
                    _ => Some(Primitive::Int64(int)),
                }
            }
            Self::Single => floating(raw).map(|v| Primitive::Single(v as f32)),
            Self::Double => floating(raw).map(Primitive::Double),
            Self::Decimal => decimal(raw),
            Self::String => raw.as_str().map(Primitive::string),
            Self::Guid => raw
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(Primitive::Guid),
            Self::Date => raw.as_str().and_then(parse_date).map(Primitive::Date),
            Self::DateTimeOffset => raw
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(Primitive::DateTimeOffset),
            Self::TimeOfDay => raw.as_str().and_then(parse_time).map(Primitive::TimeOfDay),
            Self::Binary => raw.as_str().and_then(parse_binary).map(Primitive::Binary),
        };

        value.map(Some).ok_or_else(invalid)
    }
}

/// Infer a primitive value for a dynamic property from raw JSON
///
/// Returns `None` for null, arrays and objects.
pub fn infer_primitive(raw: &Json) -> Option<Primitive> {
    match raw {
        Json::Bool(b) => Some(Primitive::Boolean(*b)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(match i32::try_from(i) {
                    Ok(small) => Primitive::Int32(small),
                    Err(_) => Primitive::Int64(i),
                })
            } else {
                n.as_f64().map(Primitive::Double)
            }
        }
        Json::String(s) => Some(Primitive::String(s.clone())),
        _ => None,
    }
}

fn integral(raw: &Json, accept_string: bool) -> Option<i64> {
    match raw {
        Json::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then_some(f as i64)
        }),
        Json::String(s) if accept_string => s.trim().parse().ok(),
        _ => None,
    }
}

fn floating(raw: &Json) -> Option<f64> {
    match raw {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "INF" => Some(f64::INFINITY),
            "-INF" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

fn decimal(raw: &Json) -> Option<Primitive> {
    let text = match raw {
        Json::Number(n) => n.to_string(),
        Json::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .map(Primitive::Decimal)
}

/// Parse an `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse a `HH:MM[:SS[.fffffff]]` time of day
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

fn parse_binary(s: &str) -> Option<Vec<u8>> {
    URL_SAFE
        .decode(s)
        .or_else(|_| URL_SAFE_NO_PAD.decode(s))
        .or_else(|_| STANDARD.decode(s))
        .ok()
}
