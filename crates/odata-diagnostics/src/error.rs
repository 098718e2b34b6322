//! OData error types

use crate::{
    ErrorCode, ODATA0001, ODATA0100, ODATA0101, ODATA0102, ODATA0103, ODATA0105, ODATA0108,
    ODATA0109, ODATA0200, ODATA0201, ODATA0202, ODATA0211, ODATA0300, ODATA0301, ODATA0400,
    ODATA0401, SourceLocation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Broad error category, used by the request layer to pick a transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed query expression
    Parse,
    /// Schema violation (unknown/duplicate property, sealed type mutation)
    Schema,
    /// Client request that does not fit the schema
    RequestValidation,
    /// Collaborator handed over data of an unsupported shape
    SourceConversion,
    /// I/O and configuration failures
    System,
}

impl ErrorKind {
    /// HTTP-like status code for this kind
    pub const fn status(&self) -> u16 {
        match self {
            Self::Parse | Self::RequestValidation => 400,
            Self::Schema | Self::SourceConversion | Self::System => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "parse"),
            Self::Schema => write!(f, "schema"),
            Self::RequestValidation => write!(f, "request"),
            Self::SourceConversion => write!(f, "source"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Main OData error type
#[derive(Debug, Clone, Error)]
pub enum ODataError {
    /// Query expression parse error
    #[error("{code}: {message}")]
    Parse {
        code: ErrorCode,
        message: String,
        expression: String,
        location: Option<SourceLocation>,
    },

    /// Schema error (never retried)
    #[error("{code}: {message}")]
    Schema { code: ErrorCode, message: String },

    /// Request validation error, detected before output is committed
    #[error("{code}: {message}")]
    RequestValidation {
        code: ErrorCode,
        message: String,
        target: Option<String>,
    },

    /// Source conversion error
    #[error("{code}: {message}")]
    SourceConversion { code: ErrorCode, message: String },

    /// System error
    #[error("{code}: {message}")]
    System {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },
}

impl ODataError {
    /// Create a parse error
    pub fn parse(code: ErrorCode, message: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::Parse {
            code,
            message: message.into(),
            expression: expression.into(),
            location: None,
        }
    }

    /// Create a parse error with location
    pub fn parse_at(
        code: ErrorCode,
        message: impl Into<String>,
        expression: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self::Parse {
            code,
            message: message.into(),
            expression: expression.into(),
            location: Some(location),
        }
    }

    /// Create a schema error
    pub fn schema(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Schema {
            code,
            message: message.into(),
        }
    }

    /// Create a request validation error
    pub fn request(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::RequestValidation {
            code,
            message: message.into(),
            target: None,
        }
    }

    /// Create a request validation error pointing at a request element
    pub fn request_at(code: ErrorCode, message: impl Into<String>, target: impl Into<String>) -> Self {
        Self::RequestValidation {
            code,
            message: message.into(),
            target: Some(target.into()),
        }
    }

    /// Create a source conversion error
    pub fn source(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::SourceConversion {
            code,
            message: message.into(),
        }
    }

    /// Create a system error
    pub fn system(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::System {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Attach context to a system error; other kinds are returned unchanged
    pub fn with_context(self, context: impl Into<String>) -> Self {
        match self {
            Self::System { code, message, .. } => Self::System {
                code,
                message,
                context: Some(context.into()),
            },
            other => other,
        }
    }

    // === Frequently raised errors ===

    /// Property name not declared on the type
    pub fn no_such_property(type_name: &str, property: &str) -> Self {
        Self::schema(
            ODATA0100,
            format!("The type \"{}\" has no property named \"{}\"", type_name, property),
        )
    }

    /// Property already bound on a value or declared on a type
    pub fn duplicate_property(owner: &str, property: &str) -> Self {
        Self::schema(
            ODATA0101,
            format!("The property \"{}\" is already present on \"{}\"", property, owner),
        )
    }

    /// Mutation of a sealed type
    pub fn type_sealed(type_name: &str) -> Self {
        Self::schema(
            ODATA0102,
            format!("The type \"{}\" is sealed and cannot be modified", type_name),
        )
    }

    /// Reference to a type that is not registered
    pub fn unknown_type(type_name: &str) -> Self {
        Self::schema(ODATA0103, format!("The type \"{}\" is not registered", type_name))
    }

    /// Attaching a property value that already belongs to another value
    pub fn already_owned(property: &str) -> Self {
        Self::schema(
            ODATA0105,
            format!(
                "The value of property \"{}\" already belongs to another instance and must be detached first",
                property
            ),
        )
    }

    /// Reference to an entity set that is not registered
    pub fn unknown_entity_set(name: &str) -> Self {
        Self::schema(ODATA0108, format!("The entity set \"{}\" is not registered", name))
    }

    /// Replacing the value of a property that was never bound
    pub fn property_not_bound(property: &str) -> Self {
        Self::schema(
            ODATA0109,
            format!("The property \"{}\" has no value to replace", property),
        )
    }

    /// Expand path that names no navigation property
    pub fn unknown_expand_path(path: &str) -> Self {
        Self::request_at(
            ODATA0200,
            format!(
                "The requested expand path \"{}\" does not exist on this entity type",
                path
            ),
            path,
        )
    }

    /// Expand path that exists but is not marked expandable
    pub fn not_expandable(path: &str) -> Self {
        Self::request_at(
            ODATA0201,
            format!(
                "The requested path \"{}\" is not available for expansion on this entity type",
                path
            ),
            path,
        )
    }

    /// Select path that names no property
    pub fn invalid_select(path: &str) -> Self {
        Self::request_at(
            ODATA0202,
            format!("The requested select property \"{}\" does not exist on this type", path),
            path,
        )
    }

    /// Unsupported input shape handed to the value model
    pub fn unsupported_source(shape: &str) -> Self {
        Self::source(
            ODATA0300,
            format!(
                "The provided source ({}) could not be converted to an entity",
                shape
            ),
        )
    }

    /// Raw value that cannot be coerced into the declared type
    pub fn invalid_value(type_name: &str, raw: impl fmt::Display) -> Self {
        Self::source(
            ODATA0301,
            format!("The value {} cannot be converted to {}", raw, type_name),
        )
    }

    /// Generic syntax error in a query expression
    pub fn syntax(message: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::parse(ODATA0001, message, expression)
    }

    /// I/O failure
    pub fn io(error: &std::io::Error) -> Self {
        Self::system(ODATA0401, error.to_string())
    }

    /// Internal invariant failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::system(ODATA0400, message)
    }

    // === Accessors ===

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse { code, .. }
            | Self::Schema { code, .. }
            | Self::RequestValidation { code, .. }
            | Self::SourceConversion { code, .. }
            | Self::System { code, .. } => *code,
        }
    }

    /// Get the error category
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Schema { .. } => ErrorKind::Schema,
            Self::RequestValidation { .. } => ErrorKind::RequestValidation,
            Self::SourceConversion { .. } => ErrorKind::SourceConversion,
            Self::System { .. } => ErrorKind::System,
        }
    }

    /// Transport status code
    ///
    /// The kind's status, except a missing entity (`entity_not_found`), which
    /// is 404.
    pub fn status(&self) -> u16 {
        if self.code() == ODATA0211 {
            return 404;
        }
        self.kind().status()
    }

    /// Human-readable message without the code prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Parse { message, .. }
            | Self::Schema { message, .. }
            | Self::RequestValidation { message, .. }
            | Self::SourceConversion { message, .. }
            | Self::System { message, .. } => message,
        }
    }

    /// Get the location if available
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Parse { location, .. } => location.as_ref(),
            _ => None,
        }
    }

    /// Check whether this is a client error
    pub fn is_client_error(&self) -> bool {
        self.status() < 500
    }

    /// Convert to the protocol error envelope
    pub fn to_envelope(&self) -> ErrorEnvelope {
        let target = match self {
            Self::RequestValidation { target, .. } => target.clone(),
            Self::Parse { expression, .. } => Some(expression.clone()),
            _ => None,
        };
        let details = match self {
            Self::Parse {
                location: Some(location),
                ..
            } => vec![ErrorDetail {
                code: self.code().to_string(),
                message: format!("at {}", location),
                target: None,
            }],
            Self::System {
                context: Some(context),
                ..
            } => vec![ErrorDetail {
                code: self.code().to_string(),
                message: context.clone(),
                target: None,
            }],
            _ => Vec::new(),
        };

        ErrorEnvelope {
            error: ErrorBody {
                code: self.code().slug().to_string(),
                message: self.message().to_string(),
                target,
                details,
            },
        }
    }
}

impl From<std::io::Error> for ODataError {
    fn from(error: std::io::Error) -> Self {
        Self::io(&error)
    }
}

/// Protocol error envelope: `{"error": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// Body of the error envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Request element the error refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Nested details
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub details: Vec<ErrorDetail>,
}

/// Additional error detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl ErrorEnvelope {
    /// Render as a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_errors_are_client_errors() {
        let err = ODataError::unknown_expand_path("nonexistentNav");
        assert_eq!(err.kind(), ErrorKind::RequestValidation);
        assert_eq!(err.status(), 400);
        assert_eq!(err.code(), ODATA0200);
        assert!(err.to_string().contains("ODATA0200"));
    }

    #[test]
    fn test_missing_entity_is_not_found() {
        let err = ODataError::request_at(ODATA0211, "No entity found at flights(9)", "flights(9)");
        assert_eq!(err.kind(), ErrorKind::RequestValidation);
        assert_eq!(err.status(), 404);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_source_errors_are_server_errors() {
        let err = ODataError::unsupported_source("string");
        assert_eq!(err.kind(), ErrorKind::SourceConversion);
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn test_envelope() {
        let envelope = ODataError::not_expandable("pilot").to_envelope();
        assert_eq!(
            envelope.to_json(),
            serde_json::json!({
                "error": {
                    "code": "path_not_expandable",
                    "message": "The requested path \"pilot\" is not available for expansion on this entity type",
                    "target": "pilot"
                }
            })
        );
    }

    #[test]
    fn test_parse_envelope_carries_location() {
        let source = "Price gt";
        let err = ODataError::parse_at(
            crate::ODATA0002,
            "Expected operand",
            source,
            SourceLocation::from_span(Span::point(8), source),
        );
        let envelope = err.to_envelope();
        assert_eq!(envelope.error.code, "unexpected_end");
        assert_eq!(envelope.error.target.as_deref(), Some("Price gt"));
        assert_eq!(envelope.error.details.len(), 1);
    }

    #[test]
    fn test_with_context_only_touches_system_errors() {
        let err = ODataError::internal("boom").with_context("while emitting");
        assert!(matches!(err, ODataError::System { context: Some(_), .. }));

        let err = ODataError::type_sealed("ns.Flight").with_context("ignored");
        assert!(matches!(err, ODataError::Schema { .. }));
    }
}
