//! OData error codes following a structured numbering system
//!
//! Error code ranges:
//! - ODATA0001-ODATA0099: Parse errors (expression syntax)
//! - ODATA0100-ODATA0199: Schema errors (unknown/duplicate property, sealed types)
//! - ODATA0200-ODATA0299: Request validation errors (expand/select/filter)
//! - ODATA0300-ODATA0399: Source conversion errors (collaborator contract violations)
//! - ODATA0400-ODATA0499: System errors (I/O, configuration)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Stable machine-readable identifier used in error envelopes
    pub fn slug(&self) -> &'static str {
        self.info().slug
    }

    /// Check if this is a parse error (0001-0099)
    pub const fn is_parse_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a schema error (0100-0199)
    pub const fn is_schema_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a request validation error (0200-0299)
    pub const fn is_request_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a source conversion error (0300-0399)
    pub const fn is_source_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Check if this is a system error (0400-0499)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ODATA{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Machine-readable identifier
    pub slug: &'static str,
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(slug: &'static str, description: &'static str) -> Self {
        Self {
            slug,
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("unknown_error", "Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Parse errors (0001-0099)
    map.insert(1, ErrorInfo::new("syntax_error", "Unexpected token"));
    map.insert(2, ErrorInfo::new("unexpected_end", "Unexpected end of expression"));
    map.insert(3, ErrorInfo::new("invalid_literal", "Invalid literal"));
    map.insert(4, ErrorInfo::new("unterminated_string", "Unterminated string literal"));
    map.insert(5, ErrorInfo::new("invalid_lambda", "Invalid lambda expression"));
    map.insert(6, ErrorInfo::new("invalid_orderby", "Invalid orderby item"));
    map.insert(7, ErrorInfo::new("invalid_search", "Invalid search expression"));
    map.insert(8, ErrorInfo::new("invalid_query_option", "Invalid system query option"));
    map.insert(
        9,
        ErrorInfo::new("expression_too_deep", "Expression is nested too deeply")
            .with_help("Flatten parenthesised groups or split the expression"),
    );

    // Schema errors (0100-0199)
    map.insert(
        100,
        ErrorInfo::new("no_such_property", "Type has no such property")
            .with_help("Only properties declared on the type (or any key on an open type) may be set"),
    );
    map.insert(101, ErrorInfo::new("duplicate_property", "Property already bound or declared"));
    map.insert(102, ErrorInfo::new("type_sealed", "Type is sealed"));
    map.insert(103, ErrorInfo::new("unknown_type", "Type is not registered"));
    map.insert(104, ErrorInfo::new("duplicate_type", "Type already registered"));
    map.insert(105, ErrorInfo::new("property_already_owned", "Property value already has an owner"));
    map.insert(106, ErrorInfo::new("invalid_key", "Invalid entity key"));
    map.insert(107, ErrorInfo::new("schema_installed", "Schema already installed"));
    map.insert(108, ErrorInfo::new("unknown_entity_set", "Entity set is not registered"));
    map.insert(109, ErrorInfo::new("property_not_bound", "Property has no bound value"));

    // Request validation errors (0200-0299)
    map.insert(
        200,
        ErrorInfo::new("nonexistent_expand_path", "Expand path does not exist")
            .with_help("Expand paths must name a navigation property of the entity type"),
    );
    map.insert(201, ErrorInfo::new("path_not_expandable", "Path is not available for expansion"));
    map.insert(202, ErrorInfo::new("invalid_select", "Select path does not exist"));
    map.insert(203, ErrorInfo::new("unknown_property", "Property path does not exist"));
    map.insert(204, ErrorInfo::new("unknown_operator", "Unknown function or operator"));
    map.insert(205, ErrorInfo::new("type_mismatch", "Incompatible operand types"));
    map.insert(206, ErrorInfo::new("invalid_argument_count", "Invalid argument count"));
    map.insert(207, ErrorInfo::new("unbound_variable", "Lambda variable is not in scope"));
    map.insert(208, ErrorInfo::new("division_by_zero", "Division by zero"));
    map.insert(209, ErrorInfo::new("overflow", "Arithmetic overflow"));
    map.insert(210, ErrorInfo::new("invalid_pattern", "Invalid regular expression"));
    map.insert(211, ErrorInfo::new("entity_not_found", "Entity not found"));
    map.insert(212, ErrorInfo::new("evaluation_too_deep", "Expression tree is too deep to evaluate"));

    // Source conversion errors (0300-0399)
    map.insert(300, ErrorInfo::new("invalid_source", "Unsupported source shape"));
    map.insert(301, ErrorInfo::new("invalid_value", "Value cannot be converted to the declared type"));
    map.insert(302, ErrorInfo::new("navigation_failed", "Navigation property could not be resolved"));

    // System errors (0400-0499)
    map.insert(400, ErrorInfo::new("internal_error", "Internal error"));
    map.insert(401, ErrorInfo::new("io_error", "I/O error"));
    map.insert(402, ErrorInfo::new("configuration_error", "Configuration error"));

    map
});

// Parse errors
pub const ODATA0001: ErrorCode = ErrorCode::new(1);
pub const ODATA0002: ErrorCode = ErrorCode::new(2);
pub const ODATA0003: ErrorCode = ErrorCode::new(3);
pub const ODATA0004: ErrorCode = ErrorCode::new(4);
pub const ODATA0005: ErrorCode = ErrorCode::new(5);
pub const ODATA0006: ErrorCode = ErrorCode::new(6);
pub const ODATA0007: ErrorCode = ErrorCode::new(7);
pub const ODATA0008: ErrorCode = ErrorCode::new(8);
pub const ODATA0009: ErrorCode = ErrorCode::new(9);

// Schema errors
pub const ODATA0100: ErrorCode = ErrorCode::new(100);
pub const ODATA0101: ErrorCode = ErrorCode::new(101);
pub const ODATA0102: ErrorCode = ErrorCode::new(102);
pub const ODATA0103: ErrorCode = ErrorCode::new(103);
pub const ODATA0104: ErrorCode = ErrorCode::new(104);
pub const ODATA0105: ErrorCode = ErrorCode::new(105);
pub const ODATA0106: ErrorCode = ErrorCode::new(106);
pub const ODATA0107: ErrorCode = ErrorCode::new(107);
pub const ODATA0108: ErrorCode = ErrorCode::new(108);
pub const ODATA0109: ErrorCode = ErrorCode::new(109);

// Request validation errors
pub const ODATA0200: ErrorCode = ErrorCode::new(200);
pub const ODATA0201: ErrorCode = ErrorCode::new(201);
pub const ODATA0202: ErrorCode = ErrorCode::new(202);
pub const ODATA0203: ErrorCode = ErrorCode::new(203);
pub const ODATA0204: ErrorCode = ErrorCode::new(204);
pub const ODATA0205: ErrorCode = ErrorCode::new(205);
pub const ODATA0206: ErrorCode = ErrorCode::new(206);
pub const ODATA0207: ErrorCode = ErrorCode::new(207);
pub const ODATA0208: ErrorCode = ErrorCode::new(208);
pub const ODATA0209: ErrorCode = ErrorCode::new(209);
pub const ODATA0210: ErrorCode = ErrorCode::new(210);
pub const ODATA0211: ErrorCode = ErrorCode::new(211);
pub const ODATA0212: ErrorCode = ErrorCode::new(212);

// Source conversion errors
pub const ODATA0300: ErrorCode = ErrorCode::new(300);
pub const ODATA0301: ErrorCode = ErrorCode::new(301);
pub const ODATA0302: ErrorCode = ErrorCode::new(302);

// System errors
pub const ODATA0400: ErrorCode = ErrorCode::new(400);
pub const ODATA0401: ErrorCode = ErrorCode::new(401);
pub const ODATA0402: ErrorCode = ErrorCode::new(402);
