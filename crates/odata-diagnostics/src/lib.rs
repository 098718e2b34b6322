//! OData diagnostics and error handling
//!
//! This crate provides the error handling infrastructure shared by every OData crate:
//! error codes with stable machine-readable slugs, the error taxonomy used to map
//! failures onto transport status codes, source locations for expression parse errors,
//! and the protocol error envelope.

mod error;
mod error_code;
mod span;

pub use error::*;
pub use error_code::*;
pub use span::*;

/// Result type for OData operations
pub type Result<T> = std::result::Result<T, ODataError>;
