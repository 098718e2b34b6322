//! OData v4 core for Rust
//!
//! This crate ties the component crates together:
//! - Typed values built from provider records
//! - `$filter`, `$search` and `$orderby` evaluation
//! - Streaming JSON responses with `$select`, `$expand` and metadata levels
//! - An in-memory record provider for tests and the `odata` CLI
//!
//! # Example
//!
//! ```ignore
//! use odata::{InMemoryProvider, JsonWriter, QueryOptions, Schema, Service};
//! use std::sync::Arc;
//!
//! let schema = Arc::new(Schema::from_file("airline.schema.json")?);
//! let provider = InMemoryProvider::from_file(schema.clone(), "airline.data.json")?;
//! let service = Service::new(schema, provider);
//!
//! let options = QueryOptions::new().filter("origin eq 'LHR'").top(10);
//! let mut out = JsonWriter::buffer();
//! service.query("flights", &options, &mut out)?;
//! ```

// Re-export all public APIs from internal crates
pub use odata_ast as ast;
pub use odata_diagnostics as diagnostics;
pub use odata_emit as emit;
pub use odata_eval as eval;
pub use odata_model as model;
pub use odata_parser as parser;
pub use odata_types as types;

pub mod options;
pub mod provider;
pub mod service;

// Convenience re-exports
pub use odata_diagnostics::{ODataError, Result};
pub use odata_emit::{Emitter, JsonSink, JsonWriter, NavigationResolver, RequestContext};
pub use odata_eval::{ExpressionEngine, SearchHandler};
pub use odata_model::{ComplexValue, Entity, MetadataLevel, Schema, Value};
pub use odata_parser::{parse_filter, parse_orderby, parse_search};
pub use options::{Query, QueryOptions};
pub use provider::{InMemoryProvider, RecordSource};
pub use service::Service;

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
