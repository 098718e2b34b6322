//! Streaming OData JSON emitter
//!
//! This crate provides:
//! - The write sink interface and a byte-level JSON writer
//! - The request context (`$select`, `$expand`, metadata level)
//! - The emitter, which validates and resolves a whole value tree before
//!   writing its first token

pub mod emitter;
pub mod request;
pub mod sink;

pub use emitter::{Emitter, NavigationResolver};
pub use request::{MAX_EXPAND_DEPTH, NavigationRequest, RequestContext};
pub use sink::{JsonSink, JsonWriter};
