//! OData primitive type system
//!
//! This crate defines the primitive EDM types:
//! - Type descriptors (`Edm.Boolean` .. `Edm.Binary`) with their wire names
//! - Primitive values with canonical wire serialization
//! - Coercion of raw JSON input into declared primitive types
//! - Canonical hashing input used for ETag computation

pub mod coercion;
pub mod primitive;
pub mod primitive_type;

pub use coercion::*;
pub use primitive::*;
pub use primitive_type::*;
