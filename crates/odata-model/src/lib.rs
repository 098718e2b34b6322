//! OData entity data model
//!
//! This crate provides:
//! - Complex and entity type descriptors with declared, dynamic, navigation and generated properties
//! - The value model: property values owned by ordered complex values and entities
//! - Control metadata and ETags
//! - Annotation records and term builders
//! - The sealed schema registry and its JSON document format

pub mod annotation;
pub mod document;
pub mod entity;
mod etag;
pub mod metadata;
pub mod schema;
pub mod source;
pub mod types;
pub mod value;

pub use annotation::{Annotation, AnnotationTarget, DeepInsertSupport, Record};
pub use document::SchemaDocument;
pub use entity::{Entity, key_literal};
pub use metadata::{MetadataContainer, MetadataLevel};
pub use schema::{EntitySet, Schema, SchemaBuilder};
pub use source::{Source, SourceObject};
pub use types::{ComplexType, NavigationBinding, Property, PropertyGenerator, PropertyKind, TypeKind, ValueType};
pub use value::{ComplexValue, OwnerId, ParentLink, PropertyInput, PropertyValue, Value};
