//! Streaming emitter
//!
//! Emission runs in two passes. [`Emitter::prepare`] walks the whole value tree:
//! it computes generated properties, validates `$select` and `$expand` against
//! each instance's type, and resolves expanded navigation properties. Only
//! then does [`Emitter::emit`] write tokens, so a request-level failure leaves
//! the sink untouched.

use odata_diagnostics::Result;
use odata_model::{Annotation, ComplexValue, MetadataLevel, Property, PropertyInput, Value};
use serde_json::Value as Json;

use crate::request::{NavigationRequest, RequestContext, expandable, validate_select};
use crate::sink::JsonSink;

/// Collaborator that produces the value of an expanded navigation property
pub trait NavigationResolver {
    /// Resolve `property` of `parent`; `None` means no related entity
    fn resolve(
        &self,
        parent: &ComplexValue,
        property: &Property,
        request: &NavigationRequest,
    ) -> Result<Option<Value>>;
}

/// Serializes value trees to a [`JsonSink`]
#[derive(Default, Clone, Copy)]
pub struct Emitter<'r> {
    resolver: Option<&'r dyn NavigationResolver>,
}

impl<'r> Emitter<'r> {
    pub fn new() -> Self {
        Self { resolver: None }
    }

    pub fn with_resolver(resolver: &'r dyn NavigationResolver) -> Self {
        Self {
            resolver: Some(resolver),
        }
    }

    /// Prepare and write one value
    pub fn emit(
        &self,
        value: &mut ComplexValue,
        context: &RequestContext,
        sink: &mut dyn JsonSink,
    ) -> Result<()> {
        self.prepare(value, context)?;
        self.write_object(value, context, context.metadata(), sink)
    }

    /// Prepare every element, then write them as an array
    pub fn emit_collection(
        &self,
        values: &mut [ComplexValue],
        context: &RequestContext,
        sink: &mut dyn JsonSink,
    ) -> Result<()> {
        for value in values.iter_mut() {
            self.prepare(value, context)?;
        }
        self.write_collection(values, context, sink)
    }

    /// Write already prepared values as an array
    pub fn write_collection(
        &self,
        values: &[ComplexValue],
        context: &RequestContext,
        sink: &mut dyn JsonSink,
    ) -> Result<()> {
        sink.array_start()?;
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                sink.separator()?;
            }
            self.write_object(value, context, context.metadata(), sink)?;
        }
        sink.array_end()
    }

    /// Write annotations as `"@<term>": value` pairs
    ///
    /// Returns whether anything was written, so callers can track separators.
    pub fn write_annotations(
        &self,
        annotations: &[Annotation],
        requires_separator: bool,
        sink: &mut dyn JsonSink,
    ) -> Result<bool> {
        let mut requires_separator = requires_separator;
        let context = RequestContext::default();
        for annotation in annotations {
            if requires_separator {
                sink.separator()?;
            }
            sink.key(&format!("@{}", annotation.term()))?;
            self.write_value(Some(annotation.value()), &context, MetadataLevel::None, sink)?;
            requires_separator = true;
        }
        Ok(requires_separator)
    }

    /// Resolve and validate a value tree without writing anything
    pub fn prepare(&self, value: &mut ComplexValue, context: &RequestContext) -> Result<()> {
        self.generate(value)?;
        validate_select(value.complex_type(), context)?;
        self.expand(value, context)?;

        let names: Vec<String> = value.property_values().map(|pv| pv.name().to_string()).collect();
        let nested_default = RequestContext::default();
        for name in names {
            let is_navigation = value
                .get(&name)
                .is_some_and(|pv| pv.property().is_navigation());
            let nested = if is_navigation {
                match context.navigation_request(&name) {
                    Some(request) => request.options(),
                    // Not expanded, never written
                    None => continue,
                }
            } else {
                &nested_default
            };
            if let Some(child) = value.get_mut(&name).and_then(|pv| pv.value_mut()) {
                self.prepare_value(child, nested)?;
            }
        }
        Ok(())
    }

    fn prepare_value(&self, value: &mut Value, context: &RequestContext) -> Result<()> {
        match value {
            Value::Complex(complex) => self.prepare(complex, context),
            Value::Collection(items) => {
                for item in items {
                    self.prepare_value(item, context)?;
                }
                Ok(())
            }
            Value::Primitive(_) => Ok(()),
        }
    }

    fn generate(&self, value: &mut ComplexValue) -> Result<()> {
        let generated: Vec<_> = value.complex_type().generated_properties().cloned().collect();
        for property in generated {
            if let Some(generator) = property.generator() {
                let generated = generator.generate(value)?;
                value.set(property.name(), PropertyInput::from(generated))?;
            }
        }
        Ok(())
    }

    fn expand(&self, value: &mut ComplexValue, context: &RequestContext) -> Result<()> {
        for request in context.expansions() {
            let path = request.path();
            let property = expandable(value.complex_type(), path)?;
            if !value.has(path) {
                self.resolve(value, &property, request)?;
            }
        }
        Ok(())
    }

    /// Bind the navigation properties along `path`, without expanding them
    ///
    /// Used before evaluating expressions that read related entities. Bound
    /// but unexpanded navigation properties are never written. Names the type
    /// does not declare are left for the evaluator to report.
    pub fn load_path(&self, value: &mut ComplexValue, path: &[String]) -> Result<()> {
        let Some((name, rest)) = path.split_first() else {
            return Ok(());
        };
        let Some(property) = value.complex_type().property(name).cloned() else {
            return Ok(());
        };
        if property.is_navigation() && !value.has(name) {
            self.resolve(value, &property, &NavigationRequest::new(name.as_str()))?;
        }
        if rest.is_empty() {
            return Ok(());
        }
        match value.get_mut(name).and_then(|pv| pv.value_mut()) {
            Some(child) => self.load_value_path(child, rest),
            None => Ok(()),
        }
    }

    fn load_value_path(&self, value: &mut Value, path: &[String]) -> Result<()> {
        match value {
            Value::Complex(complex) => self.load_path(complex, path),
            Value::Collection(items) => items.iter_mut().try_for_each(|item| self.load_value_path(item, path)),
            Value::Primitive(_) => Ok(()),
        }
    }

    /// Resolve one navigation property through the resolver and bind it
    ///
    /// An empty collection-valued navigation property binds as `[]`. Without
    /// a resolver nothing is bound.
    fn resolve(&self, value: &mut ComplexValue, property: &Property, request: &NavigationRequest) -> Result<()> {
        let Some(resolver) = self.resolver else {
            return Ok(());
        };
        let collection = property.navigation_binding().is_some_and(|b| b.collection);
        let resolved = match resolver.resolve(value, property, request)? {
            None if collection => Some(Value::Collection(Vec::new())),
            resolved => resolved,
        };
        log::trace!(
            "Resolved navigation property {} of {} ({})",
            property.name(),
            value.complex_type().name(),
            if resolved.is_some() { "found" } else { "empty" }
        );
        value.set(property.name(), PropertyInput::from(resolved))?;
        Ok(())
    }

    fn write_object(
        &self,
        value: &ComplexValue,
        context: &RequestContext,
        level: MetadataLevel,
        sink: &mut dyn JsonSink,
    ) -> Result<()> {
        sink.object_start()?;

        let mut requires_separator = false;
        let metadata = value.metadata(level);
        if metadata.has_properties() {
            let pairs: Vec<(&str, &Json)> = metadata.properties().collect();
            sink.key_values(&pairs)?;
            requires_separator = true;
        }

        if !value.uses_references() {
            let nested_default = RequestContext::default();
            for property_value in value.property_values() {
                if !context.should_emit(property_value) {
                    continue;
                }
                if requires_separator {
                    sink.separator()?;
                }
                sink.key(property_value.name())?;
                let nested = context
                    .navigation_request(property_value.name())
                    .filter(|_| property_value.property().is_navigation())
                    .map(NavigationRequest::options)
                    .unwrap_or(&nested_default);
                self.write_value(property_value.value(), nested, level, sink)?;
                requires_separator = true;

                let property_metadata = property_value.metadata(level);
                if property_metadata.has_properties() {
                    sink.separator()?;
                    let pairs: Vec<(&str, &Json)> = property_metadata.properties().collect();
                    sink.key_values(&pairs)?;
                }
            }
        }

        sink.object_end()
    }

    fn write_value(
        &self,
        value: Option<&Value>,
        context: &RequestContext,
        level: MetadataLevel,
        sink: &mut dyn JsonSink,
    ) -> Result<()> {
        match value {
            None => sink.send_scalar(&Json::Null),
            Some(Value::Primitive(p)) => sink.send_scalar(&p.to_json()),
            Some(Value::Complex(c)) => self.write_object(c, context, level, sink),
            Some(Value::Collection(items)) => {
                sink.array_start()?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        sink.separator()?;
                    }
                    self.write_value(Some(item), context, level, sink)?;
                }
                sink.array_end()
            }
        }
    }
}
