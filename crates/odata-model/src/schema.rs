//! Schema registry
//!
//! Types, entity sets and annotations are registered once through an
//! append-only [`SchemaBuilder`] and compiled into a sealed [`Schema`]. A schema
//! can be published process-wide exactly once with [`Schema::install`].

use indexmap::IndexMap;
use odata_diagnostics::{ODATA0104, ODATA0107, ODataError, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::annotation::{Annotation, AnnotationTarget};
use crate::types::ComplexType;

static GLOBAL_SCHEMA: OnceCell<Schema> = OnceCell::new();

/// A named collection of entities of one entity type
#[derive(Debug, Clone)]
pub struct EntitySet {
    name: String,
    entity_type: Arc<ComplexType>,
}

impl EntitySet {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity_type(&self) -> &Arc<ComplexType> {
        &self.entity_type
    }
}

/// Append-only schema builder
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    namespace: String,
    types: IndexMap<String, Arc<ComplexType>>,
    entity_sets: IndexMap<String, EntitySet>,
    annotations: IndexMap<AnnotationTarget, Vec<Annotation>>,
}

impl SchemaBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            types: IndexMap::new(),
            entity_sets: IndexMap::new(),
            annotations: IndexMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Register and seal a type
    pub fn add_type(&mut self, mut complex_type: ComplexType) -> Result<Arc<ComplexType>> {
        let name = complex_type.name().to_string();
        if self.types.contains_key(&name) {
            return Err(ODataError::schema(
                ODATA0104,
                format!("The type \"{}\" is already registered", name),
            ));
        }
        complex_type.seal();
        let complex_type = Arc::new(complex_type);
        self.types.insert(name, complex_type.clone());
        Ok(complex_type)
    }

    /// Look up a registered type by qualified or namespace-relative name
    pub fn get_type(&self, name: &str) -> Option<&Arc<ComplexType>> {
        lookup(&self.namespace, &self.types, name)
    }

    /// Register an entity set over a registered entity type
    pub fn add_entity_set(&mut self, name: impl Into<String>, type_name: &str) -> Result<&mut Self> {
        let entity_type = self
            .get_type(type_name)
            .filter(|t| t.is_entity())
            .cloned()
            .ok_or_else(|| ODataError::unknown_type(type_name))?;
        let name = name.into();
        self.entity_sets.insert(
            name.clone(),
            EntitySet { name, entity_type },
        );
        Ok(self)
    }

    /// Attach an annotation to a registered model element
    pub fn annotate(&mut self, target: AnnotationTarget, annotation: Annotation) -> Result<&mut Self> {
        let target = match target {
            AnnotationTarget::Service => AnnotationTarget::Service,
            AnnotationTarget::Type(type_name) => {
                let ty = self
                    .get_type(&type_name)
                    .ok_or_else(|| ODataError::unknown_type(&type_name))?;
                AnnotationTarget::Type(ty.name().to_string())
            }
            AnnotationTarget::Property { type_name, property } => {
                let ty = self
                    .get_type(&type_name)
                    .ok_or_else(|| ODataError::unknown_type(&type_name))?;
                if ty.property(&property).is_none() {
                    return Err(ODataError::no_such_property(ty.name(), &property));
                }
                AnnotationTarget::of_property(ty.name(), property)
            }
        };
        self.annotations.entry(target).or_default().push(annotation);
        Ok(self)
    }

    /// Validate cross references and seal the schema
    pub fn build(self) -> Result<Schema> {
        for ty in self.types.values() {
            for nav in ty.navigation_properties() {
                let Some(binding) = nav.navigation_binding() else {
                    continue;
                };
                if lookup(&self.namespace, &self.types, &binding.target_type).is_none() {
                    return Err(ODataError::unknown_type(&binding.target_type));
                }
                if let Some(set) = &binding.target_set {
                    if !self.entity_sets.contains_key(set) {
                        return Err(ODataError::unknown_entity_set(set));
                    }
                }
            }
        }

        log::debug!(
            "Sealed schema {} with {} types, {} entity sets",
            self.namespace,
            self.types.len(),
            self.entity_sets.len()
        );

        Ok(Schema {
            namespace: self.namespace,
            types: self.types,
            entity_sets: self.entity_sets,
            annotations: self.annotations,
        })
    }
}

fn lookup<'a>(
    namespace: &str,
    types: &'a IndexMap<String, Arc<ComplexType>>,
    name: &str,
) -> Option<&'a Arc<ComplexType>> {
    types
        .get(name)
        .or_else(|| types.get(&format!("{}.{}", namespace, name)))
}

/// A sealed, read-only schema
#[derive(Debug, Clone)]
pub struct Schema {
    namespace: String,
    types: IndexMap<String, Arc<ComplexType>>,
    entity_sets: IndexMap<String, EntitySet>,
    annotations: IndexMap<AnnotationTarget, Vec<Annotation>>,
}

impl Schema {
    pub fn builder(namespace: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(namespace)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get_type(&self, name: &str) -> Option<&Arc<ComplexType>> {
        lookup(&self.namespace, &self.types, name)
    }

    pub fn types(&self) -> impl Iterator<Item = &Arc<ComplexType>> {
        self.types.values()
    }

    pub fn entity_set(&self, name: &str) -> Option<&EntitySet> {
        self.entity_sets.get(name)
    }

    /// Entity set lookup that fails with `unknown_entity_set`
    pub fn require_entity_set(&self, name: &str) -> Result<&EntitySet> {
        self.entity_set(name)
            .ok_or_else(|| ODataError::unknown_entity_set(name))
    }

    pub fn entity_sets(&self) -> impl Iterator<Item = &EntitySet> {
        self.entity_sets.values()
    }

    /// Annotations attached to a model element (targets use qualified type names)
    pub fn annotations(&self, target: &AnnotationTarget) -> &[Annotation] {
        self.annotations
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Annotations attached to the service root
    pub fn service_annotations(&self) -> &[Annotation] {
        self.annotations(&AnnotationTarget::Service)
    }

    /// Publish this schema process-wide; only the first call succeeds
    pub fn install(self) -> Result<&'static Schema> {
        let namespace = self.namespace.clone();
        GLOBAL_SCHEMA.set(self).map_err(|_| {
            ODataError::schema(
                ODATA0107,
                format!("Cannot install schema {}: a schema is already installed", namespace),
            )
        })?;
        log::debug!("Installed schema {}", namespace);
        GLOBAL_SCHEMA
            .get()
            .ok_or_else(|| ODataError::internal("Installed schema is not readable"))
    }

    /// The installed schema, if any
    pub fn global() -> Option<&'static Schema> {
        GLOBAL_SCHEMA.get()
    }
}
