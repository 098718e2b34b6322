//! Query pipeline
//!
//! [`Service::query`] reads the records of an entity set, builds typed
//! entities from them, applies `$filter`, `$search`, `$orderby`, `$skip` and
//! `$top` in that order, and streams the survivors. Every option is parsed and
//! checked against the set's entity type up front, and every entity is
//! prepared before the first token reaches the sink.

use odata_diagnostics::{ODATA0003, ODATA0211, ODataError, Result};
use odata_emit::{Emitter, JsonSink, RequestContext};
use odata_ast::PropertyPath;
use odata_eval::{ExpressionEngine, odata_compare, referenced_paths};
use odata_model::{ComplexValue, Entity, MetadataLevel, Schema, Source};
use odata_types::Primitive;
use serde_json::Value as Json;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::options::{Query, QueryOptions};
use crate::provider::RecordSource;

/// An OData service over one schema and one record source
pub struct Service<S> {
    schema: Arc<Schema>,
    source: S,
    engine: ExpressionEngine,
}

impl<S: RecordSource> Service<S> {
    pub fn new(schema: Arc<Schema>, source: S) -> Self {
        Self {
            schema,
            source,
            engine: ExpressionEngine::new(),
        }
    }

    /// Use a custom expression engine, e.g. one with extra functions
    pub fn with_engine(mut self, engine: ExpressionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn engine(&self) -> &ExpressionEngine {
        &self.engine
    }

    /// Every entity of a set, in provider order
    pub fn entities(&self, entity_set: &str) -> Result<Vec<Entity>> {
        let set = self.schema.require_entity_set(entity_set)?;
        self.source
            .records(entity_set)?
            .iter()
            .map(|raw| Entity::from_source(set.entity_type().clone(), entity_set, Source::from_json(raw)?))
            .collect()
    }

    /// Entities of a set after filtering, searching, ordering and paging
    pub fn select(&self, entity_set: &str, query: &Query) -> Result<Vec<Entity>> {
        let mut entities = self.entities(entity_set)?;
        let total = entities.len();
        self.load_navigation(&mut entities, query)?;

        if let Some(filter) = &query.filter {
            entities = self.engine.filter(entities, filter)?;
        }
        if let Some(search) = &query.search {
            entities = self.engine.search(entities, search, self.source.search_handler());
        }
        if !query.orderby.is_empty() {
            entities = self.engine.order_by(entities, &query.orderby)?;
        }

        let page: Vec<Entity> = entities
            .into_iter()
            .skip(query.skip.unwrap_or(0))
            .take(query.top.unwrap_or(usize::MAX))
            .collect();
        log::debug!("Selected {} of {} entities from {}", page.len(), total, entity_set);
        Ok(page)
    }

    /// Run a collection query and stream `{"@odata.context": ..., "value": [...]}`
    ///
    /// Returns the number of entities written.
    pub fn query(&self, entity_set: &str, options: &QueryOptions, sink: &mut dyn JsonSink) -> Result<usize> {
        let query = options.compile()?;
        self.validate(entity_set, &query.request)?;
        let mut values: Vec<ComplexValue> = self
            .select(entity_set, &query)?
            .into_iter()
            .map(Entity::into_inner)
            .collect();

        let emitter = self.emitter();
        for value in values.iter_mut() {
            emitter.prepare(value, &query.request)?;
        }

        sink.object_start()?;
        if query.request.metadata() != MetadataLevel::None {
            sink.key("@odata.context")?;
            sink.send_scalar(&Json::String(context_url(entity_set, &query.request, false)))?;
            sink.separator()?;
        }
        sink.key("value")?;
        emitter.write_collection(&values, &query.request, sink)?;
        sink.object_end()?;
        Ok(values.len())
    }

    /// Find one entity by key
    pub fn find(&self, entity_set: &str, key: &Primitive) -> Result<Entity> {
        for entity in self.entities(entity_set)? {
            let Some(candidate) = entity.key() else {
                continue;
            };
            // A key of the wrong type is a bad request, not a miss
            if odata_compare("eq", candidate, key)? == Some(Ordering::Equal) {
                return Ok(entity);
            }
        }
        let target = format!("{}({})", entity_set, odata_model::key_literal(key));
        Err(ODataError::request_at(ODATA0211, format!("No entity found at {}", target), target))
    }

    /// Read one entity by key and stream it
    ///
    /// Only `$select`, `$expand` and the metadata level apply to a single read.
    pub fn read(
        &self,
        entity_set: &str,
        key: &Primitive,
        options: &QueryOptions,
        sink: &mut dyn JsonSink,
    ) -> Result<()> {
        let request = RequestContext::from_options(options.select.as_deref(), options.expand.as_deref())?
            .with_metadata(options.metadata);
        self.validate(entity_set, &request)?;
        let mut value = self.find(entity_set, key)?.into_inner();
        if request.metadata() != MetadataLevel::None {
            value.insert_metadata("odata.context", Json::String(context_url(entity_set, &request, true)));
        }
        self.emitter().emit(&mut value, &request, sink)
    }

    /// Read one entity by its key literal, e.g. `1` or `'LHR'`
    pub fn read_literal(
        &self,
        entity_set: &str,
        key: &str,
        options: &QueryOptions,
        sink: &mut dyn JsonSink,
    ) -> Result<()> {
        let key = key_from_literal(key)?;
        self.read(entity_set, &key, options, sink)
    }

    /// Check `$select` and `$expand` against the set's entity type
    fn validate(&self, entity_set: &str, request: &RequestContext) -> Result<()> {
        let set = self.schema.require_entity_set(entity_set)?;
        request.validate(set.entity_type(), &self.schema)
    }

    /// Bind the navigation properties `$filter` and `$orderby` read
    fn load_navigation(&self, entities: &mut [Entity], query: &Query) -> Result<()> {
        let mut paths: Vec<PropertyPath> = Vec::new();
        let expressions = query.filter.iter().chain(query.orderby.iter().map(|item| &item.expr));
        for path in expressions.flat_map(referenced_paths) {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Ok(());
        }

        let emitter = self.emitter();
        for entity in entities.iter_mut() {
            for path in &paths {
                emitter.load_path(entity, path.segments())?;
            }
        }
        log::debug!("Loaded {} navigation path(s) for {} entities", paths.len(), entities.len());
        Ok(())
    }

    fn emitter(&self) -> Emitter<'_> {
        match self.source.navigation_resolver() {
            Some(resolver) => Emitter::with_resolver(resolver),
            None => Emitter::new(),
        }
    }
}

/// Parse a key literal with the `$filter` literal grammar
pub fn key_from_literal(literal: &str) -> Result<Primitive> {
    match odata_parser::parse_filter(literal)? {
        odata_ast::Node::Literal(key) => Ok(key),
        other => Err(ODataError::parse(
            ODATA0003,
            format!("Expected a key literal, found {}", other),
            literal,
        )),
    }
}

/// `$metadata#<set>[(<select>)][/$entity]`
fn context_url(entity_set: &str, request: &RequestContext, entity: bool) -> String {
    let mut url = format!("$metadata#{}", entity_set);
    if let Some(selected) = request.selected() {
        url.push('(');
        url.push_str(&selected.join(","));
        url.push(')');
    }
    if entity {
        url.push_str("/$entity");
    }
    url
}
