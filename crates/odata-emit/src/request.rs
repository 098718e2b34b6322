//! Request context: projection and expansion options for one response

use indexmap::IndexMap;
use odata_diagnostics::{ODATA0008, ODATA0009, ODataError, Result};
use odata_model::{ComplexType, MetadataLevel, Property, PropertyValue, Schema};
use std::sync::Arc;

/// Deepest chain of nested `$expand` options
pub const MAX_EXPAND_DEPTH: usize = 32;

/// Selected and expanded paths for one level of a response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    select: Option<Vec<String>>,
    expand: IndexMap<String, NavigationRequest>,
    metadata: MetadataLevel,
}

/// Expansion of one navigation property, with its nested options
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationRequest {
    path: String,
    options: RequestContext,
}

impl NavigationRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            options: RequestContext::default(),
        }
    }

    pub fn with_options(mut self, options: RequestContext) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Nested `$select`/`$expand` applied to the related entities
    pub fn options(&self) -> &RequestContext {
        &self.options
    }
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `$select` and `$expand` option values
    pub fn from_options(select: Option<&str>, expand: Option<&str>) -> Result<Self> {
        let mut context = Self::new();
        if let Some(select) = select {
            context.parse_select(select)?;
        }
        if let Some(expand) = expand {
            context.parse_expand(expand)?;
        }
        Ok(context)
    }

    pub fn with_metadata(mut self, metadata: MetadataLevel) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn metadata(&self) -> MetadataLevel {
        self.metadata
    }

    /// Restrict emitted properties to the given paths
    pub fn select<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select
            .get_or_insert_with(Vec::new)
            .extend(paths.into_iter().map(Into::into));
        self
    }

    /// Request expansion of a navigation property
    pub fn expand(mut self, request: NavigationRequest) -> Self {
        self.expand.insert(request.path.clone(), request);
        self
    }

    /// Selected paths, `None` when everything is selected
    pub fn selected(&self) -> Option<&[String]> {
        self.select.as_deref()
    }

    pub fn is_selected(&self, name: &str) -> bool {
        match &self.select {
            None => true,
            Some(paths) => paths.iter().any(|p| p == "*" || p == name),
        }
    }

    pub fn expansions(&self) -> impl Iterator<Item = &NavigationRequest> {
        self.expand.values()
    }

    pub fn navigation_request(&self, name: &str) -> Option<&NavigationRequest> {
        self.expand.get(name)
    }

    /// Whether a property value is written under this projection
    ///
    /// Navigation properties are written only when expanded.
    pub fn should_emit(&self, property_value: &PropertyValue) -> bool {
        if property_value.property().is_navigation() {
            return self.expand.contains_key(property_value.name());
        }
        self.is_selected(property_value.name())
    }

    /// Parse a `$select` value: comma separated property names or `*`
    pub fn parse_select(&mut self, raw: &str) -> Result<()> {
        let mut paths = Vec::new();
        for item in split_top_level(raw, ',', "$select")? {
            let item = item.trim();
            if item != "*" && !is_path(item) {
                return Err(invalid_option("$select", raw, format!("Invalid select item \"{}\"", item)));
            }
            paths.push(item.to_string());
        }
        self.select.get_or_insert_with(Vec::new).extend(paths);
        Ok(())
    }

    /// Parse an `$expand` value: `nav`, `nav($select=a,b;$expand=other)`, comma separated
    pub fn parse_expand(&mut self, raw: &str) -> Result<()> {
        self.parse_expand_at(raw, 0)
    }

    fn parse_expand_at(&mut self, raw: &str, depth: usize) -> Result<()> {
        if depth >= MAX_EXPAND_DEPTH {
            return Err(ODataError::parse(
                ODATA0009,
                format!("$expand: options nest more than {} levels deep", MAX_EXPAND_DEPTH),
                raw,
            ));
        }
        for item in split_top_level(raw, ',', "$expand")? {
            let item = item.trim();
            let (path, nested) = match item.find('(') {
                Some(open) if item.ends_with(')') => (&item[..open], Some(&item[open + 1..item.len() - 1])),
                Some(_) => {
                    return Err(invalid_option("$expand", raw, format!("Unbalanced options in \"{}\"", item)));
                }
                None => (item, None),
            };
            let path = path.trim();
            if !is_path(path) {
                return Err(invalid_option("$expand", raw, format!("Invalid expand item \"{}\"", item)));
            }

            let mut options = RequestContext::new();
            if let Some(nested) = nested {
                for option in split_top_level(nested, ';', "$expand")? {
                    match option.trim().split_once('=') {
                        Some(("$select", value)) => options.parse_select(value)?,
                        Some(("$expand", value)) => options.parse_expand_at(value, depth + 1)?,
                        _ => {
                            return Err(invalid_option(
                                "$expand",
                                raw,
                                format!("Unsupported expand option \"{}\"", option.trim()),
                            ));
                        }
                    }
                }
            }
            self.expand.insert(
                path.to_string(),
                NavigationRequest::new(path).with_options(options),
            );
        }
        Ok(())
    }
}

impl RequestContext {
    /// Check `$select` and `$expand` against the type the response is built from
    ///
    /// Nested options are checked against each navigation target the schema
    /// knows. Open types accept any selected name.
    pub fn validate(&self, ty: &ComplexType, schema: &Schema) -> Result<()> {
        validate_select(ty, self)?;
        for request in self.expansions() {
            let property = expandable(ty, request.path())?;
            let target = property
                .navigation_binding()
                .and_then(|binding| schema.get_type(&binding.target_type));
            if let Some(target) = target {
                request.options().validate(target, schema)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_select(ty: &ComplexType, context: &RequestContext) -> Result<()> {
    let Some(paths) = context.selected() else {
        return Ok(());
    };
    for path in paths {
        if path == "*" || ty.property(path).is_some() || ty.is_open() {
            continue;
        }
        log::debug!("Rejected select path {} on {}", path, ty.name());
        return Err(ODataError::invalid_select(path));
    }
    Ok(())
}

/// The navigation property `path` names, if it may be expanded
pub(crate) fn expandable(ty: &ComplexType, path: &str) -> Result<Arc<Property>> {
    let Some(property) = ty.navigation_property(path) else {
        log::debug!("Rejected expand path {} on {}", path, ty.name());
        return Err(ODataError::unknown_expand_path(path));
    };
    if !property.navigation_binding().is_some_and(|b| b.expandable) {
        log::debug!("Rejected non-expandable path {} on {}", path, ty.name());
        return Err(ODataError::not_expandable(path));
    }
    Ok(property.clone())
}

fn invalid_option(option: &str, raw: &str, message: String) -> ODataError {
    ODataError::parse(ODATA0008, format!("{}: {}", option, message), raw)
}

fn is_path(item: &str) -> bool {
    !item.is_empty()
        && item
            .split('/')
            .all(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_alphanumeric() || c == '_'))
}

/// Split on `separator` outside parentheses
fn split_top_level<'a>(raw: &'a str, separator: char, option: &str) -> Result<Vec<&'a str>> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| invalid_option(option, raw, "Unbalanced parentheses".to_string()))?;
            }
            c if c == separator && depth == 0 => {
                items.push(&raw[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(invalid_option(option, raw, "Unbalanced parentheses".to_string()));
    }
    items.push(&raw[start..]);
    Ok(items)
}
