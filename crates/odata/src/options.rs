//! System query options
//!
//! [`QueryOptions`] holds the raw option values of one request. Compiling
//! them parses every expression up front, so a malformed option is reported
//! before any record is read.

use odata_ast::{Node, OrderByItem, SearchExpression};
use odata_diagnostics::{ODATA0008, ODataError, Result};
use odata_emit::RequestContext;
use odata_model::MetadataLevel;

/// Raw system query options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub filter: Option<String>,
    pub search: Option<String>,
    pub orderby: Option<String>,
    pub select: Option<String>,
    pub expand: Option<String>,
    pub top: Option<usize>,
    pub skip: Option<usize>,
    pub metadata: MetadataLevel,
}

/// Query options with every expression parsed
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Option<Node>,
    pub search: Option<SearchExpression>,
    pub orderby: Vec<OrderByItem>,
    pub request: RequestContext,
    pub top: Option<usize>,
    pub skip: Option<usize>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn orderby(mut self, orderby: impl Into<String>) -> Self {
        self.orderby = Some(orderby.into());
        self
    }

    pub fn select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    pub fn top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn metadata(mut self, metadata: MetadataLevel) -> Self {
        self.metadata = metadata;
        self
    }

    /// Read options from a decoded query string (`$filter=...&$top=5`)
    ///
    /// Parameters without a `$` prefix are custom options and are ignored.
    /// Unknown or repeated system options are rejected.
    pub fn from_query(query: &str) -> Result<Self> {
        let mut options = Self::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            if !name.starts_with('$') {
                continue;
            }
            let slot = match name {
                "$filter" => &mut options.filter,
                "$search" => &mut options.search,
                "$orderby" => &mut options.orderby,
                "$select" => &mut options.select,
                "$expand" => &mut options.expand,
                "$top" => {
                    options.top = Some(count(name, value)?);
                    continue;
                }
                "$skip" => {
                    options.skip = Some(count(name, value)?);
                    continue;
                }
                other => return Err(invalid_option(other, format!("Unsupported query option \"{}\"", other))),
            };
            if slot.replace(value.to_string()).is_some() {
                return Err(invalid_option(name, format!("Query option \"{}\" given more than once", name)));
            }
        }
        Ok(options)
    }

    /// Parse every expression option
    pub fn compile(&self) -> Result<Query> {
        let filter = self.filter.as_deref().map(odata_parser::parse_filter).transpose()?;
        let search = self.search.as_deref().map(odata_parser::parse_search).transpose()?;
        let orderby = match self.orderby.as_deref() {
            Some(orderby) => odata_parser::parse_orderby(orderby)?,
            None => Vec::new(),
        };
        let request = RequestContext::from_options(self.select.as_deref(), self.expand.as_deref())?
            .with_metadata(self.metadata);

        Ok(Query {
            filter,
            search,
            orderby,
            request,
            top: self.top,
            skip: self.skip,
        })
    }
}

fn invalid_option(name: &str, message: String) -> ODataError {
    ODataError::parse(ODATA0008, message, name)
}

fn count(name: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid_option(name, format!("{} must be a non-negative integer, got \"{}\"", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_query() {
        let options = QueryOptions::from_query("$filter=origin eq 'LHR'&$top=5&$orderby=id desc&debug=1").unwrap();
        assert_eq!(
            options,
            QueryOptions::new().filter("origin eq 'LHR'").orderby("id desc").top(5)
        );
    }

    #[test]
    fn test_from_query_rejects_unknown_and_repeated_options() {
        let err = QueryOptions::from_query("$apply=groupby((origin))").unwrap_err();
        assert_eq!(err.code(), ODATA0008);
        let err = QueryOptions::from_query("$filter=a eq 1&$filter=b eq 2").unwrap_err();
        assert_eq!(err.code(), ODATA0008);
        let err = QueryOptions::from_query("$top=-1").unwrap_err();
        assert_eq!(err.code().slug(), "invalid_query_option");
    }

    #[test]
    fn test_compile_reports_first_bad_expression() {
        let err = QueryOptions::new().filter("origin eq").compile().unwrap_err();
        assert_eq!(err.status(), 400);
        let query = QueryOptions::new().orderby("id desc, origin").compile().unwrap();
        assert_eq!(query.orderby.len(), 2);
        assert!(query.filter.is_none());
    }
}
