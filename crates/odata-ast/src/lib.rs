//! OData query expression syntax tree
//!
//! Nodes for `$filter` and `$orderby` expressions and for `$search`
//! expressions. Literals carry typed primitive values.

mod expression;
mod operator;
mod query;
mod search;

pub use expression::*;
pub use operator::*;
pub use query::*;
pub use search::*;

/// Type alias for boxed nodes
pub type BoxNode = Box<Node>;
