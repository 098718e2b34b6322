//! `$orderby` items

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Node;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// One `$orderby` item: `expr [asc|desc]`
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: Node,
    pub direction: SortDirection,
}

impl OrderByItem {
    pub fn new(expr: Node, direction: SortDirection) -> Self {
        Self { expr, direction }
    }

    pub fn ascending(expr: Node) -> Self {
        Self::new(expr, SortDirection::Ascending)
    }

    pub fn descending(expr: Node) -> Self {
        Self::new(expr, SortDirection::Descending)
    }
}

impl fmt::Display for OrderByItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.expr, self.direction.keyword())
    }
}
