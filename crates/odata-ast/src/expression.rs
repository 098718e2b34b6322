//! Expression nodes for `$filter` and `$orderby`

use odata_types::Primitive;
use smallvec::SmallVec;
use std::fmt;

use crate::{BinaryOp, BoxNode, LambdaOp, UnaryOp};

/// A query expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    // === Literals ===
    /// The `null` literal
    Null,
    /// Typed literal (boolean, number, string, date, guid, ...)
    Literal(Primitive),
    /// Parenthesised list, the right operand of `in`
    List(Vec<Node>),

    // === References ===
    /// Property path from the current instance (`$it`)
    Property(PropertyPath),
    /// Property path from a lambda-bound iteration variable
    LambdaProperty(LambdaProperty),

    // === Operators ===
    Binary(BinaryNode),
    Unary(UnaryNode),
    /// Function call (`contains(name,'x')`)
    Function(FunctionCall),
    /// `any`/`all` over a collection
    Lambda(LambdaNode),
}

/// Slash-separated property path
///
/// An empty path denotes the instance itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PropertyPath {
    segments: SmallVec<[String; 4]>,
}

impl PropertyPath {
    /// The current instance, `$it`
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path from its `a/b/c` form
    pub fn parse(path: &str) -> Self {
        path.split('/')
            .filter(|s| !s.is_empty() && *s != "$it")
            .map(str::to_string)
            .collect()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// The path without its first segment
    pub fn tail(&self) -> Self {
        self.segments.iter().skip(1).cloned().collect()
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }
}

impl FromIterator<String> for PropertyPath {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("$it");
        }
        f.write_str(&self.segments.join("/"))
    }
}

/// A property path qualified by a lambda variable (`p/name` inside `any(p: ...)`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LambdaProperty {
    pub variable: String,
    /// Path relative to the bound element; empty for the element itself
    pub path: PropertyPath,
}

impl fmt::Display for LambdaProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            f.write_str(&self.variable)
        } else {
            write!(f, "{}/{}", self.variable, self.path)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryNode {
    pub op: BinaryOp,
    pub left: BoxNode,
    pub right: BoxNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryNode {
    pub op: UnaryOp,
    pub operand: BoxNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Node>,
}

/// `collection/any(v: predicate)`, `collection/all(v: predicate)` or `collection/any()`
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaNode {
    pub op: LambdaOp,
    /// The collection: a property path or lambda property
    pub collection: BoxNode,
    pub variable: Option<String>,
    pub predicate: Option<BoxNode>,
}

impl Node {
    pub fn literal(value: impl Into<Primitive>) -> Self {
        Self::Literal(value.into())
    }

    pub fn property(path: &str) -> Self {
        Self::Property(PropertyPath::parse(path))
    }

    pub fn lambda_property(variable: impl Into<String>, path: &str) -> Self {
        Self::LambdaProperty(LambdaProperty {
            variable: variable.into(),
            path: PropertyPath::parse(path),
        })
    }

    pub fn binary(op: BinaryOp, left: Node, right: Node) -> Self {
        Self::Binary(BinaryNode {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(op: UnaryOp, operand: Node) -> Self {
        Self::Unary(UnaryNode {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn function(name: impl Into<String>, args: Vec<Node>) -> Self {
        Self::Function(FunctionCall {
            name: name.into(),
            args,
        })
    }

    pub fn lambda(op: LambdaOp, collection: Node, variable: impl Into<String>, predicate: Node) -> Self {
        Self::Lambda(LambdaNode {
            op,
            collection: Box::new(collection),
            variable: Some(variable.into()),
            predicate: Some(Box::new(predicate)),
        })
    }

    /// Whether this node reads from the instance or a lambda variable
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Property(_) | Self::LambdaProperty(_))
    }
}

/// Render a literal in URL literal form
fn write_literal(f: &mut fmt::Formatter<'_>, value: &Primitive) -> fmt::Result {
    match value {
        Primitive::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        Primitive::Binary(_) => write!(f, "binary'{}'", value),
        other => write!(f, "{}", other),
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Literal(value) => write_literal(f, value),
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            Self::Property(path) => write!(f, "{}", path),
            Self::LambdaProperty(property) => write!(f, "{}", property),
            Self::Binary(node) => write!(f, "({} {} {})", node.left, node.op, node.right),
            Self::Unary(node) => match node.op {
                UnaryOp::Not => write!(f, "not {}", node.operand),
                UnaryOp::Negate => write!(f, "-{}", node.operand),
            },
            Self::Function(call) => {
                write!(f, "{}(", call.name)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Self::Lambda(node) => {
                write!(f, "{}/{}(", node.collection, node.op)?;
                if let (Some(variable), Some(predicate)) = (&node.variable, &node.predicate) {
                    write!(f, "{}:{}", variable, predicate)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_path_parsing() {
        let path = PropertyPath::parse("address/city");
        assert_eq!(path.segments(), &["address".to_string(), "city".to_string()]);
        assert_eq!(path.tail().to_string(), "city");
        assert!(PropertyPath::parse("$it").is_root());
    }

    #[test]
    fn test_display() {
        let node = Node::binary(
            BinaryOp::And,
            Node::binary(BinaryOp::Equal, Node::property("origin"), Node::literal("O'Hare")),
            Node::lambda(
                LambdaOp::Any,
                Node::property("crew"),
                "c",
                Node::binary(BinaryOp::Greater, Node::lambda_property("c", "age"), Node::literal(40i64)),
            ),
        );
        assert_eq!(
            node.to_string(),
            "((origin eq 'O''Hare') and crew/any(c:(c/age gt 40)))"
        );
    }
}
