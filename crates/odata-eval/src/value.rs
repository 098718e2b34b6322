//! Runtime operands produced while evaluating an expression

use odata_model::{ComplexValue, Value};
use odata_types::Primitive;

use crate::error::{EvalError, EvalResult};

/// The result of evaluating an expression node
///
/// Structured values are borrowed from the instance under evaluation;
/// primitives are owned since operators and functions produce new ones.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand<'v> {
    Null,
    Primitive(Primitive),
    Complex(&'v ComplexValue),
    Collection(&'v [Value]),
    /// Literal list, the right operand of `in`
    List(Vec<Operand<'v>>),
}

impl<'v> Operand<'v> {
    /// View a bound property value; `None` is null
    pub fn from_value(value: Option<&'v Value>) -> Self {
        match value {
            None => Self::Null,
            Some(Value::Primitive(p)) => Self::Primitive(p.clone()),
            Some(Value::Complex(c)) => Self::Complex(c),
            Some(Value::Collection(items)) => Self::Collection(items),
        }
    }

    pub fn boolean(b: bool) -> Self {
        Self::Primitive(Primitive::Boolean(b))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Self::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// Name of the operand's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Primitive(p) => p.primitive_type().qualified_name(),
            Self::Complex(_) => "complex value",
            Self::Collection(_) => "collection",
            Self::List(_) => "list",
        }
    }

    /// Three-valued boolean view: `None` for null, an error for non-booleans
    pub fn to_logical(&self, operator: &str) -> EvalResult<Option<bool>> {
        match self {
            Self::Null => Ok(None),
            Self::Primitive(Primitive::Boolean(b)) => Ok(Some(*b)),
            other => Err(EvalError::type_mismatch(operator, "Edm.Boolean", other.type_name())),
        }
    }

    /// Primitive view for ordering and function arguments: `None` for null
    pub fn into_primitive(self, operator: &str) -> EvalResult<Option<Primitive>> {
        match self {
            Self::Null => Ok(None),
            Self::Primitive(p) => Ok(Some(p)),
            other => Err(EvalError::type_mismatch(operator, "primitive value", other.type_name())),
        }
    }
}

impl From<Option<bool>> for Operand<'_> {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Null, Self::boolean)
    }
}

impl From<Option<Primitive>> for Operand<'_> {
    fn from(value: Option<Primitive>) -> Self {
        value.map_or(Self::Null, Self::Primitive)
    }
}

impl From<Primitive> for Operand<'_> {
    fn from(value: Primitive) -> Self {
        Self::Primitive(value)
    }
}
