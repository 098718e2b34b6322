//! OData Expression Evaluation Engine
//!
//! This crate evaluates parsed `$filter`, `$search` and `$orderby` expressions
//! against the value model:
//!
//! - **Logical Operators**: and, or, not with three-valued logic
//! - **Comparison Operators**: eq, ne, gt, ge, lt, le, in
//! - **Arithmetic Operators**: add, sub, mul, div, divby, mod, negation
//! - **Lambda Operators**: any, all over collection-valued properties
//! - **Functions**: string, date/time and rounding functions from an extensible registry
//! - **Search**: provider-first dispatch with a case-insensitive default match
//! - **Collections**: filter, search and stable ordering of instances
//!
//! # Example
//!
//! ```ignore
//! use odata_eval::ExpressionEngine;
//!
//! let engine = ExpressionEngine::new();
//! let predicate = odata_parser::parse_filter("price gt 10 and contains(name,'air')")?;
//! let cheap = engine.filter(products, &predicate)?;
//! ```
//!
//! # Three-Valued Logic
//!
//! Expressions evaluate to true, false or null:
//!
//! - `and`: false dominates (null and false = false)
//! - `or`: true dominates (null or true = true)
//! - Comparisons and arithmetic with a null operand are null
//! - A filter keeps an instance only when its predicate is true

pub mod context;
pub mod engine;
pub mod error;
pub mod operators;
pub mod paths;
pub mod query;
pub mod registry;
pub mod search;
pub mod value;

pub use context::{EvaluationContext, MAX_EVALUATION_DEPTH};
pub use engine::ExpressionEngine;
pub use error::{EvalError, EvalResult};
pub use paths::referenced_paths;
pub use registry::{FunctionDefinition, FunctionFn, FunctionRegistry};
pub use search::{SearchHandler, default_match};
pub use value::Operand;

pub use operators::arithmetic::{arithmetic, negate};
pub use operators::comparison::{odata_compare, sort_compare};
pub use operators::logical::{logical_and, logical_not, logical_or};
