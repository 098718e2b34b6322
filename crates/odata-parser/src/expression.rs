//! `$filter` and `$orderby` expression parser
//!
//! Recursive descent with one function per precedence level:
//! `or` < `and` < `not` < comparison < additive < multiplicative < unary < primary.
//! Every level carries the current nesting depth; groups, call arguments,
//! lambda bodies and prefix operators go one level deeper.

use odata_ast::{
    BinaryNode, BinaryOp, FunctionCall, LambdaNode, LambdaOp, LambdaProperty, Node, OrderByItem,
    PropertyPath, SortDirection, UnaryNode, UnaryOp,
};
use odata_types::Primitive;
use winnow::combinator::{alt, opt};
use winnow::error::ErrMode;
use winnow::prelude::*;

use crate::combinators::{
    CLOSING_PARENTHESIS, Input, LAMBDA, PResult, binary_literal, cut_with, descend, expect,
    identifier, keyword, lit, number_literal, padded_keyword, string_literal, temporal_literal, ws,
};

/// Parse a filter expression (entry point)
pub fn filter_expression(input: &mut Input<'_>) -> PResult<Node> {
    expression(input, 0)
}

/// Parse comma separated `expr [asc|desc]` items
pub fn orderby_items(input: &mut Input<'_>) -> PResult<Vec<OrderByItem>> {
    let mut items = Vec::new();
    loop {
        let expr = filter_expression(input)?;
        let direction = if padded_keyword("desc").parse_next(input).is_ok() {
            SortDirection::Descending
        } else {
            opt(padded_keyword("asc")).parse_next(input)?;
            SortDirection::Ascending
        };
        items.push(OrderByItem::new(expr, direction));

        ws.parse_next(input)?;
        if lit(",").parse_next(input).is_err() {
            break;
        }
    }
    Ok(items)
}

fn expression(input: &mut Input<'_>, depth: usize) -> PResult<Node> {
    ws.parse_next(input)?;
    or_expression(input, depth)
}

/// Consume a binary operator keyword of the given precedence, if present
fn operator(input: &mut Input<'_>, precedence: u8) -> Option<BinaryOp> {
    let checkpoint = *input;
    let op = ws(input)
        .ok()
        .and_then(|_| identifier(input).ok())
        .and_then(BinaryOp::from_keyword)
        .filter(|op| op.precedence() == precedence);
    if op.is_none() {
        *input = checkpoint;
    }
    op
}

fn binary(op: BinaryOp, left: Node, right: Node) -> Node {
    Node::Binary(BinaryNode {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

type Level = fn(&mut Input<'_>, usize) -> PResult<Node>;

/// Parse a binary level: `next (op next)*`, left-associative
fn binary_level(input: &mut Input<'_>, depth: usize, precedence: u8, next: Level) -> PResult<Node> {
    let mut left = next(input, depth)?;
    while let Some(op) = operator(input, precedence) {
        let right = next(input, depth)?;
        left = binary(op, left, right);
    }
    Ok(left)
}

fn or_expression(input: &mut Input<'_>, depth: usize) -> PResult<Node> {
    binary_level(input, depth, BinaryOp::Or.precedence(), and_expression)
}

fn and_expression(input: &mut Input<'_>, depth: usize) -> PResult<Node> {
    binary_level(input, depth, BinaryOp::And.precedence(), not_expression)
}

/// Parse `not` expression
fn not_expression(input: &mut Input<'_>, depth: usize) -> PResult<Node> {
    if padded_keyword("not").parse_next(input).is_ok() {
        let depth = descend(input, depth)?;
        let operand = not_expression(input, depth)?;
        return Ok(Node::Unary(UnaryNode {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }));
    }
    comparison_expression(input, depth)
}

/// Parse comparison expression (eq, ne, gt, ge, lt, le, in)
fn comparison_expression(input: &mut Input<'_>, depth: usize) -> PResult<Node> {
    let mut left = additive_expression(input, depth)?;
    while let Some(op) = operator(input, BinaryOp::Equal.precedence()) {
        let right = if op == BinaryOp::In {
            ws.parse_next(input)?;
            match primary(input, depth)? {
                // A bare path names a collection
                node @ (Node::List(_) | Node::Property(_)) => node,
                // `(x)` is a one-element list
                single => Node::List(vec![single]),
            }
        } else {
            additive_expression(input, depth)?
        };
        left = binary(op, left, right);
    }
    Ok(left)
}

fn additive_expression(input: &mut Input<'_>, depth: usize) -> PResult<Node> {
    binary_level(input, depth, BinaryOp::Add.precedence(), multiplicative_expression)
}

fn multiplicative_expression(input: &mut Input<'_>, depth: usize) -> PResult<Node> {
    binary_level(input, depth, BinaryOp::Multiply.precedence(), unary_expression)
}

/// Parse unary minus
fn unary_expression(input: &mut Input<'_>, depth: usize) -> PResult<Node> {
    ws.parse_next(input)?;
    if lit("-").parse_next(input).is_ok() {
        let depth = descend(input, depth)?;
        let operand = unary_expression(input, depth)?;
        return Ok(Node::Unary(UnaryNode {
            op: UnaryOp::Negate,
            operand: Box::new(operand),
        }));
    }
    primary(input, depth)
}

/// Parse primary (literals, paths, calls, lambdas, parenthesised expressions)
fn primary(input: &mut Input<'_>, depth: usize) -> PResult<Node> {
    ws.parse_next(input)?;
    if input.starts_with('(') {
        return parenthesized(input, depth);
    }

    let checkpoint = *input;
    let literal = alt((
        keyword("null").map(|_| Node::Null),
        keyword("true").map(|_| Node::Literal(Primitive::Boolean(true))),
        keyword("false").map(|_| Node::Literal(Primitive::Boolean(false))),
        keyword("INF").map(|_| Node::Literal(Primitive::Double(f64::INFINITY))),
        keyword("NaN").map(|_| Node::Literal(Primitive::Double(f64::NAN))),
        binary_literal.map(Node::Literal),
        string_literal.map(|s| Node::Literal(Primitive::String(s))),
        temporal_literal.map(Node::Literal),
        number_literal.map(Node::Literal),
    ))
    .parse_next(input);

    match literal {
        Err(ErrMode::Backtrack(_)) => {
            *input = checkpoint;
            path_or_call(input, depth)
        }
        other => other,
    }
}

/// `(expr)` or `(a, b, c)`
fn parenthesized(input: &mut Input<'_>, depth: usize) -> PResult<Node> {
    lit("(").parse_next(input)?;
    let depth = descend(input, depth)?;
    let first = expression(input, depth)?;
    ws.parse_next(input)?;
    if lit(")").parse_next(input).is_ok() {
        return Ok(first);
    }

    let mut items = vec![first];
    while lit(",").parse_next(input).is_ok() {
        items.push(expression(input, depth)?);
        ws.parse_next(input)?;
    }
    expect(input, ")", CLOSING_PARENTHESIS)?;
    Ok(Node::List(items))
}

/// Property path, function call, or lambda over a path
fn path_or_call(input: &mut Input<'_>, depth: usize) -> PResult<Node> {
    let first = identifier(input)?;

    if first != "$it" && input.starts_with('(') {
        let args = call_arguments(input, depth)?;
        return Ok(Node::Function(FunctionCall {
            name: first.to_string(),
            args,
        }));
    }

    let mut path = PropertyPath::root();
    if first != "$it" {
        path.push(first);
    }

    loop {
        let checkpoint = *input;
        if lit("/").parse_next(input).is_err() {
            break;
        }
        let Ok(segment) = identifier(input) else {
            *input = checkpoint;
            break;
        };
        let lambda_op = match segment {
            "any" => Some(LambdaOp::Any),
            "all" => Some(LambdaOp::All),
            _ => None,
        };
        if let Some(op) = lambda_op.filter(|_| input.starts_with('(')) {
            return lambda(input, depth, op, Node::Property(path));
        }
        path.push(segment);
    }

    Ok(Node::Property(path))
}

/// Arguments of a function call, including the parentheses
fn call_arguments(input: &mut Input<'_>, depth: usize) -> PResult<Vec<Node>> {
    lit("(").parse_next(input)?;
    let depth = descend(input, depth)?;
    ws.parse_next(input)?;
    if lit(")").parse_next(input).is_ok() {
        return Ok(Vec::new());
    }

    let mut args = Vec::new();
    loop {
        args.push(expression(input, depth)?);
        ws.parse_next(input)?;
        if lit(",").parse_next(input).is_err() {
            break;
        }
    }
    expect(input, ")", CLOSING_PARENTHESIS)?;
    Ok(args)
}

/// `(v: predicate)` or `()` after `any`/`all`
fn lambda(input: &mut Input<'_>, depth: usize, op: LambdaOp, collection: Node) -> PResult<Node> {
    lit("(").parse_next(input)?;
    let depth = descend(input, depth)?;
    ws.parse_next(input)?;
    if lit(")").parse_next(input).is_ok() {
        if op == LambdaOp::All {
            return cut_with(input, LAMBDA);
        }
        return Ok(Node::Lambda(LambdaNode {
            op,
            collection: Box::new(collection),
            variable: None,
            predicate: None,
        }));
    }

    let Ok(variable) = identifier(input) else {
        return cut_with(input, LAMBDA);
    };
    expect(input, ":", LAMBDA)?;
    let predicate = expression(input, depth)?;
    expect(input, ")", LAMBDA)?;

    Ok(Node::Lambda(LambdaNode {
        op,
        collection: Box::new(collection),
        variable: Some(variable.to_string()),
        predicate: Some(Box::new(predicate)),
    }))
}

/// Turn paths rooted at an in-scope lambda variable into lambda properties
pub fn resolve_lambda_variables(node: Node) -> Node {
    resolve(node, &mut Vec::new())
}

fn resolve(node: Node, scope: &mut Vec<String>) -> Node {
    match node {
        Node::Property(path) => match path.first() {
            Some(first) if scope.iter().rev().any(|v| v == first) => {
                Node::LambdaProperty(LambdaProperty {
                    variable: first.to_string(),
                    path: path.tail(),
                })
            }
            _ => Node::Property(path),
        },
        Node::Binary(node) => binary(node.op, resolve(*node.left, scope), resolve(*node.right, scope)),
        Node::Unary(node) => Node::Unary(UnaryNode {
            op: node.op,
            operand: Box::new(resolve(*node.operand, scope)),
        }),
        Node::Function(call) => Node::Function(FunctionCall {
            name: call.name,
            args: call.args.into_iter().map(|arg| resolve(arg, scope)).collect(),
        }),
        Node::List(items) => Node::List(items.into_iter().map(|item| resolve(item, scope)).collect()),
        Node::Lambda(node) => {
            let collection = resolve(*node.collection, scope);
            if let Some(variable) = &node.variable {
                scope.push(variable.clone());
            }
            let predicate = node.predicate.map(|p| Box::new(resolve(*p, scope)));
            if node.variable.is_some() {
                scope.pop();
            }
            Node::Lambda(LambdaNode {
                op: node.op,
                collection: Box::new(collection),
                variable: node.variable,
                predicate,
            })
        }
        other @ (Node::Null | Node::Literal(_) | Node::LambdaProperty(_)) => other,
    }
}
