//! Property paths read by an expression
//!
//! Paths are absolute, rooted at `$it`. A path inside a lambda is rewritten
//! onto the lambda's collection, so `stops/any(s: s/code eq 'JFK')` reads
//! `stops` and `stops/code`. Callers use this to load navigation properties
//! before evaluating.

use odata_ast::{Node, PropertyPath};

/// Every non-root property path `node` reads, in first-seen order
pub fn referenced_paths(node: &Node) -> Vec<PropertyPath> {
    let mut paths = Vec::new();
    collect(node, &mut Vec::new(), &mut paths);
    paths
}

fn collect(node: &Node, scope: &mut Vec<(String, PropertyPath)>, paths: &mut Vec<PropertyPath>) {
    match node {
        Node::Null | Node::Literal(_) => {}
        Node::Property(path) => record(path.clone(), paths),
        Node::LambdaProperty(_) => {
            if let Some(path) = absolute(node, scope) {
                record(path, paths);
            }
        }
        Node::List(items) => items.iter().for_each(|item| collect(item, scope, paths)),
        Node::Binary(node) => {
            collect(&node.left, scope, paths);
            collect(&node.right, scope, paths);
        }
        Node::Unary(node) => collect(&node.operand, scope, paths),
        Node::Function(call) => call.args.iter().for_each(|arg| collect(arg, scope, paths)),
        Node::Lambda(lambda) => {
            let collection = absolute(&lambda.collection, scope);
            if let Some(path) = &collection {
                record(path.clone(), paths);
            }
            let (Some(variable), Some(predicate)) = (&lambda.variable, &lambda.predicate) else {
                return;
            };
            // An unresolvable collection leaves its variable unbound
            let Some(collection) = collection else {
                collect(predicate, scope, paths);
                return;
            };
            scope.push((variable.clone(), collection));
            collect(predicate, scope, paths);
            scope.pop();
        }
    }
}

/// The `$it`-rooted path of a property or lambda property node
fn absolute(node: &Node, scope: &[(String, PropertyPath)]) -> Option<PropertyPath> {
    match node {
        Node::Property(path) => Some(path.clone()),
        Node::LambdaProperty(property) => {
            let (_, base) = scope.iter().rev().find(|(bound, _)| *bound == property.variable)?;
            Some(base.segments().iter().chain(property.path.segments()).cloned().collect())
        }
        _ => None,
    }
}

fn record(path: PropertyPath, paths: &mut Vec<PropertyPath>) {
    if !path.is_root() && !paths.contains(&path) {
        paths.push(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paths(filter: &str) -> Vec<String> {
        let node = odata_parser::parse_filter(filter).unwrap();
        referenced_paths(&node).iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_plain_paths() {
        assert_eq!(
            paths("pilot/name eq 'Ada' and contains(origin, 'L') and origin ne 'CDG'"),
            vec!["pilot/name", "origin"]
        );
    }

    #[test]
    fn test_lambda_paths_are_rooted_at_the_collection() {
        assert_eq!(
            paths("stops/any(s: s/code eq 'JFK' and s/crew/all(c: c/base/city eq 'London'))"),
            vec!["stops", "stops/code", "stops/crew", "stops/crew/base/city"]
        );
    }

    #[test]
    fn test_literals_read_nothing() {
        assert!(paths("1 add 2 eq 3").is_empty());
        assert_eq!(paths("$it/origin eq 'LHR'"), vec!["origin"]);
    }
}
