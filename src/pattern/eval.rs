//! Tree-walking evaluator for parsed patterns.

use crate::error::EvalError;
use crate::functions::FunctionLibrary;
use crate::record::Record;

use super::ast::Node;

/// Evaluate `node` against a function library and a record.
///
/// Missing attributes evaluate to the empty string. A call to an unknown
/// function fails with [`EvalError::MissingFunction`] before its arguments
/// are evaluated. The first error stops evaluation.
pub fn evaluate<R: Record + ?Sized>(
    node: &Node,
    funcs: &FunctionLibrary,
    record: &R,
) -> Result<String, EvalError> {
    match node {
        Node::Text(text) => Ok(text.clone()),
        Node::Attribute(name) => Ok(record.attribute(name).unwrap_or_default().to_string()),
        Node::Function { name, args } => {
            let f = funcs
                .get(name)
                .ok_or_else(|| EvalError::MissingFunction { name: name.clone() })?;
            let args = evaluate_many(args, funcs, record)?;
            Ok(f(args.as_slice()))
        }
        Node::List(nodes) => Ok(evaluate_many(nodes, funcs, record)?.concat()),
    }
}

fn evaluate_many<R: Record + ?Sized>(
    nodes: &[Node],
    funcs: &FunctionLibrary,
    record: &R,
) -> Result<Vec<String>, EvalError> {
    nodes
        .iter()
        .map(|node| evaluate(node, funcs, record))
        .collect()
}
