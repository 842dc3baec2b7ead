//! Node tree for display patterns.

/// One element of a parsed pattern.
///
/// A tree is built once by the parser and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text, emitted unchanged.
    Text(String),
    /// `%name%` — the record's value for `name`, or empty.
    Attribute(String),
    /// `$name(arg, ...)` — each argument is itself a [`Node::List`].
    Function { name: String, args: Vec<Node> },
    /// Concatenation of the children, left to right.
    List(Vec<Node>),
}

impl Node {
    pub fn empty() -> Self {
        Node::List(vec![])
    }
}
