//! State-machine parser for display pattern strings.

use std::iter::Peekable;
use std::str::Chars;

use super::ast::Node;

const VAR_SIGN: char = '%';
const FUNC_SIGN: char = '$';
const BEGIN_SIGN: char = '(';
const END_SIGN: char = ')';
const SEP_SIGN: char = ',';

/// Deepest allowed nesting of function calls inside arguments.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Errors that can occur while parsing a display pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// `%name` with no closing `%`.
    UnclosedAttribute,
    /// `$` not followed by a letter.
    EmptyFunctionName,
    /// A character other than a letter, digit or `(` inside a function name.
    InvalidFunctionName(char),
    /// `$name` with no argument list.
    MissingArguments(String),
    /// `$name(...` with no closing `)`.
    UnclosedArguments(String),
    /// Function calls nested more than [`MAX_NESTING_DEPTH`] deep.
    TooDeeplyNested,
}

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnclosedAttribute => write!(f, "Unclosed attribute '%' in pattern"),
            Self::EmptyFunctionName => write!(f, "Function name must begin with a letter"),
            Self::InvalidFunctionName(c) => write!(
                f,
                "Unexpected character {c:?} in function name; names are alphanumeric and end with ()"
            ),
            Self::MissingArguments(name) => {
                write!(f, "Function call '{name}' has no argument list")
            }
            Self::UnclosedArguments(name) => {
                write!(f, "Unclosed argument list for function '{name}'")
            }
            Self::TooDeeplyNested => write!(
                f,
                "Function calls nested more than {MAX_NESTING_DEPTH} levels deep"
            ),
        }
    }
}

/// Parse a display pattern into a [`Node::List`].
///
/// Only the first error in the pattern is reported.
pub fn parse(input: &str) -> Result<Node, PatternError> {
    parse_nested(input, 0)
}

fn parse_nested(input: &str, depth: usize) -> Result<Node, PatternError> {
    let nodes = Parser {
        chars: input.chars().peekable(),
        depth,
    }
    .parse_nodes()?;
    Ok(Node::List(nodes))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    Var,
    Func,
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    /// Number of argument lists enclosing this text.
    depth: usize,
}

impl Parser<'_> {
    fn parse_nodes(&mut self) -> Result<Vec<Node>, PatternError> {
        let mut nodes = Vec::new();
        let mut state = State::Text;
        let mut mem = String::new();

        while let Some(c) = self.chars.next() {
            match state {
                State::Text => match c {
                    VAR_SIGN => {
                        flush_text(&mut nodes, &mut mem);
                        state = State::Var;
                    }
                    FUNC_SIGN => {
                        flush_text(&mut nodes, &mut mem);
                        state = State::Func;
                    }
                    _ => mem.push(c),
                },
                State::Var => {
                    if c == VAR_SIGN {
                        // `%%` is an escaped percent sign
                        if mem.is_empty() {
                            nodes.push(Node::Text(VAR_SIGN.to_string()));
                        } else {
                            nodes.push(Node::Attribute(std::mem::take(&mut mem)));
                        }
                        state = State::Text;
                    } else {
                        mem.push(c);
                    }
                }
                State::Func => {
                    if mem.is_empty() {
                        if !c.is_ascii_alphabetic() {
                            return Err(PatternError::EmptyFunctionName);
                        }
                        mem.push(c);
                    } else if c.is_ascii_alphanumeric() {
                        mem.push(c);
                    } else if c == BEGIN_SIGN {
                        if self.depth >= MAX_NESTING_DEPTH {
                            return Err(PatternError::TooDeeplyNested);
                        }
                        let name = std::mem::take(&mut mem);
                        let args = self
                            .split_arguments(&name)?
                            .iter()
                            .map(|arg| parse_nested(arg, self.depth + 1))
                            .collect::<Result<Vec<_>, _>>()?;
                        nodes.push(Node::Function { name, args });
                        state = State::Text;
                    } else {
                        return Err(PatternError::InvalidFunctionName(c));
                    }
                }
            }
        }

        match state {
            State::Text => {
                flush_text(&mut nodes, &mut mem);
                Ok(nodes)
            }
            State::Var => Err(PatternError::UnclosedAttribute),
            State::Func if mem.is_empty() => Err(PatternError::EmptyFunctionName),
            State::Func => Err(PatternError::MissingArguments(mem)),
        }
    }

    /// Collect the raw text of each argument up to the matching `)` (the
    /// opening `(` has already been consumed).
    ///
    /// Only separators and the terminator at paren depth 0 are structural;
    /// nested parens are kept in the argument text. An empty final argument
    /// is dropped, so `f()` has no arguments and `f(a,)` has one.
    fn split_arguments(&mut self, name: &str) -> Result<Vec<String>, PatternError> {
        let mut args = Vec::new();
        let mut depth = 0usize;
        let mut mem = String::new();

        for c in self.chars.by_ref() {
            match c {
                BEGIN_SIGN => {
                    mem.push(c);
                    depth += 1;
                }
                END_SIGN if depth == 0 => {
                    if !mem.is_empty() {
                        args.push(mem);
                    }
                    return Ok(args);
                }
                END_SIGN => {
                    mem.push(c);
                    depth -= 1;
                }
                SEP_SIGN if depth == 0 => args.push(std::mem::take(&mut mem)),
                _ => mem.push(c),
            }
        }
        Err(PatternError::UnclosedArguments(name.to_string()))
    }
}

fn flush_text(nodes: &mut Vec<Node>, mem: &mut String) {
    if !mem.is_empty() {
        nodes.push(Node::Text(std::mem::take(mem)));
    }
}
