/// The reason a pattern could not be compiled or evaluated.
///
/// Exactly one of these is reported per evaluation; the first error
/// encountered wins and evaluation stops there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// A `$name(...)` call names a function the library does not have.
    MissingFunction { name: String },
    /// Reserved. Attribute lookups currently fall back to the empty string.
    MissingAttribute { name: String },
    /// The pattern text is malformed.
    SyntaxError { detail: String },
    /// Reserved for hosts that need to report an inconsistent evaluator.
    InvalidState,
}

impl EvalError {
    /// Stable discriminant, suitable for showing in place of a result.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingFunction { .. } => "MissingFunction",
            Self::MissingAttribute { .. } => "MissingAttribute",
            Self::SyntaxError { .. } => "SyntaxError",
            Self::InvalidState => "InvalidState",
        }
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFunction { name } => write!(f, "Missing function {name}"),
            Self::MissingAttribute { name } => write!(f, "Missing attribute {name}"),
            Self::SyntaxError { detail } => write!(f, "Syntax error: {detail}"),
            Self::InvalidState => write!(f, "Invalid state"),
        }
    }
}

impl std::error::Error for EvalError {}
