//! Error types for the interpreter crate

use adder_core::AdderError;

/// Lexical errors are fatal and carry a single human-readable,
/// line-stamped message. The lexer makes no recovery attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct LexicalError(pub(crate) String);

/// Syntax errors from the parser
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The token stream itself was malformed
    #[error(transparent)]
    Lexical(#[from] LexicalError),

    /// The token stream did not match the grammar
    #[error("parse error at line {line}: {message}")]
    Syntax { line: usize, message: String },
}

/// Errors raised while executing a program
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Name lookup failed in the current scope
    #[error("unknown variable {0}")]
    UnknownVariable(String),

    /// Field access on a value that is not a class instance
    #[error("unknown field {0}")]
    UnknownField(String),

    /// No method with the requested name and arity in the class chain
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// A constructor call named something that is not a class
    #[error("{0} is not a class")]
    NotAClass(String),

    /// A method call or field assignment targeted a non-instance value
    #[error("{0} requires a class instance")]
    NotAnInstance(&'static str),

    /// Operand types did not fit the operator
    #[error("invalid {0} operation")]
    InvalidOperation(&'static str),

    #[error("division by zero")]
    DivisionByZero,

    /// No built-in ordering and no dunder fallback for the operands
    #[error("Cannot compare objects for {0}")]
    CannotCompare(&'static str),

    /// The output stream rejected a write
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

impl From<LexicalError> for AdderError {
    fn from(err: LexicalError) -> Self {
        AdderError::Lexical(err.to_string())
    }
}

impl From<ParseError> for AdderError {
    fn from(err: ParseError) -> Self {
        match &err {
            ParseError::Lexical(_) => AdderError::Lexical(err.to_string()),
            ParseError::Syntax { .. } => AdderError::Parse(err.to_string()),
        }
    }
}

impl From<RuntimeError> for AdderError {
    fn from(err: RuntimeError) -> Self {
        AdderError::Runtime(err.to_string())
    }
}
