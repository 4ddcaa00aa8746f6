//! Core error types for the adder interpreter

#[derive(thiserror::Error, Debug)]
pub enum AdderError {
    #[error("Lexical error: {0}")]
    Lexical(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AdderError>;
