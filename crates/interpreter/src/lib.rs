//! # Adder Interpreter
//!
//! This crate implements the adder language, a small Python-like
//! language with significant indentation, integer arithmetic, strings,
//! booleans, `None`, and user-defined classes with single inheritance
//! and dunder methods (`__init__`, `__str__`, `__eq__`, `__lt__`,
//! `__add__`).
//!
//! ## Pipeline
//!
//! - Lexer: indentation-sensitive tokenizer synthesizing
//!   `Indent`/`Dedent` tokens, one per two-space level
//! - Parser: recursive descent over the token stream
//! - Evaluator: tree walk over the AST against a scope and an output
//!   context
//!
//! ```
//! let mut output = Vec::new();
//! adder_interpreter::run_program("print 2 * 3 + 4", &mut output).unwrap();
//! assert_eq!(output, b"10\n");
//! ```

pub mod ast;
pub mod comparators;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod token;

pub use error::{LexicalError, ParseError, RuntimeError};
pub use lexer::Lexer;
pub use parser::Parser;
pub use runtime::{Context, Handle, Scope, Value};
pub use token::Token;

use std::io;

use adder_core::AdderError;

/// Lex, parse and execute a complete program against `output`
pub fn run_program(source: &str, output: &mut dyn io::Write) -> Result<(), AdderError> {
    let lexer = Lexer::new(source)?;
    let program = Parser::new(lexer).parse_program()?;
    let mut scope = Scope::new();
    let mut ctx = Context::new(output);
    program.execute(&mut scope, &mut ctx)?;
    Ok(())
}
