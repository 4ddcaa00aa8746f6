//! Adder Core - fundamental types shared by the interpreter crates

mod error;

pub use error::*;
