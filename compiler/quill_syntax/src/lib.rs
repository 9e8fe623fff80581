//! Quill Syntax - lexer, syntax tree and parser.
//!
//! `parse` turns source text into a `Script`: a boxed tree with byte
//! spans on every statement and expression. Errors carry the span of the
//! offending token so the driver can render a source snippet.

pub mod ast;
mod error;
mod lexer;
mod parser;
mod span;
mod stack;

pub use error::ParseError;
pub use lexer::{tokenize, Token};
pub use parser::parse;
pub use span::Span;
pub use stack::with_stack_room;
