use thiserror::Error;

use crate::span::Span;

/// A lexing or parsing failure, located by byte span.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        ParseError {
            message: message.into(),
            span,
        }
    }

    pub fn unexpected(found: &str, expected: &str, span: Span) -> Self {
        ParseError::new(format!("expected {expected}, found {found}"), span)
    }

    pub fn invalid_character(text: &str, span: Span) -> Self {
        ParseError::new(format!("invalid token `{text}`"), span)
    }

    pub fn invalid_target(span: Span) -> Self {
        ParseError::new("invalid assignment target", span)
    }
}
