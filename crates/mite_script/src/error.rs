//! Error types for the script engine.

use thiserror::Error;

/// Result type alias for parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type alias for evaluation.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised while lexing or parsing script source.
///
/// Offsets are byte offsets into the script source, not the template.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("SyntaxError: unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("SyntaxError: expected {expected}, found '{found}' at offset {offset}")]
    UnexpectedToken {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("SyntaxError: unexpected end of input")]
    UnexpectedEof,

    #[error("SyntaxError: invalid assignment target at offset {offset}")]
    InvalidAssignmentTarget { offset: usize },

    #[error("SyntaxError: invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("SyntaxError: expression nested too deeply at offset {offset}")]
    NestingTooDeep { offset: usize },
}

/// Errors raised while executing a parsed program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("ReferenceError: {0} is not defined")]
    Reference(String),

    #[error("TypeError: {0}")]
    Type(String),

    #[error("RangeError: {0}")]
    Range(String),

    #[error("SyntaxError: {0}")]
    Syntax(String),
}

impl RuntimeError {
    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }
}
