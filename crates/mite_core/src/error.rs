//! Error types for template compilation and rendering.

use mite_script::ParseError;
use thiserror::Error;

/// Result type alias for tokenizing.
pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// Result type alias for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Result type alias for rendering.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised while rendering are the script engine's own errors,
/// returned unchanged.
pub type RenderError = mite_script::RuntimeError;

/// Malformed template structure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// A `<%` with no `%>` after it. `offset` is the byte offset of the
    /// opening marker in the normalized template.
    #[error("SyntaxError: cannot find close tag for directive opened at offset {offset}")]
    UnterminatedDirective { offset: usize },
}

/// Errors that can occur while compiling a template.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// Directive code the script engine could not parse.
    #[error(transparent)]
    Script(#[from] ParseError),
}
