//! # mite_core
//!
//! A micro template compiler for `<% %>` / `<%= %>` templates.
//!
//! # Architecture
//!
//! - **Preprocessor**: escapes newlines so the template fits on one line
//! - **Tokenizer**: splits the text into literal, control-flow and
//!   expression tokens
//! - **Code generator**: turns tokens into a function body that pushes
//!   output onto a buffer
//! - **Compiler**: parses that body with `mite_script` into a reusable
//!   [`Template`]
//!
//! # Example
//!
//! ```rust
//! use mite_core::compile;
//! use serde_json::json;
//!
//! let template = compile("<% for (const item of items) { %><li><%= item %></li><% } %>").unwrap();
//! let html = template.render(&json!({"items": ["a", "b"]})).unwrap();
//! assert_eq!(html, "<li>a</li><li>b</li>");
//! ```

pub mod codegen;
pub mod compiler;
pub mod error;
pub mod options;
pub mod preprocess;
pub mod token;
pub mod tokenizer;

// Re-export main types for convenience
pub use codegen::{assemble, emit, Generator, OUTPUT_BUFFER};
pub use compiler::{compile, compile_with, RenderFn, Template};
pub use error::{
    CompileError, CompileResult, RenderError, RenderResult, SyntaxError, SyntaxResult,
};
pub use options::CompileOptions;
pub use preprocess::normalize;
pub use token::{Token, TokenKind};
pub use tokenizer::tokenize;
