//! # mite_script
//!
//! The script engine behind mite templates.
//!
//! Compiled templates are function bodies written in a small JavaScript
//! subset. This crate parses such a body once into a [`Program`] and runs it
//! with an [`Interpreter`], one per render.
//!
//! # Architecture
//!
//! - **Lexer**: `logos`-based tokenizer; the two characters `\n` count as a
//!   line terminator
//! - **Parser**: recursive descent with automatic semicolon insertion
//! - **Interpreter**: tree-walking evaluator over [`Value`]s
//! - **Builtins**: `Math`, `JSON`, `Object`, string/array/number methods
//!
//! # Example
//!
//! ```rust
//! use mite_script::{Interpreter, Program, Value};
//!
//! let program = Program::parse("return greeting + ', ' + name;").unwrap();
//! let mut interp = Interpreter::new();
//! interp.define("greeting", Value::from("Hello"));
//! interp.define("name", Value::from("mite"));
//! assert_eq!(interp.run(&program).unwrap().to_string(), "Hello, mite");
//! ```

pub mod ast;
mod builtins;
pub mod error;
mod interp;
pub mod lexer;
pub mod ops;
pub mod parser;
mod program;
pub mod token;
pub mod value;

pub use error::{ParseError, ParseResult, RuntimeError, RuntimeResult};
pub use interp::Interpreter;
pub use program::Program;
pub use value::Value;
