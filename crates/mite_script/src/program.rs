//! Parsed programs.

use tracing::debug;

use crate::ast::Stmt;
use crate::error::ParseResult;
use crate::parser::parse_body;

/// A parsed function body, ready to be run by an [`Interpreter`].
///
/// Programs are immutable and `Send + Sync`; one program may be run by any
/// number of interpreters, on any thread.
///
/// [`Interpreter`]: crate::Interpreter
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    body: Vec<Stmt>,
}

impl Program {
    /// Parse `source` as a function body.
    pub fn parse(source: &str) -> ParseResult<Self> {
        let body = parse_body(source)?;
        debug!(
            statements = body.len(),
            source_len = source.len(),
            "parsed program"
        );
        Ok(Self { body })
    }

    pub fn body(&self) -> &[Stmt] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Program>();
    }

    #[test]
    fn test_parse_empty() {
        assert!(Program::parse("").unwrap().body().is_empty());
    }
}
