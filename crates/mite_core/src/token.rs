//! Template tokens.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// What a token contributes to the rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Raw text, reproduced verbatim.
    Literal,
    /// A statement (`<% ... %>`) that produces no output by itself.
    ControlFlow,
    /// An expression (`<%= ... %>`) whose value is appended to the output.
    Expression,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Literal => write!(f, "literal"),
            TokenKind::ControlFlow => write!(f, "control_flow"),
            TokenKind::Expression => write!(f, "expression"),
        }
    }
}

/// A scanned piece of a normalized template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub content: String,
    /// Byte range in the normalized template, markers included.
    pub span: Range<usize>,
}

impl Token {
    pub fn literal(content: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            kind: TokenKind::Literal,
            content: content.into(),
            span,
        }
    }

    pub fn control_flow(content: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            kind: TokenKind::ControlFlow,
            content: content.into(),
            span,
        }
    }

    pub fn expression(content: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            kind: TokenKind::Expression,
            content: content.into(),
            span,
        }
    }
}
