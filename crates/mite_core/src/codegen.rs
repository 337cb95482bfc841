//! Turns tokens into the source of a render function body.
//!
//! The body pushes every piece of output onto an array and joins it at the
//! end:
//!
//! ```text
//! var __mite_out = [];
//! __mite_out.push('<li>');
//! __mite_out.push(item.name);
//! return __mite_out.join('');
//! ```
//!
//! Fragments are separated by newlines so a `//` comment in one directive
//! cannot swallow the code after it.

use crate::options::CompileOptions;
use crate::token::{Token, TokenKind};

/// Name of the output buffer inside generated code.
pub const OUTPUT_BUFFER: &str = "__mite_out";

/// Code generator for one compilation.
#[derive(Debug, Clone)]
pub struct Generator {
    escape_literals: bool,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(&CompileOptions::default())
    }
}

impl Generator {
    pub fn new(options: &CompileOptions) -> Self {
        Self {
            escape_literals: options.escape_literals,
        }
    }

    /// Code fragment for a single token.
    pub fn emit(&self, token: &Token) -> String {
        match token.kind {
            TokenKind::ControlFlow => format!("{};", token.content),
            TokenKind::Expression => format!("{}.push({});", OUTPUT_BUFFER, token.content),
            TokenKind::Literal if self.escape_literals => {
                format!("{}.push('{}');", OUTPUT_BUFFER, escape_literal(&token.content))
            }
            TokenKind::Literal => format!("{}.push('{}');", OUTPUT_BUFFER, token.content),
        }
    }

    /// Wrap fragments, in order, into a complete function body.
    pub fn assemble<I, S>(&self, fragments: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut body = format!("var {} = [];\n", OUTPUT_BUFFER);
        for fragment in fragments {
            body.push_str(fragment.as_ref());
            body.push('\n');
        }
        body.push_str(&format!("return {}.join('');", OUTPUT_BUFFER));
        body
    }

    /// Emit and assemble a whole token sequence.
    pub fn generate(&self, tokens: &[Token]) -> String {
        self.assemble(tokens.iter().map(|token| self.emit(token)))
    }
}

/// [`Generator::emit`] with default options.
pub fn emit(token: &Token) -> String {
    Generator::default().emit(token)
}

/// [`Generator::assemble`] with default options.
pub fn assemble<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Generator::default().assemble(fragments)
}

/// Make normalized literal text safe inside a single-quoted string literal.
///
/// `\` followed by `n` is kept, since that is how the preprocessor encodes
/// a newline; any other backslash is doubled.
pub fn escape_literal(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' => out.push_str("\\'"),
            '\r' => out.push_str("\\r"),
            '\\' if chars.peek() == Some(&'n') => out.push('\\'),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_control_flow() {
        assert_eq!(emit(&Token::control_flow(" if (x) { ", 0..14)), " if (x) { ;");
    }

    #[test]
    fn test_emit_expression() {
        assert_eq!(emit(&Token::expression("user.name", 0..16)), "__mite_out.push(user.name);");
    }

    #[test]
    fn test_emit_literal_escapes_quotes() {
        assert_eq!(
            emit(&Token::literal("it's", 0..4)),
            r"__mite_out.push('it\'s');"
        );
    }

    #[test]
    fn test_emit_literal_unescaped() {
        let generator = Generator::new(&CompileOptions::default().escape_literals(false));
        assert_eq!(
            generator.emit(&Token::literal("it's", 0..4)),
            "__mite_out.push('it's');"
        );
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal(r"a\nb"), r"a\nb");
        assert_eq!(escape_literal(r"C:\temp"), r"C:\\temp");
        assert_eq!(escape_literal("a\rb"), r"a\rb");
        assert_eq!(escape_literal(r"end\"), r"end\\");
    }

    #[test]
    fn test_assemble() {
        let body = assemble(["a;", "b;"]);
        assert_eq!(body, "var __mite_out = [];\na;\nb;\nreturn __mite_out.join('');");
    }

    #[test]
    fn test_assemble_empty() {
        assert_eq!(
            assemble(Vec::<String>::new()),
            "var __mite_out = [];\nreturn __mite_out.join('');"
        );
    }

    #[test]
    fn test_generate() {
        let tokens = vec![
            Token::literal("<b>", 0..3),
            Token::expression("x", 3..11),
        ];
        let body = Generator::default().generate(&tokens);
        assert!(body.contains("__mite_out.push('<b>');\n__mite_out.push(x);"));
    }
}
