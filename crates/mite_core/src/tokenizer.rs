//! Splits a normalized template into literal and directive tokens.

use std::ops::Range;

use tracing::trace;

use crate::error::{SyntaxError, SyntaxResult};
use crate::token::Token;

/// Opens a directive.
pub const OPEN: &str = "<%";

/// Closes a directive.
pub const CLOSE: &str = "%>";

/// Leading character marking an output directive.
const EXPRESSION_DESCRIPTOR: char = '=';

/// Tokenize a normalized template.
///
/// Tokens come out in scan order and are never merged. The search for the
/// closing marker starts at the opening marker itself, so `<%>` is a
/// complete (empty) directive.
pub fn tokenize(template: &str) -> SyntaxResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    while cursor < template.len() {
        let token = if template[cursor..].starts_with(OPEN) {
            scan_directive(template, cursor)?
        } else {
            scan_literal(template, cursor)
        };
        trace!(kind = %token.kind, span = ?token.span, "scanned token");
        cursor = token.span.end;
        tokens.push(token);
    }

    Ok(tokens)
}

fn scan_directive(template: &str, start: usize) -> SyntaxResult<Token> {
    let close = template[start..]
        .find(CLOSE)
        .map(|i| start + i)
        .ok_or(SyntaxError::UnterminatedDirective { offset: start })?;

    let body_start = start + OPEN.len();
    // In `<%>` the closing marker overlaps the opening one.
    let body = if close >= body_start {
        &template[body_start..close]
    } else {
        ""
    };

    Ok(classify(body, start..close + CLOSE.len()))
}

fn scan_literal(template: &str, start: usize) -> Token {
    let end = template[start..]
        .find(OPEN)
        .map(|i| start + i)
        .unwrap_or(template.len());
    Token::literal(&template[start..end], start..end)
}

fn classify(body: &str, span: Range<usize>) -> Token {
    match body.strip_prefix(EXPRESSION_DESCRIPTOR) {
        Some(expression) => Token::expression(expression.trim(), span),
        None => Token::control_flow(body, span),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn kinds(template: &str) -> Vec<TokenKind> {
        tokenize(template).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_template() {
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_plain_text_is_one_literal() {
        let tokens = tokenize("hello world").unwrap();
        assert_eq!(tokens, vec![Token::literal("hello world", 0..11)]);
    }

    #[test]
    fn test_expression_is_trimmed() {
        let tokens = tokenize("<%=  x  %>").unwrap();
        assert_eq!(tokens, vec![Token::expression("x", 0..10)]);
    }

    #[test]
    fn test_control_flow_is_verbatim() {
        let tokens = tokenize("<% if (x) { %>").unwrap();
        assert_eq!(tokens, vec![Token::control_flow(" if (x) { ", 0..14)]);
    }

    #[test]
    fn test_mixed_sequence() {
        assert_eq!(
            kinds("a<% b %>c<%= d %>e"),
            vec![
                TokenKind::Literal,
                TokenKind::ControlFlow,
                TokenKind::Literal,
                TokenKind::Expression,
                TokenKind::Literal,
            ]
        );
    }

    #[test]
    fn test_adjacent_directives() {
        let tokens = tokenize("<% x=1 %><%= x %>").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::control_flow(" x=1 ", 0..9),
                Token::expression("x", 9..17),
            ]
        );
    }

    #[test]
    fn test_unterminated_directive() {
        assert_eq!(
            tokenize("<% foo"),
            Err(SyntaxError::UnterminatedDirective { offset: 0 })
        );
        assert_eq!(
            tokenize("<% foo %"),
            Err(SyntaxError::UnterminatedDirective { offset: 0 })
        );
        assert_eq!(
            tokenize("ab<%= x %><%"),
            Err(SyntaxError::UnterminatedDirective { offset: 10 })
        );
    }

    #[test]
    fn test_overlapping_markers() {
        let tokens = tokenize("<%>x").unwrap();
        assert_eq!(
            tokens,
            vec![Token::control_flow("", 0..3), Token::literal("x", 3..4)]
        );
    }

    #[test]
    fn test_descriptor_only_expression() {
        assert_eq!(tokenize("<%=%>").unwrap(), vec![Token::expression("", 0..5)]);
    }

    #[test]
    fn test_percent_inside_literal() {
        assert_eq!(
            tokenize("100% done %>").unwrap(),
            vec![Token::literal("100% done %>", 0..12)]
        );
    }

    #[test]
    fn test_multibyte_literal_spans() {
        let template = "héllo<%= x %>";
        let tokens = tokenize(template).unwrap();
        assert_eq!(&template[tokens[0].span.clone()], "héllo");
        assert_eq!(tokens[1].span, 6..template.len());
    }
}
