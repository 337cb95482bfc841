//! Lexer for the directive language.
//!
//! Wraps the `logos` generated scanner, folds line terminators into the
//! `newline_before` flag of the following token and decodes literals.

use logos::Logos;

use crate::error::{ParseError, ParseResult};
use crate::token::{Span, Token, TokenKind};

/// Scan `source` into tokens, terminated by a single `Eof` token.
pub fn lex(source: &str) -> ParseResult<Vec<Token>> {
    let mut inner = TokenKind::lexer(source);
    let mut tokens = Vec::new();
    let mut newline_before = false;

    while let Some(result) = inner.next() {
        let span = inner.span();
        match result {
            Ok(TokenKind::LineTerminator) => newline_before = true,
            Ok(kind) => {
                tokens.push(Token::new(
                    kind,
                    Span::new(span.start, span.end),
                    newline_before,
                ));
                newline_before = false;
            }
            Err(()) => {
                let ch = source[span.start..].chars().next().unwrap_or('\0');
                return Err(ParseError::UnexpectedChar {
                    ch,
                    offset: span.start,
                });
            }
        }
    }

    let end = source.len();
    tokens.push(Token::new(TokenKind::Eof, Span::new(end, end), newline_before));
    Ok(tokens)
}

/// Decode a quoted string literal, including its quotes.
pub fn unquote(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let hex: String = (0..4)
                    .filter_map(|_| chars.next_if(char::is_ascii_hexdigit))
                    .collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => out.push(decoded),
                    _ => {
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            // Unknown escapes stand for the escaped character itself.
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

/// Parse a numeric literal as scanned by the lexer.
pub fn parse_number(raw: &str) -> ParseResult<f64> {
    let parsed = if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map(|n| n as f64).ok()
    } else {
        raw.parse::<f64>().ok()
    };
    parsed.ok_or_else(|| ParseError::InvalidNumber(raw.to_string()))
}
