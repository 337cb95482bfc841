//! Parser for the directive language.
//!
//! A recursive descent parser over the token vector produced by the lexer.
//! Precedence, lowest first: sequence, assignment/arrow, conditional, `??`,
//! `||`, `&&`, equality, relational, additive, multiplicative, unary,
//! postfix, call/member, primary.

use std::sync::Arc;

use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{lex, parse_number, unquote};
use crate::token::{Token, TokenKind};

/// Statements and expressions nested deeper than this are rejected before
/// the recursion can exhaust the native stack.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Parse a function body: a statement list that may contain top-level `return`.
pub fn parse_body(source: &str) -> ParseResult<Vec<Stmt>> {
    let mut parser = Parser::new(source)?;
    let mut body = Vec::new();
    while !parser.is_at_end() {
        body.push(parser.parse_statement()?);
    }
    Ok(body)
}

/// Parse a single standalone expression.
pub fn parse_expression(source: &str) -> ParseResult<Expr> {
    let mut parser = Parser::new(source)?;
    let expr = parser.parse_expr()?;
    parser.expect(TokenKind::Eof)?;
    Ok(expr)
}

/// A left-associative infix operator.
#[derive(Clone, Copy)]
enum Infix {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// The parser state.
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl<'src> Parser<'src> {
    /// Lex `source` and position the parser on its first token.
    pub fn new(source: &'src str) -> ParseResult<Self> {
        Ok(Self {
            source,
            tokens: lex(source)?,
            pos: 0,
            depth: 0,
        })
    }

    // ============ Token helpers ============

    fn current(&self) -> Token {
        self.tokens[self.pos]
    }

    fn peek_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn text(&self, token: Token) -> &'src str {
        token.span.text(self.source)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.current();
        if token.kind == TokenKind::Eof {
            return ParseError::UnexpectedEof;
        }
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.text(token).to_string(),
            offset: token.span.start,
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        let token = self.expect(TokenKind::Ident)?;
        Ok(self.text(token).to_string())
    }

    /// Automatic semicolon insertion: a `;` may be left out before `}`, at
    /// the end of input, or when a line terminator precedes the next token.
    fn consume_semicolon(&mut self) -> ParseResult<()> {
        if self.consume(TokenKind::Semi) {
            return Ok(());
        }
        let token = self.current();
        if token.kind == TokenKind::RBrace || token.kind == TokenKind::Eof || token.newline_before
        {
            return Ok(());
        }
        Err(self.unexpected(";"))
    }

    /// Go one nesting level deeper, failing past [`MAX_NESTING_DEPTH`].
    fn enter(&mut self) -> ParseResult<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                offset: self.current().span.start,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Run `parse`, restoring the nesting depth afterwards. `parse` calls
    /// [`Self::enter`] once per level it adds to the tree.
    fn scoped<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let depth = self.depth;
        let result = parse(self);
        self.depth = depth;
        result
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.scoped(|p| {
            p.enter()?;
            parse(p)
        })
    }

    fn is_contextual(&self, offset: usize, word: &str) -> bool {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind == TokenKind::Ident && self.text(*t) == word)
            .unwrap_or(false)
    }

    // ============ Statements ============

    pub fn parse_statement(&mut self) -> ParseResult<Stmt> {
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> ParseResult<Stmt> {
        match self.current().kind {
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Semi => {
                self.advance();
                Ok(Stmt::Empty)
            }
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let stmt = self.parse_declaration()?;
                self.consume_semicolon()?;
                Ok(stmt)
            }
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let test = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt::While { test, body })
            }
            TokenKind::Do => {
                self.advance();
                let body = Box::new(self.parse_statement()?);
                self.expect(TokenKind::While)?;
                self.expect(TokenKind::LParen)?;
                let test = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                self.consume(TokenKind::Semi);
                Ok(Stmt::DoWhile { body, test })
            }
            TokenKind::Break => {
                self.advance();
                self.consume_semicolon()?;
                Ok(Stmt::Break)
            }
            TokenKind::Continue => {
                self.advance();
                self.consume_semicolon()?;
                Ok(Stmt::Continue)
            }
            TokenKind::Return => {
                self.advance();
                let token = self.current();
                let value = if matches!(
                    token.kind,
                    TokenKind::Semi | TokenKind::RBrace | TokenKind::Eof
                ) || token.newline_before
                {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.consume_semicolon()?;
                Ok(Stmt::Return(value))
            }
            TokenKind::Function if self.peek_kind(1) == TokenKind::Ident => {
                let def = self.parse_function()?;
                Ok(Stmt::Function(def))
            }
            _ => {
                let expr = self.parse_expr()?;
                self.consume_semicolon()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.is_at_end() {
                return Err(ParseError::UnexpectedEof);
            }
            stmts.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(stmts)
    }

    fn decl_kind(&mut self) -> Option<DeclKind> {
        let kind = match self.current().kind {
            TokenKind::Var => DeclKind::Var,
            TokenKind::Let => DeclKind::Let,
            TokenKind::Const => DeclKind::Const,
            _ => return None,
        };
        self.advance();
        Some(kind)
    }

    /// `var a = 1, b` without the trailing semicolon.
    fn parse_declaration(&mut self) -> ParseResult<Stmt> {
        let kind = self.decl_kind().ok_or_else(|| self.unexpected("declaration"))?;
        let mut decls = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let init = if self.consume(TokenKind::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            decls.push((name, init));
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        Ok(Stmt::Decl { kind, decls })
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let test = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.consume(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            test,
            consequent,
            alternate,
        })
    }

    fn parse_for(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;

        // `for (let x of xs)`, `for (k in obj)` and their undeclared forms.
        let has_decl = matches!(
            self.current().kind,
            TokenKind::Var | TokenKind::Let | TokenKind::Const
        );
        let skip = usize::from(has_decl);
        if self.peek_kind(skip) == TokenKind::Ident
            && (self.is_contextual(skip + 1, "of") || self.is_contextual(skip + 1, "in"))
        {
            let kind = self.decl_kind();
            let name = self.expect_ident()?;
            let keyword = self.advance();
            let is_of = self.text(keyword) == "of";
            let target = self.parse_expr()?;
            self.expect(TokenKind::RParen)?;
            let body = Box::new(self.parse_statement()?);
            return Ok(if is_of {
                Stmt::ForOf {
                    kind,
                    name,
                    iterable: target,
                    body,
                }
            } else {
                Stmt::ForIn {
                    kind,
                    name,
                    object: target,
                    body,
                }
            });
        }

        let init = if self.check(TokenKind::Semi) {
            None
        } else if has_decl {
            Some(Box::new(self.parse_declaration()?))
        } else {
            Some(Box::new(Stmt::Expr(self.parse_expr()?)))
        };
        self.expect(TokenKind::Semi)?;

        let test = if self.check(TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semi)?;

        let update = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::RParen)?;

        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::For {
            init,
            test,
            update,
            body,
        })
    }

    /// `function name?(a, b) { ... }`
    fn parse_function(&mut self) -> ParseResult<Arc<FunctionDef>> {
        self.expect(TokenKind::Function)?;
        let name = if self.check(TokenKind::Ident) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        let params = self.parse_params()?;
        let body = FunctionBody::Block(self.parse_block()?);
        Ok(Arc::new(FunctionDef { name, params, body }))
    }

    fn parse_params(&mut self) -> ParseResult<Vec<String>> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) {
            params.push(self.expect_ident()?);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    // ============ Expressions ============

    /// Parse a full expression, including the comma operator.
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        let first = self.parse_assignment()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while self.consume(TokenKind::Comma) {
            exprs.push(self.parse_assignment()?);
        }
        Ok(Expr::Sequence(exprs))
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        self.nested(Self::parse_assignment_inner)
    }

    fn parse_assignment_inner(&mut self) -> ParseResult<Expr> {
        if self.is_arrow_start() {
            return self.parse_arrow();
        }

        let start = self.current().span.start;
        let target = self.parse_conditional()?;

        let op = match self.current().kind {
            TokenKind::Eq => None,
            TokenKind::PlusEq => Some(BinaryOp::Add),
            TokenKind::MinusEq => Some(BinaryOp::Sub),
            TokenKind::StarEq => Some(BinaryOp::Mul),
            TokenKind::SlashEq => Some(BinaryOp::Div),
            TokenKind::PercentEq => Some(BinaryOp::Rem),
            _ => return Ok(target),
        };

        if !target.is_assignable() {
            return Err(ParseError::InvalidAssignmentTarget { offset: start });
        }
        self.advance();
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn is_arrow_start(&self) -> bool {
        match self.current().kind {
            TokenKind::Ident => self.peek_kind(1) == TokenKind::Arrow,
            TokenKind::LParen => {
                let mut depth = 0usize;
                for (i, token) in self.tokens[self.pos..].iter().enumerate() {
                    match token.kind {
                        TokenKind::LParen => depth += 1,
                        TokenKind::RParen => {
                            depth -= 1;
                            if depth == 0 {
                                return self.peek_kind(i + 1) == TokenKind::Arrow;
                            }
                        }
                        TokenKind::Eof => return false,
                        _ => {}
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn parse_arrow(&mut self) -> ParseResult<Expr> {
        let params = if self.check(TokenKind::Ident) {
            vec![self.expect_ident()?]
        } else {
            self.parse_params()?
        };
        self.expect(TokenKind::Arrow)?;
        let body = if self.check(TokenKind::LBrace) {
            FunctionBody::Block(self.parse_block()?)
        } else {
            FunctionBody::Expr(Box::new(self.parse_assignment()?))
        };
        Ok(Expr::Function(Arc::new(FunctionDef {
            name: None,
            params,
            body,
        })))
    }

    fn parse_conditional(&mut self) -> ParseResult<Expr> {
        let test = self.parse_nullish()?;
        if !self.consume(TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect(TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    /// Parse `operand (infix operand)*` into a left-leaning tree. Each
    /// operator adds a level, so long chains count toward the nesting limit.
    fn left_assoc(
        &mut self,
        operand: fn(&mut Self) -> ParseResult<Expr>,
        infix: fn(TokenKind) -> Option<Infix>,
    ) -> ParseResult<Expr> {
        self.scoped(|p| {
            let mut left = operand(p)?;
            while let Some(op) = infix(p.current().kind) {
                p.enter()?;
                p.advance();
                let right = operand(p)?;
                left = match op {
                    Infix::Binary(op) => binary(op, left, right),
                    Infix::Logical(op) => logical(op, left, right),
                };
            }
            Ok(left)
        })
    }

    fn parse_nullish(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::parse_or, |kind| match kind {
            TokenKind::Nullish => Some(Infix::Logical(LogicalOp::Nullish)),
            _ => None,
        })
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::parse_and, |kind| match kind {
            TokenKind::OrOr => Some(Infix::Logical(LogicalOp::Or)),
            _ => None,
        })
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::parse_equality, |kind| match kind {
            TokenKind::AndAnd => Some(Infix::Logical(LogicalOp::And)),
            _ => None,
        })
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::parse_relational, |kind| {
            let op = match kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::EqEqEq => BinaryOp::StrictEq,
                TokenKind::NotEqEq => BinaryOp::StrictNotEq,
                _ => return None,
            };
            Some(Infix::Binary(op))
        })
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::parse_additive, |kind| {
            let op = match kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => return None,
            };
            Some(Infix::Binary(op))
        })
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::parse_multiplicative, |kind| match kind {
            TokenKind::Plus => Some(Infix::Binary(BinaryOp::Add)),
            TokenKind::Minus => Some(Infix::Binary(BinaryOp::Sub)),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::parse_unary, |kind| {
            let op = match kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => return None,
            };
            Some(Infix::Binary(op))
        })
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        self.nested(Self::parse_unary_inner)
    }

    fn parse_unary_inner(&mut self) -> ParseResult<Expr> {
        let op = match self.current().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Typeof => UnaryOp::Typeof,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if self.advance().kind == TokenKind::PlusPlus {
                    UpdateOp::Inc
                } else {
                    UpdateOp::Dec
                };
                let start = self.current().span.start;
                let target = self.parse_unary()?;
                if !target.is_assignable() {
                    return Err(ParseError::InvalidAssignmentTarget { offset: start });
                }
                return Ok(Expr::Update {
                    op,
                    prefix: true,
                    target: Box::new(target),
                });
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let start = self.current().span.start;
        let expr = self.parse_call()?;
        let token = self.current();
        // `a\n++b` is `a; ++b`.
        if token.newline_before {
            return Ok(expr);
        }
        let op = match token.kind {
            TokenKind::PlusPlus => UpdateOp::Inc,
            TokenKind::MinusMinus => UpdateOp::Dec,
            _ => return Ok(expr),
        };
        if !expr.is_assignable() {
            return Err(ParseError::InvalidAssignmentTarget { offset: start });
        }
        self.advance();
        Ok(Expr::Update {
            op,
            prefix: false,
            target: Box::new(expr),
        })
    }

    fn parse_call(&mut self) -> ParseResult<Expr> {
        self.scoped(Self::parse_call_chain)
    }

    fn parse_call_chain(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if matches!(
                self.current().kind,
                TokenKind::Dot | TokenKind::LBracket | TokenKind::LParen
            ) {
                self.enter()?;
            }
            match self.current().kind {
                TokenKind::Dot => {
                    self.advance();
                    let token = self.current();
                    if !token.kind.is_word() {
                        return Err(self.unexpected("property name"));
                    }
                    self.advance();
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: MemberProp::Named(self.text(token).to_string()),
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: MemberProp::Computed(Box::new(index)),
                    };
                }
                TokenKind::LParen => {
                    let args = self.parse_args()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_args(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) {
            args.push(self.parse_assignment()?);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.current();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                Ok(Expr::Number(parse_number(self.text(token))?))
            }
            TokenKind::String => {
                self.advance();
                Ok(Expr::Str(unquote(self.text(token))))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Null)
            }
            TokenKind::Undefined => {
                self.advance();
                Ok(Expr::Undefined)
            }
            TokenKind::Ident => {
                self.advance();
                Ok(Expr::Ident(self.text(token).to_string()))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_array(),
            TokenKind::LBrace => self.parse_object(),
            TokenKind::Function => Ok(Expr::Function(self.parse_function()?)),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_array(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LBracket)?;
        let mut items = Vec::new();
        while !self.check(TokenKind::RBracket) {
            items.push(self.parse_assignment()?);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::Array(items))
    }

    fn parse_object(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LBrace)?;
        let mut props = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let token = self.current();
            let key = match token.kind {
                TokenKind::String => unquote(self.text(token)),
                TokenKind::Number => {
                    crate::value::number_to_string(parse_number(self.text(token))?)
                }
                kind if kind.is_word() => self.text(token).to_string(),
                _ => return Err(self.unexpected("property name")),
            };
            self.advance();

            let value = if self.consume(TokenKind::Colon) {
                self.parse_assignment()?
            } else if token.kind == TokenKind::Ident {
                // Shorthand `{ name }`.
                Expr::Ident(key.clone())
            } else {
                return Err(self.unexpected(":"));
            };
            props.push((key, value));

            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Object(props))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    Expr::Logical {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
