//! Recursive-descent parser for script modules

use crate::util::span::Span;

use super::ast::*;
use super::token::{Token, TokenKind};

/// Parse error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Expected {expected}, found {found} at {span}")]
    ExpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unexpected token {found} at {span}")]
    UnexpectedToken { found: String, span: Span },
    #[error("{0}")]
    Message(String),
}

/// Parser state over a token stream
pub struct ParserState<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> ParserState<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn span(&self) -> Span {
        self.current().span
    }

    fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn skip(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(ParseError::ExpectedToken {
                expected: format!("{:?}", kind),
                found: format!("{:?}", self.current().kind),
                span: self.span(),
            })
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        match &self.current().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.span();
                self.bump();
                Ok((name, span))
            }
            other => Err(ParseError::ExpectedToken {
                expected: "identifier".to_string(),
                found: format!("{:?}", other),
                span: self.span(),
            }),
        }
    }

    /// Collect consecutive leading comment tokens
    fn take_comments(&mut self) -> Vec<String> {
        let mut comments = Vec::new();
        while let TokenKind::Comment(text) = &self.current().kind {
            comments.push(text.clone());
            self.bump();
        }
        comments
    }

    fn parse_module(&mut self) -> Result<Module, ParseError> {
        let mut items = Vec::new();
        loop {
            let comments = self.take_comments();
            if self.at_end() {
                // trailing comments have nothing to attach to
                break;
            }
            match self.current().kind {
                TokenKind::KwImport => {
                    let start = self.span();
                    self.bump();
                    let (name, end) = self.expect_ident()?;
                    items.push(Item::Import {
                        name,
                        comments,
                        span: start.merge(end),
                    });
                }
                TokenKind::KwFn => {
                    let mut decl = self.parse_fn()?;
                    decl.comments = comments;
                    items.push(Item::Fn(decl));
                }
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        found: format!("{:?}", self.current().kind),
                        span: self.span(),
                    })
                }
            }
        }
        Ok(Module { items })
    }

    fn parse_fn(&mut self) -> Result<FnDecl, ParseError> {
        let start = self.span();
        self.expect(&TokenKind::KwFn)?;
        let (name, _) = self.expect_ident()?;
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                let (param, _) = self.expect_ident()?;
                params.push(param);
                if !self.skip(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(FnDecl {
            name,
            params,
            body,
            comments: Vec::new(),
            span: start,
        })
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        loop {
            let comments = self.take_comments();
            if self.at(&TokenKind::RBrace) {
                // dangling comments before `}` are dropped
                break;
            }
            if self.at_end() {
                return Err(ParseError::Message("unexpected end of block".to_string()));
            }
            let mut stmt = self.parse_stmt()?;
            stmt.comments = comments;
            stmts.push(stmt);
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Block { stmts })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        match self.current().kind {
            TokenKind::KwLet => {
                self.bump();
                let (name, _) = self.expect_ident()?;
                self.expect(&TokenKind::Eq)?;
                let value = self.parse_expr(0)?;
                Ok(Stmt::new(StmtKind::Let { name, value }, start))
            }
            TokenKind::KwReturn => {
                self.bump();
                let value = if self.can_start_expr() {
                    Some(self.parse_expr(0)?)
                } else {
                    None
                };
                Ok(Stmt::new(StmtKind::Return(value), start))
            }
            TokenKind::KwIf => self.parse_if(start),
            TokenKind::KwWhile => {
                self.bump();
                let cond = self.parse_expr(0)?;
                let body = self.parse_block()?;
                Ok(Stmt::new(StmtKind::While { cond, body }, start))
            }
            _ => {
                let expr = self.parse_expr(0)?;
                if self.at(&TokenKind::Eq) {
                    if !matches!(expr, Expr::Path(..)) {
                        return Err(ParseError::Message(format!(
                            "invalid assignment target at {}",
                            start
                        )));
                    }
                    self.bump();
                    let value = self.parse_expr(0)?;
                    Ok(Stmt::new(
                        StmtKind::Assign {
                            target: expr,
                            value,
                        },
                        start,
                    ))
                } else if matches!(expr, Expr::Call { .. }) {
                    Ok(Stmt::new(StmtKind::Expr(expr), start))
                } else {
                    Err(ParseError::Message(format!(
                        "expression statement must be a call at {}",
                        start
                    )))
                }
            }
        }
    }

    fn parse_if(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::KwIf)?;
        let cond = self.parse_expr(0)?;
        let then_block = self.parse_block()?;
        let mut else_ifs = Vec::new();
        let mut else_block = None;
        while self.skip(&TokenKind::KwElse) {
            if self.skip(&TokenKind::KwIf) {
                let elif_cond = self.parse_expr(0)?;
                let elif_block = self.parse_block()?;
                else_ifs.push((elif_cond, elif_block));
            } else {
                else_block = Some(self.parse_block()?);
                break;
            }
        }
        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_block,
                else_ifs,
                else_block,
            },
            start,
        ))
    }

    fn can_start_expr(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Identifier(_)
                | TokenKind::IntLiteral(_)
                | TokenKind::BoolLiteral(_)
                | TokenKind::StringLiteral(_)
                | TokenKind::LParen
                | TokenKind::LBrace
                | TokenKind::Minus
                | TokenKind::Not
        )
    }

    fn parse_expr(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::Neq => BinOp::Neq,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Ge => BinOp::Ge,
                TokenKind::And => BinOp::And,
                TokenKind::Or => BinOp::Or,
                _ => break,
            };
            let prec = op.precedence();
            if prec <= min_prec {
                break;
            }
            self.bump();
            let rhs = self.parse_expr(prec)?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let span = self.span();
        let op = match self.current().kind {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Not => Some(UnOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let expr = self.parse_unary()?;
            let span = span.merge(expr.span());
            return Ok(Expr::Unary {
                op,
                expr: Box::new(expr),
                span,
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let span = self.span();
        match self.current().kind.clone() {
            TokenKind::StringLiteral(value) => {
                self.bump();
                Ok(Expr::Str(value, span))
            }
            TokenKind::IntLiteral(value) => {
                self.bump();
                Ok(Expr::Int(value, span))
            }
            TokenKind::BoolLiteral(value) => {
                self.bump();
                Ok(Expr::Bool(value, span))
            }
            TokenKind::Identifier(_) => self.parse_path_or_call(),
            TokenKind::LParen => {
                self.bump();
                let expr = self.parse_expr(0)?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBrace => self.parse_map(span),
            other => Err(ParseError::UnexpectedToken {
                found: format!("{:?}", other),
                span,
            }),
        }
    }

    fn parse_path_or_call(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        let (first, mut end) = self.expect_ident()?;
        let mut segments = vec![first];
        while self.skip(&TokenKind::Dot) {
            let (segment, segment_span) = self.expect_ident()?;
            segments.push(segment);
            end = segment_span;
        }
        if self.at(&TokenKind::LParen) {
            self.bump();
            let mut args = Vec::new();
            if !self.at(&TokenKind::RParen) {
                loop {
                    args.push(self.parse_expr(0)?);
                    if !self.skip(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            let close = self.expect(&TokenKind::RParen)?;
            Ok(Expr::Call {
                func: segments,
                args,
                span: start.merge(close.span),
            })
        } else {
            Ok(Expr::Path(segments, start.merge(end)))
        }
    }

    fn parse_map(&mut self, start: Span) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let mut entries = Vec::new();
        if !self.at(&TokenKind::RBrace) {
            loop {
                let key = match self.current().kind.clone() {
                    TokenKind::StringLiteral(key) => {
                        self.bump();
                        key
                    }
                    other => {
                        return Err(ParseError::ExpectedToken {
                            expected: "string key".to_string(),
                            found: format!("{:?}", other),
                            span: self.span(),
                        })
                    }
                };
                self.expect(&TokenKind::Colon)?;
                let value = self.parse_expr(0)?;
                entries.push((key, value));
                if !self.skip(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let close = self.expect(&TokenKind::RBrace)?;
        Ok(Expr::Map {
            entries,
            span: start.merge(close.span),
        })
    }
}

/// Parse tokens into a module
pub fn parse(tokens: &[Token]) -> Result<Module, ParseError> {
    let mut state = ParserState::new(tokens);
    state.parse_module()
}
