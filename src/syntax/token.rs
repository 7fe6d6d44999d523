//! Token types for the script language

use crate::util::span::Span;

/// Lexer error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Unterminated string starting at {position}")]
    UnterminatedString { position: String },
    #[error("Invalid escape sequence: {sequence}")]
    InvalidEscape { sequence: String },
    #[error("Invalid number literal: {0}")]
    InvalidNumber(String),
    #[error("Unexpected character: '{ch}' at {position}")]
    UnexpectedChar { ch: char, position: String },
}

/// Token kind
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    KwFn,
    KwImport,
    KwLet,
    KwReturn,
    KwIf,
    KwElse,
    KwWhile,

    // Identifiers
    Identifier(String),

    // Literals
    IntLiteral(i64),
    BoolLiteral(bool),
    StringLiteral(String),

    // Comments (leading `//` text, kept for reprinting)
    Comment(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    EqEq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,

    // Special
    Eof,
}

/// Token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
