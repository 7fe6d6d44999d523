//! Script source frontend
//!
//! The collaborator contract the rest of the crate builds on:
//! `parse_source(text) → Module | SyntaxError` and `print(&Module) → text`.
//! The printer is canonical, so printing a freshly parsed, untouched tree
//! normalizes formatting once and is then stable.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod token;

pub use ast::{BinOp, Block, Expr, FnDecl, Item, Module, Stmt, StmtKind, UnOp};
pub use lexer::tokenize;
pub use parser::{parse, ParseError};
pub use printer::{print, print_expr};
pub use token::{LexError, Token, TokenKind};

/// Errors produced while turning text into a tree
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Parse source text into a module
pub fn parse_source(source: &str) -> Result<Module, SyntaxError> {
    let tokens = tokenize(source)?;
    Ok(parse(&tokens)?)
}
