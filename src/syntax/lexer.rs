//! Hand-rolled lexer for script modules
//!
//! Produces a flat token stream; comments are kept as tokens so the
//! printer can re-emit them in front of the statement they precede.

use crate::util::span::{Position, Span};

use super::token::{LexError, Token, TokenKind};

/// Lexer state
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// Lex one token; `None` at end of input
    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();
        let start = self.position();
        let ch = match self.peek() {
            Some(c) => c,
            None => return Ok(None),
        };

        // Line comment
        if ch == '/' && self.peek_next() == Some('/') {
            self.bump();
            self.bump();
            let mut text = String::new();
            while let Some(c) = self.peek() {
                if c == '\n' {
                    break;
                }
                text.push(c);
                self.bump();
            }
            return Ok(Some(Token::new(
                TokenKind::Comment(text),
                Span::new(start, self.position()),
            )));
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            return Ok(Some(self.lex_ident(start)));
        }
        if ch.is_ascii_digit() {
            return self.lex_number(start).map(Some);
        }
        if ch == '"' {
            return self.lex_string(start).map(Some);
        }

        self.bump();
        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::Neq
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.bump();
                    TokenKind::And
                } else {
                    return Err(LexError::UnexpectedChar {
                        ch,
                        position: start.to_string(),
                    });
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.bump();
                    TokenKind::Or
                } else {
                    return Err(LexError::UnexpectedChar {
                        ch,
                        position: start.to_string(),
                    });
                }
            }
            _ => {
                return Err(LexError::UnexpectedChar {
                    ch,
                    position: start.to_string(),
                })
            }
        };
        Ok(Some(Token::new(kind, Span::new(start, self.position()))))
    }

    fn lex_ident(&mut self, start: Position) -> Token {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let kind = match name.as_str() {
            "fn" => TokenKind::KwFn,
            "import" => TokenKind::KwImport,
            "let" => TokenKind::KwLet,
            "return" => TokenKind::KwReturn,
            "if" => TokenKind::KwIf,
            "else" => TokenKind::KwElse,
            "while" => TokenKind::KwWhile,
            "true" => TokenKind::BoolLiteral(true),
            "false" => TokenKind::BoolLiteral(false),
            _ => TokenKind::Identifier(name),
        };
        Token::new(kind, Span::new(start, self.position()))
    }

    fn lex_number(&mut self, start: Position) -> Result<Token, LexError> {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let value: i64 = digits
            .parse()
            .map_err(|_| LexError::InvalidNumber(digits.clone()))?;
        Ok(Token::new(
            TokenKind::IntLiteral(value),
            Span::new(start, self.position()),
        ))
    }

    fn lex_string(&mut self, start: Position) -> Result<Token, LexError> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            let ch = match self.bump() {
                Some(c) => c,
                None => {
                    return Err(LexError::UnterminatedString {
                        position: start.to_string(),
                    })
                }
            };
            match ch {
                '"' => break,
                '\\' => {
                    let esc = self.bump().ok_or(LexError::UnterminatedString {
                        position: start.to_string(),
                    })?;
                    match esc {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '"' => value.push('"'),
                        '\\' => value.push('\\'),
                        other => {
                            return Err(LexError::InvalidEscape {
                                sequence: format!("\\{}", other),
                            })
                        }
                    }
                }
                '\n' => {
                    return Err(LexError::UnterminatedString {
                        position: start.to_string(),
                    })
                }
                other => value.push(other),
            }
        }
        Ok(Token::new(
            TokenKind::StringLiteral(value),
            Span::new(start, self.position()),
        ))
    }

}

/// Tokenize source code, appending a trailing `Eof` token
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    tokens.push(Token::new(
        TokenKind::Eof,
        Span::new(lexer.position(), lexer.position()),
    ));
    Ok(tokens)
}
