//! Tokeniser for dialplan source text.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use super::{Position, SyntaxResult};
use crate::error::SyntaxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum TokenKind {
    Ident(String),
    Variable(String),
    Str(String),
    Int(i64),
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Dot,
    Plus,
    Assign,
    EqEq,
    NotEq,
    Semi,
    Newline,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(formatter, "identifier `{name}`"),
            Self::Variable(name) => write!(formatter, "variable `${name}`"),
            Self::Str(_) => formatter.write_str("string literal"),
            Self::Int(value) => write!(formatter, "integer `{value}`"),
            Self::LBrace => formatter.write_str("`{`"),
            Self::RBrace => formatter.write_str("`}`"),
            Self::LParen => formatter.write_str("`(`"),
            Self::RParen => formatter.write_str("`)`"),
            Self::Comma => formatter.write_str("`,`"),
            Self::Dot => formatter.write_str("`.`"),
            Self::Plus => formatter.write_str("`+`"),
            Self::Assign => formatter.write_str("`=`"),
            Self::EqEq => formatter.write_str("`==`"),
            Self::NotEq => formatter.write_str("`!=`"),
            Self::Semi => formatter.write_str("`;`"),
            Self::Newline => formatter.write_str("end of line"),
            Self::Eof => formatter.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Token {
    pub(super) kind: TokenKind,
    pub(super) position: Position,
}

struct Lexer<'src> {
    chars: Peekable<Chars<'src>>,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
}

pub(super) fn tokenize(source: &str) -> SyntaxResult<Vec<Token>> {
    let mut lexer = Lexer {
        chars: source.chars().peekable(),
        line: 1,
        column: 1,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

impl Lexer<'_> {
    const fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let next = self.chars.next()?;
        if next == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(next)
    }

    fn push(&mut self, kind: TokenKind, position: Position) {
        self.tokens.push(Token { kind, position });
    }

    fn run(&mut self) -> SyntaxResult<()> {
        while let Some(&next) = self.chars.peek() {
            let start = self.position();
            match next {
                '\n' => {
                    self.bump();
                    self.push(TokenKind::Newline, start);
                }
                ch if ch.is_whitespace() => {
                    self.bump();
                }
                '#' => self.skip_comment(),
                '"' => {
                    let text = self.string_literal(start)?;
                    self.push(TokenKind::Str(text), start);
                }
                '$' => {
                    self.bump();
                    let name = self.identifier();
                    if name.is_empty() {
                        return Err(SyntaxError::new(
                            "expected a variable name after `$`",
                            start,
                        ));
                    }
                    self.push(TokenKind::Variable(name), start);
                }
                ch if ch.is_ascii_digit() => {
                    let value = self.integer(start)?;
                    self.push(TokenKind::Int(value), start);
                }
                ch if is_ident_start(ch) => {
                    let name = self.identifier();
                    self.push(TokenKind::Ident(name), start);
                }
                _ => {
                    let kind = self.punctuation(start)?;
                    self.push(kind, start);
                }
            }
        }
        let end = self.position();
        self.push(TokenKind::Eof, end);
        Ok(())
    }

    fn skip_comment(&mut self) {
        while let Some(&next) = self.chars.peek() {
            if next == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(&next) = self.chars.peek() {
            if !is_ident_continue(next) {
                break;
            }
            name.push(next);
            self.bump();
        }
        name
    }

    fn integer(&mut self, start: Position) -> SyntaxResult<i64> {
        let mut digits = String::new();
        while let Some(&next) = self.chars.peek() {
            if !next.is_ascii_digit() {
                break;
            }
            digits.push(next);
            self.bump();
        }
        digits
            .parse()
            .map_err(|_| SyntaxError::new(format!("integer `{digits}` is out of range"), start))
    }

    fn string_literal(&mut self, start: Position) -> SyntaxResult<String> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(text),
                Some('\\') => {
                    let escaped = self.bump().ok_or_else(|| unterminated(start))?;
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        '"' => '"',
                        '\\' => '\\',
                        other => {
                            return Err(SyntaxError::new(
                                format!("unknown escape sequence `\\{other}`"),
                                start,
                            ));
                        }
                    });
                }
                Some(ch) => text.push(ch),
                None => return Err(unterminated(start)),
            }
        }
    }

    fn punctuation(&mut self, start: Position) -> SyntaxResult<TokenKind> {
        let Some(ch) = self.bump() else {
            return Ok(TokenKind::Eof);
        };
        let kind = match ch {
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '+' => TokenKind::Plus,
            ';' => TokenKind::Semi,
            '=' if self.chars.peek() == Some(&'=') => {
                self.bump();
                TokenKind::EqEq
            }
            '=' => TokenKind::Assign,
            '!' if self.chars.peek() == Some(&'=') => {
                self.bump();
                TokenKind::NotEq
            }
            other => {
                return Err(SyntaxError::new(
                    format!("unexpected character `{other}`"),
                    start,
                ));
            }
        };
        Ok(kind)
    }
}

fn unterminated(start: Position) -> SyntaxError {
    SyntaxError::new("unterminated string literal", start)
}

const fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

const fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}
