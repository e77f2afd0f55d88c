//! Recursive-descent parser producing [`Declaration`]s.

use super::ast::{Block, CompareOp, Declaration, Expr, Literal, Statement};
use super::lexer::{Token, TokenKind, tokenize};
use super::{Position, SyntaxResult};
use crate::error::SyntaxError;

const KEYWORDS: &[&str] = &["let", "if", "else", "return", "true", "false", "nil"];

/// Deepest combined nesting of bodies and expressions accepted in one context.
pub(crate) const MAX_NESTING: usize = 128;

/// Parses dialplan source into its top-level declarations.
///
/// Every body is parsed in full, so a malformed routing action anywhere in the
/// file fails the whole parse.
pub(crate) fn parse_declarations(source: &str) -> SyntaxResult<Vec<Declaration>> {
    let tokens = tokenize(source)?;
    let end = tokens.last().map_or_else(
        || Token {
            kind: TokenKind::Eof,
            position: Position::new(1, 1),
        },
        Clone::clone,
    );
    Parser {
        tokens,
        end,
        index: 0,
        depth: 0,
    }
    .declarations()
}

struct Parser {
    tokens: Vec<Token>,
    end: Token,
    index: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens.get(self.index).unwrap_or(&self.end)
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_second(&self) -> &TokenKind {
        self.tokens
            .get(self.index + 1)
            .map_or(&self.end.kind, |token| &token.kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.index += 1;
        }
        token
    }

    fn error_here(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.peek().position)
    }

    fn expect(&mut self, kind: &TokenKind, context: &str) -> SyntaxResult<Position> {
        if self.peek_kind() == kind {
            return Ok(self.advance().position);
        }
        Err(self.error_here(format!(
            "expected {kind} {context}, found {}",
            self.peek_kind()
        )))
    }

    fn nested<T>(&mut self, parse: fn(&mut Self) -> SyntaxResult<T>) -> SyntaxResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here(format!(
                "nesting too deep: more than {MAX_NESTING} levels of bodies and expressions"
            )));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semi) {
            self.advance();
        }
    }

    fn skip_newlines(&mut self) {
        while *self.peek_kind() == TokenKind::Newline {
            self.advance();
        }
    }

    fn declarations(mut self) -> SyntaxResult<Vec<Declaration>> {
        let mut declarations = Vec::new();
        loop {
            self.skip_separators();
            if *self.peek_kind() == TokenKind::Eof {
                return Ok(declarations);
            }
            declarations.push(self.declaration()?);
        }
    }

    fn declaration(&mut self) -> SyntaxResult<Declaration> {
        let token = self.advance();
        let TokenKind::Ident(name) = token.kind else {
            return Err(SyntaxError::new(
                format!("expected a context declaration, found {}", token.kind),
                token.position,
            ));
        };
        if KEYWORDS.contains(&name.as_str()) {
            return Err(SyntaxError::new(
                format!("`{name}` is a reserved word and cannot name a context"),
                token.position,
            ));
        }

        match self.peek_kind() {
            TokenKind::LBrace => {}
            TokenKind::LParen
            | TokenKind::Str(_)
            | TokenKind::Int(_)
            | TokenKind::Ident(_)
            | TokenKind::Variable(_) => {
                return Err(self.error_here(format!(
                    "context `{name}` takes no positional arguments"
                )));
            }
            _ => {
                return Err(SyntaxError::new(
                    format!("context `{name}` is missing a `{{ ... }}` body"),
                    token.position,
                ));
            }
        }

        let body = self.block()?;
        Ok(Declaration {
            name,
            position: token.position,
            body,
        })
    }

    fn block(&mut self) -> SyntaxResult<Block> {
        self.nested(Self::block_body)
    }

    fn block_body(&mut self) -> SyntaxResult<Block> {
        let open = self.expect(&TokenKind::LBrace, "to open a body")?;
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            match self.peek_kind() {
                TokenKind::RBrace => {
                    self.advance();
                    return Ok(Block { statements });
                }
                TokenKind::Eof => {
                    return Err(SyntaxError::new(
                        "body opened here is never closed",
                        open,
                    ));
                }
                _ => {}
            }
            statements.push(self.statement()?);
            if !matches!(
                self.peek_kind(),
                TokenKind::Newline | TokenKind::Semi | TokenKind::RBrace
            ) {
                return Err(self.error_here(format!(
                    "expected end of statement, found {}",
                    self.peek_kind()
                )));
            }
        }
    }

    fn statement(&mut self) -> SyntaxResult<Statement> {
        match self.peek_kind().clone() {
            TokenKind::Plus => {
                self.advance();
                Ok(Statement::Transfer(self.expression()?))
            }
            TokenKind::Variable(name) if *self.peek_second() == TokenKind::Assign => {
                self.advance();
                self.advance();
                Ok(Statement::SetVariable {
                    name,
                    value: self.expression()?,
                })
            }
            TokenKind::Ident(word) => match word.as_str() {
                "let" => self.let_binding(),
                "if" => self.conditional(),
                "return" => {
                    self.advance();
                    Ok(Statement::Return)
                }
                "else" => Err(self.error_here("`else` without a preceding `if`")),
                _ => Ok(Statement::Expr(self.expression()?)),
            },
            _ => Ok(Statement::Expr(self.expression()?)),
        }
    }

    fn let_binding(&mut self) -> SyntaxResult<Statement> {
        self.advance();
        let token = self.advance();
        let name = match token.kind {
            TokenKind::Ident(name) if !KEYWORDS.contains(&name.as_str()) => name,
            other => {
                return Err(SyntaxError::new(
                    format!("expected a binding name after `let`, found {other}"),
                    token.position,
                ));
            }
        };
        self.expect(&TokenKind::Assign, "after the binding name")?;
        Ok(Statement::Let {
            name,
            value: self.expression()?,
        })
    }

    fn conditional(&mut self) -> SyntaxResult<Statement> {
        self.advance();
        let mut branches = vec![(self.expression()?, self.block()?)];
        let mut otherwise = None;

        loop {
            let resume = self.index;
            self.skip_newlines();
            if *self.peek_kind() != TokenKind::Ident("else".to_owned()) {
                self.index = resume;
                break;
            }
            self.advance();
            if *self.peek_kind() == TokenKind::Ident("if".to_owned()) {
                self.advance();
                branches.push((self.expression()?, self.block()?));
                continue;
            }
            otherwise = Some(self.block()?);
            break;
        }

        Ok(Statement::If {
            branches,
            otherwise,
        })
    }

    fn expression(&mut self) -> SyntaxResult<Expr> {
        self.nested(Self::comparison)
    }

    fn comparison(&mut self) -> SyntaxResult<Expr> {
        let mut lhs = self.postfix()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => CompareOp::Eq,
                TokenKind::NotEq => CompareOp::NotEq,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.postfix()?;
            lhs = Expr::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn postfix(&mut self) -> SyntaxResult<Expr> {
        let mut expr = self.atom()?;
        while *self.peek_kind() == TokenKind::Dot {
            self.advance();
            let token = self.advance();
            let TokenKind::Ident(method) = token.kind else {
                return Err(SyntaxError::new(
                    format!("expected a method name after `.`, found {}", token.kind),
                    token.position,
                ));
            };
            let args = if *self.peek_kind() == TokenKind::LParen {
                self.arguments()?
            } else {
                Vec::new()
            };
            expr = Expr::Method {
                receiver: Box::new(expr),
                method,
                args,
            };
        }
        Ok(expr)
    }

    fn atom(&mut self) -> SyntaxResult<Expr> {
        let token = self.advance();
        let expr = match token.kind {
            TokenKind::Str(text) => Expr::Literal(Literal::Str(text)),
            TokenKind::Int(value) => Expr::Literal(Literal::Int(value)),
            TokenKind::Variable(name) => Expr::Variable(name),
            TokenKind::LParen => {
                let inner = self.expression()?;
                self.expect(&TokenKind::RParen, "to close the group")?;
                inner
            }
            TokenKind::Ident(name) => {
                if let Some(literal) = keyword_literal(&name) {
                    Expr::Literal(literal)
                } else if KEYWORDS.contains(&name.as_str()) {
                    return Err(SyntaxError::new(
                        format!("unexpected keyword `{name}` in expression"),
                        token.position,
                    ));
                } else if *self.peek_kind() == TokenKind::LParen {
                    let args = self.arguments()?;
                    Expr::Call { name, args }
                } else {
                    Expr::Name(name)
                }
            }
            other => {
                return Err(SyntaxError::new(
                    format!("expected an expression, found {other}"),
                    token.position,
                ));
            }
        };
        Ok(expr)
    }

    fn arguments(&mut self) -> SyntaxResult<Vec<Expr>> {
        self.expect(&TokenKind::LParen, "to open an argument list")?;
        let mut args = Vec::new();
        self.skip_newlines();
        if *self.peek_kind() == TokenKind::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            self.skip_newlines();
            args.push(self.expression()?);
            self.skip_newlines();
            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RParen => {
                    self.advance();
                    return Ok(args);
                }
                other => {
                    return Err(self.error_here(format!(
                        "expected `,` or `)` in argument list, found {other}"
                    )));
                }
            }
        }
    }
}

fn keyword_literal(word: &str) -> Option<Literal> {
    match word {
        "true" => Some(Literal::Bool(true)),
        "false" => Some(Literal::Bool(false)),
        "nil" => Some(Literal::Nil),
        _ => None,
    }
}
