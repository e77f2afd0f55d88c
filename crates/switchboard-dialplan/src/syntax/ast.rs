//! Syntax tree for dialplan declarations and routing actions.

use super::Position;

/// A top-level `name { ... }` declaration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Declaration {
    pub(crate) name: String,
    pub(crate) position: Position,
    pub(crate) body: Block,
}

/// A brace-delimited statement list.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Block {
    pub(crate) statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Statement {
    /// `+ target`
    Transfer(Expr),
    /// `let name = value`
    Let { name: String, value: Expr },
    /// `$name = value`
    SetVariable { name: String, value: Expr },
    If {
        branches: Vec<(Expr, Block)>,
        otherwise: Option<Block>,
    },
    Return,
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Literal {
    Nil,
    Bool(bool),
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    NotEq,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Literal),
    /// `$name`
    Variable(String),
    /// A bare identifier.
    Name(String),
    /// `name(args)`
    Call { name: String, args: Vec<Expr> },
    /// `receiver.method(args)`
    Method {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}
