//! Front-end for dialplan source text.
//!
//! Source is tokenised by [`lexer`] and parsed by [`parser`] into a list of
//! top-level declarations. Bodies are parsed eagerly so malformed routing
//! actions fail the load, but they are only evaluated once a call runs them.

pub(crate) mod ast;
mod lexer;
mod parser;

use std::fmt;

use crate::error::SyntaxError;

pub(crate) use self::parser::{MAX_NESTING, parse_declarations};

/// A one-based line and column position within dialplan source.
///
/// # Example
///
/// ```
/// use switchboard_dialplan::Position;
///
/// let position = Position::new(3, 7);
/// assert_eq!(position.line(), 3);
/// assert_eq!(position.to_string(), "3:7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    line: u32,
    column: u32,
}

impl Position {
    /// Creates a position from one-based coordinates.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// One-based line number.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// One-based column number, counted in characters.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

impl fmt::Display for Position {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line, self.column)
    }
}

pub(crate) type SyntaxResult<T> = Result<T, SyntaxError>;
