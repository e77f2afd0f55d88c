//! Runtime values produced and consumed by context bodies.

use std::fmt;

use crate::capability::ComponentHandle;
use crate::context::DialplanContext;

/// A value flowing through a running context body.
///
/// Context references and component instances compare by identity; every
/// other variant compares by value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value. Missing call variables read as `nil`.
    #[default]
    Nil,
    /// Boolean literal or comparison result.
    Bool(bool),
    /// Signed integer literal.
    Int(i64),
    /// Text, including call-variable values.
    Str(String),
    /// First-class reference to a registered context.
    Context(DialplanContext),
    /// A pre-bound component class, instantiated with `.new(...)`.
    ComponentClass(String),
    /// A component instance bound to the running call.
    Component(ComponentHandle),
}

impl Value {
    /// Returns `false` for `nil` and `false`, `true` for everything else.
    #[must_use]
    pub const fn is_truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Bool(false))
    }

    /// Borrows the text of a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(text) => Some(text),
            _ => None,
        }
    }

    /// Borrows the context of a context reference.
    #[must_use]
    pub const fn as_context(&self) -> Option<&DialplanContext> {
        match self {
            Self::Context(context) => Some(context),
            _ => None,
        }
    }

    /// Short description used in error messages, e.g. `string "abc"`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Nil => "nil".to_owned(),
            Self::Bool(flag) => format!("boolean {flag}"),
            Self::Int(number) => format!("integer {number}"),
            Self::Str(text) => format!("string {text:?}"),
            Self::Context(context) => format!("context '{}'", context.name()),
            Self::ComponentClass(class) => format!("component class '{class}'"),
            Self::Component(handle) => format!("'{}' component", handle.class()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(lhs), Self::Bool(rhs)) => lhs == rhs,
            (Self::Int(lhs), Self::Int(rhs)) => lhs == rhs,
            (Self::Str(lhs), Self::Str(rhs))
            | (Self::ComponentClass(lhs), Self::ComponentClass(rhs)) => lhs == rhs,
            (Self::Context(lhs), Self::Context(rhs)) => lhs.ptr_eq(rhs),
            (Self::Component(lhs), Self::Component(rhs)) => lhs.ptr_eq(rhs),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => formatter.write_str("Nil"),
            Self::Bool(flag) => formatter.debug_tuple("Bool").field(flag).finish(),
            Self::Int(number) => formatter.debug_tuple("Int").field(number).finish(),
            Self::Str(text) => formatter.debug_tuple("Str").field(text).finish(),
            Self::Context(context) => formatter
                .debug_tuple("Context")
                .field(&context.name())
                .finish(),
            Self::ComponentClass(class) => {
                formatter.debug_tuple("ComponentClass").field(class).finish()
            }
            Self::Component(handle) => formatter
                .debug_tuple("Component")
                .field(&handle.class())
                .finish(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => formatter.write_str("nil"),
            Self::Bool(flag) => write!(formatter, "{flag}"),
            Self::Int(number) => write!(formatter, "{number}"),
            Self::Str(text) => formatter.write_str(text),
            Self::Context(context) => formatter.write_str(context.name()),
            Self::ComponentClass(class) => formatter.write_str(class),
            Self::Component(handle) => write!(formatter, "#<{}>", handle.class()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Nil, Self::Str)
    }
}
