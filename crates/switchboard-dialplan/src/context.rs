//! Named routing procedures declared by a dialplan.

use std::fmt;
use std::sync::Arc;

use crate::syntax::Position;
use crate::syntax::ast::Block;

#[derive(Debug)]
struct ContextInner {
    name: String,
    declared_at: Position,
    body: Block,
}

/// A named, deferred routing procedure.
///
/// The body is parsed when the dialplan loads but only evaluated when a call
/// runs it, against that call's execution environment. Handles are cheap to
/// clone and compare by identity, so a context fetched twice from the same
/// registry is the same context.
#[derive(Clone)]
pub struct DialplanContext {
    inner: Arc<ContextInner>,
}

impl DialplanContext {
    pub(crate) fn new(name: impl Into<String>, declared_at: Position, body: Block) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                name: name.into(),
                declared_at,
                body,
            }),
        }
    }

    /// Context identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Position of the declaration in the dialplan source.
    #[must_use]
    pub fn declared_at(&self) -> Position {
        self.inner.declared_at
    }

    /// Number of top-level routing actions in the body.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        self.inner.body.statements.len()
    }

    pub(crate) fn body(&self) -> &Block {
        &self.inner.body
    }

    /// Returns `true` when both handles refer to the same declaration.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for DialplanContext {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for DialplanContext {}

impl fmt::Debug for DialplanContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DialplanContext")
            .field("name", &self.inner.name)
            .field("declared_at", &self.inner.declared_at)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for DialplanContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.inner.name)
    }
}
