//! Context registry built by the dialplan loader.
//!
//! The [`ContextRegistry`] maps context names to [`DialplanContext`] handles
//! and remembers declaration order. It is built once per dialplan load and is
//! read-only afterwards; the dispatch manager shares it between calls behind
//! an `Arc`. Duplicate declarations for the same name are rejected.

use std::collections::HashMap;

use crate::context::DialplanContext;
use crate::error::DialplanError;

/// Registry of declared dialplan contexts.
///
/// # Example
///
/// ```
/// use switchboard_dialplan::Loader;
///
/// let registry = Loader::without_components()
///     .load("default { +sales }\nsales { }")
///     .expect("dialplan loads");
/// assert_eq!(registry.names().collect::<Vec<_>>(), vec!["default", "sales"]);
/// assert!(registry.get("sales").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextRegistry {
    contexts: HashMap<String, DialplanContext>,
    order: Vec<String>,
}

impl ContextRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a context under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`DialplanError::DuplicateContext`] if a context with the same
    /// name is already registered; the registry is left unchanged.
    pub fn register(&mut self, context: DialplanContext) -> Result<(), DialplanError> {
        if let Some(existing) = self.contexts.get(context.name()) {
            return Err(DialplanError::duplicate_context(
                context.name(),
                existing.declared_at().line(),
            ));
        }
        let name = context.name().to_owned();
        self.order.push(name.clone());
        self.contexts.insert(name, context);
        Ok(())
    }

    /// Looks up a context by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DialplanContext> {
        self.contexts.get(name)
    }

    /// Returns `true` when `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.contexts.contains_key(name)
    }

    /// Context names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Contexts in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &DialplanContext> {
        self.order.iter().filter_map(|name| self.contexts.get(name))
    }

    /// Returns the number of registered contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Returns `true` when no contexts are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
