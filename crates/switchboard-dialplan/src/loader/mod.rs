//! Dialplan loader.
//!
//! The [`Loader`] turns dialplan source into a [`ContextRegistry`]. Parsing
//! produces a flat list of declarations; each one is handed to a collector
//! whose only job is to register `name { ... }` as a context. Component class
//! names are reserved before collection so bodies can refer to them directly.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::capability::ComponentRegistry;
use crate::context::DialplanContext;
use crate::error::DialplanError;
use crate::registry::ContextRegistry;
use crate::syntax::ast::Declaration;
use crate::syntax::parse_declarations;

const LOADER_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::loader");

/// Parses dialplan source into a context registry.
///
/// # Example
///
/// ```
/// use switchboard_dialplan::Loader;
///
/// let loader = Loader::without_components();
/// let registry = loader
///     .load("default {\n  answer\n  +sales\n}\nsales { play(\"welcome\") }")
///     .expect("dialplan loads");
/// assert_eq!(registry.len(), 2);
///
/// let error = loader.load("sales \"east\" { }").expect_err("arguments are rejected");
/// assert!(error.to_string().contains("takes no positional arguments"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Loader {
    reserved: BTreeSet<String>,
}

impl Loader {
    /// Creates a loader that pre-binds the classes in `components`.
    #[must_use]
    pub fn new(components: &ComponentRegistry) -> Self {
        Self {
            reserved: components.names().map(str::to_owned).collect(),
        }
    }

    /// Creates a loader with no pre-bound component classes.
    #[must_use]
    pub fn without_components() -> Self {
        Self::default()
    }

    /// Component class names visible to context bodies.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.reserved.iter().map(String::as_str)
    }

    /// Loads dialplan source text.
    ///
    /// # Errors
    ///
    /// Returns [`DialplanError::Syntax`] for malformed source,
    /// [`DialplanError::DuplicateContext`] when a name is declared twice, and
    /// [`DialplanError::ReservedName`] when a declaration reuses a component
    /// class name.
    pub fn load(&self, source: &str) -> Result<ContextRegistry, DialplanError> {
        let declarations = parse_declarations(source)?;
        let mut collector = ContextCollector {
            reserved: &self.reserved,
            registry: ContextRegistry::new(),
        };
        for declaration in declarations {
            collector.declare(declaration)?;
        }
        let registry = collector.registry;
        debug!(
            target: LOADER_TARGET,
            contexts = registry.len(),
            components = self.reserved.len(),
            "dialplan loaded"
        );
        Ok(registry)
    }

    /// Reads and loads a dialplan file.
    ///
    /// # Errors
    ///
    /// Returns [`DialplanError::Io`] when the file cannot be read, otherwise
    /// the same errors as [`Loader::load`].
    pub fn load_file(&self, path: &Path) -> Result<ContextRegistry, DialplanError> {
        debug!(target: LOADER_TARGET, path = %path.display(), "reading dialplan");
        let source = fs::read_to_string(path).map_err(|source| DialplanError::io(path, source))?;
        self.load(&source)
    }
}

struct ContextCollector<'loader> {
    reserved: &'loader BTreeSet<String>,
    registry: ContextRegistry,
}

impl ContextCollector<'_> {
    fn declare(&mut self, declaration: Declaration) -> Result<(), DialplanError> {
        if self.reserved.contains(&declaration.name) {
            return Err(DialplanError::reserved_name(declaration.name));
        }
        self.registry.register(DialplanContext::new(
            declaration.name,
            declaration.position,
            declaration.body,
        ))
    }
}
