//! Capability providers composed into each call's execution environment.
//!
//! A [`CapabilitySet`] is the collection of named operations a context body
//! may invoke. It is assembled per call from three independent providers:
//!
//! - the platform [`CommandSet`] selected by the call's platform tag,
//! - one zero-argument getter per call variable present at build time,
//! - one `new_<class>` constructor per registered component.
//!
//! Providers are merged additively. A name supplied by two providers is a
//! configuration error ([`EnvironmentError::CapabilityCollision`]); it is
//! never resolved by precedence.

mod component;
mod platform;


use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::sync::Arc;

use crate::call::{Call, CallVariables, PlatformTag};
use crate::error::EnvironmentError;

pub use self::component::{
    Component, ComponentFactory, ComponentHandle, ComponentRegistry, constructor_name,
};
pub use self::platform::{CommandSet, PlatformCommand, PlatformCommands};

// ---------------------------------------------------------------------------
// CapabilitySource
// ---------------------------------------------------------------------------

/// Provider that contributed a capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilitySource {
    /// The command set bound to a platform tag.
    Platform(PlatformTag),
    /// Getters derived from the call's variables.
    CallVariables,
    /// Constructors derived from the component registry.
    Components,
}

impl fmt::Display for CapabilitySource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Platform(tag) => write!(formatter, "the '{tag}' platform commands"),
            Self::CallVariables => formatter.write_str("the call variables"),
            Self::Components => formatter.write_str("the registered components"),
        }
    }
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub(crate) enum Capability {
    Command(Arc<dyn PlatformCommand>),
    /// Reads the named call variable.
    Variable(String),
    /// Instantiates the named component class.
    Constructor(String),
}

#[derive(Clone)]
struct Provided {
    source: CapabilitySource,
    capability: Capability,
}

// ---------------------------------------------------------------------------
// CapabilitySet
// ---------------------------------------------------------------------------

/// Named operations available to a running context body.
#[derive(Clone, Default)]
pub struct CapabilitySet {
    entries: BTreeMap<String, Provided>,
}

impl CapabilitySet {
    /// Assembles the capabilities for `call`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::UnknownPlatform`] when no command set is
    /// bound to the call's platform, and
    /// [`EnvironmentError::CapabilityCollision`] when two providers expose the
    /// same name.
    pub fn assemble(
        call: &Call,
        platforms: &PlatformCommands,
        components: &ComponentRegistry,
    ) -> Result<Self, EnvironmentError> {
        let commands = platforms.for_call(call)?;
        let mut set = Self::default();
        set.extend_platform(call.platform(), commands)?;
        set.extend_variables(call.variables())?;
        set.extend_components(components)?;
        Ok(set)
    }

    /// Checks every platform command set against the component constructors.
    ///
    /// Variable-derived names depend on the call and are checked per call by
    /// [`CapabilitySet::assemble`].
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::CapabilityCollision`] for the first clash.
    pub fn validate_static(
        platforms: &PlatformCommands,
        components: &ComponentRegistry,
    ) -> Result<(), EnvironmentError> {
        for (tag, commands) in platforms.iter() {
            let mut set = Self::default();
            set.extend_platform(tag, commands)?;
            set.extend_components(components)?;
        }
        Ok(())
    }

    fn insert(
        &mut self,
        name: &str,
        source: CapabilitySource,
        capability: Capability,
    ) -> Result<(), EnvironmentError> {
        match self.entries.entry(name.to_owned()) {
            Entry::Occupied(existing) => Err(EnvironmentError::collision(
                name,
                existing.get().source.clone(),
                source,
            )),
            Entry::Vacant(slot) => {
                slot.insert(Provided { source, capability });
                Ok(())
            }
        }
    }

    fn extend_platform(
        &mut self,
        platform: &PlatformTag,
        commands: &CommandSet,
    ) -> Result<(), EnvironmentError> {
        for (name, command) in commands.iter() {
            self.insert(
                name,
                CapabilitySource::Platform(platform.clone()),
                Capability::Command(Arc::clone(command)),
            )?;
        }
        Ok(())
    }

    fn extend_variables(&mut self, variables: &CallVariables) -> Result<(), EnvironmentError> {
        for name in variables.names() {
            self.insert(
                &name,
                CapabilitySource::CallVariables,
                Capability::Variable(name.clone()),
            )?;
        }
        Ok(())
    }

    fn extend_components(
        &mut self,
        components: &ComponentRegistry,
    ) -> Result<(), EnvironmentError> {
        for class in components.names() {
            self.insert(
                &constructor_name(class),
                CapabilitySource::Components,
                Capability::Constructor(class.to_owned()),
            )?;
        }
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Capability> {
        self.entries.get(name).map(|entry| &entry.capability)
    }

    /// Returns `true` when `name` is available.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the provider that contributed `name`.
    #[must_use]
    pub fn source_of(&self, name: &str) -> Option<&CapabilitySource> {
        self.entries.get(name).map(|entry| &entry.source)
    }

    /// Capability names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no capability is available.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(name, entry)| (name, entry.source.to_string())),
            )
            .finish()
    }
}
