//! Platform command vocabularies keyed by platform tag.
//!
//! Each voice platform contributes a [`CommandSet`]; [`PlatformCommands`] is
//! the dispatch table that selects one by the call's [`PlatformTag`]. The
//! engine never interprets commands itself, it only routes invocations made
//! from context bodies to the selected set.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::call::{Call, PlatformTag};
use crate::error::{CommandError, EnvironmentError};
use crate::value::Value;

/// A command exposed to context bodies by a voice platform.
///
/// Closures with the matching signature implement this trait, which keeps
/// simple command tables terse.
///
/// # Example
///
/// ```
/// use switchboard_dialplan::{Call, CommandError, CommandSet, Value};
///
/// let answer = |call: &Call, _args: &[Value]| -> Result<Value, CommandError> {
///     call.variables().set("answered", "yes");
///     Ok(Value::Nil)
/// };
/// let commands = CommandSet::new().with_command("answer", answer);
/// assert!(commands.contains("answer"));
/// ```
pub trait PlatformCommand: Send + Sync {
    /// Runs the command for `call` with the evaluated arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] when the platform rejects the command; the
    /// error aborts the call's run loop.
    fn invoke(&self, call: &Call, args: &[Value]) -> Result<Value, CommandError>;
}

impl<F> PlatformCommand for F
where
    F: Fn(&Call, &[Value]) -> Result<Value, CommandError> + Send + Sync,
{
    fn invoke(&self, call: &Call, args: &[Value]) -> Result<Value, CommandError> {
        self(call, args)
    }
}

/// Named commands provided by one platform.
#[derive(Clone, Default)]
pub struct CommandSet {
    commands: BTreeMap<String, Arc<dyn PlatformCommand>>,
}

impl CommandSet {
    /// Creates an empty command set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command, replacing any earlier command with the same name.
    #[must_use]
    pub fn with_command(
        mut self,
        name: impl Into<String>,
        command: impl PlatformCommand + 'static,
    ) -> Self {
        self.insert(name, command);
        self
    }

    /// Adds a command, replacing any earlier command with the same name.
    pub fn insert(&mut self, name: impl Into<String>, command: impl PlatformCommand + 'static) {
        self.commands.insert(name.into(), Arc::new(command));
    }

    /// Looks up a command by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn PlatformCommand>> {
        self.commands.get(name)
    }

    /// Returns `true` when `name` is defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Command names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn PlatformCommand>)> {
        self.commands
            .iter()
            .map(|(name, command)| (name.as_str(), command))
    }

    /// Returns the number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` when the set defines no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for CommandSet {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_set()
            .entries(self.commands.keys())
            .finish()
    }
}

/// Dispatch table from platform tag to command vocabulary.
#[derive(Debug, Clone, Default)]
pub struct PlatformCommands {
    sets: HashMap<PlatformTag, CommandSet>,
}

impl PlatformCommands {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `commands` to `platform`, replacing any earlier binding.
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<PlatformTag>, commands: CommandSet) -> Self {
        self.insert(platform, commands);
        self
    }

    /// Binds `commands` to `platform`, replacing any earlier binding.
    pub fn insert(&mut self, platform: impl Into<PlatformTag>, commands: CommandSet) {
        self.sets.insert(platform.into(), commands);
    }

    /// Looks up the command set bound to `platform`.
    #[must_use]
    pub fn get(&self, platform: &PlatformTag) -> Option<&CommandSet> {
        self.sets.get(platform)
    }

    /// Selects the command set for the platform `call` originated from.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::UnknownPlatform`] when no set is bound to
    /// the call's platform tag.
    pub fn for_call(&self, call: &Call) -> Result<&CommandSet, EnvironmentError> {
        self.get(call.platform())
            .ok_or_else(|| EnvironmentError::unknown_platform(call.platform().clone()))
    }

    /// Registered platforms with their command sets, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&PlatformTag, &CommandSet)> {
        self.sets.iter()
    }

    /// Returns the number of registered platforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Returns `true` when no platform is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
