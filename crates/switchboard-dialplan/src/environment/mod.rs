//! Per-call execution environments.
//!
//! An [`ExecutionEnvironment`] is the sandbox a context body runs in. It owns
//! the call handle, the call's [`CapabilitySet`], the component registry used
//! for `Class.new(...)`, and a read-only view of the context registry so
//! bodies can refer to other contexts by name. One environment is built per
//! call by the [`EnvironmentFactory`] and dropped when the run loop ends.

mod eval;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

use crate::call::{Call, FAILURE_REASON_VARIABLE};
use crate::cancel::CancellationToken;
use crate::capability::{Capability, CapabilitySet, ComponentRegistry, PlatformCommands};
use crate::context::DialplanContext;
use crate::error::{EnvironmentError, ExecutionError};
use crate::registry::ContextRegistry;
use crate::value::Value;

use self::eval::{Flow, run_body};

/// Result of running one context body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BodyOutcome {
    /// The body ran to its end or hit `return`.
    Completed,
    /// The body signalled a control transfer.
    TransferTo(DialplanContext),
    /// Cancellation was observed between statements.
    Interrupted,
}

/// Builds execution environments for inbound calls.
///
/// The factory holds the build-once tables shared by every call: platform
/// command sets, component factories and the context registry.
#[derive(Debug, Clone)]
pub struct EnvironmentFactory {
    platforms: Arc<PlatformCommands>,
    components: Arc<ComponentRegistry>,
    contexts: Arc<ContextRegistry>,
}

impl EnvironmentFactory {
    /// Creates a factory over shared capability tables and contexts.
    #[must_use]
    pub const fn new(
        platforms: Arc<PlatformCommands>,
        components: Arc<ComponentRegistry>,
        contexts: Arc<ContextRegistry>,
    ) -> Self {
        Self {
            platforms,
            components,
            contexts,
        }
    }

    /// Context registry bound into every environment.
    #[must_use]
    pub fn contexts(&self) -> &ContextRegistry {
        &self.contexts
    }

    /// Builds the environment for `call`.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvironmentError`] when the call's platform has no command
    /// set or when two capability providers expose the same name.
    pub fn build(&self, call: Arc<Call>) -> Result<ExecutionEnvironment, EnvironmentError> {
        let capabilities = CapabilitySet::assemble(&call, &self.platforms, &self.components)?;
        Ok(ExecutionEnvironment {
            call,
            current_context: None,
            capabilities,
            components: Arc::clone(&self.components),
            contexts: Arc::clone(&self.contexts),
        })
    }
}

/// Sandbox a context body runs in.
pub struct ExecutionEnvironment {
    call: Arc<Call>,
    current_context: Option<DialplanContext>,
    capabilities: CapabilitySet,
    components: Arc<ComponentRegistry>,
    contexts: Arc<ContextRegistry>,
}

impl ExecutionEnvironment {
    /// The call this environment serves.
    #[must_use]
    pub fn call(&self) -> &Arc<Call> {
        &self.call
    }

    /// Context most recently entered, if any body has run.
    #[must_use]
    pub const fn current_context(&self) -> Option<&DialplanContext> {
        self.current_context.as_ref()
    }

    /// Capabilities available to bodies.
    #[must_use]
    pub const fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Resolves a context reference by name.
    #[must_use]
    pub fn context(&self, name: &str) -> Option<&DialplanContext> {
        self.contexts.get(name)
    }

    /// Reads a call variable; unset variables read as `nil`.
    #[must_use]
    pub fn variable(&self, name: &str) -> Value {
        Value::from(self.call.variables().get(name))
    }

    /// Failure reason recorded on the call by the platform, if any.
    #[must_use]
    pub fn failure_reason(&self) -> Option<String> {
        self.call.variables().get(FAILURE_REASON_VARIABLE)
    }

    /// Invokes a capability by name.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::UnknownCapability`] when `name` is not in the
    /// capability set, [`ExecutionError::Arity`] when a variable getter
    /// receives arguments, and [`ExecutionError::Command`] when the command or
    /// component constructor fails.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, ExecutionError> {
        let capability = self
            .capabilities
            .get(name)
            .ok_or_else(|| ExecutionError::unknown_capability(name))?;
        match capability {
            Capability::Command(command) => command
                .invoke(&self.call, args)
                .map_err(|source| ExecutionError::command(name, source)),
            Capability::Variable(variable) => {
                if !args.is_empty() {
                    return Err(ExecutionError::Arity {
                        name: name.to_owned(),
                        expected: 0,
                        received: args.len(),
                    });
                }
                Ok(self.variable(variable))
            }
            Capability::Constructor(class) => self.instantiate(class, args),
        }
    }

    fn instantiate(&self, class: &str, args: &[Value]) -> Result<Value, ExecutionError> {
        self.components
            .instantiate(class, &self.call, args)
            .map(Value::Component)
    }

    /// Runs `context`'s body from its beginning.
    pub(crate) fn execute(
        &mut self,
        context: &DialplanContext,
        cancel: &CancellationToken,
    ) -> Result<BodyOutcome, ExecutionError> {
        self.current_context = Some(context.clone());
        let outcome = match run_body(self, context.body(), cancel)? {
            Flow::Next | Flow::Return => BodyOutcome::Completed,
            Flow::Transfer(target) => BodyOutcome::TransferTo(target),
            Flow::Interrupted => BodyOutcome::Interrupted,
        };
        Ok(outcome)
    }
}

impl fmt::Debug for ExecutionEnvironment {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ExecutionEnvironment")
            .field("call_context", &self.call.context())
            .field(
                "current_context",
                &self.current_context.as_ref().map(DialplanContext::name),
            )
            .field("capabilities", &self.capabilities)
            .field("contexts", &self.contexts.len())
            .finish_non_exhaustive()
    }
}
