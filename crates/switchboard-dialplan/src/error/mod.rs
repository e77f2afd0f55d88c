//! Domain errors raised while loading and running dialplans.
//!
//! Errors are split by phase. [`DialplanError`] and [`ComponentError`] are
//! configuration-time failures that must abort startup. [`EnvironmentError`]
//! covers capability assembly, [`ExecutionError`] covers failures raised by a
//! running context body, and [`DispatchError`] is what the platform
//! integration receives for a single call.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::call::PlatformTag;
use crate::capability::CapabilitySource;
use crate::environment::ExecutionEnvironment;
use crate::syntax::Position;

/// A dialplan source fragment that could not be parsed into declarations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {}, column {}: {message}", .position.line(), .position.column())]
pub struct SyntaxError {
    message: String,
    position: Position,
}

impl SyntaxError {
    /// Creates a syntax error reported at `position`.
    #[must_use]
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    /// Human-readable description of the problem.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Location of the offending token.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }
}

/// Errors raised while turning dialplan source into a context registry.
#[derive(Debug, Error)]
pub enum DialplanError {
    /// The source text is malformed.
    #[error("dialplan syntax error at {0}")]
    Syntax(#[from] SyntaxError),

    /// Two declarations share a context name.
    #[error("context '{name}' is declared more than once (first at line {first_line})")]
    DuplicateContext {
        /// Name declared twice.
        name: String,
        /// Line of the earlier declaration.
        first_line: u32,
    },

    /// A declaration reuses the name of a pre-bound component class.
    #[error("context '{name}' collides with the registered component of the same name")]
    ReservedName {
        /// Name of the offending declaration.
        name: String,
    },

    /// The dialplan file could not be read.
    #[error("failed to read dialplan '{}': {source}", .path.display())]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

impl DialplanError {
    /// Creates a duplicate-declaration error.
    pub fn duplicate_context(name: impl Into<String>, first_line: u32) -> Self {
        Self::DuplicateContext {
            name: name.into(),
            first_line,
        }
    }

    /// Creates a reserved-name error.
    pub fn reserved_name(name: impl Into<String>) -> Self {
        Self::ReservedName { name: name.into() }
    }

    /// Creates an I/O error for the given dialplan file.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

/// Errors raised while registering call-context-aware components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    /// A component with the same class name already exists.
    #[error("component '{name}' is already registered")]
    Duplicate {
        /// Class name registered twice.
        name: String,
    },

    /// The class name is not a capitalised identifier.
    #[error("component name '{name}' must be a capitalised identifier")]
    InvalidName {
        /// Rejected class name.
        name: String,
    },
}

/// Failure reported by a platform command or a component method.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandError {
    message: String,
}

impl CommandError {
    /// Creates a command error with the given description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Human-readable description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised while assembling an execution environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    /// No command vocabulary is registered for the call's platform.
    #[error("no command set is registered for platform '{platform}'")]
    UnknownPlatform {
        /// Platform tag carried by the call.
        platform: PlatformTag,
    },

    /// Two capability providers expose the same name.
    #[error("capability '{name}' is provided by both {first} and {second}")]
    CapabilityCollision {
        /// Colliding capability name.
        name: String,
        /// Provider that registered the name first.
        first: CapabilitySource,
        /// Provider that attempted to register it again.
        second: CapabilitySource,
    },
}

impl EnvironmentError {
    /// Creates an unknown-platform error.
    #[must_use]
    pub const fn unknown_platform(platform: PlatformTag) -> Self {
        Self::UnknownPlatform { platform }
    }

    /// Creates a capability collision error.
    pub fn collision(
        name: impl Into<String>,
        first: CapabilitySource,
        second: CapabilitySource,
    ) -> Self {
        Self::CapabilityCollision {
            name: name.into(),
            first,
            second,
        }
    }
}

/// Errors raised by a running context body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// A bare name matched no local, context, component or capability.
    #[error("'{name}' does not name a registered context")]
    UnknownContextReference {
        /// Unresolved name.
        name: String,
    },

    /// A call named a capability that the environment does not expose.
    #[error("no capability named '{name}' is available to this call")]
    UnknownCapability {
        /// Requested capability.
        name: String,
    },

    /// A method was invoked on a value that does not support it.
    #[error("'{receiver}' does not respond to '{method}'")]
    UnknownMethod {
        /// Description of the receiver value.
        receiver: String,
        /// Requested method.
        method: String,
    },

    /// A transfer target evaluated to something other than a context.
    #[error("cannot transfer control to {found}")]
    NotAContext {
        /// Description of the value found instead.
        found: String,
    },

    /// A capability received the wrong number of arguments.
    #[error("'{name}' expects {expected} argument(s) but received {received}")]
    Arity {
        /// Capability name.
        name: String,
        /// Number of arguments accepted.
        expected: usize,
        /// Number of arguments supplied.
        received: usize,
    },

    /// A platform command or component method failed.
    #[error("'{name}' failed: {source}")]
    Command {
        /// Command or method name.
        name: String,
        /// Failure reported by the command.
        #[source]
        source: CommandError,
    },
}

impl ExecutionError {
    /// Creates an unknown context reference error.
    pub fn unknown_context(name: impl Into<String>) -> Self {
        Self::UnknownContextReference { name: name.into() }
    }

    /// Creates an unknown capability error.
    pub fn unknown_capability(name: impl Into<String>) -> Self {
        Self::UnknownCapability { name: name.into() }
    }

    /// Creates an unknown method error.
    pub fn unknown_method(receiver: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            receiver: receiver.into(),
            method: method.into(),
        }
    }

    /// Creates a command failure error.
    pub fn command(name: impl Into<String>, source: CommandError) -> Self {
        Self::Command {
            name: name.into(),
            source,
        }
    }
}

/// Per-call errors reported to the platform integration.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Neither the call context nor the request path matched a context.
    #[error(
        "no dialplan entry point for call context '{context}' or request path '{request_path}'"
    )]
    NoContext {
        /// Context carried by the call.
        context: String,
        /// Request path carried by the call.
        request_path: String,
    },

    /// The call arrived in a failed state; nothing was executed.
    #[error("call failed before routing: {}", .reason.as_deref().unwrap_or("no reason given"))]
    FailedExtensionCall {
        /// Environment built for diagnostics.
        environment: Box<ExecutionEnvironment>,
        /// Failure reason extracted from the environment.
        reason: Option<String>,
    },

    /// The caller hung up before routing; nothing was executed.
    #[error("call hung up before routing")]
    HungupExtensionCall {
        /// Environment built for diagnostics.
        environment: Box<ExecutionEnvironment>,
    },

    /// The execution environment could not be assembled.
    #[error("failed to assemble execution environment: {0}")]
    Environment(#[from] EnvironmentError),

    /// A context body raised an error.
    #[error("context '{context}' failed: {source}")]
    Execution {
        /// Context running when the error surfaced.
        context: String,
        /// Error raised by the body.
        #[source]
        source: ExecutionError,
    },
}

impl DispatchError {
    /// Creates a missing entry point error for a call.
    pub fn no_context(context: impl Into<String>, request_path: impl Into<String>) -> Self {
        Self::NoContext {
            context: context.into(),
            request_path: request_path.into(),
        }
    }

    /// Creates an execution error raised inside `context`.
    pub fn execution(context: impl Into<String>, source: ExecutionError) -> Self {
        Self::Execution {
            context: context.into(),
            source,
        }
    }

    /// Returns `true` when the error points at an operator configuration
    /// problem rather than at the call itself.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        match self {
            Self::Environment(_) => true,
            Self::Execution { source, .. } => matches!(
                source,
                ExecutionError::UnknownContextReference { .. }
                    | ExecutionError::UnknownCapability { .. }
            ),
            Self::NoContext { .. }
            | Self::FailedExtensionCall { .. }
            | Self::HungupExtensionCall { .. } => false,
        }
    }

    /// Returns the diagnostic environment carried by terminal call states.
    #[must_use]
    pub fn environment(&self) -> Option<&ExecutionEnvironment> {
        match self {
            Self::FailedExtensionCall { environment, .. }
            | Self::HungupExtensionCall { environment } => Some(environment),
            Self::NoContext { .. } | Self::Environment(_) | Self::Execution { .. } => None,
        }
    }
}
