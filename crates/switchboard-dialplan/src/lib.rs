//! Dialplan dispatch engine for the Switchboard call router.
//!
//! A dialplan is a list of named contexts, each holding a deferred routing
//! body. The [`Loader`] parses dialplan source into a [`ContextRegistry`];
//! the [`DispatchManager`] then routes every inbound [`Call`]:
//!
//! 1. failed and hung-up calls are rejected before any routing rule is
//!    consulted,
//! 2. the entry context is chosen from the call's context, falling back to
//!    the first segment of its request path,
//! 3. bodies run inside a per-call [`ExecutionEnvironment`] until one
//!    completes. A body may transfer control (`+target`), which abandons it
//!    and restarts the loop at the target context.
//!
//! Capabilities exposed to bodies come from three providers merged with
//! collision detection: the [`PlatformCommands`] vocabulary selected by the
//! call's platform, getters for the call's variables, and constructors for
//! every class in the [`ComponentRegistry`].
//!
//! Registries and capability tables are built once before the first call and
//! are read-only afterwards, so calls can be handled on independent threads.
//! A [`CancellationToken`] stops a runaway call between statements.

mod call;
mod cancel;
mod capability;
mod context;
mod dispatch;
mod environment;
mod error;
mod loader;
mod registry;
mod syntax;
mod value;

pub use call::{Call, CallVariables, FAILURE_REASON_VARIABLE, PlatformTag};
pub use cancel::CancellationToken;
pub use capability::{
    CapabilitySet, CapabilitySource, CommandSet, Component, ComponentFactory, ComponentHandle,
    ComponentRegistry, PlatformCommand, PlatformCommands, constructor_name,
};
pub use context::DialplanContext;
pub use dispatch::{
    ANSWER_COMMAND, DispatchManager, DispatchObserver, Disposition, StructuredDispatchObserver,
};
pub use environment::{EnvironmentFactory, ExecutionEnvironment};
pub use error::{
    CommandError, ComponentError, DialplanError, DispatchError, EnvironmentError, ExecutionError,
    SyntaxError,
};
pub use loader::Loader;
pub use registry::ContextRegistry;
pub use syntax::Position;
pub use value::Value;

#[cfg(test)]
mod tests;
