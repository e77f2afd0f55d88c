//! Observation hooks for per-call dispatch events.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::DISPATCH_TARGET;
use crate::call::Call;
use crate::context::DialplanContext;
use crate::error::DispatchError;

/// Observer trait used to surface dispatch events to telemetry sinks.
///
/// One observer is shared by every call the manager handles, so
/// implementations must tolerate concurrent invocation.
pub trait DispatchObserver: Send + Sync {
    /// Invoked when a call reaches the manager, before any pre-check.
    fn call_received(&self, call: &Call);

    /// Invoked once the entry context has been resolved.
    fn entry_selected(&self, call: &Call, context: &DialplanContext);

    /// Invoked before each context body runs.
    fn context_entered(&self, call: &Call, context: &DialplanContext);

    /// Invoked when a body transfers control.
    fn transfer(&self, call: &Call, from: &DialplanContext, to: &DialplanContext);

    /// Invoked when the run loop completes.
    fn call_completed(&self, call: &Call, context: &DialplanContext, transfers: usize);

    /// Invoked when dispatch fails for any reason.
    fn call_failed(&self, call: &Call, error: &DispatchError);

    /// Invoked when cancellation stops the run loop.
    fn call_cancelled(&self, call: &Call);
}

impl<T> DispatchObserver for Arc<T>
where
    T: DispatchObserver + ?Sized,
{
    fn call_received(&self, call: &Call) {
        (**self).call_received(call);
    }

    fn entry_selected(&self, call: &Call, context: &DialplanContext) {
        (**self).entry_selected(call, context);
    }

    fn context_entered(&self, call: &Call, context: &DialplanContext) {
        (**self).context_entered(call, context);
    }

    fn transfer(&self, call: &Call, from: &DialplanContext, to: &DialplanContext) {
        (**self).transfer(call, from, to);
    }

    fn call_completed(&self, call: &Call, context: &DialplanContext, transfers: usize) {
        (**self).call_completed(call, context, transfers);
    }

    fn call_failed(&self, call: &Call, error: &DispatchError) {
        (**self).call_failed(call, error);
    }

    fn call_cancelled(&self, call: &Call) {
        (**self).call_cancelled(call);
    }
}

/// Default observer that records dispatch events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredDispatchObserver;

impl StructuredDispatchObserver {
    /// Builds a new observer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DispatchObserver for StructuredDispatchObserver {
    fn call_received(&self, call: &Call) {
        debug!(
            target: DISPATCH_TARGET,
            event = "call_received",
            context = call.context(),
            request_path = call.request_path(),
            platform = %call.platform(),
            "call received"
        );
    }

    fn entry_selected(&self, call: &Call, context: &DialplanContext) {
        info!(
            target: DISPATCH_TARGET,
            event = "entry_selected",
            call_context = call.context(),
            entry = context.name(),
            "entry context selected"
        );
    }

    fn context_entered(&self, _call: &Call, context: &DialplanContext) {
        debug!(
            target: DISPATCH_TARGET,
            event = "context_entered",
            context = context.name(),
            "running context body"
        );
    }

    fn transfer(&self, _call: &Call, from: &DialplanContext, to: &DialplanContext) {
        debug!(
            target: DISPATCH_TARGET,
            event = "transfer",
            from = from.name(),
            to = to.name(),
            "control transferred"
        );
    }

    fn call_completed(&self, call: &Call, context: &DialplanContext, transfers: usize) {
        info!(
            target: DISPATCH_TARGET,
            event = "call_completed",
            call_context = call.context(),
            final_context = context.name(),
            transfers,
            "dialplan run completed"
        );
    }

    fn call_failed(&self, call: &Call, error: &DispatchError) {
        warn!(
            target: DISPATCH_TARGET,
            event = "call_failed",
            call_context = call.context(),
            configuration = error.is_configuration(),
            error = %error,
            "dispatch failed"
        );
    }

    fn call_cancelled(&self, call: &Call) {
        info!(
            target: DISPATCH_TARGET,
            event = "call_cancelled",
            call_context = call.context(),
            "dialplan run cancelled"
        );
    }
}
