//! Dispatch manager and the control-transfer run loop.
//!
//! For every inbound call the [`DispatchManager`]:
//!
//! 1. classifies terminal call states (failed, then hung up) before looking
//!    at any routing rule,
//! 2. resolves the entry context from the call's context, falling back to the
//!    first segment of its request path,
//! 3. builds one [`ExecutionEnvironment`] and runs bodies in it until a body
//!    completes, fails, or cancellation is observed.
//!
//! A transfer restarts the loop at the target context from its beginning.
//! The loop has no depth bound; cyclic dialplans run until cancelled.

mod observer;


use std::fmt;
use std::sync::Arc;

use crate::call::Call;
use crate::cancel::CancellationToken;
use crate::capability::{CapabilitySet, ComponentRegistry, PlatformCommands};
use crate::context::DialplanContext;
use crate::environment::{BodyOutcome, EnvironmentFactory, ExecutionEnvironment};
use crate::error::{DispatchError, EnvironmentError};
use crate::registry::ContextRegistry;

pub use self::observer::{DispatchObserver, StructuredDispatchObserver};

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::dispatch");

/// Capability invoked once per call when auto-answer is enabled.
pub const ANSWER_COMMAND: &str = "answer";

/// How a call's dialplan run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// A body ran to completion.
    Completed {
        /// Context whose body completed.
        context: DialplanContext,
        /// Number of control transfers taken on the way.
        transfers: usize,
    },
    /// Cancellation stopped the run; no result was produced.
    Cancelled,
}

/// Routes inbound calls through the dialplan.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use switchboard_dialplan::{
///     Call, CommandError, CommandSet, ComponentRegistry, DispatchManager, Disposition, Loader,
///     PlatformCommands, Value,
/// };
///
/// let contexts = Loader::without_components()
///     .load("default { +sales }\nsales { play(\"welcome\") }")
///     .expect("dialplan loads");
/// let play = |_call: &Call, _args: &[Value]| -> Result<Value, CommandError> {
///     Ok(Value::Nil)
/// };
/// let platforms = PlatformCommands::new()
///     .with_platform("asterisk", CommandSet::new().with_command("play", play));
/// let manager = DispatchManager::new(Arc::new(contexts), platforms, ComponentRegistry::new())
///     .expect("providers are consistent");
///
/// let outcome = manager
///     .handle(&Arc::new(Call::new("default", "asterisk")))
///     .expect("call routes");
/// let Disposition::Completed { context, transfers } = outcome else {
///     panic!("call was not cancelled");
/// };
/// assert_eq!(context.name(), "sales");
/// assert_eq!(transfers, 1);
/// ```
pub struct DispatchManager {
    factory: EnvironmentFactory,
    auto_answer: bool,
    observer: Arc<dyn DispatchObserver>,
}

impl DispatchManager {
    /// Creates a manager over a loaded dialplan and its capability providers.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::CapabilityCollision`] when a platform
    /// command shares its name with a component constructor.
    pub fn new(
        contexts: Arc<ContextRegistry>,
        platforms: PlatformCommands,
        components: ComponentRegistry,
    ) -> Result<Self, EnvironmentError> {
        CapabilitySet::validate_static(&platforms, &components)?;
        Ok(Self {
            factory: EnvironmentFactory::new(Arc::new(platforms), Arc::new(components), contexts),
            auto_answer: false,
            observer: Arc::new(StructuredDispatchObserver::new()),
        })
    }

    /// Enables or disables answering calls before their first body runs.
    #[must_use]
    pub fn with_auto_answer(mut self, enabled: bool) -> Self {
        self.auto_answer = enabled;
        self
    }

    /// Replaces the dispatch observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The loaded dialplan.
    #[must_use]
    pub fn registry(&self) -> &ContextRegistry {
        self.factory.contexts()
    }

    /// Returns `true` when calls are answered before routing.
    #[must_use]
    pub const fn auto_answer(&self) -> bool {
        self.auto_answer
    }

    /// Resolves the entry context for `call`.
    ///
    /// The call's context wins; otherwise the first segment of the request
    /// path is tried. Returns `None` when neither names a registered context.
    #[must_use]
    pub fn select_entry_context(&self, call: &Call) -> Option<DialplanContext> {
        let registry = self.registry();
        registry
            .get(call.context())
            .or_else(|| {
                call.request_segment()
                    .and_then(|segment| registry.get(segment))
            })
            .cloned()
    }

    /// Routes `call` to completion.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] describing why the call could not be
    /// routed. Errors are scoped to this call.
    pub fn handle(&self, call: &Arc<Call>) -> Result<Disposition, DispatchError> {
        self.handle_with_cancellation(call, &CancellationToken::new())
    }

    /// Routes `call`, stopping early once `cancel` is set.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] describing why the call could not be
    /// routed. A cancelled run yields `Ok(Disposition::Cancelled)`.
    pub fn handle_with_cancellation(
        &self,
        call: &Arc<Call>,
        cancel: &CancellationToken,
    ) -> Result<Disposition, DispatchError> {
        self.observer.call_received(call);
        let result = self.dispatch(call, cancel);
        match &result {
            Ok(Disposition::Completed { context, transfers }) => {
                self.observer.call_completed(call, context, *transfers);
            }
            Ok(Disposition::Cancelled) => self.observer.call_cancelled(call),
            Err(error) => self.observer.call_failed(call, error),
        }
        result
    }

    fn dispatch(
        &self,
        call: &Arc<Call>,
        cancel: &CancellationToken,
    ) -> Result<Disposition, DispatchError> {
        if call.is_failed() {
            let environment = self.factory.build(Arc::clone(call))?;
            let reason = environment.failure_reason();
            return Err(DispatchError::FailedExtensionCall {
                environment: Box::new(environment),
                reason,
            });
        }
        if call.is_hung_up() {
            let environment = self.factory.build(Arc::clone(call))?;
            return Err(DispatchError::HungupExtensionCall {
                environment: Box::new(environment),
            });
        }

        let entry = self
            .select_entry_context(call)
            .ok_or_else(|| DispatchError::no_context(call.context(), call.request_path()))?;
        self.observer.entry_selected(call, &entry);

        let mut environment = self.factory.build(Arc::clone(call))?;
        self.run(&mut environment, entry, cancel)
    }

    fn run(
        &self,
        environment: &mut ExecutionEnvironment,
        entry: DialplanContext,
        cancel: &CancellationToken,
    ) -> Result<Disposition, DispatchError> {
        if cancel.is_cancelled() {
            return Ok(Disposition::Cancelled);
        }
        if self.auto_answer {
            environment
                .invoke(ANSWER_COMMAND, &[])
                .map_err(|source| DispatchError::execution(entry.name(), source))?;
        }

        let mut current = entry;
        let mut transfers = 0_usize;
        loop {
            if cancel.is_cancelled() {
                return Ok(Disposition::Cancelled);
            }
            self.observer.context_entered(environment.call(), &current);
            let outcome = environment
                .execute(&current, cancel)
                .map_err(|source| DispatchError::execution(current.name(), source))?;
            match outcome {
                BodyOutcome::Completed => {
                    return Ok(Disposition::Completed {
                        context: current,
                        transfers,
                    });
                }
                BodyOutcome::TransferTo(target) => {
                    self.observer.transfer(environment.call(), &current, &target);
                    transfers = transfers.saturating_add(1);
                    current = target;
                }
                BodyOutcome::Interrupted => return Ok(Disposition::Cancelled),
            }
        }
    }
}

impl fmt::Debug for DispatchManager {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DispatchManager")
            .field("contexts", &self.registry().len())
            .field("auto_answer", &self.auto_answer)
            .finish_non_exhaustive()
    }
}
