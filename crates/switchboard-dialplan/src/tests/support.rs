//! Scenario world for the dialplan behavioural suites.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::call::Call;
use crate::cancel::CancellationToken;
use crate::capability::{CommandSet, ComponentRegistry, PlatformCommand, PlatformCommands};
use crate::context::DialplanContext;
use crate::dispatch::{DispatchManager, DispatchObserver, Disposition};
use crate::error::{CommandError, DialplanError, DispatchError};
use crate::loader::Loader;
use crate::registry::ContextRegistry;
use crate::value::Value;

pub const PLATFORM: &str = "asterisk";

/// Commands issued by context bodies, in invocation order.
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    fn command(&self, name: &'static str) -> impl PlatformCommand + 'static {
        let entries = Arc::clone(&self.entries);
        move |_call: &Call, args: &[Value]| -> Result<Value, CommandError> {
            let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
            entries
                .lock()
                .expect("journal lock")
                .push(format!("{name} {}", rendered.join(" ")).trim_end().to_owned());
            Ok(Value::Nil)
        }
    }

    /// Arguments of every `play` command.
    pub fn prompts(&self) -> Vec<String> {
        self.entries
            .lock()
            .expect("journal lock")
            .iter()
            .filter_map(|entry| entry.strip_prefix("play ").map(str::to_owned))
            .collect()
    }

    /// Number of times `name` ran.
    pub fn count(&self, name: &str) -> usize {
        self.entries
            .lock()
            .expect("journal lock")
            .iter()
            .filter(|entry| entry.split(' ').next() == Some(name))
            .count()
    }
}

/// Cancels the run once a given number of transfers has been taken.
struct CancelAfterTransfers {
    cancel: CancellationToken,
    limit: usize,
    seen: AtomicUsize,
}

impl DispatchObserver for CancelAfterTransfers {
    fn call_received(&self, _call: &Call) {}

    fn entry_selected(&self, _call: &Call, _context: &DialplanContext) {}

    fn context_entered(&self, _call: &Call, _context: &DialplanContext) {}

    fn transfer(&self, _call: &Call, _from: &DialplanContext, _to: &DialplanContext) {
        let seen = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
        if seen >= self.limit {
            self.cancel.cancel();
        }
    }

    fn call_completed(&self, _call: &Call, _context: &DialplanContext, _transfers: usize) {}

    fn call_failed(&self, _call: &Call, _error: &DispatchError) {}

    fn call_cancelled(&self, _call: &Call) {}
}

/// State shared across BDD steps.
#[derive(Default)]
pub struct TestWorld {
    declarations: Vec<String>,
    auto_answer: bool,
    pub journal: Journal,
    registry: Option<Arc<ContextRegistry>>,
    load_error: Option<DialplanError>,
    outcome: Option<Result<Disposition, DispatchError>>,
    transfers_before_cancel: usize,
}

impl TestWorld {
    /// Appends one declaration line to the dialplan source.
    pub fn declare(&mut self, declaration: String) {
        self.declarations.push(declaration);
    }

    /// Answers calls before their first body runs.
    pub const fn enable_auto_answer(&mut self) {
        self.auto_answer = true;
    }

    /// Loads the accumulated source once.
    pub fn load(&mut self) {
        if self.registry.is_some() || self.load_error.is_some() {
            return;
        }
        let source = self.declarations.join("\n");
        match Loader::without_components().load(&source) {
            Ok(registry) => self.registry = Some(Arc::new(registry)),
            Err(error) => self.load_error = Some(error),
        }
    }

    pub fn registry(&self) -> &ContextRegistry {
        self.registry.as_deref().expect("dialplan should have loaded")
    }

    pub fn load_error(&self) -> &DialplanError {
        self.load_error.as_ref().expect("dialplan load should have failed")
    }

    pub const fn is_loaded(&self) -> bool {
        self.registry.is_some()
    }

    fn manager(&mut self) -> DispatchManager {
        self.load();
        let registry = Arc::clone(self.registry.as_ref().expect("dialplan should have loaded"));
        let commands = CommandSet::new()
            .with_command("answer", self.journal.command("answer"))
            .with_command("play", self.journal.command("play"));
        DispatchManager::new(
            registry,
            PlatformCommands::new().with_platform(PLATFORM, commands),
            ComponentRegistry::new(),
        )
        .expect("providers are consistent")
        .with_auto_answer(self.auto_answer)
    }

    /// Routes `call` to completion.
    pub fn dispatch(&mut self, call: Call) {
        let manager = self.manager();
        self.outcome = Some(manager.handle(&Arc::new(call)));
    }

    /// Routes `call`, cancelling it after `limit` transfers.
    pub fn dispatch_cancelling_after(&mut self, call: Call, limit: usize) {
        let cancel = CancellationToken::new();
        let observer = Arc::new(CancelAfterTransfers {
            cancel: cancel.clone(),
            limit,
            seen: AtomicUsize::new(0),
        });
        let manager = self.manager().with_observer(observer.clone());
        self.outcome = Some(manager.handle_with_cancellation(&Arc::new(call), &cancel));
        self.transfers_before_cancel = observer.seen.load(Ordering::SeqCst);
    }

    pub fn outcome(&self) -> &Result<Disposition, DispatchError> {
        self.outcome.as_ref().expect("a call should have been dispatched")
    }

    pub const fn transfers_before_cancel(&self) -> usize {
        self.transfers_before_cancel
    }
}
