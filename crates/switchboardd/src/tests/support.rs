//! Scenario world for the daemon behavioural suite.

use std::ffi::OsString;
use std::fs;
use std::sync::{Arc, Mutex};

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use switchboard_config::Config;
use switchboard_dialplan::{
    Call, CommandError, CommandSet, ComponentRegistry, DispatchError, Disposition,
    PlatformCommand, PlatformCommands, Value,
};

use crate::bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, Switchboard, bootstrap_with,
};
use crate::health::HealthReporter;
use crate::supervisor::CallHandle;

pub const PLATFORM: &str = "asterisk";

pub const VALID_DIALPLAN: &str = "default {\n  +sales\n}\nsales {\n  play(\"welcome\")\n}\n";
pub const LOOPING_DIALPLAN: &str = "ping {\n  +pong\n}\npong {\n  +ping\n}\n";
pub const MALFORMED_DIALPLAN: &str = "default \"extra\" {\n  play(\"welcome\")\n}\n";

/// Lifecycle events captured by [`RecordingHealthReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    LayoutPrepared,
    DialplanLoaded(usize),
    BootstrapSucceeded,
    BootstrapFailed(String),
}

#[derive(Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events.lock().expect("events lock").clone()
    }

    fn push(&self, event: HealthEvent) {
        self.events.lock().expect("events lock").push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.push(HealthEvent::BootstrapStarting);
    }

    fn layout_prepared(&self, _paths: &switchboard_config::AppPaths) {
        self.push(HealthEvent::LayoutPrepared);
    }

    fn dialplan_loaded(&self, _path: &std::path::Path, contexts: usize) {
        self.push(HealthEvent::DialplanLoaded(contexts));
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.push(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.push(HealthEvent::BootstrapFailed(error.to_string()));
    }
}

/// Loader that intentionally fails by passing an invalid log format.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(vec![
            OsString::from("switchboardd"),
            OsString::from("--log-format"),
            OsString::from("pretty"),
        ])
    }
}

/// Counts platform commands issued by context bodies.
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    fn command(&self, name: &'static str) -> impl PlatformCommand + 'static {
        let entries = Arc::clone(&self.entries);
        move |_call: &Call, _args: &[Value]| -> Result<Value, CommandError> {
            entries.lock().expect("journal lock").push(name.to_owned());
            Ok(Value::Nil)
        }
    }

    pub fn count(&self, name: &str) -> usize {
        self.entries
            .lock()
            .expect("journal lock")
            .iter()
            .filter(|entry| *entry == name)
            .count()
    }
}

/// State shared across BDD steps.
pub struct TestWorld {
    root: TempDir,
    failing_loader: bool,
    auto_answer: bool,
    pub reporter: Arc<RecordingHealthReporter>,
    pub journal: Journal,
    switchboard: Option<Switchboard>,
    bootstrap_error: Option<BootstrapError>,
    handle: Option<CallHandle>,
    outcome: Option<Result<Disposition, DispatchError>>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("create application root"),
            failing_loader: false,
            auto_answer: false,
            reporter: Arc::new(RecordingHealthReporter::default()),
            journal: Journal::default(),
            switchboard: None,
            bootstrap_error: None,
            handle: None,
            outcome: None,
        }
    }

    pub fn write_dialplan(&self, source: &str) {
        fs::write(self.root.path().join("dialplan.conf"), source).expect("write dialplan");
    }

    pub const fn use_failing_loader(&mut self) {
        self.failing_loader = true;
    }

    pub const fn enable_auto_answer(&mut self) {
        self.auto_answer = true;
    }

    fn config(&self) -> Config {
        Config {
            app_root: Utf8PathBuf::from_path_buf(self.root.path().to_path_buf())
                .expect("application root should be UTF-8"),
            auto_answer: Some(self.auto_answer),
            ..Config::default()
        }
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.switchboard.is_some() || self.bootstrap_error.is_some() {
            return;
        }
        let loader: Box<dyn ConfigLoader> = if self.failing_loader {
            Box::new(FailingConfigLoader)
        } else {
            Box::new(StaticConfigLoader::new(self.config()))
        };
        let commands = CommandSet::new()
            .with_command("answer", self.journal.command("answer"))
            .with_command("play", self.journal.command("play"));
        match bootstrap_with(
            loader.as_ref(),
            self.reporter.clone(),
            PlatformCommands::new().with_platform(PLATFORM, commands),
            ComponentRegistry::new(),
        ) {
            Ok(switchboard) => self.switchboard = Some(switchboard),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    pub fn switchboard(&self) -> &Switchboard {
        self.switchboard.as_ref().expect("bootstrap should have succeeded")
    }

    pub const fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    pub fn accept(&mut self, context: &str) {
        let handle = self
            .switchboard()
            .accept(Call::new(context, PLATFORM))
            .expect("spawn call worker");
        self.handle = Some(handle);
    }

    pub fn shutdown(&self) {
        self.switchboard().shutdown();
    }

    /// Joins the accepted call once and returns its result.
    pub fn outcome(&mut self) -> &Result<Disposition, DispatchError> {
        if let Some(handle) = self.handle.take() {
            self.outcome = Some(handle.join().expect("call worker"));
        }
        self.outcome.as_ref().expect("a call should have been accepted")
    }
}
