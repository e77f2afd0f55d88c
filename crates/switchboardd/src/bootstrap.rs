//! Daemon bootstrap orchestration.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use switchboard_config::{AppPaths, AppPathsError, Config};
use switchboard_dialplan::{
    Call, ComponentRegistry, DialplanError, DispatchManager, EnvironmentError, Loader,
    PlatformCommands,
};

use crate::health::HealthReporter;
use crate::supervisor::{CallHandle, CallSupervisor, SupervisorError};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    ///
    /// # Errors
    ///
    /// Returns the aggregated `ortho_config` error when any layer is invalid.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The application layout is unusable.
    #[error("failed to resolve application paths: {source}")]
    Paths {
        /// Path derivation error.
        #[source]
        source: AppPathsError,
    },
    /// The dialplan could not be read or parsed.
    #[error("failed to load dialplan: {source}")]
    Dialplan {
        /// Loader error.
        #[source]
        source: DialplanError,
    },
    /// Capability providers are inconsistent.
    #[error("invalid capability providers: {source}")]
    Environment {
        /// Collision reported while validating providers.
        #[source]
        source: EnvironmentError,
    },
}

/// A bootstrapped daemon ready to accept calls.
#[derive(Debug)]
pub struct Switchboard {
    config: Config,
    paths: AppPaths,
    supervisor: CallSupervisor,
    telemetry: TelemetryHandle,
}

impl Switchboard {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Application directory layout.
    #[must_use]
    pub const fn paths(&self) -> &AppPaths {
        &self.paths
    }

    /// The dispatch manager shared by every call.
    #[must_use]
    pub fn manager(&self) -> &DispatchManager {
        self.supervisor.manager()
    }

    /// Supervisor running accepted calls.
    #[must_use]
    pub const fn supervisor(&self) -> &CallSupervisor {
        &self.supervisor
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Routes `call` on its own thread.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::Spawn`] when the worker thread cannot be
    /// started.
    pub fn accept(&self, call: Call) -> Result<CallHandle, SupervisorError> {
        self.supervisor.spawn(Arc::new(call))
    }

    /// Cancels every call still running.
    pub fn shutdown(&self) {
        self.supervisor.cancel_all();
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// Platform command vocabularies and components are provided by the voice
/// platform integration; the dialplan is read from the configured
/// application root.
///
/// # Errors
///
/// Returns the [`BootstrapError`] of the first stage that failed. The
/// failure is also reported to `reporter`.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    platforms: PlatformCommands,
    components: ComponentRegistry,
) -> Result<Switchboard, BootstrapError> {
    reporter.bootstrap_starting();
    let result = bootstrap_stages(loader, reporter.as_ref(), platforms, components);
    match &result {
        Ok(switchboard) => reporter.bootstrap_succeeded(switchboard.config()),
        Err(error) => reporter.bootstrap_failed(error),
    }
    result
}

fn bootstrap_stages(
    loader: &dyn ConfigLoader,
    reporter: &dyn HealthReporter,
    platforms: PlatformCommands,
    components: ComponentRegistry,
) -> Result<Switchboard, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    let paths = AppPaths::from_config(&config).map_err(|source| BootstrapError::Paths { source })?;
    paths
        .prepare_logs()
        .map_err(|source| BootstrapError::Paths { source })?;
    reporter.layout_prepared(&paths);

    let dialplan = paths.dialplan_path().as_std_path();
    let contexts = Loader::new(&components)
        .load_file(dialplan)
        .map_err(|source| BootstrapError::Dialplan { source })?;
    reporter.dialplan_loaded(dialplan, contexts.len());

    let manager = DispatchManager::new(Arc::new(contexts), platforms, components)
        .map_err(|source| BootstrapError::Environment { source })?
        .with_auto_answer(config.auto_answer());

    Ok(Switchboard {
        config,
        paths,
        supervisor: CallSupervisor::new(Arc::new(manager)),
        telemetry,
    })
}
