//! Structured health reporting for daemon lifecycle events.

use std::path::Path;
use std::sync::Arc;

use switchboard_config::{AppPaths, Config};

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked once the application layout exists on disk.
    fn layout_prepared(&self, paths: &AppPaths);

    /// Invoked once the dialplan file has been parsed.
    fn dialplan_loaded(&self, path: &Path, contexts: usize);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn layout_prepared(&self, paths: &AppPaths) {
        (**self).layout_prepared(paths);
    }

    fn dialplan_loaded(&self, path: &Path, contexts: usize) {
        (**self).dialplan_loaded(path, contexts);
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting switchboard bootstrap"
        );
    }

    fn layout_prepared(&self, paths: &AppPaths) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "layout_prepared",
            root = %paths.root(),
            components = %paths.components_dir(),
            logs = %paths.logs_dir(),
            "application layout ready"
        );
    }

    fn dialplan_loaded(&self, path: &Path, contexts: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "dialplan_loaded",
            path = %path.display(),
            contexts,
            "dialplan loaded"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            app_root = %config.app_root(),
            auto_answer = config.auto_answer(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "switchboard bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "switchboard bootstrap failed"
        );
    }
}
