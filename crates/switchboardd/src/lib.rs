//! Bootstrap and call supervision for the Switchboard daemon.
//!
//! The daemon wires the dialplan engine into a running process: it loads the
//! layered configuration, installs structured telemetry, reads the dialplan
//! from the application root and builds the dispatch manager. Each accepted
//! call then runs on its own thread under the [`CallSupervisor`], which can
//! cancel a single call or every live call at shutdown.
//!
//! Every bootstrap stage is reported through a [`HealthReporter`] so
//! operators can see which step failed.

mod bootstrap;
mod health;
mod supervisor;
pub mod telemetry;

pub use bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, Switchboard, SystemConfigLoader,
    bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use supervisor::{CallHandle, CallSupervisor, SupervisorError};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
