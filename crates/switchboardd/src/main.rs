//! Validates a Switchboard application from the command line.
//!
//! Runs the full bootstrap (configuration, telemetry, dialplan, capability
//! validation) and exits. Voice platform integrations embed the library and
//! supply their command vocabularies through `bootstrap_with`.

use std::process::ExitCode;
use std::sync::Arc;

use switchboard_dialplan::{ComponentRegistry, PlatformCommands};
use switchboardd::{StructuredHealthReporter, SystemConfigLoader, bootstrap_with};

fn main() -> ExitCode {
    let reporter = Arc::new(StructuredHealthReporter::new());
    match bootstrap_with(
        &SystemConfigLoader,
        reporter,
        PlatformCommands::new(),
        ComponentRegistry::new(),
    ) {
        Ok(switchboard) => {
            switchboard.shutdown();
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}
