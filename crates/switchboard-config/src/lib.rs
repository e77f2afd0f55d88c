//! Shared configuration for the Switchboard call router.
//!
//! [`Config`] is layered by `ortho_config`: built-in defaults, then an
//! optional configuration file, then `SWITCHBOARD_*` environment variables,
//! then command-line flags. Values are handed explicitly to the dialplan
//! loader and dispatch manager; nothing here is process-global.
//!
//! [`AppPaths`] derives the application directory layout from the configured
//! root.

mod defaults;
mod logging;
mod paths;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    COMPONENTS_DIR, DEFAULT_DIALPLAN_FILE, DEFAULT_LOG_FILTER, LOGS_DIR, default_app_root,
    default_auto_answer, default_dialplan_file, default_log_filter, default_log_filter_string,
    default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use paths::{AppPaths, AppPathsError};

/// Resolved configuration for the Switchboard daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SWITCHBOARD")]
pub struct Config {
    /// Application root holding the dialplan and component directories.
    #[serde(default = "default_app_root")]
    #[ortho_config(default = default_app_root())]
    pub app_root: Utf8PathBuf,
    /// Dialplan file name, resolved relative to the application root.
    #[serde(default = "default_dialplan_file")]
    #[ortho_config(default = default_dialplan_file())]
    pub dialplan_file: String,
    /// Answer every call before its first context body runs.
    ///
    /// Left unset by any layer that does not mention it, so an absent
    /// `--auto-answer` flag never masks the file or environment value.
    /// [`Config::auto_answer`] falls back to [`default_auto_answer`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_answer: Option<bool>,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log events.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_root: default_app_root(),
            dialplan_file: default_dialplan_file(),
            auto_answer: None,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Application root directory.
    #[must_use]
    pub fn app_root(&self) -> &Utf8PathBuf {
        &self.app_root
    }

    /// Dialplan file name within the application root.
    #[must_use]
    pub fn dialplan_file(&self) -> &str {
        &self.dialplan_file
    }

    /// Whether calls are answered before routing.
    #[must_use]
    pub const fn auto_answer(&self) -> bool {
        match self.auto_answer {
            Some(enabled) => enabled,
            None => default_auto_answer(),
        }
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
