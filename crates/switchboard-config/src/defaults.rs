use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// File name of the dialplan within the application root.
pub const DEFAULT_DIALPLAN_FILE: &str = "dialplan.conf";

/// Directory, relative to the application root, holding component code.
pub const COMPONENTS_DIR: &str = "components";

/// Directory, relative to the application root, receiving log files.
pub const LOGS_DIR: &str = "logs";

/// Default log filter expression used by the daemon.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Application root used when none is configured: the working directory.
#[must_use]
pub fn default_app_root() -> Utf8PathBuf {
    Utf8PathBuf::from(".")
}

/// Owned dialplan file name.
#[must_use]
pub fn default_dialplan_file() -> String {
    DEFAULT_DIALPLAN_FILE.to_owned()
}

/// Calls are not answered automatically unless configured.
#[must_use]
pub const fn default_auto_answer() -> bool {
    false
}
