//! Application directory layout.
//!
//! Every Switchboard application lives under one root: the dialplan file sits
//! in the root itself, component code under `components/`, and log files
//! under `logs/`.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::Config;
use crate::defaults::{COMPONENTS_DIR, LOGS_DIR};

/// Canonical paths within an application root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    root: Utf8PathBuf,
    dialplan: Utf8PathBuf,
    components: Utf8PathBuf,
    logs: Utf8PathBuf,
}

impl AppPaths {
    /// Derives the layout from the configured application root.
    ///
    /// # Errors
    ///
    /// Returns [`AppPathsError::MissingRoot`] when the root is not an existing
    /// directory.
    pub fn from_config(config: &Config) -> Result<Self, AppPathsError> {
        let root = config.app_root();
        if !root.is_dir() {
            return Err(AppPathsError::MissingRoot { path: root.clone() });
        }
        Ok(Self {
            dialplan: root.join(config.dialplan_file()),
            components: root.join(COMPONENTS_DIR),
            logs: root.join(LOGS_DIR),
            root: root.clone(),
        })
    }

    /// Application root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// The configured dialplan file.
    #[must_use]
    pub fn dialplan_path(&self) -> &Utf8Path {
        &self.dialplan
    }

    /// Directory holding component code.
    #[must_use]
    pub fn components_dir(&self) -> &Utf8Path {
        &self.components
    }

    /// Directory receiving log files.
    #[must_use]
    pub fn logs_dir(&self) -> &Utf8Path {
        &self.logs
    }

    /// Creates the log directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`AppPathsError::LogDirectory`] when the directory cannot be
    /// created.
    pub fn prepare_logs(&self) -> Result<(), AppPathsError> {
        fs::create_dir_all(&self.logs).map_err(|source| AppPathsError::LogDirectory {
            path: self.logs.clone(),
            source,
        })
    }
}

/// Errors raised while deriving application paths.
#[derive(Debug, Error)]
pub enum AppPathsError {
    /// The application root does not exist or is not a directory.
    #[error("application root '{path}' is not a directory")]
    MissingRoot {
        /// Configured root.
        path: Utf8PathBuf,
    },
    /// Creating the log directory failed.
    #[error("failed to prepare log directory '{path}': {source}")]
    LogDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
