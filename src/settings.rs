//! Application settings
//!
//! Settings control the program itself (logging, prompt behaviour), never a
//! particular run. They are read from an optional TOML file and then
//! overridden by command-line flags.

use crate::prompt::DEFAULT_MAX_READ_FAILURES;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings file name looked up in the `Config` directory next to the executable
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory for log files (defaults to `Log` next to the executable)
    pub log_dir: Option<PathBuf>,

    /// Write log records as JSON
    pub json_log: bool,

    /// Log at DEBUG level
    pub verbose: bool,

    /// Consecutive failed reads tolerated before the input is considered closed
    pub max_read_failures: usize,

    /// Show the banner above the menu
    pub show_banner: bool,

    /// Worker threads for parallel metadata reads (0 = auto)
    pub threads: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_dir: None,
            json_log: false,
            verbose: false,
            max_read_failures: DEFAULT_MAX_READ_FAILURES,
            show_banner: true,
            threads: 0,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load `explicit` if given, otherwise `Config/settings.toml` under
    /// `exe_dir` when it exists, otherwise defaults
    pub fn discover(explicit: Option<&Path>, exe_dir: &Path) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        let default_path = exe_dir.join("Config").join(SETTINGS_FILE_NAME);
        if default_path.is_file() {
            Self::load_from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolved log directory
    pub fn log_dir_or(&self, exe_dir: &Path) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| exe_dir.join("Log"))
    }
}

/// Errors that can occur when loading settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
