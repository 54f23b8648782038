//! Error types for the photo sorter

use crate::config::ConfigError;
use crate::settings::SettingsError;
use thiserror::Error;

/// Result type alias for photo sorter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the photo sorter
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input stream closed after {attempts} consecutive failed reads")]
    InputClosed { attempts: usize },

    #[error("Invalid run configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}
