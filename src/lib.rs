//! Photo Sorter - Interactive photo and video folder maintenance
//!
//! This library provides the interactive layer and a local engine for:
//! - Converting camera images (DNG, PNG)
//! - Sorting photos and videos into a `YYYY/MM` hierarchy
//! - Repairing or forcing file timestamps
//! - Checking file names against the dates stored in the files
//! - Free-form date input with a multi-format fallback chain
//! - Localized terminal output (English, Chinese Simplified)

// Initialize i18n with locale files
rust_i18n::i18n!("locales", fallback = "en");

pub mod app;
pub mod builder;
pub mod cli;
pub mod config;
pub mod date;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod hash;
pub mod i18n;
pub mod operation;
pub mod output;
pub mod prompt;
pub mod report;
pub mod settings;
pub mod time;

pub use app::App;
pub use builder::{ConfigurationBuilder, ForcedDateStep};
pub use cli::Cli;
pub use config::{
    ConfigError, ConvertRequest, RunConfiguration, RunConfigurationBuilder, SortOption,
    SortOptions, SourceFormat,
};
pub use date::DateFormatSpec;
pub use dispatch::{OperationDispatcher, RunOutcome};
pub use engine::{CancellationToken, Engine, EngineError, LocalEngine, RunResult};
pub use error::{Error, Result};
pub use i18n::init_locale;
pub use operation::{Job, Operation};
pub use prompt::{DirectoryValidator, PathValidator, Prompter};
pub use report::{Disposition, EventReporter, Reportable, Severity};
pub use settings::Settings;
