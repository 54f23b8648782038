//! CLI argument parsing with clap

use crate::operation::{Operation, ParseOperationError};
use crate::settings::Settings;
use clap::Parser;
use std::path::PathBuf;

/// Photo Sorter - Interactive photo and video folder maintenance
///
/// Converts camera images, sorts photos and videos into a dated folder
/// hierarchy, repairs file timestamps and checks that file names agree
/// with the dates stored in the files.
#[derive(Parser, Debug, Default)]
#[command(name = "photo-sorter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to settings file (TOML format)
    ///
    /// Defaults to Config/settings.toml next to the executable when present.
    /// CLI arguments override settings from the file.
    #[arg(short = 'C', long, env = "PHOTO_SORTER_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Run a single operation (0-6) instead of showing the menu
    #[arg(short, long, value_parser = parse_operation)]
    pub operation: Option<Operation>,

    /// Directory for log files
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Consecutive failed reads before input is considered closed
    #[arg(long)]
    pub max_read_failures: Option<usize>,

    /// Number of threads for parallel processing (0 = auto)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Do not print the banner
    #[arg(long)]
    pub no_banner: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,
}

fn parse_operation(value: &str) -> Result<Operation, ParseOperationError> {
    value.parse()
}

impl Cli {
    /// Merge CLI arguments with settings from file
    /// CLI arguments take precedence over file settings
    pub fn merge_with_settings(&self, mut settings: Settings) -> Settings {
        if let Some(ref log_dir) = self.log_dir {
            settings.log_dir = Some(log_dir.clone());
        }
        if let Some(limit) = self.max_read_failures {
            settings.max_read_failures = limit;
        }
        if let Some(threads) = self.threads {
            settings.threads = threads;
        }
        if self.no_banner {
            settings.show_banner = false;
        }
        if self.verbose {
            settings.verbose = true;
        }
        if self.json_log {
            settings.json_log = true;
        }

        settings
    }
}
