//! Run configuration types
//!
//! A [`RunConfiguration`] describes exactly one sort run. It is assembled
//! through [`RunConfigurationBuilder`], which refuses option combinations that
//! mix metadata-derived dates with a single forced date.

use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Options that shape a sort run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SortOption {
    /// Rename files to `YYYY-MM-DD--HH-MM.<ext>`
    RenameByDate,
    /// Rewrite file timestamps from the content creation date
    FixMetadata,
    /// Place files under `Photos|Videos/<YYYY>/<MM>`
    CreateFolderHierarchy,
    /// Stamp every file with one user-supplied date
    ForceDate,
    /// Move instead of copy
    DeleteOriginals,
}

/// Set of [`SortOption`]s
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOptions(BTreeSet<SortOption>);

impl SortOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or remove `option` depending on `enabled`
    pub fn set(&mut self, option: SortOption, enabled: bool) {
        if enabled {
            self.0.insert(option);
        } else {
            self.0.remove(&option);
        }
    }

    pub fn contains(&self, option: SortOption) -> bool {
        self.0.contains(&option)
    }
}

impl FromIterator<SortOption> for SortOptions {
    fn from_iter<I: IntoIterator<Item = SortOption>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Source image format for the conversion pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Camera RAW (DNG)
    RawImage,
    /// PNG
    PngImage,
}

impl SourceFormat {
    /// Short name shown to the user
    pub fn display_name(self) -> &'static str {
        match self {
            SourceFormat::RawImage => "DNG",
            SourceFormat::PngImage => "PNG",
        }
    }

    /// Lowercase file extensions belonging to this format
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            SourceFormat::RawImage => &["dng"],
            SourceFormat::PngImage => &["png"],
        }
    }
}

/// Parameters of one conversion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertRequest {
    pub format: SourceFormat,
    pub folder: PathBuf,
    pub delete_originals: bool,
}

/// Immutable configuration of one sort run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    source: PathBuf,
    destination: PathBuf,
    options: SortOptions,
    forced_date: Option<NaiveDateTime>,
}

impl RunConfiguration {
    /// Start building a configuration for `source` → `destination`
    pub fn builder(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> RunConfigurationBuilder {
        RunConfigurationBuilder {
            source: source.into(),
            destination: destination.into(),
            options: SortOptions::new(),
            forced_date: None,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn options(&self) -> &SortOptions {
        &self.options
    }

    pub fn has(&self, option: SortOption) -> bool {
        self.options.contains(option)
    }

    pub fn forced_date(&self) -> Option<NaiveDateTime> {
        self.forced_date
    }
}

/// Builder for [`RunConfiguration`]
#[derive(Debug, Clone)]
pub struct RunConfigurationBuilder {
    source: PathBuf,
    destination: PathBuf,
    options: SortOptions,
    forced_date: Option<NaiveDateTime>,
}

impl RunConfigurationBuilder {
    pub fn options(mut self, options: SortOptions) -> Self {
        self.options = options;
        self
    }

    pub fn option(mut self, option: SortOption) -> Self {
        self.options.set(option, true);
        self
    }

    pub fn forced_date(mut self, date: Option<NaiveDateTime>) -> Self {
        self.forced_date = date;
        self
    }

    /// Validate the option/date combination and freeze the configuration
    pub fn build(self) -> Result<RunConfiguration, ConfigError> {
        let force = self.options.contains(SortOption::ForceDate);
        let fix = self.options.contains(SortOption::FixMetadata);

        match (force, fix, self.forced_date) {
            (true, _, None) => return Err(ConfigError::ForcedDateMissing),
            (_, true, Some(_)) => return Err(ConfigError::ForcedDateWithFixMetadata),
            (false, _, Some(_)) => return Err(ConfigError::ForcedDateWithoutFlag),
            _ => {}
        }

        Ok(RunConfiguration {
            source: self.source,
            destination: self.destination,
            options: self.options,
            forced_date: self.forced_date,
        })
    }
}

/// Rejected option combinations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the force-date option requires a date")]
    ForcedDateMissing,

    #[error("a forced date cannot be combined with metadata fixing")]
    ForcedDateWithFixMetadata,

    #[error("a forced date was given without the force-date option")]
    ForcedDateWithoutFlag,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-03-12 14:30:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_build_plain_configuration() {
        let config = RunConfiguration::builder("/in", "/out")
            .option(SortOption::RenameByDate)
            .option(SortOption::CreateFolderHierarchy)
            .build()
            .unwrap();

        assert_eq!(config.source(), Path::new("/in"));
        assert_eq!(config.destination(), Path::new("/out"));
        assert!(config.has(SortOption::RenameByDate));
        assert!(config.has(SortOption::CreateFolderHierarchy));
        assert!(!config.has(SortOption::DeleteOriginals));
        assert!(config.forced_date().is_none());
    }

    #[test]
    fn test_forced_date_requires_flag_and_date() {
        let ok = RunConfiguration::builder("/in", "/out")
            .option(SortOption::ForceDate)
            .forced_date(Some(date()))
            .build()
            .unwrap();
        assert_eq!(ok.forced_date(), Some(date()));

        let missing = RunConfiguration::builder("/in", "/out")
            .option(SortOption::ForceDate)
            .build();
        assert_eq!(missing.unwrap_err(), ConfigError::ForcedDateMissing);

        let no_flag = RunConfiguration::builder("/in", "/out")
            .forced_date(Some(date()))
            .build();
        assert_eq!(no_flag.unwrap_err(), ConfigError::ForcedDateWithoutFlag);
    }

    #[test]
    fn test_fix_metadata_excludes_forced_date() {
        let result = RunConfiguration::builder("/in", "/out")
            .options(
                [SortOption::FixMetadata, SortOption::ForceDate]
                    .into_iter()
                    .collect(),
            )
            .forced_date(Some(date()))
            .build();
        assert_eq!(result.unwrap_err(), ConfigError::ForcedDateWithFixMetadata);

        let fix_only = RunConfiguration::builder("/in", "/out")
            .option(SortOption::FixMetadata)
            .build()
            .unwrap();
        assert!(fix_only.forced_date().is_none());
    }

    #[test]
    fn test_sort_options_set() {
        let mut options: SortOptions = [SortOption::RenameByDate].into_iter().collect();
        options.set(SortOption::DeleteOriginals, true);
        options.set(SortOption::RenameByDate, false);

        assert!(options.contains(SortOption::DeleteOriginals));
        assert!(!options.contains(SortOption::RenameByDate));
        assert_eq!(options, [SortOption::DeleteOriginals].into_iter().collect());
    }
}
