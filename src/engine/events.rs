//! Event vocabularies emitted by engines
//!
//! Every operation kind has one progress vocabulary and one error
//! vocabulary. The sets are closed: a new variant must be handled by the
//! reporter before the crate compiles again.

use chrono::NaiveDateTime;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionProgress {
    Started { folder: PathBuf },
    FileFound { file: PathBuf },
    OriginalDeleted { file: PathBuf },
    Completed { converted: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    SecurityScopedAccessFailed { folder: PathBuf },
    Cancelled,
    CantOpenFolder { folder: PathBuf },
    DeleteOriginalFailed { file: PathBuf, reason: String },
    ReadFailed { file: PathBuf },
    DecodeFailed { file: PathBuf },
    DestinationCreateFailed { file: PathBuf },
    SaveFailed { file: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortProgress {
    Started { source: PathBuf, destination: PathBuf },
    FolderCreated { name: String },
    FileProcessed { source: PathBuf, target: PathBuf },
    Completed { processed: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileProcessingError {
    SecurityScopedAccessFailed { folder: PathBuf },
    Cancelled,
    FolderNotAccessible { folder: PathBuf, reason: String },
    InvalidDate { file: PathBuf, value: String },
    MissingDateComponents { file: PathBuf },
    MoveFailed { source: PathBuf, destination: PathBuf, reason: String },
    MetadataUpdateFailed { file: PathBuf, folder: PathBuf, reason: String },
    DateUpdateFailed { file: PathBuf, reason: String },
    CantFixDate { file: PathBuf, reason: String },
    MetadataError { file: PathBuf, reason: String },
    CreationDateSetFailed { file: PathBuf, reason: String },
    DeleteFailed { file: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixDateProgress {
    Started { folder: PathBuf },
    DateUpdated { file: PathBuf, date: NaiveDateTime },
    Completed { updated: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixDateError {
    SecurityScopedAccessFailed { folder: PathBuf },
    Cancelled,
    FolderNotAccessible { folder: PathBuf, reason: String },
    DateUpdateFailed { file: PathBuf, reason: String },
    CantFixDate { file: PathBuf, reason: String },
    MetadataError { file: PathBuf, reason: String },
    CreationDateSetFailed { file: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckProgress {
    Started { folder: PathBuf },
    ProcessedSoFar { count: usize },
    Completed { total: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    SecurityScopedAccessFailed { folder: PathBuf },
    CantOpenFolder { folder: PathBuf, reason: String },
    Cancelled,
    /// `expected` is the name the metadata date implies, when one is known
    NameDoesNotMatchDate { file: PathBuf, expected: Option<String> },
}
