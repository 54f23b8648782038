//! Event reporting
//!
//! Every engine event maps to a [`Severity`] and a localized message. The
//! severity decides the [`Disposition`] the dispatcher acts on. The mappings
//! are exhaustive matches without wildcard arms, so adding an event variant
//! forces a decision here.

use crate::engine::events::{
    CheckError, CheckProgress, ConversionError, ConversionProgress, FileProcessingError,
    FixDateError, FixDateProgress, SortProgress,
};
use crate::output::{CliTheme, terminal_safe, write_line};
use crate::prompt::format_date;
use crossterm::style::Color;
use rust_i18n::t;
use std::fmt::Debug;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// How serious an event is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Progress,
    Success,
    ItemFailure,
    Fatal,
    Cancelled,
}

/// What the run should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    Abort,
    Cancelled,
}

impl Severity {
    pub fn disposition(self) -> Disposition {
        match self {
            Severity::Progress | Severity::Success | Severity::ItemFailure => {
                Disposition::Continue
            }
            Severity::Fatal => Disposition::Abort,
            Severity::Cancelled => Disposition::Cancelled,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Severity::Progress => "•",
            Severity::Success => "✓",
            Severity::ItemFailure => "⚠",
            Severity::Fatal => "✗",
            Severity::Cancelled => "■",
        }
    }

    fn color(self) -> Color {
        match self {
            Severity::Progress => CliTheme::ACCENT,
            Severity::Success => CliTheme::SUCCESS,
            Severity::ItemFailure => CliTheme::WARNING,
            Severity::Fatal => CliTheme::ERROR,
            Severity::Cancelled => CliTheme::HINT,
        }
    }
}

/// An engine event the reporter can render
pub trait Reportable {
    fn severity(&self) -> Severity;
    fn message(&self) -> String;
}

fn name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn full(path: &Path) -> String {
    path.display().to_string()
}

impl Reportable for ConversionProgress {
    fn severity(&self) -> Severity {
        match self {
            ConversionProgress::Started { .. }
            | ConversionProgress::FileFound { .. }
            | ConversionProgress::OriginalDeleted { .. } => Severity::Progress,
            ConversionProgress::Completed { .. } => Severity::Success,
        }
    }

    fn message(&self) -> String {
        match self {
            ConversionProgress::Started { folder } => {
                t!("event_convert_started", folder = full(folder)).into_owned()
            }
            ConversionProgress::FileFound { file } => {
                t!("event_convert_file_found", file = name(file)).into_owned()
            }
            ConversionProgress::OriginalDeleted { file } => {
                t!("event_convert_original_deleted", file = name(file)).into_owned()
            }
            ConversionProgress::Completed { converted } => {
                t!("event_convert_completed", count = converted).into_owned()
            }
        }
    }
}

impl Reportable for ConversionError {
    fn severity(&self) -> Severity {
        match self {
            ConversionError::SecurityScopedAccessFailed { .. }
            | ConversionError::CantOpenFolder { .. } => Severity::Fatal,
            ConversionError::Cancelled => Severity::Cancelled,
            ConversionError::DeleteOriginalFailed { .. }
            | ConversionError::ReadFailed { .. }
            | ConversionError::DecodeFailed { .. }
            | ConversionError::DestinationCreateFailed { .. }
            | ConversionError::SaveFailed { .. } => Severity::ItemFailure,
        }
    }

    fn message(&self) -> String {
        match self {
            ConversionError::SecurityScopedAccessFailed { folder } => {
                t!("event_access_denied", folder = full(folder)).into_owned()
            }
            ConversionError::Cancelled => t!("event_cancelled").into_owned(),
            ConversionError::CantOpenFolder { folder } => {
                t!("event_cant_open_folder", folder = full(folder)).into_owned()
            }
            ConversionError::DeleteOriginalFailed { file, reason } => t!(
                "event_delete_original_failed",
                file = name(file),
                reason = reason
            )
            .into_owned(),
            ConversionError::ReadFailed { file } => {
                t!("event_read_failed", file = name(file)).into_owned()
            }
            ConversionError::DecodeFailed { file } => {
                t!("event_decode_failed", file = name(file)).into_owned()
            }
            ConversionError::DestinationCreateFailed { file } => {
                t!("event_destination_create_failed", file = name(file)).into_owned()
            }
            ConversionError::SaveFailed { file, reason } => {
                t!("event_save_failed", file = name(file), reason = reason).into_owned()
            }
        }
    }
}

impl Reportable for SortProgress {
    fn severity(&self) -> Severity {
        match self {
            SortProgress::Started { .. }
            | SortProgress::FolderCreated { .. }
            | SortProgress::FileProcessed { .. } => Severity::Progress,
            SortProgress::Completed { .. } => Severity::Success,
        }
    }

    fn message(&self) -> String {
        match self {
            SortProgress::Started {
                source,
                destination,
            } => t!(
                "event_sort_started",
                source = full(source),
                destination = full(destination)
            )
            .into_owned(),
            SortProgress::FolderCreated { name } => {
                t!("event_folder_created", name = name).into_owned()
            }
            SortProgress::FileProcessed { source, target } => t!(
                "event_file_processed",
                source = name(source),
                target = full(target)
            )
            .into_owned(),
            SortProgress::Completed { processed } => {
                t!("event_sort_completed", count = processed).into_owned()
            }
        }
    }
}

impl Reportable for FileProcessingError {
    fn severity(&self) -> Severity {
        match self {
            FileProcessingError::SecurityScopedAccessFailed { .. }
            | FileProcessingError::FolderNotAccessible { .. } => Severity::Fatal,
            FileProcessingError::Cancelled => Severity::Cancelled,
            FileProcessingError::InvalidDate { .. }
            | FileProcessingError::MissingDateComponents { .. }
            | FileProcessingError::MoveFailed { .. }
            | FileProcessingError::MetadataUpdateFailed { .. }
            | FileProcessingError::DateUpdateFailed { .. }
            | FileProcessingError::CantFixDate { .. }
            | FileProcessingError::MetadataError { .. }
            | FileProcessingError::CreationDateSetFailed { .. }
            | FileProcessingError::DeleteFailed { .. } => Severity::ItemFailure,
        }
    }

    fn message(&self) -> String {
        match self {
            FileProcessingError::SecurityScopedAccessFailed { folder } => {
                t!("event_access_denied", folder = full(folder)).into_owned()
            }
            FileProcessingError::Cancelled => t!("event_cancelled").into_owned(),
            FileProcessingError::FolderNotAccessible { folder, reason } => t!(
                "event_folder_not_accessible",
                folder = full(folder),
                reason = reason
            )
            .into_owned(),
            FileProcessingError::InvalidDate { file, value } => {
                t!("event_invalid_date", file = name(file), value = value).into_owned()
            }
            FileProcessingError::MissingDateComponents { file } => {
                t!("event_missing_date_components", file = name(file)).into_owned()
            }
            FileProcessingError::MoveFailed {
                source,
                destination,
                reason,
            } => t!(
                "event_move_failed",
                source = name(source),
                destination = full(destination),
                reason = reason
            )
            .into_owned(),
            FileProcessingError::MetadataUpdateFailed {
                file,
                folder,
                reason,
            } => t!(
                "event_metadata_update_failed",
                file = name(file),
                folder = full(folder),
                reason = reason
            )
            .into_owned(),
            FileProcessingError::DateUpdateFailed { file, reason } => {
                t!("event_date_update_failed", file = name(file), reason = reason).into_owned()
            }
            FileProcessingError::CantFixDate { file, reason } => {
                t!("event_cant_fix_date", file = name(file), reason = reason).into_owned()
            }
            FileProcessingError::MetadataError { file, reason } => {
                t!("event_metadata_error", file = name(file), reason = reason).into_owned()
            }
            FileProcessingError::CreationDateSetFailed { file, reason } => t!(
                "event_creation_date_set_failed",
                file = name(file),
                reason = reason
            )
            .into_owned(),
            FileProcessingError::DeleteFailed { file, reason } => {
                t!("event_delete_failed", file = name(file), reason = reason).into_owned()
            }
        }
    }
}

impl Reportable for FixDateProgress {
    fn severity(&self) -> Severity {
        match self {
            FixDateProgress::Started { .. } | FixDateProgress::DateUpdated { .. } => {
                Severity::Progress
            }
            FixDateProgress::Completed { .. } => Severity::Success,
        }
    }

    fn message(&self) -> String {
        match self {
            FixDateProgress::Started { folder } => {
                t!("event_dates_started", folder = full(folder)).into_owned()
            }
            FixDateProgress::DateUpdated { file, date } => t!(
                "event_date_updated",
                file = name(file),
                date = format_date(*date)
            )
            .into_owned(),
            FixDateProgress::Completed { updated } => {
                t!("event_dates_completed", count = updated).into_owned()
            }
        }
    }
}

impl Reportable for FixDateError {
    fn severity(&self) -> Severity {
        match self {
            FixDateError::SecurityScopedAccessFailed { .. }
            | FixDateError::FolderNotAccessible { .. } => Severity::Fatal,
            FixDateError::Cancelled => Severity::Cancelled,
            FixDateError::DateUpdateFailed { .. }
            | FixDateError::CantFixDate { .. }
            | FixDateError::MetadataError { .. }
            | FixDateError::CreationDateSetFailed { .. } => Severity::ItemFailure,
        }
    }

    fn message(&self) -> String {
        match self {
            FixDateError::SecurityScopedAccessFailed { folder } => {
                t!("event_access_denied", folder = full(folder)).into_owned()
            }
            FixDateError::Cancelled => t!("event_cancelled").into_owned(),
            FixDateError::FolderNotAccessible { folder, reason } => t!(
                "event_folder_not_accessible",
                folder = full(folder),
                reason = reason
            )
            .into_owned(),
            FixDateError::DateUpdateFailed { file, reason } => {
                t!("event_date_update_failed", file = name(file), reason = reason).into_owned()
            }
            FixDateError::CantFixDate { file, reason } => {
                t!("event_cant_fix_date", file = name(file), reason = reason).into_owned()
            }
            FixDateError::MetadataError { file, reason } => {
                t!("event_metadata_error", file = name(file), reason = reason).into_owned()
            }
            FixDateError::CreationDateSetFailed { file, reason } => t!(
                "event_creation_date_set_failed",
                file = name(file),
                reason = reason
            )
            .into_owned(),
        }
    }
}

impl Reportable for CheckProgress {
    fn severity(&self) -> Severity {
        match self {
            CheckProgress::Started { .. } | CheckProgress::ProcessedSoFar { .. } => {
                Severity::Progress
            }
            CheckProgress::Completed { .. } => Severity::Success,
        }
    }

    fn message(&self) -> String {
        match self {
            CheckProgress::Started { folder } => {
                t!("event_check_started", folder = full(folder)).into_owned()
            }
            CheckProgress::ProcessedSoFar { count } => {
                t!("event_check_progress", count = count).into_owned()
            }
            CheckProgress::Completed { total } => {
                t!("event_check_completed", count = total).into_owned()
            }
        }
    }
}

impl Reportable for CheckError {
    fn severity(&self) -> Severity {
        match self {
            CheckError::SecurityScopedAccessFailed { .. } | CheckError::CantOpenFolder { .. } => {
                Severity::Fatal
            }
            CheckError::Cancelled => Severity::Cancelled,
            CheckError::NameDoesNotMatchDate { .. } => Severity::ItemFailure,
        }
    }

    fn message(&self) -> String {
        match self {
            CheckError::SecurityScopedAccessFailed { folder } => {
                t!("event_access_denied", folder = full(folder)).into_owned()
            }
            CheckError::CantOpenFolder { folder, reason } => t!(
                "event_folder_not_accessible",
                folder = full(folder),
                reason = reason
            )
            .into_owned(),
            CheckError::Cancelled => t!("event_cancelled").into_owned(),
            CheckError::NameDoesNotMatchDate {
                file,
                expected: Some(expected),
            } => t!(
                "event_name_mismatch_expected",
                file = name(file),
                expected = expected
            )
            .into_owned(),
            CheckError::NameDoesNotMatchDate {
                file,
                expected: None,
            } => t!("event_name_mismatch", file = name(file)).into_owned(),
        }
    }
}

/// Writes one terminal line per event
pub struct EventReporter<W> {
    out: W,
}

impl<W: Write> EventReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.out
    }

    /// Render `event` and return what the run should do next
    pub fn report<E: Reportable + Debug>(&mut self, event: &E) -> Disposition {
        let severity = event.severity();
        let disposition = severity.disposition();
        debug!(?event, ?severity, "Engine event");

        let message = terminal_safe(&event.message());
        if let Err(e) = write_line(&mut self.out, severity.icon(), severity.color(), &message) {
            warn!(error = %e, "Failed to write event to terminal");
        }
        disposition
    }
}
