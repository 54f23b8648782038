//! Timestamp repair and forced dates

use super::{FolderAccess, check_folder, collect_media, set_file_date};
use crate::engine::events::{FixDateError, FixDateProgress};
use crate::engine::{CancellationToken, EngineError, RunResult};
use crate::time;
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::{info, warn};

/// Reset each file's timestamps to the date found in its content
pub(super) fn fix(
    cancel: &CancellationToken,
    folder: &Path,
    progress: &mut dyn FnMut(FixDateProgress),
    errors: &mut dyn FnMut(FixDateError),
) -> Result<RunResult, EngineError> {
    for_each_file(cancel, folder, progress, errors, |file| {
        let found = time::content_time(file).map_err(|e| FixDateError::MetadataError {
            file: file.to_path_buf(),
            reason: e.to_string(),
        })?;
        let found = found.ok_or_else(|| FixDateError::CantFixDate {
            file: file.to_path_buf(),
            reason: "no capture date in metadata or file name".to_string(),
        })?;

        set_file_date(file, found.timestamp).map_err(|e| FixDateError::DateUpdateFailed {
            file: file.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(found.timestamp)
    })
}

/// Stamp every file in `folder` with `date`
pub(super) fn force(
    cancel: &CancellationToken,
    folder: &Path,
    date: NaiveDateTime,
    progress: &mut dyn FnMut(FixDateProgress),
    errors: &mut dyn FnMut(FixDateError),
) -> Result<RunResult, EngineError> {
    for_each_file(cancel, folder, progress, errors, |file| {
        set_file_date(file, date).map_err(|e| FixDateError::CreationDateSetFailed {
            file: file.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(date)
    })
}

/// Shared loop: access check, per-file update, cancellation, completion
fn for_each_file(
    cancel: &CancellationToken,
    folder: &Path,
    progress: &mut dyn FnMut(FixDateProgress),
    errors: &mut dyn FnMut(FixDateError),
    mut update: impl FnMut(&Path) -> Result<NaiveDateTime, FixDateError>,
) -> Result<RunResult, EngineError> {
    if let Err(access) = check_folder(folder) {
        errors(match &access {
            FolderAccess::Denied => FixDateError::SecurityScopedAccessFailed {
                folder: folder.to_path_buf(),
            },
            FolderAccess::Unavailable(reason) => FixDateError::FolderNotAccessible {
                folder: folder.to_path_buf(),
                reason: reason.clone(),
            },
        });
        return Err(access.into_error(folder));
    }

    progress(FixDateProgress::Started {
        folder: folder.to_path_buf(),
    });

    let mut result = RunResult::new();
    for file in collect_media(folder) {
        if cancel.is_cancelled() {
            info!(updated = result.processed_count, "Date update cancelled");
            errors(FixDateError::Cancelled);
            return Err(EngineError::Cancelled);
        }

        match update(&file) {
            Ok(date) => {
                result.record_processed();
                progress(FixDateProgress::DateUpdated { file, date });
            }
            Err(event) => {
                let reason = failure_reason(&event);
                warn!(?file, %reason, "Date update failed");
                result.record_failure(&file, reason);
                errors(event);
            }
        }
    }

    progress(FixDateProgress::Completed {
        updated: result.processed_count,
    });
    Ok(result)
}

fn failure_reason(event: &FixDateError) -> String {
    match event {
        FixDateError::DateUpdateFailed { reason, .. }
        | FixDateError::CantFixDate { reason, .. }
        | FixDateError::MetadataError { reason, .. }
        | FixDateError::CreationDateSetFailed { reason, .. }
        | FixDateError::FolderNotAccessible { reason, .. } => reason.clone(),
        FixDateError::SecurityScopedAccessFailed { .. } => "access denied".to_string(),
        FixDateError::Cancelled => "cancelled".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::modified_time;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_fix_uses_filename_date() {
        let dir = tempdir().unwrap();
        let named = dir.path().join("IMG_20210704_091500.jpg");
        let unnamed = dir.path().join("beach.jpg");
        fs::write(&named, b"a").unwrap();
        fs::write(&unnamed, b"b").unwrap();

        let mut progress = Vec::new();
        let mut errors = Vec::new();
        let result = fix(
            &CancellationToken::new(),
            dir.path(),
            &mut |e| progress.push(e),
            &mut |e| errors.push(e),
        )
        .unwrap();

        let expected = NaiveDate::from_ymd_opt(2021, 7, 4)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap();
        assert_eq!(modified_time(&named).unwrap(), expected);
        assert_eq!(result.processed_count, 1);
        assert_eq!(result.error_count(), 1);
        assert!(matches!(errors[..], [FixDateError::CantFixDate { .. }]));
        assert_eq!(progress.last(), Some(&FixDateProgress::Completed { updated: 1 }));
    }

    #[test]
    fn test_force_stamps_every_file() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("sub").join("b.mov");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();

        let date = NaiveDate::from_ymd_opt(2010, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 0)
            .unwrap();
        let result = force(
            &CancellationToken::new(),
            dir.path(),
            date,
            &mut |_| {},
            &mut |_| {},
        )
        .unwrap();

        assert_eq!(result.processed_count, 2);
        assert_eq!(modified_time(&a).unwrap(), date);
        assert_eq!(modified_time(&b).unwrap(), date);
    }

    #[test]
    fn test_missing_folder_is_fatal() {
        let dir = tempdir().unwrap();
        let mut errors = Vec::new();
        let result = fix(
            &CancellationToken::new(),
            &dir.path().join("missing"),
            &mut |_| {},
            &mut |e| errors.push(e),
        );

        assert!(matches!(result, Err(EngineError::FolderNotAccessible { .. })));
        assert!(matches!(errors[..], [FixDateError::FolderNotAccessible { .. }]));
    }
}
