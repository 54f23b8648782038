//! Filename versus metadata date check

use super::{FolderAccess, check_folder, collect_media};
use crate::engine::events::{CheckError, CheckProgress};
use crate::engine::{CancellationToken, EngineError, RunResult};
use crate::time::{self, filename};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Files inspected between two progress reports
const PROGRESS_INTERVAL: usize = 100;

/// Verdict for one file
#[derive(Debug)]
enum Verdict {
    Matches,
    Mismatch { expected: Option<String>, reason: String },
}

pub(super) fn run(
    cancel: &CancellationToken,
    folder: &Path,
    progress: &mut dyn FnMut(CheckProgress),
    errors: &mut dyn FnMut(CheckError),
) -> Result<RunResult, EngineError> {
    if let Err(access) = check_folder(folder) {
        errors(match &access {
            FolderAccess::Denied => CheckError::SecurityScopedAccessFailed {
                folder: folder.to_path_buf(),
            },
            FolderAccess::Unavailable(reason) => CheckError::CantOpenFolder {
                folder: folder.to_path_buf(),
                reason: reason.clone(),
            },
        });
        return Err(access.into_error(folder));
    }

    progress(CheckProgress::Started {
        folder: folder.to_path_buf(),
    });

    let files = collect_media(folder);
    info!(?folder, files = files.len(), "Checking file names");

    let mut result = RunResult::new();
    for chunk in files.chunks(PROGRESS_INTERVAL) {
        if cancel.is_cancelled() {
            info!(checked = result.processed_count, "Name check cancelled");
            errors(CheckError::Cancelled);
            return Err(EngineError::Cancelled);
        }

        // Inspect in parallel, report in path order
        let verdicts: Vec<(&PathBuf, Verdict)> =
            chunk.par_iter().map(|file| (file, inspect(file))).collect();

        for (file, verdict) in verdicts {
            result.record_processed();
            if let Verdict::Mismatch { expected, reason } = verdict {
                debug!(?file, ?expected, "Name does not match date");
                result.record_failure(file, reason);
                errors(CheckError::NameDoesNotMatchDate {
                    file: file.clone(),
                    expected,
                });
            }
        }

        progress(CheckProgress::ProcessedSoFar {
            count: result.processed_count,
        });
    }

    progress(CheckProgress::Completed {
        total: result.processed_count,
    });
    Ok(result)
}

fn inspect(file: &Path) -> Verdict {
    let metadata = match time::metadata_time(file) {
        Ok(date) => date,
        Err(e) => {
            return Verdict::Mismatch {
                expected: None,
                reason: format!("cannot read metadata: {e}"),
            };
        }
    };
    let expected = filename::renamed_stem(metadata);

    let from_name = file
        .file_name()
        .and_then(|f| f.to_str())
        .and_then(filename::parse_filename_time);

    match from_name {
        Some(named) if same_minute(named, metadata) => Verdict::Matches,
        Some(named) => Verdict::Mismatch {
            reason: format!(
                "name says {}, metadata says {}",
                named.format("%Y-%m-%d %H:%M"),
                metadata.format("%Y-%m-%d %H:%M")
            ),
            expected: Some(expected),
        },
        None => Verdict::Mismatch {
            reason: "no date in file name".to_string(),
            expected: Some(expected),
        },
    }
}

fn same_minute(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    let key = |d: NaiveDateTime| -> (NaiveDate, u32, u32) { (d.date(), d.hour(), d.minute()) };
    key(a) == key(b)
}
