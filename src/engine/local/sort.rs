//! Sorting files into the destination tree

use super::{FolderAccess, MediaKind, check_folder, collect_media, set_file_date};
use crate::config::{RunConfiguration, SortOption};
use crate::engine::events::{FileProcessingError, SortProgress};
use crate::engine::{CancellationToken, EngineError, RunResult};
use crate::hash::same_content;
use crate::time::{self, TimeSource, filename::renamed_stem};
use chrono::{Datelike, NaiveDateTime};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Years accepted for the folder hierarchy
const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 1900..=2100;

pub(super) fn run(
    cancel: &CancellationToken,
    config: &RunConfiguration,
    progress: &mut dyn FnMut(SortProgress),
    errors: &mut dyn FnMut(FileProcessingError),
) -> Result<RunResult, EngineError> {
    let source = config.source();
    let destination = config.destination();

    check_access(source, errors)?;
    if let Err(e) = fs::create_dir_all(destination) {
        debug!(?destination, error = %e, "Cannot create destination");
    }
    check_access(destination, errors)?;

    progress(SortProgress::Started {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
    });

    let nested_destination = destination != source && destination.starts_with(source);
    let files: Vec<PathBuf> = collect_media(source)
        .into_iter()
        .filter(|path| !(nested_destination && path.starts_with(destination)))
        .collect();
    info!(
        ?source,
        ?destination,
        options = ?config.options(),
        files = files.len(),
        "Sorting files"
    );

    let mut run = SortRun {
        config,
        progress,
        errors,
        result: RunResult::new(),
        created: HashSet::new(),
    };

    for file in &files {
        if cancel.is_cancelled() {
            info!(processed = run.result.processed_count, "Sort cancelled");
            (run.errors)(FileProcessingError::Cancelled);
            return Err(EngineError::Cancelled);
        }
        run.sort_one(file);
    }

    let result = run.result;
    (run.progress)(SortProgress::Completed {
        processed: result.processed_count,
    });
    Ok(result)
}

fn check_access(
    folder: &Path,
    errors: &mut dyn FnMut(FileProcessingError),
) -> Result<(), EngineError> {
    check_folder(folder).map_err(|access| {
        errors(match &access {
            FolderAccess::Denied => FileProcessingError::SecurityScopedAccessFailed {
                folder: folder.to_path_buf(),
            },
            FolderAccess::Unavailable(reason) => FileProcessingError::FolderNotAccessible {
                folder: folder.to_path_buf(),
                reason: reason.clone(),
            },
        });
        access.into_error(folder)
    })
}

struct SortRun<'a> {
    config: &'a RunConfiguration,
    progress: &'a mut dyn FnMut(SortProgress),
    errors: &'a mut dyn FnMut(FileProcessingError),
    result: RunResult,
    created: HashSet<PathBuf>,
}

impl SortRun<'_> {
    fn fail(&mut self, path: &Path, reason: impl Into<String>, event: FileProcessingError) {
        let reason = reason.into();
        warn!(?path, %reason, "Sort item failed");
        self.result.record_failure(path, reason);
        (self.errors)(event);
    }

    fn sort_one(&mut self, file: &Path) {
        let Some(kind) = MediaKind::from_path(file) else {
            return;
        };
        let Some((date, source)) = self.resolve_date(file) else {
            return;
        };

        if !PLAUSIBLE_YEARS.contains(&date.year()) {
            let value = date.format("%Y-%m-%d %H:%M").to_string();
            self.fail(
                file,
                format!("implausible date {value}"),
                FileProcessingError::InvalidDate {
                    file: file.to_path_buf(),
                    value,
                },
            );
            return;
        }

        let Some(folder) = self.target_folder(file, kind, date) else {
            return;
        };
        let Some(target) = self.transfer(file, &folder, date) else {
            return;
        };

        self.update_date(&target, &folder, date, source);
        self.result.record_processed();
        (self.progress)(SortProgress::FileProcessed {
            source: file.to_path_buf(),
            target,
        });
    }

    /// Date the file is sorted by, with where it came from
    fn resolve_date(&mut self, file: &Path) -> Option<(NaiveDateTime, TimeSource)> {
        if let Some(forced) = self.config.forced_date() {
            return Some((forced, TimeSource::FileSystem));
        }

        match time::extract_time(file) {
            Ok(found) => Some((found.timestamp, found.source)),
            Err(e) if e.kind() == ErrorKind::Unsupported => {
                self.fail(
                    file,
                    e.to_string(),
                    FileProcessingError::MissingDateComponents {
                        file: file.to_path_buf(),
                    },
                );
                None
            }
            Err(e) => {
                self.fail(
                    file,
                    e.to_string(),
                    FileProcessingError::MetadataError {
                        file: file.to_path_buf(),
                        reason: e.to_string(),
                    },
                );
                None
            }
        }
    }

    /// Destination folder for `file`, created on first use
    fn target_folder(
        &mut self,
        file: &Path,
        kind: MediaKind,
        date: NaiveDateTime,
    ) -> Option<PathBuf> {
        let destination = self.config.destination();
        if !self.config.has(SortOption::CreateFolderHierarchy) {
            return Some(destination.to_path_buf());
        }

        let relative = Path::new(kind.folder_name())
            .join(format!("{:04}", date.year()))
            .join(format!("{:02}", date.month()));
        let folder = destination.join(&relative);

        if self.created.contains(&folder) || folder.is_dir() {
            return Some(folder);
        }

        match fs::create_dir_all(&folder) {
            Ok(()) => {
                debug!(?folder, "Created folder");
                self.created.insert(folder.clone());
                (self.progress)(SortProgress::FolderCreated {
                    name: relative.display().to_string(),
                });
                Some(folder)
            }
            Err(e) => {
                self.fail(
                    file,
                    e.to_string(),
                    FileProcessingError::MoveFailed {
                        source: file.to_path_buf(),
                        destination: folder,
                        reason: e.to_string(),
                    },
                );
                None
            }
        }
    }

    /// Move or copy `file` into `folder`; returns where it ended up
    fn transfer(&mut self, file: &Path, folder: &Path, date: NaiveDateTime) -> Option<PathBuf> {
        let delete_originals = self.config.has(SortOption::DeleteOriginals);
        let name = if self.config.has(SortOption::RenameByDate) {
            match file.extension().and_then(|e| e.to_str()) {
                Some(ext) => format!("{}.{}", renamed_stem(date), ext.to_ascii_lowercase()),
                None => renamed_stem(date),
            }
        } else {
            file.file_name()?.to_string_lossy().into_owned()
        };
        let target = folder.join(name);

        if target == file {
            return Some(target);
        }

        if target.exists() {
            match same_content(file, &target) {
                Ok(true) => {
                    debug!(?file, ?target, "Identical file already at destination");
                    if delete_originals && let Err(e) = fs::remove_file(file) {
                        self.fail(
                            file,
                            e.to_string(),
                            FileProcessingError::DeleteFailed {
                                file: file.to_path_buf(),
                                reason: e.to_string(),
                            },
                        );
                    }
                    return Some(target);
                }
                Ok(false) => {}
                Err(e) => debug!(?file, ?target, error = %e, "Could not compare contents"),
            }
        }

        let result = resolve_filename_conflict(target).and_then(|target| {
            let moved = if delete_originals {
                move_file(file, &target)
            } else {
                copy_preserving_mtime(file, &target).map(|_| Cleanup::Done)
            };
            moved.map(|cleanup| (target, cleanup))
        });

        match result {
            Ok((target, Cleanup::Done)) => Some(target),
            Ok((target, Cleanup::SourceLeft(e))) => {
                self.fail(
                    file,
                    e.to_string(),
                    FileProcessingError::DeleteFailed {
                        file: file.to_path_buf(),
                        reason: e.to_string(),
                    },
                );
                Some(target)
            }
            Err(e) => {
                self.fail(
                    file,
                    e.to_string(),
                    FileProcessingError::MoveFailed {
                        source: file.to_path_buf(),
                        destination: folder.to_path_buf(),
                        reason: e.to_string(),
                    },
                );
                None
            }
        }
    }

    /// Apply the forced or content date to the sorted file
    fn update_date(
        &mut self,
        target: &Path,
        folder: &Path,
        date: NaiveDateTime,
        source: TimeSource,
    ) {
        if self.config.has(SortOption::ForceDate) {
            if let Err(e) = set_file_date(target, date) {
                self.fail(
                    target,
                    e.to_string(),
                    FileProcessingError::CreationDateSetFailed {
                        file: target.to_path_buf(),
                        reason: e.to_string(),
                    },
                );
            }
            return;
        }

        if !self.config.has(SortOption::FixMetadata) {
            return;
        }

        if source == TimeSource::FileSystem {
            let reason = "no capture date in metadata or file name";
            self.fail(
                target,
                reason,
                FileProcessingError::CantFixDate {
                    file: target.to_path_buf(),
                    reason: reason.to_string(),
                },
            );
            return;
        }

        if let Err(e) = set_file_date(target, date) {
            let event = if e.kind() == ErrorKind::PermissionDenied {
                FileProcessingError::MetadataUpdateFailed {
                    file: target.to_path_buf(),
                    folder: folder.to_path_buf(),
                    reason: e.to_string(),
                }
            } else {
                FileProcessingError::DateUpdateFailed {
                    file: target.to_path_buf(),
                    reason: e.to_string(),
                }
            };
            self.fail(target, e.to_string(), event);
        }
    }
}

/// Whether the source of a move is gone
enum Cleanup {
    Done,
    SourceLeft(io::Error),
}

/// Resolve filename conflicts by adding a numeric suffix
fn resolve_filename_conflict(path: PathBuf) -> io::Result<PathBuf> {
    if !path.exists() {
        return Ok(path);
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();

    (1..10000)
        .map(|i| parent.join(format!("{stem}_{i}{extension}")))
        .find(|candidate| !candidate.exists())
        .ok_or_else(|| {
            io::Error::new(
                ErrorKind::AlreadyExists,
                format!("could not find a free name for '{}'", path.display()),
            )
        })
}

/// Rename when possible, otherwise copy and delete the source
fn move_file(source: &Path, dest: &Path) -> io::Result<Cleanup> {
    if fs::rename(source, dest).is_ok() {
        return Ok(Cleanup::Done);
    }

    copy_preserving_mtime(source, dest)?;
    Ok(match fs::remove_file(source) {
        Ok(()) => Cleanup::Done,
        Err(e) => Cleanup::SourceLeft(e),
    })
}

/// Buffered copy that keeps the source modification time
fn copy_preserving_mtime(source: &Path, dest: &Path) -> io::Result<()> {
    let mut reader = BufReader::with_capacity(256 * 1024, File::open(source)?);
    let mut writer = BufWriter::with_capacity(256 * 1024, File::create(dest)?);

    let mut buffer = vec![0u8; 256 * 1024];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
    }
    writer.flush()?;

    let mtime = fs::metadata(source)?.modified()?;
    filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(mtime))
}
