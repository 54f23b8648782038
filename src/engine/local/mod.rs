//! Engine working directly on the local filesystem

mod check;
mod dates;
mod sort;

use super::events::{
    CheckError, CheckProgress, ConversionError, ConversionProgress, FileProcessingError,
    FixDateError, FixDateProgress, SortProgress,
};
use super::{CancellationToken, Engine, EngineError, RunResult};
use crate::config::{ConvertRequest, RunConfiguration};
use chrono::{Local, NaiveDateTime, TimeZone};
use filetime::FileTime;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "heic", "heif", "avif", "tiff", "tif", "raw",
    "arw", "cr2", "cr3", "nef", "orf", "rw2", "dng", "raf", "srw", "pef",
];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "wmv", "flv", "m4v", "3gp"];

/// Kind of media file, decided by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub(crate) fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if PHOTO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Photo)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Top-level folder used by the date hierarchy
    pub(crate) fn folder_name(self) -> &'static str {
        match self {
            MediaKind::Photo => "Photos",
            MediaKind::Video => "Videos",
        }
    }
}

/// Why a folder cannot be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FolderAccess {
    Denied,
    Unavailable(String),
}

impl FolderAccess {
    fn into_error(self, path: &Path) -> EngineError {
        match self {
            FolderAccess::Denied => EngineError::AccessDenied(path.to_path_buf()),
            FolderAccess::Unavailable(reason) => EngineError::FolderNotAccessible {
                path: path.to_path_buf(),
                reason,
            },
        }
    }
}

/// Check that `path` is a directory whose entries can be listed
pub(crate) fn check_folder(path: &Path) -> Result<(), FolderAccess> {
    match fs::read_dir(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(FolderAccess::Denied),
        Err(e) => Err(FolderAccess::Unavailable(e.to_string())),
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// All media files below `root`, hidden entries skipped, in path order
pub(crate) fn collect_media(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "Skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(DirEntry::into_path)
        .filter(|path| MediaKind::from_path(path).is_some())
        .collect();

    files.sort();
    debug!(?root, count = files.len(), "Collected media files");
    files
}

/// Set access and modification time of `path` to the local time `date`
pub(crate) fn set_file_date(path: &Path, date: NaiveDateTime) -> io::Result<()> {
    let local = Local.from_local_datetime(&date).earliest().ok_or_else(|| {
        io::Error::new(
            ErrorKind::InvalidInput,
            format!("{date} does not exist in the local time zone"),
        )
    })?;

    let time = FileTime::from_unix_time(local.timestamp(), local.timestamp_subsec_nanos());
    filetime::set_file_times(path, time, time)
}

/// Engine backed by `std::fs`
#[derive(Debug, Clone, Default)]
pub struct LocalEngine {
    cancel: CancellationToken,
}

impl LocalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that stops when `token` is cancelled
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self { cancel: token }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Engine for LocalEngine {
    fn convert(
        &self,
        request: &ConvertRequest,
        progress: &mut dyn FnMut(ConversionProgress),
        errors: &mut dyn FnMut(ConversionError),
    ) -> Result<RunResult, EngineError> {
        let _run = self.cancel.begin();
        let folder = &request.folder;
        if let Err(access) = check_folder(folder) {
            errors(match &access {
                FolderAccess::Denied => ConversionError::SecurityScopedAccessFailed {
                    folder: folder.clone(),
                },
                FolderAccess::Unavailable(_) => ConversionError::CantOpenFolder {
                    folder: folder.clone(),
                },
            });
            return Err(access.into_error(folder));
        }

        progress(ConversionProgress::Started {
            folder: folder.clone(),
        });

        let extensions = request.format.extensions();
        let files: Vec<PathBuf> = collect_media(folder)
            .into_iter()
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| extensions.contains(&ext.to_ascii_lowercase().as_str()))
            })
            .collect();
        info!(
            ?folder,
            format = request.format.display_name(),
            files = files.len(),
            "Conversion requested"
        );

        for file in files {
            if self.cancel.is_cancelled() {
                errors(ConversionError::Cancelled);
                return Err(EngineError::Cancelled);
            }
            progress(ConversionProgress::FileFound { file });
        }

        Err(EngineError::Unsupported(format!(
            "{} to HEIC conversion",
            request.format.display_name()
        )))
    }

    fn sort(
        &self,
        config: &RunConfiguration,
        progress: &mut dyn FnMut(SortProgress),
        errors: &mut dyn FnMut(FileProcessingError),
    ) -> Result<RunResult, EngineError> {
        let _run = self.cancel.begin();
        sort::run(&self.cancel, config, progress, errors)
    }

    fn fix_dates(
        &self,
        folder: &Path,
        progress: &mut dyn FnMut(FixDateProgress),
        errors: &mut dyn FnMut(FixDateError),
    ) -> Result<RunResult, EngineError> {
        let _run = self.cancel.begin();
        dates::fix(&self.cancel, folder, progress, errors)
    }

    fn force_date(
        &self,
        folder: &Path,
        date: NaiveDateTime,
        progress: &mut dyn FnMut(FixDateProgress),
        errors: &mut dyn FnMut(FixDateError),
    ) -> Result<RunResult, EngineError> {
        let _run = self.cancel.begin();
        dates::force(&self.cancel, folder, date, progress, errors)
    }

    fn check_names(
        &self,
        folder: &Path,
        progress: &mut dyn FnMut(CheckProgress),
        errors: &mut dyn FnMut(CheckError),
    ) -> Result<RunResult, EngineError> {
        let _run = self.cancel.begin();
        check::run(&self.cancel, folder, progress, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceFormat;
    use crate::time::modified_time;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    #[test]
    fn test_media_kind_by_extension() {
        assert_eq!(MediaKind::from_path(Path::new("a.JPG")), Some(MediaKind::Photo));
        assert_eq!(MediaKind::from_path(Path::new("a.dng")), Some(MediaKind::Photo));
        assert_eq!(MediaKind::from_path(Path::new("a.mov")), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(MediaKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_collect_media_skips_hidden_and_other_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("trip")).unwrap();
        fs::create_dir_all(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join("b.jpg"), b"b").unwrap();
        fs::write(dir.path().join("trip").join("a.mp4"), b"a").unwrap();
        fs::write(dir.path().join(".hidden.jpg"), b"h").unwrap();
        fs::write(dir.path().join(".cache").join("c.jpg"), b"c").unwrap();
        fs::write(dir.path().join("notes.txt"), b"n").unwrap();

        let files = collect_media(dir.path());
        assert_eq!(
            files,
            vec![dir.path().join("b.jpg"), dir.path().join("trip").join("a.mp4")]
        );
    }

    #[test]
    fn test_check_folder() {
        let dir = tempdir().unwrap();
        assert_eq!(check_folder(dir.path()), Ok(()));
        assert!(matches!(
            check_folder(&dir.path().join("missing")),
            Err(FolderAccess::Unavailable(_))
        ));
    }

    #[test]
    fn test_set_file_date() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        fs::write(&path, b"a").unwrap();

        let date = NaiveDate::from_ymd_opt(2020, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        set_file_date(&path, date).unwrap();
        assert_eq!(modified_time(&path).unwrap(), date);
    }

    #[test]
    fn test_convert_is_unsupported() {
        let dir = tempdir().unwrap();
        let request = ConvertRequest {
            format: SourceFormat::PngImage,
            folder: dir.path().to_path_buf(),
            delete_originals: false,
        };

        fs::write(dir.path().join("b.PNG"), b"b").unwrap();
        fs::write(dir.path().join("a.jpg"), b"a").unwrap();

        let mut events = Vec::new();
        let result = LocalEngine::new().convert(&request, &mut |e| events.push(e), &mut |_| {});
        assert!(matches!(result, Err(EngineError::Unsupported(_))));
        assert_eq!(
            events,
            vec![
                ConversionProgress::Started {
                    folder: dir.path().to_path_buf()
                },
                ConversionProgress::FileFound {
                    file: dir.path().join("b.PNG")
                },
            ]
        );
    }

    #[test]
    fn test_interrupt_stops_running_sort() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::write(src.path().join("a.jpg"), b"a").unwrap();
        fs::write(src.path().join("b.jpg"), b"b").unwrap();
        let config = RunConfiguration::builder(src.path(), dst.path())
            .build()
            .unwrap();

        let engine = LocalEngine::with_cancellation(CancellationToken::new());
        let token = engine.cancellation_token();
        let mut errors = Vec::new();
        let result = engine.sort(
            &config,
            &mut |event| {
                if matches!(event, SortProgress::FileProcessed { .. }) {
                    assert!(token.interrupt());
                }
            },
            &mut |e| errors.push(e),
        );

        assert!(matches!(result, Err(EngineError::Cancelled)));
        assert_eq!(errors, vec![FileProcessingError::Cancelled]);
        assert!(!token.is_running());
        assert!(!token.interrupt());
    }

    #[test]
    fn test_stale_cancellation_is_cleared_by_next_run() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("clip.mov"), b"v").unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let engine = LocalEngine::with_cancellation(token.clone());
        let result = engine.check_names(dir.path(), &mut |_| {}, &mut |_| {});

        assert_eq!(result.unwrap().processed_count, 1);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_convert_missing_folder_reports_open_failure() {
        let dir = tempdir().unwrap();
        let request = ConvertRequest {
            format: SourceFormat::RawImage,
            folder: dir.path().join("missing"),
            delete_originals: true,
        };

        let mut reported = Vec::new();
        let result = LocalEngine::new().convert(&request, &mut |_| {}, &mut |e| reported.push(e));
        assert!(matches!(result, Err(EngineError::FolderNotAccessible { .. })));
        assert!(matches!(reported[..], [ConversionError::CantOpenFolder { .. }]));
    }
}
