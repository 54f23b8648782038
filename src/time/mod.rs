//! Time extraction module
//!
//! Timestamps come from, in priority order:
//! - EXIF metadata in images
//! - Filename patterns
//! - File system modification time
//!
//! All timestamps are naive local times.

pub mod exif;
pub mod filename;

use chrono::{DateTime, Local, NaiveDateTime};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Extensions whose files may carry EXIF metadata
const EXIF_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "heic", "heif", "png", "webp", "tif", "tiff", "dng", "arw", "cr2", "nef",
    "orf", "rw2", "raf", "srw", "pef",
];

/// Source of the extracted timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// Extracted from EXIF metadata
    Exif,
    /// Parsed from filename
    Filename,
    /// From file system modification time
    FileSystem,
}

/// Result of timestamp extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedTime {
    pub timestamp: NaiveDateTime,
    pub source: TimeSource,
}

/// Capture time recorded by the file itself (EXIF or file name).
///
/// `Ok(None)` means the file carries no date of its own.
pub fn content_time(path: &Path) -> io::Result<Option<ExtractedTime>> {
    if has_exif_extension(path)
        && let Some(timestamp) = exif::read_exif_time(path)?
    {
        debug!(?path, "Extracted time from EXIF");
        return Ok(Some(ExtractedTime {
            timestamp,
            source: TimeSource::Exif,
        }));
    }

    let from_name = path
        .file_name()
        .and_then(|f| f.to_str())
        .and_then(filename::parse_filename_time);

    Ok(from_name.map(|timestamp| {
        debug!(?path, "Extracted time from filename");
        ExtractedTime {
            timestamp,
            source: TimeSource::Filename,
        }
    }))
}

/// Best available creation time: content time, else modification time
pub fn extract_time(path: &Path) -> io::Result<ExtractedTime> {
    if let Some(found) = content_time(path)? {
        return Ok(found);
    }

    debug!(?path, "No content time found, using file system time");
    Ok(ExtractedTime {
        timestamp: modified_time(path)?,
        source: TimeSource::FileSystem,
    })
}

/// Time recorded in metadata, ignoring the file name
pub fn metadata_time(path: &Path) -> io::Result<NaiveDateTime> {
    if has_exif_extension(path)
        && let Some(timestamp) = exif::read_exif_time(path)?
    {
        return Ok(timestamp);
    }
    modified_time(path)
}

/// File system modification time as local time
pub fn modified_time(path: &Path) -> io::Result<NaiveDateTime> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Local>::from(modified).naive_local())
}

fn has_exif_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| EXIF_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
