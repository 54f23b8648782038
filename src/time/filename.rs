//! Filename timestamp parsing

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::trace;

/// Stem format given to files renamed by date
pub const RENAMED_STEM_FORMAT: &str = "%Y-%m-%d--%H-%M";

/// What the capture groups of a pattern hold
#[derive(Debug, Clone, Copy)]
enum Shape {
    /// year, month, day, hour, minute, second
    Full,
    /// year, month, day, hour, minute
    NoSeconds,
    /// year, month, day
    DateOnly,
    /// seconds or milliseconds since the epoch
    Unix,
}

struct FilenamePattern {
    name: &'static str,
    regex: Regex,
    shape: Shape,
}

/// Patterns in the order they are tried
const PATTERN_TABLE: &[(&str, &str, Shape)] = &[
    // Names produced by the sorter itself
    (
        "renamed",
        r"^(\d{4})-(\d{2})-(\d{2})--(\d{2})-(\d{2})(?:_\d+)?$",
        Shape::NoSeconds,
    ),
    (
        "compact",
        r"(\d{4})(\d{2})(\d{2})[_\-](\d{2})(\d{2})(\d{2})",
        Shape::Full,
    ),
    (
        "camera",
        r"(?:IMG|VID|DSC|DCIM|MOV|MVI|DJI|GOPR|GP)[-_]?(\d{4})(\d{2})(\d{2})[-_]?(\d{2})(\d{2})(\d{2})",
        Shape::Full,
    ),
    (
        "screenshot",
        r"(?:Screenshot|Screen Shot|Capture|截图|截屏)[-_\s]*(\d{4})[-_]?(\d{2})[-_]?(\d{2})[-_\s]*(?:at[-_\s]*)?(\d{1,2})[-_\.]?(\d{2})[-_\.]?(\d{2})",
        Shape::Full,
    ),
    (
        "separated",
        r"(\d{4})[-_](\d{2})[-_](\d{2})[-_\s](\d{2})[-_](\d{2})[-_](\d{2})",
        Shape::Full,
    ),
    ("whatsapp", r"(?:IMG|VID)[-_](\d{4})(\d{2})(\d{2})[-_]WA", Shape::DateOnly),
    ("unix", r"(\d{10}|\d{13})", Shape::Unix),
    ("date-only", r"(\d{4})(\d{2})(\d{2})", Shape::DateOnly),
];

static PATTERNS: LazyLock<Vec<FilenamePattern>> = LazyLock::new(|| {
    PATTERN_TABLE
        .iter()
        .filter_map(|&(name, source, shape)| {
            Regex::new(source).ok().map(|regex| FilenamePattern { name, regex, shape })
        })
        .collect()
});

/// Parse a timestamp from a file name using the known naming schemes
pub fn parse_filename_time(filename: &str) -> Option<NaiveDateTime> {
    let stem = match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    };

    PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.regex.captures(stem)?;
        let parsed = build(&caps, pattern.shape)?;
        trace!(filename, pattern = pattern.name, "Matched filename pattern");
        Some(parsed)
    })
}

/// File stem for a file renamed by `date`
pub fn renamed_stem(date: NaiveDateTime) -> String {
    date.format(RENAMED_STEM_FORMAT).to_string()
}

fn build(caps: &Captures<'_>, shape: Shape) -> Option<NaiveDateTime> {
    let field = |i: usize| -> Option<u32> { caps.get(i)?.as_str().parse().ok() };

    match shape {
        Shape::Full => build_datetime(field(1)?, field(2)?, field(3)?, field(4)?, field(5)?, field(6)?),
        Shape::NoSeconds => build_datetime(field(1)?, field(2)?, field(3)?, field(4)?, field(5)?, 0),
        Shape::DateOnly => build_datetime(field(1)?, field(2)?, field(3)?, 0, 0, 0),
        Shape::Unix => {
            let digits = caps.get(1)?.as_str();
            let mut timestamp: i64 = digits.parse().ok()?;
            if digits.len() == 13 {
                timestamp /= 1000;
            }

            // 1990-01-01 ..= 2100-01-01
            if !(631_152_000..=4_102_444_800).contains(&timestamp) {
                return None;
            }
            // Local wall-clock time, like EXIF and file times
            DateTime::from_timestamp(timestamp, 0)
                .map(|dt| dt.with_timezone(&Local).naive_local())
        }
    }
}

fn build_datetime(
    year: u32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<NaiveDateTime> {
    if !(1990..=2100).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year as i32, month, day)?.and_hms_opt(hour, minute, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_compact_format() {
        let dt = parse_filename_time("20240115_143000.jpg").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 1, 15));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (14, 30, 0));

        assert!(parse_filename_time("20240115-143000.jpg").is_some());
    }

    #[test]
    fn test_camera_prefixes() {
        for name in ["IMG_20240115_143000.jpg", "VID_20240115_143000.mp4", "DSC_20240115_143000.jpg"] {
            assert_eq!(parse_filename_time(name).unwrap().year(), 2024, "{name}");
        }
    }

    #[test]
    fn test_renamed_format() {
        let dt = parse_filename_time("2024-03-12--14-30.jpg").unwrap();
        assert_eq!((dt.month(), dt.day(), dt.hour(), dt.minute()), (3, 12, 14, 30));

        let dt = parse_filename_time("2024-03-12--14-30_2.jpg").unwrap();
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_renamed_stem_is_parsed_back() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        let stem = renamed_stem(date);
        assert_eq!(stem, "2023-12-31--23-59");
        assert_eq!(parse_filename_time(&format!("{stem}.png")), Some(date));
    }

    #[test]
    fn test_unix_timestamp() {
        assert_eq!(parse_filename_time("photo_1705329000.jpg").unwrap().year(), 2024);
        assert_eq!(parse_filename_time("photo_1705329000000.jpg").unwrap().year(), 2024);
    }

    #[test]
    fn test_unix_timestamp_is_local_time() {
        use chrono::TimeZone;

        let parsed = parse_filename_time("photo_1705329000.jpg").unwrap();
        let instant = Local.from_local_datetime(&parsed).earliest().unwrap();
        assert_eq!(instant.timestamp(), 1_705_329_000);
    }

    #[test]
    fn test_whatsapp_format() {
        let dt = parse_filename_time("IMG-20240115-WA0001.jpg").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 1, 15));
    }

    #[test]
    fn test_invalid_names() {
        assert!(parse_filename_time("random_file.jpg").is_none());
        assert!(parse_filename_time("photo.jpg").is_none());
        assert!(parse_filename_time("19800101_000000.jpg").is_none());
        assert!(parse_filename_time("20241315_120000.jpg").is_none());
    }
}
