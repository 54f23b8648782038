//! Free-form date parsing with an ordered format fallback chain
//!
//! User input is first reduced to digits and the separators `.`, `-`, `:`
//! and space, then matched strictly against each candidate format in turn.
//! The first format that consumes the whole string wins.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::borrow::Cow;
use tracing::trace;

/// Built-in input patterns, listed in match priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredefinedFormat {
    /// `yyyy-MM-dd HH:mm`
    IsoMinute,
    /// `yyyy-MM-dd`
    IsoDay,
    /// `dd.MM.yyyy HH:mm`
    DayMonthYearMinute,
    /// `dd.MM.yyyy`
    DayMonthYear,
}

impl PredefinedFormat {
    /// All predefined formats in the order they are tried
    pub const ALL: [PredefinedFormat; 4] = [
        PredefinedFormat::IsoMinute,
        PredefinedFormat::IsoDay,
        PredefinedFormat::DayMonthYearMinute,
        PredefinedFormat::DayMonthYear,
    ];

    /// chrono pattern used for parsing
    pub fn pattern(self) -> &'static str {
        match self {
            PredefinedFormat::IsoMinute => "%Y-%m-%d %H:%M",
            PredefinedFormat::IsoDay => "%Y-%m-%d",
            PredefinedFormat::DayMonthYearMinute => "%d.%m.%Y %H:%M",
            PredefinedFormat::DayMonthYear => "%d.%m.%Y",
        }
    }

    /// Human-readable pattern shown in prompts
    pub fn display_pattern(self) -> &'static str {
        match self {
            PredefinedFormat::IsoMinute => "yyyy-MM-dd HH:mm",
            PredefinedFormat::IsoDay => "yyyy-MM-dd",
            PredefinedFormat::DayMonthYearMinute => "dd.MM.yyyy HH:mm",
            PredefinedFormat::DayMonthYear => "dd.MM.yyyy",
        }
    }
}

/// A single candidate format for [`parse`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateFormatSpec {
    Predefined(PredefinedFormat),
    /// User-supplied pattern, either `dd.MM.yyyy HH:mm` token style or a raw
    /// strftime pattern containing `%`
    Custom(String),
}

impl DateFormatSpec {
    /// The predefined chain in priority order
    pub fn predefined() -> Vec<DateFormatSpec> {
        PredefinedFormat::ALL
            .into_iter()
            .map(DateFormatSpec::Predefined)
            .collect()
    }

    fn strftime(&self) -> Cow<'_, str> {
        match self {
            DateFormatSpec::Predefined(format) => Cow::Borrowed(format.pattern()),
            DateFormatSpec::Custom(pattern) => translate_pattern(pattern.trim()),
        }
    }
}

/// Keep only digits, `.`, `-`, `:` and spaces.
///
/// Dropped characters are not replaced, so `12/03/2024` becomes `12032024`.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | ':' | ' '))
        .collect()
}

/// Parse `raw` against `formats` in order, returning the first match.
///
/// Spaces around the sanitized input are ignored.
pub fn parse(raw: &str, formats: &[DateFormatSpec]) -> Option<NaiveDateTime> {
    let sanitized = sanitize(raw);
    let sanitized = sanitized.trim_matches(' ');
    if sanitized.is_empty() {
        return None;
    }

    formats.iter().find_map(|format| {
        let parsed = parse_strict(sanitized, &format.strftime());
        if parsed.is_some() {
            trace!(input = %sanitized, ?format, "Date matched format");
        }
        parsed
    })
}

/// Strict parse: the whole input must be consumed. Patterns without a time
/// component resolve to midnight.
fn parse_strict(input: &str, pattern: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input, pattern)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(input, pattern)
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Convert a `dd.MM.yyyy HH:mm` style pattern into chrono syntax.
///
/// Patterns that already contain `%` are passed through untouched.
fn translate_pattern(pattern: &str) -> Cow<'_, str> {
    if pattern.contains('%') {
        return Cow::Borrowed(pattern);
    }

    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let run = chars[i..].iter().take_while(|&&other| other == c).count();

        let token = match (c, run) {
            ('y', 4) => Some("%Y"),
            ('y', 2) => Some("%y"),
            ('M', 1 | 2) => Some("%m"),
            ('d', 1 | 2) => Some("%d"),
            ('H', 1 | 2) => Some("%H"),
            ('m', 1 | 2) => Some("%M"),
            ('s', 1 | 2) => Some("%S"),
            _ => None,
        };

        match token {
            Some(token) => out.push_str(token),
            None => chars[i..i + run].iter().for_each(|&ch| out.push(ch)),
        }
        i += run;
    }

    Cow::Owned(out)
}
