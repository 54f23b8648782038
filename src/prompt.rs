//! Line-based prompt loop
//!
//! Every request re-displays its prompt until a usable answer arrives.
//! Malformed answers are retried without limit. Read failures (I/O errors or
//! end of input) are retried too, but only [`Prompter::max_read_failures`]
//! times in a row; past that the request returns [`Error::InputClosed`] so a
//! closed stdin cannot spin the loop forever.

use crate::date::{self, DateFormatSpec, PredefinedFormat};
use crate::error::{Error, Result};
use crate::output::{write_error, write_prompt, write_success, write_warning};
use chrono::NaiveDateTime;
use rust_i18n::t;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default number of consecutive failed reads before giving up
pub const DEFAULT_MAX_READ_FAILURES: usize = 3;

/// Decides whether a user-supplied path is acceptable
pub trait PathValidator {
    fn validate(&self, path: &Path) -> bool;
}

impl<F> PathValidator for F
where
    F: Fn(&Path) -> bool,
{
    fn validate(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Accepts existing directories whose entries can be listed
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectoryValidator;

impl PathValidator for DirectoryValidator {
    fn validate(&self, path: &Path) -> bool {
        path.is_dir() && fs::read_dir(path).is_ok()
    }
}

/// Prompt loop over a line reader and a terminal writer
pub struct Prompter<R, W, V> {
    input: R,
    output: W,
    validator: V,
    max_read_failures: usize,
}

impl<R: BufRead, W: Write, V: PathValidator> Prompter<R, W, V> {
    pub fn new(input: R, output: W, validator: V) -> Self {
        Self {
            input,
            output,
            validator,
            max_read_failures: DEFAULT_MAX_READ_FAILURES,
        }
    }

    /// Override the consecutive read failure limit (minimum 1)
    pub fn with_max_read_failures(mut self, limit: usize) -> Self {
        self.max_read_failures = limit.max(1);
        self
    }

    /// Terminal writer, for callers that print between prompts
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Ask for `y`/`n`; an empty answer selects `default_on_empty`.
    pub fn request_yes_no(&mut self, prompt: &str, default_on_empty: bool) -> Result<bool> {
        let hint = if default_on_empty { "(Y/n)" } else { "(y/N)" };
        let full_prompt = format!("{prompt} {hint}:");

        loop {
            let answer = self.ask(&full_prompt)?.to_lowercase();
            match answer.as_str() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                "" => return Ok(default_on_empty),
                _ => {
                    debug!(answer = %answer, "Rejected yes/no answer");
                    write_warning(&mut self.output, &t!("prompt_invalid_yes_no"))?;
                }
            }
        }
    }

    /// Ask for a path accepted by the validator.
    pub fn request_path(&mut self, prompt: &str) -> Result<PathBuf> {
        loop {
            let raw = self.ask(&format!("{prompt}:"))?;
            let path = PathBuf::from(raw.trim());

            if !path.as_os_str().is_empty() && self.validator.validate(&path) {
                return Ok(path);
            }

            debug!(?path, "Rejected path");
            write_error(&mut self.output, &t!("prompt_invalid_path"))?;
        }
    }

    /// Ask for a date.
    ///
    /// The predefined formats are tried first; if none matches, one custom
    /// pattern is requested and tried. The whole request repeats until a date
    /// is produced.
    pub fn request_date(&mut self, prompt: &str) -> Result<NaiveDateTime> {
        let predefined = DateFormatSpec::predefined();

        loop {
            let raw = self.ask(&format!("{prompt}:"))?;
            let sanitized = date::sanitize(&raw);

            if let Some(parsed) = date::parse(&sanitized, &predefined) {
                write_success(
                    &mut self.output,
                    &t!(
                        "prompt_date_parsed",
                        date = format_date(parsed),
                        input = sanitized.as_str()
                    ),
                )?;
                return Ok(parsed);
            }

            write_error(
                &mut self.output,
                &t!(
                    "prompt_date_unparsed",
                    input = sanitized.as_str(),
                    formats = known_formats()
                ),
            )?;
            let pattern = self.request_string(&t!("prompt_custom_format"))?;

            if let Some(parsed) = date::parse(&sanitized, &[DateFormatSpec::Custom(pattern)]) {
                write_success(
                    &mut self.output,
                    &t!("prompt_date_parsed_custom", date = format_date(parsed)),
                )?;
                return Ok(parsed);
            }

            write_error(&mut self.output, &t!("prompt_date_invalid"))?;
        }
    }

    /// Ask for one line of free text.
    pub fn request_string(&mut self, prompt: &str) -> Result<String> {
        self.ask(&format!("{prompt}:"))
    }

    /// Show `prompt` and read one line, retrying failed reads.
    fn ask(&mut self, prompt: &str) -> Result<String> {
        let mut failures = 0;

        loop {
            write_prompt(&mut self.output, prompt)?;

            match self.read_line() {
                Some(line) => return Ok(line),
                None => {
                    failures += 1;
                    warn!(failures, "Failed to read a line of input");
                    writeln!(self.output)?;
                    write_error(&mut self.output, &t!("prompt_read_error"))?;

                    if failures >= self.max_read_failures {
                        return Err(Error::InputClosed { attempts: failures });
                    }
                }
            }
        }
    }

    /// One line without its terminator; `None` on end of input or I/O error
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
                line.truncate(trimmed_len);
                Some(line)
            }
            Err(e) => {
                debug!(error = %e, "Input read error");
                None
            }
        }
    }
}

fn known_formats() -> String {
    PredefinedFormat::ALL
        .iter()
        .map(|format| format.display_pattern())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format a date the way prompts and summaries show it
pub fn format_date(date: NaiveDateTime) -> String {
    date.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::io::Cursor;

    type TestPrompter = Prompter<Cursor<Vec<u8>>, Vec<u8>, fn(&Path) -> bool>;

    fn accept_all(_: &Path) -> bool {
        true
    }

    fn only_photos(path: &Path) -> bool {
        path == Path::new("/photos")
    }

    fn prompter(input: &str, validator: fn(&Path) -> bool) -> TestPrompter {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), validator)
    }

    fn output(p: &mut TestPrompter) -> String {
        String::from_utf8_lossy(p.output()).into_owned()
    }

    #[test]
    fn test_yes_no_empty_uses_default() {
        let mut p = prompter("\n", accept_all);
        assert!(p.request_yes_no("Continue?", true).unwrap());

        let mut p = prompter("\n", accept_all);
        assert!(!p.request_yes_no("Continue?", false).unwrap());
    }

    #[test]
    fn test_yes_no_is_case_insensitive() {
        let mut p = prompter("Y\nN\n", accept_all);
        assert!(p.request_yes_no("First?", false).unwrap());
        assert!(!p.request_yes_no("Second?", true).unwrap());
    }

    #[test]
    fn test_yes_no_reprompts_on_other_input() {
        let mut p = prompter("yes\nmaybe\n \nn\n", accept_all);
        assert!(!p.request_yes_no("Continue?", true).unwrap());

        let text = output(&mut p);
        assert_eq!(text.matches("Continue? (Y/n):").count(), 4);
        assert_eq!(text.matches("Invalid input").count(), 3);
    }

    #[test]
    fn test_path_reprompts_until_valid() {
        let mut p = prompter("/nowhere\n\n  /photos  \n", only_photos);
        let path = p.request_path("Source folder").unwrap();
        assert_eq!(path, PathBuf::from("/photos"));
        assert_eq!(output(&mut p).matches("Invalid path").count(), 2);
    }

    #[test]
    fn test_date_with_predefined_format() {
        let mut p = prompter("12.03.2024 14:30\n", accept_all);
        let date = p.request_date("Date").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 3, 12));
        assert_eq!((date.hour(), date.minute()), (14, 30));
    }

    #[test]
    fn test_date_falls_back_to_custom_format() {
        let mut p = prompter("12/03/2024\nddMMyyyy\n", accept_all);
        let date = p.request_date("Date").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 3, 12));
        assert!(output(&mut p).contains("12032024"));
    }

    #[test]
    fn test_date_loops_after_failed_custom_format() {
        let mut p = prompter("garbage 1\nyyyy\n2024-03-12\n", accept_all);
        let date = p.request_date("Date").unwrap();
        assert_eq!(date.day(), 12);
        assert_eq!(output(&mut p).matches("Date:").count(), 2);
    }

    #[test]
    fn test_string_returns_line_verbatim() {
        let mut p = prompter("  dd.MM.yyyy \r\n", accept_all);
        assert_eq!(p.request_string("Format").unwrap(), "  dd.MM.yyyy ");
    }

    #[test]
    fn test_end_of_input_reprompts_then_gives_up() {
        let mut p = prompter("", accept_all).with_max_read_failures(4);
        let err = p.request_yes_no("Continue?", true).unwrap_err();
        assert!(matches!(err, Error::InputClosed { attempts: 4 }));
        assert_eq!(output(&mut p).matches("Continue? (Y/n):").count(), 4);
    }

    #[test]
    fn test_directory_validator() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("photo.jpg");
        fs::write(&file, b"x").unwrap();

        assert!(DirectoryValidator.validate(dir.path()));
        assert!(!DirectoryValidator.validate(&file));
        assert!(!DirectoryValidator.validate(&dir.path().join("missing")));
    }
}
