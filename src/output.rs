//! Terminal output styling
//!
//! Shared colors and line helpers for prompts, event reports and summaries.
//! Every helper writes to an arbitrary [`Write`] so the same code renders to
//! stdout and to in-memory buffers.

use crossterm::style::{Color, Stylize, style};
use std::io::{self, Write};

/// CLI theme colors
pub struct CliTheme;

impl CliTheme {
    /// Success (green)
    pub const SUCCESS: Color = Color::Green;
    /// Warning (yellow)
    pub const WARNING: Color = Color::Yellow;
    /// Error (red)
    pub const ERROR: Color = Color::Red;
    /// Hint (dark grey)
    pub const HINT: Color = Color::DarkGrey;
    /// Accent (cyan)
    pub const ACCENT: Color = Color::Cyan;
}

/// Print a separator line
pub fn write_separator(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "─".repeat(60))
}

/// Print a centered bold title
pub fn write_title(out: &mut impl Write, title: &str) -> io::Result<()> {
    let padding = 60usize.saturating_sub(title.chars().count()) / 2;
    writeln!(out, "{}{}", " ".repeat(padding), title.bold())
}

/// Print an icon-prefixed line
pub fn write_line(out: &mut impl Write, icon: &str, color: Color, msg: &str) -> io::Result<()> {
    writeln!(out, "{} {}", style(icon).with(color).bold(), msg)
}

pub fn write_success(out: &mut impl Write, msg: &str) -> io::Result<()> {
    write_line(out, "✓", CliTheme::SUCCESS, msg)
}

pub fn write_warning(out: &mut impl Write, msg: &str) -> io::Result<()> {
    write_line(out, "⚠", CliTheme::WARNING, msg)
}

pub fn write_error(out: &mut impl Write, msg: &str) -> io::Result<()> {
    write_line(out, "✗", CliTheme::ERROR, msg)
}

pub fn write_hint(out: &mut impl Write, msg: &str) -> io::Result<()> {
    write_line(out, "→", CliTheme::HINT, msg)
}

/// Print a key/value pair, colored value when `value_color` is set
pub fn write_key_value(
    out: &mut impl Write,
    key: &str,
    value: &str,
    value_color: Option<Color>,
) -> io::Result<()> {
    let key_styled = style(key).with(CliTheme::HINT);
    match value_color {
        Some(color) => writeln!(out, "  {}: {}", key_styled, style(value).with(color)),
        None => writeln!(out, "  {}: {}", key_styled, style(value).bold()),
    }
}

/// Print a prompt without a trailing newline and flush
pub fn write_prompt(out: &mut impl Write, prompt: &str) -> io::Result<()> {
    write!(out, "{} ", style(prompt).with(CliTheme::ACCENT))?;
    out.flush()
}

/// Replace control characters so engine-supplied text cannot drive the terminal
pub fn terminal_safe(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { '\u{FFFD}' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_safe() {
        assert_eq!(terminal_safe("a.jpg"), "a.jpg");
        assert_eq!(terminal_safe("evil\u{1b}[2J.jpg"), "evil\u{FFFD}[2J.jpg");
        assert_eq!(terminal_safe("line\nbreak"), "line\u{FFFD}break");
    }

    #[test]
    fn test_key_value_contains_text() {
        let mut buf = Vec::new();
        write_key_value(&mut buf, "Source", "/photos", None).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Source"));
        assert!(text.contains("/photos"));
    }
}
