//! Internationalization (i18n) module
//!
//! Selects the locale for user-facing strings from the system locale.
//! Supports English and Chinese Simplified.
//! Note: Log messages remain in English for consistency.

use tracing::debug;

/// Locales with a translation file
pub const SUPPORTED_LOCALES: &[&str] = &["en", "zh-CN"];

/// Map a system locale tag to one of [`SUPPORTED_LOCALES`]
pub fn resolve_locale(system: Option<&str>) -> &'static str {
    match system {
        Some(tag) if tag.to_ascii_lowercase().starts_with("zh") => "zh-CN",
        _ => "en",
    }
}

/// Initialize the locale from system settings
pub fn init_locale() {
    let system = sys_locale::get_locale();
    let locale = resolve_locale(system.as_deref());
    debug!(?system, locale, "Selected locale");
    rust_i18n::set_locale(locale);
}
