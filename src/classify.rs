//! File classification by naming convention.
//!
//! Definitions files are JS/TS modules named `*.messages.{js,jsx,ts,tsx}` (or the bare
//! `*.messages` import path). Translations files are `*.messages.json` / `*.messages.jsona`,
//! one locale per file.

use std::path::Path;
use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};
use unic_langid::LanguageIdentifier;

/// Suffixes identifying a definitions file.
const DEFINITIONS_SUFFIXES: &[&str] =
    &[".messages", ".messages.js", ".messages.jsx", ".messages.ts", ".messages.tsx"];

/// Suffixes identifying a translations file.
const TRANSLATIONS_SUFFIXES: &[&str] = &[".messages.json", ".messages.jsona"];

/// Kind of a message source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceFileKind {
    Definitions,
    Translations,
}

impl std::fmt::Display for SourceFileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Definitions => f.write_str("definitions"),
            Self::Translations => f.write_str("translations"),
        }
    }
}

/// Returns the file name part of a path, accepting both `/` and `\` separators.
fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Returns true if the given path is considered a message definitions file.
#[must_use]
pub fn is_definitions_file(path: &str) -> bool {
    let name = file_name(path);
    DEFINITIONS_SUFFIXES.iter().any(|suffix| name.len() > suffix.len() && name.ends_with(suffix))
}

/// Returns true if the given path is considered a message translations file.
#[must_use]
pub fn is_translations_file(path: &str) -> bool {
    let name = file_name(path);
    TRANSLATIONS_SUFFIXES.iter().any(|suffix| name.len() > suffix.len() && name.ends_with(suffix))
}

/// Classifies a path as exactly one kind, or neither.
#[must_use]
pub fn classify(path: &str) -> Option<SourceFileKind> {
    if is_definitions_file(path) {
        Some(SourceFileKind::Definitions)
    } else if is_translations_file(path) {
        Some(SourceFileKind::Translations)
    } else {
        None
    }
}

/// Parses a locale code, accepting `-` or `_` separators and any casing.
fn parse_locale(code: &str) -> Option<LanguageIdentifier> {
    let langid = LanguageIdentifier::from_str(code).ok()?;
    // Bare 5-8 letter language subtags are legal but in practice they are ordinary words
    // like `messages` or `strings`.
    let language_len = langid.language.as_str().len();
    (2..=3).contains(&language_len).then_some(langid)
}

/// Canonicalizes a locale code (`en_us` -> `en-US`).
///
/// Codes that are not recognizable locales are returned trimmed but otherwise untouched.
#[must_use]
pub fn normalize_locale(code: &str) -> String {
    let code = code.trim();
    parse_locale(code).map_or_else(|| code.to_string(), |langid| langid.to_string())
}

/// Detects the locale of a translations file from its path.
///
/// The file name stem (`fr.messages.json` -> `fr`) wins; otherwise the closest parent
/// directory that is a locale code is used (`messages/pt-BR/app.messages.json` -> `pt-BR`).
///
/// # Examples
/// ```
/// use intl_message_db::classify::detect_locale_from_path;
///
/// assert_eq!(detect_locale_from_path("i18n/en_us.messages.json").as_deref(), Some("en-US"));
/// assert_eq!(detect_locale_from_path("i18n/de/Settings.messages.jsona").as_deref(), Some("de"));
/// assert_eq!(detect_locale_from_path("i18n/Settings.messages.json"), None);
/// ```
#[must_use]
pub fn detect_locale_from_path(path: &str) -> Option<String> {
    let name = file_name(path);
    let stem = TRANSLATIONS_SUFFIXES.iter().find_map(|suffix| name.strip_suffix(suffix))?;

    if let Some(langid) = parse_locale(stem) {
        return Some(langid.to_string());
    }

    Path::new(path)
        .ancestors()
        .skip(1)
        .filter_map(|ancestor| ancestor.file_name()?.to_str())
        .find_map(parse_locale)
        .map(|langid| langid.to_string())
}
