//! Structured diagnostics reported by ingestion and validation.

use serde::{
    Deserialize,
    Serialize,
};

use crate::types::SourcePosition;

/// Severity of a diagnostic. The caller decides which severities block a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
            Self::Info => f.write_str("info"),
        }
    }
}

/// Machine-readable category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    /// A single message could not be ingested; its siblings were.
    InvalidMessage,
    /// A translations file referenced a key that no definitions file declares.
    UnknownKey,
    /// The same original key is declared more than once.
    DuplicateDefinition,
    /// A translatable message has no translation for a required locale.
    MissingTranslation,
    /// A translation's placeholders differ from the source message's.
    VariableMismatch,
    /// A secret message appears in a translations file.
    SecretTranslated,
    /// A message marked `translate: false` has translations anyway.
    UnexpectedTranslation,
    /// A translation remains for a message that is no longer defined.
    OrphanedTranslation,
}

impl DiagnosticCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidMessage => "invalid-message",
            Self::UnknownKey => "unknown-key",
            Self::DuplicateDefinition => "duplicate-definition",
            Self::MissingTranslation => "missing-translation",
            Self::VariableMismatch => "variable-mismatch",
            Self::SecretTranslated => "secret-translated",
            Self::UnexpectedTranslation => "unexpected-translation",
            Self::OrphanedTranslation => "orphaned-translation",
        }
    }
}

/// A single diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Original key of the message concerned, if any.
    pub key: Option<String>,
    pub file: String,
    pub line: u32,
    pub col: u32,
    pub locale: Option<String>,
    pub severity: DiagnosticSeverity,
    pub code: DiagnosticCode,
    pub description: String,
    pub help: Option<String>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(
        code: DiagnosticCode,
        severity: DiagnosticSeverity,
        file: impl Into<String>,
        position: SourcePosition,
        description: impl Into<String>,
    ) -> Self {
        Self {
            key: None,
            file: file.into(),
            line: position.line,
            col: position.col,
            locale: None,
            severity,
            code,
            description: description.into(),
            help: None,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub const fn position(&self) -> SourcePosition {
        SourcePosition { line: self.line, col: self.col }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 表示上は 1 始まりの行・列にする
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.file,
            self.line + 1,
            self.col + 1,
            self.severity,
            self.code.as_str(),
            self.description
        )?;
        if let Some(help) = &self.help {
            write!(f, " (help: {help})")?;
        }
        Ok(())
    }
}

/// Sorts diagnostics by file, then position, then code, so output is stable.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then_with(|| a.position().cmp(&b.position()))
            .then_with(|| a.code.as_str().cmp(b.code.as_str()))
            .then_with(|| a.locale.cmp(&b.locale))
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    #[googletest::test]
    fn display_uses_one_based_positions() {
        let diagnostic = Diagnostic::new(
            DiagnosticCode::UnknownKey,
            DiagnosticSeverity::Warning,
            "i18n/fr.messages.json",
            SourcePosition::new(2, 4),
            "Unknown key `MISSING`",
        )
        .with_help("Define the key first");

        expect_that!(
            diagnostic.to_string(),
            eq("i18n/fr.messages.json:3:5: warning [unknown-key] Unknown key `MISSING` (help: Define the key first)")
        );
    }

    #[googletest::test]
    fn serializes_with_camel_case_fields() {
        let diagnostic = Diagnostic::new(
            DiagnosticCode::MissingTranslation,
            DiagnosticSeverity::Warning,
            "a.messages.js",
            SourcePosition::new(0, 0),
            "missing",
        )
        .with_key("GREETING")
        .with_locale("fr");

        let json = serde_json::to_value(&diagnostic).unwrap();

        expect_that!(json["code"].as_str(), some(eq("missing-translation")));
        expect_that!(json["severity"].as_str(), some(eq("warning")));
        expect_that!(json["locale"].as_str(), some(eq("fr")));
        expect_that!(json["key"].as_str(), some(eq("GREETING")));
    }

    #[googletest::test]
    fn sort_orders_by_file_then_position() {
        let make = |file: &str, line: u32| {
            Diagnostic::new(
                DiagnosticCode::InvalidMessage,
                DiagnosticSeverity::Error,
                file,
                SourcePosition::new(line, 0),
                "x",
            )
        };
        let mut diagnostics = vec![make("b.js", 0), make("a.js", 3), make("a.js", 1)];

        sort_diagnostics(&mut diagnostics);

        let order: Vec<_> = diagnostics.iter().map(|d| (d.file.as_str(), d.line)).collect();
        assert_eq!(order, vec![("a.js", 1), ("a.js", 3), ("b.js", 0)]);
    }
}
