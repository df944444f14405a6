use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::classify::normalize_locale;
use crate::compile::{
    CompileFormat,
    CompileOptions,
    FallbackPolicy,
};
use crate::database::{
    DEFAULT_SOURCE_LOCALE,
    DatabaseOptions,
    ValidationOptions,
    default_num_threads,
};

/// Name of the settings file at the project root.
pub const CONFIG_FILE_NAME: &str = ".intl-db.json";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "excludePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Lists validation errors one per line, numbered from 1.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct I18nSettings {
    /// Locale of definitions files.
    pub source_locale: String,

    /// Locales every translatable message must have.
    ///
    /// - `None`: every known locale is required (default)
    /// - `Some([...])`: only the listed locales are required
    ///
    /// Mutually exclusive with `optional_locales`.
    pub required_locales: Option<Vec<String>>,

    /// Locales whose missing translations are ignored.
    ///
    /// Mutually exclusive with `required_locales`.
    pub optional_locales: Option<Vec<String>>,

    pub exclude_patterns: Vec<String>,

    /// Whether secret messages may appear in translations files.
    pub allow_secret_translations: bool,

    pub output: OutputConfig,
    pub indexing: IndexingConfig,
}

/// Where and how compiled artifacts are written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputConfig {
    /// Output directory, relative to the project root. Nothing is written when unset.
    pub dir: Option<String>,
    pub format: CompileFormat,
    pub bundle_secrets: bool,
    pub fallback: FallbackPolicy,
    /// Emit a `.d.ts` next to each definitions file.
    pub generate_types: bool,
    pub allow_nullability: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: CompileFormat::Json,
            bundle_secrets: false,
            fallback: FallbackPolicy::SourceLocale,
            generate_types: true,
            allow_nullability: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingConfig {
    /// Parallel thread count for indexing.
    /// Default: 80% of CPU cores (minimum 1).
    pub num_threads: Option<usize>,
}

impl I18nSettings {
    /// # Errors
    /// - Source locale is empty
    /// - Invalid glob pattern
    /// - Both locale lists are set
    /// - Thread count is zero
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.source_locale.trim().is_empty() {
            errors.push(ValidationError::new(
                "sourceLocale",
                "The source locale cannot be empty. Example: \"en-US\"",
            ));
        }

        for (field, locales) in [
            ("requiredLocales", self.required_locales.as_deref()),
            ("optionalLocales", self.optional_locales.as_deref()),
        ] {
            for (index, locale) in locales.unwrap_or_default().iter().enumerate() {
                if locale.trim().is_empty() {
                    errors.push(ValidationError::new(
                        format!("{field}[{index}]"),
                        "The locale cannot be empty",
                    ));
                }
            }
        }

        for (index, pattern) in self.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if self.required_locales.is_some() && self.optional_locales.is_some() {
            errors.push(ValidationError::new(
                "requiredLocales/optionalLocales",
                "Cannot specify both 'requiredLocales' and 'optionalLocales'. Please use only one",
            ));
        }

        if self.indexing.num_threads == Some(0) {
            errors.push(ValidationError::new(
                "indexing.numThreads",
                "The thread count must be at least 1, or removed to use the default",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Database settings derived from these settings.
    #[must_use]
    pub fn to_database_options(&self) -> DatabaseOptions {
        let normalize = |locales: &[String]| -> Vec<String> {
            locales.iter().map(|locale| normalize_locale(locale)).collect()
        };
        DatabaseOptions {
            source_locale: normalize_locale(&self.source_locale),
            validation: ValidationOptions {
                required_locales: self.required_locales.as_deref().map(normalize),
                optional_locales: self.optional_locales.as_deref().map(normalize).unwrap_or_default(),
                allow_secret_translations: self.allow_secret_translations,
            },
            num_threads: self.indexing.num_threads.unwrap_or_else(default_num_threads),
        }
    }

    #[must_use]
    pub const fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            format: self.output.format,
            bundle_secrets: self.output.bundle_secrets,
            fallback: self.output.fallback,
        }
    }
}

impl Default for I18nSettings {
    fn default() -> Self {
        Self {
            source_locale: DEFAULT_SOURCE_LOCALE.to_string(),
            required_locales: None,
            optional_locales: None,
            exclude_patterns: vec!["node_modules/**".to_string()],
            allow_secret_translations: false,
            output: OutputConfig::default(),
            indexing: IndexingConfig::default(),
        }
    }
}
