//! Whole-database consistency checks.

use serde::{
    Deserialize,
    Serialize,
};

use super::state::DatabaseState;
use crate::diagnostic::{
    Diagnostic,
    DiagnosticCode,
    DiagnosticSeverity,
    sort_diagnostics,
};
use crate::messages::{
    Message,
    MessageDefinition,
    MessageTranslation,
    TranslationOrigin,
};

/// Settings for [`super::MessagesDatabase::validate_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationOptions {
    /// Locales every translatable message must have. `None` means every known locale.
    pub required_locales: Option<Vec<String>>,
    /// Known locales whose missing translations are not reported.
    pub optional_locales: Vec<String>,
    /// Whether secret messages may appear in translations files.
    pub allow_secret_translations: bool,
}

impl ValidationOptions {
    /// Resolves the locales every translatable message needs.
    fn required_locales<'a>(&'a self, state: &'a DatabaseState) -> Vec<&'a str> {
        self.required_locales.as_ref().map_or_else(
            || {
                state
                    .known_locales
                    .iter()
                    .filter(|locale| !self.optional_locales.contains(*locale))
                    .map(String::as_str)
                    .collect()
            },
            |locales| locales.iter().map(String::as_str).collect(),
        )
    }
}

/// Runs every rule against the state. Never mutates it.
pub(crate) fn validate_state(state: &DatabaseState, options: &ValidationOptions) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> =
        state.sources.values().flat_map(|source| source.diagnostics.iter().cloned()).collect();

    let required_locales = options.required_locales(state);
    for message in state.messages.values() {
        check_message(message, &required_locales, options, &mut diagnostics);
    }

    sort_diagnostics(&mut diagnostics);
    diagnostics
}

/// Translations of `message` that come from translations files.
fn file_translations(message: &Message) -> impl Iterator<Item = (&str, &MessageTranslation)> {
    message
        .translations()
        .iter()
        .filter(|(_, translation)| translation.origin == TranslationOrigin::Translations)
        .map(|(locale, translation)| (locale.as_str(), translation))
}

/// Builds a diagnostic about a translation entry.
fn translation_diagnostic(
    message: &Message,
    locale: &str,
    translation: &MessageTranslation,
    code: DiagnosticCode,
    severity: DiagnosticSeverity,
    description: String,
) -> Diagnostic {
    Diagnostic::new(code, severity, &translation.file, translation.value.position(), description)
        .with_key(message.key())
        .with_locale(locale)
}

/// Applies every per-message rule.
fn check_message(
    message: &Message,
    required_locales: &[&str],
    options: &ValidationOptions,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(active) = message.active_definition() else {
        for (locale, translation) in file_translations(message) {
            diagnostics.push(
                translation_diagnostic(
                    message,
                    locale,
                    translation,
                    DiagnosticCode::OrphanedTranslation,
                    DiagnosticSeverity::Warning,
                    format!("`{}` is translated but no longer defined", message.key()),
                )
                .with_help("Remove the translation"),
            );
        }
        return;
    };

    check_duplicates(message, active, diagnostics);

    let meta = &active.meta;
    for (locale, translation) in file_translations(message) {
        if !meta.translate {
            diagnostics.push(translation_diagnostic(
                message,
                locale,
                translation,
                DiagnosticCode::UnexpectedTranslation,
                DiagnosticSeverity::Warning,
                format!("`{}` is marked `translate: false` but has a translation", message.key()),
            ));
        }
        if meta.secret && !options.allow_secret_translations {
            diagnostics.push(
                translation_diagnostic(
                    message,
                    locale,
                    translation,
                    DiagnosticCode::SecretTranslated,
                    DiagnosticSeverity::Error,
                    format!("Secret message `{}` must not be sent for translation", message.key()),
                )
                .with_help("Remove the translation or set `allowSecretTranslations`"),
            );
        }
        check_variables(message, active, locale, translation, diagnostics);
    }

    if meta.translate && (!meta.secret || options.allow_secret_translations) {
        for locale in required_locales {
            if *locale == active.locale || message.translation(locale).is_some() {
                continue;
            }
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::MissingTranslation,
                    DiagnosticSeverity::Warning,
                    &active.file,
                    active.position,
                    format!("Missing {locale} translation for `{}`", message.key()),
                )
                .with_key(message.key())
                .with_locale(*locale),
            );
        }
    }
}

/// Reports every definition that is shadowed by the active one.
fn check_duplicates(message: &Message, active: &MessageDefinition, diagnostics: &mut Vec<Diagnostic>) {
    if message.definition_count() < 2 {
        return;
    }
    for definition in message.definitions().filter(|definition| definition.file != active.file) {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::DuplicateDefinition,
                DiagnosticSeverity::Warning,
                &definition.file,
                definition.position,
                format!("`{}` is also defined in {}, which takes precedence", message.key(), active.file),
            )
            .with_key(message.key()),
        );
    }
}

/// Compares the variables of a translation against the source body.
fn check_variables(
    message: &Message,
    active: &MessageDefinition,
    locale: &str,
    translation: &MessageTranslation,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let source = &active.value.variables;
    let translated = &translation.value.variables;

    for name in translated.names().filter(|name| !source.contains(name)) {
        diagnostics.push(
            translation_diagnostic(
                message,
                locale,
                translation,
                DiagnosticCode::VariableMismatch,
                DiagnosticSeverity::Error,
                format!("Translation uses `{name}`, which the source message does not define"),
            )
            .with_help(format!("Source message: {}", active.value.raw)),
        );
    }
    for name in source.names().filter(|name| !translated.contains(name)) {
        diagnostics.push(translation_diagnostic(
            message,
            locale,
            translation,
            DiagnosticCode::VariableMismatch,
            DiagnosticSeverity::Warning,
            format!("Translation does not use `{name}` from the source message"),
        ));
    }
}
