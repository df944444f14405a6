//! Mutable state behind the database lock.

use std::collections::BTreeSet;

use indexmap::{
    IndexMap,
    IndexSet,
};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::classify::SourceFileKind;
use crate::diagnostic::{
    Diagnostic,
    DiagnosticCode,
    DiagnosticSeverity,
};
use crate::error::{
    DatabaseError,
    DatabaseResult,
};
use crate::hash::{
    HashedKey,
    KeyHasher,
};
use crate::input::{
    ParsedDefinitions,
    ParsedTranslations,
};
use crate::messages::{
    Message,
    MessageDefinition,
    SourceFileMeta,
};

/// A file that has contributed messages to the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    pub kind: SourceFileKind,
    pub file: String,
    /// Hashed keys contributed by the file, in declaration order.
    pub message_keys: IndexSet<HashedKey>,
    pub meta: SourceFileMeta,
    /// Source locale for definitions, target locale for translations.
    pub locale: String,
    /// Diagnostics recorded by the latest ingestion of the file.
    pub diagnostics: Vec<Diagnostic>,
}

/// Summary of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    pub file: String,
    pub kind: SourceFileKind,
    pub locale: String,
    /// Number of messages the file now contributes.
    pub message_count: usize,
    /// Everything reported while ingesting, including cross-file conflicts.
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default)]
pub(crate) struct DatabaseState {
    /// Every message by hashed key.
    pub(crate) messages: FxHashMap<HashedKey, Message>,
    /// Ingested files by path, in first-ingestion order.
    pub(crate) sources: IndexMap<String, SourceFile>,
    /// Every locale ever observed.
    pub(crate) known_locales: BTreeSet<String>,
}

impl DatabaseState {
    /// Replaces the contribution of a definitions file.
    ///
    /// Hash collisions are checked before anything is touched, so a rejected file leaves the
    /// state as it was.
    pub(crate) fn commit_definitions(
        &mut self,
        path: &str,
        locale: &str,
        parsed: ParsedDefinitions,
        hasher: KeyHasher,
    ) -> DatabaseResult<IngestOutcome> {
        let mut claimed: FxHashMap<HashedKey, &str> = FxHashMap::default();
        let mut hashed_keys = Vec::with_capacity(parsed.messages.len());
        for raw in &parsed.messages {
            let hashed_key = hasher(&raw.name);
            let existing_key = self
                .messages
                .get(&hashed_key)
                .map(Message::key)
                .or_else(|| claimed.get(&hashed_key).copied());
            if let Some(existing_key) = existing_key
                && existing_key != raw.name
            {
                return Err(DatabaseError::KeyHashCollision {
                    file: path.to_string(),
                    key: raw.name.clone(),
                    existing_key: existing_key.to_string(),
                    hashed_key,
                });
            }
            claimed.insert(hashed_key.clone(), &raw.name);
            hashed_keys.push(hashed_key);
        }

        let previous_keys = self.detach(path);
        let stored_diagnostics = parsed.diagnostics;
        let mut diagnostics = stored_diagnostics.clone();
        let mut message_keys = IndexSet::with_capacity(hashed_keys.len());

        for (raw, hashed_key) in parsed.messages.into_iter().zip(hashed_keys) {
            let message = self
                .messages
                .entry(hashed_key.clone())
                .or_insert_with(|| Message::new(raw.name.clone(), hashed_key.clone()));

            if let Some(active) = message.active_definition() {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DuplicateDefinition,
                        DiagnosticSeverity::Warning,
                        path,
                        raw.position,
                        format!("`{}` is also defined in {}", raw.name, active.file),
                    )
                    .with_key(&raw.name)
                    .with_help("This definition takes precedence until it is removed"),
                );
            }

            message.set_definition(MessageDefinition {
                file: path.to_string(),
                position: raw.position,
                locale: locale.to_string(),
                value: raw.value,
                meta: raw.meta,
                description: raw.description,
            });
            message_keys.insert(hashed_key);
        }

        let message_count = message_keys.len();
        self.known_locales.insert(locale.to_string());
        self.sources.insert(
            path.to_string(),
            SourceFile {
                kind: SourceFileKind::Definitions,
                file: path.to_string(),
                message_keys,
                meta: parsed.meta,
                locale: locale.to_string(),
                diagnostics: stored_diagnostics,
            },
        );
        self.prune(&previous_keys);

        tracing::debug!(file = %path, locale, messages = message_count, "Committed definitions");
        Ok(IngestOutcome {
            file: path.to_string(),
            kind: SourceFileKind::Definitions,
            locale: locale.to_string(),
            message_count,
            diagnostics,
        })
    }

    /// Replaces the contribution of a translations file.
    ///
    /// Entries whose key no definitions file declares are reported and skipped.
    pub(crate) fn commit_translations(
        &mut self,
        path: &str,
        locale: &str,
        parsed: ParsedTranslations,
        hasher: KeyHasher,
    ) -> IngestOutcome {
        let previous_keys = self.detach(path);
        let mut diagnostics = parsed.diagnostics;
        let mut message_keys = IndexSet::with_capacity(parsed.messages.len());

        for raw in parsed.messages {
            let hashed_key = hasher(&raw.name);
            let message = self
                .messages
                .get_mut(&hashed_key)
                .filter(|message| message.key() == raw.name && !message.is_orphaned());
            let Some(message) = message else {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::UnknownKey,
                        DiagnosticSeverity::Warning,
                        path,
                        raw.position,
                        format!("`{}` is not defined by any definitions file", raw.name),
                    )
                    .with_key(&raw.name)
                    .with_locale(locale)
                    .with_help("Remove the translation or define the message"),
                );
                continue;
            };

            if !message.set_translation(locale, raw.value, path) {
                tracing::debug!(
                    file = %path,
                    key = %raw.name,
                    "Ignoring translation for the source locale of its definition"
                );
            }
            message_keys.insert(hashed_key);
        }

        let message_count = message_keys.len();
        self.known_locales.insert(locale.to_string());
        self.sources.insert(
            path.to_string(),
            SourceFile {
                kind: SourceFileKind::Translations,
                file: path.to_string(),
                message_keys,
                meta: SourceFileMeta::default(),
                locale: locale.to_string(),
                diagnostics: diagnostics.clone(),
            },
        );
        self.prune(&previous_keys);

        tracing::debug!(file = %path, locale, messages = message_count, "Committed translations");
        IngestOutcome {
            file: path.to_string(),
            kind: SourceFileKind::Translations,
            locale: locale.to_string(),
            message_count,
            diagnostics,
        }
    }

    /// Removes a file and everything it contributed. Returns false if it was never ingested.
    pub(crate) fn retire(&mut self, path: &str) -> bool {
        let previous_keys = self.detach(path);
        let removed = self.sources.shift_remove(path).is_some();
        self.prune(&previous_keys);
        if removed {
            tracing::debug!(file = %path, "Retired source file");
        }
        removed
    }

    /// Detaches a file's definitions and translations from its messages, keeping its
    /// `SourceFile` entry in place. Returns the keys it used to contribute.
    fn detach(&mut self, path: &str) -> IndexSet<HashedKey> {
        let Some(source) = self.sources.get(path) else {
            return IndexSet::new();
        };
        let keys = source.message_keys.clone();
        for key in &keys {
            if let Some(message) = self.messages.get_mut(key) {
                message.remove_definition(path);
                message.remove_translations_from(path);
            }
        }
        keys
    }

    /// Drops messages among `keys` that nothing references anymore.
    fn prune(&mut self, keys: &IndexSet<HashedKey>) {
        for key in keys {
            if self.messages.get(key).is_some_and(Message::is_unreferenced) {
                self.messages.remove(key);
            }
        }
    }

    /// Messages contributed by `path`, in file order.
    pub(crate) fn file_messages<'a>(
        &'a self,
        source: &'a SourceFile,
    ) -> impl Iterator<Item = &'a Message> + 'a {
        source.message_keys.iter().filter_map(|key| self.messages.get(key))
    }
}
