use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{
    Deserialize,
    Serialize,
};

use super::value::MessageValue;
use crate::hash::HashedKey;
use crate::types::SourcePosition;

/// Default value of [`MessageMeta::translations_path`].
pub const DEFAULT_TRANSLATIONS_PATH: &str = "messages";

/// Metadata controlling how a message is translated and bundled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageMeta {
    /// Secret messages are left out of compiled output unless explicitly bundled.
    pub secret: bool,
    /// Whether the message should be sent for translation at all.
    pub translate: bool,
    /// Directory, relative to the definitions file, holding its translations.
    pub translations_path: String,
}

impl Default for MessageMeta {
    fn default() -> Self {
        Self { secret: false, translate: true, translations_path: DEFAULT_TRANSLATIONS_PATH.into() }
    }
}

/// Metadata declared by a whole definitions file. Messages inherit it.
pub type SourceFileMeta = MessageMeta;

/// One declaration of a message in a definitions file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDefinition {
    pub file: String,
    /// Where the key is declared.
    pub position: SourcePosition,
    /// Source locale of the declaring file.
    pub locale: String,
    pub value: MessageValue,
    pub meta: MessageMeta,
    pub description: Option<String>,
}

/// Where a translation entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TranslationOrigin {
    /// The source-locale body of the active definition.
    Definition,
    /// A translations file.
    Translations,
}

/// The value of a message in one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageTranslation {
    pub value: MessageValue,
    pub file: String,
    pub origin: TranslationOrigin,
}

/// A message and its values across every locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    key: String,
    hashed_key: HashedKey,
    /// Definitions keyed by file, in ingestion order. The last one is active.
    definitions: IndexMap<String, MessageDefinition>,
    translations: BTreeMap<String, MessageTranslation>,
}

impl Message {
    #[must_use]
    pub fn new(key: impl Into<String>, hashed_key: HashedKey) -> Self {
        Self {
            key: key.into(),
            hashed_key,
            definitions: IndexMap::new(),
            translations: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn hashed_key(&self) -> &HashedKey {
        &self.hashed_key
    }

    /// The definition currently supplying the source body.
    #[must_use]
    pub fn active_definition(&self) -> Option<&MessageDefinition> {
        self.definitions.last().map(|(_, definition)| definition)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &MessageDefinition> {
        self.definitions.values()
    }

    #[must_use]
    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_defined_in(&self, file: &str) -> bool {
        self.definitions.contains_key(file)
    }

    #[must_use]
    pub fn source_locale(&self) -> Option<&str> {
        self.active_definition().map(|definition| definition.locale.as_str())
    }

    /// Meta of the active definition, or the defaults for undefined messages.
    #[must_use]
    pub fn meta(&self) -> MessageMeta {
        self.active_definition().map(|definition| definition.meta.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.active_definition()?.description.as_deref()
    }

    #[must_use]
    pub fn source_value(&self) -> Option<&MessageValue> {
        self.active_definition().map(|definition| &definition.value)
    }

    #[must_use]
    pub const fn translations(&self) -> &BTreeMap<String, MessageTranslation> {
        &self.translations
    }

    #[must_use]
    pub fn translation(&self, locale: &str) -> Option<&MessageTranslation> {
        self.translations.get(locale)
    }

    /// True when no definitions file declares this message.
    #[must_use]
    pub fn is_orphaned(&self) -> bool {
        self.definitions.is_empty()
    }

    /// True when nothing references this message anymore and it can be pruned.
    #[must_use]
    pub fn is_unreferenced(&self) -> bool {
        self.definitions.is_empty() && self.translations.is_empty()
    }

    /// Records a definition from `definition.file`, making it the active one.
    pub(crate) fn set_definition(&mut self, definition: MessageDefinition) {
        self.definitions.shift_remove(&definition.file);
        self.definitions.insert(definition.file.clone(), definition);
        self.sync_source_translation();
    }

    /// Drops the definition from `file`. The previous definition, if any, becomes active.
    pub(crate) fn remove_definition(&mut self, file: &str) -> bool {
        let removed = self.definitions.shift_remove(file).is_some();
        if removed {
            self.sync_source_translation();
        }
        removed
    }

    /// Sets the translation for `locale` from a translations file.
    ///
    /// The source-locale body supplied by the active definition is never overwritten.
    pub(crate) fn set_translation(&mut self, locale: &str, value: MessageValue, file: &str) -> bool {
        if self
            .translations
            .get(locale)
            .is_some_and(|existing| existing.origin == TranslationOrigin::Definition)
        {
            return false;
        }
        self.translations.insert(
            locale.to_string(),
            MessageTranslation {
                value,
                file: file.to_string(),
                origin: TranslationOrigin::Translations,
            },
        );
        true
    }

    /// Drops every translation supplied by the translations file `file`.
    pub(crate) fn remove_translations_from(&mut self, file: &str) {
        self.translations.retain(|_, translation| {
            translation.origin != TranslationOrigin::Translations || translation.file != file
        });
    }

    /// Makes the source-locale translation mirror the active definition.
    fn sync_source_translation(&mut self) {
        self.translations.retain(|_, translation| translation.origin != TranslationOrigin::Definition);
        let Some(definition) = self.definitions.last().map(|(_, definition)| definition) else {
            return;
        };
        self.translations.insert(
            definition.locale.clone(),
            MessageTranslation {
                value: definition.value.clone(),
                file: definition.file.clone(),
                origin: TranslationOrigin::Definition,
            },
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;

    use super::*;
    use crate::hash::hash_message_key;

    fn definition(file: &str, body: &str) -> MessageDefinition {
        MessageDefinition {
            file: file.to_string(),
            position: SourcePosition::default(),
            locale: "en-US".to_string(),
            value: MessageValue::from_raw(body).unwrap(),
            meta: MessageMeta::default(),
            description: None,
        }
    }

    fn message() -> Message {
        Message::new("GREETING", hash_message_key("GREETING"))
    }

    #[googletest::test]
    fn meta_defaults() {
        let meta = MessageMeta::default();

        expect_that!(meta.secret, eq(false));
        expect_that!(meta.translate, eq(true));
        expect_that!(meta.translations_path.as_str(), eq("messages"));
    }

    #[googletest::test]
    fn meta_deserializes_partial_objects() {
        let meta: MessageMeta = serde_json::from_str(r#"{"secret": true}"#).unwrap();

        expect_that!(meta.secret, eq(true));
        expect_that!(meta.translate, eq(true));
    }

    #[googletest::test]
    fn last_definition_is_active_and_mirrors_source_locale() {
        let mut message = message();
        message.set_definition(definition("a.messages.js", "Hello"));
        message.set_definition(definition("b.messages.js", "Hi"));

        expect_that!(message.source_value().map(|v| v.raw.as_str()), some(eq("Hi")));
        expect_that!(
            message.translation("en-US").map(|t| t.file.as_str()),
            some(eq("b.messages.js"))
        );
        expect_that!(message.definition_count(), eq(2));
    }

    #[googletest::test]
    fn removing_active_definition_reactivates_previous() {
        let mut message = message();
        message.set_definition(definition("a.messages.js", "Hello"));
        message.set_definition(definition("b.messages.js", "Hi"));

        expect_that!(message.remove_definition("b.messages.js"), eq(true));

        expect_that!(message.translation("en-US").map(|t| t.value.raw.as_str()), some(eq("Hello")));
        expect_that!(message.remove_definition("b.messages.js"), eq(false));
    }

    #[googletest::test]
    fn translation_files_never_override_definition_body() {
        let mut message = message();
        message.set_definition(definition("a.messages.js", "Hello"));

        let written =
            message.set_translation("en-US", MessageValue::from_raw("Howdy").unwrap(), "en-US.messages.json");

        expect_that!(written, eq(false));
        expect_that!(message.translation("en-US").map(|t| t.value.raw.as_str()), some(eq("Hello")));
    }

    #[googletest::test]
    fn unreferenced_after_everything_is_removed() {
        let mut message = message();
        message.set_definition(definition("a.messages.js", "Hello"));
        message.set_translation("fr", MessageValue::from_raw("Bonjour").unwrap(), "fr.messages.json");

        message.remove_definition("a.messages.js");
        expect_that!(message.is_orphaned(), eq(true));
        expect_that!(message.is_unreferenced(), eq(false));

        message.remove_translations_from("fr.messages.json");
        expect_that!(message.is_unreferenced(), eq(true));
    }
}
