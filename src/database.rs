//! The message database.
//!
//! [`MessagesDatabase`] owns every message, source file and locale. All methods take `&self`:
//! state lives behind a single `RwLock`, and each path has its own mutex held for the whole
//! parse and commit of that path, so events for one path apply in order while different paths
//! parse concurrently.

mod state;
pub mod validate;

use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{
    Mutex,
    RwLock,
    RwLockReadGuard,
};
use rustc_hash::FxHashMap;
use serde::Serialize;

pub use self::state::{
    IngestOutcome,
    SourceFile,
};
use self::state::DatabaseState;
pub use self::validate::ValidationOptions;
use crate::classify::{
    detect_locale_from_path,
    normalize_locale,
};
use crate::diagnostic::Diagnostic;
use crate::error::{
    DatabaseError,
    DatabaseResult,
    NotFoundKind,
};
use crate::hash::{
    HashedKey,
    KeyHasher,
    hash_message_key,
};
use crate::input::{
    parse_definitions,
    parse_translations,
};
use crate::messages::{
    Message,
    MessageMeta,
};

/// Locale assumed for definitions files when none is given.
pub const DEFAULT_SOURCE_LOCALE: &str = "en-US";

/// Default worker count for batch ingestion: 80% of the CPU cores, at least one.
#[must_use]
pub fn default_num_threads() -> usize {
    (num_cpus::get() * 4 / 5).max(1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseOptions {
    /// Locale of definitions files ingested without an explicit locale.
    pub source_locale: String,
    /// Settings used by [`MessagesDatabase::validate`].
    pub validation: ValidationOptions,
    /// Worker count for [`MessagesDatabase::ingest_translations_batch`].
    pub num_threads: usize,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            source_locale: DEFAULT_SOURCE_LOCALE.to_string(),
            validation: ValidationOptions::default(),
            num_threads: default_num_threads(),
        }
    }
}

/// One translations file of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationsInput {
    pub path: String,
    /// Detected from the path when `None`.
    pub locale: Option<String>,
    pub content: String,
}

/// Values of one message of a file, as returned by
/// [`MessagesDatabase::get_message_values_for_file`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMessageValues {
    pub key: String,
    pub hashed_key: HashedKey,
    pub meta: MessageMeta,
    pub source_locale: Option<String>,
    pub description: Option<String>,
    /// Raw body per locale.
    pub values: BTreeMap<String, String>,
}

#[derive(Debug)]
pub struct MessagesDatabase {
    state: RwLock<DatabaseState>,
    /// Per-path mutexes serializing the ingestion of each path.
    path_locks: Mutex<FxHashMap<String, Arc<Mutex<()>>>>,
    options: DatabaseOptions,
    hasher: KeyHasher,
}

impl Default for MessagesDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MessagesDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(DatabaseOptions::default())
    }

    #[must_use]
    pub fn with_options(options: DatabaseOptions) -> Self {
        Self {
            state: RwLock::new(DatabaseState::default()),
            path_locks: Mutex::new(FxHashMap::default()),
            options,
            hasher: hash_message_key,
        }
    }

    /// Replaces the key hasher. Only useful before anything is ingested.
    #[must_use]
    pub fn with_hasher(mut self, hasher: KeyHasher) -> Self {
        self.hasher = hasher;
        self
    }

    #[must_use]
    pub const fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    /// Hashes a key the way this database does.
    #[must_use]
    pub fn hash_key(&self, key: &str) -> HashedKey {
        (self.hasher)(key)
    }

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, DatabaseState> {
        self.state.read()
    }

    fn path_lock(&self, path: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.path_locks.lock().entry(path.to_string()).or_default())
    }

    /// Parses a definitions file and replaces everything it previously contributed.
    ///
    /// `locale` defaults to the configured source locale.
    ///
    /// # Errors
    /// `StructuralParseFailure` if the file can't be parsed, `KeyHashCollision` if one of its
    /// keys shares a hash with a different key. The database is unchanged in both cases.
    pub fn ingest_definitions(
        &self,
        path: &str,
        content: &str,
        locale: Option<&str>,
    ) -> DatabaseResult<IngestOutcome> {
        let lock = self.path_lock(path);
        let _guard = lock.lock();

        let parsed = parse_definitions(path, content).map_err(|error| {
            tracing::warn!(file = %path, %error, "Rejected definitions file");
            DatabaseError::structural(path, error)
        })?;
        let locale =
            locale.map_or_else(|| self.options.source_locale.clone(), normalize_locale);

        self.state.write().commit_definitions(path, &locale, parsed, self.hasher).inspect_err(
            |error| tracing::warn!(file = %path, %error, "Rejected definitions file"),
        )
    }

    /// Parses a translations file and replaces everything it previously contributed.
    ///
    /// `locale` defaults to the locale detected from the path.
    ///
    /// # Errors
    /// `UnknownLocale` if no locale is given or detected, `StructuralParseFailure` if the file
    /// can't be parsed.
    pub fn ingest_translations(
        &self,
        path: &str,
        locale: Option<&str>,
        content: &str,
    ) -> DatabaseResult<IngestOutcome> {
        let locale = match locale {
            Some(locale) => normalize_locale(locale),
            None => detect_locale_from_path(path)
                .ok_or_else(|| DatabaseError::UnknownLocale { file: path.to_string() })?,
        };

        let lock = self.path_lock(path);
        let _guard = lock.lock();

        let parsed = parse_translations(path, content).map_err(|error| {
            tracing::warn!(file = %path, %error, "Rejected translations file");
            DatabaseError::structural(path, error)
        })?;

        Ok(self.state.write().commit_translations(path, &locale, parsed, self.hasher))
    }

    /// Ingests many translations files, parsing them in parallel.
    ///
    /// Each file is committed on its own; results are returned in input order.
    pub fn ingest_translations_batch(
        &self,
        files: &[TranslationsInput],
    ) -> Vec<DatabaseResult<IngestOutcome>> {
        if files.is_empty() {
            return Vec::new();
        }
        let workers = self.options.num_threads.clamp(1, files.len());
        let chunk_size = files.len().div_ceil(workers);
        tracing::debug!(files = files.len(), workers, "Ingesting translations batch");

        std::thread::scope(|scope| {
            let handles: Vec<_> = files
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|file| {
                                self.ingest_translations(
                                    &file.path,
                                    file.locale.as_deref(),
                                    &file.content,
                                )
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(results) => results,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        })
    }

    /// Removes everything a file contributed. Returns false if the path was never ingested.
    pub fn retire_source_file(&self, path: &str) -> bool {
        let lock = self.path_lock(path);
        let retired = {
            let _guard = lock.lock();
            self.state.write().retire(path)
        };
        self.release_path_lock(path, &lock);
        retired
    }

    /// Forgets the mutex of `path` once `held` is its only user outside the map.
    fn release_path_lock(&self, path: &str, held: &Arc<Mutex<()>>) {
        let mut locks = self.path_locks.lock();
        // One reference in the map, one in `held`.
        if locks.get(path).is_some_and(|lock| Arc::ptr_eq(lock, held) && Arc::strong_count(lock) == 2) {
            locks.remove(path);
        }
    }

    /// # Errors
    /// `NotFound` if the path was never ingested.
    pub fn get_source_file(&self, path: &str) -> DatabaseResult<SourceFile> {
        self.read_state()
            .sources
            .get(path)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(NotFoundKind::SourceFile(path.to_string())))
    }

    /// Paths of every ingested file, in first-ingestion order.
    #[must_use]
    pub fn get_all_source_file_paths(&self) -> Vec<String> {
        self.read_state().sources.keys().cloned().collect()
    }

    /// Hashed key to original key for every message of a file, in file order.
    ///
    /// # Errors
    /// `NotFound` if the path was never ingested.
    pub fn get_source_file_key_map(&self, path: &str) -> DatabaseResult<IndexMap<HashedKey, String>> {
        let state = self.read_state();
        let source = state
            .sources
            .get(path)
            .ok_or_else(|| DatabaseError::NotFound(NotFoundKind::SourceFile(path.to_string())))?;
        Ok(state
            .file_messages(source)
            .map(|message| (message.hashed_key().clone(), message.key().to_string()))
            .collect())
    }

    /// Every locale ever observed, sorted.
    #[must_use]
    pub fn get_known_locales(&self) -> Vec<String> {
        self.read_state().known_locales.iter().cloned().collect()
    }

    /// Looks a message up by hashed key or by original key.
    ///
    /// # Errors
    /// `NotFound` if neither matches.
    pub fn get_message(&self, key: &str) -> DatabaseResult<Message> {
        let state = self.read_state();
        if let Some(message) = state.messages.get(key) {
            return Ok(message.clone());
        }
        state
            .messages
            .get(&self.hash_key(key))
            .filter(|message| message.key() == key)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(NotFoundKind::Message(key.to_string())))
    }

    /// Every message of a file with its raw value in each locale.
    ///
    /// # Errors
    /// `NotFound` if the path was never ingested.
    pub fn get_message_values_for_file(&self, path: &str) -> DatabaseResult<Vec<FileMessageValues>> {
        let state = self.read_state();
        let source = state
            .sources
            .get(path)
            .ok_or_else(|| DatabaseError::NotFound(NotFoundKind::SourceFile(path.to_string())))?;
        Ok(state
            .file_messages(source)
            .map(|message| FileMessageValues {
                key: message.key().to_string(),
                hashed_key: message.hashed_key().clone(),
                meta: message.meta(),
                source_locale: message.source_locale().map(str::to_string),
                description: message.description().map(str::to_string),
                values: message
                    .translations()
                    .iter()
                    .map(|(locale, translation)| (locale.clone(), translation.value.raw.clone()))
                    .collect(),
            })
            .collect())
    }

    /// Validates the whole database with the configured settings.
    #[must_use]
    pub fn validate(&self) -> Vec<Diagnostic> {
        self.validate_with(&self.options.validation)
    }

    /// Validates the whole database. Diagnostics are sorted by file and position.
    #[must_use]
    pub fn validate_with(&self, options: &ValidationOptions) -> Vec<Diagnostic> {
        validate::validate_state(&self.read_state(), options)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::diagnostic::DiagnosticCode;

    const DEFINITIONS: &str = "src/Greeting.messages.js";

    fn definitions(entries: &str) -> String {
        format!("export default defineMessages({{ {entries} }});")
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<DiagnosticCode> {
        diagnostics.iter().map(|diagnostic| diagnostic.code).collect()
    }

    fn constant_hash(_key: &str) -> HashedKey {
        HashedKey::from_raw("AAAAAA")
    }

    #[googletest::test]
    fn ingests_definitions_and_translations() {
        let db = MessagesDatabase::new();
        db.ingest_definitions(DEFINITIONS, &definitions("GREETING: 'Hello'"), None).unwrap();
        let outcome =
            db.ingest_translations("src/messages/fr.messages.json", None, r#"{"GREETING": "Bonjour"}"#)
                .unwrap();

        expect_that!(outcome.locale.as_str(), eq("fr"));
        expect_that!(outcome.message_count, eq(1));
        assert_eq!(db.get_known_locales(), vec!["en-US", "fr"]);

        let message = db.get_message("GREETING").unwrap();
        expect_that!(message.source_locale(), some(eq("en-US")));
        expect_that!(message.translation("fr").map(|t| t.value.raw.as_str()), some(eq("Bonjour")));
        expect_that!(
            db.get_message(message.hashed_key().as_str()).map(|m| m.key().to_string()).ok(),
            some(eq("GREETING"))
        );
    }

    #[googletest::test]
    fn reingestion_replaces_file_contribution() {
        let db = MessagesDatabase::new();
        db.ingest_definitions(DEFINITIONS, &definitions("A: 'a', B: 'b'"), None).unwrap();
        db.ingest_definitions(DEFINITIONS, &definitions("B: 'bee', C: 'c'"), None).unwrap();

        assert_eq!(db.get_all_source_file_paths(), vec![DEFINITIONS]);
        let key_map = db.get_source_file_key_map(DEFINITIONS).unwrap();
        let keys: Vec<_> = key_map.values().map(String::as_str).collect();
        assert_eq!(keys, vec!["B", "C"]);
        expect_that!(db.get_message("A").is_err(), eq(true));
        expect_that!(
            db.get_message("B").unwrap().source_value().map(|v| v.raw.clone()),
            some(eq("bee"))
        );
    }

    #[googletest::test]
    fn structural_failure_keeps_previous_state() {
        let db = MessagesDatabase::new();
        db.ingest_definitions(DEFINITIONS, &definitions("A: 'a'"), None).unwrap();

        let result = db.ingest_definitions(DEFINITIONS, "export default {", None);

        assert!(matches!(result, Err(DatabaseError::StructuralParseFailure { .. })));
        expect_that!(db.get_message("A").is_ok(), eq(true));
    }

    #[googletest::test]
    fn hash_collision_rejects_second_file() {
        let db = MessagesDatabase::new().with_hasher(constant_hash);
        db.ingest_definitions("a.messages.js", &definitions("FIRST: 'one'"), None).unwrap();

        let result = db.ingest_definitions("b.messages.js", &definitions("SECOND: 'two'"), None);

        assert!(matches!(
            result,
            Err(DatabaseError::KeyHashCollision { ref key, ref existing_key, .. })
                if key == "SECOND" && existing_key == "FIRST"
        ));
        expect_that!(db.get_message("FIRST").is_ok(), eq(true));
        assert_eq!(db.get_all_source_file_paths(), vec!["a.messages.js"]);
    }

    #[googletest::test]
    fn hash_collision_within_one_file_is_rejected() {
        let db = MessagesDatabase::new().with_hasher(constant_hash);

        let result = db.ingest_definitions("a.messages.js", &definitions("A: 'a', B: 'b'"), None);

        assert!(matches!(result, Err(DatabaseError::KeyHashCollision { .. })));
        expect_that!(db.get_all_source_file_paths(), is_empty());
    }

    #[googletest::test]
    fn unknown_translation_keys_are_reported_and_ignored() {
        let db = MessagesDatabase::new();
        db.ingest_definitions(DEFINITIONS, &definitions("A: 'a'"), None).unwrap();

        let outcome = db
            .ingest_translations("fr.messages.json", None, r#"{"A": "à", "MISSING": "x"}"#)
            .unwrap();

        assert_eq!(codes(&outcome.diagnostics), vec![DiagnosticCode::UnknownKey]);
        expect_that!(outcome.message_count, eq(1));
        expect_that!(db.get_message("MISSING").is_err(), eq(true));
    }

    #[googletest::test]
    fn translations_require_a_locale() {
        let db = MessagesDatabase::new();

        let result = db.ingest_translations("i18n/strings.messages.json", None, "{}");

        assert!(matches!(result, Err(DatabaseError::UnknownLocale { .. })));
        expect_that!(
            db.ingest_translations("i18n/strings.messages.json", Some("de_de"), "{}")
                .map(|outcome| outcome.locale)
                .ok(),
            some(eq("de-DE"))
        );
    }

    #[googletest::test]
    fn last_writer_wins_and_retiring_restores_previous_definition() {
        let db = MessagesDatabase::new();
        db.ingest_definitions("a.messages.js", &definitions("SHARED: 'from a'"), None).unwrap();
        let outcome =
            db.ingest_definitions("b.messages.js", &definitions("SHARED: 'from b'"), None).unwrap();

        assert_eq!(codes(&outcome.diagnostics), vec![DiagnosticCode::DuplicateDefinition]);
        expect_that!(
            db.get_message("SHARED").unwrap().source_value().map(|v| v.raw.clone()),
            some(eq("from b"))
        );

        expect_that!(db.retire_source_file("b.messages.js"), eq(true));
        expect_that!(
            db.get_message("SHARED").unwrap().source_value().map(|v| v.raw.clone()),
            some(eq("from a"))
        );
        expect_that!(db.retire_source_file("b.messages.js"), eq(false));
    }

    #[googletest::test]
    fn retiring_definitions_orphans_translations_until_they_are_retired() {
        let db = MessagesDatabase::new();
        db.ingest_definitions(DEFINITIONS, &definitions("A: 'a'"), None).unwrap();
        db.ingest_translations("fr.messages.json", None, r#"{"A": "à"}"#).unwrap();

        db.retire_source_file(DEFINITIONS);
        let diagnostics = db.validate();

        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::OrphanedTranslation]);
        expect_that!(db.get_message("A").is_ok(), eq(true));

        db.retire_source_file("fr.messages.json");
        expect_that!(db.get_message("A").is_err(), eq(true));
        assert_eq!(db.get_known_locales(), vec!["en-US", "fr"]);
    }

    #[googletest::test]
    fn batch_ingestion_reports_per_file() {
        let db = MessagesDatabase::with_options(DatabaseOptions {
            num_threads: 2,
            ..DatabaseOptions::default()
        });
        db.ingest_definitions(DEFINITIONS, &definitions("A: 'a'"), None).unwrap();
        let files: Vec<_> = ["fr", "de", "ja", "broken"]
            .into_iter()
            .map(|locale| TranslationsInput {
                path: format!("i18n/{locale}.messages.json"),
                locale: (locale == "broken").then(|| "ko".to_string()),
                content: if locale == "broken" { "[".to_string() } else { r#"{"A": "x"}"#.to_string() },
            })
            .collect();

        let results = db.ingest_translations_batch(&files);

        let ok: Vec<_> = results.iter().map(Result::is_ok).collect();
        assert_eq!(ok, vec![true, true, true, false]);
        assert_eq!(db.get_known_locales(), vec!["de", "en-US", "fr", "ja"]);
    }

    #[googletest::test]
    fn message_values_for_file() {
        let db = MessagesDatabase::new();
        db.ingest_definitions(
            DEFINITIONS,
            &definitions("A: { message: 'a', description: 'first' }, B: 'b'"),
            None,
        )
        .unwrap();
        db.ingest_translations("fr.messages.json", None, r#"{"B": "bé"}"#).unwrap();

        let values = db.get_message_values_for_file(DEFINITIONS).unwrap();

        let keys: Vec<_> = values.iter().map(|value| value.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B"]);
        expect_that!(values[0].description.as_deref(), some(eq("first")));
        expect_that!(values[1].values.get("fr").map(String::as_str), some(eq("bé")));
        expect_that!(values[1].source_locale.as_deref(), some(eq("en-US")));
    }

    #[googletest::test]
    #[rstest]
    #[case::source_file("missing.messages.js")]
    fn lookups_of_unknown_paths_fail(#[case] path: &str) {
        let db = MessagesDatabase::new();

        assert!(matches!(
            db.get_source_file(path),
            Err(DatabaseError::NotFound(NotFoundKind::SourceFile(_)))
        ));
        expect_that!(db.get_source_file_key_map(path).is_err(), eq(true));
        expect_that!(db.get_message_values_for_file(path).is_err(), eq(true));
    }

    #[googletest::test]
    fn validation_reports_consistency_problems() {
        let db = MessagesDatabase::new();
        db.ingest_definitions(
            DEFINITIONS,
            &definitions(
                "GREETING: 'Hello {name}', \
                 SECRET: { message: 'hidden', meta: { secret: true } }, \
                 INTERNAL: { message: 'internal', meta: { translate: false } }",
            ),
            None,
        )
        .unwrap();
        db.ingest_translations(
            "fr.messages.json",
            None,
            r#"{"GREETING": "Bonjour {user}", "SECRET": "caché", "INTERNAL": "interne"}"#,
        )
        .unwrap();
        db.ingest_translations("de.messages.json", None, "{}").unwrap();

        let diagnostics = db.validate();

        let mut found = codes(&diagnostics);
        found.sort_by_key(|code| code.as_str());
        assert_eq!(
            found,
            vec![
                DiagnosticCode::MissingTranslation,
                DiagnosticCode::SecretTranslated,
                DiagnosticCode::UnexpectedTranslation,
                DiagnosticCode::VariableMismatch,
                DiagnosticCode::VariableMismatch,
            ]
        );
        let missing: Vec<_> = diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.code == DiagnosticCode::MissingTranslation)
            .map(|diagnostic| (diagnostic.key.as_deref(), diagnostic.locale.as_deref()))
            .collect();
        assert_eq!(missing, vec![(Some("GREETING"), Some("de"))]);
    }

    #[googletest::test]
    fn validation_respects_locale_settings() {
        let db = MessagesDatabase::new();
        db.ingest_definitions(DEFINITIONS, &definitions("A: 'a'"), None).unwrap();
        db.ingest_translations("fr.messages.json", None, "{}").unwrap();

        let optional = ValidationOptions {
            optional_locales: vec!["fr".to_string()],
            ..ValidationOptions::default()
        };
        let required = ValidationOptions {
            required_locales: Some(vec!["ja".to_string()]),
            ..ValidationOptions::default()
        };

        expect_that!(db.validate_with(&optional), is_empty());
        let locales: Vec<_> =
            db.validate_with(&required).into_iter().filter_map(|d| d.locale).collect();
        assert_eq!(locales, vec!["ja"]);
    }

    #[googletest::test]
    fn database_is_shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MessagesDatabase>();
    }

    #[googletest::test]
    fn readers_never_see_half_applied_ingestion() {
        const FRENCH: &str = "src/messages/fr.messages.json";
        let versions = [
            (definitions("A: 'a', B: 'b', C: 'c'"), vec!["A", "B", "C"]),
            (definitions("D: 'd', E: 'e'"), vec!["D", "E"]),
        ];
        let translations = [r#"{"A": "a1", "B": "b1", "C": "c1"}"#, r#"{"A": "a2", "B": "b2", "C": "c2"}"#];
        let db = MessagesDatabase::new();
        db.ingest_definitions(DEFINITIONS, &versions[0].0, None).unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for round in 0..200 {
                    let (content, _) = &versions[round % 2];
                    db.ingest_definitions(DEFINITIONS, content, None).unwrap();
                }
                db.ingest_definitions(DEFINITIONS, &versions[0].0, None).unwrap();
            });
            scope.spawn(|| {
                for round in 0..200 {
                    db.ingest_translations(FRENCH, None, translations[round % 2]).unwrap();
                }
            });
            for _ in 0..2 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        let keys: Vec<String> =
                            db.get_source_file_key_map(DEFINITIONS).unwrap().into_values().collect();
                        assert!(
                            versions.iter().any(|(_, expected)| keys == *expected),
                            "mixed key set {keys:?}"
                        );

                        let values = db.get_message_values_for_file(DEFINITIONS).unwrap();
                        let french: Vec<&str> = values
                            .iter()
                            .filter_map(|message| message.values.get("fr").map(String::as_str))
                            .collect();
                        assert!(
                            french.is_empty()
                                || french.iter().all(|value| value.ends_with('1'))
                                || french.iter().all(|value| value.ends_with('2')),
                            "mixed translations {french:?}"
                        );
                    }
                });
            }
        });

        let keys: Vec<String> = db.get_source_file_key_map(DEFINITIONS).unwrap().into_values().collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
        expect_that!(db.get_message("D"), err(anything()));
    }

    #[googletest::test]
    fn different_paths_ingest_concurrently() {
        let db = MessagesDatabase::new();

        std::thread::scope(|scope| {
            for file in 0..8 {
                let db = &db;
                scope.spawn(move || {
                    let path = format!("src/Feature{file}.messages.js");
                    for round in 0..20 {
                        let content = definitions(&format!("KEY_{file}: 'value {round}'"));
                        db.ingest_definitions(&path, &content, None).unwrap();
                    }
                });
            }
        });

        expect_that!(db.get_all_source_file_paths().len(), eq(8));
        for file in 0..8 {
            let message = db.get_message(&format!("KEY_{file}")).unwrap();
            expect_that!(message.source_value().unwrap().raw.as_str(), eq("value 19"));
        }
    }

    #[googletest::test]
    fn retiring_releases_the_path_lock() {
        let db = MessagesDatabase::new();
        db.ingest_definitions(DEFINITIONS, &definitions("A: 'a'"), None).unwrap();
        db.ingest_definitions("src/Other.messages.js", &definitions("B: 'b'"), None).unwrap();

        expect_that!(db.retire_source_file(DEFINITIONS), eq(true));
        expect_that!(db.retire_source_file("src/Missing.messages.js"), eq(false));

        let locks = db.path_locks.lock();
        expect_that!(locks.len(), eq(1));
        expect_that!(locks.contains_key("src/Other.messages.js"), eq(true));
    }

    #[googletest::test]
    fn retiring_keeps_a_lock_that_is_in_use() {
        let db = MessagesDatabase::new();
        db.ingest_definitions(DEFINITIONS, &definitions("A: 'a'"), None).unwrap();
        let waiting = db.path_lock(DEFINITIONS);

        db.retire_source_file(DEFINITIONS);

        let locks = db.path_locks.lock();
        expect_that!(locks.get(DEFINITIONS).is_some_and(|lock| Arc::ptr_eq(lock, &waiting)), eq(true));
    }
}
