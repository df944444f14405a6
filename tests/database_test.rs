//! End-to-end behavior of the message database through its public API.

#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]
#![allow(missing_docs)]

use intl_message_db::compile::{
    CompileFormat,
    CompileOptions,
    FallbackPolicy,
};
use intl_message_db::diagnostic::DiagnosticCode;
use intl_message_db::hash::{
    HashedKey,
    hash_message_key,
};
use intl_message_db::{
    DatabaseError,
    MessagesDatabase,
};
use pretty_assertions::assert_eq;
use serde_json::{
    Value,
    json,
};

const DEFINITIONS: &str = "src/Home.messages.js";
const FRENCH: &str = "src/messages/fr.messages.json";

fn definitions(entries: &str) -> String {
    format!("export default defineMessages({{ {entries} }});")
}

fn compile(db: &MessagesDatabase, locale: &str, options: &CompileOptions) -> Value {
    serde_json::from_slice(&db.precompile(DEFINITIONS, locale, options).unwrap()).unwrap()
}

#[test]
fn greeting_example() {
    let db = MessagesDatabase::new();
    db.ingest_definitions(DEFINITIONS, &definitions("greeting: 'Hello'"), None).unwrap();
    db.ingest_translations(FRENCH, None, r#"{"greeting": "Bonjour"}"#).unwrap();

    assert_eq!(db.get_known_locales(), vec!["en-US", "fr"]);

    let hash = hash_message_key("greeting");
    let expected = format!(r#"{{"{hash}":"Bonjour"}}"#);
    assert_eq!(db.precompile(DEFINITIONS, "fr", &CompileOptions::default()).unwrap(), expected.into_bytes());

    let fallback = compile(&db, "de", &CompileOptions::default());
    assert_eq!(fallback[hash.as_str()], json!("Hello"));

    let strict = CompileOptions { fallback: FallbackPolicy::Strict, ..CompileOptions::default() };
    let error = db.precompile(DEFINITIONS, "de", &strict).unwrap_err();
    assert!(matches!(error, DatabaseError::MissingResolvableBody { .. }));
}

#[test]
fn hashing_is_deterministic() {
    let db = MessagesDatabase::new();

    assert_eq!(db.hash_key("greeting"), hash_message_key("greeting"));
    assert_eq!(hash_message_key("greeting"), hash_message_key("greeting"));
}

#[test]
fn reingestion_retires_removed_keys() {
    let db = MessagesDatabase::new();
    db.ingest_definitions(DEFINITIONS, &definitions("A: 'a', B: 'b', C: 'c'"), None).unwrap();
    let stale = db.hash_key("A");

    db.ingest_definitions(DEFINITIONS, &definitions("B: 'b', D: 'd'"), None).unwrap();

    assert_eq!(db.get_all_source_file_paths(), vec![DEFINITIONS]);
    let keys: Vec<String> = db.get_source_file_key_map(DEFINITIONS).unwrap().into_values().collect();
    assert_eq!(keys, vec!["B", "D"]);
    assert!(db.get_message(stale.as_str()).is_err());
    assert!(db.get_message("C").is_err());
}

#[test]
fn translations_add_their_locale() {
    let db = MessagesDatabase::new();
    db.ingest_definitions(DEFINITIONS, &definitions("A: 'a', B: 'b'"), None).unwrap();

    db.ingest_translations("src/messages/pt_br.messages.json", None, r#"{"A": "á", "B": "bê"}"#)
        .unwrap();

    assert_eq!(db.get_known_locales(), vec!["en-US", "pt-BR"]);
    for key in ["A", "B"] {
        assert!(db.get_message(key).unwrap().translation("pt-BR").is_some());
    }
}

fn colliding_hash(_key: &str) -> HashedKey {
    HashedKey::from_raw("SAME00")
}

#[test]
fn hash_collision_keeps_first_file() {
    let db = MessagesDatabase::new().with_hasher(colliding_hash);
    db.ingest_definitions("src/A.messages.js", &definitions("FIRST: 'first'"), None).unwrap();

    let error = db
        .ingest_definitions("src/B.messages.js", &definitions("SECOND: 'second'"), None)
        .unwrap_err();

    assert!(matches!(error, DatabaseError::KeyHashCollision { .. }));
    assert_eq!(db.get_all_source_file_paths(), vec!["src/A.messages.js"]);
    assert_eq!(db.get_message("SAME00").unwrap().key(), "FIRST");
}

#[test]
fn secrets_are_bundled_only_on_request() {
    let db = MessagesDatabase::new();
    db.ingest_definitions(
        DEFINITIONS,
        &definitions("PUBLIC: 'public', TOKEN: { message: 'token', meta: { secret: true } }"),
        None,
    )
    .unwrap();
    let token = db.hash_key("TOKEN").to_string();

    let without = compile(&db, "en-US", &CompileOptions::default());
    assert!(without.get(&token).is_none());

    let with = compile(&db, "en-US", &CompileOptions { bundle_secrets: true, ..CompileOptions::default() });
    assert_eq!(with[&token], json!("token"));

    let keyless = compile(&db, "en-US", &CompileOptions {
        format: CompileFormat::KeylessJson,
        ..CompileOptions::default()
    });
    assert_eq!(keyless, json!(["public", null]));
}

#[test]
fn structural_failure_keeps_previous_contribution() {
    let db = MessagesDatabase::new();
    db.ingest_definitions(DEFINITIONS, &definitions("A: 'a'"), None).unwrap();

    let error = db.ingest_definitions(DEFINITIONS, "export default defineMessages({", None);

    assert!(matches!(error, Err(DatabaseError::StructuralParseFailure { .. })));
    assert_eq!(db.get_message("A").unwrap().source_value().unwrap().raw, "a");
}

#[test]
fn validation_reports_cross_locale_problems() {
    let db = MessagesDatabase::new();
    db.ingest_definitions(DEFINITIONS, &definitions("WELCOME: 'Welcome {name}', BYE: 'Bye'"), None)
        .unwrap();
    db.ingest_translations(FRENCH, None, r#"{"WELCOME": "Bienvenue {nom}", "UNKNOWN": "?"}"#)
        .unwrap();

    let codes: Vec<DiagnosticCode> = db.validate().iter().map(|diagnostic| diagnostic.code).collect();

    assert!(codes.contains(&DiagnosticCode::UnknownKey));
    assert!(codes.contains(&DiagnosticCode::VariableMismatch));
    assert!(codes.contains(&DiagnosticCode::MissingTranslation));
}
