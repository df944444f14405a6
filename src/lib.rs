//! intl-message-db
//!
//! An indexed database of i18n messages. Definitions files (`*.messages.{js,ts,...}`) declare
//! messages in a source locale, translations files (`*.messages.json`) supply other locales.
//! The database validates them against each other and compiles per-locale artifacts and
//! TypeScript declarations.
//!
//! ```
//! use intl_message_db::compile::CompileOptions;
//! use intl_message_db::database::MessagesDatabase;
//!
//! let db = MessagesDatabase::new();
//! db.ingest_definitions("src/App.messages.js", "export default defineMessages({ greeting: 'Hello' });", None)?;
//! db.ingest_translations("src/messages/fr.messages.json", None, r#"{"greeting": "Bonjour"}"#)?;
//!
//! assert_eq!(db.get_known_locales(), vec!["en-US", "fr"]);
//! let compiled = db.precompile("src/App.messages.js", "fr", &CompileOptions::default())?;
//! assert_eq!(compiled, format!(r#"{{"{}":"Bonjour"}}"#, db.hash_key("greeting")).into_bytes());
//! # Ok::<(), intl_message_db::error::DatabaseError>(())
//! ```

pub mod classify;
pub mod compile;
pub mod config;
pub mod database;
pub mod diagnostic;
pub mod error;
pub mod hash;
pub mod indexer;
pub mod input;
pub mod messages;
mod test_utils;
pub mod typegen;
pub mod types;

pub use database::MessagesDatabase;
pub use error::{
    DatabaseError,
    DatabaseResult,
};
