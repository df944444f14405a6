//! Parsing of message source files into raw records.
//!
//! Parsers never touch the database. They return every message they could read plus
//! diagnostics for the ones they couldn't; only a file that can't be read at all is an error.

pub mod definitions;
pub mod translations;

use thiserror::Error;

use crate::classify::SourceFileKind;
use crate::diagnostic::Diagnostic;
use crate::messages::{
    MessageMeta,
    MessageValue,
    SourceFileMeta,
};
use crate::types::SourcePosition;

/// A failure that rejects a whole source file.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to set language for parser: {0}")]
    LanguageSetup(#[from] tree_sitter::LanguageError),
    #[error("Failed to parse {kind} source: {reason}")]
    Syntax { kind: SourceFileKind, reason: String },
    #[error("Expected a `defineMessages` call in the source file, but none was found")]
    NoDefinitions,
    #[error("Source file meta descriptor is invalid: {0}")]
    InvalidSourceFileMeta(String),
    #[error("Translations root must be an object")]
    RootNotObject,
}

/// A message read from a definitions file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessageDefinition {
    pub name: String,
    pub value: MessageValue,
    pub position: SourcePosition,
    /// Meta after applying the message's overrides to the file meta.
    pub meta: MessageMeta,
    pub description: Option<String>,
}

/// A message read from a translations file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessageTranslation {
    pub name: String,
    pub value: MessageValue,
    pub position: SourcePosition,
}

/// Result of parsing a definitions file.
#[derive(Debug, Clone, Default)]
pub struct ParsedDefinitions {
    pub meta: SourceFileMeta,
    /// Messages in declaration order, without duplicates.
    pub messages: Vec<RawMessageDefinition>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of parsing a translations file.
#[derive(Debug, Clone, Default)]
pub struct ParsedTranslations {
    /// Messages in file order, without duplicates.
    pub messages: Vec<RawMessageTranslation>,
    pub diagnostics: Vec<Diagnostic>,
}

pub use definitions::parse_definitions;
pub use translations::parse_translations;
