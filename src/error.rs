use thiserror::Error;

use crate::hash::HashedKey;
use crate::input::SourceError;

/// What a failed lookup was looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundKind {
    /// A message, by hashed or original key.
    Message(String),
    /// A source file, by path.
    SourceFile(String),
}

impl std::fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(key) => write!(f, "message `{key}`"),
            Self::SourceFile(path) => write!(f, "source file `{path}`"),
        }
    }
}

/// Errors returned by [`crate::database::MessagesDatabase`].
///
/// A failed ingestion never changes the database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The whole file was rejected and its previous contribution kept.
    #[error("Failed to ingest {file}: {source}")]
    StructuralParseFailure {
        file: String,
        #[source]
        source: SourceError,
    },

    #[error(
        "Key `{key}` in {file} hashes to `{hashed_key}`, which is already used by `{existing_key}`"
    )]
    KeyHashCollision { file: String, key: String, existing_key: String, hashed_key: HashedKey },

    #[error("Could not find {0}")]
    NotFound(NotFoundKind),

    /// Neither the requested locale nor the fallback provides a body.
    #[error("No {locale} value for `{key}` in {file}")]
    MissingResolvableBody { file: String, key: String, locale: String },

    #[error("Could not determine the locale of {file}")]
    UnknownLocale { file: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DatabaseError {
    pub(crate) fn structural(file: &str, source: SourceError) -> Self {
        Self::StructuralParseFailure { file: file.to_string(), source }
    }
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
