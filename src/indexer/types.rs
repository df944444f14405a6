//! Indexer type definitions.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::MatcherError;
use crate::error::DatabaseError;

/// A file-system event, with paths relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Created { path: String, content: String },
    Modified { path: String, content: String },
    Deleted { path: String },
}

impl FileChange {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Created { path, .. } | Self::Modified { path, .. } | Self::Deleted { path } => path,
        }
    }
}

/// Result of indexing a whole project.
#[derive(Debug, Default)]
pub struct IndexSummary {
    /// Definitions files that were ingested.
    pub definitions: usize,
    /// Translations files that were ingested.
    pub translations: usize,
    /// Files that were skipped, with the reason.
    pub failures: Vec<(String, IndexerError)>,
}

#[derive(Error, Debug)]
pub enum IndexerError {
    /// Error when failing to read a file
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Matcher(#[from] MatcherError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}
