//! Project indexing and file-change dispatch.

/// Indexer type definitions
mod types;
/// Project walk and output writing
mod workspace;

pub use types::{
    FileChange,
    IndexSummary,
    IndexerError,
};
pub use workspace::{
    WorkspaceIndexer,
    apply_file_change,
    declaration_path,
};
