//! Core types used throughout the project.

use serde::{
    Deserialize,
    Serialize,
};

/// A position in source code (0-indexed, column counted in bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: u32,
    pub col: u32,
}

impl SourcePosition {
    #[must_use]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl From<tree_sitter::Point> for SourcePosition {
    #[allow(clippy::cast_possible_truncation)] // 42億行を超えるソースは扱わない
    fn from(point: tree_sitter::Point) -> Self {
        Self { line: point.row as u32, col: point.column as u32 }
    }
}
