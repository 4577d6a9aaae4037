//! Line/column ranges for editor-facing results.
//!
//! Internal ranges are byte offsets; editors want 0-indexed line/column
//! pairs. A [`Span`] is the converted form of a [`TextRange`].

use super::span::{LineIndex, TextRange, TextSize};

/// A span representing a range in source code (0-indexed for LSP compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// A position in source code (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Convert a byte range using the line index of its text.
    pub fn from_range(range: TextRange, index: &LineIndex) -> Self {
        Self {
            start: Position::from_offset(range.start(), index),
            end: Position::from_offset(range.end(), index),
        }
    }

    /// Check if a position falls within this span
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    pub fn from_offset(offset: TextSize, index: &LineIndex) -> Self {
        let lc = index.line_col(offset);
        Self::new(lc.line, lc.col)
    }
}
