//! Source positions and the mapping from within-comment offsets to file positions
//!
//! Rows and columns are 0-based. Columns count characters, not bytes and not
//! visual cells.

use serde::{Deserialize, Serialize};

/// A 0-based (row, column) position in a source file
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// Start and end of an extracted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMap {
    pub start: Position,
    pub end: Position,
}

impl SourceMap {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A span on a single row
    pub fn on_row(row: usize, start_column: usize, end_column: usize) -> Self {
        Self {
            start: Position::new(row, start_column),
            end: Position::new(row, end_column),
        }
    }
}

/// Number of characters in `line` before byte offset `byte_idx`.
///
/// Offsets that fall inside a character or past the end are clamped.
pub fn char_column(line: &str, byte_idx: usize) -> usize {
    let mut idx = byte_idx.min(line.len());
    while !line.is_char_boundary(idx) {
        idx -= 1;
    }
    line[..idx].chars().count()
}

/// Absolute column of an offset found on the `line_offset`-th line of a comment.
///
/// Only the first line of a comment starts mid-line; later lines of a
/// multi-line comment start at column 0 of their source line.
pub fn absolute_column(comment_start: Position, line_offset: usize, column: usize) -> usize {
    if line_offset == 0 {
        comment_start.column + column
    } else {
        column
    }
}

/// End position of `text` when it starts at `start`
pub fn end_of_text(start: Position, text: &str) -> Position {
    let newlines = text.matches('\n').count();
    let last_line = text.rsplit('\n').next().unwrap_or("");
    if newlines == 0 {
        Position::new(start.row, start.column + last_line.chars().count())
    } else {
        Position::new(start.row + newlines, last_line.chars().count())
    }
}
