//! Marked reStructuredText blocks
//!
//! A comment may embed a directive block between a start and an end marker,
//! either on one line (`@rst .. impl:: Title @endrst`) or across lines:
//!
//! ```text
//! /*
//!  * @rst
//!  * .. impl:: Parse the header
//!  *    :id: IMPL_1
//!  * @endrst
//!  */
//! ```
//!
//! Multi-line blocks start on the line after the start marker; the comment
//! decoration in front of every line is removed with
//! [`remove_leading_sequences`].

use crate::directive::DEFAULT_INDENT;
use crate::position::{Position, SourceMap, absolute_column, char_column};

/// Markers and parsing options of marked rst blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedRstStyle {
    pub start_sequence: String,
    pub end_sequence: String,
    /// Per-line comment decoration to strip from multi-line blocks
    pub strip_leading_sequences: Vec<String>,
    /// Indentation of option and content lines
    pub indented_spaces: usize,
    /// Options whose values are comma separated lists
    pub link_options: Vec<String>,
}

impl Default for MarkedRstStyle {
    fn default() -> Self {
        Self {
            start_sequence: "@rst".to_string(),
            end_sequence: "@endrst".to_string(),
            strip_leading_sequences: vec!["*".to_string()],
            indented_spaces: DEFAULT_INDENT,
            link_options: vec!["links".to_string()],
        }
    }
}

/// Raw text between the markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRst {
    /// Inner text; for multi-line blocks it starts on the line after the start marker
    pub text: String,
    /// Line of the start marker within the comment
    pub row_offset: usize,
    /// Byte offset of `text` in the comment
    pub start_idx: usize,
    /// Byte offset of the end marker in the comment
    pub end_idx: usize,
}

impl ExtractedRst {
    pub fn is_multiline(&self) -> bool {
        self.text.contains('\n')
    }
}

/// Find the text between the first start marker and the last end marker.
///
/// Blank inner text counts as no block.
pub fn extract_rst(text: &str, start_marker: &str, end_marker: &str) -> Option<ExtractedRst> {
    let start_idx = text.find(start_marker)?;
    let end_idx = text.rfind(end_marker)?;
    let inner_start = start_idx + start_marker.len();
    if end_idx < inner_start {
        return None;
    }

    let inner = &text[inner_start..end_idx];
    if inner.trim().is_empty() {
        return None;
    }
    let row_offset = text[..start_idx].matches('\n').count();

    match inner.find('\n') {
        None => Some(ExtractedRst {
            text: inner.to_string(),
            row_offset,
            start_idx: inner_start,
            end_idx,
        }),
        Some(newline) => Some(ExtractedRst {
            text: inner[newline + 1..].to_string(),
            row_offset,
            start_idx: inner_start + newline + 1,
            end_idx,
        }),
    }
}

/// Strip each line up to and including the first leading sequence found on it.
///
/// Sequences are tried in order; lines without any of them are kept.
pub fn remove_leading_sequences(text: &str, leading_sequences: &[String]) -> String {
    text.split_inclusive('\n')
        .map(|line| {
            leading_sequences
                .iter()
                .find_map(|seq| line.find(seq.as_str()).map(|idx| &line[idx + seq.len()..]))
                .unwrap_or(line)
        })
        .collect()
}

/// A marked block located in the source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedRst {
    /// Block text handed to the directive parser
    pub text: String,
    pub source_map: SourceMap,
}

/// Extract the marked block of a comment and map it to file positions.
///
/// `comment_start` is the comment's absolute start.
pub fn find_marked_rst(
    comment: &str,
    comment_start: Position,
    style: &MarkedRstStyle,
) -> Option<MarkedRst> {
    let extracted = extract_rst(comment, &style.start_sequence, &style.end_sequence)?;
    let marker_row = comment_start.row + extracted.row_offset;

    if extracted.is_multiline() {
        let text = remove_leading_sequences(&extracted.text, &style.strip_leading_sequences);

        // The part in front of the end marker is decoration unless it holds text
        let mut lines: Vec<&str> = extracted.text.split('\n').collect();
        if lines.len() > 1 {
            let tail = lines[lines.len() - 1];
            if remove_leading_sequences(tail, &style.strip_leading_sequences)
                .trim()
                .is_empty()
            {
                lines.pop();
            }
        }
        let last = lines.last().copied().unwrap_or("");
        let start = Position::new(marker_row + 1, 0);
        let end = Position::new(marker_row + lines.len(), last.chars().count());

        return Some(MarkedRst {
            text,
            source_map: SourceMap::new(start, end),
        });
    }

    let line_start = comment[..extracted.start_idx].rfind('\n').map_or(0, |i| i + 1);
    let line_end = comment[extracted.end_idx..]
        .find('\n')
        .map_or(comment.len(), |i| extracted.end_idx + i);
    let line = &comment[line_start..line_end];

    let start_column = absolute_column(
        comment_start,
        extracted.row_offset,
        char_column(line, extracted.start_idx - line_start),
    );
    let end_column = absolute_column(
        comment_start,
        extracted.row_offset,
        char_column(line, extracted.end_idx - line_start),
    );

    Some(MarkedRst {
        text: extracted.text,
        source_map: SourceMap::on_row(marker_row, start_column, end_column),
    })
}
