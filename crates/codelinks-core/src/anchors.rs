//! Need-id references ("anchors") in comment text
//!
//! A marker such as `@need-ids:` followed by a comma or whitespace separated
//! list of IDs links the documented code to existing requirements:
//!
//! ```text
//! // @need-ids: NEED_1, NEED_2
//! ```

use crate::position::char_column;

/// One marker occurrence found in a comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// The marker that matched
    pub marker: String,
    /// Referenced IDs in order of appearance
    pub need_ids: Vec<String>,
    /// Line index within the comment
    pub row_offset: usize,
    /// Character column right after the marker, within the line
    pub start_column: usize,
    /// Character column where the trimmed ID list ends, within the line
    pub end_column: usize,
}

/// Scan comment text line by line for every marker.
///
/// Each marker is matched at its first occurrence on a line; several markers
/// on one line and several lines in one comment produce independent anchors.
pub fn extract_anchors(text: &str, markers: &[String]) -> Vec<Anchor> {
    let mut anchors = Vec::new();

    for (row_offset, line) in text.lines().enumerate() {
        for marker in markers {
            let Some(marker_idx) = line.find(marker.as_str()) else {
                continue;
            };
            let tail_start = marker_idx + marker.len();
            let tail = line[tail_start..].trim();

            let need_ids = tail
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();

            // The span starts right after the marker and is as long as the trimmed tail
            let start_column = char_column(line, tail_start);
            anchors.push(Anchor {
                marker: marker.clone(),
                need_ids,
                row_offset,
                start_column,
                end_column: start_column + tail.chars().count(),
            });
        }
    }

    anchors
}
