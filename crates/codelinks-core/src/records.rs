//! Extracted records and their aggregation

use crate::oneline::NeedFields;
use crate::position::SourceMap;
use serde::Serialize;
use std::path::PathBuf;

/// Marker-specific part of a record, tagged by `type` in JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum RecordPayload {
    /// IDs referenced after an anchor marker
    #[serde(rename = "need-id-refs")]
    NeedIdRefs { marker: String, need_ids: Vec<String> },
    /// A one-line need
    #[serde(rename = "need")]
    Need { need: NeedFields },
    /// A marked rst block and its parsed directive (`null` when parsing failed)
    #[serde(rename = "rst")]
    Rst { rst: String, need: Option<NeedFields> },
}

impl RecordPayload {
    pub fn type_name(&self) -> &'static str {
        match self {
            RecordPayload::NeedIdRefs { .. } => "need-id-refs",
            RecordPayload::Need { .. } => "need",
            RecordPayload::Rst { .. } => "rst",
        }
    }
}

/// One extracted item with its location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedRecord {
    pub filepath: PathBuf,
    pub remote_url: Option<String>,
    pub source_map: SourceMap,
    /// Span of the comment the record was extracted from
    #[serde(skip)]
    pub comment: SourceMap,
    /// Source text of the associated scope
    pub tagged_scope: Option<String>,
    #[serde(flatten)]
    pub payload: RecordPayload,
}

impl ExtractedRecord {
    pub fn start_row(&self) -> usize {
        self.source_map.start.row
    }
}

/// Combine the extractor outputs into the published order.
///
/// Anchors come first, then one-line needs ordered by row, then rst blocks;
/// the result is stably sorted by file and start row.
pub fn merge_records(
    anchors: Vec<ExtractedRecord>,
    mut oneline: Vec<ExtractedRecord>,
    rst: Vec<ExtractedRecord>,
) -> Vec<ExtractedRecord> {
    oneline.sort_by_key(ExtractedRecord::start_row);

    let mut all = anchors;
    all.extend(oneline);
    all.extend(rst);
    all.sort_by(|a, b| {
        a.filepath
            .cmp(&b.filepath)
            .then(a.start_row().cmp(&b.start_row()))
    });
    all
}
