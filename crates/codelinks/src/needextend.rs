//! `needextend` directives from `marked_content.json`
//!
//! Every need ID referenced from source gets one directive that adds the
//! remote links of its references to the need in the documentation:
//!
//! ```text
//! .. needextend:: REQ_1
//!    :remote-url: https://github.com/o/r/blob/abc/src/a.c#L3
//! ```

use codelinks_core::SourceMap;
use eyre::{Result, WrapErr};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// Option name carrying the links, unless overridden
pub const DEFAULT_REMOTE_URL_FIELD: &str = "remote-url";

const NEED_ID_REFS: &str = "need-id-refs";

/// One record of `marked_content.json`, as far as the writer needs it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarkedContent {
    pub filepath: String,
    pub remote_url: Option<String>,
    pub source_map: SourceMap,
    #[serde(default)]
    pub tagged_scope: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub marker: Option<String>,
    #[serde(default)]
    pub need_ids: Option<Vec<String>>,
}

/// Malformed records; nothing is rendered when any record is invalid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedContentError {
    pub errors: Vec<String>,
}

impl std::fmt::Display for MarkedContentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.errors.join("\n"))
    }
}

impl std::error::Error for MarkedContentError {}

/// How the directives are rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedextendOptions {
    pub remote_url_field: String,
    /// Section title put above the directives
    pub title: Option<String>,
}

impl Default for NeedextendOptions {
    fn default() -> Self {
        Self {
            remote_url_field: DEFAULT_REMOTE_URL_FIELD.to_string(),
            title: None,
        }
    }
}

/// Records of `projects` in a `marked_content.json` file, all projects when
/// empty. A bare array of records is accepted as well.
pub fn load_marked_content(path: &Path, projects: &[String]) -> Result<Vec<serde_json::Value>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .wrap_err_with(|| format!("Failed to parse {}", path.display()))?;

    let by_project = match json {
        serde_json::Value::Array(records) if projects.is_empty() => return Ok(records),
        serde_json::Value::Object(by_project) => by_project,
        _ => eyre::bail!(
            "Expected records keyed by project name in {}",
            path.display()
        ),
    };

    for name in projects {
        if !by_project.contains_key(name) {
            eyre::bail!("Project '{}' is not found in {}", name, path.display());
        }
    }

    let mut records = Vec::new();
    for (name, project_records) in by_project {
        if !projects.is_empty() && !projects.contains(&name) {
            continue;
        }
        match project_records {
            serde_json::Value::Array(items) => records.extend(items),
            _ => eyre::bail!("Records of project '{}' are not an array", name),
        }
    }
    Ok(records)
}

/// Check the need-id-refs records; other record types are ignored
pub fn validate_marked_content(
    records: &[serde_json::Value],
) -> Result<Vec<MarkedContent>, MarkedContentError> {
    let mut errors = Vec::new();
    let mut refs = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let kind = record.get("type").and_then(serde_json::Value::as_str);
        if kind.is_some_and(|k| k != NEED_ID_REFS) {
            continue;
        }

        let mut record_errors = Vec::new();
        match serde_json::from_value::<MarkedContent>(record.clone()) {
            Ok(content) => {
                if content.marker.as_deref().is_none_or(str::is_empty) {
                    record_errors
                        .push("Marker is required for marked content of type 'need-id-refs'".to_string());
                }
                if content.need_ids.as_ref().is_none_or(Vec::is_empty) {
                    record_errors.push(
                        "Need id refs are required for marked content of type 'need-id-refs'"
                            .to_string(),
                    );
                }
                if record_errors.is_empty() {
                    refs.push(content);
                }
            }
            Err(e) => record_errors.push(e.to_string()),
        }

        if !record_errors.is_empty() {
            let filepath = record
                .get("filepath")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("<unknown file>");
            errors.push(format!(
                "Marked content #{} ({}) has the following errors:",
                index, filepath
            ));
            errors.extend(record_errors.into_iter().map(|e| format!("  {}", e)));
        }
    }

    if errors.is_empty() {
        Ok(refs)
    } else {
        Err(MarkedContentError { errors })
    }
}

/// One directive per need ID, in order of first reference.
///
/// A need referenced from several places lists all their links, comma
/// separated. References without a remote link contribute nothing; a need
/// left with no link at all is skipped.
pub fn render_needextend(refs: &[MarkedContent], options: &NeedextendOptions) -> String {
    let mut links: Vec<(&str, Vec<&str>)> = Vec::new();
    for content in refs {
        for need_id in content.need_ids.iter().flatten() {
            let index = match links.iter().position(|(id, _)| *id == need_id.as_str()) {
                Some(index) => index,
                None => {
                    links.push((need_id.as_str(), Vec::new()));
                    links.len() - 1
                }
            };
            if let Some(url) = content.remote_url.as_deref() {
                if !links[index].1.contains(&url) {
                    links[index].1.push(url);
                }
            }
        }
    }

    let mut output = String::new();
    if let Some(title) = &options.title {
        output.push_str(&format!("{}\n{}\n\n", title, "=".repeat(title.chars().count())));
    }
    for (need_id, urls) in links {
        if urls.is_empty() {
            warn!("No remote url for {}, skipping its needextend", need_id);
            continue;
        }
        output.push_str(&format!(
            ".. needextend:: {}\n   :{}: {}\n\n",
            need_id,
            options.remote_url_field,
            urls.join(",")
        ));
    }
    output
}

/// Render validated `refs` to `outpath`; returns the number of directives
pub fn write_needextend(
    refs: &[MarkedContent],
    outpath: &Path,
    options: &NeedextendOptions,
) -> Result<usize> {
    let text = render_needextend(refs, options);

    if let Some(parent) = outpath.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(outpath, &text)
        .wrap_err_with(|| format!("Failed to write {}", outpath.display()))?;

    Ok(text.matches(".. needextend::").count())
}
