//! Non-fatal extraction warnings and their on-disk format

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory below the output directory holding the warnings file
pub const WARNINGS_DIR: &str = "warnings";

/// Name of the warnings file
pub const WARNINGS_FILE: &str = "codelinks_warnings.json";

/// Which extractor raised the warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningType {
    /// Malformed one-line need
    Need,
    /// Directive parse failure in a marked rst block
    Rst,
}

/// A malformed marker, reported without stopping the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyseWarning {
    pub file_path: String,
    /// 1-based line
    pub lineno: usize,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: WarningType,
    pub sub_type: String,
}

impl std::fmt::Display for AnalyseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.file_path, self.lineno, self.msg)
    }
}

/// Path of the warnings file below `outdir`
pub fn warnings_path(outdir: &Path) -> PathBuf {
    outdir.join(WARNINGS_DIR).join(WARNINGS_FILE)
}

/// Write `warnings` to `{outdir}/warnings/codelinks_warnings.json`
pub fn dump_warnings(outdir: &Path, warnings: &[AnalyseWarning]) -> Result<PathBuf> {
    let path = warnings_path(outdir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(warnings).wrap_err("Failed to serialize warnings")?;
    std::fs::write(&path, json).wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Read warnings written by [`dump_warnings`]; `None` when there is no file
pub fn load_warnings(outdir: &Path) -> Result<Option<Vec<AnalyseWarning>>> {
    let path = warnings_path(outdir);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    let warnings = serde_json::from_str(&content)
        .wrap_err_with(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<AnalyseWarning> {
        vec![
            AnalyseWarning {
                file_path: "src/a.c".to_string(),
                lineno: 4,
                msg: "7 given fields. They shall be less than 6".to_string(),
                kind: WarningType::Need,
                sub_type: "too_many_fields".to_string(),
            },
            AnalyseWarning {
                file_path: "src/b.c".to_string(),
                lineno: 12,
                msg: "Unexpected input".to_string(),
                kind: WarningType::Rst,
                sub_type: "parsing_error".to_string(),
            },
        ]
    }

    #[test]
    fn test_dump_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dump_warnings(dir.path(), &sample()).unwrap();
        assert_eq!(path, dir.path().join("warnings").join("codelinks_warnings.json"));
        assert_eq!(load_warnings(dir.path()).unwrap(), Some(sample()));
    }

    #[test]
    fn test_load_without_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_warnings(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(&sample()[0]).unwrap();
        assert_eq!(json["type"], "need");
        assert_eq!(json["sub_type"], "too_many_fields");
        assert_eq!(json["lineno"], 4);
        assert_eq!(sample()[1].to_string(), "src/b.c:12: Unexpected input");
    }
}
