//! codelinks - Extract traceability markers from source code comments
//!
//! Runs the analysis of every configured project and writes
//! `marked_content.json` plus the warnings file to the output directory.
//! [`needextend`] turns that file into `needextend` directives for the docs.

pub mod config;
pub mod needextend;
pub mod output;

pub use config::{Config, DiscoverOptions, Project, load_config};

use codelinks_core::{AnalysisResult, SourceAnalyse, dump_warnings};
use eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the records file below the output directory
pub const MARKED_CONTENT_FILE: &str = "marked_content.json";

/// Analysis result of one project
#[derive(Debug, Clone)]
pub struct ProjectOutcome {
    pub name: String,
    pub result: AnalysisResult,
}

/// Discover and analyse one project
pub fn analyse_project(project: &Project) -> Result<ProjectOutcome> {
    info!("Analysing project {}", project.name);
    let result = SourceAnalyse::new(project.analyse.clone())
        .run(project.discover.sources())
        .wrap_err_with(|| format!("Failed to analyse project '{}'", project.name))?;
    Ok(ProjectOutcome {
        name: project.name.clone(),
        result,
    })
}

/// Paths written by [`write_outputs`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenOutputs {
    pub marked_content: PathBuf,
    pub warnings: PathBuf,
}

/// Write records keyed by project name, and the warnings of all projects
pub fn write_outputs(outdir: &Path, outcomes: &[ProjectOutcome]) -> Result<WrittenOutputs> {
    std::fs::create_dir_all(outdir)
        .wrap_err_with(|| format!("Failed to create {}", outdir.display()))?;

    let mut content = serde_json::Map::new();
    for outcome in outcomes {
        let records = serde_json::to_value(&outcome.result.records)
            .wrap_err_with(|| format!("Failed to serialize records of '{}'", outcome.name))?;
        content.insert(outcome.name.clone(), records);
    }

    let marked_content = outdir.join(MARKED_CONTENT_FILE);
    let json = serde_json::to_string_pretty(&content).wrap_err("Failed to serialize records")?;
    std::fs::write(&marked_content, json)
        .wrap_err_with(|| format!("Failed to write {}", marked_content.display()))?;

    let warnings: Vec<_> = outcomes
        .iter()
        .flat_map(|o| o.result.warnings.iter().cloned())
        .collect();
    let warnings = dump_warnings(outdir, &warnings)?;

    Ok(WrittenOutputs {
        marked_content,
        warnings,
    })
}

/// Nearest ancestor of the current directory holding a codelinks config,
/// or the current directory itself
pub fn find_project_root() -> Result<PathBuf> {
    let mut current = std::env::current_dir()?;

    loop {
        if current.join(config::DEFAULT_CONFIG_PATH).exists() {
            return Ok(current);
        }

        if !current.pop() {
            return std::env::current_dir().wrap_err("Failed to get current directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codelinks_core::{AnalyseConfig, Language, load_warnings};
    use std::fs;

    fn demo_project(root: &Path) -> Project {
        let src = root.join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(
            src.join("main.c"),
            "// @need-ids: REQ_1\nint main() { return 0; }\n// @one, two, three, four, five\n",
        )
        .unwrap();

        let mut analyse = AnalyseConfig::new(&src, Language::C);
        analyse.get_oneline_needs = true;
        Project {
            name: "demo".to_string(),
            discover: DiscoverOptions::new(&src, Language::C),
            analyse,
        }
    }

    #[test]
    fn test_analyse_and_write_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = analyse_project(&demo_project(dir.path())).unwrap();
        assert_eq!(outcome.result.stats.files, 1);
        assert_eq!(outcome.result.records.len(), 1);
        assert_eq!(outcome.result.warnings.len(), 2);

        let outdir = dir.path().join("out");
        let written = write_outputs(&outdir, &[outcome]).unwrap();
        assert_eq!(written.marked_content, outdir.join("marked_content.json"));

        let content: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written.marked_content).unwrap()).unwrap();
        let records = content["demo"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["need_ids"], serde_json::json!(["REQ_1"]));

        let warnings = load_warnings(&outdir).unwrap().unwrap();
        let sub_types: Vec<&str> = warnings.iter().map(|w| w.sub_type.as_str()).collect();
        assert_eq!(sub_types, vec!["too_few_fields", "too_many_fields"]);
    }

    #[test]
    fn test_write_outputs_without_projects() {
        let dir = tempfile::tempdir().unwrap();
        write_outputs(dir.path(), &[]).unwrap();
        let content = fs::read_to_string(dir.path().join(MARKED_CONTENT_FILE)).unwrap();
        assert_eq!(content, "{}");
        assert_eq!(load_warnings(dir.path()).unwrap(), Some(Vec::new()));
    }
}
