//! Configuration schema for codelinks
//!
//! Config lives at `.config/codelinks/config.yaml` relative to the project root.

use codelinks_core::{AnalyseConfig, AnalyseSection, ConfigError, Language, WalkSources};
use eyre::{Result, WrapErr};
use facet::Facet;
use std::path::{Path, PathBuf};

/// Config path used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = ".config/codelinks/config.yaml";

/// Output directory used when neither the config nor the CLI names one
pub const DEFAULT_OUTDIR: &str = "output";

/// Root configuration for codelinks
#[derive(Debug, Clone, Facet)]
pub struct Config {
    /// Where `marked_content.json` and the warnings file go (relative to the config file)
    #[facet(default)]
    pub outdir: Option<String>,

    /// Projects to analyse
    #[facet(default)]
    pub projects: Vec<ProjectConfig>,
}

/// Configuration for a single project
#[derive(Debug, Clone, Facet)]
pub struct ProjectConfig {
    /// Name of the project, used as key in `marked_content.json`
    pub name: String,

    #[facet(default)]
    pub source_discover: Option<SourceDiscoverSection>,

    #[facet(default)]
    pub analyse: Option<AnalyseSection>,
}

/// Which files belong to a project
#[derive(Debug, Clone, Default, Facet)]
pub struct SourceDiscoverSection {
    /// Relative to the config file; defaults to its directory
    #[facet(default)]
    pub src_dir: Option<String>,

    /// Glob patterns always kept, even when gitignored or excluded
    #[facet(default)]
    pub include: Vec<String>,

    #[facet(default)]
    pub exclude: Vec<String>,

    #[facet(default)]
    pub gitignore: Option<bool>,

    /// Defaults to `cpp`
    #[facet(default)]
    pub language: Option<String>,
}

/// Discovery settings after defaults are applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverOptions {
    pub src_dir: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub gitignore: bool,
    pub language: Language,
}

impl DiscoverOptions {
    pub fn new(src_dir: impl Into<PathBuf>, language: Language) -> Self {
        Self {
            src_dir: src_dir.into(),
            include: Vec::new(),
            exclude: Vec::new(),
            gitignore: true,
            language,
        }
    }

    /// Walker over the project's source files
    pub fn sources(&self) -> WalkSources {
        WalkSources::new(&self.src_dir)
            .language(self.language)
            .include(self.include.iter().cloned())
            .exclude(self.exclude.iter().cloned())
            .gitignore(self.gitignore)
    }
}

/// A validated project, ready to run
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub discover: DiscoverOptions,
    pub analyse: AnalyseConfig,
}

impl Config {
    /// Output directory, resolved against `config_dir`
    pub fn outdir(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(self.outdir.as_deref().unwrap_or(DEFAULT_OUTDIR))
    }

    /// Validate every project and resolve paths against `config_dir`.
    ///
    /// Errors of all projects are collected, each group headed by the
    /// project it belongs to.
    pub fn resolve(self, config_dir: &Path) -> Result<Vec<Project>, ConfigError> {
        let mut errors = Vec::new();
        let mut projects: Vec<Project> = Vec::new();

        if self.projects.is_empty() {
            errors.push("No projects configured".to_string());
        }

        for project in self.projects {
            if projects.iter().any(|p| p.name == project.name) {
                errors.push(format!("Project '{}' is defined multiple times", project.name));
                continue;
            }
            match project.resolve(config_dir) {
                Ok(project) => projects.push(project),
                Err((name, project_errors)) => {
                    errors.push(format!("Project '{}' has the following errors:", name));
                    errors.extend(project_errors);
                }
            }
        }

        if errors.is_empty() {
            Ok(projects)
        } else {
            Err(ConfigError::new(errors))
        }
    }
}

impl ProjectConfig {
    fn resolve(self, config_dir: &Path) -> Result<Project, (String, Vec<String>)> {
        let discover = self.source_discover.unwrap_or_default();
        let src_dir = config_dir.join(discover.src_dir.as_deref().unwrap_or("."));

        let language = match discover.language.as_deref() {
            None => Language::Cpp,
            Some(name) => match name.parse::<Language>() {
                Ok(language) => language,
                Err(err) => {
                    return Err((
                        self.name,
                        vec!["source_discover configuration errors:".to_string(), err.to_string()],
                    ));
                }
            },
        };

        let analyse = self
            .analyse
            .unwrap_or_default()
            .resolve(&src_dir, language)
            .map_err(|err| (self.name.clone(), err.errors))?;

        Ok(Project {
            name: self.name,
            discover: DiscoverOptions {
                src_dir,
                include: discover.include,
                exclude: discover.exclude,
                gitignore: discover.gitignore.unwrap_or(true),
                language,
            },
            analyse,
        })
    }
}

/// Read and parse a config file
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        eyre::bail!(
            "Config file not found at {}\n\n\
             Create a config file with your project configuration:\n\n\
             projects:\n  \
               - name: my-project\n    \
                 source_discover:\n      \
                   src_dir: src\n      \
                   language: cpp",
            path.display()
        );
    }

    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = facet_yaml::from_str(&content)
        .map_err(|e| eyre::eyre!("{}", e))
        .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}
