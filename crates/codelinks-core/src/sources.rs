//! Source providers for comment analysis

use crate::text::{decode_source, normalize_newlines};
use eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::debug;

#[cfg(feature = "walk")]
use crate::language::Language;

/// A decoded, newline-normalized source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

/// Trait for providing source files to analyse
pub trait Sources {
    /// Load every text file; binary and non-UTF-8 files are skipped
    fn load(self) -> Result<Vec<SourceFile>>;
}

/// Sources from an explicit list of file paths
pub struct PathSources(Vec<PathBuf>);

impl PathSources {
    /// Create from an iterator of paths
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self(paths.into_iter().map(Into::into).collect())
    }
}

fn read_source(path: &Path) -> Result<Option<SourceFile>> {
    let bytes =
        std::fs::read(path).wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    match decode_source(&bytes) {
        Some(content) => Ok(Some(SourceFile {
            path: path.to_path_buf(),
            content,
        })),
        None => {
            debug!("Skipping non-text file {}", path.display());
            Ok(None)
        }
    }
}

impl Sources for PathSources {
    fn load(self) -> Result<Vec<SourceFile>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let loaded: Vec<Option<SourceFile>> = self
                .0
                .par_iter()
                .map(|path| read_source(path))
                .collect::<Result<_>>()?;
            Ok(loaded.into_iter().flatten().collect())
        }

        #[cfg(not(feature = "parallel"))]
        {
            let mut files = Vec::new();
            for path in &self.0 {
                if let Some(file) = read_source(path)? {
                    files.push(file);
                }
            }
            Ok(files)
        }
    }
}

/// In-memory sources (useful for testing)
pub struct MemorySources(Vec<(PathBuf, String)>);

impl MemorySources {
    /// Create empty memory sources
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a file with content
    pub fn add(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.0.push((path.into(), content.into()));
        self
    }
}

impl Default for MemorySources {
    fn default() -> Self {
        Self::new()
    }
}

impl Sources for MemorySources {
    fn load(self) -> Result<Vec<SourceFile>> {
        Ok(self
            .0
            .into_iter()
            .map(|(path, content)| SourceFile {
                path,
                content: normalize_newlines(&content),
            })
            .collect())
    }
}

/// Recursive directory walker filtering by language, globs and `.gitignore`.
///
/// Include patterns take priority over both `.gitignore` and exclude patterns.
/// Patterns match the path relative to the root; `*` also matches `/`.
#[cfg(feature = "walk")]
pub struct WalkSources {
    root: PathBuf,
    language: Option<Language>,
    include: Vec<String>,
    exclude: Vec<String>,
    gitignore: bool,
}

#[cfg(feature = "walk")]
impl WalkSources {
    /// Create a walker for the given root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            language: None,
            include: Vec::new(),
            exclude: Vec::new(),
            gitignore: true,
        }
    }

    /// Only keep files with one of the language's extensions
    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    /// Add include patterns (e.g., `["vendor/*.c"]`)
    pub fn include(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.include.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Add exclude patterns (e.g., `["build/*"]`)
    pub fn exclude(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Honour the root `.gitignore` (on by default)
    pub fn gitignore(mut self, enabled: bool) -> Self {
        self.gitignore = enabled;
        self
    }

    /// Matching file paths, sorted
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        use ignore::WalkBuilder;
        use ignore::gitignore::Gitignore;

        let include = build_globs(&self.include)?;
        let exclude = build_globs(&self.exclude)?;

        let gitignore_path = self.root.join(".gitignore");
        let gitignore = if self.gitignore && gitignore_path.is_file() {
            let (matcher, err) = Gitignore::new(&gitignore_path);
            if let Some(err) = err {
                debug!("Partially invalid {}: {}", gitignore_path.display(), err);
            }
            Some(matcher)
        } else {
            None
        };

        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(true)
            .filter_entry(|entry| entry.file_name() != ".git")
            .build();

        let mut found = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    debug!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            if let Some(language) = self.language {
                if path
                    .extension()
                    .is_none_or(|ext| !language.matches_extension(ext))
                {
                    continue;
                }
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            if include.is_match(relative) {
                found.push(path.to_path_buf());
                continue;
            }
            if let Some(matcher) = &gitignore {
                if matcher
                    .matched_path_or_any_parents(relative, false)
                    .is_ignore()
                {
                    continue;
                }
            }
            if exclude.is_match(relative) {
                continue;
            }
            found.push(path.to_path_buf());
        }

        found.sort();
        Ok(found)
    }
}

#[cfg(feature = "walk")]
fn build_globs(patterns: &[String]) -> Result<globset::GlobSet> {
    let mut builder = globset::GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::Glob::new(&pattern.replace('\\', "/"))
            .wrap_err_with(|| format!("Invalid glob pattern: {}", pattern))?;
        builder.add(glob);
    }
    builder.build().wrap_err("Failed to build glob set")
}

#[cfg(feature = "walk")]
impl Sources for WalkSources {
    fn load(self) -> Result<Vec<SourceFile>> {
        PathSources::new(self.discover()?).load()
    }
}
