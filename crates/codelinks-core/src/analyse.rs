//! Analysis orchestration
//!
//! [`SourceAnalyse`] scans every source file, runs the enabled extractors on
//! each comment and merges the results into the published record order.

use crate::anchors::extract_anchors;
use crate::comments::{Comment, scan};
use crate::config::AnalyseConfig;
use crate::directive::parse_directive;
use crate::git::GitInfo;
use crate::oneline::parse_oneline;
use crate::position::{SourceMap, absolute_column};
use crate::records::{ExtractedRecord, RecordPayload, merge_records};
use crate::rst::find_marked_rst;
use crate::sources::{SourceFile, Sources};
use crate::warnings::{AnalyseWarning, WarningType};
use eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::info;

/// Counts of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisStats {
    pub files: usize,
    pub comments: usize,
    pub need_id_refs: usize,
    pub oneline_needs: usize,
    pub marked_rst: usize,
    pub warnings: usize,
}

/// Output of [`SourceAnalyse::run`]
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    pub records: Vec<ExtractedRecord>,
    pub warnings: Vec<AnalyseWarning>,
    pub stats: AnalysisStats,
}

/// Records and warnings of one file, before merging
#[derive(Debug, Clone, Default)]
pub struct FileAnalysis {
    pub comments: usize,
    pub anchors: Vec<ExtractedRecord>,
    pub oneline: Vec<ExtractedRecord>,
    pub rst: Vec<ExtractedRecord>,
    pub warnings: Vec<AnalyseWarning>,
}

/// Analysis of one project
#[derive(Debug, Clone)]
pub struct SourceAnalyse {
    config: AnalyseConfig,
    git: GitInfo,
    project_path: PathBuf,
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    parallel: bool,
}

impl SourceAnalyse {
    /// Resolve git metadata once for the whole run
    pub fn new(config: AnalyseConfig) -> Self {
        let git = GitInfo::resolve(config.git_root.as_deref(), &config.src_dir);
        Self::with_git(config, git)
    }

    /// Use already resolved git metadata
    pub fn with_git(config: AnalyseConfig, git: GitInfo) -> Self {
        let project_path = git.root.clone().unwrap_or_else(|| config.src_dir.clone());
        Self {
            config,
            git,
            project_path,
            parallel: true,
        }
    }

    /// Scan files on the rayon pool (default). Has no effect without the
    /// `parallel` feature.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn config(&self) -> &AnalyseConfig {
        &self.config
    }

    pub fn git(&self) -> &GitInfo {
        &self.git
    }

    /// Load `sources`, extract from every comment and merge the records
    pub fn run(&self, sources: impl Sources) -> Result<AnalysisResult> {
        let files = sources.load()?;
        info!("Source files loaded: {}", files.len());

        // Both paths keep discovery order
        #[cfg(feature = "parallel")]
        let analysed: Vec<FileAnalysis> = if self.parallel {
            use rayon::prelude::*;
            files
                .par_iter()
                .map(|file| self.analyse_file(file))
                .collect::<Result<_>>()?
        } else {
            self.analyse_sequential(&files)?
        };

        #[cfg(not(feature = "parallel"))]
        let analysed: Vec<FileAnalysis> = self.analyse_sequential(&files)?;

        let mut stats = AnalysisStats {
            files: files.len(),
            ..Default::default()
        };
        let mut anchors = Vec::new();
        let mut oneline = Vec::new();
        let mut rst = Vec::new();
        let mut warnings = Vec::new();
        for file in analysed {
            stats.comments += file.comments;
            anchors.extend(file.anchors);
            oneline.extend(file.oneline);
            rst.extend(file.rst);
            warnings.extend(file.warnings);
        }
        stats.need_id_refs = anchors.len();
        stats.oneline_needs = oneline.len();
        stats.marked_rst = rst.len();
        stats.warnings = warnings.len();

        info!("Source comments extracted: {}", stats.comments);
        if self.config.get_need_id_refs {
            info!("Need-id-refs extracted: {}", stats.need_id_refs);
        }
        if self.config.get_oneline_needs {
            info!("Oneline needs extracted: {}", stats.oneline_needs);
        }
        if self.config.get_rst {
            info!("Marked rst extracted: {}", stats.marked_rst);
        }

        Ok(AnalysisResult {
            records: merge_records(anchors, oneline, rst),
            warnings,
            stats,
        })
    }

    fn analyse_sequential(&self, files: &[SourceFile]) -> Result<Vec<FileAnalysis>> {
        files.iter().map(|file| self.analyse_file(file)).collect()
    }

    /// Run the enabled extractors over one file
    pub fn analyse_file(&self, file: &SourceFile) -> Result<FileAnalysis> {
        let scanned = scan(&file.content, self.config.language)
            .wrap_err_with(|| format!("Failed to scan {}", file.path.display()))?;

        let mut out = FileAnalysis {
            comments: scanned.comments.len(),
            ..Default::default()
        };
        for comment in &scanned.comments {
            let ctx = CommentContext {
                path: &file.path,
                comment,
                scope: scanned.scope_of(comment, &file.content).map(|s| s.text),
            };
            if self.config.get_need_id_refs {
                self.extract_need_id_refs(&ctx, &mut out);
            }
            if self.config.get_oneline_needs {
                self.extract_oneline_needs(&ctx, &mut out);
            }
            if self.config.get_rst {
                self.extract_marked_rst(&ctx, &mut out);
            }
        }
        Ok(out)
    }

    fn extract_need_id_refs(&self, ctx: &CommentContext<'_>, out: &mut FileAnalysis) {
        let start = ctx.comment.start;
        for anchor in extract_anchors(&ctx.comment.text, &self.config.need_id_refs.markers) {
            let source_map = SourceMap::on_row(
                start.row + anchor.row_offset,
                absolute_column(start, anchor.row_offset, anchor.start_column),
                absolute_column(start, anchor.row_offset, anchor.end_column),
            );
            out.anchors.push(self.record(
                ctx,
                source_map,
                RecordPayload::NeedIdRefs {
                    marker: anchor.marker,
                    need_ids: anchor.need_ids,
                },
            ));
        }
    }

    fn extract_oneline_needs(&self, ctx: &CommentContext<'_>, out: &mut FileAnalysis) {
        let start = ctx.comment.start;
        let mut lines: Vec<String> = ctx
            .comment
            .text
            .split_inclusive('\n')
            .map(str::to_string)
            .collect();
        // A single-line comment carries no newline of its own
        if let [only] = lines.as_mut_slice() {
            only.push('\n');
        }

        for (row_offset, line) in lines.iter().enumerate() {
            let row = start.row + row_offset;
            match parse_oneline(line, &self.config.oneline_style) {
                None => {}
                Some(Ok(need)) => {
                    let source_map = SourceMap::on_row(
                        row,
                        absolute_column(start, row_offset, need.start_column),
                        absolute_column(start, row_offset, need.end_column),
                    );
                    out.oneline
                        .push(self.record(ctx, source_map, RecordPayload::Need { need: need.fields }));
                }
                Some(Err(warning)) => out.warnings.push(AnalyseWarning {
                    file_path: ctx.path.display().to_string(),
                    lineno: row + 1,
                    msg: warning.msg,
                    kind: WarningType::Need,
                    sub_type: warning.kind.as_str().to_string(),
                }),
            }
        }
    }

    fn extract_marked_rst(&self, ctx: &CommentContext<'_>, out: &mut FileAnalysis) {
        let style = &self.config.marked_rst;
        let Some(marked) = find_marked_rst(&ctx.comment.text, ctx.comment.start, style) else {
            return;
        };

        let need = match parse_directive(&marked.text, style.indented_spaces) {
            Ok(directive) => Some(directive.to_need(&style.link_options)),
            Err(err) => {
                out.warnings.push(AnalyseWarning {
                    file_path: ctx.path.display().to_string(),
                    lineno: marked.source_map.start.row + err.line,
                    msg: format!("{}\n{}", err.context, err),
                    kind: WarningType::Rst,
                    sub_type: "parsing_error".to_string(),
                });
                None
            }
        };

        out.rst.push(self.record(
            ctx,
            marked.source_map,
            RecordPayload::Rst {
                rst: marked.text,
                need,
            },
        ));
    }

    fn record(
        &self,
        ctx: &CommentContext<'_>,
        source_map: SourceMap,
        payload: RecordPayload,
    ) -> ExtractedRecord {
        ExtractedRecord {
            filepath: ctx.path.to_path_buf(),
            remote_url: self
                .git
                .link(&self.project_path, ctx.path, source_map.start.row + 1),
            source_map,
            comment: SourceMap::new(ctx.comment.start, ctx.comment.end),
            tagged_scope: ctx.scope.clone(),
            payload,
        }
    }
}

struct CommentContext<'a> {
    path: &'a Path,
    comment: &'a Comment,
    scope: Option<String>,
}
