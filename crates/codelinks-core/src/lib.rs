//! codelinks-core - Core library for extracting traceability markers from source comments
//!
//! This crate provides the building blocks for:
//! - Scanning comments (and their enclosing scopes) in C, C++, C#, Python, YAML and Rust sources
//! - Extracting need-ID references after an anchor marker
//! - Parsing one-line needs and marked reStructuredText directive blocks
//! - Linking every record back to its line on GitHub or GitLab
//!
//! # Features
//!
//! - `walk` - Enable [`WalkSources`] for language-, glob- and gitignore-aware discovery (brings in `ignore`)
//! - `parallel` - Enable parallel loading and analysis (brings in `rayon`)
//!
//! # Marker Syntax
//!
//! Three kinds of markers are recognized inside comments:
//!
//! ```cpp
//! // @need-ids: REQ_1, REQ_2
//! void handler() {}
//!
//! // @ Parse the header, IMPL_7, impl, [SPEC_1, SPEC_2]
//!
//! /*
//!  * @rst
//!  * .. impl:: Checksum validation
//!  *    :id: IMPL_8
//!  *    :links: SPEC_3
//!  * @endrst
//!  */
//! ```
//!
//! Anchor markers (`@need-ids:`) are on by default; one-line needs and marked
//! rst blocks are enabled through [`AnalyseConfig`].
//!
//! ```ignore
//! use codelinks_core::{AnalyseConfig, Language, SourceAnalyse, WalkSources};
//!
//! let mut config = AnalyseConfig::new("src", Language::Cpp);
//! config.get_oneline_needs = true;
//! config.validate()?;
//!
//! let result = SourceAnalyse::new(config).run(
//!     WalkSources::new("src")
//!         .language(Language::Cpp)
//!         .exclude(["build/*"]),
//! )?;
//! for warning in &result.warnings {
//!     eprintln!("{warning}");
//! }
//! println!("{}", serde_json::to_string_pretty(&result.records)?);
//! ```
//!
//! # In-Memory Sources (for testing)
//!
//! ```
//! use codelinks_core::{AnalyseConfig, GitInfo, Language, MemorySources, RecordPayload, SourceAnalyse};
//!
//! let config = AnalyseConfig::new(".", Language::C);
//! let analyse = SourceAnalyse::with_git(config, GitInfo::default());
//! let result = analyse
//!     .run(MemorySources::new().add("main.c", "// @need-ids: REQ_1\nint main() {}\n"))
//!     .unwrap();
//!
//! assert_eq!(result.records.len(), 1);
//! match &result.records[0].payload {
//!     RecordPayload::NeedIdRefs { need_ids, .. } => assert_eq!(need_ids, &["REQ_1"]),
//!     other => panic!("unexpected record {other:?}"),
//! }
//! ```

pub mod analyse;
pub mod anchors;
pub mod comments;
pub mod config;
pub mod directive;
pub mod git;
pub mod language;
pub mod oneline;
pub mod position;
pub mod records;
pub mod rst;
pub mod scope;
pub mod sources;
pub mod text;
pub mod tree;
pub mod warnings;

pub use analyse::{AnalysisResult, AnalysisStats, SourceAnalyse};
pub use config::{AnalyseConfig, AnalyseSection, ConfigError};
pub use git::GitInfo;
pub use language::Language;
pub use oneline::{FieldValue, NeedFields};
pub use position::{Position, SourceMap};
pub use records::{ExtractedRecord, RecordPayload};
pub use sources::{MemorySources, PathSources, SourceFile, Sources};
pub use warnings::{AnalyseWarning, WarningType, dump_warnings, load_warnings};

#[cfg(feature = "walk")]
pub use sources::WalkSources;
