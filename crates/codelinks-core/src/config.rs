//! Analysis configuration
//!
//! The YAML sections below are deserialized with facet and every field is
//! optional. [`AnalyseSection::resolve`] fills in defaults and validates the
//! result; all violations are collected into one [`ConfigError`] so a user
//! sees every problem at once.

use crate::language::Language;
use crate::oneline::{
    ESCAPE, FieldDescriptor, FieldSchema, FieldSchemaBuilder, FieldType, FieldValue,
    OneLineStyle, parse_list_value,
};
use crate::rst::MarkedRstStyle;
use facet::Facet;
use std::path::PathBuf;

/// Default anchor marker
pub const DEFAULT_MARKER: &str = "@need-ids:";

/// `analyse` section of a project
#[derive(Debug, Clone, Default, Facet)]
pub struct AnalyseSection {
    #[facet(default)]
    pub get_need_id_refs: Option<bool>,
    #[facet(default)]
    pub get_oneline_needs: Option<bool>,
    #[facet(default)]
    pub get_rst: Option<bool>,
    /// Overrides the upward search for `.git`, relative to the source directory
    #[facet(default)]
    pub git_root: Option<String>,
    #[facet(default)]
    pub need_id_refs: Option<NeedIdRefsSection>,
    #[facet(default)]
    pub marked_rst: Option<MarkedRstSection>,
    #[facet(default)]
    pub oneline_comment_style: Option<OneLineStyleSection>,
}

#[derive(Debug, Clone, Default, Facet)]
pub struct NeedIdRefsSection {
    #[facet(default)]
    pub markers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Facet)]
pub struct MarkedRstSection {
    #[facet(default)]
    pub start_sequence: Option<String>,
    #[facet(default)]
    pub end_sequence: Option<String>,
    #[facet(default)]
    pub strip_leading_sequences: Option<Vec<String>>,
    #[facet(default)]
    pub indented_spaces: Option<usize>,
    #[facet(default)]
    pub link_options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Facet)]
pub struct OneLineStyleSection {
    #[facet(default)]
    pub start_sequence: Option<String>,
    #[facet(default)]
    pub end_sequence: Option<String>,
    #[facet(default)]
    pub field_split_char: Option<String>,
    #[facet(default)]
    pub needs_fields: Option<Vec<FieldSection>>,
}

/// One entry of `needs_fields`
#[derive(Debug, Clone, Facet)]
pub struct FieldSection {
    pub name: String,
    /// `str` (default) or `list[str]`
    #[facet(rename = "type", default)]
    pub field_type: Option<String>,
    #[facet(default)]
    pub default: Option<FieldDefault>,
}

/// Default of a `needs_fields` entry.
///
/// `list[str]` fields take either a YAML sequence or a string in the
/// one-line list syntax (`"[A, B]"`).
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
#[facet(untagged)]
#[repr(u8)]
pub enum FieldDefault {
    Text(String),
    List(Vec<String>),
}

/// Anchor extraction settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedIdRefsConfig {
    pub markers: Vec<String>,
}

impl Default for NeedIdRefsConfig {
    fn default() -> Self {
        Self {
            markers: vec![DEFAULT_MARKER.to_string()],
        }
    }
}

/// Fully resolved settings of one analysis run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyseConfig {
    pub src_dir: PathBuf,
    pub language: Language,
    pub get_need_id_refs: bool,
    pub get_oneline_needs: bool,
    pub get_rst: bool,
    pub git_root: Option<PathBuf>,
    pub need_id_refs: NeedIdRefsConfig,
    pub oneline_style: OneLineStyle,
    pub marked_rst: MarkedRstStyle,
}

impl AnalyseConfig {
    /// Defaults: anchors on, one-line needs and rst blocks off
    pub fn new(src_dir: impl Into<PathBuf>, language: Language) -> Self {
        Self {
            src_dir: src_dir.into(),
            language,
            get_need_id_refs: true,
            get_oneline_needs: false,
            get_rst: false,
            git_root: None,
            need_id_refs: NeedIdRefsConfig::default(),
            oneline_style: OneLineStyle::default(),
            marked_rst: MarkedRstStyle::default(),
        }
    }

    /// Check markers and sequences. Settings of disabled extractors are only
    /// checked for marker conflicts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut report = Report::default();
        self.check(&mut report);
        report.finish()
    }

    fn check(&self, report: &mut Report) {
        report.analyse.extend(self.marker_conflicts());

        if self.get_need_id_refs {
            if self.need_id_refs.markers.is_empty() {
                report.refs.push("markers must not be empty".to_string());
            }
            if self.need_id_refs.markers.iter().any(String::is_empty) {
                report.refs.push("markers must not contain empty strings".to_string());
            }
        }

        if self.get_oneline_needs {
            let style = &self.oneline_style;
            check_sequences(&style.start_sequence, &style.end_sequence, &mut report.oneline);
            let c = style.field_split_char;
            if matches!(c, '[' | ']' | ESCAPE) || c == '\n' {
                report.oneline.push(format!(
                    "field_split_char {:?} is not allowed, it is part of the one-line syntax",
                    c
                ));
            }
        }

        if self.get_rst {
            let rst = &self.marked_rst;
            check_sequences(&rst.start_sequence, &rst.end_sequence, &mut report.rst);
            if rst.indented_spaces == 0 {
                report.rst.push("indented_spaces must be at least 1".to_string());
            }
            if rst.strip_leading_sequences.iter().any(String::is_empty) {
                report
                    .rst
                    .push("strip_leading_sequences must not contain empty strings".to_string());
            }
        }
    }

    /// Each marker string may only have one meaning
    fn marker_conflicts(&self) -> Vec<String> {
        let mut seen = vec![
            self.oneline_style.start_sequence.as_str(),
            self.oneline_style.end_sequence.as_str(),
        ];
        let mut errors: Vec<String> = Vec::new();

        let candidates = [
            self.marked_rst.start_sequence.as_str(),
            self.marked_rst.end_sequence.as_str(),
        ]
        .into_iter()
        .chain(self.need_id_refs.markers.iter().map(String::as_str));

        for marker in candidates {
            if seen.contains(&marker) {
                let msg = format!("Marker {} is defined multiple times", marker);
                if !errors.contains(&msg) {
                    errors.push(msg);
                }
            } else {
                seen.push(marker);
            }
        }
        errors
    }
}

fn check_sequences(start: &str, end: &str, errors: &mut Vec<String>) {
    if start.is_empty() {
        errors.push("start_sequence must not be empty".to_string());
    }
    if end.is_empty() {
        errors.push("end_sequence must not be empty".to_string());
    }
    if start == end {
        errors.push("start_sequence and end_sequence cannot be the same.".to_string());
    }
}

impl AnalyseSection {
    /// Apply defaults, convert and validate.
    ///
    /// `git_root` is resolved against `src_dir`.
    pub fn resolve(
        self,
        src_dir: impl Into<PathBuf>,
        language: Language,
    ) -> Result<AnalyseConfig, ConfigError> {
        let mut config = AnalyseConfig::new(src_dir, language);
        let mut report = Report::default();

        if let Some(v) = self.get_need_id_refs {
            config.get_need_id_refs = v;
        }
        if let Some(v) = self.get_oneline_needs {
            config.get_oneline_needs = v;
        }
        if let Some(v) = self.get_rst {
            config.get_rst = v;
        }
        config.git_root = self.git_root.map(|root| config.src_dir.join(root));

        if let Some(markers) = self.need_id_refs.and_then(|s| s.markers) {
            config.need_id_refs.markers = markers;
        }

        if let Some(rst) = self.marked_rst {
            let style = &mut config.marked_rst;
            if let Some(v) = rst.start_sequence {
                style.start_sequence = v;
            }
            if let Some(v) = rst.end_sequence {
                style.end_sequence = v;
            }
            if let Some(v) = rst.strip_leading_sequences {
                style.strip_leading_sequences = v;
            }
            if let Some(v) = rst.indented_spaces {
                style.indented_spaces = v;
            }
            if let Some(v) = rst.link_options {
                style.link_options = v;
            }
        }

        if let Some(section) = self.oneline_comment_style {
            let style = &mut config.oneline_style;
            if let Some(v) = section.start_sequence {
                style.start_sequence = v;
            }
            if let Some(v) = section.end_sequence {
                style.end_sequence = v;
            }
            if let Some(v) = section.field_split_char {
                let mut chars = v.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => style.field_split_char = c,
                    _ => report.oneline.push(format!(
                        "field_split_char must be a single character, got {:?}",
                        v
                    )),
                }
            }
            if let Some(fields) = section.needs_fields {
                match build_schema(fields) {
                    Ok(schema) => style.schema = schema,
                    Err(errors) => report.oneline.extend(errors),
                }
            }
        }

        config.check(&mut report);
        report.finish()?;
        Ok(config)
    }
}

fn build_schema(fields: Vec<FieldSection>) -> Result<FieldSchema, Vec<String>> {
    let mut errors = Vec::new();
    let mut builder = FieldSchemaBuilder::new();

    for field in fields {
        let field_type = match field.field_type.as_deref() {
            None => FieldType::Str,
            Some(name) => match FieldType::parse(name) {
                Some(t) => t,
                None => {
                    errors.push(format!(
                        "Schema validation error in need_fields '{}': 'type' must be one of 'str', 'list[str]', got '{}'",
                        field.name, name
                    ));
                    continue;
                }
            },
        };

        let default = match (field.default, field_type) {
            (None, _) => None,
            (Some(FieldDefault::Text(v)), FieldType::Str) => Some(FieldValue::Str(v)),
            (Some(FieldDefault::List(_)), FieldType::Str) => {
                errors.push(format!(
                    "Schema validation error in need_fields '{}': default must be a string for 'type': 'str'",
                    field.name
                ));
                continue;
            }
            (Some(FieldDefault::List(items)), FieldType::ListStr) => Some(FieldValue::List(items)),
            (Some(FieldDefault::Text(v)), FieldType::ListStr) => match parse_list_value(v.trim()) {
                Ok(items) => Some(FieldValue::List(items)),
                Err(_) => {
                    errors.push(format!(
                        "Schema validation error in need_fields '{}': default must be a list of strings for 'type': 'list[str]'",
                        field.name
                    ));
                    continue;
                }
            },
        };

        builder = builder.descriptor(FieldDescriptor {
            name: field.name,
            field_type,
            default,
        });
    }

    match builder.build() {
        Ok(schema) if errors.is_empty() => Ok(schema),
        Ok(_) => Err(errors),
        Err(more) => {
            errors.extend(more);
            Err(errors)
        }
    }
}

/// Invalid configuration; every violation, grouped under section headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub errors: Vec<String>,
}

impl ConfigError {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.errors.join("\n"))
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Default)]
struct Report {
    analyse: Vec<String>,
    oneline: Vec<String>,
    rst: Vec<String>,
    refs: Vec<String>,
}

impl Report {
    fn finish(self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        for (header, group) in [
            ("analyse configuration errors:", self.analyse),
            ("OneLineCommentStyle configuration errors:", self.oneline),
            ("MarkedRst configuration errors:", self.rst),
            ("NeedIdRefs configuration errors:", self.refs),
        ] {
            if !group.is_empty() {
                errors.push(header.to_string());
                errors.extend(group);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::new(errors))
        }
    }
}
