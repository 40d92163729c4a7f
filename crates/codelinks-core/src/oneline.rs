//! One-line need records
//!
//! A one-line record packs a whole need into a single comment line:
//!
//! ```text
//! // [[IMPL_1, Parse the header, impl, [SPEC_1, SPEC_2]]]
//! ```
//!
//! The text between a start and an end sequence is split into positional
//! fields by a configurable character. Fields are described by a
//! [`FieldSchema`]; `list[str]` fields are written in brackets and may contain
//! the split character. A backslash escapes the split character, brackets and
//! itself.

use crate::position::char_column;
use serde::{Deserialize, Serialize};

/// Escape character of the one-line syntax
pub const ESCAPE: char = '\\';

/// Names every field schema must define
pub const DEFAULT_REQUIRED_FIELDS: [&str; 2] = ["title", "type"];

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldType {
    #[default]
    Str,
    ListStr,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Str => "str",
            FieldType::ListStr => "list[str]",
        }
    }

    pub fn parse(s: &str) -> Option<FieldType> {
        match s {
            "str" => Some(FieldType::Str),
            "list[str]" => Some(FieldType::ListStr),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a resolved field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Str(String),
    List(Vec<String>),
    /// An option declared without a value (directive options only)
    Null,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    fn matches(&self, field_type: FieldType) -> bool {
        matches!(
            (self, field_type),
            (FieldValue::Str(_), FieldType::Str) | (FieldValue::List(_), FieldType::ListStr)
        )
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// Ordered field name → value mapping. Serializes as a JSON object in field order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NeedFields(Vec<(String, FieldValue)>);

impl NeedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field, keeping the original position on replace
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl Serialize for NeedFields {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(n, v)| (n, v)))
    }
}

/// One field of a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub default: Option<FieldValue>,
}

/// Validated, immutable list of field descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    fields: Vec<FieldDescriptor>,
}

impl FieldSchema {
    pub fn builder() -> FieldSchemaBuilder {
        FieldSchemaBuilder::new()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Fields without a default must always be given
    pub fn min_fields(&self) -> usize {
        self.fields.iter().filter(|f| f.default.is_none()).count()
    }

    pub fn max_fields(&self) -> usize {
        self.fields.len()
    }

    /// Indices of `list[str]` fields
    pub fn list_positions(&self) -> Vec<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.field_type == FieldType::ListStr)
            .map(|(idx, _)| idx)
            .collect()
    }
}

impl Default for FieldSchema {
    /// `title, id, type = impl, links: list[str] = []`
    fn default() -> Self {
        Self {
            fields: vec![
                FieldDescriptor {
                    name: "title".into(),
                    field_type: FieldType::Str,
                    default: None,
                },
                FieldDescriptor {
                    name: "id".into(),
                    field_type: FieldType::Str,
                    default: None,
                },
                FieldDescriptor {
                    name: "type".into(),
                    field_type: FieldType::Str,
                    default: Some(FieldValue::from("impl")),
                },
                FieldDescriptor {
                    name: "links".into(),
                    field_type: FieldType::ListStr,
                    default: Some(FieldValue::List(Vec::new())),
                },
            ],
        }
    }
}

/// Collects field descriptors and validates them into a [`FieldSchema`]
#[derive(Debug, Clone)]
pub struct FieldSchemaBuilder {
    fields: Vec<FieldDescriptor>,
    required: Vec<String>,
}

impl FieldSchemaBuilder {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            required: DEFAULT_REQUIRED_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Add a field without default
    pub fn field(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.descriptor(FieldDescriptor {
            name: name.into(),
            field_type,
            default: None,
        })
    }

    /// Add a field with a default value
    pub fn field_with_default(
        self,
        name: impl Into<String>,
        field_type: FieldType,
        default: impl Into<FieldValue>,
    ) -> Self {
        self.descriptor(FieldDescriptor {
            name: name.into(),
            field_type,
            default: Some(default.into()),
        })
    }

    pub fn descriptor(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields.push(descriptor);
        self
    }

    /// Replace the set of names that must be present
    pub fn required(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.required = names.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and build. Every violation is reported, not just the first.
    pub fn build(self) -> Result<FieldSchema, Vec<String>> {
        let mut errors = Vec::new();

        for field in &self.fields {
            if field.name.trim().is_empty() {
                errors.push(
                    "Schema validation error in need_fields: 'name' must not be empty".to_string(),
                );
            }
            if let Some(default) = &field.default {
                if !default.matches(field.field_type) {
                    let expected = match field.field_type {
                        FieldType::Str => "a string",
                        FieldType::ListStr => "a list of strings",
                    };
                    errors.push(format!(
                        "Schema validation error in need_fields '{}': default must be {} for 'type': '{}'",
                        field.name, expected, field.field_type
                    ));
                }
            }
        }

        let mut missing: Vec<&str> = self
            .required
            .iter()
            .map(String::as_str)
            .filter(|name| !self.fields.iter().any(|f| f.name == *name))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        if !missing.is_empty() {
            let quoted: Vec<String> = missing.iter().map(|m| format!("'{}'", m)).collect();
            errors.push(format!("Missing required fields: [{}]", quoted.join(", ")));
        }

        let mut seen: Vec<&str> = Vec::new();
        for field in &self.fields {
            if seen.contains(&field.name.as_str()) {
                errors.push(format!("Field '{}' is defined multiple times.", field.name));
            }
            seen.push(&field.name);
        }

        if errors.is_empty() {
            Ok(FieldSchema {
                fields: self.fields,
            })
        } else {
            Err(errors)
        }
    }
}

impl Default for FieldSchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Delimiters, split character and schema of the one-line syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneLineStyle {
    pub start_sequence: String,
    pub end_sequence: String,
    pub field_split_char: char,
    pub schema: FieldSchema,
}

impl Default for OneLineStyle {
    /// `@title, id, type, [links]` terminated by the end of the line
    fn default() -> Self {
        Self {
            start_sequence: "@".to_string(),
            end_sequence: "\n".to_string(),
            field_split_char: ',',
            schema: FieldSchema::default(),
        }
    }
}

/// Why a one-line record was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OneLineWarningKind {
    TooManyFields,
    TooFewFields,
    MissingSquareBrackets,
    NotStartOrEndWithSquareBrackets,
    NewlineInField,
}

impl OneLineWarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OneLineWarningKind::TooManyFields => "too_many_fields",
            OneLineWarningKind::TooFewFields => "too_few_fields",
            OneLineWarningKind::MissingSquareBrackets => "missing_square_brackets",
            OneLineWarningKind::NotStartOrEndWithSquareBrackets => {
                "not_start_or_end_with_square_brackets"
            }
            OneLineWarningKind::NewlineInField => "newline_in_field",
        }
    }
}

impl std::fmt::Display for OneLineWarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A malformed one-line record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneLineWarning {
    pub kind: OneLineWarningKind,
    pub msg: String,
}

/// A successfully parsed one-line record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneLineNeed {
    pub fields: NeedFields,
    /// Character column right after the start sequence
    pub start_column: usize,
    /// Character column of the end sequence
    pub end_column: usize,
}

/// Bracket problems of a `list[str]` token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSyntaxError {
    MissingBrackets,
    BracketsNotAtEdges,
}

/// Parse one line.
///
/// Returns `None` when the line holds no record (start or end sequence
/// missing), otherwise the record or the reason it was rejected.
pub fn parse_oneline(line: &str, style: &OneLineStyle) -> Option<Result<OneLineNeed, OneLineWarning>> {
    let start_idx = line.find(style.start_sequence.as_str())?;
    let end_idx = line.rfind(style.end_sequence.as_str())?;

    let content_start = start_idx + style.start_sequence.len();
    let content_end = end_idx.max(content_start);
    let content = &line[content_start..content_end];

    Some(
        resolve_fields(content, style).map(|fields| OneLineNeed {
            fields,
            start_column: char_column(line, content_start),
            end_column: char_column(line, content_end),
        }),
    )
}

fn resolve_fields(content: &str, style: &OneLineStyle) -> Result<NeedFields, OneLineWarning> {
    let schema = &style.schema;
    let tokens: Vec<String> = split_fields(content, style.field_split_char, &schema.list_positions())
        .into_iter()
        .map(|t| t.trim_matches(' ').to_string())
        .collect();

    let min_fields = schema.min_fields();
    let max_fields = schema.max_fields();
    if tokens.len() < min_fields {
        return Err(OneLineWarning {
            kind: OneLineWarningKind::TooFewFields,
            msg: format!(
                "{} given fields. They shall be more than {}",
                tokens.len(),
                min_fields
            ),
        });
    }
    if tokens.len() > max_fields {
        return Err(OneLineWarning {
            kind: OneLineWarningKind::TooManyFields,
            msg: format!(
                "{} given fields. They shall be less than {}",
                tokens.len(),
                max_fields
            ),
        });
    }

    let mut fields = NeedFields::new();
    for (idx, field) in schema.fields().iter().enumerate() {
        let Some(token) = tokens.get(idx) else {
            if let Some(default) = &field.default {
                fields.insert(field.name.clone(), default.clone());
            }
            continue;
        };

        if token.contains('\n') {
            return Err(OneLineWarning {
                kind: OneLineWarningKind::NewlineInField,
                msg: format!(
                    "Field {} has newline character. It is not allowed",
                    field.name
                ),
            });
        }

        let value = match field.field_type {
            FieldType::Str => FieldValue::Str(token.clone()),
            FieldType::ListStr => match parse_list_value(token) {
                Ok(items) => FieldValue::List(items),
                Err(ListSyntaxError::MissingBrackets) => {
                    return Err(OneLineWarning {
                        kind: OneLineWarningKind::MissingSquareBrackets,
                        msg: format!(
                            "Field {} with 'type': '{}' must be given with '[]' brackets",
                            field.name, field.field_type
                        ),
                    });
                }
                Err(ListSyntaxError::BracketsNotAtEdges) => {
                    return Err(OneLineWarning {
                        kind: OneLineWarningKind::NotStartOrEndWithSquareBrackets,
                        msg: format!(
                            "Field {} with 'type': '{}' must start with '[' and end with ']'",
                            field.name, field.field_type
                        ),
                    });
                }
            },
        };
        fields.insert(field.name.clone(), value);
    }

    Ok(fields)
}

/// Parse a bracketed list token such as `[A, B\, C]`.
///
/// The interior is split on `,` with escapes active; items are trimmed and a
/// blank interior is the empty list.
pub fn parse_list_value(token: &str) -> Result<Vec<String>, ListSyntaxError> {
    let (Some(open), Some(close)) = (token.find('['), token.rfind(']')) else {
        return Err(ListSyntaxError::MissingBrackets);
    };
    if open != 0 || close != token.len() - 1 {
        return Err(ListSyntaxError::BracketsNotAtEdges);
    }

    let interior = &token[1..close];
    if interior.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(split_fields(interior, ',', &[])
        .into_iter()
        .map(|item| item.trim().to_string())
        .collect())
}

/// Split `input` on `delimiter`.
///
/// Outside `list[str]` positions the delimiter, `[`, `]` and `\` are special
/// and `\` escapes them; an escape before any other character is kept
/// verbatim. Inside a `list[str]` position (indices in `list_positions`) the
/// backslash is literal and the delimiter does not split while a `[` is
/// waiting for its `]`.
///
/// Bracket state is carried across fields, so an unbalanced bracket changes
/// how later fields split.
pub fn split_fields(input: &str, delimiter: char, list_positions: &[usize]) -> Vec<String> {
    let special = [delimiter, '[', ']', ESCAPE];
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut pending_escape = false;
    let mut expect_closing_bracket = false;

    for ch in input.chars() {
        let in_list_field = list_positions.contains(&fields.len());

        if pending_escape {
            if !special.contains(&ch) {
                field.push(ESCAPE);
            }
            field.push(ch);
            pending_escape = false;
            continue;
        }

        if ch == ESCAPE && !in_list_field {
            pending_escape = true;
            continue;
        }

        if ch == delimiter {
            if in_list_field && expect_closing_bracket {
                field.push(ch);
            } else {
                fields.push(std::mem::take(&mut field));
            }
            continue;
        }

        if in_list_field {
            match ch {
                '[' => expect_closing_bracket = true,
                ']' => expect_closing_bracket = false,
                _ => {}
            }
        }
        field.push(ch);
    }

    if pending_escape {
        field.push(ESCAPE);
    }
    fields.push(field);
    fields
}

/// Write a list value in the bracket syntax read by [`parse_list_value`].
///
/// Commas, brackets and backslashes inside items are escaped. Items are
/// trimmed when read back, and an item containing `]` ends the bracket early
/// when the list sits in a `list[str]` field, so only items without
/// surrounding spaces and without `]` survive a full round trip.
pub fn format_list(items: &[String]) -> String {
    let escaped: Vec<String> = items
        .iter()
        .map(|item| {
            let mut out = String::with_capacity(item.len());
            for ch in item.chars() {
                if matches!(ch, ',' | '[' | ']' | ESCAPE) {
                    out.push(ESCAPE);
                }
                out.push(ch);
            }
            out
        })
        .collect();
    format!("[{}]", escaped.join(", "))
}
