//! Directive block parser
//!
//! Parses the small reStructuredText subset found between rst markers:
//!
//! ```text
//! .. impl:: Parse the header
//!    continued title
//!    :id: IMPL_1
//!    :links: SPEC_1, SPEC_2
//!
//!    Free-form content.
//! ```
//!
//! The header names the directive type and an optional inline title. Indented
//! lines right after it continue the title until the first option line.
//! Options need a title. Content follows after a blank line.

use crate::oneline::{FieldValue, NeedFields};

/// Default indentation of option and content lines
pub const DEFAULT_INDENT: usize = 3;

/// A parsed directive block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Directive {
    pub kind: String,
    pub title: Option<String>,
    /// Options in declaration order; `None` for options without value
    pub options: Vec<(String, Option<String>)>,
    pub content: Option<String>,
}

impl Directive {
    pub fn option(&self, name: &str) -> Option<Option<&str>> {
        self.options
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_deref())
    }

    /// Flatten into need fields: `type`, `title`, `content`, then options.
    ///
    /// Options named in `link_options` become lists, split on commas.
    pub fn to_need(&self, link_options: &[String]) -> NeedFields {
        let mut fields = NeedFields::new();
        fields.insert("type", FieldValue::from(self.kind.as_str()));
        if let Some(title) = &self.title {
            fields.insert("title", FieldValue::from(title.as_str()));
        }
        if let Some(content) = &self.content {
            fields.insert("content", FieldValue::from(content.as_str()));
        }
        for (name, value) in &self.options {
            let value = match value {
                Some(v) if link_options.iter().any(|l| l == name) => FieldValue::List(
                    v.split(',')
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .map(str::to_string)
                        .collect(),
                ),
                Some(v) => FieldValue::from(v.as_str()),
                None => FieldValue::Null,
            };
            fields.insert(name.clone(), value);
        }
        fields
    }
}

/// A grammar violation in a directive block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveError {
    /// 1-based line in the preprocessed block
    pub line: usize,
    /// 1-based character column
    pub column: usize,
    /// What the parser expected at that position
    pub expected: String,
    /// The offending line with a caret under the column
    pub context: String,
}

impl std::fmt::Display for DirectiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unexpected input at line {}, column {}. Expected {}",
            self.line, self.column, self.expected
        )
    }
}

impl std::error::Error for DirectiveError {}

/// Normalize a directive block before parsing.
///
/// The column of `..` on the first line is removed from every line so
/// indentation becomes relative to the directive marker. Surrounding
/// whitespace is stripped and a trailing newline is guaranteed. Text without
/// `..` on its first line is returned unchanged.
pub fn preprocess(text: &str) -> String {
    let Some(first) = text.lines().next() else {
        return text.to_string();
    };
    let Some(marker_idx) = first.find("..") else {
        return text.to_string();
    };
    let shift = first[..marker_idx].chars().count();

    let stripped: Vec<&str> = text
        .lines()
        .map(|line| match line.char_indices().nth(shift) {
            Some((byte, _)) => &line[byte..],
            None => "",
        })
        .collect();
    let mut out = stripped.join("\n").trim().to_string();
    out.push('\n');
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Title,
    Options,
    Content,
}

/// Parse a directive block with option and content lines indented by `indent` spaces
pub fn parse_directive(text: &str, indent: usize) -> Result<Directive, DirectiveError> {
    let processed = preprocess(text);
    let lines: Vec<&str> = processed.lines().collect();
    let error = |line: usize, column: usize, expected: &str| {
        let source_line = lines.get(line - 1).copied().unwrap_or("");
        DirectiveError {
            line,
            column,
            expected: expected.to_string(),
            context: format!("{}\n{}^", source_line, " ".repeat(column.saturating_sub(1))),
        }
    };

    let Some(header) = lines.first() else {
        return Err(error(1, 1, "'..'"));
    };
    let (kind, inline_title) =
        parse_header(header).map_err(|(column, expected)| error(1, column, expected))?;

    let mut title_parts: Vec<&str> = inline_title.into_iter().collect();
    let mut options = Vec::new();
    let mut content: Vec<&str> = Vec::new();
    let mut section = Section::Title;

    for (idx, line) in lines.iter().enumerate().skip(1) {
        let lineno = idx + 1;
        let blank = line.trim().is_empty();

        if section == Section::Content {
            if blank {
                content.push("");
                continue;
            }
            let body = strip_indent(line, indent).ok_or_else(|| {
                error(lineno, 1, &format!("{} spaces of indentation", indent))
            })?;
            content.push(body.trim_end());
            continue;
        }

        if blank {
            section = Section::Content;
            continue;
        }

        let body = strip_indent(line, indent)
            .ok_or_else(|| error(lineno, 1, &format!("{} spaces of indentation", indent)))?;

        if let Some((name, value)) = parse_option(body) {
            if title_parts.is_empty() {
                return Err(error(lineno, indent + 1, "a title before options"));
            }
            options.push((name.to_string(), value.map(str::to_string)));
            section = Section::Options;
            continue;
        }

        if section == Section::Options {
            return Err(error(lineno, indent + 1, "an option or a blank line"));
        }
        if let Some(pos) = find_option_pattern(body) {
            let column = indent + body[..pos].chars().count() + 1;
            return Err(error(lineno, column, "title text without ':name:'"));
        }
        title_parts.push(body.trim());
    }

    let title = (!title_parts.is_empty()).then(|| title_parts.join(" "));
    let content = (!content.is_empty()).then(|| content.join("\n"));

    Ok(Directive {
        kind: kind.to_string(),
        title,
        options,
        content,
    })
}

/// `[WS] ".." WS NAME "::" [title]`. Errors carry a 1-based column.
fn parse_header(line: &str) -> Result<(&str, Option<&str>), (usize, &'static str)> {
    let column = |rest: &str| line[..line.len() - rest.len()].chars().count() + 1;

    let rest = line.trim_start_matches([' ', '\t']);
    let Some(rest) = rest.strip_prefix("..") else {
        return Err((column(rest), "'..'"));
    };
    let after_ws = rest.trim_start_matches([' ', '\t']);
    if after_ws.len() == rest.len() {
        return Err((column(rest), "whitespace"));
    }

    let name_len = after_ws
        .find(|c: char| !is_name_char(c))
        .unwrap_or(after_ws.len());
    if name_len == 0 {
        return Err((column(after_ws), "a directive name"));
    }
    let (name, rest) = after_ws.split_at(name_len);
    let Some(rest) = rest.strip_prefix("::") else {
        return Err((column(rest), "'::'"));
    };

    let title = rest.trim();
    if title.is_empty() {
        return Ok((name, None));
    }
    if let Some(pos) = find_option_pattern(rest) {
        return Err((column(&rest[pos..]), "title text without ':name:'"));
    }
    Ok((name, Some(title)))
}

/// `":" NAME ":" [WS] [VALUE]`
fn parse_option(body: &str) -> Option<(&str, Option<&str>)> {
    let rest = body.strip_prefix(':')?;
    let name_len = rest.find(|c: char| !is_name_char(c))?;
    if name_len == 0 {
        return None;
    }
    let (name, rest) = rest.split_at(name_len);
    let value = rest.strip_prefix(':')?.trim();
    Some((name, (!value.is_empty()).then_some(value)))
}

/// Byte index of the first `:name:` occurrence
fn find_option_pattern(text: &str) -> Option<usize> {
    text.match_indices(':').map(|(idx, _)| idx).find(|&idx| {
        let rest = &text[idx + 1..];
        let name_len = rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len());
        name_len > 0 && rest[name_len..].starts_with(':')
    })
}

fn strip_indent(line: &str, indent: usize) -> Option<&str> {
    let prefix = line.get(..indent)?;
    prefix.bytes().all(|b| b == b' ').then(|| &line[indent..])
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Directive {
        match parse_directive(text, DEFAULT_INDENT) {
            Ok(d) => d,
            Err(e) => panic!("failed to parse {:?}: {}\n{}", text, e, e.context),
        }
    }

    fn opts(list: &[(&str, Option<&str>)]) -> Vec<(String, Option<String>)> {
        list.iter()
            .map(|(n, v)| (n.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn test_minimal_directive() {
        let d = parse(".. req::\n");
        assert_eq!(d.kind, "req");
        assert_eq!(d.title, None);
        assert!(d.options.is_empty());
        assert_eq!(d.content, None);
    }

    #[test]
    fn test_inline_title() {
        assert_eq!(parse(".. req:: title1\n").title.as_deref(), Some("title1"));
        assert_eq!(
            parse(".. req:: title with spaces   \n").title.as_deref(),
            Some("title with spaces")
        );
        assert_eq!(
            parse(".. req:: Función de exportación 导出功能\n").title.as_deref(),
            Some("Función de exportación 导出功能")
        );
    }

    #[test]
    fn test_multi_line_titles_are_merged() {
        let d = parse(".. req:: multi-line title1\n   still title2\n   still title3\n");
        assert_eq!(
            d.title.as_deref(),
            Some("multi-line title1 still title2 still title3")
        );

        let d = parse(".. req:: \n   multi-line title1\n   still title2\n   still title3\n");
        assert_eq!(
            d.title.as_deref(),
            Some("multi-line title1 still title2 still title3")
        );
    }

    #[test]
    fn test_title_continuation_stops_at_option() {
        let d = parse(".. req:: \n   multi-line title1\n   still title2\n   :option:\n");
        assert_eq!(d.title.as_deref(), Some("multi-line title1 still title2"));
        assert_eq!(d.options, opts(&[("option", None)]));

        let d = parse(".. impl:: Initial title\n   continuation of title\n   :status: active\n");
        assert_eq!(d.title.as_deref(), Some("Initial title continuation of title"));
        assert_eq!(d.options, opts(&[("status", Some("active"))]));
    }

    #[test]
    fn test_title_and_content() {
        let d = parse(
            ".. impl:: no options but content\n\n   This is the implementation content.\n   It spans multiple lines.\n",
        );
        assert_eq!(d.title.as_deref(), Some("no options but content"));
        assert_eq!(
            d.content.as_deref(),
            Some("This is the implementation content.\nIt spans multiple lines.")
        );
    }

    #[test]
    fn test_title_options_and_content() {
        let d = parse(
            ".. spec:: API Specification\n   :version: 1.0\n   :author: Dev Team\n\n   This specification defines the REST API endpoints.\n",
        );
        assert_eq!(d.kind, "spec");
        assert_eq!(d.title.as_deref(), Some("API Specification"));
        assert_eq!(
            d.options,
            opts(&[("version", Some("1.0")), ("author", Some("Dev Team"))])
        );
        assert_eq!(
            d.content.as_deref(),
            Some("This specification defines the REST API endpoints.")
        );
    }

    #[test]
    fn test_option_values() {
        let d = parse(".. test:: Test Case\n   :status:\n   :priority: low\n");
        assert_eq!(d.options, opts(&[("status", None), ("priority", Some("low"))]));

        let d = parse(".. test:: Test\n   :tag1:\n   :tag2:\n   :tag3:\n");
        assert_eq!(d.options, opts(&[("tag1", None), ("tag2", None), ("tag3", None)]));

        let d = parse(
            ".. impl:: Feature\n   :link: https://example.com/issue#123\n   :tags: feature,ui,high-priority\n",
        );
        assert_eq!(d.option("link"), Some(Some("https://example.com/issue#123")));
        assert_eq!(d.option("tags"), Some(Some("feature,ui,high-priority")));

        let d = parse(".. req:: Requirement\n   :time: 10:30 AM\n");
        assert_eq!(d.option("time"), Some(Some("10:30 AM")));
    }

    #[test]
    fn test_single_colons_in_title() {
        let d = parse(".. impl:: Feature #123: Export\n   :status: in-progress\n");
        assert_eq!(d.title.as_deref(), Some("Feature #123: Export"));
        assert_eq!(d.option("status"), Some(Some("in-progress")));
    }

    #[test]
    fn test_content_paragraphs() {
        let d = parse(
            ".. impl:: Feature\n\n   First paragraph.\n   Still first paragraph.\n\n   Second paragraph here.\n   Still second paragraph.\n",
        );
        assert_eq!(
            d.content.as_deref(),
            Some("First paragraph.\nStill first paragraph.\n\nSecond paragraph here.\nStill second paragraph.")
        );
    }

    #[test]
    fn test_all_sections() {
        let d = parse(
            ".. spec:: Main Title\n   Title continuation\n   :version: 2.0\n   :author: Team\n\n   Content paragraph one.\n   Content paragraph two.\n",
        );
        assert_eq!(d.title.as_deref(), Some("Main Title Title continuation"));
        assert_eq!(d.options, opts(&[("version", Some("2.0")), ("author", Some("Team"))]));
        assert_eq!(
            d.content.as_deref(),
            Some("Content paragraph one.\nContent paragraph two.")
        );
    }

    #[test]
    fn test_content_without_title() {
        let d = parse(".. note::\n\n   only content\n");
        assert_eq!(d.title, None);
        assert_eq!(d.content.as_deref(), Some("only content"));
    }

    #[test]
    fn test_rejected_blocks() {
        for text in [
            ".. :: Missing type\n",
            ".. impl:: Title\n:option: value\n",
            ".. spec:: Title\n   :option: value\n   Content without blank line.\n",
            ".. re@q:: Invalid type\n",
            ".. req:: :notanoption:\n",
            ".. impl:: Title\nContent not indented properly.\n",
            ".. req:: \n   :notanoption:\n",
            "",
        ] {
            assert!(
                parse_directive(text, DEFAULT_INDENT).is_err(),
                "expected {:?} to be rejected",
                text
            );
        }
    }

    #[test]
    fn test_error_position_and_context() {
        let err = parse_directive(".. re@q:: Invalid type\n", DEFAULT_INDENT).unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 6);
        assert_eq!(err.expected, "'::'");
        assert_eq!(err.context, ".. re@q:: Invalid type\n     ^");

        let err = parse_directive(".. impl:: Title\nContent\n", DEFAULT_INDENT).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 1);
        assert_eq!(
            err.to_string(),
            "Unexpected input at line 2, column 1. Expected 3 spaces of indentation"
        );
    }

    #[test]
    fn test_custom_indent() {
        let d = parse_directive(".. impl:: T\n  :id: X\n\n  body\n", 2).unwrap();
        assert_eq!(d.option("id"), Some(Some("X")));
        assert_eq!(d.content.as_deref(), Some("body"));
    }

    #[test]
    fn test_preprocess_relative_indentation() {
        let text = "  .. impl:: T\n     :id: X\n";
        assert_eq!(preprocess(text), ".. impl:: T\n   :id: X\n");
        let d = parse_directive(text, DEFAULT_INDENT).unwrap();
        assert_eq!(d.option("id"), Some(Some("X")));
        assert_eq!(preprocess("no marker"), "no marker");
    }

    #[test]
    fn test_to_need_splits_link_options() {
        let d = parse(".. impl:: T\n   :id: IMPL_1\n   :links: A, B,,C \n   :flag:\n");
        let need = d.to_need(&["links".to_string()]);
        let json = serde_json::to_value(&need).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "impl",
                "title": "T",
                "id": "IMPL_1",
                "links": ["A", "B", "C"],
                "flag": null,
            })
        );
    }

    #[test]
    fn test_link_option_with_blank_items() {
        let d = parse(".. impl:: T\n   :links: A, , B,\n   :satisfies: ,\n   :tags: a, , b\n");
        let need = d.to_need(&["links".to_string(), "satisfies".to_string()]);
        assert_eq!(
            need.get("links"),
            Some(&FieldValue::List(vec!["A".to_string(), "B".to_string()]))
        );
        assert_eq!(need.get("satisfies"), Some(&FieldValue::List(vec![])));
        // Options outside link_options keep their raw value
        assert_eq!(need.get("tags"), Some(&FieldValue::from("a, , b")));
    }
}
