//! Grammar-aware comment scanning
//!
//! [`scan`] parses a normalized source text with the language's tree-sitter
//! grammar, copies the tree into a [`SyntaxTree`] arena and collects every
//! comment node (line comments, block comments and docstrings) in document
//! order.

use crate::language::{DocstringRule, Grammar, Language};
use crate::position::{Position, char_column, end_of_text};
use crate::scope::{Scope, find_associated_scope};
use crate::tree::{NodeId, SyntaxTree};
use eyre::Result;

/// The syntactic flavour of a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentKind {
    /// `//`, `#` and similar single-line comments
    Line,
    /// `/* ... */` comments
    Block,
    /// Documentation attached to the enclosing unit (Python docstrings,
    /// Rust inner doc comments)
    Docstring,
}

impl CommentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentKind::Line => "line",
            CommentKind::Block => "block",
            CommentKind::Docstring => "docstring",
        }
    }

    /// Docstrings only ever document their enclosing unit
    pub fn is_docstring(&self) -> bool {
        matches!(self, CommentKind::Docstring)
    }
}

/// A located span of comment text. Created once per scan and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Arena node of the comment
    pub node: NodeId,
    pub kind: CommentKind,
    /// Comment text without a trailing newline
    pub text: String,
    pub start_byte: usize,
    pub end_byte: usize,
    /// Absolute start in the file (character column)
    pub start: Position,
    /// Absolute end in the file (character column)
    pub end: Position,
}

impl Comment {
    /// Whether the comment spans a single source row
    pub fn is_single_line(&self) -> bool {
        self.start.row == self.end.row
    }
}

/// Result of scanning one source text
#[derive(Debug, Clone)]
pub struct ScannedSource {
    pub language: Language,
    pub tree: SyntaxTree,
    pub comments: Vec<Comment>,
}

impl ScannedSource {
    /// Scope documented by `comment`, see [`find_associated_scope`]
    pub fn scope_of(&self, comment: &Comment, source: &str) -> Option<Scope> {
        find_associated_scope(&self.tree, comment, self.language)
            .map(|id| Scope::from_node(&self.tree, id, source))
    }
}

/// Scan `source` for comments.
///
/// `source` is expected to be newline-normalized (see [`crate::text::decode_source`]).
pub fn scan(source: &str, language: Language) -> Result<ScannedSource> {
    let mut parser = language.parser()?;
    let Some(parsed) = parser.parse(source, None) else {
        eyre::bail!("{} parser produced no tree", language);
    };
    let tree = SyntaxTree::from_tree_sitter(parsed.root_node());
    let grammar = language.grammar();

    let mut comments = Vec::new();
    for id in tree.preorder() {
        let Some(kind) = classify(&tree, id, source, grammar) else {
            continue;
        };
        if let Some(comment) = build_comment(&tree, id, kind, source) {
            comments.push(comment);
        }
    }
    comments.sort_by_key(|c| c.start_byte);

    Ok(ScannedSource {
        language,
        tree,
        comments,
    })
}

fn classify(tree: &SyntaxTree, id: NodeId, source: &str, grammar: &Grammar) -> Option<CommentKind> {
    let node = tree.node(id);

    if grammar.comment_kinds.contains(&node.kind) {
        let text = tree.text(id, source);
        let kind = match grammar.docstrings {
            DocstringRule::RustInnerDoc if text.starts_with("//!") || text.starts_with("/*!") => {
                CommentKind::Docstring
            }
            _ if text.starts_with("/*") => CommentKind::Block,
            _ => CommentKind::Line,
        };
        return Some(kind);
    }

    if grammar.docstrings == DocstringRule::PythonString && is_python_docstring(tree, id) {
        return Some(CommentKind::Docstring);
    }

    None
}

/// A string-literal expression statement directly inside a module, or directly
/// inside the body block of a function or class.
fn is_python_docstring(tree: &SyntaxTree, id: NodeId) -> bool {
    let node = tree.node(id);
    if node.kind != "expression_statement" {
        return false;
    }
    let is_string = matches!(
        tree.children(id).first().map(|&c| tree.node(c).kind),
        Some("string" | "concatenated_string")
    );
    if !is_string || tree.children(id).len() != 1 {
        return false;
    }

    let Some(parent) = tree.parent(id) else {
        return false;
    };
    match tree.node(parent).kind {
        "module" => true,
        "block" => tree.parent(parent).is_some_and(|owner| {
            matches!(
                tree.node(owner).kind,
                "function_definition" | "class_definition"
            )
        }),
        _ => false,
    }
}

fn build_comment(tree: &SyntaxTree, id: NodeId, kind: CommentKind, source: &str) -> Option<Comment> {
    let node = tree.node(id);
    let raw = tree.text(id, source);
    // Some grammars include the terminating newline in line comments
    let text = raw.trim_end_matches('\n');
    if text.trim().is_empty() {
        return None;
    }

    let line_start = node.start_byte - node.start.column;
    let line_prefix = source.get(line_start..node.start_byte).unwrap_or("");
    let start = Position::new(
        node.start.row,
        char_column(line_prefix, line_prefix.len()),
    );
    let end = end_of_text(start, text);

    Some(Comment {
        node: id,
        kind,
        text: text.to_string(),
        start_byte: node.start_byte,
        end_byte: node.start_byte + text.len(),
        start,
        end,
    })
}
