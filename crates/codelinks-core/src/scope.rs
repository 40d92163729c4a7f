//! Scope association for comments
//!
//! Comments usually document what follows them, docstrings document what
//! encloses them, and YAML comments are matched positionally against mapping
//! pairs and sequence items.

use crate::comments::Comment;
use crate::language::{Grammar, Language};
use crate::position::{Position, char_column, end_of_text};
use crate::tree::{NodeId, SyntaxTree};

/// The syntactic unit documented by a comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub node: NodeId,
    /// Grammar node kind (e.g. `function_definition`, `block_mapping_pair`)
    pub kind: &'static str,
    /// Source text of the unit
    pub text: String,
    pub start: Position,
    pub end: Position,
}

impl Scope {
    pub fn from_node(tree: &SyntaxTree, id: NodeId, source: &str) -> Self {
        let node = tree.node(id);
        let text = tree.text(id, source);
        let line_start = node.start_byte - node.start.column;
        let prefix = source.get(line_start..node.start_byte).unwrap_or("");
        let start = Position::new(node.start.row, char_column(prefix, prefix.len()));
        Self {
            node: id,
            kind: node.kind,
            text: text.to_string(),
            start,
            end: end_of_text(start, text),
        }
    }
}

/// Find the scope a comment documents.
///
/// Docstrings resolve to their enclosing unit only. Other comments resolve to
/// the next unit after them and fall back to the enclosing one. YAML uses
/// [`find_yaml_scope`].
pub fn find_associated_scope(
    tree: &SyntaxTree,
    comment: &Comment,
    language: Language,
) -> Option<NodeId> {
    if language == Language::Yaml {
        return find_yaml_scope(tree, comment.node);
    }
    let grammar = language.grammar();
    if comment.kind.is_docstring() {
        return find_enclosing_scope(tree, comment.node, grammar);
    }
    find_next_scope(tree, comment.node, grammar)
        .or_else(|| find_enclosing_scope(tree, comment.node, grammar))
}

/// Nearest ancestor whose kind is a scope kind
pub fn find_enclosing_scope(tree: &SyntaxTree, id: NodeId, grammar: &Grammar) -> Option<NodeId> {
    tree.ancestors(id)
        .find(|&ancestor| grammar.scope_kinds.contains(&tree.node(ancestor).kind))
}

/// First following sibling that is a scope, looking one level into generic blocks
pub fn find_next_scope(tree: &SyntaxTree, id: NodeId, grammar: &Grammar) -> Option<NodeId> {
    for sibling in tree.following_siblings(id) {
        let kind = tree.node(sibling).kind;
        if grammar.scope_kinds.contains(&kind) {
            return Some(sibling);
        }
        if grammar.block_kinds.contains(&kind) {
            let inner = tree
                .children(sibling)
                .iter()
                .copied()
                .find(|&child| grammar.scope_kinds.contains(&tree.node(child).kind));
            if inner.is_some() {
                return inner;
            }
        }
    }
    None
}

/// YAML association:
///
/// 1. a previous sibling ending on the comment's row makes the comment inline;
/// 2. otherwise the first structural node after it, descending through
///    containers (documents, block nodes, mappings, sequences);
/// 3. otherwise the nearest mapping pair / sequence item ancestor.
pub fn find_yaml_scope(tree: &SyntaxTree, id: NodeId) -> Option<NodeId> {
    let grammar = Language::Yaml.grammar();
    let comment_row = tree.node(id).start.row;

    if let Some(prev) = tree.prev_sibling(id) {
        if tree.node(prev).end.row == comment_row {
            let structural = std::iter::once(prev)
                .chain(tree.ancestors(prev))
                .find(|&n| grammar.scope_kinds.contains(&tree.node(n).kind));
            return Some(structural.unwrap_or(prev));
        }
    }

    for sibling in tree.following_siblings(id) {
        let kind = tree.node(sibling).kind;
        if grammar.scope_kinds.contains(&kind) {
            return Some(sibling);
        }
        if grammar.block_kinds.contains(&kind) {
            if let Some(found) = first_structural_descendant(tree, sibling, grammar) {
                return Some(found);
            }
        }
    }

    find_enclosing_scope(tree, id, grammar)
}

fn first_structural_descendant(tree: &SyntaxTree, id: NodeId, grammar: &Grammar) -> Option<NodeId> {
    for &child in tree.children(id) {
        let kind = tree.node(child).kind;
        if grammar.scope_kinds.contains(&kind) {
            return Some(child);
        }
        if grammar.block_kinds.contains(&kind) {
            if let Some(found) = first_structural_descendant(tree, child, grammar) {
                return Some(found);
            }
        }
    }
    None
}
