//! Immutable syntax tree arena
//!
//! Scope resolution only needs to walk up to parents, forward to siblings and
//! down into named children. The tree-sitter tree is copied once into a flat
//! arena of named nodes addressed by [`NodeId`], so comments and scopes can
//! refer to nodes by index without borrowing the parser's tree.

use arborium::tree_sitter::Node;

/// Index of a node inside a [`SyntaxTree`]
pub type NodeId = usize;

/// A row/column point with a byte column, as reported by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

/// A named node of the arena
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    /// Grammar node kind (e.g. `function_definition`)
    pub kind: &'static str,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start: Point,
    pub end: Point,
    pub parent: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl SyntaxNode {
    fn from_ts(node: &Node<'_>, parent: Option<NodeId>) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            kind: node.kind(),
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start: Point {
                row: start.row,
                column: start.column,
            },
            end: Point {
                row: end.row,
                column: end.column,
            },
            parent,
            prev_sibling: None,
            next_sibling: None,
            children: Vec::new(),
        }
    }
}

/// Arena of named syntax nodes. The root is always [`SyntaxTree::ROOT`].
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    pub const ROOT: NodeId = 0;

    /// Copy the named nodes below `root` into an arena.
    pub fn from_tree_sitter(root: Node<'_>) -> Self {
        let mut nodes = vec![SyntaxNode::from_ts(&root, None)];
        let mut stack = vec![(root, SyntaxTree::ROOT)];

        while let Some((ts_node, id)) = stack.pop() {
            let mut cursor = ts_node.walk();
            let named: Vec<Node<'_>> = ts_node.named_children(&mut cursor).collect();

            let mut prev: Option<NodeId> = None;
            for child in named {
                let child_id = nodes.len();
                let mut node = SyntaxNode::from_ts(&child, Some(id));
                node.prev_sibling = prev;
                nodes.push(node);

                if let Some(prev_id) = prev {
                    nodes[prev_id].next_sibling = Some(child_id);
                }
                nodes[id].children.push(child_id);
                prev = Some(child_id);
                stack.push((child, child_id));
            }
        }

        Self { nodes }
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].next_sibling
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].prev_sibling
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// Siblings following `id`, nearest first
    pub fn following_siblings(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.next_sibling(id), move |&current| {
            self.next_sibling(current)
        })
    }

    /// All node ids in pre-order (document order)
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return order;
        }
        let mut stack = vec![SyntaxTree::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        order
    }

    /// Source text covered by a node
    pub fn text<'a>(&self, id: NodeId, source: &'a str) -> &'a str {
        let node = &self.nodes[id];
        source.get(node.start_byte..node.end_byte).unwrap_or("")
    }
}
