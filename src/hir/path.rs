//! Path navigation: the node chain from a document root to an offset.
//!
//! A path alternates containers and [`Pair`]s: a mapping is followed by the
//! pair that holds the offset, then by that pair's key or value. When the
//! offset falls inside a container but on none of its children, the path
//! ends with [`PathNode::Empty`] so callers can tell "on a node" from
//! "between nodes".

use std::ptr;

use crate::base::{TextRange, TextSize};
use crate::syntax::{Mapping, Node, NodeKind, Pair, Scalar, Sequence, YamlDocument};

/// Root-to-leaf chain of nodes. Index 0 is the document root.
pub type NodePath<'a> = Vec<PathNode<'a>>;

/// One element of a [`NodePath`].
#[derive(Debug, Clone, Copy)]
pub enum PathNode<'a> {
    Node(&'a Node),
    Pair(&'a Pair),
    /// Placeholder for "no node here" at the end of a path.
    Empty,
}

impl<'a> PathNode<'a> {
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            PathNode::Node(node) => Some(node.kind()),
            PathNode::Pair(_) => Some(NodeKind::Pair),
            PathNode::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PathNode::Empty)
    }

    pub fn as_node(&self) -> Option<&'a Node> {
        match self {
            PathNode::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_pair(&self) -> Option<&'a Pair> {
        match self {
            PathNode::Pair(pair) => Some(pair),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&'a Mapping> {
        self.as_node().and_then(Node::as_mapping)
    }

    pub fn as_sequence(&self) -> Option<&'a Sequence> {
        self.as_node().and_then(Node::as_sequence)
    }

    pub fn as_scalar(&self) -> Option<&'a Scalar> {
        self.as_node().and_then(Node::as_scalar)
    }

    pub fn range(&self) -> Option<TextRange> {
        match self {
            PathNode::Node(node) => Some(node.range()),
            PathNode::Pair(pair) => Some(pair.range()),
            PathNode::Empty => None,
        }
    }

    /// Identity comparison: both elements refer to the same tree node.
    ///
    /// Two empty markers are never the same element.
    pub fn same(&self, other: &PathNode<'_>) -> bool {
        match (self, other) {
            (PathNode::Node(a), PathNode::Node(b)) => ptr::eq(*a, *b),
            (PathNode::Pair(a), PathNode::Pair(b)) => ptr::eq(*a, *b),
            _ => false,
        }
    }
}

/// Whether `range` holds `offset`.
///
/// The end is exclusive unless `inclusive` is set, in which case an offset
/// right after the node (a cursor at the end of a word) also counts.
pub fn contains(range: TextRange, offset: TextSize, inclusive: bool) -> bool {
    range.start() <= offset && (range.end() > offset || (inclusive && range.end() >= offset))
}

/// Path from the root of the first document whose contents hold `offset`.
///
/// Returns `None` when no document contains the offset.
pub fn resolve_path_at(
    documents: &[YamlDocument],
    offset: TextSize,
    inclusive: bool,
) -> Option<NodePath<'_>> {
    documents.iter().find_map(|doc| {
        let root = doc.contents.as_ref()?;
        contains(root.range(), offset, inclusive).then(|| path_at_offset(root, offset, inclusive))
    })
}

/// Descend from `root` towards `offset`.
pub fn path_at_offset(root: &Node, offset: TextSize, inclusive: bool) -> NodePath<'_> {
    let mut path = vec![PathNode::Node(root)];
    let mut current = root;

    loop {
        match current {
            Node::Mapping(mapping) => {
                if let Some(pair) = mapping
                    .items
                    .iter()
                    .find(|p| contains(p.key.range(), offset, inclusive))
                {
                    path.push(PathNode::Pair(pair));
                    path.push(PathNode::Node(&pair.key));
                    current = &pair.key;
                    continue;
                }
                if let Some(pair) = mapping
                    .items
                    .iter()
                    .find(|p| contains(p.value.range(), offset, inclusive))
                {
                    path.push(PathNode::Pair(pair));
                    path.push(PathNode::Node(&pair.value));
                    current = &pair.value;
                    continue;
                }
                if let Some(pair) = mapping
                    .items
                    .iter()
                    .find(|p| gap_contains(p, offset, inclusive))
                {
                    path.push(PathNode::Pair(pair));
                    path.push(PathNode::Empty);
                    return path;
                }
                path.push(PathNode::Empty);
                return path;
            }
            Node::Sequence(sequence) => {
                match sequence
                    .items
                    .iter()
                    .find(|item| contains(item.range(), offset, inclusive))
                {
                    Some(item) => {
                        path.push(PathNode::Node(item));
                        current = item;
                    }
                    None => {
                        path.push(PathNode::Empty);
                        return path;
                    }
                }
            }
            Node::Scalar(scalar) => {
                if !contains(scalar.range, offset, inclusive) {
                    path.push(PathNode::Empty);
                }
                return path;
            }
        }
    }
}

/// The stretch between the end of a pair's key and the start of its value:
/// the indicator and any whitespace before the value.
fn gap_contains(pair: &Pair, offset: TextSize, inclusive: bool) -> bool {
    let start = pair.key.range().end();
    let value_start = pair.value.range().start();
    if value_start <= start {
        return false;
    }
    let end = value_start - TextSize::new(1);
    if end < start {
        return false;
    }
    contains(TextRange::new(start, end), offset, inclusive)
}
