//! AncestryBuilder: a cursor walking up a [`NodePath`].
//!
//! Every step either moves the cursor or invalidates it. Once invalid, all
//! further steps are no-ops and every accessor returns `None`, so chains
//! like `parent_of_key().parent_sequence().get_path()` need no intermediate
//! checks.
//!
//! ```text
//! path:   [Seq, Map, Pair, Key]
//!                      ▲
//!          parent_of_key() moves from Key to Map (via Pair)
//! ```

use regex::Regex;

use super::path::{NodePath, PathNode};
use crate::syntax::{Mapping, Node, NodeKind, Pair};

/// Where the cursor stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// At `path[index]`. With `on_key`, the element is a pair and the
    /// cursor reports the pair's key instead of the pair.
    At { index: usize, on_key: bool },
    Invalid,
}

/// Matches the scalar key of a pair for [`AncestryBuilder::parent_key`].
pub trait KeyPattern {
    fn matches_key(&self, key: &str) -> bool;
}

impl KeyPattern for str {
    fn matches_key(&self, key: &str) -> bool {
        self == key
    }
}

impl KeyPattern for &str {
    fn matches_key(&self, key: &str) -> bool {
        *self == key
    }
}

impl KeyPattern for String {
    fn matches_key(&self, key: &str) -> bool {
        self == key
    }
}

impl KeyPattern for Regex {
    fn matches_key(&self, key: &str) -> bool {
        self.is_match(key)
    }
}

impl<P: KeyPattern> KeyPattern for [P] {
    fn matches_key(&self, key: &str) -> bool {
        self.iter().any(|p| p.matches_key(key))
    }
}

impl<P: KeyPattern, const N: usize> KeyPattern for [P; N] {
    fn matches_key(&self, key: &str) -> bool {
        self.iter().any(|p| p.matches_key(key))
    }
}

/// Upward cursor over a node path.
#[derive(Debug, Clone)]
pub struct AncestryBuilder<'p, 'a> {
    path: &'p [PathNode<'a>],
    cursor: Cursor,
}

impl<'p, 'a> AncestryBuilder<'p, 'a> {
    /// Start at the last element of `path`.
    pub fn new(path: &'p [PathNode<'a>]) -> Self {
        let cursor = match path.len() {
            0 => Cursor::Invalid,
            len => Cursor::At {
                index: len - 1,
                on_key: false,
            },
        };
        Self { path, cursor }
    }

    pub fn is_valid(&self) -> bool {
        self.cursor != Cursor::Invalid
    }

    fn index(&self) -> Option<usize> {
        match self.cursor {
            Cursor::At { index, .. } => Some(index),
            Cursor::Invalid => None,
        }
    }

    fn at(&self, index: usize) -> Option<PathNode<'a>> {
        self.path.get(index).copied()
    }

    fn invalidate(mut self) -> Self {
        self.cursor = Cursor::Invalid;
        self
    }

    fn move_to(mut self, index: usize) -> Self {
        self.cursor = Cursor::At {
            index,
            on_key: false,
        };
        self
    }

    /// Step one element up, exactly.
    fn step_up(self) -> Self {
        match self.index().and_then(|i| i.checked_sub(1)) {
            Some(index) => self.move_to(index),
            None => self.invalidate(),
        }
    }

    // =========================================================================
    // TRAVERSAL
    // =========================================================================

    /// Move to the containing collection, passing over an intermediate pair.
    pub fn parent(self) -> Self {
        let this = self.step_up();
        match this.get() {
            Some(PathNode::Pair(_)) => this.step_up(),
            _ => this,
        }
    }

    /// Like [`parent`](Self::parent), asserting the parent is a mapping.
    pub fn parent_mapping(self) -> Self {
        self.parent_asserting(NodeKind::Mapping)
    }

    /// Like [`parent`](Self::parent), asserting the parent is a sequence.
    pub fn parent_sequence(self) -> Self {
        self.parent_asserting(NodeKind::Sequence)
    }

    /// Move up exactly one element, asserting it is a pair.
    pub fn parent_pair(self) -> Self {
        let this = self.step_up();
        match this.get() {
            Some(PathNode::Pair(_)) => this,
            _ => this.invalidate(),
        }
    }

    fn parent_asserting(self, kind: NodeKind) -> Self {
        let this = self.parent();
        match this.get().and_then(|n| n.kind()) {
            Some(found) if found == kind => this,
            _ => this.invalidate(),
        }
    }

    /// From a key node, move to the mapping that owns the key.
    ///
    /// Invalid when the cursor is not the key of its parent pair (for
    /// instance when it stands on a value).
    pub fn parent_of_key(self) -> Self {
        let Some(node) = self.get() else {
            return self.invalidate();
        };
        let this = self.parent_pair();
        let is_key = match this.get() {
            Some(PathNode::Pair(pair)) => PathNode::Node(&pair.key).same(&node),
            _ => false,
        };
        if is_key {
            this.parent_mapping()
        } else {
            this.invalidate()
        }
    }

    /// Move up to the pair directly above the cursor and focus its key,
    /// requiring the key to match `pattern`.
    pub fn parent_key<P: KeyPattern + ?Sized>(self, pattern: &P) -> Self {
        self.parent_key_matching(|key| pattern.matches_key(key))
    }

    /// Move up to the pair directly above the cursor and focus its key,
    /// whatever the key is, as long as it is a scalar.
    pub fn parent_key_any(self) -> Self {
        self.parent_key_matching(|_| true)
    }

    fn parent_key_matching(self, accept: impl Fn(&str) -> bool) -> Self {
        let mut this = self.step_up();
        let Some(index) = this.index() else {
            return this;
        };
        match this.at(index) {
            Some(PathNode::Pair(pair)) if pair.key_str().is_some_and(&accept) => {
                this.cursor = Cursor::At {
                    index,
                    on_key: true,
                };
                this
            }
            _ => this.invalidate(),
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// The element under the cursor.
    pub fn get(&self) -> Option<PathNode<'a>> {
        match self.cursor {
            Cursor::At { index, on_key } => {
                let node = self.at(index)?;
                match (node, on_key) {
                    (PathNode::Pair(pair), true) => Some(PathNode::Node(&pair.key)),
                    _ => Some(node),
                }
            }
            Cursor::Invalid => None,
        }
    }

    /// The mapping under the cursor.
    pub fn get_mapping(&self) -> Option<&'a Mapping> {
        self.get().and_then(|n| n.as_mapping())
    }

    /// Prefix of the path ending at the cursor. With a focused key, the key
    /// is appended after its pair.
    pub fn get_path(&self) -> Option<NodePath<'a>> {
        let Cursor::At { index, on_key } = self.cursor else {
            return None;
        };
        let mut path = self.path.get(..=index)?.to_vec();
        if on_key {
            if let Some(PathNode::Pair(pair)) = self.at(index) {
                path.push(PathNode::Node(&pair.key));
            }
        }
        Some(path)
    }

    /// The pair right below the cursor on the original path, if any.
    fn child_pair(&self) -> Option<&'a Pair> {
        self.at(self.index()? + 1)?.as_pair()
    }

    /// Key of the pair below the cursor, when it is a scalar.
    ///
    /// After `parent_mapping()` from inside a value this is the key under
    /// which the walk came up.
    pub fn get_string_key(&self) -> Option<&'a str> {
        self.child_pair()?.key_str()
    }

    /// Value of the pair below the cursor.
    pub fn get_value(&self) -> Option<&'a Node> {
        self.child_pair().map(|pair| &pair.value)
    }

    /// Path to the cursor, extended by the pair below it and that pair's key.
    pub fn get_key_path(&self) -> Option<NodePath<'a>> {
        let index = self.index()?;
        let pair = self.child_pair()?;
        let mut path = self.path.get(..=index)?.to_vec();
        path.push(PathNode::Pair(pair));
        path.push(PathNode::Node(&pair.key));
        Some(path)
    }
}
