//! YAML node types.

use smol_str::SmolStr;

use crate::base::{TextRange, TextSize};

/// The shape of a node, as asserted by path traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Mapping,
    Sequence,
    Scalar,
    Pair,
}

/// A YAML value node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Mapping(Mapping),
    Sequence(Sequence),
    Scalar(Scalar),
}

impl Node {
    pub fn range(&self) -> TextRange {
        match self {
            Node::Mapping(m) => m.range,
            Node::Sequence(s) => s.range,
            Node::Scalar(s) => s.range,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Mapping(_) => NodeKind::Mapping,
            Node::Sequence(_) => NodeKind::Sequence,
            Node::Scalar(_) => NodeKind::Scalar,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Node::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// The string value of a scalar node.
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().map(|s| s.value.as_str())
    }
}

/// A block or flow mapping. Keys keep source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub range: TextRange,
    pub items: Vec<Pair>,
}

impl Mapping {
    /// First pair whose key is the scalar `key`.
    pub fn get(&self, key: &str) -> Option<&Pair> {
        self.items.iter().find(|p| p.key_str() == Some(key))
    }

    /// Value of the first pair keyed by `key`.
    pub fn get_value(&self, key: &str) -> Option<&Node> {
        self.get(key).map(|p| &p.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Scalar keys in source order. Non-scalar keys are skipped.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(Pair::key_str)
    }
}

/// A block or flow sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub range: TextRange,
    pub items: Vec<Node>,
}

/// How a scalar was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
    /// `*name`; the value holds the alias name.
    Alias,
}

/// A scalar with its cooked string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    pub range: TextRange,
    pub value: SmolStr,
    pub style: ScalarStyle,
}

impl Scalar {
    pub fn new(range: TextRange, value: impl Into<SmolStr>, style: ScalarStyle) -> Self {
        Self {
            range,
            value: value.into(),
            style,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Zero-width null standing in for an empty value (`key:` or `- `).
    pub fn null(at: TextSize) -> Self {
        Self::new(TextRange::empty(at), "", ScalarStyle::Plain)
    }

    /// Plain `null`, `~` or an empty plain scalar.
    pub fn is_null(&self) -> bool {
        self.style == ScalarStyle::Plain
            && matches!(self.value.as_str(), "" | "~" | "null" | "Null" | "NULL")
    }
}

/// A key/value entry of a mapping. For `key:` with nothing after it the
/// value is a zero-width null scalar where the value would start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub key: Node,
    pub value: Node,
}

impl Pair {
    pub fn new(key: Node, value: Node) -> Self {
        Self { key, value }
    }

    /// Whether the value is an implicit empty value.
    pub fn has_empty_value(&self) -> bool {
        self.value
            .as_scalar()
            .is_some_and(|s| s.range.is_empty() && s.is_null())
    }

    /// The key as a string, when the key is a scalar.
    pub fn key_str(&self) -> Option<&str> {
        self.key.as_str()
    }

    /// From the start of the key to the end of the value.
    pub fn range(&self) -> TextRange {
        self.key.range().cover(self.value.range())
    }
}
