//! Parsed YAML files and documents.

use crate::base::{LineIndex, TextRange};

use super::node::Node;
use super::parser::ParseError;

/// One `---`-separated document of a YAML stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlDocument {
    /// Root node; `None` for an empty document.
    pub contents: Option<Node>,
    pub range: TextRange,
    pub errors: Vec<ParseError>,
}

impl YamlDocument {
    pub fn is_empty(&self) -> bool {
        self.contents.is_none()
    }
}

/// A parsed file: its documents plus a line index over the source text.
#[derive(Debug, Clone)]
pub struct YamlFile {
    pub documents: Vec<YamlDocument>,
    pub line_index: LineIndex,
}

impl YamlFile {
    pub fn parse(text: &str) -> Self {
        Self {
            documents: crate::parser::parse_documents(text),
            line_index: LineIndex::new(text),
        }
    }

    /// Every parse error across all documents, in document order.
    pub fn errors(&self) -> impl Iterator<Item = &ParseError> {
        self.documents.iter().flat_map(|d| d.errors.iter())
    }
}
