//! Syntax: YAML node tree, documents and parse errors.
//!
//! Nodes are produced by [`crate::parser`] and never mutated afterwards.
//! Every node carries its byte range in the source text.

pub mod file;
pub mod node;
pub mod parser;

pub use file::{YamlDocument, YamlFile};
pub use node::{Mapping, Node, NodeKind, Pair, Scalar, ScalarStyle, Sequence};
pub use parser::{ParseError, ParseErrorKind};

// Re-export Position and Span from base for convenience
pub use crate::base::{Position, Span};
