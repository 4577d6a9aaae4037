//! YAML parser for editor documents
//!
//! This module turns source text into [`YamlDocument`]s using:
//! - **logos** for fast lexing
//! - an indentation-aware recursive-descent parser for block structure
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with TokenKind
//!     ↓
//! Parser → YamlDocument { contents: Node tree, errors }
//!     ↓
//! HIR → paths, keyword context, module resolution
//! ```
//!
//! The parser never fails: malformed input produces a best-effort tree
//! together with [`ParseError`]s carrying byte ranges.
//!
//! [`YamlDocument`]: crate::syntax::YamlDocument
//! [`ParseError`]: crate::syntax::ParseError

#[allow(clippy::module_inception)]
mod parser;

mod lexer;

pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use parser::parse_documents;
