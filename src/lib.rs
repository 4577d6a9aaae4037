//! # ansible-ls-base
//!
//! Core library for Ansible editor tooling: YAML node paths, keyword
//! context, module documentation and resolution, and YAML diagnostics.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide       → AnalysisHost / Analysis snapshots, cursor text utilities
//!   ↓
//! project   → Workspace config, source discovery, role metadata, WorkspaceIndex
//!   ↓
//! hir       → Paths, ancestry, context predicates, module index and resolver
//!   ↓
//! syntax    → YAML node tree, documents, ParseError
//!   ↓
//! parser    → Logos lexer, indentation-aware YAML parser
//!   ↓
//! base      → Primitives (TextRange, LineIndex, Position/Span)
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → syntax → hir → project → ide)
// ============================================================================

/// Foundation types: TextRange, LineIndex, Position
pub mod base;

/// Parser: Logos lexer, recursive-descent YAML parser
pub mod parser;

/// Syntax: YAML nodes, documents, ParseError
pub mod syntax;

/// High-level IR: Ansible semantics over parsed YAML
pub mod hir;

/// Project management: configuration, discovery, workspace index
pub mod project;

/// IDE features: snapshots and cursor queries
pub mod ide;

// Re-export foundation types
pub use base::{LineCol, LineIndex, Position, Span, TextRange, TextSize};
