//! Diagnostics: YAML parse errors as editor diagnostics.
//!
//! A syntax error in YAML often spans the rest of the document. Shown as is,
//! it buries every smaller error inside it. [`merge_diagnostics`] collapses
//! such wide diagnostics to a point at their start and points at their true
//! end through related information instead.

use std::cmp::max;
use std::sync::Arc;

use crate::base::{LineIndex, Span, TextRange};
use crate::syntax::{ParseError, ParseErrorKind};

/// Source tag of every YAML diagnostic.
pub const YAML_SOURCE: &str = "Ansible [YAML]";

/// Message attached to the true end of a collapsed diagnostic.
pub const SCOPE_ENDS_HERE: &str = "the scope of this error ends here";

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// Convert to LSP severity number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Hint => 4,
        }
    }

    pub fn from_error_kind(kind: ParseErrorKind) -> Self {
        match kind {
            ParseErrorKind::SyntaxError
            | ParseErrorKind::SemanticError
            | ParseErrorKind::ReferenceError => Severity::Error,
            ParseErrorKind::Warning => Severity::Warning,
            ParseErrorKind::Other => Severity::Info,
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Displayed range. Zero-width once collapsed.
    pub range: TextRange,
    pub message: Arc<str>,
    pub severity: Severity,
    pub source: Arc<str>,
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelatedInfo {
    pub range: TextRange,
    pub message: Arc<str>,
}

impl Diagnostic {
    pub fn new(range: TextRange, severity: Severity, message: impl Into<Arc<str>>) -> Self {
        Self {
            range,
            message: message.into(),
            severity,
            source: Arc::from(YAML_SOURCE),
            related: Vec::new(),
        }
    }

    /// The diagnostic for a parse error, if the error has a location.
    pub fn from_parse_error(error: &ParseError) -> Option<Self> {
        let range = error.range?;
        Some(Self::new(
            range,
            Severity::from_error_kind(error.kind),
            error.message.as_str(),
        ))
    }

    pub fn with_related(mut self, range: TextRange, message: impl Into<Arc<str>>) -> Self {
        self.related.push(RelatedInfo {
            range,
            message: message.into(),
        });
        self
    }

    pub fn is_collapsed(&self) -> bool {
        self.range.is_empty()
    }

    /// Line/column span of the displayed range.
    pub fn span(&self, line_index: &LineIndex) -> Span {
        Span::from_range(self.range, line_index)
    }
}

// ============================================================================
// INTERVAL TREE
// ============================================================================

/// Whether two ranges share a position. Ranges are half-open; a zero-width
/// range is the single point at its start.
pub fn ranges_overlap(a: TextRange, b: TextRange) -> bool {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => a.start() == b.start(),
        (true, false) => b.start() <= a.start() && a.start() < b.end(),
        (false, true) => a.start() <= b.start() && b.start() < a.end(),
        (false, false) => a.start() < b.end() && b.start() < a.end(),
    }
}

#[derive(Debug, Clone)]
struct IntervalNode {
    range: TextRange,
    /// Index of the item in the slice the tree was built from.
    item: usize,
    /// Maximum end in this subtree.
    max_end: u32,
    left: Option<Box<IntervalNode>>,
    right: Option<Box<IntervalNode>>,
}

/// Balanced interval tree over text ranges, built once and queried for
/// overlaps in O(log n + k).
#[derive(Debug, Clone, Default)]
pub struct IntervalTree {
    root: Option<Box<IntervalNode>>,
    count: usize,
}

impl IntervalTree {
    /// Build from `ranges`; query results are indices into `ranges`.
    pub fn new(ranges: &[TextRange]) -> Self {
        let mut sorted: Vec<(TextRange, usize)> =
            ranges.iter().copied().enumerate().map(|(i, r)| (r, i)).collect();
        sorted.sort_by_key(|(range, _)| (range.start(), range.end()));
        Self {
            root: Self::build_balanced(&sorted),
            count: sorted.len(),
        }
    }

    fn build_balanced(sorted: &[(TextRange, usize)]) -> Option<Box<IntervalNode>> {
        if sorted.is_empty() {
            return None;
        }
        let mid = sorted.len() / 2;
        let (range, item) = sorted[mid];
        let left = Self::build_balanced(&sorted[..mid]);
        let right = Self::build_balanced(&sorted[mid + 1..]);

        let mut max_end = u32::from(range.end());
        if let Some(node) = &left {
            max_end = max(max_end, node.max_end);
        }
        if let Some(node) = &right {
            max_end = max(max_end, node.max_end);
        }

        Some(Box::new(IntervalNode {
            range,
            item,
            max_end,
            left,
            right,
        }))
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Indices of every stored range overlapping `query`, in tree order.
    pub fn search(&self, query: TextRange) -> Vec<usize> {
        let mut found = Vec::new();
        if let Some(root) = &self.root {
            Self::search_node(root, query, &mut found);
        }
        found
    }

    fn search_node(node: &IntervalNode, query: TextRange, found: &mut Vec<usize>) {
        // Nothing in this subtree ends at or after the query start.
        if node.max_end < u32::from(query.start()) {
            return;
        }
        if let Some(left) = &node.left {
            Self::search_node(left, query, found);
        }
        if ranges_overlap(node.range, query) {
            found.push(node.item);
        }
        // Everything to the right starts at or after this node.
        if node.range.start() > query.end() {
            return;
        }
        if let Some(right) = &node.right {
            Self::search_node(right, query, found);
        }
    }
}

// ============================================================================
// MERGING
// ============================================================================

/// Turn parse errors into diagnostics and collapse the ones that overlap
/// others.
///
/// Errors without a range are dropped. The result is ordered by original
/// `(start, end)`.
pub fn merge_diagnostics<'e>(errors: impl IntoIterator<Item = &'e ParseError>) -> Vec<Diagnostic> {
    let diagnostics = errors
        .into_iter()
        .filter_map(Diagnostic::from_parse_error)
        .collect();
    collapse_overlapping(diagnostics)
}

/// Collapse every diagnostic that overlaps a diagnostic with a different,
/// still visible range.
///
/// Diagnostics are visited by original `(start, end)`. A diagnostic stays as
/// is when each diagnostic overlapping it was collapsed earlier in this pass
/// or displays the same range; otherwise it shrinks to its start and gains
/// related information at its original end. Diagnostics that are already
/// zero-width have nothing to hide and are never collapsed.
pub fn collapse_overlapping(mut diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    diagnostics.sort_by_key(|d| (d.range.start(), d.range.end()));
    let original: Vec<TextRange> = diagnostics.iter().map(|d| d.range).collect();
    let tree = IntervalTree::new(&original);
    let mut collapsed = vec![false; diagnostics.len()];

    for index in 0..diagnostics.len() {
        if original[index].is_empty() {
            continue;
        }
        let displayed = diagnostics[index].range;
        let undisturbed = tree
            .search(original[index])
            .into_iter()
            .all(|other| collapsed[other] || diagnostics[other].range == displayed);
        if undisturbed {
            continue;
        }

        let end = original[index].end();
        let diagnostic = &mut diagnostics[index];
        tracing::trace!(
            "[DIAGNOSTICS] collapsing {:?} '{}'",
            diagnostic.range,
            diagnostic.message
        );
        diagnostic.range = TextRange::empty(original[index].start());
        diagnostic.related.push(RelatedInfo {
            range: TextRange::empty(end),
            message: Arc::from(SCOPE_ENDS_HERE),
        });
        collapsed[index] = true;
    }
    diagnostics
}
