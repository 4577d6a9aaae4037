//! Parse errors raised while reading YAML.

use std::fmt;

use crate::base::TextRange;

/// Category of a YAML parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    SyntaxError,
    SemanticError,
    ReferenceError,
    Warning,
    Other,
}

impl ParseErrorKind {
    /// Classify an error type name such as `YAMLSyntaxError`.
    ///
    /// Names are matched by suffix so that prefixed names from other
    /// producers land in the same category.
    pub fn from_name(name: &str) -> Self {
        if name.ends_with("ReferenceError") {
            ParseErrorKind::ReferenceError
        } else if name.ends_with("SemanticError") {
            ParseErrorKind::SemanticError
        } else if name.ends_with("SyntaxError") {
            ParseErrorKind::SyntaxError
        } else if name.ends_with("Warning") {
            ParseErrorKind::Warning
        } else {
            ParseErrorKind::Other
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParseErrorKind::SyntaxError => "YAMLSyntaxError",
            ParseErrorKind::SemanticError => "YAMLSemanticError",
            ParseErrorKind::ReferenceError => "YAMLReferenceError",
            ParseErrorKind::Warning => "YAMLWarning",
            ParseErrorKind::Other => "YAMLError",
        }
    }
}

/// An error or warning raised while parsing YAML.
///
/// Errors without a range are kept here but cannot be displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub range: Option<TextRange>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, range: Option<TextRange>) -> Self {
        Self {
            kind,
            message: message.into(),
            range,
        }
    }

    pub fn syntax(message: impl Into<String>, range: TextRange) -> Self {
        Self::new(ParseErrorKind::SyntaxError, message, Some(range))
    }

    pub fn semantic(message: impl Into<String>, range: TextRange) -> Self {
        Self::new(ParseErrorKind::SemanticError, message, Some(range))
    }

    pub fn reference(message: impl Into<String>, range: TextRange) -> Self {
        Self::new(ParseErrorKind::ReferenceError, message, Some(range))
    }

    pub fn warning(message: impl Into<String>, range: TextRange) -> Self {
        Self::new(ParseErrorKind::Warning, message, Some(range))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range {
            Some(range) => write!(
                f,
                "{} at {}..{}: {}",
                self.kind.name(),
                u32::from(range.start()),
                u32::from(range.end()),
                self.message
            ),
            None => write!(f, "{}: {}", self.kind.name(), self.message),
        }
    }
}

impl std::error::Error for ParseError {}
