//! Tests for turning parse errors into non-occluding diagnostics.

use ansible_ls::base::{LineIndex, Position, TextRange};
use ansible_ls::hir::{Diagnostic, SCOPE_ENDS_HERE, Severity, YAML_SOURCE, merge_diagnostics};
use ansible_ls::syntax::{ParseError, ParseErrorKind, YamlFile};
use rstest::rstest;

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(start.into(), end.into())
}

#[test]
fn test_whole_document_error_collapses_around_smaller_one() {
    let errors = vec![
        ParseError::syntax("document is broken", range(0, 500)),
        ParseError::syntax("bad key", range(100, 110)),
    ];
    let merged = merge_diagnostics(&errors);

    assert_eq!(merged.len(), 2);
    let outer = &merged[0];
    assert_eq!(outer.range, range(0, 0));
    assert!(outer.is_collapsed());
    assert_eq!(outer.related.len(), 1);
    assert_eq!(outer.related[0].range, range(500, 500));
    assert_eq!(&*outer.related[0].message, SCOPE_ENDS_HERE);

    let inner = &merged[1];
    assert_eq!(inner.range, range(100, 110));
    assert!(inner.related.is_empty());
}

#[test]
fn test_errors_without_range_are_dropped() {
    let errors = vec![
        ParseError::new(ParseErrorKind::SyntaxError, "nowhere", None),
        ParseError::warning("somewhere", range(3, 4)),
    ];
    let merged = merge_diagnostics(&errors);
    assert_eq!(merged.len(), 1);
    assert_eq!(&*merged[0].message, "somewhere");
    assert_eq!(&*merged[0].source, YAML_SOURCE);
}

#[test]
fn test_disjoint_errors_are_untouched() {
    let errors = vec![
        ParseError::syntax("b", range(10, 20)),
        ParseError::syntax("a", range(0, 5)),
        ParseError::syntax("c", range(20, 25)),
    ];
    let merged = merge_diagnostics(&errors);
    let ranges: Vec<TextRange> = merged.iter().map(|d| d.range).collect();
    assert_eq!(ranges, vec![range(0, 5), range(10, 20), range(20, 25)]);
    assert!(merged.iter().all(|d| d.related.is_empty()));
}

#[test]
fn test_nested_chain_keeps_only_innermost() {
    let errors = vec![
        ParseError::syntax("outer", range(0, 100)),
        ParseError::syntax("middle", range(10, 50)),
        ParseError::syntax("inner", range(20, 30)),
    ];
    let merged = merge_diagnostics(&errors);
    let displayed: Vec<(&str, TextRange)> = merged.iter().map(|d| (&*d.message, d.range)).collect();
    assert_eq!(
        displayed,
        vec![
            ("outer", range(0, 0)),
            ("middle", range(10, 10)),
            ("inner", range(20, 30)),
        ]
    );
}

#[test]
fn test_point_error_inside_span_keeps_no_related_info() {
    let errors = vec![
        ParseError::syntax("point", range(9, 9)),
        ParseError::syntax("span", range(3, 19)),
    ];
    let merged = merge_diagnostics(&errors);
    assert_eq!(&*merged[0].message, "span");
    assert_eq!(merged[0].range, range(3, 3));
    assert_eq!(merged[0].related.len(), 1);
    assert_eq!(merged[0].related[0].range, range(19, 19));

    assert_eq!(&*merged[1].message, "point");
    assert_eq!(merged[1].range, range(9, 9));
    assert!(merged[1].related.is_empty());
}

#[test]
fn test_point_error_at_span_start_is_never_collapsed() {
    let errors = vec![
        ParseError::syntax("span", range(4, 12)),
        ParseError::syntax("point", range(4, 4)),
    ];
    let merged = merge_diagnostics(&errors);
    let point = merged.iter().find(|d| &*d.message == "point").unwrap();
    assert_eq!(point.range, range(4, 4));
    assert!(point.related.is_empty());

    let span = merged.iter().find(|d| &*d.message == "span").unwrap();
    assert_eq!(span.range, range(4, 4));
    assert_eq!(span.related[0].range, range(12, 12));
}

#[rstest]
#[case(ParseErrorKind::SyntaxError, Severity::Error, 1)]
#[case(ParseErrorKind::SemanticError, Severity::Error, 1)]
#[case(ParseErrorKind::ReferenceError, Severity::Error, 1)]
#[case(ParseErrorKind::Warning, Severity::Warning, 2)]
#[case(ParseErrorKind::Other, Severity::Info, 3)]
fn test_severity_by_kind(#[case] kind: ParseErrorKind, #[case] severity: Severity, #[case] lsp: u32) {
    let error = ParseError::new(kind, "x", Some(range(0, 1)));
    let diagnostic = Diagnostic::from_parse_error(&error).unwrap();
    assert_eq!(diagnostic.severity, severity);
    assert_eq!(diagnostic.severity.to_lsp(), lsp);
}

#[test]
fn test_parsed_file_diagnostics_have_line_spans() {
    let text = "a: 1\na: 2\n";
    let file = YamlFile::parse(text);
    let merged = merge_diagnostics(file.errors());
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].severity, Severity::Error);

    let span = merged[0].span(&LineIndex::new(text));
    assert_eq!(span.start, Position::new(1, 0));
    assert_eq!(span.end, Position::new(1, 1));
}
