//! Tests for parse error kinds and their display.

use ansible_ls::base::TextRange;
use ansible_ls::syntax::{ParseError, ParseErrorKind};
use rstest::rstest;

#[rstest]
#[case("YAMLSyntaxError", ParseErrorKind::SyntaxError)]
#[case("YAMLSemanticError", ParseErrorKind::SemanticError)]
#[case("YAMLReferenceError", ParseErrorKind::ReferenceError)]
#[case("YAMLWarning", ParseErrorKind::Warning)]
#[case("FooWarning", ParseErrorKind::Warning)]
#[case("SyntaxError", ParseErrorKind::SyntaxError)]
#[case("YAMLParseError", ParseErrorKind::Other)]
#[case("", ParseErrorKind::Other)]
fn test_kind_from_name(#[case] name: &str, #[case] expected: ParseErrorKind) {
    assert_eq!(ParseErrorKind::from_name(name), expected);
}

#[rstest]
#[case(ParseErrorKind::SyntaxError)]
#[case(ParseErrorKind::SemanticError)]
#[case(ParseErrorKind::ReferenceError)]
#[case(ParseErrorKind::Warning)]
#[case(ParseErrorKind::Other)]
fn test_name_classifies_back_to_its_kind(#[case] kind: ParseErrorKind) {
    assert_eq!(ParseErrorKind::from_name(kind.name()), kind);
}

#[test]
fn test_display_includes_range_when_known() {
    let located = ParseError::syntax("bad key", TextRange::new(3.into(), 7.into()));
    assert_eq!(located.to_string(), "YAMLSyntaxError at 3..7: bad key");

    let floating = ParseError::new(ParseErrorKind::Warning, "odd", None);
    assert_eq!(floating.to_string(), "YAMLWarning: odd");
}
