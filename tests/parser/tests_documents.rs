//! Tests for parsing YAML streams into documents.

use ansible_ls::base::TextRange;
use ansible_ls::syntax::{Node, ParseErrorKind, ScalarStyle, YamlFile};
use rstest::rstest;

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(start.into(), end.into())
}

#[test]
fn test_empty_text_has_no_documents() {
    assert!(YamlFile::parse("").documents.is_empty());
    assert!(YamlFile::parse("# only a comment\n").documents.is_empty());
}

#[test]
fn test_document_ranges_follow_markers() {
    let text = "---\na: 1\n---\nb: 2\n";
    let file = YamlFile::parse(text);
    assert_eq!(file.documents.len(), 2);
    assert_eq!(file.documents[0].range.start(), 0.into());
    assert_eq!(file.documents[1].range.start(), 9.into());
}

#[test]
fn test_marker_without_content_is_an_empty_document() {
    let file = YamlFile::parse("---\n---\na: 1\n");
    assert_eq!(file.documents.len(), 2);
    assert!(file.documents[0].is_empty());
    assert!(!file.documents[1].is_empty());
}

#[test]
fn test_folded_scalar_joins_lines() {
    let file = YamlFile::parse("msg: >\n  first\n  second\n");
    let root = file.documents[0].contents.as_ref().unwrap();
    let msg = root.as_mapping().unwrap().get_value("msg").unwrap().as_scalar().unwrap();
    assert_eq!(msg.style, ScalarStyle::Folded);
    assert_eq!(msg.as_str(), "first second\n");
}

#[test]
fn test_stripped_literal_has_no_trailing_newline() {
    let file = YamlFile::parse("cmd: |-\n  echo a\n");
    let root = file.documents[0].contents.as_ref().unwrap();
    assert_eq!(
        root.as_mapping().unwrap().get_value("cmd").and_then(Node::as_str),
        Some("echo a")
    );
}

#[test]
fn test_multi_line_plain_scalar() {
    let file = YamlFile::parse("msg: one\n  two\nnext: 1\n");
    let root = file.documents[0].contents.as_ref().unwrap();
    let map = root.as_mapping().unwrap();
    assert_eq!(map.get_value("msg").and_then(Node::as_str), Some("one two"));
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["msg", "next"]);
}

#[test]
fn test_anchor_and_alias_resolve_within_a_document() {
    let file = YamlFile::parse("a: &x 1\nb: *x\n");
    assert_eq!(file.errors().count(), 0);
    let root = file.documents[0].contents.as_ref().unwrap();
    let alias = root.as_mapping().unwrap().get_value("b").unwrap().as_scalar().unwrap();
    assert_eq!(alias.style, ScalarStyle::Alias);
}

#[test]
fn test_anchors_do_not_cross_documents() {
    let file = YamlFile::parse("a: &x 1\n---\nb: *x\n");
    let kinds: Vec<_> = file.errors().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ParseErrorKind::ReferenceError]);
    assert!(file.documents[0].errors.is_empty());
}

#[test]
fn test_unknown_directive_is_a_warning() {
    let file = YamlFile::parse("%FOO bar\n---\na: 1\n");
    let errors: Vec<_> = file.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ParseErrorKind::Warning);
    assert_eq!(errors[0].range, Some(range(0, 8)));
}

#[test]
fn test_duplicate_key_range_is_the_second_key() {
    let file = YamlFile::parse("a: 1\na: 2\n");
    let errors: Vec<_> = file.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].range, Some(range(5, 6)));
}

#[test]
fn test_errors_do_not_stop_later_documents() {
    let file = YamlFile::parse("a: 1\na: 2\n---\nb: 2\n");
    assert_eq!(file.documents.len(), 2);
    assert!(!file.documents[0].errors.is_empty());
    let second = file.documents[1].contents.as_ref().unwrap();
    assert_eq!(
        second.as_mapping().unwrap().get_value("b").and_then(Node::as_str),
        Some("2")
    );
}

#[rstest]
#[case("key: 'a\n  b'\n", "a b", ScalarStyle::SingleQuoted)]
#[case("msg: \"long\n  text\"\n", "long text", ScalarStyle::DoubleQuoted)]
#[case("msg: 'one\n\n  two'\n", "one\ntwo", ScalarStyle::SingleQuoted)]
#[case("msg: \"join\\\n  ed\"\n", "joined", ScalarStyle::DoubleQuoted)]
#[case("msg: 'it''s\n  here'\n", "it's here", ScalarStyle::SingleQuoted)]
fn test_quoted_scalar_spanning_lines(#[case] text: &str, #[case] value: &str, #[case] style: ScalarStyle) {
    let file = YamlFile::parse(text);
    assert_eq!(file.errors().count(), 0, "{:?}", file.errors().collect::<Vec<_>>());
    let root = file.documents[0].contents.as_ref().unwrap();
    let map = root.as_mapping().unwrap();
    assert_eq!(map.items.len(), 1);
    let scalar = map.items[0].value.as_scalar().unwrap();
    assert_eq!(scalar.as_str(), value);
    assert_eq!(scalar.style, style);
}

#[test]
fn test_keys_after_a_multi_line_quote_are_parsed() {
    let text = "- name: 'first\n    second'\n  debug:\n    msg: hi\n";
    let file = YamlFile::parse(text);
    assert_eq!(file.errors().count(), 0);
    let root = file.documents[0].contents.as_ref().unwrap();
    let task = root.as_sequence().unwrap().items[0].as_mapping().unwrap();
    assert_eq!(task.keys().collect::<Vec<_>>(), vec!["name", "debug"]);
    assert_eq!(task.get_value("name").and_then(Node::as_str), Some("first second"));
}

#[test]
fn test_quote_inside_plain_scalar_is_text() {
    let file = YamlFile::parse("a: it is 'odd\nb: 'x'\n");
    assert_eq!(file.errors().count(), 0);
    let root = file.documents[0].contents.as_ref().unwrap();
    let map = root.as_mapping().unwrap();
    assert_eq!(map.get_value("a").and_then(Node::as_str), Some("it is 'odd"));
    assert_eq!(map.get_value("b").and_then(Node::as_str), Some("x"));
}

#[test]
fn test_quote_inside_block_scalar_does_not_leak() {
    let file = YamlFile::parse("run: |\n  echo 'a\nnext: 'b'\n");
    assert_eq!(file.errors().count(), 0);
    let root = file.documents[0].contents.as_ref().unwrap();
    let map = root.as_mapping().unwrap();
    assert_eq!(map.get_value("run").and_then(Node::as_str), Some("echo 'a\n"));
    assert_eq!(map.get_value("next").and_then(Node::as_str), Some("b"));
}

#[test]
fn test_quote_left_open_at_document_marker() {
    let file = YamlFile::parse("a: 'x\n---\nb: 1\n");
    assert_eq!(file.documents.len(), 2);
    let messages: Vec<_> = file.documents[0].errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["Missing closing quote"]);
    assert_eq!(file.documents[0].errors[0].range, Some(range(3, 5)));
    assert!(file.documents[1].errors.is_empty());
}
