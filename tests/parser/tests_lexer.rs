//! Tests for the token stream handed to the parser.

use ansible_ls::parser::{TokenKind, tokenize};
use rstest::rstest;

#[rstest]
#[case("&anchor", TokenKind::Anchor)]
#[case("*alias", TokenKind::Alias)]
#[case("!!str", TokenKind::Tag)]
#[case("|-", TokenKind::BlockScalarHeader)]
#[case("'quoted'", TokenKind::SingleQuoted)]
#[case("\"quoted\"", TokenKind::DoubleQuoted)]
#[case("# note", TokenKind::Comment)]
#[case("{{", TokenKind::LBrace)]
fn test_first_token_kind(#[case] input: &str, #[case] expected: TokenKind) {
    let tokens = tokenize(input);
    assert_eq!(tokens[0].kind, expected);
}

#[test]
fn test_tokens_cover_the_whole_input() {
    let input = "- name: x  # trailing\n  debug: {msg: 'hi'}\n";
    let rebuilt: String = tokenize(input).iter().map(|t| t.text).collect();
    assert_eq!(rebuilt, input);
}

#[test]
fn test_jinja_braces_are_flow_indicators() {
    let tokens = tokenize("msg: x{{ item }}");
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Word,
            TokenKind::Space,
            TokenKind::Word,
            TokenKind::LBrace,
            TokenKind::LBrace,
            TokenKind::Space,
            TokenKind::Word,
            TokenKind::Space,
            TokenKind::RBrace,
            TokenKind::RBrace,
        ]
    );
}
