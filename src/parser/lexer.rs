//! Logos-based lexer for YAML
//!
//! The lexer is context-free: it splits the text into words, quoted
//! scalars, flow indicators and trivia. Whether a word is a mapping key, a
//! sequence indicator or part of a plain scalar is decided by the parser
//! from indentation and the surrounding tokens.

use logos::Logos;
use text_size::TextSize;

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: TextSize,
}

impl Token<'_> {
    pub fn end(&self) -> TextSize {
        self.offset + TextSize::of(self.text)
    }
}

/// Token classification handed to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Space,
    Tab,
    Newline,
    Comment,
    SingleQuoted,
    DoubleQuoted,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Anchor,
    Alias,
    Tag,
    BlockScalarHeader,
    Word,
    /// Characters no token accepts, such as an unterminated quote.
    Error,
}

impl TokenKind {
    /// Whitespace within a line.
    pub fn is_inline_space(self) -> bool {
        matches!(self, TokenKind::Space | TokenKind::Tab)
    }

    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Space | TokenKind::Tab | TokenKind::Newline | TokenKind::Comment
        )
    }

    pub fn is_flow_close(self) -> bool {
        matches!(self, TokenKind::RBracket | TokenKind::RBrace)
    }
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    offset: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            offset: 0,
        }
    }

    /// Lex `input` from `offset` on. Token offsets stay relative to `input`.
    pub fn starting_at(input: &'a str, offset: TextSize) -> Self {
        let start = u32::from(offset) as usize;
        Self {
            inner: LogosToken::lexer(input.get(start..).unwrap_or("")),
            offset: offset.into(),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = TextSize::new(self.offset);
        self.offset += text.len() as u32;

        let kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => TokenKind::Error,
        };

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Logos token enum - maps to TokenKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r" +")]
    Space,

    #[regex(r"\t+")]
    Tab,

    #[regex(r"\r?\n")]
    Newline,

    #[regex(r"#[^\r\n]*")]
    Comment,

    // =========================================================================
    // SCALARS
    // =========================================================================
    /// Quoted scalars may span lines. One left open until the end of input
    /// or a document marker is an error token covering its first line.
    #[token("'", |lex| quoted(lex, b'\''))]
    SingleQuoted,

    #[token("\"", |lex| quoted(lex, b'"'))]
    DoubleQuoted,

    #[regex(r"[|>][-+0-9]*")]
    BlockScalarHeader,

    /// Plain text up to whitespace or a flow indicator. Mapping indicators
    /// (`key:`) and sequence indicators (`-`) are words too.
    #[regex(r#"[^ \t\r\n#'"\[\]{},&*!|>][^ \t\r\n,\[\]{}]*"#)]
    Word,

    // =========================================================================
    // NODE PROPERTIES
    // =========================================================================
    #[regex(r"&[^ \t\r\n,\[\]{}]+")]
    Anchor,

    #[regex(r"\*[^ \t\r\n,\[\]{}]+")]
    Alias,

    #[regex(r"![^ \t\r\n,\[\]{}]*")]
    Tag,

    // =========================================================================
    // FLOW INDICATORS
    // =========================================================================
    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,
}

fn quoted(lex: &mut logos::Lexer<'_, LogosToken>, quote: u8) -> bool {
    match scan_quoted(lex.remainder(), quote) {
        Ok(len) => {
            lex.bump(len);
            true
        }
        Err(len) => {
            lex.bump(len);
            false
        }
    }
}

/// Length of a quoted scalar's body including the closing quote, or the
/// length of its first line when it is never closed.
fn scan_quoted(rest: &str, quote: u8) -> Result<usize, usize> {
    let bytes = rest.as_bytes();
    let first_line = rest.find(['\r', '\n']).unwrap_or(rest.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote == b'"' => i += 2,
            b'\'' if quote == b'\'' && bytes.get(i + 1) == Some(&b'\'') => i += 2,
            b if b == quote => return Ok(i + 1),
            b'\n' if starts_document_marker(&rest[i + 1..]) => return Err(first_line),
            _ => i += 1,
        }
    }
    Err(first_line)
}

/// `---` or `...` at the start of `line`, followed by a separator.
fn starts_document_marker(line: &str) -> bool {
    (line.starts_with("---") || line.starts_with("..."))
        && line[3..]
            .chars()
            .next()
            .is_none_or(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

impl From<LogosToken> for TokenKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Space => TokenKind::Space,
            LogosToken::Tab => TokenKind::Tab,
            LogosToken::Newline => TokenKind::Newline,
            LogosToken::Comment => TokenKind::Comment,
            LogosToken::SingleQuoted => TokenKind::SingleQuoted,
            LogosToken::DoubleQuoted => TokenKind::DoubleQuoted,
            LogosToken::BlockScalarHeader => TokenKind::BlockScalarHeader,
            LogosToken::Word => TokenKind::Word,
            LogosToken::Anchor => TokenKind::Anchor,
            LogosToken::Alias => TokenKind::Alias,
            LogosToken::Tag => TokenKind::Tag,
            LogosToken::LBracket => TokenKind::LBracket,
            LogosToken::RBracket => TokenKind::RBracket,
            LogosToken::LBrace => TokenKind::LBrace,
            LogosToken::RBrace => TokenKind::RBrace,
            LogosToken::Comma => TokenKind::Comma,
        }
    }
}
