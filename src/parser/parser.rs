//! Indentation-aware recursive-descent parser producing [`YamlDocument`]s.
//!
//! The parser works on the flat token stream from [`Lexer`]. Block
//! structure is recovered from token columns: a mapping or sequence owns
//! every following line indented deeper than itself. Errors are recorded
//! and parsing continues, so editor documents always yield a tree.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::lexer::{Lexer, Token, TokenKind};
use crate::base::LineIndex;
use crate::syntax::{Mapping, Node, Pair, ParseError, Scalar, ScalarStyle, Sequence, YamlDocument};

/// Parse a YAML stream into its documents.
pub fn parse_documents(input: &str) -> Vec<YamlDocument> {
    let tokens: Vec<_> = Lexer::new(input).collect();
    let mut parser = Parser::new(input, tokens);
    parser.parse_stream();
    parser.finish()
}

/// The parser state
struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    line_index: LineIndex,
    errors: Vec<ParseError>,
    documents: Vec<YamlDocument>,
    /// Anchors defined so far in the current document.
    anchors: FxHashSet<SmolStr>,
    /// Last line that reported tab indentation, to avoid duplicates on backtrack.
    tab_error_line: Option<u32>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, tokens: Vec<Token<'a>>) -> Self {
        Self {
            text,
            tokens,
            pos: 0,
            line_index: LineIndex::new(text),
            errors: Vec::new(),
            documents: Vec::new(),
            anchors: FxHashSet::default(),
            tab_error_line: None,
        }
    }

    fn finish(self) -> Vec<YamlDocument> {
        self.documents
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn nth_token(&self, n: usize) -> Option<&Token<'a>> {
        self.tokens.get(self.pos + n)
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    fn current_text(&self) -> &'a str {
        self.tokens.get(self.pos).map(|t| t.text).unwrap_or("")
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current_kind() == Some(kind)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn slice(&self, range: TextRange) -> &'a str {
        &self.text[range]
    }

    fn current_offset(&self) -> TextSize {
        self.current()
            .map(|t| t.offset)
            .unwrap_or_else(|| TextSize::of(self.text))
    }

    fn column_at(&self, offset: TextSize) -> i32 {
        self.line_index.line_col(offset).col as i32
    }

    fn current_column(&self) -> i32 {
        self.column_at(self.current_offset())
    }

    /// End of the token before the cursor.
    fn prev_end(&self) -> TextSize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.end())
            .unwrap_or_default()
    }

    /// Whether the token at `idx` ends a line-level construct: followed by
    /// whitespace, a newline, a comment or the end of input.
    fn followed_by_separator(&self, idx: usize) -> bool {
        match self.tokens.get(idx + 1) {
            None => true,
            Some(t) => t.kind.is_trivia(),
        }
    }

    /// `-` followed by a separator.
    fn at_sequence_indicator(&self) -> bool {
        self.at(TokenKind::Word) && self.current_text() == "-" && self.followed_by_separator(self.pos)
    }

    /// `---` or `...` in column zero.
    fn at_document_marker(&self) -> bool {
        self.at(TokenKind::Word)
            && matches!(self.current_text(), "---" | "...")
            && self.current_column() == 0
            && self.followed_by_separator(self.pos)
    }

    /// At a newline, a comment or the end of input, ignoring inline spaces.
    fn at_line_end(&self) -> bool {
        let mut idx = self.pos;
        while let Some(t) = self.tokens.get(idx) {
            match t.kind {
                TokenKind::Space | TokenKind::Tab => idx += 1,
                TokenKind::Newline | TokenKind::Comment => return true,
                _ => return false,
            }
        }
        true
    }

    /// Index of the token carrying the mapping indicator on the current
    /// line, if the line starting at the cursor is a `key: value` entry.
    fn key_indicator(&self) -> Option<usize> {
        let mut idx = self.pos;
        while let Some(t) = self.tokens.get(idx) {
            match t.kind {
                TokenKind::Newline | TokenKind::Comment => return None,
                TokenKind::LBracket | TokenKind::LBrace => return None,
                TokenKind::Word if t.text.ends_with(':') && self.followed_by_separator(idx) => {
                    return Some(idx);
                }
                _ => idx += 1,
            }
        }
        None
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn skip_inline_space(&mut self) {
        while self.current_kind().is_some_and(TokenKind::is_inline_space) {
            self.pos += 1;
        }
    }

    /// Skip to the rest of the current line, leaving the cursor on the newline.
    fn skip_to_line_end(&mut self) {
        while let Some(kind) = self.current_kind() {
            if kind == TokenKind::Newline {
                break;
            }
            self.pos += 1;
        }
    }

    /// Skip whitespace, comments and blank lines up to the next content token.
    fn skip_to_content(&mut self) {
        while self.current_kind().is_some_and(TokenKind::is_trivia) {
            self.pos += 1;
        }
        self.check_tab_indentation();
    }

    /// Move the cursor to the first token starting at or after `offset`.
    /// A token straddling `offset`, such as a quote inside a plain or block
    /// scalar, is dropped and the rest of the text is lexed again from there.
    fn seek(&mut self, offset: TextSize) {
        self.pos = self.tokens.partition_point(|t| t.offset < offset);
        let straddled = self
            .pos
            .checked_sub(1)
            .is_some_and(|prev| self.tokens[prev].end() > offset);
        if straddled {
            tracing::trace!("[PARSER] re-lexing from {:?}", offset);
            self.pos -= 1;
            self.tokens.truncate(self.pos);
            self.tokens.extend(Lexer::starting_at(self.text, offset));
        }
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    fn error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    fn check_tab_indentation(&mut self) {
        let Some(offset) = self.current().map(|t| t.offset) else {
            return;
        };
        let line = self.line_index.line_col(offset).line;
        if self.tab_error_line == Some(line) {
            return;
        }
        let Some(line_range) = self.line_index.line_range(line) else {
            return;
        };
        let prefix = TextRange::new(line_range.start(), offset);
        if self.slice(prefix).contains('\t') {
            self.tab_error_line = Some(line);
            self.error(ParseError::syntax("Tabs are not allowed as indentation", prefix));
        }
    }

    /// Report the current line and every deeper line after it, then skip them.
    fn skip_unexpected_lines(&mut self, indent: i32, message: &str) {
        let start = self.current_offset();
        let mut end = start;
        loop {
            self.skip_to_line_end();
            end = end.max(self.prev_end());
            let save = self.pos;
            self.skip_to_content();
            if self.at_eof() || self.current_column() <= indent || self.at_document_marker() {
                self.pos = save;
                break;
            }
        }
        self.error(ParseError::syntax(message, TextRange::new(start, end)));
    }

    // =========================================================================
    // Documents
    // =========================================================================

    fn parse_stream(&mut self) {
        loop {
            self.skip_to_content();
            if self.at_eof() {
                break;
            }
            self.parse_document();
        }
    }

    fn parse_document(&mut self) {
        let start = self.current_offset();
        self.anchors.clear();

        self.parse_directives();

        let mut contents = None;
        if self.at_document_marker() && self.current_text() == "---" {
            self.bump();
            self.skip_inline_space();
            if !self.at_line_end() {
                contents = self.parse_block_node(-1);
            }
        }
        if contents.is_none() {
            self.skip_to_content();
            if !self.at_eof() && !self.at_document_marker() {
                contents = self.parse_block_node(-1);
            }
        }

        // Anything left before the next marker does not belong to the root node.
        loop {
            self.skip_to_content();
            if self.at_eof() {
                break;
            }
            if self.at_document_marker() {
                if self.current_text() == "..." {
                    self.bump();
                    self.skip_to_line_end();
                }
                break;
            }
            self.skip_unexpected_lines(-1, "Unexpected content after the document root");
        }

        let end = self.prev_end().max(start);
        let errors = std::mem::take(&mut self.errors);
        self.documents.push(YamlDocument {
            contents,
            range: TextRange::new(start, end),
            errors,
        });
    }

    fn parse_directives(&mut self) {
        while self.at(TokenKind::Word)
            && self.current_text().starts_with('%')
            && self.current_column() == 0
        {
            let start = self.current_offset();
            let name = self.current_text();
            self.skip_to_line_end();
            if name != "%YAML" && name != "%TAG" {
                let name = name.trim_start_matches('%');
                self.error(ParseError::warning(
                    format!("YAML only supports %TAG and %YAML directives, and not %{name}"),
                    TextRange::new(start, self.prev_end()),
                ));
            }
            self.skip_to_content();
        }
    }

    // =========================================================================
    // Block nodes
    // =========================================================================

    /// Parse the node starting at the cursor. `parent_indent` is the column
    /// of the enclosing collection, or -1 at the document root.
    fn parse_block_node(&mut self, parent_indent: i32) -> Option<Node> {
        self.skip_properties();
        if self.at_line_end() {
            return self.parse_indented_value(parent_indent, false);
        }
        let column = self.current_column();
        if self.at_sequence_indicator() {
            return Some(self.parse_block_sequence(column));
        }
        if self.key_indicator().is_some() {
            return Some(self.parse_block_mapping(column));
        }
        self.parse_inline_value(parent_indent)
    }

    /// A value that starts on a following line, deeper than `parent_indent`.
    /// A mapping value may also be a sequence at the mapping's own column.
    fn parse_indented_value(&mut self, parent_indent: i32, allow_same_indent_seq: bool) -> Option<Node> {
        let save = self.pos;
        self.skip_to_content();
        if self.at_eof() || self.at_document_marker() {
            self.pos = save;
            return None;
        }
        let column = self.current_column();
        if column > parent_indent {
            return self.parse_block_node(parent_indent);
        }
        if allow_same_indent_seq && column == parent_indent && self.at_sequence_indicator() {
            return Some(self.parse_block_sequence(column));
        }
        self.pos = save;
        None
    }

    fn parse_block_sequence(&mut self, indent: i32) -> Node {
        let start = self.current_offset();
        let mut end = start;
        let mut items = Vec::new();

        loop {
            self.bump();
            self.skip_inline_space();
            let null_at = self.current_offset();

            let item = if self.at_line_end() {
                self.parse_indented_value(indent, false)
            } else {
                self.parse_block_node(indent)
            };
            let item = item.unwrap_or_else(|| Node::Scalar(Scalar::null(null_at)));
            end = end.max(item.range().end());
            items.push(item);

            // Next entry, or the end of this sequence.
            let save = self.pos;
            self.skip_to_content();
            if self.at_eof() || self.at_document_marker() {
                self.pos = save;
                break;
            }
            let column = self.current_column();
            if column == indent && self.at_sequence_indicator() {
                continue;
            }
            if column > indent {
                self.skip_unexpected_lines(indent, "Unexpected indentation in a block sequence");
                let save = self.pos;
                self.skip_to_content();
                if !self.at_eof() && self.current_column() == indent && self.at_sequence_indicator() {
                    continue;
                }
                self.pos = save;
                break;
            }
            self.pos = save;
            break;
        }

        Node::Sequence(Sequence {
            range: TextRange::new(start, end),
            items,
        })
    }

    fn parse_block_mapping(&mut self, indent: i32) -> Node {
        let start = self.current_offset();
        let mut end = start;
        let mut items: Vec<Pair> = Vec::new();
        let mut seen: FxHashSet<SmolStr> = FxHashSet::default();

        loop {
            match self.parse_block_key() {
                Some(key) => {
                    if let Some(name) = key.as_str() {
                        if !seen.insert(SmolStr::new(name)) {
                            self.error(ParseError::semantic("Map keys must be unique", key.range()));
                        }
                    }
                    self.skip_inline_space();
                    let null_at = self.current_offset();
                    let value = if self.at_line_end() {
                        self.parse_indented_value(indent, true)
                    } else {
                        self.skip_properties();
                        if self.at_line_end() {
                            self.parse_indented_value(indent, true)
                        } else {
                            self.parse_inline_value(indent)
                        }
                    };
                    let value = value.unwrap_or_else(|| Node::Scalar(Scalar::null(null_at)));
                    let pair = Pair::new(key, value);
                    end = end.max(pair.range().end());
                    items.push(pair);
                }
                None => {
                    let line_start = self.current_offset();
                    self.skip_to_line_end();
                    self.error(ParseError::syntax(
                        "Implicit map keys need to be followed by map values",
                        TextRange::new(line_start, self.prev_end()),
                    ));
                }
            }

            let save = self.pos;
            self.skip_to_content();
            if self.at_eof() || self.at_document_marker() {
                self.pos = save;
                break;
            }
            let column = self.current_column();
            if column == indent {
                if self.at_sequence_indicator() {
                    self.skip_unexpected_lines(
                        indent,
                        "A block sequence may not be used as an implicit map key",
                    );
                    let save = self.pos;
                    self.skip_to_content();
                    if self.at_eof() || self.current_column() != indent || self.at_document_marker() {
                        self.pos = save;
                        break;
                    }
                }
                continue;
            }
            if column > indent {
                self.skip_unexpected_lines(indent, "Unexpected indentation in a block mapping");
                let save = self.pos;
                self.skip_to_content();
                if !self.at_eof()
                    && self.current_column() == indent
                    && !self.at_document_marker()
                    && !self.at_sequence_indicator()
                {
                    continue;
                }
                self.pos = save;
                break;
            }
            self.pos = save;
            break;
        }

        Node::Mapping(Mapping {
            range: TextRange::new(start, end),
            items,
        })
    }

    /// Parse `key:` at the cursor, consuming the indicator.
    fn parse_block_key(&mut self) -> Option<Node> {
        let indicator = self.key_indicator()?;
        let first = self.current()?.clone();
        let colon = self.tokens.get(indicator)?.clone();

        let key = if indicator == self.pos + 1
            && colon.text == ":"
            && matches!(first.kind, TokenKind::SingleQuoted | TokenKind::DoubleQuoted)
        {
            self.quoted_scalar(&first)
        } else {
            let key_end = colon.end() - TextSize::new(1);
            let raw = self.slice(TextRange::new(first.offset, key_end));
            let trimmed = raw.trim_end();
            let range = TextRange::at(first.offset, TextSize::of(trimmed));
            if self.tokens[self.pos..indicator]
                .iter()
                .any(|t| t.kind == TokenKind::Error)
            {
                self.error(ParseError::syntax("Missing closing quote", range));
            }
            Scalar::new(range, trimmed, ScalarStyle::Plain)
        };

        self.pos = indicator + 1;
        Some(Node::Scalar(key))
    }

    /// Anchors and tags before a node. Anchors are remembered for alias checks.
    fn skip_properties(&mut self) {
        loop {
            match self.current_kind() {
                Some(TokenKind::Anchor) => {
                    let name = self.current_text().trim_start_matches('&');
                    self.anchors.insert(SmolStr::new(name));
                    self.bump();
                }
                Some(TokenKind::Tag) => {
                    self.bump();
                }
                _ => return,
            }
            self.skip_inline_space();
        }
    }

    // =========================================================================
    // Inline values
    // =========================================================================

    /// A value that starts on the current line and is not a block collection.
    fn parse_inline_value(&mut self, parent_indent: i32) -> Option<Node> {
        let token = self.current()?.clone();
        let node = match token.kind {
            TokenKind::LBracket | TokenKind::LBrace => self.parse_flow_collection(),
            TokenKind::SingleQuoted | TokenKind::DoubleQuoted => {
                self.bump();
                Node::Scalar(self.quoted_scalar(&token))
            }
            TokenKind::Alias => {
                self.bump();
                Node::Scalar(self.alias_scalar(&token))
            }
            TokenKind::BlockScalarHeader => self.parse_block_scalar(parent_indent),
            TokenKind::Error if token.text.starts_with(['"', '\'']) => {
                return Some(Node::Scalar(self.unclosed_quote(&token)));
            }
            TokenKind::RBracket | TokenKind::RBrace | TokenKind::Comma => {
                self.skip_to_line_end();
                let range = TextRange::new(token.offset, self.prev_end());
                self.error(ParseError::syntax(
                    format!("Unexpected flow indicator {}", token.text),
                    range,
                ));
                return None;
            }
            _ => return Some(self.parse_plain_scalar(parent_indent)),
        };
        self.expect_line_end();
        Some(node)
    }

    /// Only a comment may follow a quoted scalar or flow collection.
    fn expect_line_end(&mut self) {
        self.skip_inline_space();
        if self.at_line_end() {
            return;
        }
        let start = self.current_offset();
        self.skip_to_line_end();
        self.error(ParseError::syntax(
            "Unexpected content after a complete value",
            TextRange::new(start, self.prev_end()),
        ));
    }

    fn quoted_scalar(&self, token: &Token<'_>) -> Scalar {
        let range = TextRange::at(token.offset, TextSize::of(token.text));
        let inner = &token.text[1..token.text.len().saturating_sub(1).max(1)];
        if token.kind == TokenKind::SingleQuoted {
            let folded = fold_quoted_lines(inner, false);
            Scalar::new(range, folded.replace("''", "'"), ScalarStyle::SingleQuoted)
        } else {
            let folded = fold_quoted_lines(inner, true);
            Scalar::new(range, unescape_double_quoted(&folded), ScalarStyle::DoubleQuoted)
        }
    }

    /// An unterminated quote: report it and keep the rest of the line as its value.
    fn unclosed_quote(&mut self, token: &Token<'_>) -> Scalar {
        self.skip_to_line_end();
        let range = TextRange::new(token.offset, self.prev_end());
        self.error(ParseError::syntax("Missing closing quote", range));
        let raw = self.slice(range).trim_start_matches(['"', '\'']);
        let style = if token.text.starts_with('"') {
            ScalarStyle::DoubleQuoted
        } else {
            ScalarStyle::SingleQuoted
        };
        Scalar::new(range, raw, style)
    }

    fn alias_scalar(&mut self, token: &Token<'_>) -> Scalar {
        let range = TextRange::at(token.offset, TextSize::of(token.text));
        let name = token.text.trim_start_matches('*');
        if !self.anchors.contains(name) {
            self.error(ParseError::reference(format!("Aliased anchor not found: {name}"), range));
        }
        Scalar::new(range, name, ScalarStyle::Alias)
    }

    /// Plain scalar from the cursor to the end of the line, folded with any
    /// continuation lines indented deeper than `parent_indent`.
    fn parse_plain_scalar(&mut self, parent_indent: i32) -> Node {
        let start = self.current_offset();
        let mut end = self.plain_line_end();
        let mut value = self.slice(TextRange::new(start, end)).to_string();
        self.seek(end);

        loop {
            let save = self.pos;
            self.skip_to_content();
            if self.at_eof()
                || self.current_column() <= parent_indent
                || self.at_document_marker()
                || self.at_sequence_indicator()
                || self.key_indicator().is_some()
            {
                self.pos = save;
                break;
            }
            let line_start = self.current_offset();
            let line_end = self.plain_line_end();
            value.push(' ');
            value.push_str(self.slice(TextRange::new(line_start, line_end)));
            end = line_end;
            self.seek(end);
        }

        Node::Scalar(Scalar::new(TextRange::new(start, end), value, ScalarStyle::Plain))
    }

    /// End of the last non-space token on the cursor's line, before any comment.
    /// A quote inside a plain scalar is text, so a quoted token running onto
    /// later lines is cut at its first line break.
    fn plain_line_end(&self) -> TextSize {
        let mut end = self.current_offset();
        let mut idx = self.pos;
        while let Some(t) = self.tokens.get(idx) {
            match t.kind {
                TokenKind::Newline | TokenKind::Comment => break,
                TokenKind::Space | TokenKind::Tab => {}
                _ => {
                    if let Some(line_len) = t.text.find(['\r', '\n']) {
                        let first_line = t.text[..line_len].trim_end_matches([' ', '\t']);
                        return t.offset + TextSize::of(first_line);
                    }
                    end = t.end();
                }
            }
            idx += 1;
        }
        end
    }

    /// `|` or `>` block scalar. The content is every following line that is
    /// blank or indented at least as deep as the first content line.
    fn parse_block_scalar(&mut self, parent_indent: i32) -> Node {
        let Some(header) = self.bump() else {
            return Node::Scalar(Scalar::new(TextRange::empty(self.current_offset()), "", ScalarStyle::Literal));
        };
        let folded = header.text.starts_with('>');
        let chomp = if header.text.contains('-') {
            Chomp::Strip
        } else if header.text.contains('+') {
            Chomp::Keep
        } else {
            Chomp::Clip
        };
        let explicit_indent = header
            .text
            .chars()
            .find_map(|c| c.to_digit(10))
            .filter(|d| *d > 0)
            .map(|d| parent_indent.max(0) + d as i32);
        self.expect_line_end();

        let header_line = self.line_index.line_col(header.offset).line;
        let mut content_indent = explicit_indent;
        let mut lines: Vec<&str> = Vec::new();
        let mut end = header.end();
        let mut line = header_line + 1;

        while let Some(range) = self.line_index.line_range(line) {
            let raw = self.slice(range).trim_end_matches('\r');
            let blank = raw.trim().is_empty();
            let indent = (raw.len() - raw.trim_start_matches(' ').len()) as i32;
            if !blank {
                let required = *content_indent.get_or_insert(indent);
                if indent < required || indent <= parent_indent {
                    break;
                }
                if parent_indent < 0 && indent == 0 && matches!(raw.get(..3), Some("---" | "...")) {
                    break;
                }
                end = range.start() + TextSize::of(raw);
            }
            lines.push(raw);
            line += 1;
        }

        // Trailing blank lines past the last content line are not part of the node.
        let content_lines = {
            let last_content = lines.iter().rposition(|l| !l.trim().is_empty());
            match last_content {
                Some(idx) => idx + 1,
                None => 0,
            }
        };
        let trailing_blank = lines.len() - content_lines;
        let strip = content_indent.unwrap_or(0).max(0) as usize;
        let body: Vec<&str> = lines[..content_lines]
            .iter()
            .map(|l| l.get(strip..).unwrap_or(""))
            .collect();

        let mut value = if folded { fold_lines(&body) } else { body.join("\n") };
        if content_lines > 0 {
            match chomp {
                Chomp::Strip => {}
                Chomp::Clip => value.push('\n'),
                Chomp::Keep => {
                    value.push('\n');
                    for _ in 0..trailing_blank {
                        value.push('\n');
                    }
                }
            }
        }

        if content_lines > 0 {
            self.seek(end);
        }
        let style = if folded { ScalarStyle::Folded } else { ScalarStyle::Literal };
        Node::Scalar(Scalar::new(TextRange::new(header.offset, end), value, style))
    }

    // =========================================================================
    // Flow collections
    // =========================================================================

    fn skip_flow_trivia(&mut self) {
        while self.current_kind().is_some_and(TokenKind::is_trivia) {
            self.pos += 1;
        }
    }

    fn parse_flow_collection(&mut self) -> Node {
        let Some(open) = self.bump() else {
            return Node::Sequence(Sequence {
                range: TextRange::empty(self.current_offset()),
                items: Vec::new(),
            });
        };
        let is_map = open.kind == TokenKind::LBrace;
        let close = if is_map { TokenKind::RBrace } else { TokenKind::RBracket };
        let mut pairs: Vec<Pair> = Vec::new();
        let mut items: Vec<Node> = Vec::new();
        let mut seen: FxHashSet<SmolStr> = FxHashSet::default();
        let end;

        loop {
            self.skip_flow_trivia();
            let Some(token) = self.current().cloned() else {
                let range = TextRange::new(open.offset, TextSize::of(self.text));
                let closer = if is_map { '}' } else { ']' };
                self.error(ParseError::syntax(format!("Expected flow collection to end with {closer}"), range));
                end = self.prev_end();
                break;
            };
            if token.kind == close {
                self.bump();
                end = token.end();
                break;
            }
            if token.kind.is_flow_close() {
                self.error(ParseError::syntax(
                    format!("Unexpected {} in flow collection", token.text),
                    TextRange::at(token.offset, TextSize::of(token.text)),
                ));
                self.bump();
                end = token.end();
                break;
            }
            if token.kind == TokenKind::Comma {
                self.error(ParseError::syntax(
                    "Unexpected , in flow collection",
                    TextRange::at(token.offset, TextSize::of(token.text)),
                ));
                self.bump();
                continue;
            }

            let before = self.pos;
            let (node, has_colon) = self.parse_flow_node();
            let value = if has_colon {
                self.skip_flow_trivia();
                if self.at(TokenKind::Comma) || self.current_kind().is_some_and(TokenKind::is_flow_close) {
                    None
                } else {
                    self.parse_flow_node().0
                }
            } else {
                None
            };
            let null_at = self.prev_end();
            let value = value.unwrap_or_else(|| Node::Scalar(Scalar::null(null_at)));

            match node {
                Some(key) if is_map => {
                    if let Some(name) = key.as_str() {
                        if !seen.insert(SmolStr::new(name)) {
                            self.error(ParseError::semantic("Map keys must be unique", key.range()));
                        }
                    }
                    pairs.push(Pair::new(key, value));
                }
                Some(node) if has_colon => {
                    let pair = Pair::new(node, value);
                    items.push(Node::Mapping(Mapping {
                        range: pair.range(),
                        items: vec![pair],
                    }));
                }
                Some(node) => items.push(node),
                None => {}
            }

            self.skip_flow_trivia();
            if self.at(TokenKind::Comma) {
                self.bump();
            } else if !self.at_eof() && !self.current_kind().is_some_and(TokenKind::is_flow_close) {
                let offset = self.current_offset();
                self.error(ParseError::syntax(
                    "Missing , between flow collection items",
                    TextRange::empty(offset),
                ));
                if self.pos == before {
                    self.bump();
                }
            }
        }

        let range = TextRange::new(open.offset, end.max(open.end()));
        if is_map {
            Node::Mapping(Mapping { range, items: pairs })
        } else {
            Node::Sequence(Sequence { range, items })
        }
    }

    /// One flow entry. Returns the node and whether a `:` indicator followed it.
    fn parse_flow_node(&mut self) -> (Option<Node>, bool) {
        self.skip_properties();
        self.skip_flow_trivia();
        let Some(token) = self.current().cloned() else {
            return (None, false);
        };
        match token.kind {
            TokenKind::LBracket | TokenKind::LBrace => {
                let node = self.parse_flow_collection();
                (Some(node), self.eat_flow_colon())
            }
            TokenKind::SingleQuoted | TokenKind::DoubleQuoted => {
                self.bump();
                let node = Node::Scalar(self.quoted_scalar(&token));
                (Some(node), self.eat_flow_colon())
            }
            TokenKind::Alias => {
                self.bump();
                let node = Node::Scalar(self.alias_scalar(&token));
                (Some(node), self.eat_flow_colon())
            }
            TokenKind::Word | TokenKind::BlockScalarHeader => self.parse_flow_plain(),
            TokenKind::Error if token.text.starts_with(['"', '\'']) => {
                self.bump();
                let range = TextRange::at(token.offset, TextSize::of(token.text));
                self.error(ParseError::syntax("Missing closing quote", range));
                let raw = token.text.trim_start_matches(['"', '\'']);
                (Some(Node::Scalar(Scalar::new(range, raw, ScalarStyle::Plain))), false)
            }
            _ => {
                self.error(ParseError::syntax(
                    format!("Unexpected {} in flow collection", token.text),
                    TextRange::at(token.offset, TextSize::of(token.text)),
                ));
                self.bump();
                (None, false)
            }
        }
    }

    /// `:` directly after a flow key.
    fn eat_flow_colon(&mut self) -> bool {
        let save = self.pos;
        self.skip_inline_space();
        if self.at(TokenKind::Word) && self.current_text() == ":" {
            self.bump();
            return true;
        }
        self.pos = save;
        false
    }

    /// Plain words up to a flow indicator, comment or newline. A word ending
    /// in `:` before a separator closes the scalar as a key.
    fn parse_flow_plain(&mut self) -> (Option<Node>, bool) {
        let start = self.current_offset();
        let mut end = start;
        let mut has_colon = false;
        while let Some(token) = self.current().cloned() {
            match token.kind {
                TokenKind::Word | TokenKind::BlockScalarHeader | TokenKind::Error => {
                    let next_is_separator = self
                        .nth_token(1)
                        .is_none_or(|t| t.kind.is_trivia() || t.kind == TokenKind::Comma || t.kind.is_flow_close());
                    self.bump();
                    if token.text.ends_with(':') && next_is_separator {
                        end = token.end() - TextSize::new(1);
                        has_colon = true;
                        break;
                    }
                    end = token.end();
                }
                TokenKind::Space | TokenKind::Tab => {
                    self.bump();
                }
                _ => break,
            }
        }
        let raw = self.slice(TextRange::new(start, end.max(start))).trim_end();
        let range = TextRange::at(start, TextSize::of(raw));
        (Some(Node::Scalar(Scalar::new(range, raw, ScalarStyle::Plain))), has_colon)
    }
}

#[derive(Clone, Copy)]
enum Chomp {
    Strip,
    Clip,
    Keep,
}

/// Folded block scalar: single line breaks become spaces, blank lines become newlines.
fn fold_lines(lines: &[&str]) -> String {
    let mut out = String::new();
    let mut pending_break = false;
    for (idx, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            out.push('\n');
            pending_break = false;
            continue;
        }
        if idx > 0 && pending_break {
            out.push(' ');
        }
        out.push_str(line);
        pending_break = true;
    }
    out
}

/// Line folding inside a quoted scalar. Each line break and the whitespace
/// around it becomes one space, or a newline per empty line in between. In
/// double quotes a `\` before the break joins the lines without a space.
fn fold_quoted_lines(inner: &str, double: bool) -> String {
    if !inner.contains('\n') {
        return inner.to_string();
    }
    let lines: Vec<&str> = inner.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    let last = lines.len() - 1;
    let mut out = String::with_capacity(inner.len());
    let mut empty_lines = 0;
    let mut escaped_break = false;
    for (idx, line) in lines.iter().enumerate() {
        let mut line = *line;
        if idx > 0 {
            line = line.trim_start_matches([' ', '\t']);
        }
        if idx < last {
            line = line.trim_end_matches([' ', '\t']);
        }
        if idx > 0 {
            if line.is_empty() && idx < last {
                empty_lines += 1;
                continue;
            }
            if empty_lines > 0 {
                out.push_str(&"\n".repeat(empty_lines));
            } else if !escaped_break {
                out.push(' ');
            }
            empty_lines = 0;
        }
        escaped_break = false;
        if double && idx < last && ends_with_escape(line) {
            line = &line[..line.len() - 1];
            escaped_break = true;
        }
        out.push_str(line);
    }
    out
}

/// Whether `line` ends in an unescaped backslash.
fn ends_with_escape(line: &str) -> bool {
    let trailing = line.len() - line.trim_end_matches('\\').len();
    trailing % 2 == 1
}

fn unescape_double_quoted(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('x') => push_code_point(&mut out, &mut chars, 2),
            Some('u') => push_code_point(&mut out, &mut chars, 4),
            Some('U') => push_code_point(&mut out, &mut chars, 8),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn push_code_point(out: &mut String, chars: &mut std::str::Chars<'_>, digits: usize) {
    let hex: String = chars.by_ref().take(digits).collect();
    match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
        Some(c) => out.push(c),
        None => out.push_str(&hex),
    }
}
