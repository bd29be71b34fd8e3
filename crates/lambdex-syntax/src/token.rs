//! Token classification over the concrete syntax tree.
//!
//! The formatter needs a flat token stream alongside the tree. Tokens are the
//! leaves of the Tree-sitter tree, in source order; the text between leaves is
//! emitted as synthetic whitespace and newline tokens so that concatenating
//! every token string reproduces the parsed source exactly.

use std::fmt;

use crate::parser::ParseResult;
use crate::position::{Position, Span};

/// Exact lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExactType {
    /// Identifiers and keywords.
    Name,
    /// Integer, float and imaginary literals.
    Number,
    /// String literals, including f-strings, as one token.
    String,
    /// `(`
    LPar,
    /// `)`
    RPar,
    /// `[`
    LSqb,
    /// `]`
    RSqb,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `;`
    Semi,
    /// Any other operator or delimiter.
    Op,
    /// A `#` comment.
    Comment,
    /// A line break.
    Newline,
    /// Spaces, tabs and backslash continuations.
    Whitespace,
}

impl ExactType {
    /// Returns whether tokens of this type carry their string in dispatch
    /// keys.
    #[must_use]
    pub const fn is_named(self) -> bool {
        matches!(self, Self::Name)
    }

    /// Returns whether this type opens a bracket pair.
    #[must_use]
    pub const fn is_open_bracket(self) -> bool {
        matches!(self, Self::LPar | Self::LSqb | Self::LBrace)
    }

    /// Returns whether this type closes a bracket pair.
    #[must_use]
    pub const fn is_close_bracket(self) -> bool {
        matches!(self, Self::RPar | Self::RSqb | Self::RBrace)
    }

    fn from_punctuation(text: &str) -> Option<Self> {
        let exact = match text {
            "(" => Self::LPar,
            ")" => Self::RPar,
            "[" => Self::LSqb,
            "]" => Self::RSqb,
            "{" => Self::LBrace,
            "}" => Self::RBrace,
            ":" => Self::Colon,
            "," => Self::Comma,
            "." => Self::Dot,
            ";" => Self::Semi,
            _ => return None,
        };
        Some(exact)
    }
}

impl fmt::Display for ExactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An immutable lexical token borrowed from the parsed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    exact_type: ExactType,
    string: &'a str,
    span: Span,
}

impl<'a> Token<'a> {
    /// Creates a token.
    #[must_use]
    pub const fn new(exact_type: ExactType, string: &'a str, span: Span) -> Self {
        Self {
            exact_type,
            string,
            span,
        }
    }

    /// Returns the exact lexical type.
    #[must_use]
    pub const fn exact_type(&self) -> ExactType {
        self.exact_type
    }

    /// Returns the token text.
    #[must_use]
    pub const fn string(&self) -> &'a str {
        self.string
    }

    /// Returns where the token sits in the source.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Returns whether the token is whitespace, a newline, or a comment.
    ///
    /// Insignificant tokens never take part in dispatch.
    #[must_use]
    pub const fn is_insignificant(&self) -> bool {
        matches!(
            self.exact_type,
            ExactType::Whitespace | ExactType::Newline | ExactType::Comment
        )
    }
}

/// Produces the token stream for a parsed source.
///
/// Leaves are emitted in source order. `string` nodes are treated as single
/// tokens even though Tree-sitter splits them into parts. Zero-width leaves
/// (inserted by error recovery) are skipped, and backslash continuations are
/// folded into the surrounding whitespace.
#[must_use]
pub fn tokenize(parsed: &ParseResult) -> Vec<Token<'_>> {
    let source = parsed.source();
    let mut collector = Collector {
        source,
        tokens: Vec::new(),
        offset: 0,
        position: Position::default(),
    };
    collector.visit(parsed.root_node());
    collector.gap_until(source.len());
    collector.tokens
}

struct Collector<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    offset: usize,
    position: Position,
}

impl<'a> Collector<'a> {
    fn visit(&mut self, node: tree_sitter::Node<'_>) {
        let is_leaf = node.child_count() == 0 || matches!(node.kind(), "string" | "comment");
        if !is_leaf {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                self.visit(child);
            }
            return;
        }

        let range = node.byte_range();
        if range.is_empty() || range.start < self.offset || node.kind() == "line_continuation" {
            return;
        }

        self.gap_until(range.start);
        let Some(text) = self.source.get(range.clone()) else {
            return;
        };
        let exact_type = classify_leaf(node.kind(), text);
        let end = node.end_position().into();
        self.tokens
            .push(Token::new(exact_type, text, Span::new(range.clone(), self.position, end)));
        self.offset = range.end;
        self.position = end;
    }

    /// Emits whitespace and newline tokens for the text between the last leaf
    /// and `until`.
    fn gap_until(&mut self, until: usize) {
        while self.offset < until {
            let Some(rest) = self.source.get(self.offset..until) else {
                return;
            };
            let (exact_type, len) = split_gap(rest);
            let start = self.position;
            let range = self.offset..self.offset + len;
            let Some(text) = self.source.get(range.clone()) else {
                return;
            };
            let end = advance(start, text);
            self.tokens
                .push(Token::new(exact_type, text, Span::new(range, start, end)));
            self.offset += len;
            self.position = end;
        }
    }
}

/// Splits the leading token off a gap between leaves.
fn split_gap(rest: &str) -> (ExactType, usize) {
    if rest.starts_with("\r\n") {
        return (ExactType::Newline, 2);
    }
    if rest.starts_with('\n') || rest.starts_with('\r') {
        return (ExactType::Newline, 1);
    }

    let mut len = 0;
    let mut chars = rest.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        match ch {
            '\r' | '\n' => break,
            '\\' => {
                // A line continuation swallows the following line break.
                len = index + 1;
                if let Some((next_index, next)) = chars.peek().copied()
                    && (next == '\n' || next == '\r')
                {
                    chars.next();
                    len = next_index + 1;
                    if next == '\r' && chars.peek().is_some_and(|(_, c)| *c == '\n') {
                        len += 1;
                        chars.next();
                    }
                }
            }
            other => len = index + other.len_utf8(),
        }
    }

    (ExactType::Whitespace, len.max(1))
}

fn advance(start: Position, text: &str) -> Position {
    let mut position = start;
    for (index, ch) in text.char_indices() {
        if ch == '\n' {
            position.row += 1;
            position.column = 0;
        } else if ch == '\r' && !text.get(index + 1..).is_some_and(|rest| rest.starts_with('\n')) {
            position.row += 1;
            position.column = 0;
        } else if ch != '\r' {
            position.column += ch.len_utf8();
        }
    }
    position
}

fn classify_leaf(kind: &str, text: &str) -> ExactType {
    match kind {
        "comment" => return ExactType::Comment,
        "string" => return ExactType::String,
        "integer" | "float" => return ExactType::Number,
        _ => {}
    }

    if let Some(exact) = ExactType::from_punctuation(text) {
        return exact;
    }

    if is_identifier(text) {
        ExactType::Name
    } else {
        ExactType::Op
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|first| first == '_' || first.is_alphabetic())
        && chars.all(|ch| ch == '_' || ch.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use rstest::rstest;

    fn kinds(source: &str) -> Vec<(ExactType, String)> {
        let parsed = parse_source(source).expect("parse");
        tokenize(&parsed)
            .iter()
            .map(|token| (token.exact_type(), token.string().to_owned()))
            .collect()
    }

    #[test]
    fn tokens_cover_source_exactly() {
        let source = "f = def_(lambda a, b: [  # body\n    c := a + b,\n    return_[c]\n])\n";
        let parsed = parse_source(source).expect("parse");
        let rebuilt: String = tokenize(&parsed).iter().map(Token::string).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn keywords_and_identifiers_are_names() {
        let tokens = kinds("lambda x: x");
        assert_eq!(
            tokens.first(),
            Some(&(ExactType::Name, "lambda".to_owned()))
        );
        assert!(tokens.contains(&(ExactType::Colon, ":".to_owned())));
    }

    #[test]
    fn strings_are_single_tokens() {
        let tokens = kinds("x = f'{a} and {b}'\n");
        let strings: Vec<_> = tokens
            .iter()
            .filter(|(kind, _)| *kind == ExactType::String)
            .collect();
        assert_eq!(strings.len(), 1);
        assert_eq!(
            strings.first().map(|(_, text)| text.as_str()),
            Some("f'{a} and {b}'")
        );
    }

    #[rstest]
    #[case(ExactType::Whitespace, true)]
    #[case(ExactType::Newline, true)]
    #[case(ExactType::Comment, true)]
    #[case(ExactType::Name, false)]
    #[case(ExactType::LPar, false)]
    fn insignificance_follows_exact_type(#[case] exact_type: ExactType, #[case] expected: bool) {
        let token = Token::new(exact_type, "", Span::default());
        assert_eq!(token.is_insignificant(), expected);
    }

    #[test]
    fn newline_tokens_advance_rows() {
        let parsed = parse_source("a\nb\n").expect("parse");
        let tokens = tokenize(&parsed);
        let b = tokens
            .iter()
            .find(|token| token.string() == "b")
            .expect("token b");
        assert_eq!(b.span().start, Position::new(1, 0));
    }

    #[test]
    fn line_continuation_is_whitespace() {
        let tokens = kinds("x = 1 + \\\n    2\n");
        assert!(
            tokens
                .iter()
                .any(|(kind, text)| *kind == ExactType::Whitespace && text.contains('\\'))
        );
        let significant: Vec<_> = tokens
            .iter()
            .filter(|(kind, _)| !matches!(kind, ExactType::Whitespace | ExactType::Newline))
            .map(|(_, text)| text.as_str())
            .collect();
        assert_eq!(significant, ["x", "=", "1", "+", "2"]);
    }
}
