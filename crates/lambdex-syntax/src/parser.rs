//! Python front end for lambdex.
//!
//! Sources are parsed once with tree-sitter and kept next to their concrete
//! syntax tree, so every later pass (token classification, lowering, pattern
//! search) can slice node text without re-reading the input.

use std::ops::Range;

use crate::error::SyntaxError;
use crate::position::Position;

/// A Python module together with its tree-sitter tree.
///
/// Tree-sitter recovers from malformed input, so a tree may contain `ERROR`
/// or missing nodes. Callers that need a clean module check
/// [`ParseResult::has_errors`] before walking it.
#[derive(Debug)]
pub struct ParseResult {
    tree: tree_sitter::Tree,
    source: String,
}

impl ParseResult {
    /// The concrete syntax tree.
    #[must_use]
    pub const fn tree(&self) -> &tree_sitter::Tree {
        &self.tree
    }

    /// The text the tree was built from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The `module` node at the top of the tree.
    #[must_use]
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Slices the source covered by `node`.
    ///
    /// Nodes from another tree yield an empty string rather than panicking.
    #[must_use]
    pub fn node_text(&self, node: tree_sitter::Node<'_>) -> &str {
        self.source.get(node.byte_range()).unwrap_or_default()
    }

    /// True when recovery inserted `ERROR` or missing nodes anywhere.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.root_node().has_error()
    }

    /// Lists the recovery nodes in document order.
    #[must_use]
    pub fn errors(&self) -> Vec<SyntaxErrorInfo> {
        let mut found = Vec::new();
        if !self.has_errors() {
            return found;
        }

        let mut cursor = self.tree.walk();
        'walk: loop {
            let node = cursor.node();
            if node.is_error() || node.is_missing() {
                found.push(SyntaxErrorInfo::from(node));
            }

            // Only descend into subtrees that still hold a recovery node.
            if node.has_error() && cursor.goto_first_child() {
                continue;
            }
            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    break 'walk;
                }
            }
        }
        found
    }
}

/// One recovery node reported by tree-sitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxErrorInfo {
    /// Bytes of the source spanned by the node.
    pub byte_range: Range<usize>,
    /// One-based line of the node start.
    pub line: u32,
    /// One-based column of the node start.
    pub column: u32,
    /// `missing <kind>` for inserted tokens, `syntax error` otherwise.
    pub message: String,
}

impl From<tree_sitter::Node<'_>> for SyntaxErrorInfo {
    fn from(node: tree_sitter::Node<'_>) -> Self {
        let (line, column) = Position::from(node.start_position()).one_based();
        let message = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            String::from("syntax error")
        };
        Self {
            byte_range: node.byte_range(),
            line,
            column,
            message,
        }
    }
}

/// A reusable tree-sitter parser bound to the Python grammar.
pub struct Parser {
    ts: tree_sitter::Parser,
}

impl Parser {
    /// Binds a fresh tree-sitter parser to the Python grammar.
    ///
    /// # Errors
    ///
    /// Fails with [`SyntaxError::ParserInit`] when the linked grammar is
    /// ABI-incompatible with the tree-sitter runtime.
    pub fn new() -> Result<Self, SyntaxError> {
        let grammar: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        let mut ts = tree_sitter::Parser::new();
        ts.set_language(&grammar)
            .map_err(|error| SyntaxError::parser_init(error.to_string()))?;
        Ok(Self { ts })
    }

    /// Parses `source` into a [`ParseResult`] that owns a copy of it.
    ///
    /// # Errors
    ///
    /// Fails with [`SyntaxError::Parse`] when tree-sitter returns no tree.
    pub fn parse(&mut self, source: &str) -> Result<ParseResult, SyntaxError> {
        match self.ts.parse(source, None) {
            Some(tree) => Ok(ParseResult {
                tree,
                source: source.to_owned(),
            }),
            None => Err(SyntaxError::parse("tree-sitter produced no tree")),
        }
    }
}

/// One-shot parse with a throwaway [`Parser`].
///
/// # Errors
///
/// See [`Parser::new`] and [`Parser::parse`].
pub fn parse_source(source: &str) -> Result<ParseResult, SyntaxError> {
    Parser::new()?.parse(source)
}
