//! Structural search over the owned syntax tree.
//!
//! [`find_matches`] walks a tree depth-first and yields every node matching a
//! [`NodePattern`]. A matched node's descendants are still searched, so nested
//! calls are reported alongside the call that contains them.
//!
//! [`extract_single_call`] and [`lambda_to_ast`] build on it to recover the
//! call expression that defines one extended lambda, insisting that exactly
//! one candidate exists.

mod pattern;

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use tracing::debug;

pub use pattern::{ArgsPattern, NodePattern};

use crate::ast::{Node, NodeKind, lower};
use crate::error::SyntaxError;
use crate::parser::parse_source;

const SEARCH_TARGET: &str = "lambdex_syntax::search";

/// Finds all nodes under `root` (inclusive) matching `pattern`, in pre-order.
#[must_use]
pub fn find_matches<'a>(root: &'a Node, pattern: &NodePattern) -> Vec<&'a Node> {
    let mut results = Vec::new();
    find_matches_recursive(root, pattern, &mut results);
    results
}

fn find_matches_recursive<'a>(node: &'a Node, pattern: &NodePattern, results: &mut Vec<&'a Node>) {
    if pattern.matches(node) {
        results.push(node);
    }
    for child in node.children() {
        find_matches_recursive(child, pattern, results);
    }
}

/// Extracts the single `keyword[.identifier](...)` call defined by `source`.
///
/// `source` is the text of the statement that defines the callable; common
/// leading indentation is removed before parsing and only the first statement
/// is searched.
///
/// # Errors
///
/// Returns [`SyntaxError::NotFound`] when no call matches,
/// [`SyntaxError::Ambiguous`] when several do, and a parse or pattern error
/// when the fragment or names are invalid.
pub fn extract_single_call(
    source: &str,
    keyword: &str,
    identifier: &str,
) -> Result<Node, SyntaxError> {
    let pattern = NodePattern::single_call(keyword, identifier)?;
    let fragment = dedent(source);
    let parsed = parse_source(&fragment)?;
    if let Some(error) = parsed.errors().first() {
        return Err(SyntaxError::parse(format!(
            "line {}, column {}: {}",
            error.line, error.column, error.message
        )));
    }

    let NodeKind::Module { statements } = lower(&parsed).into_kind() else {
        return Err(SyntaxError::NotFound);
    };
    let Some(statement) = statements.into_iter().find(|node| !node.is_comment()) else {
        return Err(SyntaxError::NotFound);
    };

    let matched = find_matches(&statement, &pattern);
    debug!(
        target: SEARCH_TARGET,
        keyword,
        identifier,
        matches = matched.len(),
        "searched for extended lambda call"
    );
    match matched.as_slice() {
        [] => Err(SyntaxError::NotFound),
        [single] => Ok((*single).clone()),
        _ => Err(SyntaxError::ambiguous(identifier)),
    }
}

/// Something whose defining source text can be recovered.
pub trait CallableSource {
    /// Returns the source of the statement that defines the callable.
    ///
    /// # Errors
    ///
    /// Returns an error when the source cannot be read or located.
    fn definition_source(&self) -> Result<Cow<'_, str>, SyntaxError>;
}

impl CallableSource for str {
    fn definition_source(&self) -> Result<Cow<'_, str>, SyntaxError> {
        Ok(Cow::Borrowed(self))
    }
}

impl CallableSource for String {
    fn definition_source(&self) -> Result<Cow<'_, str>, SyntaxError> {
        Ok(Cow::Borrowed(self.as_str()))
    }
}

/// A callable identified by the file and one-based line where it is defined.
///
/// The definition source is the innermost statement covering the line,
/// including the indentation of its first line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    path: PathBuf,
    line: usize,
}

impl SourceLocation {
    /// Creates a location from a path and one-based line number.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }

    /// Returns the source file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the one-based line number.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }
}

impl CallableSource for SourceLocation {
    fn definition_source(&self) -> Result<Cow<'_, str>, SyntaxError> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|source| SyntaxError::io(self.path.clone(), source))?;
        let parsed = parse_source(&text)?;
        let row = self.line.saturating_sub(1);
        let statement = innermost_statement(parsed.root_node(), row).ok_or(SyntaxError::NotFound)?;

        let start = line_start(&text, statement.start_byte());
        text.get(start..statement.end_byte())
            .map(|slice| Cow::Owned(slice.to_owned()))
            .ok_or(SyntaxError::NotFound)
    }
}

/// Finds the deepest statement (a child of a module or block) covering `row`.
fn innermost_statement(container: tree_sitter::Node<'_>, row: usize) -> Option<tree_sitter::Node<'_>> {
    let mut cursor = container.walk();
    let statement = container
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment" && covers_row(*child, row))?;
    Some(
        nested_block(statement, row)
            .and_then(|block| innermost_statement(block, row))
            .unwrap_or(statement),
    )
}

fn nested_block(node: tree_sitter::Node<'_>, row: usize) -> Option<tree_sitter::Node<'_>> {
    let mut cursor = node.walk();
    let covering: Vec<_> = node
        .named_children(&mut cursor)
        .filter(|child| covers_row(*child, row))
        .collect();
    covering.into_iter().find_map(|child| {
        if child.kind() == "block" {
            Some(child)
        } else {
            nested_block(child, row)
        }
    })
}

fn covers_row(node: tree_sitter::Node<'_>, row: usize) -> bool {
    node.start_position().row <= row && row <= node.end_position().row
}

fn line_start(text: &str, offset: usize) -> usize {
    text.get(..offset)
        .and_then(|prefix| prefix.rfind('\n'))
        .map_or(0, |newline| newline + 1)
}

/// Recovers the extended-lambda call node defined by `callable`.
///
/// # Errors
///
/// Propagates errors from [`CallableSource::definition_source`] and
/// [`extract_single_call`].
pub fn lambda_to_ast<C>(callable: &C, keyword: &str, identifier: &str) -> Result<Node, SyntaxError>
where
    C: CallableSource + ?Sized,
{
    let source = callable.definition_source()?;
    extract_single_call(&source, keyword, identifier)
}

/// Removes the whitespace prefix common to every non-blank line.
fn dedent(source: &str) -> Cow<'_, str> {
    let prefix = source
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let width = line.len() - line.trim_start_matches([' ', '\t']).len();
            line.get(..width).unwrap_or_default()
        })
        .reduce(common_prefix)
        .unwrap_or_default();

    if prefix.is_empty() {
        return Cow::Borrowed(source);
    }

    let mut out = String::with_capacity(source.len());
    for line in source.split_inclusive('\n') {
        out.push_str(line.strip_prefix(prefix).unwrap_or_else(|| line.trim_start_matches([' ', '\t'])));
    }
    Cow::Owned(out)
}

fn common_prefix<'a>(left: &'a str, right: &str) -> &'a str {
    let len = left
        .char_indices()
        .zip(right.chars())
        .find(|((_, a), b)| a != b)
        .map_or_else(|| left.len().min(right.len()), |((index, _), _)| index);
    left.get(..len).unwrap_or_default()
}
