//! Source positions and spans shared by tokens and syntax nodes.
//!
//! Tree-sitter positions are zero-based. For user-facing messages, we prefer
//! one-based line and column numbers.

use std::ops::Range;

/// A zero-based row/column location in source text.
///
/// Columns are measured in bytes, matching Tree-sitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    /// Zero-based line index.
    pub row: usize,
    /// Zero-based byte column within the line.
    pub column: usize,
}

impl Position {
    /// Creates a position from zero-based coordinates.
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Converts the position to one-based display coordinates.
    #[must_use]
    pub fn one_based(self) -> (u32, u32) {
        // Line/column numbers will realistically never exceed u32::MAX.
        let line = u32::try_from(self.row.saturating_add(1)).unwrap_or(u32::MAX);
        let column = u32::try_from(self.column.saturating_add(1)).unwrap_or(u32::MAX);
        (line, column)
    }
}

impl From<tree_sitter::Point> for Position {
    fn from(point: tree_sitter::Point) -> Self {
        Self::new(point.row, point.column)
    }
}

/// Byte range plus start and end positions of a token or node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte range in the parsed source.
    pub bytes: Range<usize>,
    /// Position of the first byte.
    pub start: Position,
    /// Position just past the last byte.
    pub end: Position,
}

impl Span {
    /// Creates a span.
    #[must_use]
    pub const fn new(bytes: Range<usize>, start: Position, end: Position) -> Self {
        Self { bytes, start, end }
    }

    /// Builds the span covered by a Tree-sitter node.
    #[must_use]
    pub fn of_node(node: tree_sitter::Node<'_>) -> Self {
        Self::new(
            node.byte_range(),
            node.start_position().into(),
            node.end_position().into(),
        )
    }

    /// First byte offset.
    #[must_use]
    pub const fn start_byte(&self) -> usize {
        self.bytes.start
    }

    /// Byte offset just past the span.
    #[must_use]
    pub const fn end_byte(&self) -> usize {
        self.bytes.end
    }

    /// Returns whether `other` lies entirely inside this span.
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        self.bytes.start <= other.bytes.start && other.bytes.end <= self.bytes.end
    }
}
