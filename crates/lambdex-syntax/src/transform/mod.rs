//! Rewriting extended lambdas into canonical layout.
//!
//! A pass runs in three steps. The lexical scan finds candidate regions in
//! the token stream; the structural search lowers the file and keeps the
//! `keyword(...)` and `keyword.name(...)` calls whose shape is an extended
//! lambda and which sit inside a candidate region; each outermost confirmed
//! call is then re-rendered and the edits are applied back to front.
//!
//! The output is re-parsed and compared with the input before it is returned.
//! Only layout may change: the sequence of significant tokens and comments,
//! ignoring commas, must be identical.

mod layout;

use std::ops::Range;

use tracing::{debug, warn};

use crate::ast::{Node, lower};
use crate::error::SyntaxError;
use crate::parser::{ParseResult, parse_source};
use crate::scanner::{LambdaRegion, scan_regions};
use crate::search::{NodePattern, find_matches};
use crate::token::{ExactType, Token, tokenize};

use layout::{Renderer, lambda_parts};

const TRANSFORM_TARGET: &str = "lambdex_syntax::transform";

/// The lambda keyword used when none is configured.
pub const DEFAULT_KEYWORD: &str = "def_";

/// Options controlling a transformation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    keyword: String,
}

impl TransformOptions {
    /// Creates options for the given lambda keyword.
    #[must_use]
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }

    /// Returns the lambda keyword.
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORD)
    }
}

/// Result of a transformation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    output: String,
    num_rewrites: usize,
}

impl TransformResult {
    fn unchanged(source: &str) -> Self {
        Self {
            output: source.to_owned(),
            num_rewrites: 0,
        }
    }

    /// Returns the transformed source.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Consumes the result, returning the transformed source.
    #[must_use]
    pub fn into_output(self) -> String {
        self.output
    }

    /// Returns how many top-level calls were rewritten.
    #[must_use]
    pub const fn num_rewrites(&self) -> usize {
        self.num_rewrites
    }

    /// Returns whether any call was rewritten.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.num_rewrites > 0
    }
}

/// Lays out every extended lambda of a file in canonical form.
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    options: TransformOptions,
}

impl Transformer {
    /// Creates a transformer.
    #[must_use]
    pub const fn new(options: TransformOptions) -> Self {
        Self { options }
    }

    /// Returns the options in use.
    #[must_use]
    pub const fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Transforms a parsed file.
    ///
    /// Sources containing syntax errors are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyword is not a valid name, if the scanner
    /// rules cannot be built, or if the rewritten text fails verification.
    pub fn apply(&self, parsed: &ParseResult) -> Result<TransformResult, SyntaxError> {
        let source = parsed.source();
        if parsed.has_errors() {
            let errors = parsed.errors();
            let first = errors.first();
            warn!(
                target: TRANSFORM_TARGET,
                errors = errors.len(),
                line = first.map(|error| error.line),
                column = first.map(|error| error.column),
                "source has syntax errors; leaving it unchanged"
            );
            return Ok(TransformResult::unchanged(source));
        }

        let tokens = tokenize(parsed);
        let regions = scan_regions(&tokens, self.options.keyword())?;
        if regions.is_empty() {
            return Ok(TransformResult::unchanged(source));
        }

        let root = lower(parsed);
        let calls = self.confirmed_calls(&root, &regions)?;
        let renderer = Renderer::new(source, &tokens, calls);

        let mut edits = Vec::new();
        for call in renderer.outermost_calls(&(0..source.len()), false) {
            let span = call.span();
            let base = renderer.line_indent(span.start_byte());
            let Some(replacement) = renderer
                .render_call(call, base)
                .or_else(|| renderer.render_range(&span.bytes, span.start.row, base))
            else {
                debug!(
                    target: TRANSFORM_TARGET,
                    line = span.start.one_based().0,
                    "skipping call that cannot be laid out"
                );
                continue;
            };
            if source.get(span.bytes.clone()) != Some(replacement.as_str()) {
                edits.push((span.bytes.clone(), replacement));
            }
        }

        if edits.is_empty() {
            return Ok(TransformResult::unchanged(source));
        }

        let num_rewrites = edits.len();
        let output = apply_edits(source, edits)?;
        verify(&tokens, &output)?;
        debug!(target: TRANSFORM_TARGET, num_rewrites, "rewrote extended lambdas");
        Ok(TransformResult {
            output,
            num_rewrites,
        })
    }

    /// Parses `source` and transforms it.
    ///
    /// # Errors
    ///
    /// See [`Transformer::apply`].
    pub fn apply_to_source(&self, source: &str) -> Result<TransformResult, SyntaxError> {
        self.apply(&parse_source(source)?)
    }

    fn confirmed_calls<'n>(
        &self,
        root: &'n Node,
        regions: &[LambdaRegion],
    ) -> Result<Vec<&'n Node>, SyntaxError> {
        let keyword = self.options.keyword();
        let bare: NodePattern = format!("{keyword}(?)").parse()?;
        let named: NodePattern = format!("{keyword}.?(?)").parse()?;

        let confirmed = find_matches(root, &bare)
            .into_iter()
            .chain(find_matches(root, &named))
            .filter(|call| {
                let Some(parts) = lambda_parts(call) else {
                    return false;
                };
                let start = parts.function.span().start_byte();
                let end = call.span().end_byte();
                regions
                    .iter()
                    .any(|region| region.keyword_start == start || region.covers(start, end))
            })
            .collect::<Vec<_>>();
        debug!(
            target: TRANSFORM_TARGET,
            regions = regions.len(),
            confirmed = confirmed.len(),
            "confirmed extended lambda calls"
        );
        Ok(confirmed)
    }
}

/// Applies non-overlapping edits from the end of the source backwards.
fn apply_edits(source: &str, mut edits: Vec<(Range<usize>, String)>) -> Result<String, SyntaxError> {
    edits.sort_by(|left, right| right.0.start.cmp(&left.0.start));
    let mut result = source.to_owned();
    for (range, replacement) in edits {
        if range.end > result.len() {
            return Err(SyntaxError::rewrite("edit range lies outside the source"));
        }
        if !result.is_char_boundary(range.start) || !result.is_char_boundary(range.end) {
            return Err(SyntaxError::rewrite(
                "edit range is not on a UTF-8 boundary",
            ));
        }
        result.replace_range(range, &replacement);
    }
    Ok(result)
}

/// Checks that `output` parses and differs from the original only in layout.
fn verify(original: &[Token<'_>], output: &str) -> Result<(), SyntaxError> {
    let reparsed = parse_source(output)?;
    if let Some(error) = reparsed.errors().first() {
        return Err(SyntaxError::rewrite(format!(
            "formatted output does not parse at line {}, column {}",
            error.line, error.column
        )));
    }

    let after = tokenize(&reparsed);
    let expected = significant(original);
    let actual = significant(&after);
    if let Some(index) = expected
        .iter()
        .zip(&actual)
        .position(|(left, right)| left != right)
    {
        return Err(SyntaxError::rewrite(format!(
            "formatting changed token {index}: {:?} became {:?}",
            expected.get(index),
            actual.get(index)
        )));
    }
    if expected.len() != actual.len() {
        return Err(SyntaxError::rewrite(format!(
            "formatting changed the token count from {} to {}",
            expected.len(),
            actual.len()
        )));
    }
    Ok(())
}

fn significant<'a>(tokens: &[Token<'a>]) -> Vec<(ExactType, &'a str)> {
    tokens
        .iter()
        .filter(|token| {
            !matches!(
                token.exact_type(),
                ExactType::Whitespace | ExactType::Newline | ExactType::Comma
            )
        })
        .map(|token| (token.exact_type(), token.string().trim_end()))
        .collect()
}
