//! Canonical layout of extended-lambda calls and keyword chains.
//!
//! Rendering never mutates the input tree. Text outside the constructs being
//! laid out is copied verbatim from the source, so any failure to render
//! yields `None` and the caller keeps the original text.

use std::ops::Range;

use crate::ast::{Node, NodeKind};
use crate::position::Span;
use crate::token::{ExactType, Token};

/// Indentation added for each nested block.
pub(super) const INDENT: &str = "    ";

/// Keywords that open a compound chain.
const STARTERS: &[&str] = &["if_", "for_", "while_", "with_", "try_"];
/// Keywords that continue a compound chain.
const CONTINUATIONS: &[&str] = &["elif_", "else_", "except_", "finally_"];
/// Keywords whose clause needs a `[head]`.
const HEADED: &[&str] = &["if_", "elif_", "for_", "while_", "with_"];
/// Keywords whose clause never takes a `[head]`.
const HEADLESS: &[&str] = &["else_", "try_", "finally_"];

/// Parts of a call that qualifies as an extended lambda.
pub(super) struct LambdaParts<'n> {
    pub function: &'n Node,
    pub parameters: Option<&'n Span>,
    pub body: &'n Node,
    pub elements: &'n [Node],
}

/// Splits `call` into its extended-lambda parts.
///
/// The call must have exactly one argument, a comment-free native lambda
/// whose body is a list display.
pub(super) fn lambda_parts(call: &Node) -> Option<LambdaParts<'_>> {
    let NodeKind::Call {
        function,
        arguments,
    } = call.kind()
    else {
        return None;
    };
    let [argument] = arguments.as_slice() else {
        return None;
    };
    let NodeKind::Lambda {
        parameters,
        body,
        comments,
    } = argument.kind()
    else {
        return None;
    };
    let NodeKind::List { elements } = body.kind() else {
        return None;
    };
    comments.is_empty().then_some(LambdaParts {
        function,
        parameters: parameters.as_ref(),
        body,
        elements,
    })
}

/// One `keyword[head] [body]` link of a compound chain.
struct Clause<'n> {
    head: Range<usize>,
    head_row: usize,
    body: &'n [Node],
    body_open_row: usize,
}

/// Where a clause keyword sits inside a subscript's value.
struct ClauseHead<'n> {
    keyword: &'n str,
    start: usize,
    row: usize,
    bare: bool,
    previous: Option<&'n Node>,
}

pub(super) struct Renderer<'a> {
    source: &'a str,
    tokens: &'a [Token<'a>],
    calls: Vec<&'a Node>,
}

impl<'a> Renderer<'a> {
    /// `calls` are the confirmed extended-lambda calls of the file.
    pub(super) fn new(source: &'a str, tokens: &'a [Token<'a>], mut calls: Vec<&'a Node>) -> Self {
        calls.sort_by(|left, right| {
            left.span()
                .start_byte()
                .cmp(&right.span().start_byte())
                .then_with(|| right.span().end_byte().cmp(&left.span().end_byte()))
        });
        calls.dedup_by(|left, right| left.span() == right.span());
        Self {
            source,
            tokens,
            calls,
        }
    }

    /// Confirmed calls inside `range` that no other such call contains.
    ///
    /// A call spanning exactly `range` is skipped when `strict` is set.
    pub(super) fn outermost_calls(&self, range: &Range<usize>, strict: bool) -> Vec<&'a Node> {
        let mut outermost: Vec<&'a Node> = Vec::new();
        for call in self.calls.iter().copied() {
            let bytes = &call.span().bytes;
            let inside = range.start <= bytes.start && bytes.end <= range.end;
            if !inside || (strict && bytes == range) {
                continue;
            }
            if outermost
                .last()
                .is_some_and(|previous| previous.span().contains(call.span()))
            {
                continue;
            }
            outermost.push(call);
        }
        outermost
    }

    /// Leading whitespace of the line holding `offset`.
    pub(super) fn line_indent(&self, offset: usize) -> &'a str {
        let start = self
            .source
            .get(..offset)
            .and_then(|prefix| prefix.rfind('\n'))
            .map_or(0, |newline| newline + 1);
        let line = self.source.get(start..offset).unwrap_or_default();
        let width = line.len() - line.trim_start_matches([' ', '\t']).len();
        line.get(..width).unwrap_or_default()
    }

    /// Renders a confirmed call in canonical layout at `base` indentation.
    pub(super) fn render_call(&self, call: &Node, base: &str) -> Option<String> {
        let parts = lambda_parts(call)?;
        if !parts.elements.iter().any(|element| !element.is_comment()) {
            return None;
        }
        if self.has_comment_outside(call.span(), parts.body.span()) {
            return None;
        }

        let callee = self.text(&parts.function.span().bytes)?;
        let mut header = String::from("lambda");
        if let Some(parameters) = parts.parameters {
            header.push(' ');
            header.push_str(self.text(&parameters.bytes)?);
        }
        header.push(':');

        let block = self.render_block(parts.elements, parts.body.span().start.row, base)?;
        Some(format!("{callee}({header} [{block}])"))
    }

    /// Copies `bytes` verbatim, re-rendering nested extended lambdas.
    ///
    /// Nested calls starting on `first_row` are based at `indent`; the others
    /// keep the indentation of their own line.
    pub(super) fn render_range(&self, bytes: &Range<usize>, first_row: usize, indent: &str) -> Option<String> {
        if self.ends_with_comment(bytes) {
            return None;
        }
        let mut out = self.text(bytes)?.to_owned();
        for call in self.outermost_calls(bytes, true).into_iter().rev() {
            let span = call.span();
            let base = if span.start.row == first_row {
                indent
            } else {
                self.line_indent(span.start_byte())
            };
            let replacement = self
                .render_call(call, base)
                .or_else(|| self.render_range(&span.bytes, span.start.row, base))?;
            let local = span.start_byte() - bytes.start..span.end_byte() - bytes.start;
            if !out.is_char_boundary(local.start) || !out.is_char_boundary(local.end) {
                return None;
            }
            out.replace_range(local, &replacement);
        }
        Some(out)
    }

    /// Lays out block items one per line, returning the text between the
    /// brackets.
    fn render_block(&self, items: &[Node], open_row: usize, base: &str) -> Option<String> {
        let indent = format!("{base}{INDENT}");
        let total = items.iter().filter(|item| !item.is_comment()).count();
        let mut seen = 0;
        let mut previous_row = open_row;
        let mut out = String::new();

        for item in items {
            let span = item.span();
            if let NodeKind::Comment { text } = item.kind() {
                if span.start.row == previous_row {
                    out.push_str("  ");
                } else {
                    out.push('\n');
                    out.push_str(&indent);
                }
                out.push_str(text.trim_end());
                previous_row = span.end.row;
                continue;
            }

            seen += 1;
            out.push('\n');
            out.push_str(&indent);
            out.push_str(&self.render_element(item, &indent)?);
            if seen < total {
                out.push(',');
            }
            previous_row = span.end.row;
        }

        out.push('\n');
        out.push_str(base);
        Some(out)
    }

    fn render_element(&self, item: &Node, indent: &str) -> Option<String> {
        if let Some(clauses) = self.chain(item) {
            return self.render_chain(&clauses, indent);
        }
        let span = item.span();
        if self.is_confirmed(item)
            && let Some(rendered) = self.render_call(item, indent)
        {
            return Some(rendered);
        }
        self.render_range(&span.bytes, span.start.row, indent)
    }

    fn is_confirmed(&self, node: &Node) -> bool {
        self.calls.iter().any(|call| call.span() == node.span())
    }

    fn render_chain(&self, clauses: &[Clause<'_>], indent: &str) -> Option<String> {
        let mut out = String::new();
        for (index, clause) in clauses.iter().enumerate() {
            if index > 0 {
                out.push('.');
            }
            out.push_str(&self.render_range(&clause.head, clause.head_row, indent)?);
            out.push_str(" [");
            out.push_str(&self.render_block(clause.body, clause.body_open_row, indent)?);
            out.push(']');
        }
        Some(out)
    }

    /// Decomposes a keyword chain such as `if_[c] [..].else_ [..]`.
    fn chain<'n>(&self, node: &'n Node) -> Option<Vec<Clause<'n>>> {
        let mut clauses = Vec::new();
        let mut current = node;
        loop {
            let NodeKind::Subscript { value, items } = current.kind() else {
                return None;
            };
            let head = clause_head(value)?;
            if !head_allowed(head.keyword, head.bare) {
                return None;
            }

            let head_end = value.span().end_byte();
            let open = self.open_bracket(head_end)?;
            // A comment between the head and the body bracket cannot move.
            if items
                .iter()
                .any(|item| item.is_comment() && item.span().start_byte() < open.span().start_byte())
            {
                return None;
            }

            // Nor can one between a clause and the `.keyword` that follows it.
            if let Some(previous) = head.previous
                && self.has_comment_in(&(previous.span().end_byte()..head.start))
            {
                return None;
            }

            clauses.push(Clause {
                head: head.start..head_end,
                head_row: head.row,
                body: items,
                body_open_row: open.span().start.row,
            });
            match head.previous {
                Some(previous) => current = previous,
                None => break,
            }
        }
        clauses.reverse();
        Some(clauses)
    }

    /// First significant token at or after `offset`, if it is `[`.
    fn open_bracket(&self, offset: usize) -> Option<&'a Token<'a>> {
        let from = self
            .tokens
            .partition_point(|token| token.span().start_byte() < offset);
        self.tokens
            .get(from..)?
            .iter()
            .find(|token| !token.is_insignificant())
            .filter(|token| token.exact_type() == ExactType::LSqb)
    }

    fn ends_with_comment(&self, bytes: &Range<usize>) -> bool {
        let end = self
            .tokens
            .partition_point(|token| token.span().start_byte() < bytes.end);
        self.tokens
            .get(..end)
            .unwrap_or_default()
            .iter()
            .rev()
            .take_while(|token| token.span().start_byte() >= bytes.start)
            .find(|token| {
                !matches!(
                    token.exact_type(),
                    ExactType::Whitespace | ExactType::Newline
                )
            })
            .is_some_and(|token| token.exact_type() == ExactType::Comment)
    }

    fn has_comment_in(&self, bytes: &Range<usize>) -> bool {
        self.tokens.iter().any(|token| {
            token.exact_type() == ExactType::Comment
                && bytes.start <= token.span().start_byte()
                && token.span().end_byte() <= bytes.end
        })
    }

    fn has_comment_outside(&self, outer: &Span, inner: &Span) -> bool {
        self.tokens.iter().any(|token| {
            token.exact_type() == ExactType::Comment
                && outer.contains(token.span())
                && !inner.contains(token.span())
        })
    }

    fn text(&self, bytes: &Range<usize>) -> Option<&'a str> {
        self.source.get(bytes.clone())
    }
}

/// Finds the clause keyword along the value/object/function spine of a
/// subscript's value.
fn clause_head(value: &Node) -> Option<ClauseHead<'_>> {
    let mut node = value;
    loop {
        match node.kind() {
            NodeKind::Name { id } => {
                return STARTERS.contains(&id.as_str()).then(|| ClauseHead {
                    keyword: id,
                    start: node.span().start_byte(),
                    row: node.span().start.row,
                    bare: std::ptr::eq(node, value),
                    previous: None,
                });
            }
            NodeKind::Attribute {
                object,
                attribute,
                attribute_span,
            } if CONTINUATIONS.contains(&attribute.as_str()) => {
                return Some(ClauseHead {
                    keyword: attribute,
                    start: attribute_span.start_byte(),
                    row: attribute_span.start.row,
                    bare: std::ptr::eq(node, value),
                    previous: Some(object.as_ref()),
                });
            }
            NodeKind::Attribute { object, .. } => node = object,
            NodeKind::Subscript { value: inner, .. } => node = inner,
            NodeKind::Call { function, .. } => node = function,
            _ => return None,
        }
    }
}

fn head_allowed(keyword: &str, bare: bool) -> bool {
    if HEADED.contains(&keyword) {
        !bare
    } else if HEADLESS.contains(&keyword) {
        bare
    } else {
        true
    }
}
