//! Lexical scan for extended-lambda call regions.
//!
//! The scanner drives the token stream through a shared [`DispatchTable`]
//! whose handlers implement a small state machine:
//!
//! ```text
//! Outside --keyword--> SeenKeyword --'('--> InParamList
//!     --':' closing the lambda header--> InBody --matching ')'--> Outside
//! ```
//!
//! A `.identifier` suffix after the keyword is consumed while in
//! `SeenKeyword`. Anything unexpected drops the candidate and returns to
//! `Outside`; the structural pass decides what is really an extended lambda.

use once_cell::sync::Lazy;
use tracing::debug;

use crate::context::ParseContext;
use crate::dispatch::{DispatchError, DispatchTable, RuleKey};
use crate::error::SyntaxError;
use crate::token::{ExactType, Token};

const SCANNER_TARGET: &str = "lambdex_syntax::scanner";

/// Parser states of the region scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LambdaState {
    /// Not inside a candidate.
    Outside,
    /// The lambda keyword (and possibly `.identifier`) was just consumed.
    SeenKeyword,
    /// Inside the call parentheses, before the lambda header's colon.
    InParamList,
    /// Inside the lambda body.
    InBody,
}

/// Byte offsets of one candidate extended-lambda call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LambdaRegion {
    /// Start of the keyword token.
    pub keyword_start: usize,
    /// Offset of the call's opening parenthesis.
    pub open_paren: usize,
    /// Offset of the body's opening bracket.
    pub body_open: usize,
    /// Offset of the call's closing parenthesis.
    pub close_paren: usize,
}

impl LambdaRegion {
    /// Returns whether `start..end` lies inside the region.
    #[must_use]
    pub const fn covers(&self, start: usize, end: usize) -> bool {
        self.keyword_start <= start && end <= self.close_paren + 1
    }
}

#[derive(Debug, Default)]
struct ScanAux {
    keyword: String,
    keyword_start: usize,
    after_dot: bool,
    named: bool,
    open_paren: usize,
    depth: usize,
    open_lambdas: usize,
    body_open: Option<usize>,
}

impl ScanAux {
    fn start_candidate(&mut self, offset: usize) {
        self.keyword_start = offset;
        self.after_dot = false;
        self.named = false;
        self.depth = 0;
        self.open_lambdas = 0;
        self.body_open = None;
    }
}

type ScanContext = ParseContext<LambdaState, ScanAux>;
type ScanTable = DispatchTable<LambdaState, ScanAux, Option<LambdaRegion>>;

static RULES: Lazy<Result<ScanTable, DispatchError>> = Lazy::new(build_rules);

fn build_rules() -> Result<ScanTable, DispatchError> {
    use LambdaState::{InBody, InParamList, Outside, SeenKeyword};

    let mut table = ScanTable::new();
    table.register(
        RuleKey::new().with_type(ExactType::Name).in_state(Outside),
        on_name_outside,
    )?;
    table.register(
        RuleKey::new().with_type(ExactType::Name).in_state(SeenKeyword),
        on_name_after_keyword,
    )?;
    table.register(
        RuleKey::new().with_type(ExactType::Dot).in_state(SeenKeyword),
        on_dot_after_keyword,
    )?;
    table.register(
        RuleKey::new().with_type(ExactType::LPar).in_state(SeenKeyword),
        on_call_open,
    )?;
    table.register(RuleKey::new().in_state(SeenKeyword), reset)?;
    table.register(
        RuleKey::new()
            .with_type(ExactType::Name)
            .with_string("lambda")
            .in_state(InParamList),
        on_lambda,
    )?;
    table.register(
        RuleKey::new().with_type(ExactType::Colon).in_state(InParamList),
        on_header_colon,
    )?;
    table.register(RuleKey::new().in_state(InParamList), on_param_token)?;
    table.register(RuleKey::new().in_state(InBody), on_body_token)?;
    Ok(table)
}

fn rules() -> Result<&'static ScanTable, SyntaxError> {
    RULES.as_ref().map_err(|err| SyntaxError::Dispatch(err.clone()))
}

/// Finds candidate extended-lambda regions in a token stream.
///
/// Regions are reported in source order and never overlap; a keyword inside
/// a region's body does not start a new candidate.
///
/// # Errors
///
/// Returns an error if the shared rule table failed to build.
pub fn scan_regions(tokens: &[Token<'_>], keyword: &str) -> Result<Vec<LambdaRegion>, SyntaxError> {
    let table = rules()?;
    let mut ctx = ScanContext::new(
        LambdaState::Outside,
        ScanAux {
            keyword: keyword.to_owned(),
            ..ScanAux::default()
        },
    );

    let regions: Vec<_> = tokens
        .iter()
        .filter_map(|token| table.dispatch(&mut ctx, token).flatten())
        .collect();
    debug!(target: SCANNER_TARGET, keyword, regions = regions.len(), "scanned regions");
    Ok(regions)
}

fn reset(ctx: &mut ScanContext, _: &Token<'_>) -> Option<LambdaRegion> {
    ctx.set_state(LambdaState::Outside);
    None
}

fn on_name_outside(ctx: &mut ScanContext, token: &Token<'_>) -> Option<LambdaRegion> {
    if token.string() == ctx.aux().keyword {
        ctx.aux_mut().start_candidate(token.span().start_byte());
        ctx.set_state(LambdaState::SeenKeyword);
    }
    None
}

fn on_name_after_keyword(ctx: &mut ScanContext, token: &Token<'_>) -> Option<LambdaRegion> {
    let aux = ctx.aux_mut();
    if aux.after_dot {
        aux.after_dot = false;
        aux.named = true;
        return None;
    }
    if token.string() == aux.keyword {
        aux.start_candidate(token.span().start_byte());
        return None;
    }
    reset(ctx, token)
}

fn on_dot_after_keyword(ctx: &mut ScanContext, token: &Token<'_>) -> Option<LambdaRegion> {
    let aux = ctx.aux_mut();
    if aux.after_dot || aux.named {
        return reset(ctx, token);
    }
    aux.after_dot = true;
    None
}

fn on_call_open(ctx: &mut ScanContext, token: &Token<'_>) -> Option<LambdaRegion> {
    if ctx.aux().after_dot {
        return reset(ctx, token);
    }
    let aux = ctx.aux_mut();
    aux.open_paren = token.span().start_byte();
    aux.depth = 1;
    ctx.set_state(LambdaState::InParamList);
    None
}

fn on_lambda(ctx: &mut ScanContext, _: &Token<'_>) -> Option<LambdaRegion> {
    let aux = ctx.aux_mut();
    if aux.depth == 1 {
        aux.open_lambdas += 1;
    }
    None
}

fn on_header_colon(ctx: &mut ScanContext, token: &Token<'_>) -> Option<LambdaRegion> {
    let aux = ctx.aux_mut();
    if aux.depth != 1 {
        return None;
    }
    if aux.open_lambdas == 0 {
        return reset(ctx, token);
    }
    aux.open_lambdas -= 1;
    if aux.open_lambdas == 0 {
        ctx.set_state(LambdaState::InBody);
    }
    None
}

fn on_param_token(ctx: &mut ScanContext, token: &Token<'_>) -> Option<LambdaRegion> {
    let aux = ctx.aux_mut();
    // The call's only argument must open with `lambda`.
    if aux.depth == 1 && aux.open_lambdas == 0 {
        return reset(ctx, token);
    }
    if track_depth(aux, token) == 0 {
        return reset(ctx, token);
    }
    None
}

fn on_body_token(ctx: &mut ScanContext, token: &Token<'_>) -> Option<LambdaRegion> {
    let aux = ctx.aux_mut();
    let offset = token.span().start_byte();
    if aux.depth == 1 && aux.body_open.is_none() {
        if token.exact_type() != ExactType::LSqb {
            return reset(ctx, token);
        }
        aux.body_open = Some(offset);
    }

    if track_depth(aux, token) > 0 {
        return None;
    }

    let region = match (token.exact_type(), aux.body_open) {
        (ExactType::RPar, Some(body_open)) => Some(LambdaRegion {
            keyword_start: aux.keyword_start,
            open_paren: aux.open_paren,
            body_open,
            close_paren: offset,
        }),
        _ => None,
    };
    ctx.set_state(LambdaState::Outside);
    region
}

/// Applies bracket nesting for `token` and returns the new depth.
fn track_depth(aux: &mut ScanAux, token: &Token<'_>) -> usize {
    let exact_type = token.exact_type();
    if exact_type.is_open_bracket() {
        aux.depth += 1;
    } else if exact_type.is_close_bracket() {
        aux.depth = aux.depth.saturating_sub(1);
    }
    aux.depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::token::tokenize;
    use rstest::rstest;

    fn regions(source: &str) -> Vec<LambdaRegion> {
        let parsed = parse_source(source).expect("parse");
        scan_regions(&tokenize(&parsed), "def_").expect("scan")
    }

    fn region_text(source: &str, region: &LambdaRegion) -> String {
        source
            .get(region.keyword_start..=region.close_paren)
            .expect("region in bounds")
            .to_owned()
    }

    #[rstest]
    #[case("f = def_(lambda: [x])\n", "def_(lambda: [x])")]
    #[case("f = def_.name(lambda a, b: [a, b])\n", "def_.name(lambda a, b: [a, b])")]
    #[case(
        "g(def_(lambda a=d[1:2]: [\n    a\n]))\n",
        "def_(lambda a=d[1:2]: [\n    a\n])"
    )]
    #[case(
        "f = def_(lambda a=(lambda: 0): [a()])\n",
        "def_(lambda a=(lambda: 0): [a()])"
    )]
    fn finds_single_region(#[case] source: &str, #[case] expected: &str) {
        let found = regions(source);
        assert_eq!(found.len(), 1);
        let region = found.first().expect("one region");
        assert_eq!(region_text(source, region), expected);
    }

    #[test]
    fn nested_lambdas_stay_inside_outer_region() {
        let source = "f = def_(lambda: [\n    g := def_(lambda: [1]),\n    g\n])\n";
        let found = regions(source);
        assert_eq!(found.len(), 1);
        let region = found.first().expect("region");
        assert_eq!(region.keyword_start, 4);
        assert_eq!(source.get(region.body_open..=region.body_open), Some("["));
    }

    #[rstest]
    #[case("def_(x)\n")]
    #[case("def_(lambda: x)\n")]
    #[case("def_.a.b(lambda: [x])\n")]
    #[case("def_ + 1\n")]
    #[case("other(lambda: [x])\n")]
    fn rejects_non_candidates(#[case] source: &str) {
        assert!(regions(source).is_empty());
    }

    #[test]
    fn repeated_keyword_restarts_candidate() {
        let found = regions("def_ def_(lambda: [1])\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found.first().map(|r| r.keyword_start), Some(5));
    }

    #[test]
    fn comments_and_newlines_do_not_break_regions() {
        let source = "f = def_(  # note\n    lambda:\n    [1]\n)\n";
        assert_eq!(regions(source).len(), 1);
    }

    #[test]
    fn scanning_twice_uses_fresh_state() {
        let parsed = parse_source("def_(lambda: [\n").expect("parse");
        let tokens = tokenize(&parsed);
        assert!(scan_regions(&tokens, "def_").expect("scan").is_empty());
        let complete = parse_source("def_(lambda: [1])\n").expect("parse");
        assert_eq!(
            scan_regions(&tokenize(&complete), "def_")
                .expect("scan")
                .len(),
            1
        );
    }
}
