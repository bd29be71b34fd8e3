//! Tests for rule registration and ranked lookup.

use rstest::{fixture, rstest};

use super::*;
use crate::position::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum State {
    Start,
    Body,
}

type Table = DispatchTable<State, Vec<&'static str>, &'static str>;

fn name_token(string: &str) -> Token<'_> {
    Token::new(ExactType::Name, string, Span::default())
}

fn token(exact_type: ExactType, string: &str) -> Token<'_> {
    Token::new(exact_type, string, Span::default())
}

fn exact_handler(ctx: &mut ParseContext<State, Vec<&'static str>>, _: &Token<'_>) -> &'static str {
    ctx.aux_mut().push("exact");
    "exact"
}

fn type_handler(_: &mut ParseContext<State, Vec<&'static str>>, _: &Token<'_>) -> &'static str {
    "type"
}

fn state_handler(ctx: &mut ParseContext<State, Vec<&'static str>>, _: &Token<'_>) -> &'static str {
    ctx.set_state(State::Body);
    "state"
}

fn global_handler(_: &mut ParseContext<State, Vec<&'static str>>, _: &Token<'_>) -> &'static str {
    "global"
}

#[fixture]
fn table() -> Table {
    let mut table = Table::new();
    table
        .register(
            RuleKey::new()
                .with_type(ExactType::Name)
                .with_string("x")
                .in_state(State::Start),
            exact_handler,
        )
        .expect("exact rule");
    table
        .register(
            RuleKey::new().with_type(ExactType::Name).in_state(State::Start),
            type_handler,
        )
        .expect("type rule");
    table
        .register(RuleKey::new().in_state(State::Start), state_handler)
        .expect("state rule");
    table
        .register(
            RuleKey::new().with_type(ExactType::Name).with_string("y"),
            global_handler,
        )
        .expect("global rule");
    table
}

#[fixture]
fn ctx() -> ParseContext<State, Vec<&'static str>> {
    ParseContext::new(State::Start, Vec::new())
}

#[rstest]
#[case(name_token("x"), Some("exact"))]
#[case(name_token("other"), Some("type"))]
#[case(token(ExactType::LPar, "("), Some("state"))]
#[case(name_token("y"), Some("type"))]
fn dispatch_prefers_most_specific_rule(
    table: Table,
    mut ctx: ParseContext<State, Vec<&'static str>>,
    #[case] incoming: Token<'static>,
    #[case] expected: Option<&'static str>,
) {
    assert_eq!(table.dispatch(&mut ctx, &incoming), expected);
}

#[rstest]
fn state_agnostic_rule_applies_when_state_rules_miss(table: Table) {
    let mut ctx = ParseContext::new(State::Body, Vec::new());
    assert_eq!(table.dispatch(&mut ctx, &name_token("y")), Some("global"));
    assert_eq!(table.dispatch(&mut ctx, &name_token("x")), None);
}

#[test]
fn state_rule_outranks_state_agnostic_exact_rule() {
    let mut table = Table::new();
    table
        .register(RuleKey::new().in_state(State::Start), state_handler)
        .expect("state rule");
    table
        .register(
            RuleKey::new().with_type(ExactType::Name).with_string("y"),
            global_handler,
        )
        .expect("global rule");

    let mut ctx = ParseContext::new(State::Start, Vec::new());
    assert_eq!(table.dispatch(&mut ctx, &name_token("y")), Some("state"));
    assert_eq!(table.dispatch(&mut ctx, &name_token("y")), Some("global"));
}

#[rstest]
#[case(token(ExactType::Whitespace, "  "))]
#[case(token(ExactType::Newline, "\n"))]
#[case(token(ExactType::Comment, "# x"))]
fn insignificant_tokens_pass_through(
    table: Table,
    mut ctx: ParseContext<State, Vec<&'static str>>,
    #[case] incoming: Token<'static>,
) {
    assert_eq!(table.dispatch(&mut ctx, &incoming), None);
    assert_eq!(ctx.last_state(), State::Start);
}

#[rstest]
fn handlers_mutate_the_context(table: Table, mut ctx: ParseContext<State, Vec<&'static str>>) {
    table.dispatch(&mut ctx, &name_token("x"));
    table.dispatch(&mut ctx, &token(ExactType::Colon, ":"));
    assert_eq!(ctx.last_state(), State::Body);
    assert_eq!(ctx.aux(), &vec!["exact"]);
}

#[rstest]
fn duplicate_registration_is_rejected(mut table: Table) {
    let err = table
        .register(
            RuleKey::new().with_type(ExactType::Name).in_state(State::Start),
            global_handler,
        )
        .expect_err("duplicate must fail");
    assert!(matches!(err, DispatchError::DuplicateRule { .. }));
    assert_eq!(table.len(), 4);
}

#[test]
fn string_requires_name_type() {
    let mut table = Table::new();
    let err = table
        .register(
            RuleKey::new().with_type(ExactType::LPar).with_string("("),
            global_handler,
        )
        .expect_err("string on punctuation must fail");
    assert_eq!(
        err,
        DispatchError::StringRequiresName {
            exact_type: "LPar".to_owned()
        }
    );

    let wildcard = table
        .register(RuleKey::new().with_string("x"), global_handler)
        .expect_err("string on wildcard type must fail");
    assert!(matches!(wildcard, DispatchError::StringRequiresName { .. }));
    assert!(table.is_empty());
}

#[test]
fn non_name_types_probe_by_type_in_any_state() {
    let mut table = Table::new();
    table
        .register(RuleKey::new().with_type(ExactType::Colon), global_handler)
        .expect("colon rule");
    let mut ctx = ParseContext::new(State::Body, Vec::new());
    assert_eq!(
        table.dispatch(&mut ctx, &token(ExactType::Colon, ":")),
        Some("global")
    );
}

#[test]
fn unmatched_tokens_return_none() {
    let table = Table::new();
    let mut ctx = ParseContext::new(State::Start, Vec::new());
    assert_eq!(table.dispatch(&mut ctx, &name_token("x")), None);
}

#[test]
fn duplicate_key_renders_in_error_message() {
    let mut table = Table::new();
    let key = || RuleKey::new().with_type(ExactType::Name).with_string("x");
    table.register(key(), global_handler).expect("first");
    let err = table.register(key(), type_handler).expect_err("second");
    assert_eq!(
        err.to_string(),
        "duplicate dispatch rule for key (Name, \"x\", *)"
    );
}
