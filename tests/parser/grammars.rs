//! Story-specific grammars
//!
//! A parser is only as good as the patterns it is given; these tests build
//! small grammars by hand and rank with stub verifiers.

use std::sync::Arc;

use fabula_engine::{
    Action, EngineConfig, ParseFailure, Parser, Plausibility, ScriptedIo, TurnContext,
};
use fabula_foundation::{Error, Fact, Pattern, Result, Value, val, var};
use fabula_parser::{CommandParser, Grammar, GrammarError};
use fabula_stdlib::{TemplateNarrator, demo};
use fabula_storage::World;

fn obj(id: &str) -> Value {
    Value::object(id)
}

fn player() -> Value {
    obj(demo::PLAYER)
}

fn world() -> World {
    let mut w = demo::empty_world().unwrap();
    for (id, words) in [
        ("lever", "brass lever"),
        ("button", "red button"),
        ("dial", "brass dial"),
    ] {
        w.relate(Fact::new("Instance", [obj(id), Value::text("thing")])).unwrap();
        w.set("Words", [obj(id)], words).unwrap();
    }
    w.seal();
    w
}

fn grammar() -> Grammar {
    let mut g = Grammar::new();
    g.understand("pull/yank [something x]", Pattern::new("Pulling", [var("actor"), var("x")]))
        .unwrap();
    g.understand("push [something x]", Pattern::new("Pushing", [var("actor"), var("x")]))
        .unwrap();
    g.understand("turn [something x]", Pattern::new("Turning", [var("actor"), var("x")]))
        .unwrap();
    g.understand("say [text t]", Pattern::new("Saying", [var("actor"), var("t")]))
        .unwrap();
    g
}

fn parse(
    input: &str,
    verify: &dyn Fn(&Action) -> Result<Plausibility>,
) -> std::result::Result<Action, ParseFailure> {
    let mut w = world();
    let parser = CommandParser::new(grammar(), demo::scope);
    let narrator = TemplateNarrator::new();
    let config = EngineConfig::default();
    let mut io = ScriptedIo::default();
    let cx = TurnContext::new(
        &mut w,
        player(),
        Arc::new(demo::rulebook().unwrap()),
        &narrator,
        &mut io,
        &config,
    );
    parser.handle_all(input, &cx, verify).map(|p| p.action)
}

fn indifferent(_: &Action) -> Result<Plausibility> {
    Ok(Plausibility::Logical)
}

// =============================================================================
// Patterns
// =============================================================================

#[test]
fn malformed_patterns_are_rejected() {
    let mut g = Grammar::new();
    let taking = Pattern::new("Taking", [var("actor"), var("x")]);
    assert_eq!(g.understand("", taking.clone()), Err(GrammarError::Empty));
    assert!(matches!(
        g.understand("take [something x", taking.clone()),
        Err(GrammarError::UnclosedSlot(_))
    ));
    assert!(matches!(
        g.understand("take [colour x]", taking.clone()),
        Err(GrammarError::UnknownGoal(_))
    ));
    assert!(matches!(g.understand("take", taking), Err(GrammarError::Unfilled { .. })));
    assert!(g.rules().is_empty());
}

#[test]
fn quoted_text_fills_text_slots() {
    let action = parse("say \"open sesame\"", &indifferent).unwrap();
    assert_eq!(action, Action::new("Saying", [player(), Value::text("open sesame")]));
}

#[test]
fn unquoted_text_does_not() {
    assert!(matches!(
        parse("say lever", &indifferent),
        Err(ParseFailure::NoUnderstand)
    ));
}

// =============================================================================
// Ranking
// =============================================================================

#[test]
fn verify_breaks_ties() {
    let prefer_dial = |a: &Action| -> Result<Plausibility> {
        Ok(if a.arg(1) == obj("dial") {
            Plausibility::VeryLogical
        } else {
            Plausibility::Logical
        })
    };
    assert_eq!(
        parse("turn brass", &prefer_dial).unwrap(),
        Action::new("Turning", [player(), obj("dial")])
    );
}

#[test]
fn illogical_readings_drop_out() {
    let no_levers = |a: &Action| -> Result<Plausibility> {
        Ok(if a.arg(1) == obj("lever") {
            Plausibility::illogical("It's rusted solid.")
        } else {
            Plausibility::Logical
        })
    };
    assert_eq!(
        parse("yank brass", &no_levers).unwrap(),
        Action::new("Pulling", [player(), obj("dial")])
    );
}

#[test]
fn when_everything_is_illogical_the_first_reading_runs() {
    let nothing = |_: &Action| -> Result<Plausibility> { Ok(Plausibility::illogical("No.")) };
    assert_eq!(
        parse("pull brass", &nothing).unwrap(),
        Action::new("Pulling", [player(), obj("lever")])
    );
}

#[test]
fn ties_leave_the_verb_fixed() {
    let Err(ParseFailure::Ambiguous(ambiguity)) = parse("push brass", &indifferent) else {
        panic!("expected ambiguity");
    };
    assert_eq!(ambiguity.options[0].1, [obj("lever"), obj("dial")]);
    assert_eq!(ambiguity.pattern, Pattern::new("Pushing", [val(player()), var("x")]));
}

#[test]
fn verify_faults_stop_the_parse() {
    let broken = |_: &Action| -> Result<Plausibility> { Err(Error::internal("verify broke")) };
    assert!(matches!(parse("push button", &broken), Err(ParseFailure::Fault(_))));
}
