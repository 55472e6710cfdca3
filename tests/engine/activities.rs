//! Integration tests for activities and actor rules called from a turn

use fabula_engine::{EngineConfig, Interrupt, Rulebook, Scratch, activity, actor_rule};
use fabula_foundation::{ErrorKind, Guard, Pattern, Value, val, var};
use fabula_rules::{Accumulator, Outcome};

use crate::fixture::{book, lamp, player, turn, world};

fn describing() -> Rulebook {
    let mut b = book();
    b.define_activity("describing", Accumulator::join_with_spaces()).unwrap();
    b.activity(
        "describing",
        activity(|_, _, _| Ok(Outcome::Value(Value::text("A")))).named("article"),
    )
    .unwrap();
    b.activity(
        "describing",
        activity(|_, _, _| Ok(Outcome::Value(Value::text("brass lamp")))).named("noun"),
    )
    .unwrap();
    b
}

// =============================================================================
// Activities
// =============================================================================

#[test]
fn activity_results_are_accumulated() {
    let mut w = world();
    let (value, _) = turn(&mut w, describing(), &EngineConfig::default(), |cx| {
        cx.call_activity("describing", &[lamp()], &[]).unwrap()
    });
    assert_eq!(value, Value::text("A brass lamp"));
}

#[test]
fn disabled_handlers_are_skipped() {
    let mut w = world();
    let (value, _) = turn(&mut w, describing(), &EngineConfig::default(), |cx| {
        cx.call_activity("describing", &[lamp()], &["article"]).unwrap()
    });
    assert_eq!(value, Value::text("brass lamp"));
}

#[test]
fn a_shared_scratch_remembers_mentions() {
    let mut b = book();
    b.define_activity("mentioning", Accumulator::ListAppend).unwrap();
    b.activity(
        "mentioning",
        activity(|_, args, scratch| {
            let fresh = args.iter().filter(|v| scratch.mention(v)).cloned().collect();
            Ok(Outcome::Value(Value::List(fresh)))
        }),
    )
    .unwrap();

    let mut w = world();
    let ((first, second, mentioned), _) = turn(&mut w, b, &EngineConfig::default(), |cx| {
        let mut scratch = Scratch::new();
        let first = cx
            .call_activity_with("mentioning", &[lamp(), player()], &[], &mut scratch)
            .unwrap();
        let second = cx
            .call_activity_with("mentioning", &[lamp()], &[], &mut scratch)
            .unwrap();
        (first, second, scratch.mentioned().to_vec())
    });
    assert_eq!(first, Value::list([lamp(), player()]));
    assert_eq!(second, Value::list([]));
    assert_eq!(mentioned, [lamp(), player()]);
}

#[test]
fn handlers_can_write_and_abort() {
    let mut b = book();
    b.define_activity("warning", Accumulator::default()).unwrap();
    b.activity(
        "warning",
        activity(|cx, _, _| {
            cx.write("The lamp flickers.");
            Err(Interrupt::Abort(None))
        }),
    )
    .unwrap();

    let mut w = world();
    let (result, out) = turn(&mut w, b, &EngineConfig::default(), |cx| {
        cx.call_activity("warning", &[], &[])
    });
    assert!(matches!(result, Err(Interrupt::Abort(None))));
    assert_eq!(out, "The lamp flickers.");
}

#[test]
fn undefined_activities_are_faults() {
    let mut w = world();
    let (result, _) = turn(&mut w, book(), &EngineConfig::default(), |cx| {
        cx.call_activity("juggling", &[], &[])
    });
    match result {
        Err(Interrupt::Fault(e)) => assert!(matches!(e.kind, ErrorKind::UndefinedActivity(_))),
        other => panic!("expected fault, got {other:?}"),
    }
}

// =============================================================================
// Actor rules
// =============================================================================

#[test]
fn actor_rules_answer_by_guard() {
    let mut b = book();
    b.rule(
        "brightness",
        actor_rule(|_, _, _| Ok(Outcome::Value(Value::text("dark")))).named("default"),
    )
    .unwrap();
    b.rule(
        "brightness",
        actor_rule(|_, _, _| Ok(Outcome::Value(Value::text("bright"))))
            .named("lit")
            .on([var("x")])
            .when(Guard::holds(Pattern::new("Lit", [var("x")]))),
    )
    .unwrap();
    b.rule(
        "brightness",
        actor_rule(|_, _, _| Ok(Outcome::NotHandled)).on([val(player())]),
    )
    .unwrap();

    let mut w = world();
    let (dark, _) = turn(&mut w, b.clone(), &EngineConfig::default(), |cx| {
        cx.call_rule("brightness", &[lamp()], &[]).unwrap()
    });
    assert_eq!(dark, Some(Value::text("dark")));

    w.set("Lit", [lamp()], true).unwrap();
    let ((bright, unlit), _) = turn(&mut w, b, &EngineConfig::default(), |cx| {
        (
            cx.call_rule("brightness", &[lamp()], &[]).unwrap(),
            cx.call_rule("brightness", &[lamp()], &["lit"]).unwrap(),
        )
    });
    assert_eq!(bright, Some(Value::text("bright")));
    assert_eq!(unlit, Some(Value::text("dark")));
}

#[test]
fn unanswered_rules_are_none() {
    let mut b = book();
    b.rule("brightness", actor_rule(|_, _, _| Ok(Outcome::NotHandled))).unwrap();

    let mut w = world();
    let (answer, _) = turn(&mut w, b, &EngineConfig::default(), |cx| {
        cx.call_rule("brightness", &[lamp()], &[]).unwrap()
    });
    assert_eq!(answer, None);
}
