//! Integration tests for the four-phase action pipeline
//!
//! Tests phase order, verify scoring, aborts, and per-phase dispatch.

use fabula_engine::{
    Action, EngineConfig, Interrupt, Phase, PhaseFn, Plausibility, Rulebook, abort, handled,
    handler, proceed, verifier,
};
use fabula_foundation::{ErrorKind, Guard, Pattern, Value, val, var};
use fabula_rules::{Outcome, Placement, Rule};

use crate::fixture::{book, lamp, player, run, turn, world};

fn push() -> Action {
    Action::new("Pushing", [player(), lamp()])
}

fn say(text: &'static str) -> Rule<PhaseFn> {
    handler(move |cx, _, _| {
        cx.write(text);
        proceed()
    })
}

// =============================================================================
// Phases
// =============================================================================

#[test]
fn phases_run_in_order() {
    let mut b = book();
    b.report("Pushing", say("report")).unwrap();
    b.when("Pushing", say("when")).unwrap();
    b.before("Pushing", say("before")).unwrap();

    let mut w = world();
    let (result, out) = run(&mut w, b, push());
    assert!(result.is_ok());
    assert_eq!(out, "before\nwhen\nreport");
}

#[test]
fn when_rules_change_the_world() {
    let mut b = book();
    b.when(
        "Pushing",
        handler(|cx, action, _| {
            cx.world_mut().set("Lit", [action.arg(1)], true)?;
            proceed()
        }),
    )
    .unwrap();

    let mut w = world();
    let (result, _) = run(&mut w, b, push());
    assert!(result.is_ok());
    assert!(w.is("Lit", [lamp()]).unwrap());
}

#[test]
fn announcing_writes_the_gerund_first() {
    let mut b = book();
    b.report("Pushing", say("Pushed.")).unwrap();
    let mut w = world();
    let (_, out) = turn(&mut w, b, &EngineConfig::default(), |cx| cx.run_action(push(), true));
    assert_eq!(out, "(pushing the lamp)\nPushed.");
}

#[test]
fn handled_ends_only_the_current_phase() {
    let mut b = book();
    b.before("Pushing", handler(|_, _, _| handled())).unwrap();
    b.before("Pushing", say("skipped")).unwrap();
    b.when("Pushing", say("when")).unwrap();

    let mut w = world();
    let (_, out) = run(&mut w, b, push());
    assert_eq!(out, "when");
}

#[test]
fn a_specific_report_can_replace_the_default() {
    let mut b = book();
    b.report("Pushing", say("Pushed.").named("default")).unwrap();
    b.add(
        "Pushing",
        Phase::Report,
        handler(|cx, _, _| {
            cx.write("The lamp rocks on its base.");
            handled()
        })
        .named("lamp")
        .on([var("actor"), val(lamp())]),
        &Placement::before("default"),
    )
    .unwrap();

    let mut w = world();
    let (_, out) = turn(&mut w, b, &EngineConfig::default(), |cx| {
        cx.run_action(push(), false).unwrap();
        cx.run_action(Action::new("Pushing", [player(), player()]), false)
    });
    assert_eq!(out, "The lamp rocks on its base.\nPushed.");
}

// =============================================================================
// Verify
// =============================================================================

#[test]
fn illogical_actions_abort_before_any_phase() {
    let mut b = book();
    b.verify(
        "Pushing",
        verifier(|_, _, _| Ok(Outcome::Value(Plausibility::illogical("It won't budge.")))),
    )
    .unwrap();
    b.before("Pushing", say("before")).unwrap();

    let mut w = world();
    let (result, out) = run(&mut w, b, push());
    assert_eq!(result.unwrap_err().message(), Some("It won't budge."));
    assert_eq!(out, "");
}

#[test]
fn verify_folds_to_the_lowest_score() {
    let mut b = book();
    b.verify("Pushing", verifier(|_, _, _| Ok(Outcome::Value(Plausibility::VeryLogical))))
        .unwrap();
    b.verify("Pushing", verifier(|_, _, _| Ok(Outcome::Value(Plausibility::NonObvious))))
        .unwrap();
    b.verify("Pushing", verifier(|_, _, _| Ok(Outcome::NotHandled))).unwrap();

    let mut w = world();
    let (score, _) = turn(&mut w, b, &EngineConfig::default(), |cx| cx.verify(&push()).unwrap());
    assert_eq!(score, Plausibility::NonObvious);
}

#[test]
fn verify_with_no_opinion_is_logical() {
    let mut w = world();
    let (score, _) = turn(&mut w, book(), &EngineConfig::default(), |cx| {
        cx.verify(&push()).unwrap()
    });
    assert_eq!(score, Plausibility::Logical);
}

#[test]
fn verify_guards_read_the_world() {
    let mut b = book();
    b.verify(
        "Pushing",
        verifier(|_, _, _| Ok(Outcome::Value(Plausibility::illogical("It's too hot."))))
            .on([var("actor"), var("x")])
            .when(Guard::holds(Pattern::new("Lit", [var("x")]))),
    )
    .unwrap();

    let mut w = world();
    let (score, _) = turn(&mut w, b.clone(), &EngineConfig::default(), |cx| {
        cx.verify(&push()).unwrap()
    });
    assert_eq!(score, Plausibility::Logical);

    w.set("Lit", [lamp()], true).unwrap();
    let (score, _) = turn(&mut w, b, &EngineConfig::default(), |cx| cx.verify(&push()).unwrap());
    assert!(score.is_illogical());
}

#[test]
fn a_handled_verify_stops_scoring() {
    let mut b = book();
    b.verify("Pushing", verifier(|_, _, _| Ok(Outcome::Handled(Plausibility::VeryLogical))))
        .unwrap();
    b.verify(
        "Pushing",
        verifier(|_, _, _| Ok(Outcome::Value(Plausibility::illogical("unreachable")))),
    )
    .unwrap();

    let mut w = world();
    let (score, _) = turn(&mut w, b, &EngineConfig::default(), |cx| cx.verify(&push()).unwrap());
    assert_eq!(score, Plausibility::VeryLogical);
}

// =============================================================================
// Aborts and instances
// =============================================================================

#[test]
fn abort_in_before_skips_the_remaining_phases() {
    let mut b = book();
    b.before("Pushing", handler(|_, _, _| abort("Not now."))).unwrap();
    b.when(
        "Pushing",
        handler(|cx, action, _| {
            cx.world_mut().set("Lit", [action.arg(1)], true)?;
            proceed()
        }),
    )
    .unwrap();
    b.report("Pushing", say("report")).unwrap();

    let mut w = world();
    let (result, out) = run(&mut w, b, push());
    assert!(matches!(result, Err(Interrupt::Abort(Some(ref m))) if m == "Not now."));
    assert_eq!(out, "");
    assert!(!w.is("Lit", [lamp()]).unwrap());
}

fn stash_and_report(b: &mut Rulebook, kind: &str) {
    b.before(
        kind,
        handler(|_, action, _| {
            action.set_field("degrees", Value::Int(90));
            proceed()
        }),
    )
    .unwrap();
    b.report(
        kind,
        handler(|cx, action, _| {
            let degrees = action.field("degrees");
            cx.write(&format!("degrees: {degrees}"));
            proceed()
        }),
    )
    .unwrap();
}

#[test]
fn instance_fields_carry_across_phases_when_wanted() {
    let mut b = book();
    stash_and_report(&mut b, "Turning");
    stash_and_report(&mut b, "Pushing");

    let mut w = world();
    let (_, out) = turn(&mut w, b, &EngineConfig::default(), |cx| {
        cx.run_action(Action::new("Turning", [player(), lamp()]), false).unwrap();
        cx.run_action(push(), false).unwrap();
    });
    assert_eq!(out, "degrees: 90\ndegrees: nil");
}

// =============================================================================
// Faults
// =============================================================================

#[test]
fn wrong_arity_is_a_fault() {
    let mut w = world();
    let (result, _) = turn(&mut w, book(), &EngineConfig::default(), |cx| {
        cx.run_action(Action::new("Pushing", [player()]), false)
    });
    match result {
        Err(Interrupt::Fault(e)) => assert!(matches!(e.kind, ErrorKind::ArityMismatch { .. })),
        other => panic!("expected fault, got {other:?}"),
    }
}

#[test]
fn undefined_actions_are_faults() {
    let mut w = world();
    let (result, _) = turn(&mut w, book(), &EngineConfig::default(), |cx| {
        cx.run_action(Action::new("Flying", [player()]), false)
    });
    match result {
        Err(Interrupt::Fault(e)) => assert!(matches!(e.kind, ErrorKind::UndefinedAction(_))),
        other => panic!("expected fault, got {other:?}"),
    }
}

#[test]
fn faults_name_the_action_they_happened_in() {
    let mut b = book();
    b.when(
        "Pushing",
        handler(|cx, action, _| {
            cx.get("Weight", [action.arg(1)])?;
            proceed()
        }),
    )
    .unwrap();

    let mut w = world();
    let (result, _) = run(&mut w, b, push());
    let Err(Interrupt::Fault(e)) = result else {
        panic!("expected fault");
    };
    assert!(matches!(e.kind, ErrorKind::UndefinedProperty(_)));
    assert_eq!(e.context.map(|c| c.stack).unwrap_or_default(), ["Pushing(player, lamp)"]);
}
