//! Integration tests for substitution and do-first sub-actions
//!
//! Tests redirect announcements, muting, abort propagation, and the depth
//! and redirect limits.

use fabula_engine::{
    Action, EngineConfig, Interrupt, Rulebook, abort, do_instead, do_instead_quietly, handler,
    proceed,
};
use fabula_foundation::{ErrorKind, SemanticLimit};

use crate::fixture::{book, lamp, player, run, turn, world};

fn push() -> Action {
    Action::new("Pushing", [player(), lamp()])
}

fn pull() -> Action {
    Action::new("Pulling", [player(), lamp()])
}

/// Both actions report themselves; pulling lights the lamp.
fn reporting_book() -> Rulebook {
    let mut b = book();
    b.when(
        "Pulling",
        handler(|cx, action, _| {
            cx.world_mut().set("Lit", [action.arg(1)], true)?;
            proceed()
        }),
    )
    .unwrap();
    b.report(
        "Pulling",
        handler(|cx, _, _| {
            cx.write("Pulled.");
            proceed()
        }),
    )
    .unwrap();
    b.report(
        "Pushing",
        handler(|cx, _, _| {
            cx.write("Pushed.");
            proceed()
        }),
    )
    .unwrap();
    b
}

fn limit_of(result: Result<(), Interrupt>) -> SemanticLimit {
    match result {
        Err(Interrupt::Fault(e)) => match e.kind {
            ErrorKind::LimitExceeded(limit) => limit,
            other => panic!("expected a limit, got {other:?}"),
        },
        other => panic!("expected fault, got {other:?}"),
    }
}

// =============================================================================
// Doing instead
// =============================================================================

#[test]
fn do_instead_announces_the_replacement() {
    let mut b = reporting_book();
    b.before(
        "Pushing",
        handler(|_, action, _| do_instead(Action::new("Pulling", action.args().to_vec()))),
    )
    .unwrap();

    let mut w = world();
    let (result, out) = run(&mut w, b, push());
    assert!(result.is_ok());
    assert_eq!(out, "(pulling the lamp)\nPulled.");
    assert!(w.is("Lit", [lamp()]).unwrap());
}

#[test]
fn do_instead_quietly_skips_the_announcement() {
    let mut b = reporting_book();
    b.before("Pushing", handler(|_, _, _| do_instead_quietly(pull()))).unwrap();

    let mut w = world();
    let (_, out) = run(&mut w, b, push());
    assert_eq!(out, "Pulled.");
}

#[test]
fn redirect_loops_hit_the_limit() {
    let mut b = book();
    b.before("Pushing", handler(|_, _, _| do_instead_quietly(pull()))).unwrap();
    b.before("Pulling", handler(|_, _, _| do_instead_quietly(push()))).unwrap();

    let mut w = world();
    let (result, _) = turn(&mut w, b, &EngineConfig::strict(), |cx| cx.run_action(push(), false));
    assert!(matches!(limit_of(result), SemanticLimit::MaxRedirects { limit: 2, .. }));
}

// =============================================================================
// Doing first
// =============================================================================

#[test]
fn do_first_announces_and_reports() {
    let mut b = reporting_book();
    b.when(
        "Pushing",
        handler(|cx, _, _| {
            cx.do_first(pull(), false)?;
            proceed()
        }),
    )
    .unwrap();

    let mut w = world();
    let (result, out) = run(&mut w, b, push());
    assert!(result.is_ok());
    assert_eq!(out, "(first pulling the lamp)\nPulled.\nPushed.");
}

#[test]
fn silent_do_first_still_changes_the_world() {
    let mut b = reporting_book();
    b.when(
        "Pushing",
        handler(|cx, _, _| {
            cx.do_first(pull(), true)?;
            proceed()
        }),
    )
    .unwrap();

    let mut w = world();
    let (_, out) = run(&mut w, b, push());
    assert_eq!(out, "Pushed.");
    assert!(w.is("Lit", [lamp()]).unwrap());
}

#[test]
fn muting_ends_with_the_sub_action() {
    let mut b = reporting_book();
    b.when(
        "Pushing",
        handler(|cx, _, _| {
            cx.do_first(pull(), true)?;
            assert!(!cx.is_muted());
            assert_eq!(cx.depth(), 0);
            proceed()
        }),
    )
    .unwrap();

    let mut w = world();
    let (result, _) = run(&mut w, b, push());
    assert!(result.is_ok());
}

#[test]
fn sub_action_aborts_reach_the_caller() {
    let mut b = reporting_book();
    b.before("Pulling", handler(|_, _, _| abort("It's stuck."))).unwrap();
    b.when(
        "Pushing",
        handler(|cx, _, _| {
            cx.do_first(pull(), true)?;
            proceed()
        }),
    )
    .unwrap();

    let mut w = world();
    let (result, out) = run(&mut w, b, push());
    assert_eq!(result.unwrap_err().message(), Some("It's stuck."));
    assert_eq!(out, "");
}

#[test]
fn recursive_do_first_hits_the_depth_limit() {
    let mut b = book();
    b.when(
        "Pushing",
        handler(|cx, action, _| {
            cx.do_first(action.clone(), true)?;
            proceed()
        }),
    )
    .unwrap();

    let mut w = world();
    let (result, _) = turn(&mut w, b, &EngineConfig::strict(), |cx| cx.run_action(push(), false));
    match limit_of(result) {
        SemanticLimit::MaxActionDepth { limit, action } => {
            assert_eq!(limit, 4);
            assert_eq!(action.as_deref(), Some("Pushing(player, lamp)"));
        }
        other => panic!("expected depth limit, got {other:?}"),
    }
}

#[test]
fn faults_collect_a_frame_per_action() {
    let mut b = book();
    b.when(
        "Pulling",
        handler(|cx, _, _| {
            cx.get("Weight", [lamp()])?;
            proceed()
        }),
    )
    .unwrap();
    b.when(
        "Pushing",
        handler(|cx, _, _| {
            cx.do_first(pull(), true)?;
            proceed()
        }),
    )
    .unwrap();

    let mut w = world();
    let (result, _) = run(&mut w, b, push());
    let Err(Interrupt::Fault(e)) = result else {
        panic!("expected fault");
    };
    let stack = e.context.map(|c| c.stack).unwrap_or_default();
    assert_eq!(stack, ["Pulling(player, lamp)", "Pushing(player, lamp)"]);
}
