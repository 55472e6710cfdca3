//! Integration tests for rule table dispatch
//!
//! Tests last-match-wins over live facts, placement, disable-lists, and
//! escapes.

use fabula_foundation::{Bindings, Error, ErrorKind, FactSource, Guard, Pattern, Value, val, var};
use fabula_rules::{Collected, Dispatch, Outcome, Placement, Rule, RuleTable};
use fabula_storage::{PropertySchema, World};
use proptest::prelude::*;

#[derive(Debug)]
enum Escape {
    Halt(String),
    Fault(Error),
}

impl From<Error> for Escape {
    fn from(err: Error) -> Self {
        Self::Fault(err)
    }
}

type Handler = fn(&[Value], &Bindings) -> Result<Outcome<String>, Escape>;

struct Caller<'w> {
    world: &'w World,
    ran: usize,
}

impl Dispatch<Handler> for Caller<'_> {
    type Output = String;
    type Escape = Escape;

    fn facts(&self) -> &dyn FactSource {
        self.world
    }

    fn invoke(
        &mut self,
        handler: &Handler,
        args: &[Value],
        bindings: &Bindings,
    ) -> Result<Outcome<String>, Escape> {
        self.ran += 1;
        handler(args, bindings)
    }
}

fn world() -> World {
    let mut w = World::new();
    w.define_property(PropertySchema::flag("Lit", 1)).unwrap();
    w.seal();
    w
}

fn echo(_: &[Value], b: &Bindings) -> Result<Outcome<String>, Escape> {
    Ok(Outcome::Value(b.get("answer").and_then(Value::as_text).unwrap_or_default().to_string()))
}

fn halt(_: &[Value], _: &Bindings) -> Result<Outcome<String>, Escape> {
    Err(Escape::Halt("stop".into()))
}

/// A rule named `text` that answers `text`. Function pointers cannot
/// capture, so the guard binds the answer.
fn answer(text: &'static str) -> Rule<Handler> {
    Rule::new(echo as Handler)
        .named(text)
        .when(Guard::equals(var("answer"), val(text)))
}

fn run(
    table: &RuleTable<Handler>,
    world: &World,
    args: &[Value],
    disable: &[&str],
) -> Option<String> {
    let mut caller = Caller { world, ran: 0 };
    table.dispatch(args, &mut caller, disable).unwrap()
}

fn lamp() -> Vec<Value> {
    vec![Value::object("lamp")]
}

fn describing() -> RuleTable<Handler> {
    let mut t = RuleTable::new("describe");
    t.append(answer("a lamp")).unwrap();
    t.append(
        answer("a glowing lamp")
            .on([var("x")])
            .when(Guard::holds(Pattern::new("Lit", [var("x")]))),
    )
    .unwrap();
    t
}

// =============================================================================
// Last match wins
// =============================================================================

#[test]
fn guards_are_evaluated_at_call_time() {
    let mut w = world();
    let t = describing();
    assert_eq!(run(&t, &w, &lamp(), &[]).as_deref(), Some("a lamp"));

    w.set("Lit", [Value::object("lamp")], true).unwrap();
    assert_eq!(run(&t, &w, &lamp(), &[]).as_deref(), Some("a glowing lamp"));
}

#[test]
fn disabling_the_override_restores_the_default() {
    let mut w = world();
    w.set("Lit", [Value::object("lamp")], true).unwrap();
    let t = describing();
    assert_eq!(run(&t, &w, &lamp(), &["a glowing lamp"]).as_deref(), Some("a lamp"));
    assert_eq!(run(&t, &w, &lamp(), &["a glowing lamp", "a lamp"]), None);
}

#[test]
fn dispatch_all_keeps_every_answer_in_order() {
    let mut w = world();
    w.set("Lit", [Value::object("lamp")], true).unwrap();
    let t = describing();
    let mut caller = Caller { world: &w, ran: 0 };
    let all = t.dispatch_all(&lamp(), &mut caller, &[]).unwrap();
    assert_eq!(
        all,
        Collected::Results(vec!["a lamp".to_string(), "a glowing lamp".to_string()])
    );
    assert_eq!(caller.ran, 2);
}

// =============================================================================
// Placement
// =============================================================================

#[test]
fn placements_compose() {
    let mut t = RuleTable::new("going");
    t.append(answer("setup")).unwrap();
    t.append(answer("check")).unwrap();
    t.add(answer("leave"), &Placement::after("setup")).unwrap();
    t.add(answer("door"), &Placement::after("leave")).unwrap();
    t.add(answer("first"), &Placement::before("setup")).unwrap();
    let names: Vec<_> = t.names().collect();
    assert_eq!(names, ["first", "setup", "leave", "door", "check"]);
}

#[test]
fn placement_errors_leave_the_table_untouched() {
    let mut t = RuleTable::new("going");
    t.append(answer("setup")).unwrap();

    let err = t.add(answer("door"), &Placement::after("missing")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownAnchor(_)));
    let err = t.append(answer("setup")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateDefinition(_)));
    assert_eq!(t.len(), 1);
}

// =============================================================================
// Escapes
// =============================================================================

#[test]
fn escapes_leave_the_dispatch() {
    let w = world();
    let mut t = describing();
    t.append(Rule::new(halt as Handler).named("halt")).unwrap();
    t.append(answer("never")).unwrap();

    let mut caller = Caller { world: &w, ran: 0 };
    match t.dispatch(&lamp(), &mut caller, &[]) {
        Err(Escape::Halt(why)) => assert_eq!(why, "stop"),
        other => panic!("expected halt, got {other:?}"),
    }
    assert_eq!(caller.ran, 2);
}

#[test]
fn guard_errors_become_faults() {
    let w = world();
    let mut t: RuleTable<Handler> = RuleTable::new("broken");
    t.append(answer("x").when(Guard::holds(Pattern::new("Heavy", [val(Value::object("lamp"))]))))
        .unwrap();
    let mut caller = Caller { world: &w, ran: 0 };
    match t.dispatch(&lamp(), &mut caller, &[]) {
        Err(Escape::Fault(e)) => assert!(matches!(e.kind, ErrorKind::UndefinedProperty(_))),
        other => panic!("expected fault, got {other:?}"),
    }
}

// =============================================================================
// Property tests
// =============================================================================

const NAMES: [&str; 6] = ["r0", "r1", "r2", "r3", "r4", "r5"];

proptest! {
    #[test]
    fn answer_is_the_last_enabled_rule(
        count in 1usize..=6,
        disabled in proptest::collection::vec(any::<bool>(), 6),
    ) {
        let w = world();
        let mut t = RuleTable::new("t");
        for name in &NAMES[..count] {
            t.append(answer(*name)).unwrap();
        }
        let disable: Vec<&str> = NAMES[..count]
            .iter()
            .zip(&disabled)
            .filter(|(_, off)| **off)
            .map(|(n, _)| *n)
            .collect();
        let expected = NAMES[..count]
            .iter()
            .copied()
            .rev()
            .find(|n| !disable.contains(n))
            .map(ToString::to_string);
        prop_assert_eq!(run(&t, &w, &lamp(), &disable), expected);
    }
}
