//! Integration tests for activity tables
//!
//! Tests that every handler runs, how results are accumulated, and how a
//! handler can end the run early.

use std::sync::Arc;

use fabula_foundation::{Bindings, Error, FactSource, Value};
use fabula_rules::{Accumulator, Activity, ActivityTable, Dispatch, Outcome, Placement};
use fabula_storage::World;

type Handler = fn(&[Value]) -> Outcome<Value>;

struct Caller {
    world: World,
    ran: usize,
}

impl Dispatch<Handler> for Caller {
    type Output = Value;
    type Escape = Error;

    fn facts(&self) -> &dyn FactSource {
        &self.world
    }

    fn invoke(
        &mut self,
        handler: &Handler,
        args: &[Value],
        _: &Bindings,
    ) -> Result<Outcome<Value>, Error> {
        self.ran += 1;
        Ok(handler(args))
    }
}

fn caller() -> Caller {
    Caller {
        world: World::new(),
        ran: 0,
    }
}

fn article(_: &[Value]) -> Outcome<Value> {
    Outcome::Value(Value::text("A"))
}

fn noun(args: &[Value]) -> Outcome<Value> {
    let id = args[0].as_object().map_or("thing", |id| id.as_str());
    Outcome::Value(Value::text(&id.replace('_', " ")))
}

fn silence(_: &[Value]) -> Outcome<Value> {
    Outcome::Value(Value::Nil)
}

fn pass(_: &[Value]) -> Outcome<Value> {
    Outcome::NotHandled
}

fn finish(_: &[Value]) -> Outcome<Value> {
    Outcome::Handled(Value::text("Nothing to see."))
}

fn count(_: &[Value]) -> Outcome<Value> {
    Outcome::Value(Value::Int(1))
}

fn describing(accumulator: Accumulator) -> ActivityTable<Handler> {
    let mut t = ActivityTable::new("describe").with_accumulator(accumulator);
    t.append(Activity::new(article as Handler).named("article")).unwrap();
    t.append(Activity::new(silence as Handler).named("silence")).unwrap();
    t.append(Activity::new(pass as Handler)).unwrap();
    t.append(Activity::new(noun as Handler).named("noun")).unwrap();
    t
}

fn lamp() -> Vec<Value> {
    vec![Value::object("brass_lamp")]
}

// =============================================================================
// Accumulators
// =============================================================================

#[test]
fn every_handler_runs() {
    let mut p = caller();
    describing(Accumulator::FirstNonEmpty).dispatch(&lamp(), &mut p, &[]).unwrap();
    assert_eq!(p.ran, 4);
}

#[test]
fn first_non_empty_takes_the_earliest_answer() {
    let out = describing(Accumulator::FirstNonEmpty)
        .dispatch(&lamp(), &mut caller(), &[])
        .unwrap();
    assert_eq!(out, Value::text("A"));
}

#[test]
fn join_builds_a_sentence() {
    let out = describing(Accumulator::join_with_spaces())
        .dispatch(&lamp(), &mut caller(), &[])
        .unwrap();
    assert_eq!(out, Value::text("A brass lamp"));
}

#[test]
fn list_append_keeps_non_nil_results() {
    let out = describing(Accumulator::ListAppend)
        .dispatch(&lamp(), &mut caller(), &[])
        .unwrap();
    assert_eq!(out, Value::list([Value::text("A"), Value::text("brass lamp")]));
}

#[test]
fn reduce_folds_every_result() {
    let total = Accumulator::Reduce(Arc::new(|vs: Vec<Value>| {
        Value::Int(vs.iter().filter_map(Value::as_int).sum())
    }));
    let mut t = ActivityTable::new("weigh").with_accumulator(total);
    for name in ["a", "b", "c"] {
        t.append(Activity::new(count as Handler).named(name)).unwrap();
    }
    assert_eq!(t.dispatch(&lamp(), &mut caller(), &["b"]).unwrap(), Value::Int(2));
}

#[test]
fn empty_activity_yields_the_accumulator_identity() {
    let t: ActivityTable<Handler> =
        ActivityTable::new("nothing").with_accumulator(Accumulator::ListAppend);
    assert_eq!(t.dispatch(&lamp(), &mut caller(), &[]).unwrap(), Value::list([]));
}

// =============================================================================
// Early exit and disabling
// =============================================================================

#[test]
fn handled_bypasses_the_accumulator() {
    let mut t = describing(Accumulator::join_with_spaces());
    t.add(Activity::new(finish as Handler).named("finish"), &Placement::after("article"))
        .unwrap();
    let mut p = caller();
    let out = t.dispatch(&lamp(), &mut p, &[]).unwrap();
    assert_eq!(out, Value::text("Nothing to see."));
    assert_eq!(p.ran, 2);
}

#[test]
fn disabled_handlers_do_not_run() {
    let mut p = caller();
    let out = describing(Accumulator::join_with_spaces())
        .dispatch(&lamp(), &mut p, &["article"])
        .unwrap();
    assert_eq!(out, Value::text("brass lamp"));
    assert_eq!(p.ran, 3);
}
