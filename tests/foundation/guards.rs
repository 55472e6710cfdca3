//! Integration tests for guard evaluation over live world facts
//!
//! Tests conjunction backtracking, negation, equality tests against
//! properties, and enumeration order.

use fabula_foundation::{Bindings, ErrorKind, Fact, Guard, Pattern, Value, val, var};
use fabula_storage::{PropertySchema, RelationSchema, World};

fn obj(name: &str) -> Value {
    Value::object(name)
}

fn contains(holder: &str, x: &str) -> Fact {
    Fact::new("Contains", [obj(holder), obj(x)])
}

/// hall holds a chest and a ball; the chest holds a coin and is open.
fn world() -> World {
    let mut w = World::new();
    w.define_relation(RelationSchema::new("Contains", 2)).unwrap();
    w.define_property(PropertySchema::flag("IsOpen", 1)).unwrap();
    w.define_property(PropertySchema::new("Colour", 1)).unwrap();
    w.relate(contains("hall", "chest")).unwrap();
    w.relate(contains("hall", "ball")).unwrap();
    w.relate(contains("chest", "coin")).unwrap();
    w.set("IsOpen", [obj("chest")], true).unwrap();
    w.set("Colour", [obj("ball")], "red").unwrap();
    w.seal();
    w
}

// =============================================================================
// Holds
// =============================================================================

#[test]
fn relation_guard_enumerates_in_insertion_order() {
    let w = world();
    let guard = Guard::holds(Pattern::new("Contains", [val(obj("hall")), var("x")]));
    let xs: Vec<_> = guard
        .solutions(&w, &Bindings::new())
        .unwrap()
        .into_iter()
        .filter_map(|b| b.get("x").cloned())
        .collect();
    assert_eq!(xs, [obj("chest"), obj("ball")]);
}

#[test]
fn property_guard_reads_the_overlay() {
    let mut w = world();
    let guard = Guard::holds(Pattern::new("IsOpen", [var("c")]));
    let chest = Bindings::new().with("c", obj("chest"));
    assert!(guard.satisfied(&w, &chest).unwrap());

    w.set("IsOpen", [obj("chest")], false).unwrap();
    assert!(!guard.satisfied(&w, &chest).unwrap());
}

// =============================================================================
// And / Not
// =============================================================================

#[test]
fn conjunction_backtracks_to_a_later_solution() {
    let w = world();
    // Something in the hall that itself contains something.
    let guard = Guard::holds(Pattern::new("Contains", [val(obj("hall")), var("x")]))
        .and(Guard::holds(Pattern::new("Contains", [var("x"), var("y")])));
    let found = guard.first_solution(&w, &Bindings::new()).unwrap().unwrap();
    assert_eq!(found.get("x"), Some(&obj("chest")));
    assert_eq!(found.get("y"), Some(&obj("coin")));
}

#[test]
fn negation_never_binds() {
    let w = world();
    let guard = Guard::not(Guard::holds(Pattern::new("Contains", [var("x"), val(obj("hall"))])));
    let solutions = guard.solutions(&w, &Bindings::new()).unwrap();
    assert_eq!(solutions.len(), 1);
    assert!(!solutions[0].contains("x"));
}

#[test]
fn negation_inside_conjunction_filters_candidates() {
    let w = world();
    // Things in the hall that hold nothing.
    let guard = Guard::holds(Pattern::new("Contains", [val(obj("hall")), var("x")]))
        .and(Guard::not(Guard::holds(Pattern::new("Contains", [var("x"), var("y")]))));
    let solutions = guard.solutions(&w, &Bindings::new()).unwrap();
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].get("x"), Some(&obj("ball")));
    assert!(!solutions[0].contains("y"));
}

// =============================================================================
// Equals
// =============================================================================

#[test]
fn equals_reads_a_property_after_binding() {
    let w = world();
    let guard = Guard::holds(Pattern::new("Contains", [val(obj("hall")), var("x")]))
        .and(Guard::equals(Pattern::new("Colour", [var("x")]), val("red")));
    let found = guard.first_solution(&w, &Bindings::new()).unwrap().unwrap();
    assert_eq!(found.get("x"), Some(&obj("ball")));
}

#[test]
fn equals_binds_from_a_property() {
    let w = world();
    let guard = Guard::equals(var("colour"), Pattern::new("Colour", [val(obj("ball"))]));
    let found = guard.first_solution(&w, &Bindings::new()).unwrap().unwrap();
    assert_eq!(found.get("colour"), Some(&Value::text("red")));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn unknown_kinds_are_errors_not_failures() {
    let w = world();
    let err = Guard::holds(Pattern::new("Weight", [val(obj("ball"))]))
        .satisfied(&w, &Bindings::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UndefinedProperty(_)));
}

#[test]
fn relation_arity_is_checked() {
    let w = world();
    let err = Guard::holds(Pattern::new("Contains", [var("x")]))
        .satisfied(&w, &Bindings::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ArityMismatch { expected: 2, actual: 1, .. }));
}
