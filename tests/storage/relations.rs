//! Integration tests for relations held by the world
//!
//! Tests cardinality policies, enumeration order, and reachability.

use fabula_foundation::{ErrorKind, Fact, Pattern, Value, val, var};
use fabula_storage::{Cardinality, OnViolation, RelationSchema, World};

fn obj(name: &str) -> Value {
    Value::object(name)
}

fn fact(kind: &str, a: &str, b: &str) -> Fact {
    Fact::new(kind, [obj(a), obj(b)])
}

fn world() -> World {
    let mut w = World::new();
    w.define_relation(
        RelationSchema::new("Contains", 2)
            .with_cardinality(Cardinality::OneToMany)
            .with_on_violation(OnViolation::Replace),
    )
    .unwrap();
    w.define_relation(RelationSchema::new("Married", 2).with_cardinality(Cardinality::OneToOne))
        .unwrap();
    w.define_relation(RelationSchema::new("Exit", 3)).unwrap();
    w.seal();
    w
}

#[test]
fn replace_policy_moves_things() {
    let mut w = world();
    w.relate(fact("Contains", "hall", "ball")).unwrap();
    w.relate(fact("Contains", "hall", "hat")).unwrap();
    assert!(w.relate(fact("Contains", "box", "ball")).unwrap());

    let in_hall = w
        .query_values(&Pattern::new("Contains", [val(obj("hall")), var("x")]), "x")
        .unwrap();
    assert_eq!(in_hall, [obj("hat")]);
    assert!(w.holds(&fact("Contains", "box", "ball")).unwrap());
}

#[test]
fn error_policy_refuses_and_keeps_the_old_fact() {
    let mut w = world();
    w.relate(fact("Married", "ann", "bob")).unwrap();
    let err = w.relate(fact("Married", "cat", "bob")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::CardinalityViolation { .. }));
    assert!(w.holds(&fact("Married", "ann", "bob")).unwrap());
    assert!(!w.holds(&fact("Married", "cat", "bob")).unwrap());
}

#[test]
fn relating_twice_is_a_no_op() {
    let mut w = world();
    assert!(w.relate(fact("Contains", "hall", "ball")).unwrap());
    assert!(!w.relate(fact("Contains", "hall", "ball")).unwrap());
    assert_eq!(w.facts("Contains").unwrap().count(), 1);
}

#[test]
fn unrelate_reports_whether_anything_changed() {
    let mut w = world();
    w.relate(fact("Contains", "hall", "ball")).unwrap();
    assert!(w.unrelate(&fact("Contains", "hall", "ball")).unwrap());
    assert!(!w.unrelate(&fact("Contains", "hall", "ball")).unwrap());
}

#[test]
fn three_place_relations_query_by_any_position() {
    let mut w = world();
    w.relate(Fact::new("Exit", [obj("hall"), Value::text("north"), obj("door")]))
        .unwrap();
    w.relate(Fact::new("Exit", [obj("study"), Value::text("south"), obj("door")]))
        .unwrap();

    let sides = w
        .query_values(&Pattern::new("Exit", [var("room"), var("dir"), val(obj("door"))]), "room")
        .unwrap();
    assert_eq!(sides, [obj("hall"), obj("study")]);

    let north = w
        .query(
            &Pattern::new("Exit", [val(obj("hall")), val("north"), var("via")]),
            &Default::default(),
        )
        .unwrap();
    assert_eq!(north.len(), 1);
    assert_eq!(north[0].get("via"), Some(&obj("door")));
}

#[test]
fn path_to_follows_containment() {
    let mut w = world();
    w.relate(fact("Contains", "hall", "table")).unwrap();
    w.relate(fact("Contains", "table", "box")).unwrap();
    w.relate(fact("Contains", "box", "coin")).unwrap();

    let route = w.path_to("Contains", &obj("hall"), &obj("coin")).unwrap();
    assert_eq!(route, Some(vec![obj("hall"), obj("table"), obj("box"), obj("coin")]));
    assert_eq!(w.path_to("Contains", &obj("coin"), &obj("hall")).unwrap(), None);
    assert!(w.path_to("Near", &obj("coin"), &obj("hall")).is_err());
}

#[test]
fn undefined_relations_are_errors() {
    let mut w = world();
    let err = w.relate(fact("Near", "a", "b")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UndefinedRelation(_)));
    assert!(w.facts("Near").is_err());
}
