//! Integration tests for snapshots
//!
//! Tests that a snapshot captures exactly the session state and restores
//! against any world built from the same story.

use fabula_foundation::{Fact, Value};
use fabula_runtime::serialize;
use fabula_stdlib::{demo, model};
use fabula_storage::{RelationSnapshot, World};
use proptest::prelude::*;

fn obj(name: &str) -> Value {
    Value::object(name)
}

fn sealed_demo() -> World {
    let mut w = demo::world().unwrap();
    w.seal();
    w
}

fn give(w: &mut World, x: &str) {
    model::detach(w, &obj(x)).unwrap();
    w.relate(Fact::new("Has", [obj(demo::PLAYER), obj(x)])).unwrap();
}

#[test]
fn fresh_world_snapshot_has_no_overlay() {
    let w = sealed_demo();
    let snap = w.snapshot();
    assert!(snap.overlay.is_empty());
    assert!(snap.relations.iter().any(|r| r.kind == "Contains" && !r.facts.is_empty()));
}

#[test]
fn restore_against_a_separately_built_world() {
    let mut played = sealed_demo();
    played.set("IsOpen", [obj("box")], true).unwrap();
    give(&mut played, "coin");

    let restored = sealed_demo().restore(played.snapshot()).unwrap();
    assert_eq!(restored.snapshot(), played.snapshot());
    assert_eq!(restored.get("Location", [obj("coin")]).unwrap(), obj(demo::PLAYER));
    assert!(restored.is("IsOpen", [obj("box")]).unwrap());
}

#[test]
fn restore_discards_the_restoring_worlds_overlay() {
    let clean = sealed_demo();
    let mut dirty = sealed_demo();
    dirty.set("IsOpen", [obj("box")], true).unwrap();
    give(&mut dirty, "red_ball");

    let back = dirty.restore(clean.snapshot()).unwrap();
    assert!(!back.is("IsOpen", [obj("box")]).unwrap());
    assert_eq!(back.get("Location", [obj("red_ball")]).unwrap(), obj("hall"));
}

#[test]
fn restore_preserves_relation_order() {
    let mut w = sealed_demo();
    give(&mut w, "blue_ball");
    give(&mut w, "red_ball");
    let restored = w.restore(w.snapshot()).unwrap();
    let held: Vec<_> = restored
        .facts("Has")
        .unwrap()
        .map(|f| f.args[1].clone())
        .collect();
    assert_eq!(held, [obj("blue_ball"), obj("red_ball")]);
}

#[test]
fn snapshots_naming_unknown_relations_are_rejected() {
    let w = sealed_demo();
    let mut snap = w.snapshot();
    snap.relations.push(RelationSnapshot {
        kind: "Haunts".to_string(),
        facts: vec![vec![obj("ghost"), obj("hall")]],
    });
    assert!(w.restore(snap).is_err());
}

#[test]
fn encoded_snapshots_survive_the_trip() {
    let mut w = sealed_demo();
    w.set("Visited", [obj("study")], true).unwrap();
    let bytes = serialize::to_bytes(&w).unwrap();
    let back = serialize::from_bytes(&sealed_demo(), &bytes).unwrap();
    assert_eq!(back.snapshot(), w.snapshot());
}

// =============================================================================
// Property tests
// =============================================================================

const THINGS: [&str; 4] = ["red_ball", "blue_ball", "coin", "brass_key"];
const HOLDERS: [(&str, &str); 4] = [
    ("Contains", "hall"),
    ("Contains", "box"),
    ("Supports", "table"),
    ("Has", demo::PLAYER),
];

proptest! {
    #[test]
    fn any_sequence_of_moves_restores_exactly(
        moves in proptest::collection::vec((0usize..4, 0usize..4), 0..12),
    ) {
        let mut w = sealed_demo();
        for (thing, holder) in moves {
            let (relation, holder) = HOLDERS[holder];
            model::detach(&mut w, &obj(THINGS[thing])).unwrap();
            w.relate(Fact::new(relation, [obj(holder), obj(THINGS[thing])])).unwrap();
        }
        let restored = sealed_demo().restore(w.snapshot()).unwrap();
        for thing in THINGS {
            prop_assert_eq!(
                restored.get("Location", [obj(thing)]).unwrap(),
                w.get("Location", [obj(thing)]).unwrap()
            );
        }
        prop_assert_eq!(restored.snapshot(), w.snapshot());
    }
}
