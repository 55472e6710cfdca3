//! Saving, restoring, and rolling back through a session

use std::sync::Arc;

use fabula_engine::{ActionKind, ScriptedIo, Story, handler};
use fabula_foundation::{Error, Fact, Pattern, Value, var};
use fabula_parser::CommandParser;
use fabula_runtime::{Session, serialize};
use fabula_stdlib::{demo, model, standard_grammar};

fn obj(id: &str) -> Value {
    Value::object(id)
}

fn player() -> Value {
    obj(demo::PLAYER)
}

fn session(inputs: &[&str]) -> Session<ScriptedIo> {
    Session::new(demo::story().unwrap(), ScriptedIo::new(inputs.iter().copied()))
}

// =============================================================================
// Snapshots
// =============================================================================

#[test]
fn a_saved_game_continues_in_a_new_session() {
    let path = std::env::temp_dir().join("fabula_persistence_continue.msgpack");

    let mut first = session(&["take red ball", "n"]);
    first.play();
    first.save(&path).unwrap();

    let mut second = session(&["s", "drop red ball"]);
    second.restore(&path).unwrap();
    assert_eq!(model::location(second.world(), &player()).unwrap(), obj("study"));
    assert!(second.world().is("Visited", [obj("study")]).unwrap());

    second.play();
    let out = second.io().transcript();
    assert!(out.starts_with("Hall\n"), "{out}");
    assert!(out.ends_with("Dropped."), "{out}");
    assert!(
        second
            .world()
            .holds(&Fact::new("Contains", [obj("hall"), obj("red_ball")]))
            .unwrap()
    );
    let _ = std::fs::remove_file(&path);
}

#[test]
fn restoring_a_missing_file_reports_and_continues() {
    let mut s = session(&["restore /nonexistent/fabula.msgpack", "take red ball"]);
    s.play();
    let out = s.io().transcript();
    assert!(out.starts_with("Restore failed: "), "{out}");
    assert!(out.ends_with("\nTaken."), "{out}");
}

#[test]
fn snapshot_bytes_match_the_live_world() {
    let mut s = session(&["open box", "take coin", "n"]);
    s.play();
    let bytes = serialize::to_bytes(s.world()).unwrap();

    let fresh = demo::story().unwrap().world;
    let restored = serialize::from_bytes(&fresh, &bytes).unwrap();
    assert_eq!(restored.snapshot(), s.world().snapshot());
    assert!(restored.holds(&Fact::new("Has", [player(), obj("coin")])).unwrap());
}

// =============================================================================
// Rollback
// =============================================================================

/// The demo story plus `sing`, which moves the red ball and then fails.
fn off_key_story(panics: bool) -> Story {
    let mut book = demo::rulebook().unwrap();
    book.define_action(ActionKind::new("Singing", &["actor"]).with_forms("sing", "singing"))
        .unwrap();
    book.when(
        "Singing",
        handler(move |cx, _, _| {
            cx.write("La la la.");
            model::detach(cx.world_mut(), &obj("red_ball"))?;
            if panics {
                panic!("off key");
            }
            Err(Error::internal("off key").into())
        })
        .named("sing"),
    )
    .unwrap();

    let mut grammar = standard_grammar().unwrap();
    grammar
        .understand("sing", Pattern::new("Singing", [var("actor")]))
        .unwrap();

    let mut story = demo::story().unwrap();
    story.rulebook = Arc::new(book);
    story.parser = Arc::new(CommandParser::new(grammar, demo::scope));
    story
}

#[test]
fn a_faulting_turn_leaves_no_trace() {
    for panics in [false, true] {
        let mut s = Session::new(off_key_story(panics), ScriptedIo::new(["sing", "take red ball"]));
        s.play();
        assert_eq!(s.io().transcript(), "Taken.", "panics = {panics}");
        assert!(
            s.world()
                .holds(&Fact::new("Has", [player(), obj("red_ball")]))
                .unwrap()
        );
    }
}
