//! The standard grammar over the demo world
//!
//! Covers noun resolution, verify ranking, and the ways a parse can fail.

use std::sync::Arc;

use fabula_engine::{Action, EngineConfig, ParseFailure, Parsed, Parser, ScriptedIo, TurnContext};
use fabula_foundation::{Fact, Value};
use fabula_parser::CommandParser;
use fabula_stdlib::{TemplateNarrator, demo, model, standard_grammar};
use fabula_storage::World;

fn obj(id: &str) -> Value {
    Value::object(id)
}

fn player() -> Value {
    obj(demo::PLAYER)
}

fn act(kind: &str, rest: &[Value]) -> Action {
    Action::new(kind, std::iter::once(player()).chain(rest.iter().cloned()))
}

fn world_holding(held: &[&str]) -> World {
    let mut w = demo::world().unwrap();
    for id in held {
        model::detach(&mut w, &obj(id)).unwrap();
        w.relate(Fact::new("Has", [player(), obj(id)])).unwrap();
    }
    w.seal();
    w
}

/// Parses `input` the way a turn does, ranking with the demo rulebook.
fn parse(world: &mut World, input: &str) -> Result<Parsed, ParseFailure> {
    let parser = CommandParser::new(standard_grammar().unwrap(), demo::scope);
    let narrator = TemplateNarrator::new();
    let config = EngineConfig::default();
    let mut io = ScriptedIo::default();
    let cx = TurnContext::new(
        world,
        player(),
        Arc::new(demo::rulebook().unwrap()),
        &narrator,
        &mut io,
        &config,
    );
    parser.handle_all(input, &cx, &|a| cx.verify(a))
}

fn parsed(world: &mut World, input: &str) -> Parsed {
    match parse(world, input) {
        Ok(p) => p,
        Err(e) => panic!("{input:?} failed: {e:?}"),
    }
}

// =============================================================================
// Successful parses
// =============================================================================

#[test]
fn articles_and_adjectives_pick_one_object() {
    let mut w = world_holding(&[]);
    let p = parsed(&mut w, "take the red ball");
    assert_eq!(p.action, act("Taking", &[obj("red_ball")]));
    assert!(!p.disambiguated);
}

#[test]
fn bare_verbs_and_synonyms() {
    let mut w = world_holding(&[]);
    assert_eq!(parsed(&mut w, "look").action, act("Looking", &[]));
    assert_eq!(parsed(&mut w, "i").action, act("TakingInventory", &[]));
    assert_eq!(parsed(&mut w, "x coin").action, act("Examining", &[obj("coin")]));
    assert_eq!(parsed(&mut w, "pick the blue ball up").action, act("Taking", &[obj("blue_ball")]));
}

#[test]
fn directions_resolve_to_their_names() {
    let mut w = world_holding(&[]);
    assert_eq!(parsed(&mut w, "n").action, act("Going", &[Value::text("north")]));
    assert_eq!(parsed(&mut w, "go north").action, act("Going", &[Value::text("north")]));
}

#[test]
fn two_slots_fill_independently() {
    let mut w = world_holding(&[]);
    assert_eq!(
        parsed(&mut w, "put red ball in box").action,
        act("InsertingInto", &[obj("red_ball"), obj("box")])
    );
}

#[test]
fn objects_answer_to_their_name_words() {
    let mut w = world_holding(&[]);
    assert_eq!(parsed(&mut w, "open the oak door").action, act("Opening", &[obj("oak_door")]));
    assert_eq!(parsed(&mut w, "examine me").action, act("Examining", &[player()]));
}

// =============================================================================
// Ranking
// =============================================================================

#[test]
fn equal_readings_are_ambiguous() {
    let mut w = world_holding(&[]);
    let Err(ParseFailure::Ambiguous(ambiguity)) = parse(&mut w, "take ball") else {
        panic!("expected ambiguity");
    };
    assert_eq!(ambiguity.len(), 1);
    let (var, options) = &ambiguity.options[0];
    assert_eq!(&**var, "x");
    assert_eq!(options, &[obj("red_ball"), obj("blue_ball")]);
    assert_eq!(&*ambiguity.pattern.kind, "Taking");
}

#[test]
fn verify_prefers_the_held_ball_for_dropping() {
    let mut w = world_holding(&["red_ball"]);
    let p = parsed(&mut w, "drop ball");
    assert_eq!(p.action, act("Dropping", &[obj("red_ball")]));
    assert!(p.disambiguated);
}

#[test]
fn verify_prefers_the_loose_ball_for_taking() {
    let mut w = world_holding(&["red_ball"]);
    let p = parsed(&mut w, "take ball");
    assert_eq!(p.action, act("Taking", &[obj("blue_ball")]));
    assert!(p.disambiguated);
}

#[test]
fn an_impossible_reading_still_runs() {
    // The coin is inside the closed box, so taking it can only fail, but
    // it is still the only reading.
    let mut w = world_holding(&[]);
    let p = parsed(&mut w, "take coin");
    assert_eq!(p.action, act("Taking", &[obj("coin")]));
    assert!(!p.disambiguated);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn unknown_words_are_named() {
    let mut w = world_holding(&[]);
    match parse(&mut w, "take xyzzy") {
        Err(ParseFailure::NoSuchWord(word)) => assert_eq!(word, "xyzzy"),
        other => panic!("expected an unknown word, got {other:?}"),
    }
}

#[test]
fn known_words_in_the_wrong_shape() {
    let mut w = world_holding(&[]);
    assert!(matches!(parse(&mut w, "take"), Err(ParseFailure::NoUnderstand)));
    assert!(matches!(parse(&mut w, "ball take"), Err(ParseFailure::NoUnderstand)));
}

#[test]
fn blank_input() {
    let mut w = world_holding(&[]);
    assert!(matches!(parse(&mut w, ""), Err(ParseFailure::NoInput)));
    assert!(matches!(parse(&mut w, "   "), Err(ParseFailure::NoInput)));
}

// =============================================================================
// Single goals
// =============================================================================

#[test]
fn run_parser_scores_by_content_words() {
    let mut w = world_holding(&[]);
    let parser = CommandParser::new(standard_grammar().unwrap(), demo::scope);
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

    assert_eq!(
        parser.run_parser("something", "the red ball", &cx).unwrap(),
        [(obj("red_ball"), 2)]
    );
    assert_eq!(parser.run_parser("something", "ball", &cx).unwrap().len(), 2);
    assert_eq!(
        parser.run_parser("direction", "ne", &cx).unwrap(),
        [(Value::text("northeast"), 1)]
    );
    assert!(parser.run_parser("something", "unicorn", &cx).unwrap().is_empty());
    assert!(parser.run_parser("smell", "ball", &cx).is_err());
}
