//! A small two-room story that exercises the standard library.
//!
//! The hall holds a table, an opaque box with a coin, and two balls; a
//! closed oak door leads north to the study, where a hat and a key wait.

use std::sync::Arc;

use fabula_engine::{Rulebook, Story};
use fabula_foundation::{Fact, Pattern, Result, Value, var};
use fabula_parser::CommandParser;
use fabula_storage::World;

use crate::model::{self, CONTAINER, DOOR, PERSON, ROOM, SUPPORTER, THING};
use crate::narrator::TemplateNarrator;
use crate::{actions, activities, grammar};

/// The player object.
pub const PLAYER: &str = "player";

/// A rulebook with every standard activity and action.
///
/// # Errors
///
/// Returns an error if a name collides.
pub fn rulebook() -> Result<Rulebook> {
    let mut book = Rulebook::new();
    activities::define(&mut book)?;
    actions::define(&mut book)?;
    Ok(book)
}

/// Everything with a kind is in scope; visibility is left to verify.
///
/// # Errors
///
/// Returns an error if the model is not defined in this world.
pub fn scope(world: &World, _actor: &Value) -> Result<Vec<Value>> {
    world.query_values(&Pattern::new("Instance", [var("x"), var("k")]), "x")
}

/// A world with the standard model and the player, nothing else.
///
/// # Errors
///
/// Returns an error if the model cannot be defined.
pub fn empty_world() -> Result<World> {
    let mut w = World::new();
    model::define(&mut w)?;
    let player = Value::object(PLAYER);
    w.relate(Fact::new("Instance", [player.clone(), Value::text(PERSON)]))?;
    w.set("Name", [player.clone()], "yourself")?;
    w.set("ProperNamed", [player.clone()], true)?;
    w.set(
        "Words",
        [player],
        Value::list(["me", "self", "myself", "yourself"].map(Value::text)),
    )?;
    Ok(w)
}

struct Builder<'w> {
    world: &'w mut World,
}

impl Builder<'_> {
    fn thing(&mut self, id: &str, kind: &str) -> Result<Value> {
        let x = Value::object(id);
        self.world.relate(Fact::new("Instance", [x.clone(), Value::text(kind)]))?;
        Ok(x)
    }

    fn put(&mut self, relation: &str, holder: &Value, x: &Value) -> Result<()> {
        self.world.relate(Fact::new(relation, [holder.clone(), x.clone()]))?;
        Ok(())
    }

    fn words(&mut self, x: &Value, words: &[&str]) -> Result<()> {
        self.world
            .set("Words", [x.clone()], Value::list(words.iter().map(|w| Value::text(w))))
    }
}

/// Builds the demo world, unsealed, so tests can adjust it first.
///
/// # Errors
///
/// Returns an error if the model cannot be defined.
pub fn world() -> Result<World> {
    let mut w = empty_world()?;
    let mut b = Builder { world: &mut w };
    let player = Value::object(PLAYER);

    let hall = b.thing("hall", ROOM)?;
    b.world.set("Description", [hall.clone()], "A draughty hall with a high ceiling.")?;
    let study = b.thing("study", ROOM)?;
    b.world.set("Description", [study.clone()], "Books line every wall.")?;

    let door = b.thing("oak_door", DOOR)?;
    b.world.set("Openable", [door.clone()], true)?;
    b.world.set("Description", [door.clone()], "A heavy oak door.")?;
    b.world
        .relate(Fact::new("Exit", [hall.clone(), Value::text("north"), door.clone()]))?;
    b.world
        .relate(Fact::new("Exit", [study.clone(), Value::text("south"), door]))?;
    b.world.set(
        "NoGoMessage",
        [hall.clone(), Value::text("up")],
        "The ceiling is far too high.",
    )?;

    b.put("Contains", &hall, &player)?;

    let red = b.thing("red_ball", THING)?;
    b.words(&red, &["red", "ball"])?;
    b.put("Contains", &hall, &red)?;
    let blue = b.thing("blue_ball", THING)?;
    b.words(&blue, &["blue", "ball"])?;
    b.put("Contains", &hall, &blue)?;

    let table = b.thing("table", SUPPORTER)?;
    b.world.set("FixedInPlace", [table.clone()], true)?;
    b.put("Contains", &hall, &table)?;

    let chest = b.thing("box", CONTAINER)?;
    b.world.set("Openable", [chest.clone()], true)?;
    b.world.set("Opaque", [chest.clone()], true)?;
    b.put("Supports", &table, &chest)?;
    let coin = b.thing("coin", THING)?;
    b.world.set("Description", [coin.clone()], "A worn silver coin.")?;
    b.put("Contains", &chest, &coin)?;

    let hat = b.thing("hat", THING)?;
    b.world.set("Wearable", [hat.clone()], true)?;
    b.put("Contains", &study, &hat)?;
    let key = b.thing("brass_key", THING)?;
    b.put("Contains", &study, &key)?;

    Ok(w)
}

/// Bundles a world with the standard rulebook, grammar, and narrator.
///
/// # Errors
///
/// Returns an error if the rulebook or grammar cannot be built.
pub fn story_from(mut world: World) -> Result<Story> {
    world.seal();
    let parser = CommandParser::new(grammar::standard_grammar()?, scope);
    Ok(Story {
        world,
        rulebook: Arc::new(rulebook()?),
        parser: Arc::new(parser),
        narrator: Arc::new(TemplateNarrator::new()),
        actor: Value::object(PLAYER),
    })
}

/// The demo story, ready to play.
///
/// # Errors
///
/// Returns an error if any part fails to build.
pub fn story() -> Result<Story> {
    story_from(world()?)
}
