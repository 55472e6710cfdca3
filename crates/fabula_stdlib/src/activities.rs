//! Standard activities.
//!
//! World activities move things around and answer map questions; actor
//! activities narrate what an actor perceives. All of them are ordinary
//! activity tables, so a story can add handlers, insert before or after
//! the named ones here, or disable them per call.

use fabula_engine::{Article, Interrupt, Rulebook, TurnContext, activity, serial_comma};
use fabula_foundation::{Bindings, Error, Fact, Pattern, Result, Value, val, var};
use fabula_rules::{Accumulator, Outcome};

use crate::model::{self, CONTAINER, DOOR, PERSON, ROOM, SUPPORTER};
use crate::narrator::capitalize;

type Answer = std::result::Result<Outcome<Value>, Interrupt>;

fn arg(args: &[Value], index: usize) -> std::result::Result<Value, Interrupt> {
    args.get(index)
        .cloned()
        .ok_or_else(|| {
            Error::internal(format!("activity expected at least {} arguments", index + 1)).into()
        })
}

fn done() -> Answer {
    Ok(Outcome::Value(Value::Nil))
}

fn bound(var: &str, value: &Value) -> Bindings {
    Bindings::new().with(var, value.clone())
}

/// Registers every standard activity.
///
/// # Errors
///
/// Returns an error if any activity name is already taken.
pub fn define(book: &mut Rulebook) -> Result<()> {
    define_world(book)?;
    define_description(book)?;
    Ok(())
}

// =============================================================================
// World activities
// =============================================================================

/// Moves `x` under `holder` through `relation`, dropping its old holder.
fn transfer(cx: &mut TurnContext<'_>, relation: &str, holder: &Value, x: &Value) -> Result<()> {
    tracing::debug!(relation, holder = %holder, object = %x, "transfer");
    let world = cx.world_mut();
    model::detach(world, x)?;
    world.relate(Fact::new(relation, [holder.clone(), x.clone()]))?;
    Ok(())
}

fn define_world(book: &mut Rulebook) -> Result<()> {
    for (name, relation, holder_first) in [
        ("give_to", "Has", false),
        ("put_in", "Contains", false),
        ("put_on", "Supports", false),
        ("make_wear", "Wears", true),
    ] {
        book.define_activity(name, Accumulator::FirstNonEmpty)?;
        book.activity(
            name,
            activity(move |cx, args, _| {
                let (a, b) = (arg(args, 0)?, arg(args, 1)?);
                let (holder, x) = if holder_first { (a, b) } else { (b, a) };
                transfer(cx, relation, &holder, &x)?;
                done()
            })
            .named("transfer"),
        )?;
    }

    book.define_activity("room_exits", Accumulator::ListAppend)?;
    book.activity(
        "room_exits",
        activity(|cx, args, _| {
            let directions = model::exits(cx.world(), &arg(args, 0)?)?;
            Ok(Outcome::Value(Value::list(directions)))
        })
        .named("exit_facts"),
    )?;

    book.define_activity("door_other_side", Accumulator::FirstNonEmpty)?;
    book.activity(
        "door_other_side",
        activity(|cx, args, _| {
            let (door, room) = (arg(args, 0)?, arg(args, 1)?);
            let rooms = cx
                .world()
                .query_values(&Pattern::new("Exit", [var("r"), var("d"), val(door)]), "r")?;
            Ok(Outcome::Value(rooms.into_iter().find(|r| *r != room).unwrap_or_default()))
        })
        .named("exits"),
    )?;
    Ok(())
}

// =============================================================================
// Description
// =============================================================================

/// Returns true if `x` should be listed when `actor` looks around.
///
/// # Errors
///
/// Whatever the `notable_objects` handlers escape with.
pub fn is_notable(
    cx: &mut TurnContext<'_>,
    actor: &Value,
    x: &Value,
) -> std::result::Result<bool, Interrupt> {
    Ok(!cx
        .call_activity("notable_objects", &[actor.clone(), x.clone()], &[])?
        .is_blank())
}

/// `a box (which is closed)`
fn terse_name(cx: &TurnContext<'_>, x: &Value) -> Result<String> {
    let mut name = cx.name(x, Article::Indefinite)?;
    let world = cx.world();
    if model::is_a(world, x, CONTAINER)?
        && world.is("Openable", [x.clone()])?
        && !world.is("IsOpen", [x.clone()])?
    {
        name.push_str(" (which is closed)");
    }
    Ok(name)
}

fn listing(cx: &TurnContext<'_>, items: &[Value]) -> Result<String> {
    let names = items.iter().map(|x| terse_name(cx, x)).collect::<Result<Vec<_>>>()?;
    Ok(serial_comma(&names, "and"))
}

fn is_or_are(items: &[Value]) -> &'static str {
    if items.len() == 1 { "is" } else { "are" }
}

fn define_description(book: &mut Rulebook) -> Result<()> {
    book.define_activity("describe_current_location", Accumulator::FirstNonEmpty)?;
    book.activity(
        "describe_current_location",
        activity(|cx, args, _| {
            let actor = arg(args, 0)?;
            let loc = model::location(cx.world(), &actor)?;
            let horizon = model::visible_container(cx.world(), &loc)?;
            if horizon.is_nil() {
                cx.write("You are nowhere at all.");
                return done();
            }
            cx.call_activity("describe_location", &[actor, loc, horizon], &[])?;
            done()
        })
        .named("look"),
    )?;

    define_describe_location(book)?;
    define_describe_contents(book)?;
    define_notable(book)?;
    define_describe_object(book)?;
    define_describe_possession(book)
}

/// `describe_location(actor, location, horizon)`
fn define_describe_location(book: &mut Rulebook) -> Result<()> {
    book.define_activity("describe_location", Accumulator::FirstNonEmpty)?;
    book.activity(
        "describe_location",
        activity(|cx, args, scratch| {
            let (actor, loc, horizon) = (arg(args, 0)?, arg(args, 1)?, arg(args, 2)?);
            let mut heading = if model::is_a(cx.world(), &horizon, ROOM)? {
                capitalize(&cx.name(&horizon, Article::Bare)?)
            } else {
                cx.name(&horizon, Article::DefiniteCapitalized)?
            };
            if loc != horizon {
                let preposition = if model::is_a(cx.world(), &loc, SUPPORTER)? {
                    "on"
                } else {
                    "in"
                };
                let holder = cx.name(&loc, Article::Definite)?;
                heading.push_str(&format!(" ({preposition} {holder})"));
            }
            scratch.mention(&actor);
            cx.write(&heading);
            done()
        })
        .named("heading"),
    )?;
    book.activity(
        "describe_location",
        activity(|cx, args, _| {
            let horizon = arg(args, 2)?;
            if model::is_a(cx.world(), &horizon, ROOM)? {
                if let Value::Text(text) = cx.get("Description", [horizon])? {
                    cx.write(&text);
                }
            }
            done()
        })
        .named("description"),
    )?;
    book.activity(
        "describe_location",
        activity(|cx, args, scratch| {
            let (actor, horizon) = (arg(args, 0)?, arg(args, 2)?);
            cx.call_activity_with("describe_contents", &[actor, horizon], &[], scratch)?;
            done()
        })
        .named("objects"),
    )?;
    book.activity(
        "describe_location",
        activity(|cx, args, _| {
            let horizon = arg(args, 2)?;
            if model::is_a(cx.world(), &horizon, ROOM)? {
                cx.world_mut().set("Visited", [horizon], true)?;
            }
            done()
        })
        .named("visited"),
    )
}

/// `describe_contents(actor, holder)`, sharing the caller's mentioned set.
fn define_describe_contents(book: &mut Rulebook) -> Result<()> {
    book.define_activity("describe_contents", Accumulator::FirstNonEmpty)?;
    book.activity(
        "describe_contents",
        activity(|cx, args, scratch| {
            let (actor, holder) = (arg(args, 0)?, arg(args, 1)?);
            if model::is_a(cx.world(), &holder, PERSON)? {
                return done();
            }
            let mut items = Vec::new();
            for x in model::contents(cx.world(), &holder)? {
                if !scratch.is_mentioned(&x) && is_notable(cx, &actor, &x)? {
                    items.push(x);
                }
            }
            if items.is_empty() {
                return done();
            }
            let world = cx.world();
            let prefix = if model::is_a(world, &holder, ROOM)? {
                if scratch.get("listed").is_truthy() {
                    "You also see".to_string()
                } else {
                    "You see".to_string()
                }
            } else if model::is_a(world, &holder, SUPPORTER)? {
                format!("On {} you see", cx.name(&holder, Article::Definite)?)
            } else {
                format!("In {} you see", cx.name(&holder, Article::Definite)?)
            };
            let line = format!("{prefix} {}.", listing(cx, &items)?);
            cx.write(&line);
            for x in &items {
                scratch.mention(x);
            }
            scratch.set("listed", true);
            done()
        })
        .named("listing"),
    )?;
    book.activity(
        "describe_contents",
        activity(|cx, args, scratch| {
            let (actor, holder) = (arg(args, 0)?, arg(args, 1)?);
            for x in model::contents(cx.world(), &holder)? {
                let world = cx.world();
                if x == actor || model::is_a(world, &x, PERSON)? {
                    continue;
                }
                let see_inside = model::is_a(world, &x, SUPPORTER)?
                    || (model::is_a(world, &x, CONTAINER)? && !model::hides_contents(world, &x)?);
                if see_inside {
                    cx.call_activity_with("describe_contents", &[actor.clone(), x], &[], scratch)?;
                }
            }
            done()
        })
        .named("nested"),
    )
}

/// `notable_objects(actor, x)`: `[x]` when worth listing, empty otherwise.
fn define_notable(book: &mut Rulebook) -> Result<()> {
    book.define_activity("notable_objects", Accumulator::ListAppend)?;
    book.activity(
        "notable_objects",
        activity(|cx, args, _| {
            let x = arg(args, 1)?;
            if cx.is("Scenery", [x])? {
                Ok(Outcome::Handled(Value::list([])))
            } else {
                Ok(Outcome::NotHandled)
            }
        })
        .named("scenery"),
    )?;
    book.activity(
        "notable_objects",
        activity(|_, args, _| {
            if arg(args, 0)? == arg(args, 1)? {
                Ok(Outcome::Handled(Value::list([])))
            } else {
                Ok(Outcome::NotHandled)
            }
        })
        .named("actor"),
    )?;
    book.activity(
        "notable_objects",
        activity(|cx, args, _| {
            if model::is_a(cx.world(), &arg(args, 1)?, DOOR)? {
                Ok(Outcome::Handled(Value::list([])))
            } else {
                Ok(Outcome::NotHandled)
            }
        })
        .named("doors"),
    )?;
    book.activity(
        "notable_objects",
        activity(|_, args, _| Ok(Outcome::Value(Value::list([arg(args, 1)?])))).named("things"),
    )
}

/// `describe_object(actor, x)`, the examine text.
fn define_describe_object(book: &mut Rulebook) -> Result<()> {
    book.define_activity("describe_object", Accumulator::FirstNonEmpty)?;
    book.activity(
        "describe_object",
        activity(|cx, args, scratch| {
            if let Value::Text(text) = cx.get("Description", [arg(args, 1)?])? {
                if !text.is_empty() {
                    cx.write(&text);
                    scratch.set("described", true);
                }
            }
            done()
        })
        .named("description"),
    )?;
    book.activity(
        "describe_object",
        activity(|cx, args, scratch| {
            let x = arg(args, 1)?;
            let world = cx.world();
            if !model::is_a(world, &x, CONTAINER)? {
                return done();
            }
            let template = if model::hides_contents(world, &x)? {
                "[The $x] is closed.".to_string()
            } else {
                let items = model::contents(world, &x)?;
                if items.is_empty() {
                    "[The $x] is empty.".to_string()
                } else {
                    format!("In [the $x] {} {}.", is_or_are(&items), listing(cx, &items)?)
                }
            };
            cx.say(&template, &bound("x", &x))?;
            scratch.set("described", true);
            done()
        })
        .named("container"),
    )?;
    book.activity(
        "describe_object",
        activity(|cx, args, scratch| {
            let x = arg(args, 1)?;
            if !model::is_a(cx.world(), &x, SUPPORTER)? {
                return done();
            }
            let items = model::contents(cx.world(), &x)?;
            if !items.is_empty() {
                let template =
                    format!("On [the $x] {} {}.", is_or_are(&items), listing(cx, &items)?);
                cx.say(&template, &bound("x", &x))?;
                scratch.set("described", true);
            }
            done()
        })
        .named("supporter"),
    )?;
    book.activity(
        "describe_object",
        activity(|cx, args, scratch| {
            let x = arg(args, 1)?;
            if model::is_a(cx.world(), &x, DOOR)? {
                let template = if cx.is("IsOpen", [x.clone()])? {
                    "[The $x] is open."
                } else {
                    "[The $x] is closed."
                };
                cx.say(template, &bound("x", &x))?;
                scratch.set("described", true);
            }
            done()
        })
        .named("door"),
    )?;
    book.activity(
        "describe_object",
        activity(|cx, args, scratch| {
            if !scratch.get("described").is_truthy() {
                cx.say("You see nothing special about [the $x].", &bound("x", &arg(args, 1)?))?;
            }
            done()
        })
        .named("nothing_special"),
    )
}

/// `describe_possession(actor, x, depth)`, one inventory line per object.
fn define_describe_possession(book: &mut Rulebook) -> Result<()> {
    book.define_activity("describe_possession", Accumulator::FirstNonEmpty)?;
    book.activity(
        "describe_possession",
        activity(|cx, args, _| {
            let (actor, x) = (arg(args, 0)?, arg(args, 1)?);
            let depth = arg(args, 2)?.as_int().unwrap_or(1);
            let mut line = "  ".repeat(usize::try_from(depth).unwrap_or(1));
            line.push_str(&terse_name(cx, &x)?);
            if cx.world().holds(&Fact::new("Wears", [actor.clone(), x.clone()]))? {
                line.push_str(" (being worn)");
            }
            cx.write(&line);
            let world = cx.world();
            let see_inside = model::is_a(world, &x, SUPPORTER)?
                || (model::is_a(world, &x, CONTAINER)? && !model::hides_contents(world, &x)?);
            if see_inside {
                for inner in model::contents(world, &x)? {
                    let args = [actor.clone(), inner, Value::Int(depth + 1)];
                    cx.call_activity("describe_possession", &args, &[])?;
                }
            }
            done()
        })
        .named("line"),
    )
}
