//! The standard world model: kinds, containment, and the computed
//! properties every basic action reads.
//!
//! Objects belong to kinds through `Instance(obj, kind)`; kinds form a tree
//! through `KindOf(kind, parent)`. Containment is four relations, each
//! allowing one holder per object, and an object has at most one holder
//! across all four. Everything spatial (location, visibility, reach) is
//! derived from those facts on read.

use fabula_foundation::{Bindings, Error, Fact, Guard, Pattern, Result, Value, val, var};
use fabula_rules::Outcome;
use fabula_storage::{Cardinality, OnViolation, PropertySchema, RelationSchema, World, computed};

/// The root kind.
pub const THING: &str = "thing";
/// Places the player can be in.
pub const ROOM: &str = "room";
/// Connects two rooms through `Exit` facts.
pub const DOOR: &str = "door";
/// Holds things inside.
pub const CONTAINER: &str = "container";
/// Holds things on top.
pub const SUPPORTER: &str = "supporter";
/// Actors, including the player.
pub const PERSON: &str = "person";

/// The four holding relations, in the order contents are listed.
pub const HOLDERS: [&str; 4] = ["Contains", "Supports", "Has", "Wears"];

// Nesting deeper than this is treated as a cycle.
const MAX_NESTING: usize = 64;

/// Declares the standard properties, relations, kinds, and computed
/// handlers.
///
/// # Errors
///
/// Returns an error if the world is sealed or any name is already taken.
pub fn define(world: &mut World) -> Result<()> {
    define_relations(world)?;
    define_properties(world)?;
    define_kinds(world)?;
    define_computed(world)?;
    Ok(())
}

fn define_relations(world: &mut World) -> Result<()> {
    world.define_relation(
        RelationSchema::new("Instance", 2)
            .with_cardinality(Cardinality::ManyToOne)
            .with_on_violation(OnViolation::Replace),
    )?;
    world.define_relation(
        RelationSchema::new("KindOf", 2).with_cardinality(Cardinality::ManyToOne),
    )?;
    for holder in HOLDERS {
        world.define_relation(
            RelationSchema::new(holder, 2)
                .with_cardinality(Cardinality::OneToMany)
                .with_on_violation(OnViolation::Replace),
        )?;
    }
    world.define_relation(
        RelationSchema::new("PartOf", 2)
            .with_cardinality(Cardinality::ManyToOne)
            .with_on_violation(OnViolation::Replace),
    )?;
    world.define_relation(RelationSchema::new("Exit", 3))?;
    Ok(())
}

fn define_properties(world: &mut World) -> Result<()> {
    for name in ["Name", "DefiniteName", "IndefiniteName", "Description", "KeyOfLock"] {
        world.define_property(PropertySchema::new(name, 1))?;
    }
    world.define_property(PropertySchema::new("Words", 1).with_default(Value::list([])))?;
    for flag in [
        "ProperNamed",
        "Openable",
        "IsOpen",
        "Lockable",
        "IsLocked",
        "FixedInPlace",
        "Scenery",
        "Enterable",
        "Wearable",
        "Opaque",
        "Visited",
    ] {
        world.define_property(PropertySchema::flag(flag, 1))?;
    }
    for name in ["Location", "Contents", "Owner", "VisibleContainer", "ParentEnterable"] {
        world.define_property(PropertySchema::new(name, 1))?;
    }
    for flag in ["IsA", "AccessibleTo", "VisibleTo"] {
        world.define_property(PropertySchema::flag(flag, 2))?;
    }
    for message in [
        "NoGoMessage",
        "NoOpenMessage",
        "NoLockMessage",
        "NoEnterMessage",
        "WrongKeyMessage",
    ] {
        world.define_property(PropertySchema::new(message, 2))?;
    }
    Ok(())
}

fn define_kinds(world: &mut World) -> Result<()> {
    for kind in [ROOM, DOOR, CONTAINER, SUPPORTER, PERSON] {
        world.relate(Fact::new("KindOf", [Value::text(kind), Value::text(THING)]))?;
    }
    Ok(())
}

// =============================================================================
// Queries
// =============================================================================

/// Returns true if `x` is an instance of `kind` or of any descendant kind.
///
/// # Errors
///
/// Returns an error if the model is not defined in this world.
pub fn is_a(world: &World, x: &Value, kind: &str) -> Result<bool> {
    let target = Value::text(kind);
    for direct in world.query_values(&Pattern::new("Instance", [val(x.clone()), var("k")]), "k")? {
        if direct == target || world.path_to("KindOf", &direct, &target)?.is_some() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// The object directly holding `x`, or nil.
///
/// # Errors
///
/// Returns an error if the model is not defined in this world.
pub fn location(world: &World, x: &Value) -> Result<Value> {
    for holder in HOLDERS {
        if let Some(h) = world
            .query_values(&Pattern::new(holder, [var("h"), val(x.clone())]), "h")?
            .into_iter()
            .next()
        {
            return Ok(h);
        }
    }
    Ok(Value::Nil)
}

/// Everything `x` directly holds: contained, supported, carried, then worn.
///
/// # Errors
///
/// Returns an error if the model is not defined in this world.
pub fn contents(world: &World, x: &Value) -> Result<Vec<Value>> {
    let mut items = Vec::new();
    for holder in HOLDERS {
        items.extend(world.query_values(&Pattern::new(holder, [val(x.clone()), var("c")]), "c")?);
    }
    Ok(items)
}

/// Removes every holding fact for `x`, leaving it nowhere.
///
/// # Errors
///
/// Returns an error if the model is not defined in this world.
pub fn detach(world: &mut World, x: &Value) -> Result<()> {
    for holder in HOLDERS {
        for h in world.query_values(&Pattern::new(holder, [var("h"), val(x.clone())]), "h")? {
            world.unrelate(&Fact::new(holder, [h, x.clone()]))?;
        }
    }
    Ok(())
}

/// Returns true for a closed, opaque container.
///
/// # Errors
///
/// Returns an error if the model is not defined in this world.
pub fn hides_contents(world: &World, x: &Value) -> Result<bool> {
    Ok(is_a(world, x, CONTAINER)?
        && world.is("Opaque", [x.clone()])?
        && !world.is("IsOpen", [x.clone()])?)
}

/// A closed container the player cannot reach into.
fn blocks_reach(world: &World, x: &Value) -> Result<bool> {
    Ok(is_a(world, x, CONTAINER)?
        && world.is("Openable", [x.clone()])?
        && !world.is("IsOpen", [x.clone()])?)
}

/// The outermost thing visible from inside `x`: a room, or the first
/// closed opaque container on the way out.
///
/// # Errors
///
/// Returns an error if the model is not defined in this world.
pub fn visible_container(world: &World, x: &Value) -> Result<Value> {
    let mut current = x.clone();
    for _ in 0..MAX_NESTING {
        if current.is_nil() || is_a(world, &current, ROOM)? || hides_contents(world, &current)? {
            return Ok(current);
        }
        current = location(world, &current)?;
    }
    Err(Error::internal(format!("containment of {x} does not terminate")))
}

/// The area `actor` can currently see.
fn actor_horizon(world: &World, actor: &Value) -> Result<Value> {
    visible_container(world, &location(world, actor)?)
}

/// Returns true if `actor` can see `x`.
///
/// # Errors
///
/// Returns an error if the model is not defined in this world.
pub fn visible_to(world: &World, x: &Value, actor: &Value) -> Result<bool> {
    let here = actor_horizon(world, actor)?;
    if here.is_nil() {
        return Ok(false);
    }
    if *x == here {
        return Ok(true);
    }
    if is_a(world, x, DOOR)? {
        return Ok(!world
            .query(&Pattern::new("Exit", [val(here), var("d"), val(x.clone())]), &Bindings::new())?
            .is_empty());
    }
    let holder = location(world, x)?;
    Ok(!holder.is_nil() && visible_container(world, &holder)? == here)
}

/// Returns true if `actor` can both see and touch `x`.
///
/// # Errors
///
/// Returns an error if the model is not defined in this world.
pub fn accessible_to(world: &World, x: &Value, actor: &Value) -> Result<bool> {
    if !visible_to(world, x, actor)? {
        return Ok(false);
    }
    let here = actor_horizon(world, actor)?;
    let mut current = location(world, x)?;
    for _ in 0..MAX_NESTING {
        if current.is_nil() || current == here {
            return Ok(true);
        }
        if blocks_reach(world, &current)? {
            return Ok(false);
        }
        current = location(world, &current)?;
    }
    Ok(false)
}

/// The person carrying or wearing `x`, however deeply nested, or nil.
///
/// # Errors
///
/// Returns an error if the model is not defined in this world.
pub fn owner(world: &World, x: &Value) -> Result<Value> {
    let mut current = x.clone();
    for _ in 0..MAX_NESTING {
        for holder in ["Has", "Wears"] {
            if let Some(p) = world
                .query_values(&Pattern::new(holder, [var("p"), val(current.clone())]), "p")?
                .into_iter()
                .next()
            {
                return Ok(p);
            }
        }
        current = location(world, &current)?;
        if current.is_nil() || is_a(world, &current, ROOM)? {
            break;
        }
    }
    Ok(Value::Nil)
}

/// Everything enclosing `x`, innermost first, stopping below the room.
///
/// # Errors
///
/// Returns an error if the model is not defined in this world.
pub fn enclosures(world: &World, x: &Value) -> Result<Vec<Value>> {
    let mut chain = Vec::new();
    let mut current = location(world, x)?;
    for _ in 0..MAX_NESTING {
        if current.is_nil() || is_a(world, &current, ROOM)? {
            break;
        }
        chain.push(current.clone());
        current = location(world, &current)?;
    }
    Ok(chain)
}

/// The directions leading out of `room`, in authored order.
///
/// # Errors
///
/// Returns an error if the model is not defined in this world.
pub fn exits(world: &World, room: &Value) -> Result<Vec<Value>> {
    world.query_values(&Pattern::new("Exit", [val(room.clone()), var("d"), var("to")]), "d")
}

/// The nearest enclosing room or enterable object above `x`.
///
/// # Errors
///
/// Returns an error if the model is not defined in this world.
pub fn parent_enterable(world: &World, x: &Value) -> Result<Value> {
    let mut current = location(world, x)?;
    for _ in 0..MAX_NESTING {
        if current.is_nil()
            || is_a(world, &current, ROOM)?
            || world.is("Enterable", [current.clone()])?
        {
            return Ok(current);
        }
        current = location(world, &current)?;
    }
    Ok(Value::Nil)
}

// =============================================================================
// Naming
// =============================================================================

fn fallback_name(x: &Value) -> String {
    match x {
        Value::Object(id) => id.as_str().replace('_', " "),
        Value::Text(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn name_of(world: &World, x: &Value) -> Result<String> {
    Ok(match world.get("Name", [x.clone()])? {
        Value::Text(s) => s.to_string(),
        _ => fallback_name(x),
    })
}

fn indefinite_article(name: &str) -> &'static str {
    match name.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

// =============================================================================
// Computed properties
// =============================================================================

fn one(args: &[Value]) -> &Value {
    &args[0]
}

fn define_computed(world: &mut World) -> Result<()> {
    world.compute(
        "Name",
        computed(|_, args, _| Ok(Outcome::Value(Value::from(fallback_name(one(args))))))
            .named("from_id"),
    )?;
    world.compute(
        "DefiniteName",
        computed(|w, args, _| {
            let x = one(args);
            let name = name_of(w, x)?;
            Ok(Outcome::Value(Value::from(if w.is("ProperNamed", [x.clone()])? {
                name
            } else {
                format!("the {name}")
            })))
        })
        .named("from_name"),
    )?;
    world.compute(
        "IndefiniteName",
        computed(|w, args, _| {
            let x = one(args);
            let name = name_of(w, x)?;
            Ok(Outcome::Value(Value::from(if w.is("ProperNamed", [x.clone()])? {
                name
            } else {
                format!("{} {name}", indefinite_article(&name))
            })))
        })
        .named("from_name"),
    )?;
    world.compute(
        "Words",
        computed(|w, args, _| {
            let name = name_of(w, one(args))?.to_lowercase();
            Ok(Outcome::Value(Value::list(name.split_whitespace().map(Value::text))))
        })
        .named("from_name"),
    )?;

    world.compute(
        "Location",
        computed(|w, args, _| location(w, one(args)).map(Outcome::Value)).named("holder"),
    )?;
    world.compute(
        "Contents",
        computed(|w, args, _| contents(w, one(args)).map(|c| Outcome::Value(Value::list(c))))
            .named("held"),
    )?;
    world.compute(
        "Owner",
        computed(|w, args, _| owner(w, one(args)).map(Outcome::Value)).named("carrier"),
    )?;
    world.compute(
        "VisibleContainer",
        computed(|w, args, _| visible_container(w, one(args)).map(Outcome::Value))
            .named("outermost"),
    )?;
    world.compute(
        "ParentEnterable",
        computed(|w, args, _| parent_enterable(w, one(args)).map(Outcome::Value)).named("nearest"),
    )?;
    world.compute(
        "IsA",
        computed(|w, args, _| {
            let kind = args[1].as_text().unwrap_or_default();
            is_a(w, &args[0], kind).map(|b| Outcome::Value(Value::Bool(b)))
        })
        .named("kind_tree"),
    )?;
    world.compute(
        "VisibleTo",
        computed(|w, args, _| {
            visible_to(w, &args[0], &args[1]).map(|b| Outcome::Value(Value::Bool(b)))
        })
        .named("line_of_sight"),
    )?;
    world.compute(
        "AccessibleTo",
        computed(|w, args, _| {
            accessible_to(w, &args[0], &args[1]).map(|b| Outcome::Value(Value::Bool(b)))
        })
        .named("reach"),
    )?;

    // Doors are part of the architecture.
    world.compute(
        "FixedInPlace",
        computed(|_, _, _| Ok(Outcome::Value(Value::Bool(true))))
            .named("doors")
            .on([var("x")])
            .when(Guard::holds(Pattern::new("IsA", [var("x"), val(DOOR)]))),
    )?;

    define_messages(world)
}

fn message(world: &mut World, kind: &str, key: &str, text: &'static str) -> Result<()> {
    world.compute(
        kind,
        computed(move |_, _, _| Ok(Outcome::Value(Value::text(text))))
            .named(key)
            .on([var("x"), val(key)]),
    )
}

/// The message for `kind` when no keyed rule answers.
fn fallback_message(world: &mut World, kind: &str, text: &'static str) -> Result<()> {
    world.compute(
        kind,
        computed(move |_, _, _| Ok(Outcome::Value(Value::text(text)))).named("default"),
    )
}

fn define_messages(world: &mut World) -> Result<()> {
    fallback_message(world, "NoGoMessage", "You can't go that way.")?;
    message(world, "NoOpenMessage", "no_open", "That isn't something you can open.")?;
    message(world, "NoOpenMessage", "already_open", "That's already open.")?;
    message(world, "NoOpenMessage", "no_close", "That isn't something you can close.")?;
    message(world, "NoOpenMessage", "already_closed", "That's already closed.")?;
    message(world, "NoLockMessage", "no_open", "It seems to be locked.")?;
    message(
        world,
        "NoLockMessage",
        "no_unlock",
        "That doesn't seem to be something you can unlock.",
    )?;
    message(world, "NoLockMessage", "no_lock", "That doesn't seem to be something you can lock.")?;
    message(world, "NoLockMessage", "already_unlocked", "That's already unlocked.")?;
    message(world, "NoLockMessage", "already_locked", "That's already locked.")?;
    fallback_message(world, "WrongKeyMessage", "That doesn't fit the lock.")?;
    fallback_message(world, "NoEnterMessage", "That's not something you can enter.")?;
    Ok(())
}

/// Reads a keyed message property, e.g. `NoOpenMessage(door, "locked")`.
///
/// # Errors
///
/// Returns an error if the property is not defined.
pub fn message_for(world: &World, kind: &str, x: &Value, key: &str) -> Result<String> {
    Ok(match world.get(kind, [x.clone(), Value::text(key)])? {
        Value::Text(s) => s.to_string(),
        _ => String::new(),
    })
}
