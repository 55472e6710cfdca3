//! The basic actions and their rules.
//!
//! Each action registers its checks as named before rules in the order they
//! should run, so a story can disable one by name or insert its own next to
//! it. Messages are second person.

use fabula_engine::{
    Action, ActionKind, Article, Flow, Interrupt, Phase, Plausibility, Rulebook, TurnContext, abort,
    do_instead, do_instead_quietly, handler, proceed, serial_comma, verifier,
};
use fabula_foundation::{Bindings, Fact, Guard, Pattern, Result, Term, Value, val, var};
use fabula_rules::{Outcome, Placement};

use crate::model::{self, CONTAINER, DOOR, PERSON, ROOM, SUPPORTER};

const ACTOR: &[&str] = &["actor"];
const ACTOR_X: &[&str] = &["actor", "x"];
const ACTOR_X_Y: &[&str] = &["actor", "x", "y"];

/// Reason given when an object is out of sight.
pub const NOT_SEEN: &str = "You can see no such thing.";

/// Registers every basic action kind and its rules.
///
/// # Errors
///
/// Returns an error if an action kind or rule name is already taken.
pub fn define(book: &mut Rulebook) -> Result<()> {
    define_kinds(book)?;
    looking(book)?;
    inventory(book)?;
    examining(book)?;
    taking(book)?;
    dropping(book)?;
    going(book)?;
    entering(book)?;
    exiting(book)?;
    inserting(book)?;
    placing(book)?;
    opening(book)?;
    closing(book)?;
    unlocking(book)?;
    locking(book)?;
    wearing(book)?;
    taking_off(book)?;
    Ok(())
}

fn define_kinds(book: &mut Rulebook) -> Result<()> {
    for kind in [
        ActionKind::new("Looking", ACTOR).with_forms("look", "looking"),
        ActionKind::new("TakingInventory", ACTOR).with_forms("take inventory", "taking inventory"),
        ActionKind::new("Examining", ACTOR_X).with_forms("examine [the $x]", "examining [the $x]"),
        ActionKind::new("Taking", ACTOR_X).with_forms("take [the $x]", "taking [the $x]"),
        ActionKind::new("Dropping", ACTOR_X).with_forms("drop [the $x]", "dropping [the $x]"),
        ActionKind::new("Going", &["actor", "direction"])
            .with_forms("go [$direction]", "going [$direction]")
            .wanting_instance(),
        ActionKind::new("Entering", ACTOR_X).with_forms("enter [the $x]", "entering [the $x]"),
        ActionKind::new("Exiting", ACTOR)
            .with_forms("get out", "getting out")
            .wanting_instance(),
        ActionKind::new("InsertingInto", ACTOR_X_Y)
            .with_forms("put [the $x] into [the $y]", "putting [the $x] into [the $y]"),
        ActionKind::new("PlacingOn", ACTOR_X_Y)
            .with_forms("put [the $x] on [the $y]", "putting [the $x] on [the $y]"),
        ActionKind::new("Opening", ACTOR_X).with_forms("open [the $x]", "opening [the $x]"),
        ActionKind::new("Closing", ACTOR_X).with_forms("close [the $x]", "closing [the $x]"),
        ActionKind::new("UnlockingWith", ACTOR_X_Y)
            .with_forms("unlock [the $x] with [the $y]", "unlocking [the $x] with [the $y]"),
        ActionKind::new("Unlocking", ACTOR_X).with_forms("unlock [the $x]", "unlocking [the $x]"),
        ActionKind::new("LockingWith", ACTOR_X_Y)
            .with_forms("lock [the $x] with [the $y]", "locking [the $x] with [the $y]"),
        ActionKind::new("Locking", ACTOR_X).with_forms("lock [the $x]", "locking [the $x]"),
        ActionKind::new("Wearing", ACTOR_X).with_forms("wear [the $x]", "putting on [the $x]"),
        ActionKind::new("TakingOff", ACTOR_X)
            .with_forms("take off [the $x]", "taking off [the $x]"),
    ] {
        book.define_action(kind)?;
    }
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn roles(cx: &TurnContext<'_>, action: &Action) -> Result<Bindings> {
    Ok(cx.rulebook().action_kind(action.kind())?.bindings(action))
}

/// Renders `template` against the action's roles and writes it.
fn tell(cx: &mut TurnContext<'_>, action: &Action, template: &str) -> Flow {
    let bindings = roles(cx, action)?;
    cx.say(template, &bindings)?;
    proceed()
}

/// Aborts with `template` rendered against the action's roles.
fn refuse(cx: &TurnContext<'_>, action: &Action, template: &str) -> Flow {
    abort(cx.render(template, &roles(cx, action)?)?)
}

fn text_of(value: Value) -> String {
    match value {
        Value::Text(s) => s.to_string(),
        Value::Nil => String::new(),
        other => other.to_string(),
    }
}

fn related(cx: &TurnContext<'_>, relation: &str, a: &Value, b: &Value) -> Result<bool> {
    cx.world().holds(&Fact::new(relation, [a.clone(), b.clone()]))
}

fn x_y() -> [Term; 3] {
    [var("actor"), var("x"), var("y")]
}

fn x_only() -> [Term; 2] {
    [var("actor"), var("x")]
}

fn flag(name: &str, of: &str) -> Guard {
    Guard::holds(Pattern::new(name, [var(of)]))
}

fn kind_is(of: &str, kind: &str) -> Guard {
    Guard::holds(Pattern::new("IsA", [var(of), val(kind)]))
}

fn call(
    cx: &mut TurnContext<'_>,
    activity: &str,
    args: &[Value],
) -> std::result::Result<Value, Interrupt> {
    cx.call_activity(activity, args, &[])
}

/// Moves `x` onto `dest` if it is a supporter, otherwise into it.
fn move_into(
    cx: &mut TurnContext<'_>,
    x: Value,
    dest: Value,
) -> std::result::Result<Value, Interrupt> {
    let activity = if model::is_a(cx.world(), &dest, SUPPORTER)? {
        "put_on"
    } else {
        "put_in"
    };
    call(cx, activity, &[x, dest])
}

/// Silently exits `here`, aborting if the actor is still inside afterwards.
fn climb_out_of(
    cx: &mut TurnContext<'_>,
    actor: &Value,
    here: Value,
) -> std::result::Result<(), Interrupt> {
    let exiting = Action::new("Exiting", [actor.clone()]).with_field("exit_from", here.clone());
    cx.do_first(exiting, true)?;
    if model::location(cx.world(), actor)? == here {
        let stuck = cx.render("You can't leave [the $z].", &Bindings::new().with("z", here))?;
        return Err(Interrupt::Abort(Some(stuck)));
    }
    Ok(())
}

// =============================================================================
// Shared checks
// =============================================================================

/// Illogical unless the role's object is in sight.
fn require_visible(book: &mut Rulebook, kind: &str, role: usize) -> Result<()> {
    book.verify(
        kind,
        verifier(move |cx, action, _| {
            Ok(if cx.is("VisibleTo", [action.arg(role), action.arg(0)])? {
                Outcome::NotHandled
            } else {
                Outcome::Value(Plausibility::illogical(NOT_SEEN))
            })
        })
        .named(&format!("visible_{role}")),
    )
}

/// Illogical unless the role's object is within reach.
fn require_accessible(book: &mut Rulebook, kind: &str, role: usize) -> Result<()> {
    book.verify(
        kind,
        verifier(move |cx, action, _| {
            let (actor, x) = (action.arg(0), action.arg(role));
            if cx.is("AccessibleTo", [x.clone(), actor.clone()])? {
                Ok(Outcome::NotHandled)
            } else if cx.is("VisibleTo", [x, actor])? {
                Ok(Outcome::Value(Plausibility::illogical("You can't get to that.")))
            } else {
                Ok(Outcome::Value(Plausibility::illogical(NOT_SEEN)))
            }
        })
        .named(&format!("accessible_{role}")),
    )
}

/// Prefers objects the actor is not already carrying.
fn hint_not_held(book: &mut Rulebook, kind: &str, role: usize) -> Result<()> {
    book.verify(
        kind,
        verifier(move |cx, action, _| {
            Ok(if related(cx, "Has", &action.arg(0), &action.arg(role))? {
                Outcome::NotHandled
            } else {
                Outcome::Value(Plausibility::VeryLogical)
            })
        })
        .named(&format!("not_held_{role}")),
    )
}

/// Requires the actor to be carrying the role's object. With `try_take`,
/// a silent take is attempted first.
fn require_held(book: &mut Rulebook, kind: &str, role: usize, try_take: bool) -> Result<()> {
    book.verify(
        kind,
        verifier(move |cx, action, _| {
            let (actor, x) = (action.arg(0), action.arg(role));
            if related(cx, "Has", &actor, &x)? {
                Ok(Outcome::Value(Plausibility::VeryLogical))
            } else if cx.is("AccessibleTo", [x, actor])? {
                Ok(Outcome::NotHandled)
            } else {
                Ok(Outcome::Value(Plausibility::illogical(NOT_SEEN)))
            }
        })
        .named(&format!("held_{role}")),
    )?;
    book.before(
        kind,
        handler(move |cx, action, _| {
            let (actor, x) = (action.arg(0), action.arg(role));
            let object = Bindings::new().with("x", x.clone());
            if related(cx, "Wears", &actor, &x)? {
                return abort(cx.render("You're wearing [the $x].", &object)?);
            }
            if try_take && !related(cx, "Has", &actor, &x)? {
                cx.do_first(Action::new("Taking", [actor.clone(), x.clone()]), true)?;
            }
            if related(cx, "Has", &actor, &x)? {
                proceed()
            } else {
                abort(cx.render("You aren't holding [the $x].", &object)?)
            }
        })
        .named(&format!("held_{role}")),
    )
}

// =============================================================================
// Looking, inventory, examining
// =============================================================================

fn looking(book: &mut Rulebook) -> Result<()> {
    book.when(
        "Looking",
        handler(|cx, action, _| {
            call(cx, "describe_current_location", &[action.arg(0)])?;
            proceed()
        })
        .named("describe"),
    )
}

fn inventory(book: &mut Rulebook) -> Result<()> {
    book.when(
        "TakingInventory",
        handler(|cx, action, _| {
            let actor = action.arg(0);
            let items = model::contents(cx.world(), &actor)?;
            if items.is_empty() {
                cx.write("You are carrying nothing.");
            } else {
                cx.write("You are carrying:");
                for x in items {
                    call(cx, "describe_possession", &[actor.clone(), x, Value::Int(1)])?;
                }
            }
            proceed()
        })
        .named("list"),
    )
}

fn examining(book: &mut Rulebook) -> Result<()> {
    require_visible(book, "Examining", 1)?;
    book.when(
        "Examining",
        handler(|cx, action, _| {
            call(cx, "describe_object", &[action.arg(0), action.arg(1)])?;
            proceed()
        })
        .named("describe"),
    )
}

// =============================================================================
// Taking and dropping
// =============================================================================

fn taking(book: &mut Rulebook) -> Result<()> {
    require_accessible(book, "Taking", 1)?;
    hint_not_held(book, "Taking", 1)?;

    book.before(
        "Taking",
        handler(|cx, action, _| {
            if model::contents(cx.world(), &action.arg(0))?.contains(&action.arg(1)) {
                abort("You already have that.")
            } else {
                proceed()
            }
        })
        .named("already_have"),
    )?;
    book.before(
        "Taking",
        handler(|cx, action, _| {
            let owner = cx.get("Owner", [action.arg(1)])?;
            if !owner.is_nil() && owner != action.arg(0) {
                abort("That is not yours to take.")
            } else {
                proceed()
            }
        })
        .named("ownership"),
    )?;
    book.before(
        "Taking",
        handler(|_, _, _| abort("That's fixed in place."))
            .named("fixed_in_place")
            .on(x_only())
            .when(flag("FixedInPlace", "x")),
    )?;
    book.before(
        "Taking",
        handler(|cx, _, b| abort(cx.render("That's part of [the $y].", b)?))
            .named("part_of")
            .on(x_only())
            .when(Guard::holds(Pattern::new("PartOf", [var("x"), var("y")]))),
    )?;
    book.before(
        "Taking",
        handler(|_, _, _| abort("You cannot take yourself."))
            .named("self")
            .on(x_only())
            .when(Guard::equals(var("actor"), var("x"))),
    )?;
    book.before(
        "Taking",
        handler(|cx, action, _| {
            refuse(cx, action, "[The $x] doesn't look like they'd appreciate that.")
        })
            .named("other_person")
            .on(x_only())
            .when(kind_is("x", PERSON)),
    )?;
    book.before(
        "Taking",
        handler(|cx, action, _| {
            let x = action.arg(1);
            if !model::enclosures(cx.world(), &action.arg(0))?.contains(&x) {
                return proceed();
            }
            if model::is_a(cx.world(), &x, SUPPORTER)? {
                refuse(cx, action, "You'd have to get off [the $x] first.")
            } else {
                refuse(cx, action, "You'd have to get out of [the $x] first.")
            }
        })
        .named("not_inside"),
    )?;

    book.when(
        "Taking",
        handler(|cx, action, _| {
            call(cx, "give_to", &[action.arg(1), action.arg(0)])?;
            proceed()
        })
        .named("give"),
    )?;
    book.report(
        "Taking",
        handler(|cx, _, _| {
            cx.write("Taken.");
            proceed()
        })
        .named("taken"),
    )
}

fn dropping(book: &mut Rulebook) -> Result<()> {
    book.before(
        "Dropping",
        handler(|_, _, _| abort("You can't be dropped."))
            .named("self")
            .on(x_only())
            .when(Guard::equals(var("actor"), var("x"))),
    )?;
    require_held(book, "Dropping", 1, false)?;
    book.when(
        "Dropping",
        handler(|cx, action, _| {
            let (actor, x) = (action.arg(0), action.arg(1));
            let floor = model::location(cx.world(), &actor)?;
            move_into(cx, x, floor)?;
            proceed()
        })
        .named("drop"),
    )?;
    book.report(
        "Dropping",
        handler(|cx, _, _| {
            cx.write("Dropped.");
            proceed()
        })
        .named("dropped"),
    )
}

// =============================================================================
// Going
// =============================================================================

fn no_go(cx: &TurnContext<'_>, action: &Action) -> Flow {
    abort(text_of(cx.get("NoGoMessage", [action.field("going_from"), action.arg(1)])?))
}

fn going(book: &mut Rulebook) -> Result<()> {
    book.verify(
        "Going",
        verifier(|cx, action, _| {
            let world = cx.world();
            let here = model::visible_container(world, &model::location(world, &action.arg(0))?)?;
            Ok(if model::exits(world, &here)?.contains(&action.arg(1)) {
                Outcome::Value(Plausibility::VeryLogical)
            } else {
                Outcome::NotHandled
            })
        })
        .named("real_direction"),
    )?;

    book.before(
        "Going",
        handler(|cx, action, _| {
            let (actor, direction) = (action.arg(0), action.arg(1));
            let from = model::visible_container(cx.world(), &model::location(cx.world(), &actor)?)?;
            action.set_field("going_from", from.clone());
            let exits = call(cx, "room_exits", &[from.clone()])?;
            if !exits.into_items().contains(&direction) {
                return no_go(cx, action);
            }
            let Some(via) = cx
                .world()
                .query_values(
                    &Pattern::new("Exit", [val(from.clone()), val(direction), var("to")]),
                    "to",
                )?
                .into_iter()
                .next()
            else {
                return no_go(cx, action);
            };
            action.set_field("going_via", via.clone());
            let to = if model::is_a(cx.world(), &via, DOOR)? {
                call(cx, "door_other_side", &[via, from])?
            } else {
                via
            };
            if to.is_nil() {
                return no_go(cx, action);
            }
            tracing::debug!(actor = %actor, to = %to, "going");
            action.set_field("going_to", to);
            proceed()
        })
        .named("setup"),
    )?;
    book.add(
        "Going",
        Phase::Before,
        handler(|cx, action, _| {
            let via = action.field("going_via");
            let closed = model::is_a(cx.world(), &via, DOOR)?
                && cx.is("Openable", [via.clone()])?
                && !cx.is("IsOpen", [via.clone()])?;
            if closed {
                cx.do_first(Action::new("Opening", [action.arg(0), via.clone()]), true)?;
                if !cx.is("IsOpen", [via])? {
                    return no_go(cx, action);
                }
            }
            proceed()
        })
        .named("check_door"),
        &Placement::after("setup"),
    )?;
    book.add(
        "Going",
        Phase::Before,
        handler(|cx, action, _| {
            let actor = action.arg(0);
            let from = action.field("going_from");
            loop {
                let here = model::location(cx.world(), &actor)?;
                if here == from || here.is_nil() {
                    return proceed();
                }
                climb_out_of(cx, &actor, here)?;
            }
        })
        .named("leave_enterables"),
        &Placement::after("setup"),
    )?;

    book.when(
        "Going",
        handler(|cx, action, _| {
            call(cx, "put_in", &[action.arg(0), action.field("going_to")])?;
            proceed()
        })
        .named("move"),
    )?;
    book.report(
        "Going",
        handler(|cx, action, _| {
            call(cx, "describe_current_location", &[action.arg(0)])?;
            proceed()
        })
        .named("describe"),
    )
}

// =============================================================================
// Entering and exiting
// =============================================================================

fn entering(book: &mut Rulebook) -> Result<()> {
    require_visible(book, "Entering", 1)?;

    book.before(
        "Entering",
        handler(|cx, action, _| {
            let (actor, door) = (action.arg(0), action.arg(1));
            let here = model::visible_container(cx.world(), &model::location(cx.world(), &actor)?)?;
            let direction = cx
                .world()
                .query_values(&Pattern::new("Exit", [val(here), var("d"), val(door)]), "d")?
                .into_iter()
                .next();
            match direction {
                Some(d) => do_instead_quietly(Action::new("Going", [actor, d])),
                None => abort("You can't go that way."),
            }
        })
        .named("door")
        .on(x_only())
        .when(kind_is("x", DOOR)),
    )?;
    book.before(
        "Entering",
        handler(|cx, action, _| {
            let message = cx.get("NoEnterMessage", [action.arg(1), Value::Nil])?;
            abort(text_of(message))
        })
            .named("not_enterable")
            .on(x_only())
            .when(Guard::not(flag("Enterable", "x"))),
    )?;
    book.before(
        "Entering",
        handler(|cx, action, _| {
            if model::enclosures(cx.world(), &action.arg(1))?.contains(&action.arg(0)) {
                abort("You can't enter what you're holding.")
            } else {
                proceed()
            }
        })
        .named("not_possession"),
    )?;
    book.before(
        "Entering",
        handler(|cx, action, _| {
            if model::location(cx.world(), &action.arg(0))? != action.arg(1) {
                proceed()
            } else if model::is_a(cx.world(), &action.arg(1), SUPPORTER)? {
                refuse(cx, action, "You're already on [the $x].")
            } else {
                refuse(cx, action, "You're already in [the $x].")
            }
        })
        .named("already_entered"),
    )?;
    book.before(
        "Entering",
        handler(|cx, action, _| {
            let (actor, x) = (action.arg(0), action.arg(1));
            if model::enclosures(cx.world(), &actor)?.contains(&x) {
                return proceed();
            }
            cx.do_first(Action::new("Opening", [actor, x.clone()]), true)?;
            if cx.is("IsOpen", [x])? {
                proceed()
            } else {
                abort("That needs to be open to be able to enter it.")
            }
        })
        .named("open_first")
        .on(x_only())
        .when(flag("Openable", "x").and(Guard::not(flag("IsOpen", "x")))),
    )?;
    book.before(
        "Entering",
        handler(|cx, action, _| {
            let (actor, x) = (action.arg(0), action.arg(1));
            let target = model::parent_enterable(cx.world(), &x)?;
            let around_x = model::enclosures(cx.world(), &x)?;
            loop {
                let here = model::location(cx.world(), &actor)?;
                if here == target
                    || here.is_nil()
                    || model::is_a(cx.world(), &here, ROOM)?
                    || around_x.contains(&here)
                {
                    break;
                }
                climb_out_of(cx, &actor, here)?;
            }
            let here = model::location(cx.world(), &actor)?;
            if here != target && !target.is_nil() && !model::is_a(cx.world(), &target, ROOM)? {
                cx.do_first(Action::new("Entering", [actor, target]), true)?;
            }
            proceed()
        })
        .named("implicit_moves"),
    )?;

    book.when(
        "Entering",
        handler(|cx, action, _| {
            let (actor, x) = (action.arg(0), action.arg(1));
            move_into(cx, actor, x)?;
            proceed()
        })
        .named("move"),
    )?;
    book.report(
        "Entering",
        handler(|cx, action, _| {
            if model::is_a(cx.world(), &action.arg(1), SUPPORTER)? {
                tell(cx, action, "You get on [the $x].")?;
            } else {
                tell(cx, action, "You get into [the $x].")?;
            }
            let (actor, x) = (action.arg(0), action.arg(1));
            cx.call_activity(
                "describe_location",
                &[actor, x.clone(), x],
                &["heading", "description"],
            )?;
            proceed()
        })
        .named("entered"),
    )
}

fn exiting(book: &mut Rulebook) -> Result<()> {
    book.before(
        "Exiting",
        handler(|cx, action, _| {
            let actor = action.arg(0);
            if action.field("exit_from").is_nil() {
                let here = model::location(cx.world(), &actor)?;
                action.set_field("exit_from", here);
            }
            if model::is_a(cx.world(), &action.field("exit_from"), ROOM)? {
                return do_instead(Action::new("Going", [actor, Value::text("out")]));
            }
            proceed()
        })
        .named("setup"),
    )?;
    book.add(
        "Exiting",
        Phase::Before,
        handler(|cx, action, _| {
            let from = action.field("exit_from");
            let closed = model::is_a(cx.world(), &from, CONTAINER)?
                && cx.is("Openable", [from.clone()])?
                && !cx.is("IsOpen", [from.clone()])?;
            if closed {
                cx.do_first(Action::new("Opening", [action.arg(0), from.clone()]), true)?;
                if !cx.is("IsOpen", [from.clone()])? {
                    return abort(cx.render(
                        "You can't get out of [the $z] because it is closed.",
                        &Bindings::new().with("z", from),
                    )?);
                }
            }
            proceed()
        })
        .named("open_container"),
        &Placement::after("setup"),
    )?;
    book.when(
        "Exiting",
        handler(|cx, action, _| {
            let dest = model::parent_enterable(cx.world(), &action.field("exit_from"))?;
            move_into(cx, action.arg(0), dest)?;
            proceed()
        })
        .named("move"),
    )?;
    book.report(
        "Exiting",
        handler(|cx, action, _| {
            let from = action.field("exit_from");
            let template = if model::is_a(cx.world(), &from, SUPPORTER)? {
                "You get off [the $exit_from]."
            } else {
                "You get out of [the $exit_from]."
            };
            tell(cx, action, template)?;
            call(cx, "describe_current_location", &[action.arg(0)])?;
            proceed()
        })
        .named("exited"),
    )
}

// =============================================================================
// Inserting and placing
// =============================================================================

fn inserting(book: &mut Rulebook) -> Result<()> {
    require_accessible(book, "InsertingInto", 2)?;
    book.before(
        "InsertingInto",
        handler(|cx, action, _| refuse(cx, action, "You can't put [the $x] into itself."))
            .named("not_itself")
            .on(x_y())
            .when(Guard::equals(var("x"), var("y"))),
    )?;
    book.before(
        "InsertingInto",
        handler(|cx, action, _| refuse(cx, action, "You can't put [the $x] into [the $y]."))
            .named("needs_container")
            .on(x_y())
            .when(Guard::not(kind_is("y", CONTAINER))),
    )?;
    require_held(book, "InsertingInto", 1, true)?;
    book.before(
        "InsertingInto",
        handler(|cx, action, _| {
            let y = action.arg(2);
            cx.do_first(Action::new("Opening", [action.arg(0), y.clone()]), false)?;
            if cx.is("IsOpen", [y])? {
                proceed()
            } else {
                refuse(cx, action, "[The $y] is closed.")
            }
        })
        .named("open_container")
        .on(x_y())
        .when(flag("Openable", "y").and(Guard::not(flag("IsOpen", "y")))),
    )?;
    book.when(
        "InsertingInto",
        handler(|cx, action, _| {
            call(cx, "put_in", &[action.arg(1), action.arg(2)])?;
            proceed()
        })
        .named("move"),
    )?;
    book.report(
        "InsertingInto",
        handler(|cx, action, _| tell(cx, action, "You put [the $x] into [the $y]."))
            .named("inserted"),
    )
}

fn placing(book: &mut Rulebook) -> Result<()> {
    require_accessible(book, "PlacingOn", 2)?;
    book.before(
        "PlacingOn",
        handler(|cx, action, _| refuse(cx, action, "You can't place [the $x] on itself."))
            .named("not_itself")
            .on(x_y())
            .when(Guard::equals(var("x"), var("y"))),
    )?;
    book.before(
        "PlacingOn",
        handler(|cx, action, _| refuse(cx, action, "You can't place [the $x] on [the $y]."))
            .named("needs_supporter")
            .on(x_y())
            .when(Guard::not(kind_is("y", SUPPORTER))),
    )?;
    require_held(book, "PlacingOn", 1, true)?;
    book.when(
        "PlacingOn",
        handler(|cx, action, _| {
            call(cx, "put_on", &[action.arg(1), action.arg(2)])?;
            proceed()
        })
        .named("move"),
    )?;
    book.report(
        "PlacingOn",
        handler(|cx, action, _| tell(cx, action, "You place [the $x] on [the $y]."))
            .named("placed"),
    )
}

// =============================================================================
// Opening and closing
// =============================================================================

fn keyed(cx: &TurnContext<'_>, property: &str, x: &Value, key: &str) -> Flow {
    abort(model::message_for(cx.world(), property, x, key)?)
}

fn opening(book: &mut Rulebook) -> Result<()> {
    require_accessible(book, "Opening", 1)?;
    book.verify(
        "Opening",
        verifier(|_, _, _| Ok(Outcome::Value(Plausibility::VeryLogical)))
            .named("openable")
            .on(x_only())
            .when(flag("Openable", "x")),
    )?;
    book.before(
        "Opening",
        handler(|cx, action, _| keyed(cx, "NoOpenMessage", &action.arg(1), "no_open"))
            .named("unopenable")
            .on(x_only())
            .when(Guard::not(flag("Openable", "x"))),
    )?;
    book.before(
        "Opening",
        handler(|cx, action, _| keyed(cx, "NoLockMessage", &action.arg(1), "no_open"))
            .named("locked")
            .on(x_only())
            .when(flag("Lockable", "x").and(flag("IsLocked", "x"))),
    )?;
    book.before(
        "Opening",
        handler(|cx, action, _| keyed(cx, "NoOpenMessage", &action.arg(1), "already_open"))
            .named("already_open")
            .on(x_only())
            .when(flag("IsOpen", "x")),
    )?;
    book.when(
        "Opening",
        handler(|cx, action, _| {
            cx.world_mut().set("IsOpen", [action.arg(1)], true)?;
            proceed()
        })
        .named("open"),
    )?;
    book.report(
        "Opening",
        handler(|cx, action, _| {
            let x = action.arg(1);
            let world = cx.world();
            let opaque = model::is_a(world, &x, CONTAINER)? && world.is("Opaque", [x.clone()])?;
            let revealed = if opaque {
                model::contents(world, &x)?
            } else {
                Vec::new()
            };
            if revealed.is_empty() {
                cx.write("Opened.");
            } else {
                let names = revealed
                    .iter()
                    .map(|v| cx.name(v, Article::Indefinite))
                    .collect::<Result<Vec<_>>>()?;
                let template = format!("Opening [the $x] reveals {}.", serial_comma(&names, "and"));
                tell(cx, action, &template)?;
            }
            proceed()
        })
        .named("opened"),
    )
}

fn closing(book: &mut Rulebook) -> Result<()> {
    require_accessible(book, "Closing", 1)?;
    book.verify(
        "Closing",
        verifier(|_, _, _| Ok(Outcome::Value(Plausibility::VeryLogical)))
            .named("openable")
            .on(x_only())
            .when(flag("Openable", "x")),
    )?;
    book.before(
        "Closing",
        handler(|cx, action, _| keyed(cx, "NoOpenMessage", &action.arg(1), "no_close"))
            .named("unclosable")
            .on(x_only())
            .when(Guard::not(flag("Openable", "x"))),
    )?;
    book.before(
        "Closing",
        handler(|cx, action, _| keyed(cx, "NoOpenMessage", &action.arg(1), "already_closed"))
            .named("already_closed")
            .on(x_only())
            .when(Guard::not(flag("IsOpen", "x"))),
    )?;
    book.when(
        "Closing",
        handler(|cx, action, _| {
            cx.world_mut().set("IsOpen", [action.arg(1)], false)?;
            proceed()
        })
        .named("close"),
    )?;
    book.report(
        "Closing",
        handler(|cx, _, _| {
            cx.write("Closed.");
            proceed()
        })
        .named("closed"),
    )
}

// =============================================================================
// Locks
// =============================================================================

fn wrong_key() -> Guard {
    let key = Pattern::new("KeyOfLock", [var("x")]);
    flag("Lockable", "x").and(Guard::not(Guard::equals(var("y"), key)))
}

fn unlocking(book: &mut Rulebook) -> Result<()> {
    require_accessible(book, "UnlockingWith", 1)?;
    book.before(
        "UnlockingWith",
        handler(|cx, action, _| keyed(cx, "NoLockMessage", &action.arg(1), "no_unlock"))
            .named("no_lock")
            .on(x_y())
            .when(Guard::not(flag("Lockable", "x"))),
    )?;
    book.before(
        "UnlockingWith",
        handler(|cx, action, _| keyed(cx, "NoLockMessage", &action.arg(1), "already_unlocked"))
            .named("already_unlocked")
            .on(x_y())
            .when(Guard::not(flag("IsLocked", "x"))),
    )?;
    book.before(
        "UnlockingWith",
        handler(|cx, action, _| {
            let message = cx.get("WrongKeyMessage", [action.arg(1), action.arg(2)])?;
            abort(text_of(message))
        })
            .named("wrong_key")
            .on(x_y())
            .when(wrong_key()),
    )?;
    require_held(book, "UnlockingWith", 2, true)?;
    book.when(
        "UnlockingWith",
        handler(|cx, action, _| {
            cx.world_mut().set("IsLocked", [action.arg(1)], false)?;
            proceed()
        })
        .named("unlock"),
    )?;
    book.report(
        "UnlockingWith",
        handler(|cx, _, _| {
            cx.write("Unlocked.");
            proceed()
        })
        .named("unlocked"),
    )?;

    require_accessible(book, "Unlocking", 1)?;
    book.before(
        "Unlocking",
        handler(|_, _, _| abort("Unlocking requires a key.")).named("needs_key"),
    )
}

fn locking(book: &mut Rulebook) -> Result<()> {
    require_accessible(book, "LockingWith", 1)?;
    book.before(
        "LockingWith",
        handler(|cx, action, _| keyed(cx, "NoLockMessage", &action.arg(1), "no_lock"))
            .named("no_lock")
            .on(x_y())
            .when(Guard::not(flag("Lockable", "x"))),
    )?;
    book.before(
        "LockingWith",
        handler(|cx, action, _| keyed(cx, "NoLockMessage", &action.arg(1), "already_locked"))
            .named("already_locked")
            .on(x_y())
            .when(flag("IsLocked", "x")),
    )?;
    book.before(
        "LockingWith",
        handler(|cx, action, _| {
            let message = cx.get("WrongKeyMessage", [action.arg(1), action.arg(2)])?;
            abort(text_of(message))
        })
            .named("wrong_key")
            .on(x_y())
            .when(wrong_key()),
    )?;
    require_held(book, "LockingWith", 2, true)?;
    book.when(
        "LockingWith",
        handler(|cx, action, _| {
            cx.world_mut().set("IsLocked", [action.arg(1)], true)?;
            proceed()
        })
        .named("lock"),
    )?;
    book.report(
        "LockingWith",
        handler(|cx, _, _| {
            cx.write("Locked.");
            proceed()
        })
        .named("locked"),
    )?;

    require_accessible(book, "Locking", 1)?;
    book.before(
        "Locking",
        handler(|_, _, _| abort("Locking requires a key.")).named("needs_key"),
    )
}

// =============================================================================
// Clothing
// =============================================================================

fn wearing(book: &mut Rulebook) -> Result<()> {
    book.before(
        "Wearing",
        handler(|cx, action, _| refuse(cx, action, "You can't wear [the $x]."))
            .named("not_wearable")
            .on(x_only())
            .when(Guard::not(flag("Wearable", "x"))),
    )?;
    book.before(
        "Wearing",
        handler(|cx, action, _| refuse(cx, action, "You're already wearing [the $x]."))
            .named("already_worn")
            .on(x_only())
            .when(Guard::holds(Pattern::new("Wears", [var("actor"), var("x")]))),
    )?;
    require_held(book, "Wearing", 1, true)?;
    book.when(
        "Wearing",
        handler(|cx, action, _| {
            call(cx, "make_wear", &[action.arg(0), action.arg(1)])?;
            proceed()
        })
        .named("wear"),
    )?;
    book.report(
        "Wearing",
        handler(|cx, action, _| tell(cx, action, "You are now wearing [the $x].")).named("worn"),
    )
}

fn taking_off(book: &mut Rulebook) -> Result<()> {
    require_accessible(book, "TakingOff", 1)?;
    book.verify(
        "TakingOff",
        verifier(|cx, action, _| {
            Ok(if related(cx, "Wears", &action.arg(0), &action.arg(1))? {
                Outcome::Value(Plausibility::VeryLogical)
            } else {
                Outcome::NotHandled
            })
        })
        .named("worn"),
    )?;
    book.before(
        "TakingOff",
        handler(|cx, action, _| refuse(cx, action, "You aren't wearing [the $x]."))
            .named("not_worn")
            .on(x_only())
            .when(Guard::not(Guard::holds(Pattern::new("Wears", [var("actor"), var("x")])))),
    )?;
    book.when(
        "TakingOff",
        handler(|cx, action, _| {
            call(cx, "give_to", &[action.arg(1), action.arg(0)])?;
            proceed()
        })
        .named("remove"),
    )?;
    book.report(
        "TakingOff",
        handler(|cx, action, _| tell(cx, action, "You take off [the $x].")).named("removed"),
    )
}
