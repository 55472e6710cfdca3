//! Understand-patterns for the basic actions.

use fabula_foundation::{Pattern, Term, var};
use fabula_parser::{Grammar, GrammarError};

const DIRECTIONS: &[(&str, &[&str])] = &[
    ("north", &["n"]),
    ("south", &["s"]),
    ("east", &["e"]),
    ("west", &["w"]),
    ("northeast", &["ne"]),
    ("northwest", &["nw"]),
    ("southeast", &["se"]),
    ("southwest", &["sw"]),
    ("up", &["u"]),
    ("down", &["d"]),
    ("in", &["inside"]),
    ("out", &["outside"]),
];

fn template(kind: &str, roles: &[&str]) -> Pattern {
    Pattern::new(kind, roles.iter().map(|r| var(r)).collect::<Vec<Term>>())
}

/// The grammar for every action in [`crate::actions`].
///
/// # Errors
///
/// Returns an error only if a built-in pattern is malformed.
pub fn standard_grammar() -> Result<Grammar, GrammarError> {
    let mut g = Grammar::new();
    for (name, synonyms) in DIRECTIONS {
        g.direction(name, synonyms);
    }

    let a = &["actor"][..];
    let ax = &["actor", "x"][..];
    let axy = &["actor", "x", "y"][..];

    let table: &[(&str, &str, &[&str])] = &[
        ("look/l", "Looking", a),
        ("inventory/i", "TakingInventory", a),
        ("take inventory", "TakingInventory", a),
        ("examine/x/read [something x]", "Examining", ax),
        ("look at [something x]", "Examining", ax),
        ("take/get [something x]", "Taking", ax),
        ("pick up [something x]", "Taking", ax),
        ("pick [something x] up", "Taking", ax),
        ("drop [something x]", "Dropping", ax),
        ("go [direction direction]", "Going", &["actor", "direction"]),
        ("[direction direction]", "Going", &["actor", "direction"]),
        ("enter [something x]", "Entering", ax),
        ("get/go/sit/stand in/on/into/onto [something x]", "Entering", ax),
        ("exit/leave", "Exiting", a),
        ("get out/off", "Exiting", a),
        ("stand up", "Exiting", a),
        ("put/insert/drop [something x] in/into/inside [something y]", "InsertingInto", axy),
        ("put/place/drop [something x] on/onto [something y]", "PlacingOn", axy),
        ("open [something x]", "Opening", ax),
        ("close/shut [something x]", "Closing", ax),
        ("unlock/open [something x] with [something y]", "UnlockingWith", axy),
        ("unlock [something x]", "Unlocking", ax),
        ("lock/close [something x] with [something y]", "LockingWith", axy),
        ("lock [something x]", "Locking", ax),
        ("wear/don [something x]", "Wearing", ax),
        ("put on [something x]", "Wearing", ax),
        ("put [something x] on", "Wearing", ax),
        ("take off [something x]", "TakingOff", ax),
        ("take [something x] off", "TakingOff", ax),
        ("remove/doff [something x]", "TakingOff", ax),
    ];
    for (pattern, kind, roles) in table {
        g.understand(pattern, template(kind, roles))?;
    }
    Ok(g)
}
