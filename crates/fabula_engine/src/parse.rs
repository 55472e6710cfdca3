//! The parser contract.
//!
//! The engine does not parse. It consumes whatever implements [`Parser`] and
//! reacts to the outcome: run the action, narrate a failure, or suspend the
//! turn for disambiguation.

use std::sync::Arc;

use fabula_foundation::{Error, Pattern, Result, Value};
use thiserror::Error;

use crate::action::Action;
use crate::plausibility::Plausibility;
use crate::turn::TurnContext;

/// Verify callback handed to [`Parser::handle_all`] for ranking parses.
pub type Verifier<'a> = &'a dyn Fn(&Action) -> Result<Plausibility>;

/// A successfully parsed command.
#[derive(Clone, Debug, PartialEq)]
pub struct Parsed {
    /// The resolved action.
    pub action: Action,
    /// True when ranking discarded alternatives, so the choice should be
    /// announced.
    pub disambiguated: bool,
}

/// An input that matched, but with some variables left open.
#[derive(Clone, Debug, PartialEq)]
pub struct Ambiguity {
    /// The action pattern, with a variable for each open slot.
    pub pattern: Pattern,
    /// For each open variable, its candidates in order.
    pub options: Vec<(Arc<str>, Vec<Value>)>,
}

impl Ambiguity {
    /// Number of variables still open.
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Returns true if nothing is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Why an input did not yield an action.
#[derive(Debug, Error)]
pub enum ParseFailure {
    /// A word neither the grammar nor any object knows.
    #[error("unknown word: {0}")]
    NoSuchWord(String),

    /// Every word is known, but no pattern fits.
    #[error("input not understood")]
    NoUnderstand,

    /// Nothing was typed.
    #[error("no input")]
    NoInput,

    /// Several objects fit a slot equally well.
    #[error("ambiguous input")]
    Ambiguous(Ambiguity),

    /// Reading the world failed while parsing.
    #[error(transparent)]
    Fault(#[from] Error),
}

/// Turns text into actions.
pub trait Parser: Send + Sync {
    /// Parses a full command.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseFailure`] describing why no single action resulted.
    fn handle_all(
        &self,
        input: &str,
        cx: &TurnContext<'_>,
        verify: Verifier<'_>,
    ) -> std::result::Result<Parsed, ParseFailure>;

    /// Runs one grammar goal, such as `"something"`, over the whole input
    /// and returns each reading with a score.
    ///
    /// # Errors
    ///
    /// Returns an error if the world cannot be read.
    fn run_parser(
        &self,
        goal: &str,
        input: &str,
        cx: &TurnContext<'_>,
    ) -> Result<Vec<(Value, i64)>>;
}
