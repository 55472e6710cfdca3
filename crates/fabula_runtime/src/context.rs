//! The turn trampoline.
//!
//! A [`Session`] owns the live world and the I/O sink. Play proceeds by
//! running the current [`Context`], which hands back the next context and
//! whatever it carries forward, until a context ends the session.
//!
//! ```text
//!          ┌────────── Carry::Input / Carry::Action ──────────┐
//!          ▼                                                  │
//!   ┌─────────────┐  Ambiguous(record)   ┌──────────────────┐  │
//!   │   Active    │ ───────────────────▶ │  Disambiguating  │ ─┘
//!   └─────────────┘                      └──────────────────┘
//!          │ end of input                         │ end of input
//!          ▼                                      ▼
//!        None                                   None
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use fabula_engine::{
    Action, Ambiguity, Article, EngineConfig, Interrupt, Io, Narrator, ParseFailure, Parsed,
    Parser, Rulebook, Story, TurnContext, serial_comma,
};
use fabula_foundation::{Bindings, Result, Value};
use fabula_storage::World;

use crate::serialize;

/// Written for a word nobody knows.
#[must_use]
pub fn unknown_word_message(word: &str) -> String {
    format!("I don't know what you mean by '{word}'.")
}

/// Written when every word is known but nothing fits.
pub const NOT_UNDERSTOOD: &str = "Huh?";

/// Written before the questions when several slots are open.
pub const SEVERAL_AMBIGUITIES: &str = "I'm a bit confused by what you meant in a couple of places.";

/// Written when a disambiguation reply still fits several candidates.
pub const UNHELPFUL_REPLY: &str = "That didn't help me out at all.";

// =============================================================================
// Session
// =============================================================================

/// One player's game: the live world, the frozen story parts, and the I/O
/// sink.
pub struct Session<I: Io> {
    world: World,
    rulebook: Arc<Rulebook>,
    parser: Arc<dyn Parser>,
    narrator: Arc<dyn Narrator>,
    actor: Value,
    config: EngineConfig,
    io: I,
}

impl<I: Io> Session<I> {
    /// Starts a session on a story.
    pub fn new(story: Story, io: I) -> Self {
        Self {
            world: story.world,
            rulebook: story.rulebook,
            parser: story.parser,
            narrator: story.narrator,
            actor: story.actor,
            config: EngineConfig::default(),
            io,
        }
    }

    /// Replaces the engine configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// The live world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The configuration in effect.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The I/O sink.
    #[must_use]
    pub fn io(&self) -> &I {
        &self.io
    }

    /// The I/O sink, mutably.
    pub fn io_mut(&mut self) -> &mut I {
        &mut self.io
    }

    /// Ends the session, returning the sink.
    pub fn into_io(self) -> I {
        self.io
    }

    /// Plays until input runs out.
    pub fn play(&mut self) {
        self.play_from(Carry::Nothing);
    }

    /// Plays until input runs out, starting with `carry` (for example an
    /// opening `look`).
    pub fn play_from(&mut self, carry: Carry) {
        drive(self, Context::Active(ActiveTurn), carry);
    }

    fn write(&mut self, text: &str) {
        if !text.is_empty() {
            self.io.write(&[text]);
        }
    }

    /// Saves the live world's snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        serialize::save_to_file(&self.world, path)
    }

    /// Replaces the live world with a saved snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not fit this
    /// story.
    pub fn restore(&mut self, path: &Path) -> Result<()> {
        self.world = serialize::load_from_file(&self.world, path)?;
        Ok(())
    }

    /// Runs an action as one turn.
    ///
    /// Narration is buffered and written only if the turn does not fault.
    /// A fault or panic restores the world as it was before the turn.
    pub fn execute(&mut self, action: Action, announce: bool) {
        let checkpoint = self.world.clone();
        let mut buffer = TurnBuffer::default();
        let rulebook = Arc::clone(&self.rulebook);
        let narrator = Arc::clone(&self.narrator);
        let frame = action.to_string();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut cx = TurnContext::new(
                &mut self.world,
                self.actor.clone(),
                rulebook,
                &*narrator,
                &mut buffer,
                &self.config,
            );
            cx.run_action(action, announce)
        }));
        match outcome {
            Ok(Ok(())) => self.flush(buffer),
            Ok(Err(Interrupt::Abort(message))) => {
                self.flush(buffer);
                if let Some(message) = message {
                    self.write(&message);
                }
            }
            Ok(Err(Interrupt::DoInstead { action, .. })) => {
                tracing::warn!(action = %action, "substitution escaped the pipeline");
                self.flush(buffer);
            }
            Ok(Err(Interrupt::Fault(error))) => {
                tracing::error!(action = %frame, error = %error, "turn faulted; rolling back");
                self.world = checkpoint;
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                tracing::error!(
                    action = %frame,
                    panic = %message,
                    "handler panicked; rolling back"
                );
                self.world = checkpoint;
            }
        }
    }

    fn flush(&mut self, buffer: TurnBuffer) {
        for line in buffer.lines {
            self.io.write(&[&line]);
        }
    }

    fn parse(&mut self, input: &str) -> std::result::Result<Parsed, ParseFailure> {
        let parser = Arc::clone(&self.parser);
        let narrator = Arc::clone(&self.narrator);
        let mut sink = TurnBuffer::default();
        let cx = TurnContext::new(
            &mut self.world,
            self.actor.clone(),
            Arc::clone(&self.rulebook),
            &*narrator,
            &mut sink,
            &self.config,
        );
        parser.handle_all(input, &cx, &|action| cx.verify(action))
    }

    fn resolve_noun(&mut self, input: &str) -> Result<Vec<Value>> {
        let parser = Arc::clone(&self.parser);
        let narrator = Arc::clone(&self.narrator);
        let mut sink = TurnBuffer::default();
        let cx = TurnContext::new(
            &mut self.world,
            self.actor.clone(),
            Arc::clone(&self.rulebook),
            &*narrator,
            &mut sink,
            &self.config,
        );
        Ok(parser
            .run_parser("something", input, &cx)?
            .into_iter()
            .map(|(value, _)| value)
            .collect())
    }
}

impl<I: Io> std::fmt::Debug for Session<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("actor", &self.actor)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Collects one turn's narration until the turn is known not to fault.
#[derive(Default)]
struct TurnBuffer {
    lines: Vec<String>,
}

impl Io for TurnBuffer {
    fn write(&mut self, fragments: &[&str]) {
        self.lines.push(fragments.join(" "));
    }

    fn get_input(&mut self, _prompt: Option<&str>) -> Option<String> {
        None
    }
}

// =============================================================================
// Contexts
// =============================================================================

/// What one context hands to the next.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Carry {
    /// Nothing; read fresh input.
    #[default]
    Nothing,
    /// Input to process instead of reading.
    Input(String),
    /// An already-resolved action to run.
    Action(Action),
}

/// The current mode of the session.
#[derive(Clone, Debug, PartialEq)]
pub enum Context {
    /// Reading and running commands.
    Active(ActiveTurn),
    /// Asking which object was meant.
    Disambiguating(Disambiguation),
}

impl Context {
    /// Runs this context once. `None` ends the session.
    ///
    /// Parsing and disambiguation call story handlers too, so a panic
    /// anywhere in the run restores the world and returns to the command
    /// loop with nothing carried.
    pub fn run<I: Io>(self, session: &mut Session<I>, carry: Carry) -> Option<(Context, Carry)> {
        let checkpoint = session.world.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match self {
            Self::Active(active) => active.run(session, carry),
            Self::Disambiguating(pending) => pending.run(session),
        }));
        outcome.unwrap_or_else(|payload| {
            let message = panic_message(&*payload);
            tracing::error!(panic = %message, "context panicked; rolling back");
            session.world = checkpoint;
            Some((Context::Active(ActiveTurn), Carry::Nothing))
        })
    }
}

/// Runs contexts until one ends the session.
pub fn drive<I: Io>(session: &mut Session<I>, context: Context, carry: Carry) {
    let mut next = Some((context, carry));
    while let Some((context, carry)) = next {
        next = context.run(session, carry);
    }
    tracing::debug!("session ended");
}

/// The ordinary command loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActiveTurn;

impl ActiveTurn {
    fn run<I: Io>(self, session: &mut Session<I>, carry: Carry) -> Option<(Context, Carry)> {
        let input = match carry {
            Carry::Action(action) => {
                session.execute(action, true);
                return Some((Context::Active(self), Carry::Nothing));
            }
            Carry::Input(input) => input,
            Carry::Nothing => {
                let prompt = session.config.prompt.clone();
                session.io.get_input(Some(&prompt))?
            }
        };

        if self.meta_command(session, input.trim()) {
            return Some((Context::Active(self), Carry::Nothing));
        }

        match session.parse(&input) {
            Ok(Parsed { action, disambiguated }) => session.execute(action, disambiguated),
            Err(ParseFailure::NoSuchWord(word)) => session.write(&unknown_word_message(&word)),
            Err(ParseFailure::NoUnderstand) => session.write(NOT_UNDERSTOOD),
            Err(ParseFailure::NoInput) => {}
            Err(ParseFailure::Ambiguous(pending)) => {
                tracing::debug!(pattern = %pending.pattern, open = pending.len(), "disambiguating");
                return Some((
                    Context::Disambiguating(Disambiguation { parent: self, pending }),
                    Carry::Nothing,
                ));
            }
            Err(ParseFailure::Fault(error)) => {
                tracing::error!(input = %input, error = %error, "parse faulted");
            }
        }
        Some((Context::Active(self), Carry::Nothing))
    }

    /// Handles `dump`, `save <path>`, and `restore <path>`. Returns false
    /// for anything else.
    fn meta_command<I: Io>(self, session: &mut Session<I>, input: &str) -> bool {
        if input == session.config.dump_command {
            let dump = session.world.dump();
            session.write(dump.trim_end());
            return true;
        }
        if !session.config.meta_commands {
            return false;
        }
        if let Some(path) = input.strip_prefix("save ") {
            match session.save(Path::new(path.trim())) {
                Ok(()) => session.write("Saved."),
                Err(e) => {
                    tracing::warn!(error = %e, "save failed");
                    session.write(&format!("Save failed: {e}"));
                }
            }
            return true;
        }
        if let Some(path) = input.strip_prefix("restore ") {
            match session.restore(Path::new(path.trim())) {
                Ok(()) => session.write("Restored."),
                Err(e) => {
                    tracing::warn!(error = %e, "restore failed");
                    session.write(&format!("Restore failed: {e}"));
                }
            }
            return true;
        }
        false
    }
}

/// A suspended turn waiting for the player to pick among candidates.
///
/// Each reply is read as a noun phrase and only readings among the
/// candidates count. A reply naming some other object in scope is not
/// bound; it is run as a fresh command instead.
#[derive(Clone, Debug, PartialEq)]
pub struct Disambiguation {
    /// The context to return to.
    pub parent: ActiveTurn,
    /// The pattern and its open variables.
    pub pending: Ambiguity,
}

impl Disambiguation {
    fn run<I: Io>(self, session: &mut Session<I>) -> Option<(Context, Carry)> {
        let parent = Context::Active(self.parent);
        if self.pending.len() > 1 {
            session.write(SEVERAL_AMBIGUITIES);
        }

        let mut bindings = Bindings::new();
        for (var, candidates) in &self.pending.options {
            let names = match candidates
                .iter()
                .map(|c| session.narrator.name(&session.world, c, Article::Definite))
                .collect::<Result<Vec<_>>>()
            {
                Ok(names) => names,
                Err(error) => {
                    tracing::error!(error = %error, "naming candidates failed");
                    return Some((parent, Carry::Nothing));
                }
            };
            session.write(&format!("Did you mean {}?", serial_comma(&names, "or")));

            let prompt = session.config.disambiguation_prompt.clone();
            let reply = session.io.get_input(Some(&prompt))?;
            let readings = match session.resolve_noun(&reply) {
                Ok(readings) => readings,
                Err(error) => {
                    tracing::error!(error = %error, "resolving reply failed");
                    return Some((parent, Carry::Nothing));
                }
            };
            let mut matches: Vec<Value> = Vec::new();
            for value in readings {
                if candidates.contains(&value) && !matches.contains(&value) {
                    matches.push(value);
                }
            }
            match matches.as_slice() {
                [] => {
                    tracing::debug!(reply = %reply, "reply is a new command");
                    return Some((parent, Carry::Input(reply)));
                }
                [chosen] => {
                    tracing::debug!(var = %var, chosen = %chosen, "disambiguated");
                    bindings.set(var.clone(), chosen.clone());
                }
                _ => {
                    session.write(UNHELPFUL_REPLY);
                    return Some((parent, Carry::Nothing));
                }
            }
        }

        match self.pending.pattern.ground(&bindings) {
            Some(fact) => Some((parent, Carry::Action(Action::from(fact)))),
            None => {
                tracing::error!(pattern = %self.pending.pattern, "ambiguity left a variable open");
                Some((parent, Carry::Nothing))
            }
        }
    }
}
