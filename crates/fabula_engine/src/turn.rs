//! The turn context and the four-phase action pipeline.
//!
//! # Running an action
//!
//! [`TurnContext::run_action`] runs verify, before, when, and report in
//! order:
//!
//! 1. Verify folds every matching handler's score by taking the lowest. An
//!    illogical result aborts with its reason.
//! 2. Before may abort, substitute a different action, or run a nested
//!    sub-action through [`TurnContext::do_first`].
//! 3. When mutates the world.
//! 4. Report narrates. It is skipped while a silent do-first is running.
//!
//! A substitution restarts the pipeline on the replacement. Nested do-first
//! calls are bounded by `max_action_depth`, and substitution chains by
//! `max_redirects`.

use std::sync::Arc;

use fabula_foundation::{Bindings, Error, FactSource, Result, SemanticLimit, Value};
use fabula_rules::{Collected, Dispatch, Outcome};
use fabula_storage::World;

use crate::action::Action;
use crate::config::EngineConfig;
use crate::interrupt::Interrupt;
use crate::io::Io;
use crate::narrator::{Article, Narrator};
use crate::plausibility::Plausibility;
use crate::rulebook::{
    ActivityFn, ActorRuleFn, Phase, PhaseFn, Pipeline, Rulebook, Scratch, VerifyFn,
};

/// Everything a handler can reach during one turn.
pub struct TurnContext<'t> {
    world: &'t mut World,
    actor: Value,
    rulebook: Arc<Rulebook>,
    narrator: &'t dyn Narrator,
    io: &'t mut dyn Io,
    config: &'t EngineConfig,
    depth: u32,
    mute: u32,
}

impl<'t> TurnContext<'t> {
    /// Creates a context for one turn.
    pub fn new(
        world: &'t mut World,
        actor: Value,
        rulebook: Arc<Rulebook>,
        narrator: &'t dyn Narrator,
        io: &'t mut dyn Io,
        config: &'t EngineConfig,
    ) -> Self {
        Self {
            world,
            actor,
            rulebook,
            narrator,
            io,
            config,
            depth: 0,
            mute: 0,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The world, read-only.
    #[must_use]
    pub fn world(&self) -> &World {
        &*self.world
    }

    /// The world, for the when phase.
    pub fn world_mut(&mut self) -> &mut World {
        &mut *self.world
    }

    /// The acting object.
    #[must_use]
    pub fn actor(&self) -> &Value {
        &self.actor
    }

    /// The rulebook.
    #[must_use]
    pub fn rulebook(&self) -> &Arc<Rulebook> {
        &self.rulebook
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    /// Current do-first nesting depth.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// True while a silent do-first is running.
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.mute > 0
    }

    /// Shorthand for reading a property.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined or the arity is wrong.
    pub fn get(&self, kind: &str, args: impl IntoIterator<Item = Value>) -> Result<Value> {
        self.world.get(kind, args)
    }

    /// Shorthand for reading a property as a truth value.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined or the arity is wrong.
    pub fn is(&self, kind: &str, args: impl IntoIterator<Item = Value>) -> Result<bool> {
        self.world.is(kind, args)
    }

    // =========================================================================
    // Narration
    // =========================================================================

    /// Writes one line.
    pub fn write(&mut self, text: &str) {
        if !text.is_empty() {
            self.io.write(&[text]);
        }
    }

    /// Writes several fragments as one line.
    pub fn write_fragments(&mut self, fragments: &[&str]) {
        self.io.write(fragments);
    }

    /// Names a value.
    ///
    /// # Errors
    ///
    /// Returns an error if a naming property cannot be read.
    pub fn name(&self, value: &Value, article: Article) -> Result<String> {
        self.narrator.name(self.world(), value, article)
    }

    /// Renders a template against bound objects.
    ///
    /// # Errors
    ///
    /// Returns an error if a naming property cannot be read.
    pub fn render(&self, template: &str, objects: &Bindings) -> Result<String> {
        self.narrator.render(self.world(), template, objects)
    }

    /// Renders a template and writes it.
    ///
    /// # Errors
    ///
    /// Returns an error if a naming property cannot be read.
    pub fn say(&mut self, template: &str, objects: &Bindings) -> Result<()> {
        let text = self.render(template, objects)?;
        self.write(&text);
        Ok(())
    }

    /// The gerund form of an action, e.g. `opening the door`.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined or naming fails.
    pub fn gerund(&self, action: &Action) -> Result<String> {
        let kind = self.rulebook.action_kind(action.kind())?;
        self.render(kind.gerund(), &kind.bindings(action))
    }

    /// The infinitive form of an action, e.g. `open the door`.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined or naming fails.
    pub fn infinitive(&self, action: &Action) -> Result<String> {
        let kind = self.rulebook.action_kind(action.kind())?;
        self.render(kind.infinitive(), &kind.bindings(action))
    }

    fn announce(&mut self, action: &Action, prefix: &str) -> Result<()> {
        if self.is_muted() {
            return Ok(());
        }
        let gerund = self.gerund(action)?;
        self.write(&format!("({prefix}{gerund})"));
        Ok(())
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Scores an action without running it.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined or a handler faults.
    pub fn verify(&self, action: &Action) -> Result<Plausibility> {
        let book = Arc::clone(&self.rulebook);
        let pipeline = book.pipeline(action.kind())?;
        self.verify_with(pipeline, action)
    }

    fn verify_with(&self, pipeline: &Pipeline, action: &Action) -> Result<Plausibility> {
        let mut call = VerifyCall { cx: self, action };
        let score = match pipeline.verify_table().dispatch_all(action.args(), &mut call, &[])? {
            Collected::Stopped(p) => p,
            Collected::Results(scores) => Plausibility::fold(scores),
        };
        tracing::trace!(action = %action, score = %score, "verified");
        Ok(score)
    }

    /// Runs an action through the pipeline, following substitutions.
    ///
    /// With `announce`, the action's gerund is written first, in
    /// parentheses. Substitutions announce themselves unless suppressed.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupt::Abort`] if the action was aborted, and
    /// [`Interrupt::Fault`] for errors and exceeded limits.
    pub fn run_action(
        &mut self,
        action: Action,
        announce: bool,
    ) -> std::result::Result<(), Interrupt> {
        let mut current = action;
        let mut announce = announce;
        let mut redirects = 0;
        loop {
            if announce {
                self.announce(&current, "")?;
            }
            match self.run_pipeline(&mut current) {
                Err(Interrupt::DoInstead {
                    action,
                    suppress_message,
                }) => {
                    redirects += 1;
                    if redirects > self.config.max_redirects {
                        tracing::warn!(
                            action = %action,
                            limit = self.config.max_redirects,
                            "too many redirects"
                        );
                        return Err(Error::limit_exceeded(SemanticLimit::MaxRedirects {
                            limit: self.config.max_redirects,
                            action: Some(action.to_string()),
                        })
                        .into());
                    }
                    tracing::debug!(from = %current, to = %action, "doing instead");
                    current = action;
                    announce = !suppress_message;
                }
                other => return other,
            }
        }
    }

    /// Runs a sub-action to completion before the calling phase resumes.
    ///
    /// A non-silent call announces `(first <gerund>)`. A silent call skips
    /// the sub-action's report phase. An abort inside the sub-action
    /// propagates to the caller.
    ///
    /// # Errors
    ///
    /// Returns the sub-action's abort or fault, or a depth-limit fault.
    pub fn do_first(
        &mut self,
        action: Action,
        silently: bool,
    ) -> std::result::Result<(), Interrupt> {
        if self.depth >= self.config.max_action_depth {
            tracing::warn!(
                action = %action,
                limit = self.config.max_action_depth,
                "do-first too deep"
            );
            return Err(Error::limit_exceeded(SemanticLimit::MaxActionDepth {
                limit: self.config.max_action_depth,
                action: Some(action.to_string()),
            })
            .into());
        }
        if !silently {
            self.announce(&action, "first ")?;
        }
        self.depth += 1;
        if silently {
            self.mute += 1;
        }
        let result = self.run_action(action, false);
        self.depth -= 1;
        if silently {
            self.mute -= 1;
        }
        result
    }

    fn run_pipeline(&mut self, action: &mut Action) -> std::result::Result<(), Interrupt> {
        let book = Arc::clone(&self.rulebook);
        let pipeline = book.pipeline(action.kind())?;
        let kind = pipeline.kind();
        if kind.arity() != action.args().len() {
            let error = Error::arity_mismatch(kind.name(), kind.arity(), action.args().len());
            return Err(error.into());
        }
        tracing::debug!(action = %action, depth = self.depth, "running action");

        let frame = action.to_string();
        let score = self
            .verify_with(pipeline, action)
            .map_err(|e| Interrupt::from(e).in_frame(frame.clone()))?;
        if let Plausibility::Illogical(reason) = score {
            tracing::debug!(action = %action, reason = %reason, "illogical");
            return Err(Interrupt::Abort(Some(reason)));
        }

        for phase in [Phase::Before, Phase::When, Phase::Report] {
            if phase == Phase::Report && self.is_muted() {
                continue;
            }
            self.run_phase(pipeline, phase, action)
                .map_err(|i| i.in_frame(frame.clone()))?;
        }
        Ok(())
    }

    fn run_phase(
        &mut self,
        pipeline: &Pipeline,
        phase: Phase,
        action: &mut Action,
    ) -> std::result::Result<(), Interrupt> {
        let Some(table) = pipeline.table(phase) else {
            return Ok(());
        };
        tracing::trace!(action = %action, phase = %phase, "phase");
        let args = action.args().to_vec();
        if pipeline.kind().wants_instance() {
            let mut call = PhaseCall { cx: self, action };
            table.dispatch_all(&args, &mut call, &[])?;
        } else {
            let mut copy = action.clone();
            let mut call = PhaseCall {
                cx: self,
                action: &mut copy,
            };
            table.dispatch_all(&args, &mut call, &[])?;
        }
        Ok(())
    }

    // =========================================================================
    // Activities and actor rules
    // =========================================================================

    /// Calls a named activity with a fresh scratch.
    ///
    /// # Errors
    ///
    /// Returns an error if the activity is undefined, or whatever a handler
    /// escapes with.
    pub fn call_activity(
        &mut self,
        name: &str,
        args: &[Value],
        disable: &[&str],
    ) -> std::result::Result<Value, Interrupt> {
        self.call_activity_with(name, args, disable, &mut Scratch::new())
    }

    /// Calls a named activity, threading the caller's scratch.
    ///
    /// # Errors
    ///
    /// Returns an error if the activity is undefined, or whatever a handler
    /// escapes with.
    pub fn call_activity_with(
        &mut self,
        name: &str,
        args: &[Value],
        disable: &[&str],
        scratch: &mut Scratch,
    ) -> std::result::Result<Value, Interrupt> {
        let book = Arc::clone(&self.rulebook);
        let table = book.activity_table(name)?;
        tracing::trace!(activity = name, "calling activity");
        let mut call = ActivityCall { cx: self, scratch };
        table.dispatch(args, &mut call, disable)
    }

    /// Calls a named actor rule table. `None` means no rule answered.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is undefined, or whatever a handler
    /// escapes with.
    pub fn call_rule(
        &mut self,
        name: &str,
        args: &[Value],
        disable: &[&str],
    ) -> std::result::Result<Option<Value>, Interrupt> {
        let book = Arc::clone(&self.rulebook);
        let table = book.rule_table(name)?;
        let mut call = RuleCall { cx: self };
        table.dispatch(args, &mut call, disable)
    }
}

// =============================================================================
// Dispatch adapters
// =============================================================================

struct VerifyCall<'a, 't> {
    cx: &'a TurnContext<'t>,
    action: &'a Action,
}

impl Dispatch<VerifyFn> for VerifyCall<'_, '_> {
    type Output = Plausibility;
    type Escape = Error;

    fn facts(&self) -> &dyn FactSource {
        self.cx.world()
    }

    fn invoke(
        &mut self,
        handler: &VerifyFn,
        _args: &[Value],
        bindings: &Bindings,
    ) -> Result<Outcome<Plausibility>> {
        handler(self.cx, self.action, bindings)
    }
}

struct PhaseCall<'a, 't> {
    cx: &'a mut TurnContext<'t>,
    action: &'a mut Action,
}

impl Dispatch<PhaseFn> for PhaseCall<'_, '_> {
    type Output = ();
    type Escape = Interrupt;

    fn facts(&self) -> &dyn FactSource {
        self.cx.world()
    }

    fn invoke(
        &mut self,
        handler: &PhaseFn,
        _args: &[Value],
        bindings: &Bindings,
    ) -> std::result::Result<Outcome<()>, Interrupt> {
        handler(self.cx, self.action, bindings)
    }
}

struct ActivityCall<'a, 't> {
    cx: &'a mut TurnContext<'t>,
    scratch: &'a mut Scratch,
}

impl Dispatch<ActivityFn> for ActivityCall<'_, '_> {
    type Output = Value;
    type Escape = Interrupt;

    fn facts(&self) -> &dyn FactSource {
        self.cx.world()
    }

    fn invoke(
        &mut self,
        handler: &ActivityFn,
        args: &[Value],
        _bindings: &Bindings,
    ) -> std::result::Result<Outcome<Value>, Interrupt> {
        handler(self.cx, args, self.scratch)
    }
}

struct RuleCall<'a, 't> {
    cx: &'a mut TurnContext<'t>,
}

impl Dispatch<ActorRuleFn> for RuleCall<'_, '_> {
    type Output = Value;
    type Escape = Interrupt;

    fn facts(&self) -> &dyn FactSource {
        self.cx.world()
    }

    fn invoke(
        &mut self,
        handler: &ActorRuleFn,
        args: &[Value],
        bindings: &Bindings,
    ) -> std::result::Result<Outcome<Value>, Interrupt> {
        handler(self.cx, args, bindings)
    }
}
