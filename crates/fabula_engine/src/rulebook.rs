//! The rulebook: every action pipeline plus the named activity and rule
//! tables that handlers call into.
//!
//! A rulebook is assembled during setup and then frozen behind an `Arc`;
//! turns only read it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use fabula_foundation::{Bindings, Error, Result, Value};
use fabula_rules::{Accumulator, Activity, ActivityTable, Outcome, Placement, Rule, RuleTable};

use crate::action::{Action, ActionKind};
use crate::interrupt::{Flow, Interrupt};
use crate::plausibility::Plausibility;
use crate::turn::TurnContext;

// =============================================================================
// Handler types
// =============================================================================

/// Verify handler. Read-only: it sees the turn but cannot change it.
pub type VerifyFn = Arc<
    dyn Fn(&TurnContext<'_>, &Action, &Bindings) -> Result<Outcome<Plausibility>> + Send + Sync,
>;

/// What activity and actor rule handlers return.
pub type HandlerResult = std::result::Result<Outcome<Value>, Interrupt>;

/// Before, when, and report handler.
pub type PhaseFn = Arc<dyn Fn(&mut TurnContext<'_>, &mut Action, &Bindings) -> Flow + Send + Sync>;

/// Activity handler. `Scratch` is shared by every handler of one call.
pub type ActivityFn =
    Arc<dyn Fn(&mut TurnContext<'_>, &[Value], &mut Scratch) -> HandlerResult + Send + Sync>;

/// Named actor rule handler.
pub type ActorRuleFn =
    Arc<dyn Fn(&mut TurnContext<'_>, &[Value], &Bindings) -> HandlerResult + Send + Sync>;

/// Wraps a closure as a verify rule.
pub fn verifier<F>(f: F) -> Rule<VerifyFn>
where
    F: Fn(&TurnContext<'_>, &Action, &Bindings) -> Result<Outcome<Plausibility>>
        + Send
        + Sync
        + 'static,
{
    Rule::new(Arc::new(f) as VerifyFn)
}

/// Wraps a closure as a before, when, or report rule.
pub fn handler<F>(f: F) -> Rule<PhaseFn>
where
    F: Fn(&mut TurnContext<'_>, &mut Action, &Bindings) -> Flow + Send + Sync + 'static,
{
    Rule::new(Arc::new(f) as PhaseFn)
}

/// Wraps a closure as an activity handler.
pub fn activity<F>(f: F) -> Activity<ActivityFn>
where
    F: Fn(&mut TurnContext<'_>, &[Value], &mut Scratch) -> HandlerResult + Send + Sync + 'static,
{
    Activity::new(Arc::new(f) as ActivityFn)
}

/// Wraps a closure as an actor rule.
pub fn actor_rule<F>(f: F) -> Rule<ActorRuleFn>
where
    F: Fn(&mut TurnContext<'_>, &[Value], &Bindings) -> HandlerResult + Send + Sync + 'static,
{
    Rule::new(Arc::new(f) as ActorRuleFn)
}

// =============================================================================
// Scratch
// =============================================================================

/// Per-call accumulator threaded through activity handlers.
///
/// Holds the objects already mentioned while narrating, plus free-form
/// flags. A fresh scratch is made per top-level call; nested calls that
/// should share it use [`TurnContext::call_activity_with`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scratch {
    mentioned: Vec<Value>,
    flags: HashMap<Arc<str>, Value>,
}

impl Scratch {
    /// Creates an empty scratch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a value as mentioned. Returns true if it was not already.
    pub fn mention(&mut self, value: &Value) -> bool {
        if self.mentioned.contains(value) {
            false
        } else {
            self.mentioned.push(value.clone());
            true
        }
    }

    /// Returns true if the value has been mentioned.
    #[must_use]
    pub fn is_mentioned(&self, value: &Value) -> bool {
        self.mentioned.contains(value)
    }

    /// Everything mentioned, in order.
    #[must_use]
    pub fn mentioned(&self) -> &[Value] {
        &self.mentioned
    }

    /// Reads a flag, or nil.
    #[must_use]
    pub fn get(&self, key: &str) -> Value {
        self.flags.get(key).cloned().unwrap_or_default()
    }

    /// Sets a flag.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.flags.insert(Arc::from(key), value.into());
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// The four phases of an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Plausibility scoring.
    Verify,
    /// Preconditions and setup.
    Before,
    /// World mutation.
    When,
    /// Narration.
    Report,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Verify => "verify",
            Self::Before => "before",
            Self::When => "when",
            Self::Report => "report",
        })
    }
}

/// One action kind and its four rule tables.
#[derive(Clone, Debug)]
pub struct Pipeline {
    kind: ActionKind,
    verify: RuleTable<VerifyFn>,
    before: RuleTable<PhaseFn>,
    when: RuleTable<PhaseFn>,
    report: RuleTable<PhaseFn>,
}

impl Pipeline {
    fn new(kind: ActionKind) -> Self {
        let name = kind.name().to_string();
        Self {
            verify: RuleTable::new(&format!("{name}.verify")),
            before: RuleTable::new(&format!("{name}.before")),
            when: RuleTable::new(&format!("{name}.when")),
            report: RuleTable::new(&format!("{name}.report")),
            kind,
        }
    }

    /// The action kind.
    #[must_use]
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// The verify table.
    #[must_use]
    pub fn verify_table(&self) -> &RuleTable<VerifyFn> {
        &self.verify
    }

    /// The table for a mutating phase. `Phase::Verify` has its own table
    /// type; asking for it here yields `None`.
    #[must_use]
    pub fn table(&self, phase: Phase) -> Option<&RuleTable<PhaseFn>> {
        match phase {
            Phase::Verify => None,
            Phase::Before => Some(&self.before),
            Phase::When => Some(&self.when),
            Phase::Report => Some(&self.report),
        }
    }

    fn table_mut(&mut self, phase: Phase) -> Result<&mut RuleTable<PhaseFn>> {
        match phase {
            Phase::Verify => Err(Error::internal("verify rules use the verify table")),
            Phase::Before => Ok(&mut self.before),
            Phase::When => Ok(&mut self.when),
            Phase::Report => Ok(&mut self.report),
        }
    }
}

// =============================================================================
// Rulebook
// =============================================================================

/// Every action pipeline, activity table, and actor rule table.
#[derive(Clone, Debug, Default)]
pub struct Rulebook {
    actions: HashMap<Arc<str>, Pipeline>,
    activities: HashMap<Arc<str>, ActivityTable<ActivityFn>>,
    rules: HashMap<Arc<str>, RuleTable<ActorRuleFn>>,
}

impl Rulebook {
    /// Creates an empty rulebook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    /// Defines an action kind with empty phase tables.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind already exists.
    pub fn define_action(&mut self, kind: ActionKind) -> Result<()> {
        if self.actions.contains_key(kind.name()) {
            return Err(Error::duplicate(format!("action {}", kind.name())));
        }
        self.actions.insert(Arc::from(kind.name()), Pipeline::new(kind));
        Ok(())
    }

    /// Looks up an action's pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is not defined.
    pub fn pipeline(&self, kind: &str) -> Result<&Pipeline> {
        self.actions.get(kind).ok_or_else(|| Error::undefined_action(kind))
    }

    /// Looks up an action kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is not defined.
    pub fn action_kind(&self, kind: &str) -> Result<&ActionKind> {
        self.pipeline(kind).map(Pipeline::kind)
    }

    /// Every defined action kind, in name order.
    #[must_use]
    pub fn action_kinds(&self) -> Vec<&ActionKind> {
        let mut kinds: Vec<_> = self.actions.values().map(Pipeline::kind).collect();
        kinds.sort_by(|a, b| a.name().cmp(b.name()));
        kinds
    }

    fn pipeline_mut(&mut self, kind: &str) -> Result<&mut Pipeline> {
        self.actions
            .get_mut(kind)
            .ok_or_else(|| Error::undefined_action(kind))
    }

    /// Adds a verify rule at the given placement.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined, the name is taken, or the
    /// anchor is unknown.
    pub fn verify_at(
        &mut self,
        kind: &str,
        rule: Rule<VerifyFn>,
        placement: &Placement,
    ) -> Result<()> {
        self.pipeline_mut(kind)?.verify.add(rule, placement)
    }

    /// Appends a verify rule.
    ///
    /// # Errors
    ///
    /// See [`verify_at`](Self::verify_at).
    pub fn verify(&mut self, kind: &str, rule: Rule<VerifyFn>) -> Result<()> {
        self.verify_at(kind, rule, &Placement::Append)
    }

    /// Adds a before, when, or report rule at the given placement.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined, the phase is verify, the
    /// name is taken, or the anchor is unknown.
    pub fn add(
        &mut self,
        kind: &str,
        phase: Phase,
        rule: Rule<PhaseFn>,
        placement: &Placement,
    ) -> Result<()> {
        self.pipeline_mut(kind)?.table_mut(phase)?.add(rule, placement)
    }

    /// Appends a before rule.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub fn before(&mut self, kind: &str, rule: Rule<PhaseFn>) -> Result<()> {
        self.add(kind, Phase::Before, rule, &Placement::Append)
    }

    /// Appends a when rule.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub fn when(&mut self, kind: &str, rule: Rule<PhaseFn>) -> Result<()> {
        self.add(kind, Phase::When, rule, &Placement::Append)
    }

    /// Appends a report rule.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub fn report(&mut self, kind: &str, rule: Rule<PhaseFn>) -> Result<()> {
        self.add(kind, Phase::Report, rule, &Placement::Append)
    }

    // -------------------------------------------------------------------------
    // Activities and actor rules
    // -------------------------------------------------------------------------

    /// Defines an activity with an accumulator.
    ///
    /// # Errors
    ///
    /// Returns an error if the activity already exists.
    pub fn define_activity(&mut self, name: &str, accumulator: Accumulator) -> Result<()> {
        if self.activities.contains_key(name) {
            return Err(Error::duplicate(format!("activity {name}")));
        }
        self.activities
            .insert(Arc::from(name), ActivityTable::new(name).with_accumulator(accumulator));
        Ok(())
    }

    /// Adds an activity handler at the given placement, defining the
    /// activity with the default accumulator if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler's name is taken or the anchor is
    /// unknown.
    pub fn activity_at(
        &mut self,
        name: &str,
        handler: Activity<ActivityFn>,
        placement: &Placement,
    ) -> Result<()> {
        self.activities
            .entry(Arc::from(name))
            .or_insert_with(|| ActivityTable::new(name))
            .add(handler, placement)
    }

    /// Appends an activity handler.
    ///
    /// # Errors
    ///
    /// See [`activity_at`](Self::activity_at).
    pub fn activity(&mut self, name: &str, handler: Activity<ActivityFn>) -> Result<()> {
        self.activity_at(name, handler, &Placement::Append)
    }

    /// Looks up an activity table.
    ///
    /// # Errors
    ///
    /// Returns an error if the activity is not defined.
    pub fn activity_table(&self, name: &str) -> Result<&ActivityTable<ActivityFn>> {
        self.activities
            .get(name)
            .ok_or_else(|| Error::undefined_activity(name))
    }

    /// Adds an actor rule at the given placement, creating the table if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule's name is taken or the anchor is
    /// unknown.
    pub fn rule_at(
        &mut self,
        name: &str,
        rule: Rule<ActorRuleFn>,
        placement: &Placement,
    ) -> Result<()> {
        self.rules
            .entry(Arc::from(name))
            .or_insert_with(|| RuleTable::new(name))
            .add(rule, placement)
    }

    /// Appends an actor rule.
    ///
    /// # Errors
    ///
    /// See [`rule_at`](Self::rule_at).
    pub fn rule(&mut self, name: &str, rule: Rule<ActorRuleFn>) -> Result<()> {
        self.rule_at(name, rule, &Placement::Append)
    }

    /// Looks up an actor rule table.
    ///
    /// # Errors
    ///
    /// Returns an error if no rule table has that name.
    pub fn rule_table(&self, name: &str) -> Result<&RuleTable<ActorRuleFn>> {
        self.rules
            .get(name)
            .ok_or_else(|| Error::undefined_activity(name))
    }
}
