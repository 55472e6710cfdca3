//! Rule tables: guarded, ordered, multi-handler dispatch.
//!
//! Handlers are tried in stored order. A handler applies when its argument
//! pattern unifies with the call's arguments and its guard holds against the
//! current facts. The answer is the last recorded value, so content
//! registers specific overrides after generic defaults; insertion order is
//! the only tie-break.

use std::fmt;
use std::sync::Arc;

use fabula_foundation::{Bindings, Error, FactSource, Guard, Result, Term, Value, unify_args};

use crate::outcome::{Collected, Outcome};
use crate::placement::{Named, Placement, place};

// =============================================================================
// Dispatch
// =============================================================================

/// The caller side of a dispatch: where facts come from and how to call a
/// handler of type `H`.
///
/// Keeping invocation on the caller lets each table choose its own handler
/// signature (read-only for verify, mutable for the other phases, world-only
/// for computed properties) while sharing one dispatch loop.
pub trait Dispatch<H: ?Sized> {
    /// What handlers produce.
    type Output;
    /// Escapes that abandon the whole dispatch.
    type Escape: From<Error>;

    /// Facts for guard evaluation.
    fn facts(&self) -> &dyn FactSource;

    /// Calls one handler.
    ///
    /// # Errors
    ///
    /// Returns an escape to abandon the dispatch; it propagates unchanged.
    fn invoke(
        &mut self,
        handler: &H,
        args: &[Value],
        bindings: &Bindings,
    ) -> std::result::Result<Outcome<Self::Output>, Self::Escape>;
}

// =============================================================================
// Rule
// =============================================================================

/// One handler record in a [`RuleTable`].
#[derive(Clone)]
pub struct Rule<H> {
    /// Name used by disable-lists and insertion anchors.
    pub name: Option<Arc<str>>,
    /// Argument pattern; `None` applies to any arguments.
    pub args: Option<Vec<Term>>,
    /// Condition over facts, evaluated after the argument pattern binds.
    pub guard: Guard,
    /// The handler itself.
    pub handler: H,
}

impl<H> Rule<H> {
    /// Creates an unnamed rule that applies to every call.
    #[must_use]
    pub fn new(handler: H) -> Self {
        Self {
            name: None,
            args: None,
            guard: Guard::Always,
            handler,
        }
    }

    /// Sets the name.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(Arc::from(name));
        self
    }

    /// Sets the argument pattern.
    #[must_use]
    pub fn on(mut self, args: impl IntoIterator<Item = Term>) -> Self {
        self.args = Some(args.into_iter().collect());
        self
    }

    /// Adds a guard condition (conjoined with any existing one).
    #[must_use]
    pub fn when(mut self, guard: Guard) -> Self {
        self.guard = std::mem::take(&mut self.guard).and(guard);
        self
    }

    /// Returns the bindings under which this rule applies, if it does.
    ///
    /// # Errors
    ///
    /// Returns an error if the guard reads an undefined kind.
    pub fn applies(&self, facts: &dyn FactSource, args: &[Value]) -> Result<Option<Bindings>> {
        let seeded = match &self.args {
            Some(terms) => match unify_args(terms, args, &Bindings::new()) {
                Some(b) => b,
                None => return Ok(None),
            },
            None => Bindings::new(),
        };
        self.guard.first_solution(facts, &seeded)
    }
}

impl<H> Named for Rule<H> {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl<H> fmt::Debug for Rule<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// RuleTable
// =============================================================================

/// Guarded, ordered, multi-handler dispatch.
#[derive(Clone)]
pub struct RuleTable<H> {
    name: Arc<str>,
    rules: Vec<Rule<H>>,
}

impl<H> RuleTable<H> {
    /// Creates an empty table. The name appears in logs and errors.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            rules: Vec::new(),
        }
    }

    /// The table's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a rule at the given placement.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule's name is taken or the anchor is unknown.
    pub fn add(&mut self, rule: Rule<H>, placement: &Placement) -> Result<()> {
        place(&self.name, &mut self.rules, rule, placement)
    }

    /// Adds a rule after all existing ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule's name is taken.
    pub fn append(&mut self, rule: Rule<H>) -> Result<()> {
        self.add(rule, &Placement::Append)
    }

    /// Adds a rule immediately after the named anchor.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule's name is taken or the anchor is unknown.
    pub fn insert_after(&mut self, anchor: &str, rule: Rule<H>) -> Result<()> {
        self.add(rule, &Placement::after(anchor))
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the table has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule names in dispatch order (unnamed rules are skipped).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().filter_map(|r| r.name.as_deref())
    }

    /// Runs every applicable, non-disabled rule and collects what they
    /// recorded.
    ///
    /// # Errors
    ///
    /// Propagates the first escape a handler returns, and guard errors
    /// converted into the escape type.
    pub fn dispatch_all<D>(
        &self,
        args: &[Value],
        cx: &mut D,
        disable: &[&str],
    ) -> std::result::Result<Collected<D::Output>, D::Escape>
    where
        D: Dispatch<H>,
    {
        let mut results = Vec::new();
        for rule in &self.rules {
            if is_disabled(rule.name.as_deref(), disable) {
                continue;
            }
            let Some(bindings) = rule.applies(cx.facts(), args)? else {
                continue;
            };
            tracing::trace!(
                table = %self.name,
                rule = rule.name.as_deref().unwrap_or("<anonymous>"),
                "rule applies"
            );
            match cx.invoke(&rule.handler, args, &bindings)? {
                Outcome::Value(v) => results.push(v),
                Outcome::NotHandled => {}
                Outcome::Handled(v) => return Ok(Collected::Stopped(v)),
            }
        }
        Ok(Collected::Results(results))
    }

    /// Dispatches and returns the last recorded result.
    ///
    /// `None` means no rule answered.
    ///
    /// # Errors
    ///
    /// Propagates handler escapes and guard errors.
    pub fn dispatch<D>(
        &self,
        args: &[Value],
        cx: &mut D,
        disable: &[&str],
    ) -> std::result::Result<Option<D::Output>, D::Escape>
    where
        D: Dispatch<H>,
    {
        Ok(self.dispatch_all(args, cx, disable)?.last())
    }
}

impl<H> fmt::Debug for RuleTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleTable")
            .field("name", &self.name)
            .field("rules", &self.rules)
            .finish()
    }
}

pub(crate) fn is_disabled(name: Option<&str>, disable: &[&str]) -> bool {
    name.is_some_and(|n| disable.contains(&n))
}
