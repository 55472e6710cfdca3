//! Activity tables: unguarded handlers whose results are accumulated.

use std::fmt;
use std::sync::Arc;

use fabula_foundation::{Bindings, Result, Value};

use crate::outcome::Outcome;
use crate::placement::{Named, Placement, place};
use crate::table::{Dispatch, is_disabled};

/// How an activity combines its handlers' results.
#[derive(Clone, Default)]
pub enum Accumulator {
    /// The first result that is not blank, or nil.
    #[default]
    FirstNonEmpty,
    /// Every result's items, concatenated in handler order.
    ListAppend,
    /// Non-blank results rendered as text and joined with the separator.
    JoinText(Arc<str>),
    /// A caller-supplied fold over every recorded result.
    Reduce(Arc<dyn Fn(Vec<Value>) -> Value + Send + Sync>),
}

impl Accumulator {
    /// Joins with a single space.
    #[must_use]
    pub fn join_with_spaces() -> Self {
        Self::JoinText(Arc::from(" "))
    }

    /// Combines recorded results.
    #[must_use]
    pub fn combine(&self, results: Vec<Value>) -> Value {
        match self {
            Self::FirstNonEmpty => results
                .into_iter()
                .find(|v| !v.is_blank())
                .unwrap_or_default(),
            Self::ListAppend => Value::List(
                results
                    .into_iter()
                    .flat_map(Value::into_items)
                    .collect(),
            ),
            Self::JoinText(sep) => {
                let parts: Vec<String> = results
                    .into_iter()
                    .filter(|v| !v.is_blank())
                    .map(|v| match v {
                        Value::Text(s) => s.to_string(),
                        other => other.to_string(),
                    })
                    .collect();
                Value::from(parts.join(sep))
            }
            Self::Reduce(f) => f(results),
        }
    }
}

impl fmt::Debug for Accumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstNonEmpty => f.write_str("FirstNonEmpty"),
            Self::ListAppend => f.write_str("ListAppend"),
            Self::JoinText(sep) => write!(f, "JoinText({sep:?})"),
            Self::Reduce(_) => f.write_str("Reduce(..)"),
        }
    }
}

/// One handler record in an [`ActivityTable`].
#[derive(Clone)]
pub struct Activity<H> {
    /// Name used by disable-lists and insertion anchors.
    pub name: Option<Arc<str>>,
    /// The handler itself.
    pub handler: H,
}

impl<H> Activity<H> {
    /// Creates an unnamed activity handler.
    #[must_use]
    pub fn new(handler: H) -> Self {
        Self {
            name: None,
            handler,
        }
    }

    /// Sets the name.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(Arc::from(name));
        self
    }
}

impl<H> Named for Activity<H> {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Unguarded, ordered, multi-handler dispatch with configurable accumulation.
#[derive(Clone)]
pub struct ActivityTable<H> {
    name: Arc<str>,
    accumulator: Accumulator,
    handlers: Vec<Activity<H>>,
}

impl<H> ActivityTable<H> {
    /// Creates an empty table using [`Accumulator::FirstNonEmpty`].
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            accumulator: Accumulator::default(),
            handlers: Vec::new(),
        }
    }

    /// Sets the accumulator.
    #[must_use]
    pub fn with_accumulator(mut self, accumulator: Accumulator) -> Self {
        self.accumulator = accumulator;
        self
    }

    /// The table's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configured accumulator.
    #[must_use]
    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// Adds a handler at the given placement.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the anchor is unknown.
    pub fn add(&mut self, activity: Activity<H>, placement: &Placement) -> Result<()> {
        place(&self.name, &mut self.handlers, activity, placement)
    }

    /// Adds a handler after all existing ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken.
    pub fn append(&mut self, activity: Activity<H>) -> Result<()> {
        self.add(activity, &Placement::Append)
    }

    /// Number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if the table has no handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs every non-disabled handler and accumulates the results.
    ///
    /// A handler returning [`Outcome::Handled`] ends the run and its value
    /// is returned as-is, bypassing the accumulator.
    ///
    /// # Errors
    ///
    /// Propagates the first escape a handler returns.
    pub fn dispatch<D>(
        &self,
        args: &[Value],
        cx: &mut D,
        disable: &[&str],
    ) -> std::result::Result<Value, D::Escape>
    where
        D: Dispatch<H, Output = Value>,
    {
        let mut results = Vec::new();
        let none = Bindings::new();
        for activity in &self.handlers {
            if is_disabled(activity.name.as_deref(), disable) {
                continue;
            }
            match cx.invoke(&activity.handler, args, &none)? {
                Outcome::Value(v) => results.push(v),
                Outcome::NotHandled => {}
                Outcome::Handled(v) => {
                    tracing::trace!(activity = %self.name, "activity handled early");
                    return Ok(v);
                }
            }
        }
        Ok(self.accumulator.combine(results))
    }
}

impl<H> fmt::Debug for ActivityTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityTable")
            .field("name", &self.name)
            .field("accumulator", &self.accumulator)
            .field(
                "handlers",
                &self
                    .handlers
                    .iter()
                    .map(|a| a.name.as_deref().unwrap_or("<anonymous>"))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
