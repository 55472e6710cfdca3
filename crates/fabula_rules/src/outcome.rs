//! Per-invocation results.

/// What a single handler invocation produced.
///
/// Pipeline-level escapes (abort, substitution, faults) are not outcomes;
/// handlers return them as the `Err` side and they leave the dispatch
/// untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// A result to record; dispatch continues.
    Value(T),
    /// This handler declines; dispatch continues.
    NotHandled,
    /// Stop dispatch now; this is the result.
    Handled(T),
}

impl<T> Outcome<T> {
    /// Maps the carried value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Value(v) => Outcome::Value(f(v)),
            Self::NotHandled => Outcome::NotHandled,
            Self::Handled(v) => Outcome::Handled(f(v)),
        }
    }

    /// Returns true for `NotHandled`.
    #[must_use]
    pub const fn is_not_handled(&self) -> bool {
        matches!(self, Self::NotHandled)
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    /// `None` declines, `Some` records.
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NotHandled, Self::Value)
    }
}

/// Everything a dispatch collected before it finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Collected<T> {
    /// A handler returned [`Outcome::Handled`].
    Stopped(T),
    /// Every recorded value, in handler order.
    Results(Vec<T>),
}

impl<T> Collected<T> {
    /// Folds to the rule-table answer: the stopping value, or the last
    /// recorded one.
    pub fn last(self) -> Option<T> {
        match self {
            Self::Stopped(v) => Some(v),
            Self::Results(mut all) => all.pop(),
        }
    }
}
