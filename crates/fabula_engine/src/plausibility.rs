//! Verify-phase scores.

use std::cmp::Ordering;
use std::fmt;

/// How sensible an action looks before it runs.
///
/// Ordered `Illogical < NonObvious < Logical < VeryLogical`. Verify folds
/// every handler's answer by taking the lowest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Plausibility {
    /// The action cannot make sense; the reason is narrated if it runs.
    Illogical(String),
    /// Possible, but unlikely to be what was meant.
    NonObvious,
    /// The default.
    #[default]
    Logical,
    /// A strong match.
    VeryLogical,
}

impl Plausibility {
    /// Creates an illogical score with a reason.
    #[must_use]
    pub fn illogical(reason: impl Into<String>) -> Self {
        Self::Illogical(reason.into())
    }

    /// Numeric rank, lowest for illogical.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Illogical(_) => 0,
            Self::NonObvious => 1,
            Self::Logical => 2,
            Self::VeryLogical => 3,
        }
    }

    /// Returns true for [`Plausibility::Illogical`].
    #[must_use]
    pub const fn is_illogical(&self) -> bool {
        matches!(self, Self::Illogical(_))
    }

    /// The lowest of `scores`; [`Plausibility::Logical`] when empty.
    ///
    /// Among equally low illogical scores the first reason is kept.
    #[must_use]
    pub fn fold(scores: impl IntoIterator<Item = Self>) -> Self {
        scores
            .into_iter()
            .reduce(|low, next| if next.rank() < low.rank() { next } else { low })
            .unwrap_or(Self::Logical)
    }
}

impl PartialOrd for Plausibility {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Plausibility {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Illogical(a), Self::Illogical(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Plausibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Illogical(reason) => write!(f, "illogical ({reason})"),
            Self::NonObvious => f.write_str("non-obvious"),
            Self::Logical => f.write_str("logical"),
            Self::VeryLogical => f.write_str("very logical"),
        }
    }
}
