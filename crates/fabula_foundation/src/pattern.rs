//! Tagged values with logic variables, and the unification over them.
//!
//! A [`Pattern`] is a kind name plus ordered [`Term`]s; a [`Fact`] is the
//! ground form with plain [`Value`]s. Facts key properties and relations,
//! patterns query them and guard handlers.
//!
//! Unification never errors: a mismatch simply yields `None`.

use std::fmt;
use std::sync::Arc;

use crate::bindings::Bindings;
use crate::value::Value;

// =============================================================================
// Term
// =============================================================================

/// One argument position of a pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    /// A named logic variable.
    Var(Arc<str>),
    /// A bound value.
    Val(Value),
}

/// Shorthand for a variable term.
#[must_use]
pub fn var(name: &str) -> Term {
    Term::Var(Arc::from(name))
}

/// Shorthand for a bound term.
#[must_use]
pub fn val(value: impl Into<Value>) -> Term {
    Term::Val(value.into())
}

impl Term {
    /// Resolves this term under the given bindings.
    ///
    /// Returns `None` for an unbound variable.
    #[must_use]
    pub fn resolve(&self, bindings: &Bindings) -> Option<Value> {
        match self {
            Self::Val(v) => Some(v.clone()),
            Self::Var(name) => bindings.get(name).cloned(),
        }
    }

    /// Returns the variable name, if this term is a variable.
    #[must_use]
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Self::Var(name) => Some(name),
            Self::Val(_) => None,
        }
    }

    /// Unifies this term against a concrete value.
    #[must_use]
    pub fn unify_value(&self, value: &Value, bindings: &Bindings) -> Option<Bindings> {
        match self {
            Self::Val(v) => (v == value).then(|| bindings.clone()),
            Self::Var(name) => match bindings.get(name) {
                Some(bound) => (bound == value).then(|| bindings.clone()),
                None => Some(bindings.with(name.clone(), value.clone())),
            },
        }
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Self::Val(value)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(name) => write!(f, "?{name}"),
            Self::Val(v) => write!(f, "{v}"),
        }
    }
}

/// Unifies argument terms against argument values.
///
/// Arity mismatch fails. Earlier bindings in the same call constrain later
/// positions, so `(?x, ?x)` only matches equal values.
#[must_use]
pub fn unify_args(terms: &[Term], values: &[Value], bindings: &Bindings) -> Option<Bindings> {
    if terms.len() != values.len() {
        return None;
    }
    let mut current = bindings.clone();
    for (term, value) in terms.iter().zip(values) {
        current = term.unify_value(value, &current)?;
    }
    Some(current)
}

// =============================================================================
// Fact
// =============================================================================

/// A ground tagged value: kind plus concrete arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fact {
    /// Property, relation, or action kind.
    pub kind: Arc<str>,
    /// Ordered arguments.
    pub args: Vec<Value>,
}

impl Fact {
    /// Creates a fact.
    #[must_use]
    pub fn new(kind: &str, args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            kind: Arc::from(kind),
            args: args.into_iter().collect(),
        }
    }

    /// Number of arguments.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Lifts this fact into a pattern with no variables.
    #[must_use]
    pub fn to_pattern(&self) -> Pattern {
        Pattern {
            kind: self.kind.clone(),
            args: self.args.iter().cloned().map(Term::Val).collect(),
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

// =============================================================================
// Pattern
// =============================================================================

/// A tagged value whose arguments may be logic variables.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern {
    /// Property, relation, or action kind.
    pub kind: Arc<str>,
    /// Ordered argument terms.
    pub args: Vec<Term>,
}

impl Pattern {
    /// Creates a pattern.
    #[must_use]
    pub fn new(kind: &str, args: impl IntoIterator<Item = Term>) -> Self {
        Self {
            kind: Arc::from(kind),
            args: args.into_iter().collect(),
        }
    }

    /// Number of arguments.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Returns true if no argument is a variable.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        self.args.iter().all(|t| matches!(t, Term::Val(_)))
    }

    /// Iterates the variable names in argument order (with repeats).
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(Term::as_var)
    }

    /// Matches this pattern against a ground fact.
    ///
    /// Fails on kind or arity mismatch, or when a value conflicts with an
    /// existing binding.
    #[must_use]
    pub fn match_fact(&self, fact: &Fact, bindings: &Bindings) -> Option<Bindings> {
        if self.kind != fact.kind {
            return None;
        }
        unify_args(&self.args, &fact.args, bindings)
    }

    /// Unifies two patterns.
    ///
    /// A variable on either side binds to a value on the other. Two unbound
    /// variables facing each other stay free.
    #[must_use]
    pub fn unify(&self, other: &Pattern, bindings: &Bindings) -> Option<Bindings> {
        if self.kind != other.kind || self.arity() != other.arity() {
            return None;
        }
        let mut current = bindings.clone();
        for (left, right) in self.args.iter().zip(&other.args) {
            current = match (left.resolve(&current), right.resolve(&current)) {
                (Some(a), Some(b)) => (a == b).then_some(current)?,
                (None, Some(b)) => left.unify_value(&b, &current)?,
                (Some(a), None) => right.unify_value(&a, &current)?,
                (None, None) => current,
            };
        }
        Some(current)
    }

    /// Replaces bound variables with their values.
    #[must_use]
    pub fn substitute(&self, bindings: &Bindings) -> Pattern {
        Pattern {
            kind: self.kind.clone(),
            args: self
                .args
                .iter()
                .map(|t| t.resolve(bindings).map_or_else(|| t.clone(), Term::Val))
                .collect(),
        }
    }

    /// Converts to a fact if every argument is bound.
    #[must_use]
    pub fn to_fact(&self) -> Option<Fact> {
        let args = self
            .args
            .iter()
            .map(|t| match t {
                Term::Val(v) => Some(v.clone()),
                Term::Var(_) => None,
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Fact {
            kind: self.kind.clone(),
            args,
        })
    }

    /// Substitutes and grounds in one step.
    #[must_use]
    pub fn ground(&self, bindings: &Bindings) -> Option<Fact> {
        self.substitute(bindings).to_fact()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}
