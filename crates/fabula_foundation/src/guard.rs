//! Guard expressions: boolean pattern trees evaluated against live facts.
//!
//! A guard decides whether a handler applies to a call. It is interpreted
//! over a [`FactSource`], the read-only view of the world that the storage
//! layer provides.

use crate::Result;
use crate::bindings::Bindings;
use crate::pattern::{Fact, Pattern, Term};
use crate::value::Value;

/// Read-only access to properties and relations.
///
/// Object safe so rule tables can evaluate guards without knowing the
/// concrete world type.
pub trait FactSource {
    /// Reads a property value.
    ///
    /// # Errors
    ///
    /// Returns an error if the property kind is not defined or the arity is
    /// wrong.
    fn property(&self, key: &Fact) -> Result<Value>;

    /// Returns true if `kind` names a relation rather than a property.
    fn is_relation(&self, kind: &str) -> bool;

    /// Returns every extension of `bindings` under which `pattern` is a fact
    /// of its relation, in relation insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the relation kind is not defined.
    fn query(&self, pattern: &Pattern, bindings: &Bindings) -> Result<Vec<Bindings>>;
}

/// A value-producing expression inside an [`Guard::Equals`] test.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A variable or literal.
    Term(Term),
    /// The value of a property, read after substitution.
    Property(Pattern),
}

impl Expr {
    /// Evaluates the expression.
    ///
    /// `Ok(None)` means unresolvable: an unbound variable, or a property
    /// pattern that is not yet ground.
    fn eval(&self, facts: &dyn FactSource, bindings: &Bindings) -> Result<Option<Value>> {
        match self {
            Self::Term(term) => Ok(term.resolve(bindings)),
            Self::Property(pattern) => match pattern.ground(bindings) {
                Some(fact) => facts.property(&fact).map(Some),
                None => Ok(None),
            },
        }
    }
}

impl From<Term> for Expr {
    fn from(term: Term) -> Self {
        Self::Term(term)
    }
}

impl From<Pattern> for Expr {
    fn from(pattern: Pattern) -> Self {
        Self::Property(pattern)
    }
}

/// Boolean pattern expression gating handler applicability.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Guard {
    /// Always satisfied.
    #[default]
    Always,
    /// A relation fact exists, or a property is truthy.
    Holds(Pattern),
    /// Every sub-guard holds; bindings flow left to right.
    And(Vec<Guard>),
    /// The sub-guard has no solution. Never binds anything.
    Not(Box<Guard>),
    /// Both expressions resolve to equal values.
    Equals(Expr, Expr),
}

impl Guard {
    /// Guard on a relation fact or truthy property.
    #[must_use]
    pub fn holds(pattern: Pattern) -> Self {
        Self::Holds(pattern)
    }

    /// Negation.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Guard) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Equality test.
    #[must_use]
    pub fn equals(left: impl Into<Expr>, right: impl Into<Expr>) -> Self {
        Self::Equals(left.into(), right.into())
    }

    /// Conjunction with another guard, flattening nested `And`s.
    #[must_use]
    pub fn and(self, other: Guard) -> Self {
        match (self, other) {
            (Self::Always, g) | (g, Self::Always) => g,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), g) => {
                left.push(g);
                Self::And(left)
            }
            (g, Self::And(mut right)) => {
                right.insert(0, g);
                Self::And(right)
            }
            (a, b) => Self::And(vec![a, b]),
        }
    }

    /// Returns every binding extension under which the guard holds.
    ///
    /// An empty result means the guard failed. Failure is never an error;
    /// errors come only from reading undefined kinds.
    ///
    /// # Errors
    ///
    /// Returns an error if a property or relation kind is not defined.
    pub fn solutions(&self, facts: &dyn FactSource, bindings: &Bindings) -> Result<Vec<Bindings>> {
        match self {
            Self::Always => Ok(vec![bindings.clone()]),
            Self::Holds(pattern) => {
                if facts.is_relation(&pattern.kind) {
                    return facts.query(pattern, bindings);
                }
                let Some(fact) = pattern.ground(bindings) else {
                    return Ok(Vec::new());
                };
                let holds = facts.property(&fact)?.is_truthy();
                Ok(if holds { vec![bindings.clone()] } else { Vec::new() })
            }
            Self::And(guards) => {
                let mut frontier = vec![bindings.clone()];
                for guard in guards {
                    let mut next = Vec::new();
                    for partial in &frontier {
                        next.extend(guard.solutions(facts, partial)?);
                    }
                    if next.is_empty() {
                        return Ok(next);
                    }
                    frontier = next;
                }
                Ok(frontier)
            }
            Self::Not(inner) => {
                let blocked = !inner.solutions(facts, bindings)?.is_empty();
                Ok(if blocked { Vec::new() } else { vec![bindings.clone()] })
            }
            Self::Equals(left, right) => {
                let l = left.eval(facts, bindings)?;
                let r = right.eval(facts, bindings)?;
                Ok(match (l, r) {
                    (Some(a), Some(b)) => {
                        if a == b {
                            vec![bindings.clone()]
                        } else {
                            Vec::new()
                        }
                    }
                    (None, Some(v)) => bind_unresolved(left, v, bindings),
                    (Some(v), None) => bind_unresolved(right, v, bindings),
                    (None, None) => Vec::new(),
                })
            }
        }
    }

    /// Returns the first solution, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if a property or relation kind is not defined.
    pub fn first_solution(
        &self,
        facts: &dyn FactSource,
        bindings: &Bindings,
    ) -> Result<Option<Bindings>> {
        Ok(self.solutions(facts, bindings)?.into_iter().next())
    }

    /// Returns true if the guard holds under `bindings`.
    ///
    /// # Errors
    ///
    /// Returns an error if a property or relation kind is not defined.
    pub fn satisfied(&self, facts: &dyn FactSource, bindings: &Bindings) -> Result<bool> {
        Ok(!self.solutions(facts, bindings)?.is_empty())
    }
}

/// `Equals` with one side an unbound variable binds it.
fn bind_unresolved(expr: &Expr, value: Value, bindings: &Bindings) -> Vec<Bindings> {
    match expr {
        Expr::Term(Term::Var(name)) => vec![bindings.with(name.clone(), value)],
        _ => Vec::new(),
    }
}
