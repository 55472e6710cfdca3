//! Property and relation kind declarations.

use std::sync::Arc;

use fabula_foundation::Value;

/// Declaration of a property kind.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertySchema {
    /// Kind name, e.g. `IsOpen`.
    pub name: Arc<str>,
    /// Number of arguments a key of this kind takes.
    pub arity: usize,
    /// Value returned when nothing else answers.
    pub default: Value,
}

impl PropertySchema {
    /// Creates a property schema with a nil default.
    #[must_use]
    pub fn new(name: &str, arity: usize) -> Self {
        Self {
            name: Arc::from(name),
            arity,
            default: Value::Nil,
        }
    }

    /// A property that defaults to `false`.
    #[must_use]
    pub fn flag(name: &str, arity: usize) -> Self {
        Self::new(name, arity).with_default(Value::Bool(false))
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }
}

/// Declaration of a relation kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationSchema {
    /// Kind name, e.g. `Contains`.
    pub name: Arc<str>,
    /// Number of arguments per fact.
    pub arity: usize,
    /// Cardinality between the first (source) and last (target) argument.
    pub cardinality: Cardinality,
    /// What to do when adding a fact would break the cardinality.
    pub on_violation: OnViolation,
}

impl RelationSchema {
    /// Creates an unconstrained relation schema.
    #[must_use]
    pub fn new(name: &str, arity: usize) -> Self {
        Self {
            name: Arc::from(name),
            arity,
            cardinality: Cardinality::ManyToMany,
            on_violation: OnViolation::Error,
        }
    }

    /// Sets the cardinality.
    #[must_use]
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Sets the on-violation behavior.
    #[must_use]
    pub fn with_on_violation(mut self, on_violation: OnViolation) -> Self {
        self.on_violation = on_violation;
        self
    }
}

/// Cardinality constraint between a relation's first and last argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Each source has at most one target, each target has at most one source.
    OneToOne,
    /// Each source has at most one target, targets can have many sources.
    ManyToOne,
    /// Each source can have many targets, each target has at most one source.
    OneToMany,
    /// No cardinality constraints.
    ManyToMany,
}

impl Cardinality {
    pub(crate) const fn unique_target(self) -> bool {
        matches!(self, Self::OneToOne | Self::ManyToOne)
    }

    pub(crate) const fn unique_source(self) -> bool {
        matches!(self, Self::OneToOne | Self::OneToMany)
    }
}

/// What happens when a cardinality constraint would be violated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OnViolation {
    /// Return an error.
    Error,
    /// Replace the existing fact.
    Replace,
}
