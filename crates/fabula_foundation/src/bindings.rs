//! Variable bindings produced by unification.

use std::fmt;
use std::sync::Arc;

use crate::value::{ObjectId, Value};

/// A set of variable bindings from pattern matching.
///
/// Backed by a persistent map: guard evaluation forks bindings at every
/// relation query, and each fork shares structure with its parent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: im::HashMap<Arc<str>, Value>,
}

impl Bindings {
    /// Create empty bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a binding by variable name.
    #[must_use]
    pub fn get(&self, var: &str) -> Option<&Value> {
        self.values.get(var)
    }

    /// Returns true if the variable is bound.
    #[must_use]
    pub fn contains(&self, var: &str) -> bool {
        self.values.contains_key(var)
    }

    /// Set a binding, replacing any previous value.
    pub fn set(&mut self, var: impl Into<Arc<str>>, value: Value) {
        self.values.insert(var.into(), value);
    }

    /// Returns a copy with one more binding.
    #[must_use]
    pub fn with(&self, var: impl Into<Arc<str>>, value: Value) -> Self {
        let mut next = self.clone();
        next.set(var, value);
        next
    }

    /// Get the object bound to a variable.
    #[must_use]
    pub fn get_object(&self, var: &str) -> Option<&ObjectId> {
        self.values.get(var).and_then(Value::as_object)
    }

    /// Iterate all bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Value)> {
        self.values.iter()
    }

    /// Number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.values.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        f.debug_map()
            .entries(entries.into_iter().map(|(k, v)| (format!("?{k}"), v)))
            .finish()
    }
}

impl<K: Into<Arc<str>>> FromIterator<(K, Value)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut bindings = Self::new();
        for (k, v) in iter {
            bindings.set(k, v);
        }
        bindings
    }
}
