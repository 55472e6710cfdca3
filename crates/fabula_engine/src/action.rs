//! Action kinds and action instances.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use fabula_foundation::{Bindings, Fact, Pattern, Value, val};

// =============================================================================
// ActionKind
// =============================================================================

/// Metadata for one kind of action.
///
/// Display forms are narration templates over the kind's role names and
/// any stashed fields, e.g. `"putting [the $x] into [the $y]"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionKind {
    name: Arc<str>,
    roles: Vec<Arc<str>>,
    infinitive: Arc<str>,
    gerund: Arc<str>,
    wants_instance: bool,
}

impl ActionKind {
    /// Creates a kind with the given role names. The first role is the actor.
    ///
    /// Both display forms default to the lowercased kind name.
    #[must_use]
    pub fn new(name: &str, roles: &[&str]) -> Self {
        let plain: Arc<str> = Arc::from(name.to_lowercase());
        Self {
            name: Arc::from(name),
            roles: roles.iter().map(|r| Arc::from(*r)).collect(),
            infinitive: plain.clone(),
            gerund: plain,
            wants_instance: false,
        }
    }

    /// Sets the infinitive and gerund templates.
    #[must_use]
    pub fn with_forms(mut self, infinitive: &str, gerund: &str) -> Self {
        self.infinitive = Arc::from(infinitive);
        self.gerund = Arc::from(gerund);
        self
    }

    /// Handlers of this kind share one mutable instance across phases.
    #[must_use]
    pub fn wanting_instance(mut self) -> Self {
        self.wants_instance = true;
        self
    }

    /// The kind name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role names, actor first.
    #[must_use]
    pub fn roles(&self) -> &[Arc<str>] {
        &self.roles
    }

    /// Number of role arguments.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.roles.len()
    }

    /// Infinitive template, e.g. `"take [the $x]"`.
    #[must_use]
    pub fn infinitive(&self) -> &str {
        &self.infinitive
    }

    /// Gerund template, e.g. `"taking [the $x]"`.
    #[must_use]
    pub fn gerund(&self) -> &str {
        &self.gerund
    }

    /// Whether handlers see the same instance in every phase.
    #[must_use]
    pub fn wants_instance(&self) -> bool {
        self.wants_instance
    }

    /// Binds role names and stashed fields for rendering a display form.
    #[must_use]
    pub fn bindings(&self, action: &Action) -> Bindings {
        let mut bindings: Bindings = action
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (role, arg) in self.roles.iter().zip(&action.args) {
            bindings.set(role.clone(), arg.clone());
        }
        bindings
    }

    /// A pattern for this kind with every role a variable of the same name.
    #[must_use]
    pub fn template(&self) -> Pattern {
        Pattern::new(&self.name, self.roles.iter().map(|r| fabula_foundation::var(r)))
    }
}

// =============================================================================
// Action
// =============================================================================

/// One action instance: a kind, role arguments, and stashed fields.
#[derive(Clone, PartialEq, Eq)]
pub struct Action {
    kind: Arc<str>,
    args: Vec<Value>,
    fields: BTreeMap<Arc<str>, Value>,
}

impl Action {
    /// Creates an action. The first argument is the actor.
    #[must_use]
    pub fn new(kind: &str, args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            kind: Arc::from(kind),
            args: args.into_iter().collect(),
            fields: BTreeMap::new(),
        }
    }

    /// The action kind name.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Role arguments, actor first.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// The actor, if there is one.
    #[must_use]
    pub fn actor(&self) -> Option<&Value> {
        self.args.first()
    }

    /// The role argument at `index`, or nil.
    #[must_use]
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or_default()
    }

    /// A stashed field, or nil.
    #[must_use]
    pub fn field(&self, name: &str) -> Value {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// Stashes a field on this instance.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(Arc::from(name), value.into());
    }

    /// Builder form of [`set_field`](Self::set_field).
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    /// The action as a ground pattern (fields are dropped).
    #[must_use]
    pub fn to_pattern(&self) -> Pattern {
        Pattern::new(&self.kind, self.args.iter().cloned().map(val))
    }
}

impl From<Fact> for Action {
    fn from(fact: Fact) -> Self {
        Self {
            kind: fact.kind,
            args: fact.args,
            fields: BTreeMap::new(),
        }
    }
}

impl fmt::Display for Action {
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

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")?;
        if !self.fields.is_empty() {
            f.debug_map().entries(self.fields.iter()).finish()?;
        }
        Ok(())
    }
}
