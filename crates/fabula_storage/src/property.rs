//! Computed properties and the lookup-chain result.

use std::fmt;
use std::sync::Arc;

use fabula_foundation::{Bindings, Error, FactSource, Result, Value};
use fabula_rules::{Dispatch, Outcome, Rule};

use crate::world::World;

/// Handler for a computed property.
///
/// Receives the world (read-only), the key's arguments, and the bindings
/// from the rule's argument pattern and guard.
pub type ComputeFn =
    Arc<dyn Fn(&World, &[Value], &Bindings) -> Result<Outcome<Value>> + Send + Sync>;

/// Wraps a closure as a computed-property rule.
pub fn computed<F>(f: F) -> Rule<ComputeFn>
where
    F: Fn(&World, &[Value], &Bindings) -> Result<Outcome<Value>> + Send + Sync + 'static,
{
    Rule::new(Arc::new(f) as ComputeFn)
}

/// Which tier of the lookup chain answered a read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    /// The per-session overlay.
    Overlay,
    /// The frozen base table.
    Base,
    /// A computed-property handler.
    Computed,
    /// Nothing answered; the kind's default.
    Default,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Overlay => "overlay",
            Self::Base => "base",
            Self::Computed => "computed",
            Self::Default => "default",
        })
    }
}

/// A property read together with the tier that supplied it.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    /// The value read.
    pub value: Value,
    /// Where it came from.
    pub tier: Tier,
}

impl Resolved {
    pub(crate) fn new(value: Value, tier: Tier) -> Self {
        Self { value, tier }
    }
}

/// Dispatch adapter that runs computed handlers against a borrowed world.
pub(crate) struct PropertyCall<'w> {
    pub(crate) world: &'w World,
}

impl Dispatch<ComputeFn> for PropertyCall<'_> {
    type Output = Value;
    type Escape = Error;

    fn facts(&self) -> &dyn FactSource {
        self.world
    }

    fn invoke(
        &mut self,
        handler: &ComputeFn,
        args: &[Value],
        bindings: &Bindings,
    ) -> Result<Outcome<Value>> {
        handler(self.world, args, bindings)
    }
}
