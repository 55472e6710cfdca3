//! A playable bundle: sealed world, rulebook, parser, and narrator.

use std::fmt;
use std::sync::Arc;

use fabula_foundation::Value;
use fabula_storage::World;

use crate::narrator::Narrator;
use crate::parse::Parser;
use crate::rulebook::Rulebook;

/// Everything needed to play, as produced by content setup.
#[derive(Clone)]
pub struct Story {
    /// The sealed world in its starting state.
    pub world: World,
    /// Frozen action pipelines, activities, and actor rules.
    pub rulebook: Arc<Rulebook>,
    /// Input to actions.
    pub parser: Arc<dyn Parser>,
    /// Values and templates to prose.
    pub narrator: Arc<dyn Narrator>,
    /// The object the player controls.
    pub actor: Value,
}

impl fmt::Debug for Story {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Story")
            .field("world", &self.world)
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}
