//! Serializable world state.
//!
//! A snapshot carries only what changes during play: the overlay and the
//! relation tables. Restoring needs the same base world it was taken from.

use fabula_foundation::{Fact, Value};

/// The mutable session state of a [`World`](crate::World).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldSnapshot {
    /// Overlay entries, sorted by key.
    pub overlay: Vec<(Fact, Value)>,
    /// Every relation table, in kind order.
    pub relations: Vec<RelationSnapshot>,
}

/// One relation table's facts in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelationSnapshot {
    /// Relation kind.
    pub kind: String,
    /// Argument lists, one per fact.
    pub facts: Vec<Vec<Value>>,
}

impl WorldSnapshot {
    /// Total number of overlay entries and relation facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.overlay.len() + self.relations.iter().map(|r| r.facts.len()).sum::<usize>()
    }

    /// Returns true if the snapshot holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
