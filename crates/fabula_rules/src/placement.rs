//! Insertion directives for named handlers.

use std::sync::Arc;

use fabula_foundation::{Error, Result};

/// Where a new handler goes relative to the existing ones.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Placement {
    /// After every existing handler.
    #[default]
    Append,
    /// Immediately after the named handler.
    After(Arc<str>),
    /// Immediately before the named handler.
    Before(Arc<str>),
}

impl Placement {
    /// Immediately after `anchor`.
    #[must_use]
    pub fn after(anchor: &str) -> Self {
        Self::After(Arc::from(anchor))
    }

    /// Immediately before `anchor`.
    #[must_use]
    pub fn before(anchor: &str) -> Self {
        Self::Before(Arc::from(anchor))
    }
}

/// Anything stored in a table under an optional name.
pub(crate) trait Named {
    fn name(&self) -> Option<&str>;
}

/// Inserts `entry` according to `placement`.
///
/// Names must be unique within a table and anchors must exist.
pub(crate) fn place<E: Named>(
    table: &str,
    entries: &mut Vec<E>,
    entry: E,
    placement: &Placement,
) -> Result<()> {
    if let Some(name) = entry.name() {
        if entries.iter().any(|e| e.name() == Some(name)) {
            return Err(Error::duplicate(format!("{table}/{name}")));
        }
    }
    let index = match placement {
        Placement::Append => entries.len(),
        Placement::After(anchor) => position(table, entries, anchor)? + 1,
        Placement::Before(anchor) => position(table, entries, anchor)?,
    };
    entries.insert(index, entry);
    Ok(())
}

fn position<E: Named>(table: &str, entries: &[E], anchor: &str) -> Result<usize> {
    entries
        .iter()
        .position(|e| e.name() == Some(anchor))
        .ok_or_else(|| Error::unknown_anchor(format!("{table}/{anchor}")))
}
