//! Relation storage: ordered fact sets with cardinality and reachability.
//!
//! Facts keep insertion order so queries enumerate deterministically. A
//! hash index sits beside the order for duplicate checks.

use std::collections::{HashMap, HashSet, VecDeque};

use fabula_foundation::{Bindings, Error, ErrorKind, Fact, Pattern, Result, Value};

use crate::schema::{OnViolation, RelationSchema};

/// The facts of one relation kind.
#[derive(Clone, Debug, Default)]
pub struct RelationTable {
    order: im::Vector<Fact>,
    index: im::HashSet<Fact>,
}

impl RelationTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns true if the fact is present.
    #[must_use]
    pub fn contains(&self, fact: &Fact) -> bool {
        self.index.contains(fact)
    }

    /// Iterates facts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.order.iter()
    }

    /// Adds a fact, enforcing the schema's cardinality.
    ///
    /// Adding an existing fact is a no-op. Returns true if the table changed.
    ///
    /// # Errors
    ///
    /// Returns an error if cardinality would be violated and the schema's
    /// policy is [`OnViolation::Error`].
    pub fn insert(&mut self, fact: Fact, schema: &RelationSchema) -> Result<bool> {
        if self.index.contains(&fact) {
            return Ok(false);
        }
        if fact.args.len() >= 2 {
            let conflicts: Vec<Fact> = self
                .order
                .iter()
                .filter(|f| conflicts_with(f, &fact, schema))
                .cloned()
                .collect();
            if !conflicts.is_empty() {
                match schema.on_violation {
                    OnViolation::Error => {
                        return Err(Error::new(ErrorKind::CardinalityViolation {
                            relation: schema.name.to_string(),
                            message: format!("{fact} conflicts with {}", conflicts[0]),
                        }));
                    }
                    OnViolation::Replace => {
                        for old in &conflicts {
                            self.remove(old);
                        }
                    }
                }
            }
        }
        self.index.insert(fact.clone());
        self.order.push_back(fact);
        Ok(true)
    }

    /// Removes a fact. Returns true if it was present.
    pub fn remove(&mut self, fact: &Fact) -> bool {
        if self.index.remove(fact).is_none() {
            return false;
        }
        self.order.retain(|f| f != fact);
        true
    }

    /// Every extension of `bindings` under which `pattern` matches a fact,
    /// in insertion order.
    #[must_use]
    pub fn query(&self, pattern: &Pattern, bindings: &Bindings) -> Vec<Bindings> {
        self.order
            .iter()
            .filter_map(|f| pattern.match_fact(f, bindings))
            .collect()
    }

    /// Breadth-first route from `from` to `to` along first→last argument
    /// edges, endpoints included.
    ///
    /// Neighbors are explored in insertion order, so the route found is the
    /// shortest one that the earliest facts lead to.
    #[must_use]
    pub fn path_to(&self, from: &Value, to: &Value) -> Option<Vec<Value>> {
        if from == to {
            return Some(vec![from.clone()]);
        }
        let mut edges: HashMap<&Value, Vec<&Value>> = HashMap::new();
        for fact in &self.order {
            if let (Some(source), Some(target)) = (fact.args.first(), fact.args.last()) {
                edges.entry(source).or_default().push(target);
            }
        }

        let mut previous: HashMap<&Value, &Value> = HashMap::new();
        let mut seen: HashSet<&Value> = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);
        while let Some(node) = queue.pop_front() {
            for &next in edges.get(node).map(Vec::as_slice).unwrap_or_default() {
                if !seen.insert(next) {
                    continue;
                }
                previous.insert(next, node);
                if next == to {
                    let mut route = vec![next.clone()];
                    let mut cursor = next;
                    while let Some(&back) = previous.get(cursor) {
                        route.push(back.clone());
                        cursor = back;
                    }
                    route.reverse();
                    return Some(route);
                }
                queue.push_back(next);
            }
        }
        None
    }
}

/// Would `existing` have to go for `new` to satisfy the cardinality?
fn conflicts_with(existing: &Fact, new: &Fact, schema: &RelationSchema) -> bool {
    let same_source = existing.args.first() == new.args.first();
    let same_target = existing.args.last() == new.args.last();
    (schema.cardinality.unique_target() && same_source)
        || (schema.cardinality.unique_source() && same_target)
}
