//! The world: a property table with an overlay over a frozen base, and a set
//! of relation tables.
//!
//! # Lifecycle
//!
//! A world starts open. Authors define property and relation kinds, write
//! base values, register computed properties, add relation facts, and then
//! [`seal`](World::seal) it. After sealing no new kinds may appear and every
//! property write lands in the overlay.
//!
//! # Reads
//!
//! [`World::read`] consults, in order: the overlay, the base table, the
//! computed-property rule table for the kind, and the kind's default.
//! Reading an undefined kind is an authoring error.
//!
//! Clones are cheap: the base is shared behind an `Arc` and the overlay and
//! relations are persistent maps.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use fabula_foundation::{Bindings, Error, Fact, FactSource, Pattern, Result, Value};
use fabula_rules::{Placement, Rule, RuleTable};

use crate::property::{ComputeFn, PropertyCall, Resolved, Tier};
use crate::relation::RelationTable;
use crate::schema::{PropertySchema, RelationSchema};
use crate::snapshot::{RelationSnapshot, WorldSnapshot};

/// Everything fixed once the world is sealed.
#[derive(Clone, Default)]
struct Base {
    properties: HashMap<Arc<str>, PropertySchema>,
    relations: HashMap<Arc<str>, RelationSchema>,
    values: HashMap<Fact, Value>,
    computed: HashMap<Arc<str>, RuleTable<ComputeFn>>,
    sealed: bool,
}

/// The relational world store.
#[derive(Clone, Default)]
pub struct World {
    base: Arc<Base>,
    overlay: im::HashMap<Fact, Value>,
    relations: im::OrdMap<Arc<str>, RelationTable>,
}

impl World {
    /// Creates an empty, unsealed world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Schema
    // =========================================================================

    /// Returns true once [`seal`](Self::seal) has been called.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.base.sealed
    }

    /// Freezes the schema and base table.
    pub fn seal(&mut self) {
        if !self.base.sealed {
            Arc::make_mut(&mut self.base).sealed = true;
            tracing::debug!(
                properties = self.base.properties.len(),
                relations = self.base.relations.len(),
                "world sealed"
            );
        }
    }

    /// Defines a property kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the world is sealed or the kind already exists.
    pub fn define_property(&mut self, schema: PropertySchema) -> Result<()> {
        self.open_for(&format!("property {}", schema.name))?;
        if self.base.properties.contains_key(&schema.name) {
            return Err(Error::duplicate(format!("property {}", schema.name)));
        }
        let base = Arc::make_mut(&mut self.base);
        base.properties.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Defines a relation kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the world is sealed or the kind already exists.
    pub fn define_relation(&mut self, schema: RelationSchema) -> Result<()> {
        self.open_for(&format!("relation {}", schema.name))?;
        if self.base.relations.contains_key(&schema.name) {
            return Err(Error::duplicate(format!("relation {}", schema.name)));
        }
        self.relations.insert(schema.name.clone(), RelationTable::new());
        Arc::make_mut(&mut self.base)
            .relations
            .insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Appends a computed-property rule for `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the world is sealed, the kind is undefined, or
    /// the rule's name is taken.
    pub fn compute(&mut self, kind: &str, rule: Rule<ComputeFn>) -> Result<()> {
        self.compute_at(kind, rule, &Placement::Append)
    }

    /// Adds a computed-property rule for `kind` at the given placement.
    ///
    /// # Errors
    ///
    /// Returns an error if the world is sealed, the kind is undefined, the
    /// rule's name is taken, or the anchor is unknown.
    pub fn compute_at(
        &mut self,
        kind: &str,
        rule: Rule<ComputeFn>,
        placement: &Placement,
    ) -> Result<()> {
        self.open_for(&format!("computed {kind}"))?;
        let schema = self.property_schema(kind)?;
        let name = schema.name.clone();
        Arc::make_mut(&mut self.base)
            .computed
            .entry(name.clone())
            .or_insert_with(|| RuleTable::new(&name))
            .add(rule, placement)
    }

    /// Looks up a property schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is not defined.
    pub fn property_schema(&self, kind: &str) -> Result<&PropertySchema> {
        self.base
            .properties
            .get(kind)
            .ok_or_else(|| Error::undefined_property(kind))
    }

    /// Looks up a relation schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is not defined.
    pub fn relation_schema(&self, kind: &str) -> Result<&RelationSchema> {
        self.base
            .relations
            .get(kind)
            .ok_or_else(|| Error::undefined_relation(kind))
    }

    fn open_for(&self, what: &str) -> Result<()> {
        if self.base.sealed {
            tracing::error!(what, "definition after seal");
            return Err(Error::sealed(what));
        }
        Ok(())
    }

    fn check_property(&self, key: &Fact) -> Result<&PropertySchema> {
        let schema = self.property_schema(&key.kind)?;
        if schema.arity != key.arity() {
            return Err(Error::arity_mismatch(&*key.kind, schema.arity, key.arity()));
        }
        Ok(schema)
    }

    fn check_relation(&self, kind: &str, arity: usize) -> Result<&RelationSchema> {
        let schema = self.relation_schema(kind)?;
        if schema.arity != arity {
            return Err(Error::arity_mismatch(kind, schema.arity, arity));
        }
        Ok(schema)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Reads a property through the lookup chain, reporting which tier
    /// answered.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined, the arity is wrong, or a
    /// computed handler fails.
    pub fn resolve(&self, key: &Fact) -> Result<Resolved> {
        let schema = self.check_property(key)?;
        if let Some(v) = self.overlay.get(key) {
            return Ok(Resolved::new(v.clone(), Tier::Overlay));
        }
        if let Some(v) = self.base.values.get(key) {
            return Ok(Resolved::new(v.clone(), Tier::Base));
        }
        if let Some(table) = self.base.computed.get(&key.kind) {
            let mut call = PropertyCall { world: self };
            if let Some(v) = table
                .dispatch(&key.args, &mut call, &[])
                .map_err(|e| e.with_frame(format!("computing {key}")))?
            {
                return Ok(Resolved::new(v, Tier::Computed));
            }
        }
        Ok(Resolved::new(schema.default.clone(), Tier::Default))
    }

    /// Reads a property value.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined, the arity is wrong, or a
    /// computed handler fails.
    pub fn read(&self, key: &Fact) -> Result<Value> {
        self.resolve(key).map(|r| r.value)
    }

    /// Reads `kind(args...)`.
    ///
    /// # Errors
    ///
    /// See [`read`](Self::read).
    pub fn get(&self, kind: &str, args: impl IntoIterator<Item = Value>) -> Result<Value> {
        self.read(&Fact::new(kind, args))
    }

    /// Reads `kind(args...)` as a truth value.
    ///
    /// # Errors
    ///
    /// See [`read`](Self::read).
    pub fn is(&self, kind: &str, args: impl IntoIterator<Item = Value>) -> Result<bool> {
        self.get(kind, args).map(|v| v.is_truthy())
    }

    /// Writes a property value: to the base table while open, to the overlay
    /// once sealed.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined or the arity is wrong.
    pub fn write(&mut self, key: Fact, value: Value) -> Result<()> {
        self.check_property(&key)?;
        tracing::trace!(key = %key, value = %value, sealed = self.base.sealed, "write");
        if self.base.sealed {
            self.overlay.insert(key, value);
        } else {
            Arc::make_mut(&mut self.base).values.insert(key, value);
        }
        Ok(())
    }

    /// Writes `kind(args...) = value`.
    ///
    /// # Errors
    ///
    /// See [`write`](Self::write).
    pub fn set(
        &mut self,
        kind: &str,
        args: impl IntoIterator<Item = Value>,
        value: impl Into<Value>,
    ) -> Result<()> {
        self.write(Fact::new(kind, args), value.into())
    }

    // =========================================================================
    // Relations
    // =========================================================================

    /// Adds a relation fact. Returns true if the relation changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined, the arity is wrong, or the
    /// cardinality is violated under an error policy.
    pub fn relate(&mut self, fact: Fact) -> Result<bool> {
        let schema = self.check_relation(&fact.kind, fact.arity())?.clone();
        tracing::trace!(fact = %fact, "relate");
        let table = self
            .relations
            .get_mut(&*schema.name)
            .ok_or_else(|| Error::internal(format!("no table for relation {}", schema.name)))?;
        table.insert(fact, &schema)
    }

    /// Removes a relation fact. Returns true if it was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined or the arity is wrong.
    pub fn unrelate(&mut self, fact: &Fact) -> Result<bool> {
        self.check_relation(&fact.kind, fact.arity())?;
        tracing::trace!(fact = %fact, "unrelate");
        Ok(self
            .relations
            .get_mut(&fact.kind)
            .is_some_and(|t| t.remove(fact)))
    }

    /// Returns true if the fact is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined or the arity is wrong.
    pub fn holds(&self, fact: &Fact) -> Result<bool> {
        self.check_relation(&fact.kind, fact.arity())?;
        Ok(self.relations.get(&fact.kind).is_some_and(|t| t.contains(fact)))
    }

    /// Every extension of `bindings` under which `pattern` is a fact, in
    /// insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined or the arity is wrong.
    pub fn query(&self, pattern: &Pattern, bindings: &Bindings) -> Result<Vec<Bindings>> {
        self.check_relation(&pattern.kind, pattern.arity())?;
        Ok(self
            .relations
            .get(&pattern.kind)
            .map(|t| t.query(pattern, bindings))
            .unwrap_or_default())
    }

    /// The values `var` takes across all matches of `pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined or the arity is wrong.
    pub fn query_values(&self, pattern: &Pattern, var: &str) -> Result<Vec<Value>> {
        Ok(self
            .query(pattern, &Bindings::new())?
            .into_iter()
            .filter_map(|b| b.get(var).cloned())
            .collect())
    }

    /// Iterates a relation's facts in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined.
    pub fn facts(&self, kind: &str) -> Result<impl Iterator<Item = &Fact>> {
        self.relation_schema(kind)?;
        Ok(self.relations.get(kind).into_iter().flat_map(RelationTable::iter))
    }

    /// Route from `from` to `to` along a relation's first→last edges,
    /// endpoints included.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is undefined.
    pub fn path_to(&self, kind: &str, from: &Value, to: &Value) -> Result<Option<Vec<Value>>> {
        self.relation_schema(kind)?;
        Ok(match self.relations.get(kind) {
            Some(table) => table.path_to(from, to),
            None if from == to => Some(vec![from.clone()]),
            None => None,
        })
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Captures the overlay and every relation table.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        let mut overlay: Vec<(Fact, Value)> = self
            .overlay
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        overlay.sort();
        let relations = self
            .relations
            .iter()
            .map(|(kind, table)| RelationSnapshot {
                kind: kind.to_string(),
                facts: table.iter().map(|f| f.args.clone()).collect(),
            })
            .collect();
        WorldSnapshot { overlay, relations }
    }

    /// Rebuilds a world from a snapshot, sharing this world's base and
    /// computed handlers.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot names kinds this base does not
    /// define, or arities disagree.
    pub fn restore(&self, snapshot: WorldSnapshot) -> Result<World> {
        let mut world = World {
            base: Arc::clone(&self.base),
            overlay: im::HashMap::new(),
            relations: self
                .base
                .relations
                .keys()
                .map(|k| (k.clone(), RelationTable::new()))
                .collect(),
        };
        for (key, value) in snapshot.overlay {
            world.check_property(&key)?;
            world.overlay.insert(key, value);
        }
        for relation in snapshot.relations {
            for args in relation.facts {
                world.relate(Fact::new(&relation.kind, args))?;
            }
        }
        Ok(world)
    }

    // =========================================================================
    // Debugging
    // =========================================================================

    /// Renders base values, overlay values, and relations as text.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();

        let mut base: Vec<_> = self.base.values.iter().collect();
        base.sort();
        let _ = writeln!(out, "== base ({}) ==", base.len());
        for (k, v) in base {
            let _ = writeln!(out, "{k} = {v}");
        }

        let mut overlay: Vec<_> = self.overlay.iter().collect();
        overlay.sort();
        let _ = writeln!(out, "== overlay ({}) ==", overlay.len());
        for (k, v) in overlay {
            let _ = writeln!(out, "{k} = {v}");
        }

        let _ = writeln!(out, "== relations ==");
        for (kind, table) in self.relations.iter() {
            let _ = writeln!(out, "{kind} ({})", table.len());
            for fact in table.iter() {
                let _ = writeln!(out, "  {fact}");
            }
        }
        out
    }
}

impl FactSource for World {
    fn property(&self, key: &Fact) -> Result<Value> {
        self.read(key)
    }

    fn is_relation(&self, kind: &str) -> bool {
        self.base.relations.contains_key(kind)
    }

    fn query(&self, pattern: &Pattern, bindings: &Bindings) -> Result<Vec<Bindings>> {
        World::query(self, pattern, bindings)
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("sealed", &self.base.sealed)
            .field("properties", &self.base.properties.len())
            .field("base_values", &self.base.values.len())
            .field("overlay", &self.overlay.len())
            .field("relations", &self.relations.len())
            .finish()
    }
}
