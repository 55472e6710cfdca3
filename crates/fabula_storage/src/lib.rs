//! Relational world store for Fabula.
//!
//! This crate provides:
//! - [`World`] - Property table with an overlay over a frozen base, plus relations
//! - [`PropertySchema`] / [`RelationSchema`] - Kind declarations checked on every access
//! - [`RelationTable`] - Ordered fact sets with cardinality and path queries
//! - [`WorldSnapshot`] - The mutable session state, restorable against the same base
//!
//! A world is built, sealed, and then only its overlay and relations change.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod property;
pub mod relation;
pub mod schema;
pub mod snapshot;
pub mod world;

pub use property::{ComputeFn, Resolved, Tier, computed};
pub use relation::RelationTable;
pub use schema::{Cardinality, OnViolation, PropertySchema, RelationSchema};
pub use snapshot::{RelationSnapshot, WorldSnapshot};
pub use world::World;
