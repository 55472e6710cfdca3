//! Guarded rule tables and activity tables for Fabula.
//!
//! This crate provides the dispatch core:
//! - [`RuleTable`] - Ordered, guard-matched handlers; the last answer wins
//! - [`ActivityTable`] - Ordered, unguarded handlers combined by an [`Accumulator`]
//! - [`Outcome`] - What a single handler invocation produced
//! - [`Dispatch`] - How a caller supplies facts and invokes its handler type
//!
//! Tables are generic over the handler type. The world store keeps computed
//! properties in a `RuleTable`, and the action pipeline keeps its four phases
//! in them, each with its own handler signature.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod activity;
pub mod outcome;
pub mod placement;
pub mod table;

pub use activity::{Accumulator, Activity, ActivityTable};
pub use outcome::{Collected, Outcome};
pub use placement::Placement;
pub use table::{Dispatch, Rule, RuleTable};
