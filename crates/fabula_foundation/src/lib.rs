//! Values, patterns, unification, and guards for Fabula.
//!
//! This crate provides:
//! - [`Value`] - The value type stored in properties, relations, and action roles
//! - [`Pattern`] / [`Fact`] - Tagged values with and without logic variables
//! - [`Bindings`] - Variable bindings produced by unification
//! - [`Guard`] - Boolean pattern expressions evaluated over a [`FactSource`]
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod bindings;
pub mod error;
pub mod guard;
pub mod pattern;
pub mod value;

pub use bindings::Bindings;
pub use error::{Error, ErrorContext, ErrorKind, SemanticLimit};
pub use guard::{Expr, FactSource, Guard};
pub use pattern::{Fact, Pattern, Term, unify_args, val, var};
pub use value::{ObjectId, Value};

/// Result type alias using Fabula's error type.
pub type Result<T> = std::result::Result<T, Error>;
