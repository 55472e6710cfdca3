//! The narration templating contract.

use fabula_foundation::{Bindings, Result, Value};
use fabula_storage::World;

/// How an object's name is introduced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Article {
    /// `the lamp`
    Definite,
    /// `The lamp`
    DefiniteCapitalized,
    /// `a lamp`
    Indefinite,
    /// `lamp`
    Bare,
}

/// Turns values and templates into prose.
///
/// Rendering is pure: it reads the world and never writes it.
pub trait Narrator: Send + Sync {
    /// Names a value with the given article.
    ///
    /// # Errors
    ///
    /// Returns an error if a naming property cannot be read.
    fn name(&self, world: &World, value: &Value, article: Article) -> Result<String>;

    /// Substitutes bound objects into a template.
    ///
    /// # Errors
    ///
    /// Returns an error if a naming property cannot be read.
    fn render(&self, world: &World, template: &str, objects: &Bindings) -> Result<String>;
}

/// Joins items with commas and a final conjunction: `a, b, or c`.
#[must_use]
pub fn serial_comma(items: &[String], conjunction: &str) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{a} {conjunction} {b}"),
        [init @ .., last] => format!("{}, {conjunction} {last}", init.join(", ")),
    }
}
