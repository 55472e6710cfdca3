//! Template narration over the naming properties.
//!
//! Templates embed bracketed references to bound values:
//!
//! | Form          | Renders as                      |
//! |---------------|---------------------------------|
//! | `[the $x]`    | `DefiniteName(x)`               |
//! | `[The $x]`    | `DefiniteName(x)`, capitalized  |
//! | `[a $x]`      | `IndefiniteName(x)`             |
//! | `[A $x]`      | `IndefiniteName(x)`, capitalized|
//! | `[$x]`        | `Name(x)`                       |
//!
//! Anything else in brackets is copied through untouched.

use fabula_engine::{Article, Narrator, serial_comma};
use fabula_foundation::{Bindings, Error, Result, Value};
use fabula_storage::World;

/// The standard narrator.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateNarrator;

impl TemplateNarrator {
    /// Creates the narrator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Narrator for TemplateNarrator {
    fn name(&self, world: &World, value: &Value, article: Article) -> Result<String> {
        match value {
            Value::Object(_) => {
                let property = match article {
                    Article::Definite | Article::DefiniteCapitalized => "DefiniteName",
                    Article::Indefinite => "IndefiniteName",
                    Article::Bare => "Name",
                };
                let name = match world.get(property, [value.clone()])? {
                    Value::Text(s) => s.to_string(),
                    other => other.to_string(),
                };
                Ok(if article == Article::DefiniteCapitalized {
                    capitalize(&name)
                } else {
                    name
                })
            }
            Value::List(items) => {
                let names = items
                    .iter()
                    .map(|v| self.name(world, v, article))
                    .collect::<Result<Vec<_>>>()?;
                Ok(serial_comma(&names, "and"))
            }
            Value::Text(s) => Ok(s.to_string()),
            Value::Nil => Ok(String::new()),
            other => Ok(other.to_string()),
        }
    }

    fn render(&self, world: &World, template: &str, objects: &Bindings) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('[') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find(']') else {
                out.push_str(&rest[start..]);
                return Ok(out);
            };
            let inner = &after[..end];
            match reference(inner) {
                Some((var, article, capital)) => {
                    let value = objects.get(var).ok_or_else(|| Error::unbound_variable(var))?;
                    let name = self.name(world, value, article)?;
                    out.push_str(&if capital { capitalize(&name) } else { name });
                }
                None => {
                    out.push('[');
                    out.push_str(inner);
                    out.push(']');
                }
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Parses the inside of a bracket: the variable, its article, and whether
/// the result is capitalized afterwards.
fn reference(inner: &str) -> Option<(&str, Article, bool)> {
    let mut words = inner.split_whitespace();
    let (first, second, rest) = (words.next()?, words.next(), words.next());
    if rest.is_some() {
        return None;
    }
    let (article, capital, var) = match (first, second) {
        (v, None) => (Article::Bare, false, v),
        ("the", Some(v)) => (Article::Definite, false, v),
        ("The", Some(v)) => (Article::DefiniteCapitalized, false, v),
        ("a" | "an", Some(v)) => (Article::Indefinite, false, v),
        ("A" | "An", Some(v)) => (Article::Indefinite, true, v),
        _ => return None,
    };
    let var = var.strip_prefix('$')?;
    (!var.is_empty()).then_some((var, article, capital))
}

/// Uppercases the first character.
#[must_use]
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
