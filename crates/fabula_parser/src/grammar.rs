//! Understand-patterns and directions.
//!
//! A grammar maps surface patterns such as `"put/insert [something x] in/into
//! [something y]"` to action templates such as `InsertingInto(actor, x, y)`.
//! Literal positions list `/`-separated alternatives; bracketed slots name a
//! goal and the template variable the slot fills. The variable `actor` is
//! always bound to the acting object.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use fabula_foundation::{Error, Pattern, Value};
use thiserror::Error;

/// Template variable bound to the actor.
pub const ACTOR_VAR: &str = "actor";

/// Words that never count toward a noun phrase.
pub const ARTICLES: &[&str] = &["the", "a", "an", "some"];

/// Errors in an understand-pattern.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// The pattern has no elements.
    #[error("empty understand-pattern")]
    Empty,

    /// A `[` without its `]`.
    #[error("unclosed slot in {0:?}")]
    UnclosedSlot(String),

    /// A slot that is not `[goal var]`.
    #[error("malformed slot [{0}]")]
    MalformedSlot(String),

    /// A slot goal the parser does not know.
    #[error("unknown goal {0:?}")]
    UnknownGoal(String),

    /// A template variable no slot fills.
    #[error("variable {var} in {pattern:?} is never filled")]
    Unfilled {
        /// The understand-pattern.
        pattern: String,
        /// The template variable.
        var: String,
    },
}

impl From<GrammarError> for Error {
    fn from(err: GrammarError) -> Self {
        match err {
            GrammarError::Unfilled { var, .. } => Error::unbound_variable(var),
            other => Error::internal(other.to_string()),
        }
    }
}

/// What a slot accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Goal {
    /// A noun phrase naming an object.
    Something,
    /// A direction word.
    Direction,
    /// A quoted string.
    Text,
}

impl Goal {
    /// The goal's name in patterns.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Something => "something",
            Self::Direction => "direction",
            Self::Text => "text",
        }
    }

    /// Parses a goal name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "something" => Some(Self::Something),
            "direction" => Some(Self::Direction),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One position of an understand-pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Element {
    /// One of several literal words.
    Words(Vec<Arc<str>>),
    /// A slot filled by the parser.
    Slot {
        /// What the slot accepts.
        goal: Goal,
        /// The template variable it binds.
        var: Arc<str>,
    },
}

/// A compiled understand-pattern and its action template.
#[derive(Clone, Debug, PartialEq)]
pub struct Understand {
    source: Arc<str>,
    elements: Vec<Element>,
    template: Pattern,
}

impl Understand {
    /// Compiles a pattern against its template.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarError`] if the pattern is malformed or a template
    /// variable other than `actor` is filled by no slot.
    pub fn compile(source: &str, template: Pattern) -> Result<Self, GrammarError> {
        let elements = compile_elements(source)?;
        if elements.is_empty() {
            return Err(GrammarError::Empty);
        }
        let filled: BTreeSet<&str> = elements
            .iter()
            .filter_map(|e| match e {
                Element::Slot { var, .. } => Some(&**var),
                Element::Words(_) => None,
            })
            .chain([ACTOR_VAR])
            .collect();
        if let Some(var) = template.variables().find(|v| !filled.contains(v)) {
            return Err(GrammarError::Unfilled {
                pattern: source.to_string(),
                var: var.to_string(),
            });
        }
        Ok(Self {
            source: Arc::from(source),
            elements,
            template,
        })
    }

    /// The pattern text as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compiled elements, in order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// The action template.
    #[must_use]
    pub fn template(&self) -> &Pattern {
        &self.template
    }
}

fn compile_elements(source: &str) -> Result<Vec<Element>, GrammarError> {
    let mut elements = Vec::new();
    let mut rest = source.trim_start();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('[') {
            let Some(end) = after.find(']') else {
                return Err(GrammarError::UnclosedSlot(source.to_string()));
            };
            let inner = &after[..end];
            let mut parts = inner.split_whitespace();
            let (Some(goal), Some(var), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(GrammarError::MalformedSlot(inner.to_string()));
            };
            let goal = Goal::from_name(goal)
                .ok_or_else(|| GrammarError::UnknownGoal(goal.to_string()))?;
            elements.push(Element::Slot {
                goal,
                var: Arc::from(var),
            });
            rest = &after[end + 1..];
        } else {
            let end = rest.find(|c: char| c.is_whitespace() || c == '[').unwrap_or(rest.len());
            let alternatives = rest[..end]
                .split('/')
                .filter(|w| !w.is_empty())
                .map(|w| Arc::from(w.to_lowercase()))
                .collect();
            elements.push(Element::Words(alternatives));
            rest = &rest[end..];
        }
        rest = rest.trim_start();
    }
    Ok(elements)
}

/// A direction and the words that name it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Direction {
    /// Canonical name, e.g. `north`.
    pub name: Arc<str>,
    /// Other words, e.g. `n`.
    pub synonyms: Vec<Arc<str>>,
}

/// The full set of understand-patterns and directions.
#[derive(Clone, Debug, Default)]
pub struct Grammar {
    rules: Vec<Understand>,
    directions: Vec<Direction>,
    known: BTreeSet<Arc<str>>,
}

impl Grammar {
    /// Creates an empty grammar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an understand-pattern for an action template.
    ///
    /// # Errors
    ///
    /// See [`Understand::compile`].
    pub fn understand(&mut self, pattern: &str, template: Pattern) -> Result<(), GrammarError> {
        let rule = Understand::compile(pattern, template)?;
        for element in &rule.elements {
            if let Element::Words(words) = element {
                self.known.extend(words.iter().cloned());
            }
        }
        tracing::trace!(pattern, action = %rule.template.kind, "understand");
        self.rules.push(rule);
        Ok(())
    }

    /// Adds a direction with its synonyms.
    pub fn direction(&mut self, name: &str, synonyms: &[&str]) {
        let name: Arc<str> = Arc::from(name.to_lowercase());
        let synonyms: Vec<Arc<str>> = synonyms
            .iter()
            .map(|s| Arc::from(s.to_lowercase()))
            .collect();
        self.known.insert(name.clone());
        self.known.extend(synonyms.iter().cloned());
        self.directions.push(Direction { name, synonyms });
    }

    /// Every understand-pattern, in the order added.
    #[must_use]
    pub fn rules(&self) -> &[Understand] {
        &self.rules
    }

    /// Every direction, in the order added.
    #[must_use]
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// Returns true if the grammar itself uses this word.
    #[must_use]
    pub fn knows_word(&self, word: &str) -> bool {
        self.known.contains(word) || ARTICLES.contains(&word)
    }

    /// The direction named by exactly these words, as a text value.
    #[must_use]
    pub fn resolve_direction(&self, words: &[&str]) -> Option<Value> {
        let [word] = words else { return None };
        self.directions
            .iter()
            .find(|d| &*d.name == *word || d.synonyms.iter().any(|s| &**s == *word))
            .map(|d| Value::text(&d.name))
    }
}
