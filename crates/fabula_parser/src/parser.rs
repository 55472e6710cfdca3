//! The command parser.
//!
//! Parsing runs in four steps:
//!
//! 1. Tokenize the input.
//! 2. Match every understand-pattern, trying each split of the input across
//!    noun slots. A noun slot accepts a span when at least one object in
//!    scope carries every non-article word of it.
//! 3. Expand each match into concrete actions and score them with verify.
//! 4. Keep the best. Ties between objects become an [`Ambiguity`].

use std::sync::Arc;

use fabula_engine::{
    Action, Ambiguity, ParseFailure, Parsed, Parser, Plausibility, TurnContext, Verifier,
};
use fabula_foundation::{Bindings, Error, Result, Value};
use fabula_storage::World;

use crate::grammar::{ACTOR_VAR, ARTICLES, Element, Goal, Grammar, Understand};
use crate::tokenizer::{InputToken, InputTokenizer};

/// Lists the objects an actor can refer to.
pub type ScopeFn = Arc<dyn Fn(&World, &Value) -> Result<Vec<Value>> + Send + Sync>;

/// Default property holding an object's vocabulary.
pub const WORDS_PROPERTY: &str = "Words";

/// A pattern-driven [`Parser`].
pub struct CommandParser {
    grammar: Grammar,
    scope: ScopeFn,
    words_property: Arc<str>,
}

impl std::fmt::Debug for CommandParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandParser")
            .field("grammar", &self.grammar)
            .field("words_property", &self.words_property)
            .finish_non_exhaustive()
    }
}

impl CommandParser {
    /// Creates a parser over a grammar and a scope.
    pub fn new<F>(grammar: Grammar, scope: F) -> Self
    where
        F: Fn(&World, &Value) -> Result<Vec<Value>> + Send + Sync + 'static,
    {
        Self {
            grammar,
            scope: Arc::new(scope),
            words_property: Arc::from(WORDS_PROPERTY),
        }
    }

    /// Reads object vocabulary from a different property.
    #[must_use]
    pub fn with_words_property(mut self, name: &str) -> Self {
        self.words_property = Arc::from(name);
        self
    }

    /// The grammar.
    #[must_use]
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    fn lexicon(&self, world: &World, actor: &Value) -> Result<Lexicon> {
        let mut entries = Vec::new();
        for object in (self.scope)(world, actor)? {
            let words = world.get(&self.words_property, [object.clone()])?;
            entries.push((object, vocabulary(&words)));
        }
        Ok(Lexicon { entries })
    }

    fn unknown_word<'w>(&self, tokens: &'w [InputToken], lexicon: &Lexicon) -> Option<&'w str> {
        tokens
            .iter()
            .filter_map(InputToken::as_word)
            .find(|w| !self.grammar.knows_word(w) && !lexicon.knows(w))
    }

    fn candidates(
        &self,
        tokens: &[InputToken],
        lexicon: &Lexicon,
        actor: &Value,
    ) -> Result<Vec<Candidate>> {
        let mut out: Vec<Candidate> = Vec::new();
        for (index, rule) in self.grammar.rules().iter().enumerate() {
            let mut fills = Vec::new();
            self.match_elements(rule.elements(), tokens, lexicon, &mut Vec::new(), &mut fills);
            for fill in fills {
                for bindings in expand(&fill, actor) {
                    let action = instantiate(rule, &bindings)?;
                    if out.iter().all(|c| c.action != action) {
                        out.push(Candidate {
                            rule: index,
                            bindings,
                            action,
                            score: Plausibility::Logical,
                        });
                    }
                }
            }
        }
        Ok(out)
    }

    fn match_elements(
        &self,
        elements: &[Element],
        tokens: &[InputToken],
        lexicon: &Lexicon,
        fill: &mut Vec<(Arc<str>, Vec<Value>)>,
        out: &mut Vec<Vec<(Arc<str>, Vec<Value>)>>,
    ) {
        let Some((element, rest)) = elements.split_first() else {
            if tokens.is_empty() {
                out.push(fill.clone());
            }
            return;
        };
        match element {
            Element::Words(alternatives) => {
                if let Some(word) = tokens.first().and_then(InputToken::as_word) {
                    if alternatives.iter().any(|a| &**a == word) {
                        self.match_elements(rest, &tokens[1..], lexicon, fill, out);
                    }
                }
            }
            Element::Slot { goal, var } => {
                for len in 1..=tokens.len() {
                    let Some(values) = self.fill_slot(*goal, &tokens[..len], lexicon) else {
                        continue;
                    };
                    fill.push((var.clone(), values));
                    self.match_elements(rest, &tokens[len..], lexicon, fill, out);
                    fill.pop();
                }
            }
        }
    }

    fn fill_slot(&self, goal: Goal, span: &[InputToken], lexicon: &Lexicon) -> Option<Vec<Value>> {
        match goal {
            Goal::Text => match span {
                [InputToken::Quoted(text)] => Some(vec![Value::text(text)]),
                _ => None,
            },
            Goal::Direction => {
                let words = span.iter().map(InputToken::as_word).collect::<Option<Vec<_>>>()?;
                self.grammar.resolve_direction(&words).map(|d| vec![d])
            }
            Goal::Something => {
                let words = span.iter().map(InputToken::as_word).collect::<Option<Vec<_>>>()?;
                let objects = lexicon.objects_named(&words);
                (!objects.is_empty()).then_some(objects)
            }
        }
    }
}

impl Parser for CommandParser {
    fn handle_all(
        &self,
        input: &str,
        cx: &TurnContext<'_>,
        verify: Verifier<'_>,
    ) -> std::result::Result<Parsed, ParseFailure> {
        let tokens = InputTokenizer::tokenize(input);
        if tokens.is_empty() {
            return Err(ParseFailure::NoInput);
        }
        let lexicon = self.lexicon(cx.world(), cx.actor())?;
        let mut candidates = self.candidates(&tokens, &lexicon, cx.actor())?;
        if candidates.is_empty() {
            return Err(match self.unknown_word(&tokens, &lexicon) {
                Some(word) => ParseFailure::NoSuchWord(word.to_string()),
                None => ParseFailure::NoUnderstand,
            });
        }
        for candidate in &mut candidates {
            candidate.score = verify(&candidate.action)?;
        }
        tracing::debug!(input, candidates = candidates.len(), "parsed");
        choose(&self.grammar, candidates)
    }

    fn run_parser(
        &self,
        goal: &str,
        input: &str,
        cx: &TurnContext<'_>,
    ) -> Result<Vec<(Value, i64)>> {
        let goal = Goal::from_name(goal)
            .ok_or_else(|| Error::internal(format!("unknown parser goal {goal}")))?;
        let words = InputTokenizer::words(input);
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        let results = match goal {
            Goal::Something => {
                let lexicon = self.lexicon(cx.world(), cx.actor())?;
                let weight = i64::try_from(content_words(&words).len()).unwrap_or(i64::MAX);
                lexicon
                    .objects_named(&words)
                    .into_iter()
                    .map(|object| (object, weight))
                    .collect()
            }
            Goal::Direction => self
                .grammar
                .resolve_direction(&words)
                .map(|d| (d, 1))
                .into_iter()
                .collect(),
            Goal::Text => vec![(Value::text(input.trim()), 1)],
        };
        Ok(results)
    }
}

// =============================================================================
// Ranking
// =============================================================================

#[derive(Debug)]
struct Candidate {
    rule: usize,
    bindings: Bindings,
    action: Action,
    score: Plausibility,
}

fn choose(
    grammar: &Grammar,
    candidates: Vec<Candidate>,
) -> std::result::Result<Parsed, ParseFailure> {
    let plausible = candidates.iter().filter(|c| !c.score.is_illogical()).count();
    let best = candidates.iter().map(|c| c.score.rank()).max().unwrap_or_default();
    let mut top: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| c.score.rank() == best)
        .collect();

    // Nothing makes sense; run the first reading so its reason is narrated.
    if plausible == 0 || top.len() == 1 {
        let first = top.swap_remove(0);
        return Ok(Parsed {
            action: first.action,
            disambiguated: plausible > 1,
        });
    }

    let rule = top[0].rule;
    top.retain(|c| c.rule == rule);
    if top.len() == 1 {
        let only = top.swap_remove(0);
        return Ok(Parsed {
            action: only.action,
            disambiguated: true,
        });
    }

    let understand = &grammar.rules()[rule];
    let mut fixed = Bindings::new();
    let mut options = Vec::new();
    for var in slot_vars(understand) {
        let mut values: Vec<Value> = Vec::new();
        for candidate in &top {
            if let Some(value) = candidate.bindings.get(var) {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
        }
        match values.len() {
            0 => {}
            1 => fixed.set(var, values.swap_remove(0)),
            _ => options.push((Arc::from(var), values)),
        }
    }
    if let Some(actor) = top[0].bindings.get(ACTOR_VAR) {
        fixed.set(ACTOR_VAR, actor.clone());
    }
    tracing::debug!(pattern = %understand.template(), open = options.len(), "ambiguous");
    Err(ParseFailure::Ambiguous(Ambiguity {
        pattern: understand.template().substitute(&fixed),
        options,
    }))
}

fn slot_vars(rule: &Understand) -> impl Iterator<Item = &str> {
    rule.elements().iter().filter_map(|e| match e {
        Element::Slot { var, .. } => Some(&**var),
        Element::Words(_) => None,
    })
}

fn expand(fill: &[(Arc<str>, Vec<Value>)], actor: &Value) -> Vec<Bindings> {
    let mut combos = vec![Bindings::new().with(ACTOR_VAR, actor.clone())];
    for (var, values) in fill {
        let next: Vec<Bindings> = combos
            .iter()
            .flat_map(|b| values.iter().map(move |v| b.with(var.clone(), v.clone())))
            .collect();
        combos = next;
    }
    combos
}

fn instantiate(rule: &Understand, bindings: &Bindings) -> Result<Action> {
    rule.template()
        .ground(bindings)
        .map(Action::from)
        .ok_or_else(|| {
            Error::internal(format!(
                "understand-pattern {:?} left a variable open",
                rule.source()
            ))
        })
}

// =============================================================================
// Lexicon
// =============================================================================

/// The in-scope objects and their words, built once per parse.
struct Lexicon {
    entries: Vec<(Value, Vec<String>)>,
}

impl Lexicon {
    fn knows(&self, word: &str) -> bool {
        self.entries.iter().any(|(_, words)| words.iter().any(|w| w == word))
    }

    fn objects_named(&self, words: &[&str]) -> Vec<Value> {
        let wanted = content_words(words);
        if wanted.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|(_, known)| wanted.iter().all(|w| known.iter().any(|k| k == w)))
            .map(|(object, _)| object.clone())
            .collect()
    }
}

fn content_words<'a>(words: &[&'a str]) -> Vec<&'a str> {
    words.iter().copied().filter(|w| !ARTICLES.contains(w)).collect()
}

/// Normalizes a words property: a list of texts, or one space-separated text.
fn vocabulary(words: &Value) -> Vec<String> {
    match words {
        Value::Text(text) => text.split_whitespace().map(str::to_lowercase).collect(),
        Value::List(items) => items
            .iter()
            .filter_map(Value::as_text)
            .flat_map(str::split_whitespace)
            .map(str::to_lowercase)
            .collect(),
        _ => Vec::new(),
    }
}
