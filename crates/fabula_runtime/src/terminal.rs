//! Terminal I/O sinks.
//!
//! [`TerminalIo`] reads with rustyline, completing words the grammar
//! knows, and prints narration to stdout. [`ScriptIo`] replays commands
//! from a file and echoes them after the prompt, for non-interactive runs.

use std::borrow::Cow;
use std::collections::VecDeque;

use fabula_engine::Io;
use fabula_foundation::{Error, ErrorKind, Result};
use fabula_parser::{Element, Grammar};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::{Completer, Config, Context, Editor, Helper, Hinter, Validator};

/// Every literal word and direction in a grammar, sorted and deduplicated.
#[must_use]
pub fn vocabulary(grammar: &Grammar) -> Vec<String> {
    let mut words: Vec<String> = grammar
        .rules()
        .iter()
        .flat_map(|rule| rule.elements())
        .filter_map(|element| match element {
            Element::Words(alternatives) => Some(
                alternatives
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
            ),
            Element::Slot { .. } => None,
        })
        .flatten()
        .chain(grammar.directions().iter().map(|d| d.name.to_string()))
        .collect();
    words.sort();
    words.dedup();
    words
}

/// Completes the word under the cursor from a fixed vocabulary.
struct WordCompleter {
    words: Vec<String>,
}

impl Completer for WordCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos].rfind(char::is_whitespace).map_or(0, |i| i + 1);
        let word = line[start..pos].to_lowercase();
        let candidates = self
            .words
            .iter()
            .filter(|w| w.starts_with(&word))
            .map(|w| Pair {
                display: w.clone(),
                replacement: w.clone(),
            })
            .collect();
        Ok((start, candidates))
    }
}

#[derive(Helper, Completer, Hinter, Validator)]
struct FabulaHelper {
    #[rustyline(Completer)]
    completer: WordCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
}

impl Highlighter for FabulaHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Cow::Owned(format!("\x1b[1;32m{prompt}\x1b[0m"))
        } else {
            Cow::Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{hint}\x1b[0m"))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        false
    }
}

/// Interactive play on a terminal.
pub struct TerminalIo {
    editor: Editor<FabulaHelper, DefaultHistory>,
}

impl TerminalIo {
    /// Creates a terminal sink that completes `words`.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be initialized.
    pub fn new(words: Vec<String>) -> Result<Self> {
        let config = Config::builder()
            .auto_add_history(false)
            .max_history_size(1000)
            .map_err(|e| Error::new(ErrorKind::Io(e.to_string())))?
            .build();
        let helper = FabulaHelper {
            completer: WordCompleter { words },
            hinter: HistoryHinter::new(),
        };
        let mut editor = Editor::with_config(config)
            .map_err(|e| Error::new(ErrorKind::Io(e.to_string())))?;
        editor.set_helper(Some(helper));
        Ok(Self { editor })
    }
}

impl Io for TerminalIo {
    fn write(&mut self, fragments: &[&str]) {
        println!("{}", fragments.join(" "));
    }

    fn get_input(&mut self, prompt: Option<&str>) -> Option<String> {
        let prompt = prompt.map_or_else(String::new, |p| format!("{p} "));
        match self.editor.readline(&prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Some(line)
            }
            // Ctrl+C abandons the line, not the game.
            Err(ReadlineError::Interrupted) => Some(String::new()),
            Err(ReadlineError::Eof) => None,
            Err(e) => {
                tracing::error!(error = %e, "terminal read failed");
                None
            }
        }
    }
}

/// Commands from a script, narration to stdout.
#[derive(Debug, Default)]
pub struct ScriptIo {
    lines: VecDeque<String>,
}

impl ScriptIo {
    /// Creates a sink over the non-blank lines of `script`. Lines starting
    /// with `#` are comments.
    #[must_use]
    pub fn new(script: &str) -> Self {
        Self {
            lines: script
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(String::from)
                .collect(),
        }
    }

    /// Commands not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl Io for ScriptIo {
    fn write(&mut self, fragments: &[&str]) {
        println!("{}", fragments.join(" "));
    }

    fn get_input(&mut self, prompt: Option<&str>) -> Option<String> {
        let line = self.lines.pop_front()?;
        println!("{} {line}", prompt.unwrap_or_default());
        Some(line)
    }
}
