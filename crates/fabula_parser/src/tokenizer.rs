//! Input tokenization.
//!
//! Converts raw player input into a stream of tokens.

/// A token from player input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputToken {
    /// A lowercase word
    Word(String),
    /// A quoted string (preserved as-is)
    Quoted(String),
}

impl InputToken {
    /// The word, if this is one.
    #[must_use]
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Self::Word(w) => Some(w),
            Self::Quoted(_) => None,
        }
    }
}

/// Tokenizes player input.
pub struct InputTokenizer;

impl InputTokenizer {
    /// Tokenizes a raw input string.
    ///
    /// - Converts words to lowercase
    /// - Strips punctuation (except within quotes)
    /// - Preserves quoted strings as atomic units; an unterminated quote
    ///   runs to the end of input
    #[must_use]
    pub fn tokenize(input: &str) -> Vec<InputToken> {
        let mut tokens = Vec::new();
        let mut word = String::new();
        let mut chars = input.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '"' => {
                    flush(&mut word, &mut tokens);
                    let quoted: String = chars.by_ref().take_while(|&c| c != '"').collect();
                    tokens.push(InputToken::Quoted(quoted));
                }
                c if c.is_whitespace() => flush(&mut word, &mut tokens),
                '.' | ',' | '!' | '?' | ';' | ':' | '\'' => {}
                c => word.extend(c.to_lowercase()),
            }
        }
        flush(&mut word, &mut tokens);
        tokens
    }

    /// Just the words of an input, dropping quoted strings.
    #[must_use]
    pub fn words(input: &str) -> Vec<String> {
        Self::tokenize(input)
            .into_iter()
            .filter_map(|t| match t {
                InputToken::Word(w) => Some(w),
                InputToken::Quoted(_) => None,
            })
            .collect()
    }
}

fn flush(word: &mut String, tokens: &mut Vec<InputToken>) {
    if !word.is_empty() {
        tokens.push(InputToken::Word(std::mem::take(word)));
    }
}
