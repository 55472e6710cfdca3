//! Command parser for Fabula.
//!
//! Turns player input like "take lamp" or "put the coin in the box" into
//! actions the engine can run.
//!
//! # Architecture
//!
//! ```text
//! "put coin in box"
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   TOKENIZER     │  → ["put", "coin", "in", "box"]
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ UNDERSTAND      │  → "put/insert [something x] in/into [something y]"
//! │ PATTERNS        │
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ NOUN            │  → x ∈ {coin}, y ∈ {box, shoebox}
//! │ RESOLUTION      │
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ VERIFY          │  → InsertingInto(player, coin, box), or AMBIGUOUS
//! │ RANKING         │
//! └─────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`tokenizer`] - Convert raw input to a token stream
//! - [`grammar`] - Understand-patterns and directions
//! - [`parser`] - The [`CommandParser`] pipeline

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod grammar;
pub mod parser;
pub mod tokenizer;

pub use grammar::{ACTOR_VAR, ARTICLES, Direction, Element, Goal, Grammar, GrammarError, Understand};
pub use parser::{CommandParser, ScopeFn, WORDS_PROPERTY};
pub use tokenizer::{InputToken, InputTokenizer};
