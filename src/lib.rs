//! Fabula - Rule-driven interactive fiction
//!
//! This crate re-exports all layers of the Fabula system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: fabula_runtime    - Turn loop, disambiguation, terminal, save/restore
//! Layer 3: fabula_parser     - Tokenizer, understand-grammar, command parser
//!          fabula_stdlib     - World model, basic actions, narrator, demo story
//! Layer 2: fabula_engine     - Actions, rulebook, turn context, plausibility
//! Layer 1: fabula_rules      - Ordered rule tables, activities, placement
//!          fabula_storage    - Schema, property overlay, relations, snapshots
//! Layer 0: fabula_foundation - Values, patterns, bindings, guards, errors
//! ```

pub use fabula_engine as engine;
pub use fabula_foundation as foundation;
pub use fabula_parser as parser;
pub use fabula_rules as rules;
pub use fabula_runtime as runtime;
pub use fabula_stdlib as stdlib;
pub use fabula_storage as storage;
