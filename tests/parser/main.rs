//! Parser integration tests
//!
//! Tests for reading player commands against a live world.

mod commands;
mod grammars;
