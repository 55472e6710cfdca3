//! End-to-end tests
//!
//! Typed commands in, narration out, through a full session on the demo
//! story.

mod persistence;
