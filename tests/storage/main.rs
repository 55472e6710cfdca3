//! Integration tests for Layer 1: Storage
//!
//! Tests for the world lifecycle, the property lookup chain, relations, and
//! snapshots.

mod relations;
mod snapshots;
