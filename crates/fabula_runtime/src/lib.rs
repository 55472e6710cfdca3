//! Turn loop, terminal I/O, snapshots, and CLI for Fabula.
//!
//! This crate provides:
//! - [`Session`] and the [`Context`] trampoline - Reading input, running
//!   turns with rollback on faults, and modal disambiguation
//! - [`TerminalIo`] / [`ScriptIo`] - Interactive and scripted sinks
//! - [`serialize`] - Snapshot files in `MessagePack`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod context;
pub mod serialize;
pub mod terminal;

pub use context::{ActiveTurn, Carry, Context, Disambiguation, Session, drive};
pub use terminal::{ScriptIo, TerminalIo, vocabulary};
