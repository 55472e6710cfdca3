//! Action pipeline and turn contracts for Fabula.
//!
//! This crate provides:
//! - [`ActionKind`] / [`Action`] - Action metadata and instances
//! - [`Rulebook`] - Per-kind verify/before/when/report tables, plus named
//!   activities and actor rules
//! - [`TurnContext`] - What handlers see during a turn; runs actions,
//!   do-first sub-actions, and activities
//! - [`Interrupt`] - Abort, substitution, and fault escapes
//! - [`Io`], [`Narrator`], [`Parser`] - Contracts for the outside world
//! - [`EngineConfig`] - Limits and prompts

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod action;
pub mod config;
pub mod interrupt;
pub mod io;
pub mod narrator;
pub mod parse;
pub mod plausibility;
pub mod rulebook;
pub mod story;
pub mod turn;

pub use action::{Action, ActionKind};
pub use config::EngineConfig;
pub use interrupt::{
    Flow, Interrupt, abort, abort_silently, do_instead, do_instead_quietly, handled, not_handled,
    proceed,
};
pub use io::{Io, ScriptedIo};
pub use narrator::{Article, Narrator, serial_comma};
pub use parse::{Ambiguity, ParseFailure, Parsed, Parser, Verifier};
pub use plausibility::Plausibility;
pub use rulebook::{
    ActivityFn, ActorRuleFn, HandlerResult, Phase, PhaseFn, Pipeline, Rulebook, Scratch, VerifyFn,
    activity, actor_rule, handler, verifier,
};
pub use story::Story;
pub use turn::TurnContext;
