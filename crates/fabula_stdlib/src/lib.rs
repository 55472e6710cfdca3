//! Standard library for Fabula stories.
//!
//! This crate provides:
//! - [`model`] - Kinds, containment relations, and the computed spatial
//!   properties (location, visibility, reach)
//! - [`activities`] - Moving things around and describing what an actor
//!   perceives
//! - [`actions`] - The basic actions (taking, going, opening, ...) with
//!   their verify, before, when, and report rules
//! - [`grammar`] - Understand-patterns for those actions
//! - [`narrator`] - The [`TemplateNarrator`]
//! - [`demo`] - A two-room story for play-testing
//!
//! A story starts from [`demo::empty_world`] and [`demo::rulebook`], adds
//! its own objects and rules, and bundles them with [`demo::story_from`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod actions;
pub mod activities;
pub mod demo;
pub mod grammar;
pub mod model;
pub mod narrator;

pub use grammar::standard_grammar;
pub use narrator::{TemplateNarrator, capitalize};
