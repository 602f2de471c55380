//! Core types, constants, configuration, and logging for the henhouse
//! contest engine.
//!
//! ## Identity
//!
//! - [`ID`] — Generic, type-safe identifier over `uuid::Uuid`
//! - [`Unique`] — Trait exposing a typed `ID<Self>` for an entity
//!
//! ## Domain model
//!
//! - [`model`] — `Category`, `Task`, `Team`, `Submission`, `ScoreSnapshot`,
//!   `Session` (spec.md §3)
//!
//! ## Configuration
//!
//! - [`config`] — Typed representation of the TOML fields in spec.md §6
//!
//! ## Runtime utilities
//!
//! - [`logging::log`] / [`logging::kys`] — dual logging + interrupt handling
#![allow(dead_code)]

mod id;
pub mod model;

pub mod config;
#[cfg(feature = "server")]
pub mod logging;

pub use id::Unique;
pub use id::ID;

pub use model::Category;
pub use model::Language;
pub use model::PatternError;
pub use model::ScoreSnapshot;
pub use model::Session;
pub use model::Submission;
pub use model::Task;
pub use model::Team;

/// Monetary value of a solved task, summed into a team's score.
pub type Price = i64;
