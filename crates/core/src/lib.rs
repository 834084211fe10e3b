//! Core business logic for the reactions service.
//!
//! The [`ReactionRegistry`] is built once at startup and shared with the
//! services. [`ReactionService`] is the only writer of reaction rows and
//! their counts; [`MigrationService`] feeds legacy favorites through it.

pub mod services;

pub use services::*;
