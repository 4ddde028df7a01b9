//! Domain records exposed by core.
//!
//! # Invariants
//! - A `Repo` is identified by its name; names are unique per store.
//! - Records are immutable once created.

pub mod repo;
