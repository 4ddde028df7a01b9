//! Repository layer over the region abstraction.
//!
//! # Responsibility
//! - Define the `Repos` collection contract consumed by callers.
//! - Map region items to domain records and region failures to
//!   repository errors.
//!
//! # Invariants
//! - Writes validate names before any region call.
//! - Lookups return semantic errors (`NotFound`, `AlreadyExists`) rather
//!   than leaking iterator or storage details.

pub mod repos;
