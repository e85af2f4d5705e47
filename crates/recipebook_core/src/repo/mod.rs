//! Repository layer over document collections.
//!
//! # Responsibility
//! - Define use-case oriented recipe data access contracts.
//! - Keep document encoding and identifier translation out of callers.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `InvalidIdentifier`)
//!   distinct from storage transport errors.

pub mod recipe_repo;
