//! Recipe domain model.
//!
//! # Responsibility
//! - Define the recipe aggregate (`Recipe` -> `Ingredient`/`Step`).
//! - Define the storage-native identifier and its hex translation.
//!
//! # Invariants
//! - Nested ingredients/steps exist only inside their owning recipe.
//! - External ids are the lowercase hex form of `ObjectId`.

pub mod object_id;
pub mod recipe;
