//! Core data access for recipebook.
//! Maps the recipe aggregate onto a document collection.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use config::{ConfigError, RecipebookConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::object_id::{ObjectId, ObjectIdError};
pub use model::recipe::{Ingredient, Recipe, Step};
pub use repo::recipe_repo::{
    DocumentRecipeRepository, RecipeRepository, RepoError, RepoOp, RepoResult, RECIPES_COLLECTION,
};
pub use store::{
    CancelFlag, ContextError, DocumentCollection, OpContext, SqliteCollection, StoreError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
