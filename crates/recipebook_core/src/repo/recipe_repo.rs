//! Recipe repository contract and document-collection implementation.
//!
//! # Responsibility
//! - Provide create/get/get_all/update/delete over one recipe collection.
//! - Translate between `Recipe` values and stored documents, including the
//!   hex <-> `ObjectId` identifier mapping.
//!
//! # Invariants
//! - The id never appears inside the document body; it is the storage key.
//! - `update` overwrites every recipe field (replace, not merge).
//! - Not-found is decided from storage counts, never from a pre-read.
//! - No operation retries; each maps to exactly one collection primitive.

use crate::model::object_id::{ObjectId, ObjectIdError};
use crate::model::recipe::{Ingredient, Recipe, Step};
use crate::store::{Document, DocumentCollection, OpContext, StoreError, StoredDocument};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Default collection name for recipe documents.
pub const RECIPES_COLLECTION: &str = "recipes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository operation, attached to every error for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoOp {
    Create,
    Get,
    GetAll,
    Update,
    Delete,
}

impl RepoOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Get => "get",
            Self::GetAll => "get_all",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl Display for RepoOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of recipe repository failures.
#[derive(Debug)]
pub enum RepoError {
    /// Caller-supplied id is not a 24-char hex identifier.
    InvalidIdentifier {
        op: RepoOp,
        id: String,
        source: ObjectIdError,
    },
    /// No document exists for a well-formed id.
    NotFound { op: RepoOp, id: String },
    /// Storage failed while reading or decoding documents.
    StorageRead {
        op: RepoOp,
        id: Option<String>,
        source: StoreError,
    },
    /// Storage failed while writing documents.
    StorageWrite {
        op: RepoOp,
        id: Option<String>,
        source: StoreError,
    },
    /// Storage assigned a key that has no hex form.
    IdentifierFormat { op: RepoOp, source: ObjectIdError },
}

impl RepoError {
    pub fn op(&self) -> RepoOp {
        match self {
            Self::InvalidIdentifier { op, .. }
            | Self::NotFound { op, .. }
            | Self::StorageRead { op, .. }
            | Self::StorageWrite { op, .. }
            | Self::IdentifierFormat { op, .. } => *op,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::NotFound { .. } => "not_found",
            Self::StorageRead { .. } => "storage_read_failed",
            Self::StorageWrite { .. } => "storage_write_failed",
            Self::IdentifierFormat { .. } => "identifier_format",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier { op, id, source } => {
                write!(f, "{op}: invalid recipe id `{id}`: {source}")
            }
            Self::NotFound { op, id } => write!(f, "{op}: recipe not found: {id}"),
            Self::StorageRead {
                op,
                id: Some(id),
                source,
            } => write!(f, "{op}: failed to read recipe {id}: {source}"),
            Self::StorageRead {
                op,
                id: None,
                source,
            } => write!(f, "{op}: failed to read recipes: {source}"),
            Self::StorageWrite {
                op,
                id: Some(id),
                source,
            } => write!(f, "{op}: failed to write recipe {id}: {source}"),
            Self::StorageWrite {
                op,
                id: None,
                source,
            } => write!(f, "{op}: failed to write recipe: {source}"),
            Self::IdentifierFormat { op, source } => {
                write!(f, "{op}: storage assigned an unusable recipe id: {source}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidIdentifier { source, .. } => Some(source),
            Self::NotFound { .. } => None,
            Self::StorageRead { source, .. } => Some(source),
            Self::StorageWrite { source, .. } => Some(source),
            Self::IdentifierFormat { source, .. } => Some(source),
        }
    }
}

/// Repository interface for recipe lifecycle operations.
pub trait RecipeRepository {
    /// Persists a transient recipe and returns it with its assigned id.
    fn create(&self, ctx: &OpContext, recipe: Recipe) -> RepoResult<Recipe>;
    /// Loads one recipe by hex id.
    fn get(&self, ctx: &OpContext, id: &str) -> RepoResult<Recipe>;
    /// Loads every recipe in storage order.
    fn get_all(&self, ctx: &OpContext) -> RepoResult<Vec<Recipe>>;
    /// Replaces all stored fields of `recipe.id` with the given values.
    ///
    /// Returns `NotFound` only when no document has that id. Writing values
    /// identical to the stored ones succeeds.
    fn update(&self, ctx: &OpContext, recipe: &Recipe) -> RepoResult<()>;
    /// Removes one recipe by hex id.
    fn delete(&self, ctx: &OpContext, id: &str) -> RepoResult<()>;
}

/// Recipe repository over any `DocumentCollection`.
pub struct DocumentRecipeRepository<C> {
    collection: C,
}

impl<C: DocumentCollection> DocumentRecipeRepository<C> {
    pub fn new(collection: C) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }
}

impl<C: DocumentCollection> RecipeRepository for DocumentRecipeRepository<C> {
    fn create(&self, ctx: &OpContext, recipe: Recipe) -> RepoResult<Recipe> {
        let started_at = Instant::now();
        let result = self.try_create(ctx, recipe);
        let recipe_id = result.as_ref().map_or("-", |recipe| recipe.id.as_str());
        self.log_outcome(RepoOp::Create, recipe_id, started_at, &result);
        result
    }

    fn get(&self, ctx: &OpContext, id: &str) -> RepoResult<Recipe> {
        let started_at = Instant::now();
        let result = self.try_get(ctx, id);
        self.log_outcome(RepoOp::Get, id, started_at, &result);
        result
    }

    fn get_all(&self, ctx: &OpContext) -> RepoResult<Vec<Recipe>> {
        let started_at = Instant::now();
        let result = self.try_get_all(ctx);
        self.log_outcome(RepoOp::GetAll, "-", started_at, &result);
        result
    }

    fn update(&self, ctx: &OpContext, recipe: &Recipe) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.try_update(ctx, recipe);
        self.log_outcome(RepoOp::Update, &recipe.id, started_at, &result);
        result
    }

    fn delete(&self, ctx: &OpContext, id: &str) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.try_delete(ctx, id);
        self.log_outcome(RepoOp::Delete, id, started_at, &result);
        result
    }
}

impl<C: DocumentCollection> DocumentRecipeRepository<C> {
    fn try_create(&self, ctx: &OpContext, mut recipe: Recipe) -> RepoResult<Recipe> {
        let op = RepoOp::Create;
        let doc = recipe_to_document(&recipe).map_err(|source| RepoError::StorageWrite {
            op,
            id: None,
            source,
        })?;

        let inserted = self
            .collection
            .insert_one(ctx, doc)
            .map_err(|source| RepoError::StorageWrite {
                op,
                id: None,
                source,
            })?;

        let id = ObjectId::try_from(&inserted.inserted_id)
            .map_err(|source| RepoError::IdentifierFormat { op, source })?;
        recipe.id = id.to_hex();
        Ok(recipe)
    }

    fn try_get(&self, ctx: &OpContext, id: &str) -> RepoResult<Recipe> {
        let op = RepoOp::Get;
        let object_id = parse_recipe_id(op, id)?;
        let stored = self
            .collection
            .find_one(ctx, &object_id)
            .map_err(|source| read_error(op, Some(id), source))?
            .ok_or_else(|| RepoError::NotFound {
                op,
                id: id.to_string(),
            })?;

        document_to_recipe(stored).map_err(|source| read_error(op, Some(id), source))
    }

    fn try_get_all(&self, ctx: &OpContext) -> RepoResult<Vec<Recipe>> {
        let op = RepoOp::GetAll;
        let stored = self
            .collection
            .find_all(ctx)
            .map_err(|source| read_error(op, None, source))?;

        let recipes = stored
            .into_iter()
            .map(|doc| document_to_recipe(doc).map_err(|source| read_error(op, None, source)))
            .collect::<RepoResult<Vec<_>>>()?;
        debug!(
            "event=recipe_get_all module=repo collection={} count={}",
            self.collection.name(),
            recipes.len()
        );
        Ok(recipes)
    }

    fn try_update(&self, ctx: &OpContext, recipe: &Recipe) -> RepoResult<()> {
        let op = RepoOp::Update;
        let id = recipe.id.as_str();
        let object_id = parse_recipe_id(op, id)?;
        let set = recipe_to_document(recipe).map_err(|source| write_error(op, id, source))?;

        let updated = self
            .collection
            .update_by_id(ctx, &object_id, set)
            .map_err(|source| write_error(op, id, source))?;
        if updated.matched_count == 0 {
            return Err(RepoError::NotFound {
                op,
                id: id.to_string(),
            });
        }

        Ok(())
    }

    fn try_delete(&self, ctx: &OpContext, id: &str) -> RepoResult<()> {
        let op = RepoOp::Delete;
        let object_id = parse_recipe_id(op, id)?;
        let deleted = self
            .collection
            .delete_one(ctx, &object_id)
            .map_err(|source| write_error(op, id, source))?;
        if deleted.deleted_count == 0 {
            return Err(RepoError::NotFound {
                op,
                id: id.to_string(),
            });
        }

        Ok(())
    }

    fn log_outcome<T>(
        &self,
        op: RepoOp,
        recipe_id: &str,
        started_at: Instant,
        result: &RepoResult<T>,
    ) {
        let collection = self.collection.name();
        match result {
            Ok(_) => debug!(
                "event=recipe_{op} module=repo status=ok collection={collection} recipe_id={recipe_id} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=recipe_{op} module=repo status=error collection={collection} recipe_id={recipe_id} duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.error_code(),
                err
            ),
        }
    }
}

/// Stored body of one recipe. Field presence is the only schema check.
#[derive(Debug, Deserialize)]
struct RecipeBody {
    name: String,
    description: String,
    favorite: bool,
    ingredients: Vec<Ingredient>,
    directions: Vec<Step>,
}

#[derive(Serialize)]
struct RecipeBodyRef<'a> {
    name: &'a str,
    description: &'a str,
    favorite: bool,
    ingredients: &'a [Ingredient],
    directions: &'a [Step],
}

fn recipe_to_document(recipe: &Recipe) -> Result<Document, StoreError> {
    // JSON has no NaN or infinity; serde_json encodes them as `null`.
    if let Some((index, ingredient)) = recipe
        .ingredients
        .iter()
        .enumerate()
        .find(|(_, ingredient)| !ingredient.qty.is_finite())
    {
        return Err(StoreError::Encode(format!(
            "ingredient {index} `{}` has non-finite qty {}",
            ingredient.name, ingredient.qty
        )));
    }

    let body = RecipeBodyRef {
        name: &recipe.name,
        description: &recipe.description,
        favorite: recipe.favorite,
        ingredients: &recipe.ingredients,
        directions: &recipe.directions,
    };

    match serde_json::to_value(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Encode(format!(
            "recipe encoded to non-object value `{other}`"
        ))),
        Err(err) => Err(StoreError::Encode(err.to_string())),
    }
}

fn document_to_recipe(stored: StoredDocument) -> Result<Recipe, StoreError> {
    let id = ObjectId::try_from(&stored.id)
        .map_err(|err| StoreError::Decode(format!("invalid stored recipe key: {err}")))?;
    let body: RecipeBody = serde_json::from_value(Value::Object(stored.body))
        .map_err(|err| StoreError::Decode(format!("recipe {id}: {err}")))?;

    Ok(Recipe {
        id: id.to_hex(),
        name: body.name,
        description: body.description,
        favorite: body.favorite,
        ingredients: body.ingredients,
        directions: body.directions,
    })
}

fn parse_recipe_id(op: RepoOp, id: &str) -> RepoResult<ObjectId> {
    ObjectId::parse_hex(id).map_err(|source| RepoError::InvalidIdentifier {
        op,
        id: id.to_string(),
        source,
    })
}

fn read_error(op: RepoOp, id: Option<&str>, source: StoreError) -> RepoError {
    RepoError::StorageRead {
        op,
        id: id.map(str::to_string),
        source,
    }
}

fn write_error(op: RepoOp, id: &str, source: StoreError) -> RepoError {
    RepoError::StorageWrite {
        op,
        id: Some(id.to_string()),
        source,
    }
}
