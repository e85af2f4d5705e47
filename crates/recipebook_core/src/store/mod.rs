//! Document collection contract and the bundled SQLite implementation.
//!
//! # Responsibility
//! - Define the single-document primitives repositories build on.
//! - Keep storage-native keys (`RawId`) distinct from typed `ObjectId`s.
//!
//! # Invariants
//! - Every primitive honours the supplied `OpContext` before touching storage.
//! - `update_by_id` replaces top-level fields only; unspecified fields stay.
//! - Primitives never retry.

use crate::model::object_id::ObjectId;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod context;
pub mod sqlite_collection;

pub use context::{CancelFlag, ContextError, OpContext};
pub use sqlite_collection::SqliteCollection;

/// Stored document body. The primary key is kept outside the body.
pub type Document = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-native key bytes as returned by the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawId(pub Vec<u8>);

impl From<ObjectId> for RawId {
    fn from(value: ObjectId) -> Self {
        Self(value.bytes().to_vec())
    }
}

impl TryFrom<&RawId> for ObjectId {
    type Error = crate::model::object_id::ObjectIdError;

    fn try_from(value: &RawId) -> Result<Self, Self::Error> {
        ObjectId::try_from(value.0.as_slice())
    }
}

/// One document together with its primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: RawId,
    pub body: Document,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOneResult {
    pub inserted_id: RawId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateResult {
    /// Documents whose key matched the filter.
    pub matched_count: u64,
    /// Matched documents whose body actually changed.
    pub modified_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// Store-level failure, opaque to repositories.
#[derive(Debug)]
pub enum StoreError {
    /// SQLite rejected a statement.
    Sqlite(rusqlite::Error),
    Context(ContextError),
    /// Stored bytes could not be decoded into a document or model.
    Decode(String),
    /// A document could not be encoded for storage.
    Encode(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::Context(err) => write!(f, "{err}"),
            Self::Decode(message) => write!(f, "failed to decode document: {message}"),
            Self::Encode(message) => write!(f, "failed to encode document: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "document store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "document store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "document store requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Context(err) => Some(err),
            Self::Decode(_) | Self::Encode(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<ContextError> for StoreError {
    fn from(value: ContextError) -> Self {
        Self::Context(value)
    }
}

/// Single-document primitives over one named collection.
pub trait DocumentCollection {
    /// Collection name used for diagnostics.
    fn name(&self) -> &str;
    /// Inserts `doc` under a freshly assigned key.
    fn insert_one(&self, ctx: &OpContext, doc: Document) -> StoreResult<InsertOneResult>;
    /// Returns the document keyed by `id`, if any.
    fn find_one(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<Option<StoredDocument>>;
    /// Returns every document in natural order.
    fn find_all(&self, ctx: &OpContext) -> StoreResult<Vec<StoredDocument>>;
    /// Overwrites the top-level fields in `set` on the document keyed by `id`.
    fn update_by_id(
        &self,
        ctx: &OpContext,
        id: &ObjectId,
        set: Document,
    ) -> StoreResult<UpdateResult>;
    /// Removes the document keyed by `id`.
    fn delete_one(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<DeleteResult>;
}

impl<C: DocumentCollection + ?Sized> DocumentCollection for &C {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn insert_one(&self, ctx: &OpContext, doc: Document) -> StoreResult<InsertOneResult> {
        (**self).insert_one(ctx, doc)
    }

    fn find_one(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<Option<StoredDocument>> {
        (**self).find_one(ctx, id)
    }

    fn find_all(&self, ctx: &OpContext) -> StoreResult<Vec<StoredDocument>> {
        (**self).find_all(ctx)
    }

    fn update_by_id(
        &self,
        ctx: &OpContext,
        id: &ObjectId,
        set: Document,
    ) -> StoreResult<UpdateResult> {
        (**self).update_by_id(ctx, id, set)
    }

    fn delete_one(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<DeleteResult> {
        (**self).delete_one(ctx, id)
    }
}
