//! SQLite-backed document collection.
//!
//! # Responsibility
//! - Store JSON document bodies keyed by binary `ObjectId`s.
//! - Implement `DocumentCollection` with single-statement primitives, except
//!   `update_by_id` which reads and rewrites inside one transaction.
//!
//! # Invariants
//! - Natural order is insertion order (`documents.seq`).
//! - Keys are unique per collection name; collections share one table.
//! - Connections must be migrated before a collection is constructed.

use super::{
    DeleteResult, Document, DocumentCollection, InsertOneResult, OpContext, RawId, StoreError,
    StoreResult, StoredDocument, UpdateResult,
};
use crate::db::migrations::{current_user_version, latest_version};
use crate::model::object_id::ObjectId;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;

const DOCUMENTS_TABLE: &str = "documents";
const DOCUMENTS_COLUMNS: [&str; 4] = ["seq", "collection", "id", "body"];

/// One named collection inside the `documents` table.
pub struct SqliteCollection<'conn> {
    conn: &'conn Connection,
    name: String,
}

impl<'conn> SqliteCollection<'conn> {
    /// Binds a collection name to a migrated connection.
    pub fn try_new(conn: &'conn Connection, name: impl Into<String>) -> StoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self {
            conn,
            name: name.into(),
        })
    }

    /// Removes every document in this collection and returns how many went.
    pub fn drop_collection(&self, ctx: &OpContext) -> StoreResult<u64> {
        ctx.check()?;
        let removed = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1;",
            [self.name.as_str()],
        )?;
        debug!(
            "event=collection_drop module=store status=ok collection={} removed={removed}",
            self.name
        );
        Ok(removed as u64)
    }
}

impl DocumentCollection for SqliteCollection<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn insert_one(&self, ctx: &OpContext, doc: Document) -> StoreResult<InsertOneResult> {
        ctx.check()?;
        let id = ObjectId::new();
        let body = encode_body(&doc)?;

        self.conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3);",
            params![self.name.as_str(), id.bytes().as_slice(), body],
        )?;

        Ok(InsertOneResult {
            inserted_id: RawId::from(id),
        })
    }

    fn find_one(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<Option<StoredDocument>> {
        ctx.check()?;
        let mut stmt = self.conn.prepare(
            "SELECT id, body
             FROM documents
             WHERE collection = ?1 AND id = ?2;",
        )?;

        let mut rows = stmt.query(params![self.name.as_str(), id.bytes().as_slice()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_document_row(row)?));
        }

        Ok(None)
    }

    fn find_all(&self, ctx: &OpContext) -> StoreResult<Vec<StoredDocument>> {
        ctx.check()?;
        let mut stmt = self.conn.prepare(
            "SELECT id, body
             FROM documents
             WHERE collection = ?1
             ORDER BY seq ASC;",
        )?;

        let mut rows = stmt.query([self.name.as_str()])?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            ctx.check()?;
            documents.push(parse_document_row(row)?);
        }

        Ok(documents)
    }

    fn update_by_id(
        &self,
        ctx: &OpContext,
        id: &ObjectId,
        set: Document,
    ) -> StoreResult<UpdateResult> {
        ctx.check()?;
        let tx = self.conn.unchecked_transaction()?;

        let current: Option<String> = tx
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2;",
                params![self.name.as_str(), id.bytes().as_slice()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current) = current else {
            return Ok(UpdateResult::default());
        };

        let mut body = decode_body(&current)?;
        let mut modified = false;
        for (field, value) in set {
            if body.get(&field) != Some(&value) {
                body.insert(field, value);
                modified = true;
            }
        }

        if modified {
            tx.execute(
                "UPDATE documents SET body = ?1 WHERE collection = ?2 AND id = ?3;",
                params![
                    encode_body(&body)?,
                    self.name.as_str(),
                    id.bytes().as_slice()
                ],
            )?;
        }
        tx.commit()?;

        Ok(UpdateResult {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    fn delete_one(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<DeleteResult> {
        ctx.check()?;
        let deleted = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2;",
            params![self.name.as_str(), id.bytes().as_slice()],
        )?;

        Ok(DeleteResult {
            deleted_count: deleted as u64,
        })
    }
}

fn parse_document_row(row: &Row<'_>) -> StoreResult<StoredDocument> {
    let id: Vec<u8> = row.get("id")?;
    let body: String = row.get("body")?;
    Ok(StoredDocument {
        id: RawId(id),
        body: decode_body(&body)?,
    })
}

fn encode_body(doc: &Document) -> StoreResult<String> {
    serde_json::to_string(doc).map_err(|err| StoreError::Encode(err.to_string()))
}

fn decode_body(text: &str) -> StoreResult<Document> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Decode(format!(
            "document body must be an object, got `{other}`"
        ))),
        Err(err) => Err(StoreError::Decode(err.to_string())),
    }
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, DOCUMENTS_TABLE)? {
        return Err(StoreError::MissingRequiredTable(DOCUMENTS_TABLE));
    }

    for column in DOCUMENTS_COLUMNS {
        if !table_has_column(conn, DOCUMENTS_TABLE, column)? {
            return Err(StoreError::MissingRequiredColumn {
                table: DOCUMENTS_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::SqliteCollection;
    use crate::db::open_db_in_memory;
    use crate::model::object_id::ObjectId;
    use crate::store::{
        CancelFlag, ContextError, Document, DocumentCollection, OpContext, StoreError,
    };
    use rusqlite::Connection;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn insert_then_find_returns_same_body() {
        let conn = open_db_in_memory().unwrap();
        let collection = SqliteCollection::try_new(&conn, "things").unwrap();
        let ctx = OpContext::background();

        let inserted = collection
            .insert_one(&ctx, doc(json!({"a": 1, "b": [1, 2]})))
            .unwrap();
        let id = ObjectId::try_from(&inserted.inserted_id).unwrap();

        let found = collection.find_one(&ctx, &id).unwrap().unwrap();
        assert_eq!(found.id, inserted.inserted_id);
        assert_eq!(found.body, doc(json!({"a": 1, "b": [1, 2]})));
    }

    #[test]
    fn collections_sharing_a_connection_are_isolated() {
        let conn = open_db_in_memory().unwrap();
        let left = SqliteCollection::try_new(&conn, "left").unwrap();
        let right = SqliteCollection::try_new(&conn, "right").unwrap();
        let ctx = OpContext::background();

        let inserted = left.insert_one(&ctx, doc(json!({"x": true}))).unwrap();
        let id = ObjectId::try_from(&inserted.inserted_id).unwrap();

        assert!(right.find_one(&ctx, &id).unwrap().is_none());
        assert!(right.find_all(&ctx).unwrap().is_empty());
        assert_eq!(right.delete_one(&ctx, &id).unwrap().deleted_count, 0);
        assert_eq!(left.find_all(&ctx).unwrap().len(), 1);
    }

    #[test]
    fn find_all_keeps_insertion_order() {
        let conn = open_db_in_memory().unwrap();
        let collection = SqliteCollection::try_new(&conn, "things").unwrap();
        let ctx = OpContext::background();

        for index in 0..5 {
            collection
                .insert_one(&ctx, doc(json!({ "index": index })))
                .unwrap();
        }

        let indexes: Vec<_> = collection
            .find_all(&ctx)
            .unwrap()
            .into_iter()
            .map(|stored| stored.body["index"].clone())
            .collect();
        assert_eq!(indexes, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
    }

    #[test]
    fn update_sets_listed_fields_and_keeps_the_rest() {
        let conn = open_db_in_memory().unwrap();
        let collection = SqliteCollection::try_new(&conn, "things").unwrap();
        let ctx = OpContext::background();

        let inserted = collection
            .insert_one(&ctx, doc(json!({"keep": "me", "list": [1, 2, 3]})))
            .unwrap();
        let id = ObjectId::try_from(&inserted.inserted_id).unwrap();

        let result = collection
            .update_by_id(&ctx, &id, doc(json!({"list": [], "added": false})))
            .unwrap();
        assert_eq!(result.matched_count, 1);
        assert_eq!(result.modified_count, 1);

        let found = collection.find_one(&ctx, &id).unwrap().unwrap();
        assert_eq!(
            found.body,
            doc(json!({"keep": "me", "list": [], "added": false}))
        );
    }

    #[test]
    fn update_with_identical_values_matches_without_modifying() {
        let conn = open_db_in_memory().unwrap();
        let collection = SqliteCollection::try_new(&conn, "things").unwrap();
        let ctx = OpContext::background();

        let inserted = collection.insert_one(&ctx, doc(json!({"a": 1}))).unwrap();
        let id = ObjectId::try_from(&inserted.inserted_id).unwrap();

        let result = collection
            .update_by_id(&ctx, &id, doc(json!({"a": 1})))
            .unwrap();
        assert_eq!(result.matched_count, 1);
        assert_eq!(result.modified_count, 0);
    }

    #[test]
    fn update_and_delete_of_unknown_key_report_zero_counts() {
        let conn = open_db_in_memory().unwrap();
        let collection = SqliteCollection::try_new(&conn, "things").unwrap();
        let ctx = OpContext::background();
        let missing = ObjectId::new();

        let updated = collection
            .update_by_id(&ctx, &missing, doc(json!({"a": 1})))
            .unwrap();
        assert_eq!(updated.matched_count, 0);
        assert_eq!(updated.modified_count, 0);

        let deleted = collection.delete_one(&ctx, &missing).unwrap();
        assert_eq!(deleted.deleted_count, 0);
    }

    #[test]
    fn drop_collection_removes_only_its_documents() {
        let conn = open_db_in_memory().unwrap();
        let target = SqliteCollection::try_new(&conn, "target").unwrap();
        let other = SqliteCollection::try_new(&conn, "other").unwrap();
        let ctx = OpContext::background();

        target.insert_one(&ctx, doc(json!({}))).unwrap();
        target.insert_one(&ctx, doc(json!({}))).unwrap();
        other.insert_one(&ctx, doc(json!({}))).unwrap();

        assert_eq!(target.drop_collection(&ctx).unwrap(), 2);
        assert!(target.find_all(&ctx).unwrap().is_empty());
        assert_eq!(other.find_all(&ctx).unwrap().len(), 1);
    }

    #[test]
    fn cancelled_context_blocks_every_primitive() {
        let conn = open_db_in_memory().unwrap();
        let collection = SqliteCollection::try_new(&conn, "things").unwrap();
        let flag = CancelFlag::new();
        flag.cancel();
        let ctx = OpContext::background().with_cancel(flag);
        let id = ObjectId::new();

        let insert_err = collection.insert_one(&ctx, doc(json!({}))).unwrap_err();
        assert!(matches!(
            insert_err,
            StoreError::Context(ContextError::Cancelled)
        ));
        assert!(collection.find_one(&ctx, &id).is_err());
        assert!(collection.find_all(&ctx).is_err());
        assert!(collection
            .update_by_id(&ctx, &id, doc(json!({})))
            .is_err());
        assert!(collection.delete_one(&ctx, &id).is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn non_object_body_is_a_decode_error() {
        let conn = open_db_in_memory().unwrap();
        let collection = SqliteCollection::try_new(&conn, "things").unwrap();
        let id = ObjectId::new();
        conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES ('things', ?1, '[1, 2]');",
            [id.bytes().as_slice()],
        )
        .unwrap();

        let err = collection
            .find_one(&OpContext::background(), &id)
            .unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn collection_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();

        match SqliteCollection::try_new(&conn, "things") {
            Err(StoreError::UninitializedConnection {
                expected_version,
                actual_version: 0,
            }) => assert!(expected_version > 0),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected uninitialized connection error"),
        }
    }

    #[test]
    fn collection_rejects_connection_without_documents_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&format!(
            "PRAGMA user_version = {};",
            crate::db::migrations::latest_version()
        ))
        .unwrap();

        assert!(matches!(
            SqliteCollection::try_new(&conn, "things"),
            Err(StoreError::MissingRequiredTable("documents"))
        ));
    }
}
