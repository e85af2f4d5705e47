use recipebook_core::store::{
    DeleteResult, Document, InsertOneResult, RawId, StoreResult, StoredDocument, UpdateResult,
};
use recipebook_core::{
    DocumentCollection, DocumentRecipeRepository, ObjectId, ObjectIdError, OpContext, Recipe,
    RecipeRepository, RepoError, RepoOp, StoreError,
};
use std::cell::RefCell;
use std::error::Error;

/// Collection double that answers every call with a canned result and
/// records what the repository sent.
#[derive(Default)]
struct ScriptedCollection {
    inserted_id: Option<RawId>,
    update_result: UpdateResult,
    fail_with_decode: bool,
    inserted: RefCell<Vec<Document>>,
    updates: RefCell<Vec<(ObjectId, Document)>>,
}

impl ScriptedCollection {
    fn failure(&self) -> StoreResult<()> {
        if self.fail_with_decode {
            return Err(StoreError::Decode("scripted failure".to_string()));
        }
        Ok(())
    }
}

impl DocumentCollection for ScriptedCollection {
    fn name(&self) -> &str {
        "scripted"
    }

    fn insert_one(&self, _ctx: &OpContext, doc: Document) -> StoreResult<InsertOneResult> {
        self.failure()?;
        self.inserted.borrow_mut().push(doc);
        Ok(InsertOneResult {
            inserted_id: self
                .inserted_id
                .clone()
                .unwrap_or_else(|| RawId::from(ObjectId::new())),
        })
    }

    fn find_one(&self, _ctx: &OpContext, _id: &ObjectId) -> StoreResult<Option<StoredDocument>> {
        self.failure()?;
        Ok(None)
    }

    fn find_all(&self, _ctx: &OpContext) -> StoreResult<Vec<StoredDocument>> {
        self.failure()?;
        Ok(Vec::new())
    }

    fn update_by_id(
        &self,
        _ctx: &OpContext,
        id: &ObjectId,
        set: Document,
    ) -> StoreResult<UpdateResult> {
        self.failure()?;
        self.updates.borrow_mut().push((*id, set));
        Ok(self.update_result)
    }

    fn delete_one(&self, _ctx: &OpContext, _id: &ObjectId) -> StoreResult<DeleteResult> {
        self.failure()?;
        Ok(DeleteResult { deleted_count: 1 })
    }
}

#[test]
fn create_with_unconvertible_storage_id_is_identifier_format_error() {
    let collection = ScriptedCollection {
        inserted_id: Some(RawId(b"not-twelve".to_vec())),
        ..ScriptedCollection::default()
    };
    let repo = DocumentRecipeRepository::new(&collection);

    let err = repo
        .create(&OpContext::background(), Recipe::new("odd key"))
        .unwrap_err();
    match err {
        RepoError::IdentifierFormat { op, source } => {
            assert_eq!(op, RepoOp::Create);
            assert_eq!(source, ObjectIdError::InvalidByteLength { actual: 10 });
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn create_sends_document_without_id_field() {
    let collection = ScriptedCollection::default();
    let repo = DocumentRecipeRepository::new(&collection);

    let mut recipe = Recipe::new("Pasta").with_ingredient(200.0, "g", "Spaghetti");
    recipe.id = "stale-id-is-ignored".to_string();
    let created = repo.create(&OpContext::background(), recipe).unwrap();

    assert!(ObjectId::parse_hex(&created.id).is_ok());
    let inserted = collection.inserted.borrow();
    assert_eq!(inserted.len(), 1);
    assert!(!inserted[0].contains_key("id"));
    assert!(!inserted[0].contains_key("_id"));
    assert_eq!(inserted[0]["name"], "Pasta");
}

#[test]
fn update_sends_every_field_as_full_replace_set() {
    let collection = ScriptedCollection {
        update_result: UpdateResult {
            matched_count: 1,
            modified_count: 1,
        },
        ..ScriptedCollection::default()
    };
    let repo = DocumentRecipeRepository::new(&collection);
    let id = ObjectId::new();

    let recipe = Recipe {
        id: id.to_hex(),
        ..Recipe::new("Only name set")
    };
    repo.update(&OpContext::background(), &recipe).unwrap();

    let updates = collection.updates.borrow();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, id);
    let set = &updates[0].1;
    assert_eq!(set["name"], "Only name set");
    assert_eq!(set["description"], "");
    assert_eq!(set["favorite"], false);
    assert_eq!(set["ingredients"], serde_json::json!([]));
    assert_eq!(set["directions"], serde_json::json!([]));
}

#[test]
fn update_not_found_is_decided_by_matched_count() {
    let collection = ScriptedCollection::default();
    let repo = DocumentRecipeRepository::new(&collection);
    let recipe = Recipe {
        id: ObjectId::new().to_hex(),
        ..Recipe::new("missing")
    };

    let err = repo
        .update(&OpContext::background(), &recipe)
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn update_matching_without_modification_is_success() {
    let collection = ScriptedCollection {
        update_result: UpdateResult {
            matched_count: 1,
            modified_count: 0,
        },
        ..ScriptedCollection::default()
    };
    let repo = DocumentRecipeRepository::new(&collection);
    let recipe = Recipe {
        id: ObjectId::new().to_hex(),
        ..Recipe::new("unchanged")
    };

    repo.update(&OpContext::background(), &recipe).unwrap();
    assert_eq!(collection.updates.borrow().len(), 1);
}

#[test]
fn storage_failures_map_to_read_or_write_with_cause() {
    let collection = ScriptedCollection {
        fail_with_decode: true,
        ..ScriptedCollection::default()
    };
    let repo = DocumentRecipeRepository::new(&collection);
    let ctx = OpContext::background();
    let id = ObjectId::new().to_hex();

    let get_err = repo.get(&ctx, &id).unwrap_err();
    assert!(matches!(
        &get_err,
        RepoError::StorageRead { op: RepoOp::Get, id: Some(found), .. } if *found == id
    ));
    assert!(get_err
        .source()
        .is_some_and(|cause| cause.to_string().contains("scripted failure")));

    let all_err = repo.get_all(&ctx).unwrap_err();
    assert!(matches!(
        all_err,
        RepoError::StorageRead {
            op: RepoOp::GetAll,
            ..
        }
    ));

    let create_err = repo.create(&ctx, Recipe::new("x")).unwrap_err();
    assert!(matches!(
        create_err,
        RepoError::StorageWrite {
            op: RepoOp::Create,
            id: None,
            ..
        }
    ));

    let delete_err = repo.delete(&ctx, &id).unwrap_err();
    assert!(matches!(
        delete_err,
        RepoError::StorageWrite {
            op: RepoOp::Delete,
            ..
        }
    ));
    assert!(delete_err.to_string().contains(&id));
}
