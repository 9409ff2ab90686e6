//! In-memory document store for testing and development.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use regex::RegexBuilder;
use serde_json::Value;
use uuid::Uuid;

use crate::document::{document_id, Document, DocumentStore};
use crate::errors::{MarqError, MarqResult};
use crate::query::{Condition, Query};
use crate::schema::SchemaDescriptor;

/// In-memory backend: one `Vec<Document>` per registered collection.
///
/// Collections must be registered with their schema up front; operations on
/// unregistered collections are `NotFound` errors.
pub struct MemoryDocumentStore {
    schemas: Vec<SchemaDescriptor>,
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new(schemas: Vec<SchemaDescriptor>) -> Self {
        let collections = schemas
            .iter()
            .map(|s| (s.collection().to_string(), Vec::new()))
            .collect();
        Self {
            schemas,
            collections: RwLock::new(collections),
        }
    }

    /// Number of documents in `collection`, tombstones included.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn unknown(collection: &str) -> anyhow::Error {
        MarqError::not_found(format!("unknown collection '{collection}'")).into_anyhow()
    }

    fn matches(doc: &Document, query: &CompiledQuery) -> bool {
        let any_ok = query.any_of.is_empty() || query.any_of.iter().any(|c| c.eval(doc));
        any_ok && query.all_of.iter().all(|c| c.eval(doc))
    }

    /// Embed referenced documents on a returned copy; stored documents are
    /// never mutated by populate.
    fn populate(&self, schema: &SchemaDescriptor, field: &str, doc: &mut Document) {
        let Some(target) = schema.reference_target(field) else {
            return;
        };
        let collections = self.collections.read();
        let Some(pool) = collections.get(target) else {
            return;
        };
        let lookup = |id: &str| {
            pool.iter()
                .find(|d| document_id(d) == Some(id))
                .cloned()
        };
        let Some(current) = doc.get(field).cloned() else {
            return;
        };
        let replacement = match current {
            Value::String(id) => lookup(&id),
            Value::Array(ids) => Some(Value::Array(
                ids.into_iter()
                    .map(|v| match v {
                        Value::String(id) => lookup(&id).unwrap_or(Value::String(id)),
                        other => other,
                    })
                    .collect(),
            )),
            _ => None,
        };
        if let (Some(obj), Some(value)) = (doc.as_object_mut(), replacement) {
            obj.insert(field.to_string(), value);
        }
    }
}

/// A query with its regex conditions compiled once per `find`.
struct CompiledQuery {
    any_of: Vec<CompiledCondition>,
    all_of: Vec<CompiledCondition>,
}

enum CompiledCondition {
    Regex { field: String, regex: regex::Regex },
    Eq { field: String, value: Value },
    Ne { field: String, value: Value },
    IsNull { field: String },
}

impl CompiledCondition {
    fn compile(condition: Condition) -> MarqResult<Self> {
        Ok(match condition {
            Condition::Regex { field, pattern } => {
                let regex = RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        MarqError::bad_request(format!("invalid search pattern: {e}")).into_anyhow()
                    })?;
                CompiledCondition::Regex { field, regex }
            }
            Condition::Eq { field, value } => CompiledCondition::Eq { field, value },
            Condition::Ne { field, value } => CompiledCondition::Ne { field, value },
            Condition::IsNull { field } => CompiledCondition::IsNull { field },
        })
    }

    fn eval(&self, doc: &Document) -> bool {
        match self {
            CompiledCondition::Regex { field, regex } => doc
                .get(field)
                .and_then(Value::as_str)
                .map(|s| regex.is_match(s))
                .unwrap_or(false),
            CompiledCondition::Eq { field, value } => doc.get(field) == Some(value),
            // Documents that lack the field are "not equal" to the value.
            CompiledCondition::Ne { field, value } => doc.get(field) != Some(value),
            CompiledCondition::IsNull { field } => {
                matches!(doc.get(field), None | Some(Value::Null))
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn schemas(&self) -> Vec<SchemaDescriptor> {
        self.schemas.clone()
    }

    async fn create(&self, collection: &str, mut doc: Document) -> MarqResult<Document> {
        if !doc.is_object() {
            return Err(
                MarqError::unprocessable("documents must be JSON objects").into_anyhow(),
            );
        }
        if doc.get("id").and_then(Value::as_str).is_none() {
            if let Some(obj) = doc.as_object_mut() {
                obj.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
            }
        }
        let mut collections = self.collections.write();
        let pool = collections
            .get_mut(collection)
            .ok_or_else(|| Self::unknown(collection))?;
        pool.push(doc.clone());
        Ok(doc)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> MarqResult<Option<Document>> {
        let collections = self.collections.read();
        let pool = collections
            .get(collection)
            .ok_or_else(|| Self::unknown(collection))?;
        Ok(pool
            .iter()
            .find(|d| document_id(d) == Some(id))
            .cloned())
    }

    async fn find(&self, collection: &str, query: Query) -> MarqResult<Vec<Document>> {
        let schema = self
            .schema(collection)
            .ok_or_else(|| Self::unknown(collection))?;
        let compiled = CompiledQuery {
            any_of: query
                .any_of
                .into_iter()
                .map(CompiledCondition::compile)
                .collect::<MarqResult<_>>()?,
            all_of: query
                .all_of
                .into_iter()
                .map(CompiledCondition::compile)
                .collect::<MarqResult<_>>()?,
        };

        let mut matched: Vec<Document> = {
            let collections = self.collections.read();
            let pool = collections
                .get(collection)
                .ok_or_else(|| Self::unknown(collection))?;
            pool.iter()
                .filter(|d| Self::matches(d, &compiled))
                .cloned()
                .collect()
        };

        if let Some(field) = query.populate {
            for doc in &mut matched {
                self.populate(&schema, &field, doc);
            }
        }
        Ok(matched)
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> MarqResult<Option<Document>> {
        let mut collections = self.collections.write();
        let pool = collections
            .get_mut(collection)
            .ok_or_else(|| Self::unknown(collection))?;
        let Some(doc) = pool
            .iter_mut()
            .find(|d| document_id(d) == Some(id))
        else {
            return Ok(None);
        };
        if let (Some(target), Some(fields)) = (doc.as_object_mut(), patch.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(Some(doc.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDescriptor, SOFT_DELETE_FIELD};
    use serde_json::json;

    fn store() -> MemoryDocumentStore {
        MemoryDocumentStore::new(vec![
            SchemaDescriptor::new(
                "pages",
                vec![
                    FieldDescriptor::string("title"),
                    FieldDescriptor::string("status"),
                    FieldDescriptor::other(SOFT_DELETE_FIELD),
                    FieldDescriptor::reference("category", "categories"),
                ],
            ),
            SchemaDescriptor::new("categories", vec![FieldDescriptor::string("name")]),
        ])
    }

    #[tokio::test]
    async fn create_assigns_an_id() {
        let store = store();
        let doc = store
            .create("pages", json!({"title": "Fees"}))
            .await
            .unwrap();
        assert!(doc.get("id").and_then(Value::as_str).is_some());
        assert_eq!(store.len("pages"), 1);
    }

    #[tokio::test]
    async fn regex_condition_is_case_insensitive() {
        let store = store();
        store
            .create("pages", json!({"title": "Regulatory Fees"}))
            .await
            .unwrap();
        let hits = store
            .find(
                "pages",
                Query::new().any_of(vec![Condition::regex("title", "fees")]),
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn is_null_matches_absent_and_explicit_null() {
        let store = store();
        store.create("pages", json!({"title": "a"})).await.unwrap();
        store
            .create("pages", json!({"title": "b", "deletedAt": null}))
            .await
            .unwrap();
        store
            .create("pages", json!({"title": "c", "deletedAt": "2026-01-01T00:00:00Z"}))
            .await
            .unwrap();
        let live = store
            .find(
                "pages",
                Query::new().filter(Condition::is_null(SOFT_DELETE_FIELD)),
            )
            .await
            .unwrap();
        assert_eq!(live.len(), 2);
    }

    #[tokio::test]
    async fn ne_matches_documents_missing_the_field() {
        let store = store();
        store
            .create("pages", json!({"title": "published", "status": "published"}))
            .await
            .unwrap();
        store
            .create("pages", json!({"title": "draft", "status": "draft"}))
            .await
            .unwrap();
        store.create("pages", json!({"title": "bare"})).await.unwrap();
        let hits = store
            .find("pages", Query::new().filter(Condition::ne("status", "draft")))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn populate_embeds_the_referenced_document() {
        let store = store();
        let cat = store
            .create("categories", json!({"name": "Savings"}))
            .await
            .unwrap();
        let cat_id = cat["id"].as_str().unwrap();
        store
            .create("pages", json!({"title": "Rates", "category": cat_id}))
            .await
            .unwrap();

        let hits = store
            .find("pages", Query::all().populate("category"))
            .await
            .unwrap();
        assert_eq!(hits[0]["category"]["name"], "Savings");

        // stored document still holds the raw reference
        let raw = store.find("pages", Query::all()).await.unwrap();
        assert_eq!(raw[0]["category"], json!(cat_id));
    }

    #[tokio::test]
    async fn list_excludes_tombstones_only_when_schema_soft_deletes() {
        let store = store();
        store.create("pages", json!({"title": "live"})).await.unwrap();
        store
            .create("pages", json!({"title": "gone", "deletedAt": "2026-01-01T00:00:00Z"}))
            .await
            .unwrap();
        store
            .create("categories", json!({"name": "kept", "deletedAt": "whatever"}))
            .await
            .unwrap();

        assert_eq!(store.list("pages").await.unwrap().len(), 1);
        // categories schema has no deletedAt field, so nothing is filtered
        assert_eq!(store.list("categories").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn find_one_and_update_merges_shallowly() {
        let store = store();
        let doc = store
            .create("pages", json!({"title": "old", "status": "published"}))
            .await
            .unwrap();
        let id = doc["id"].as_str().unwrap();
        let updated = store
            .find_one_and_update("pages", id, json!({"title": "new"}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["title"], "new");
        assert_eq!(updated["status"], "published");

        let missing = store
            .find_one_and_update("pages", "nope", json!({"title": "x"}))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
