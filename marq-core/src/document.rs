//! Document-store capability.
//!
//! The core talks to collections of JSON documents through this trait; the
//! concrete driver (Mongo, TypeDB, memory) lives behind it. Methods the
//! content modules rely on mirror the driver surface they were written
//! against: `create`, `findById`, `findOneAndUpdate`, `find`, plus schema
//! metadata.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::MarqResult;
use crate::query::{Condition, Query};
use crate::schema::{SchemaDescriptor, SOFT_DELETE_FIELD};

/// A stored document. Objects carry a string `id` field.
pub type Document = Value;

/// Extract the string id of a document, if present.
pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get("id").and_then(Value::as_str)
}

/// Typed-collection document store.
///
/// Soft deletion is a convention, not a store feature: removal marks
/// `deletedAt` and the *callers* decide which reads exclude tombstones.
/// `find_by_id` deliberately returns soft-deleted documents so cleanup
/// paths can still reach their asset references.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Descriptors of every registered collection, in registration order.
    fn schemas(&self) -> Vec<SchemaDescriptor>;

    /// Descriptor of one collection.
    fn schema(&self, collection: &str) -> Option<SchemaDescriptor> {
        self.schemas()
            .into_iter()
            .find(|s| s.collection() == collection)
    }

    /// Persist a new document; assigns an `id` when the payload has none.
    async fn create(&self, collection: &str, doc: Document) -> MarqResult<Document>;

    /// Fetch one document by id, soft-deleted or not.
    async fn find_by_id(&self, collection: &str, id: &str) -> MarqResult<Option<Document>>;

    /// Run a filter query against one collection.
    async fn find(&self, collection: &str, query: Query) -> MarqResult<Vec<Document>>;

    /// Shallow-merge `patch` into the document with `id`; returns the
    /// updated document, or `None` when no such document exists.
    async fn find_one_and_update(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> MarqResult<Option<Document>>;

    /// The default listing query: everything live, tombstones excluded
    /// whenever the schema declares the soft-delete field.
    async fn list(&self, collection: &str) -> MarqResult<Vec<Document>> {
        let mut query = Query::all();
        if self
            .schema(collection)
            .map(|s| s.soft_deletes())
            .unwrap_or(false)
        {
            query = query.filter(Condition::is_null(SOFT_DELETE_FIELD));
        }
        self.find(collection, query).await
    }
}
