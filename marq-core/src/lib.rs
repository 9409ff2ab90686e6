//! marq-core: store-agnostic core for MarqRS.
//!
//! The content core never talks to a concrete database. It talks to a
//! [`DocumentStore`] capability: typed collections of `serde_json::Value`
//! documents with a soft-delete convention (`deletedAt`), a small query AST,
//! and per-collection [`SchemaDescriptor`]s built once at registration time.
//!
//! The descriptors replace runtime schema reflection: every field's kind
//! (string, reference, other) is declared up front, so generic behavior like
//! cross-collection search is a static lookup, not introspection.

pub mod document;
pub mod errors;
pub mod query;
pub mod schema;

#[cfg(feature = "memory")]
pub mod memory;

pub use document::{document_id, Document, DocumentStore};
pub use errors::{ErrorKind, MarqError, MarqResult};
pub use query::{Condition, Query};
pub use schema::{FieldDescriptor, FieldKind, SchemaDescriptor};

#[cfg(feature = "memory")]
pub use memory::MemoryDocumentStore;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Condition, Document, DocumentStore, ErrorKind, FieldDescriptor, FieldKind, MarqError,
        MarqResult, Query, SchemaDescriptor,
    };
}
