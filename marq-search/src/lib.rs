//! marq-search: cross-collection search for MarqRS.
//!
//! One search term, every registered collection: the engine reads each
//! collection's [`SchemaDescriptor`](marq_core::SchemaDescriptor), built at
//! registration time rather than reflected per request, to discover searchable
//! string fields, assembles a per-collection filter (term conditions OR'd,
//! soft-delete and draft exclusions AND'd on top), fans the queries out
//! concurrently, and flattens the matches into one uniform result list.
//!
//! A collection with no string fields is skipped without issuing a query,
//! and a collection whose query fails contributes an empty slice instead of
//! aborting the whole search.

mod engine;

pub use engine::{SearchEngine, SearchResult};
