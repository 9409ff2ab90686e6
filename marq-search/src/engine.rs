use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use marq_core::schema::SOFT_DELETE_FIELD;
use marq_core::{document_id, Condition, Document, DocumentStore, Query, SchemaDescriptor};

/// One search hit, normalized across collections.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: String,
    /// Display text: the first non-empty string field in priority order.
    pub text: String,
    pub collection: String,
    /// The full matched document.
    pub data: Document,
}

/// Searches every registered collection at once.
pub struct SearchEngine {
    store: Arc<dyn DocumentStore>,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Run `term` against all collections and flatten the results.
    ///
    /// Result order is collection-registration order, then document order
    /// within each collection; no cross-collection ranking is applied.
    pub async fn search(&self, term: &str) -> Result<Vec<SearchResult>> {
        let schemas = self.store.schemas();
        let searches = schemas.iter().filter_map(|schema| {
            let query = Self::build_query(schema, term)?;
            Some(self.search_collection(schema, query))
        });

        let per_collection = join_all(searches).await;
        Ok(per_collection.into_iter().flatten().collect())
    }

    /// Filter query for one collection, or `None` when the collection has no
    /// string fields (no conditions means no query is issued at all).
    fn build_query(schema: &SchemaDescriptor, term: &str) -> Option<Query> {
        let pattern = regex::escape(term);
        let conditions: Vec<Condition> = schema
            .string_fields()
            .map(|field| Condition::regex(field, pattern.clone()))
            .collect();
        if conditions.is_empty() {
            return None;
        }

        let mut query = Query::new().any_of(conditions);
        if schema.soft_deletes() {
            query = query.filter(Condition::is_null(SOFT_DELETE_FIELD));
        }
        for field in schema.draft_status_fields() {
            query = query.filter(Condition::ne(field, "draft"));
        }
        if let Some(target) = schema.populate_target() {
            query = query.populate(&target.name);
        }
        Some(query)
    }

    /// One collection's search. Failures are isolated: log and contribute
    /// nothing rather than aborting the sibling queries.
    async fn search_collection(
        &self,
        schema: &SchemaDescriptor,
        query: Query,
    ) -> Vec<SearchResult> {
        let collection = schema.collection();
        match self.store.find(collection, query).await {
            Ok(docs) => {
                debug!(collection, hits = docs.len(), "collection searched");
                docs.into_iter()
                    .map(|doc| SearchResult {
                        id: document_id(&doc).unwrap_or_default().to_string(),
                        text: first_string_field(schema, &doc),
                        collection: collection.to_string(),
                        data: doc,
                    })
                    .collect()
            }
            Err(error) => {
                warn!(collection, %error, "collection search failed; contributing no results");
                Vec::new()
            }
        }
    }
}

/// Display text for a matched document: `title`, else `name`, else
/// `description`, else the first schema-declared field whose runtime value
/// is a string, else `""`.
fn first_string_field(schema: &SchemaDescriptor, doc: &Document) -> String {
    let non_empty = |field: &str| {
        doc.get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    ["title", "name", "description"]
        .into_iter()
        .find_map(|field| non_empty(field))
        .or_else(|| schema.fields().iter().find_map(|f| non_empty(&f.name)))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use marq_core::FieldDescriptor;
    use serde_json::json;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new(
            "promos",
            vec![
                FieldDescriptor::other("weight"),
                FieldDescriptor::string("headline"),
                FieldDescriptor::string("description"),
            ],
        )
    }

    #[test]
    fn text_prefers_title_over_description() {
        let schema = SchemaDescriptor::new(
            "promos",
            vec![
                FieldDescriptor::string("title"),
                FieldDescriptor::string("description"),
            ],
        );
        let doc = json!({"title": "Promo A", "description": "great deal"});
        assert_eq!(first_string_field(&schema, &doc), "Promo A");
    }

    #[test]
    fn text_falls_back_to_declaration_order() {
        let doc = json!({"weight": 3, "headline": "Gold rush", "description": "shiny"});
        // no title/name; description wins over headline only by priority list
        assert_eq!(first_string_field(&schema(), &doc), "shiny");

        let doc = json!({"weight": 3, "headline": "Gold rush"});
        assert_eq!(first_string_field(&schema(), &doc), "Gold rush");

        let doc = json!({"weight": 3});
        assert_eq!(first_string_field(&schema(), &doc), "");
    }

    #[test]
    fn build_query_skips_collections_without_string_fields() {
        let schema = SchemaDescriptor::new(
            "metrics",
            vec![FieldDescriptor::other("count"), FieldDescriptor::other("at")],
        );
        assert!(SearchEngine::build_query(&schema, "term").is_none());
    }

    #[test]
    fn build_query_escapes_the_term() {
        let query = SearchEngine::build_query(&schema(), "c++ (beta)").unwrap();
        match &query.any_of[0] {
            Condition::Regex { pattern, .. } => {
                assert_eq!(pattern, &regex::escape("c++ (beta)"));
            }
            other => panic!("unexpected condition {other:?}"),
        }
    }

    #[test]
    fn build_query_attaches_exclusions_and_populate() {
        let schema = SchemaDescriptor::new(
            "podcasts",
            vec![
                FieldDescriptor::string("title"),
                FieldDescriptor::other(SOFT_DELETE_FIELD),
                FieldDescriptor::string("status"),
                FieldDescriptor::reference("season", "seasons"),
            ],
        );
        let query = SearchEngine::build_query(&schema, "gold").unwrap();
        assert!(query
            .all_of
            .contains(&Condition::is_null(SOFT_DELETE_FIELD)));
        assert!(query.all_of.contains(&Condition::ne("status", "draft")));
        assert_eq!(query.populate.as_deref(), Some("season"));
    }
}
