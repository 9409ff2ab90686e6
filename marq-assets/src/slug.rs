use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use uuid::Uuid;

use marq_core::schema::SLUG_FIELD;
use marq_core::{Document, DocumentStore, MarqError, Query};

/// Counter suffixes probed before falling back to a random token.
const MAX_SLUG_ATTEMPTS: usize = 500;

/// Produces collision-free slugs by probing the target collection.
///
/// Collision strategy: incrementing counter suffix (`-2`, `-3`, ...), with a
/// re-probe after every suffix before accepting, so two concurrent creations
/// that pick the same suffix cannot both be handed it blindly. Probes see
/// soft-deleted documents too; a tombstone still owns its slug.
pub struct SlugGenerator {
    store: Arc<dyn DocumentStore>,
}

impl SlugGenerator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Derive a collision-free slug from a candidate title or slug.
    pub async fn ensure_unique_slug(&self, candidate: &str, collection: &str) -> Result<String> {
        let base = slugify(candidate);
        let base = if base.is_empty() { "untitled".to_string() } else { base };
        self.probe_loop(&base, collection).await
    }

    /// Deduplicate a slug the caller explicitly supplied (already slugified).
    pub async fn resolve_existing_unique_slug(
        &self,
        slug: &str,
        collection: &str,
    ) -> Result<String> {
        let base = slug.trim();
        if base.is_empty() {
            return self.ensure_unique_slug("", collection).await;
        }
        self.probe_loop(base, collection).await
    }

    /// Base slug for a document: its `slug`, else its `title`, else `name`.
    pub fn slug_from_source(doc: &Document) -> String {
        for field in [SLUG_FIELD, "title", "name"] {
            if let Some(value) = doc.get(field).and_then(Value::as_str) {
                if !value.trim().is_empty() {
                    return value.to_string();
                }
            }
        }
        "untitled".to_string()
    }

    async fn probe_loop(&self, base: &str, collection: &str) -> Result<String> {
        if !self.taken(base, collection).await? {
            return Ok(base.to_string());
        }
        for n in 2..=MAX_SLUG_ATTEMPTS {
            let candidate = format!("{base}-{n}");
            if !self.taken(&candidate, collection).await? {
                return Ok(candidate);
            }
        }
        // pathological: runaway duplicates; one last try with a random token
        let token = Uuid::new_v4().simple().to_string();
        let candidate = format!("{base}-{}", &token[..8]);
        if !self.taken(&candidate, collection).await? {
            return Ok(candidate);
        }
        Err(MarqError::conflict(format!(
            "could not find a free slug for '{base}' in '{collection}'"
        ))
        .into_anyhow())
    }

    async fn taken(&self, slug: &str, collection: &str) -> Result<bool> {
        let hits = self
            .store
            .find(collection, Query::by_field(SLUG_FIELD, slug))
            .await?;
        Ok(!hits.is_empty())
    }
}

/// Lowercase, alphanumeric runs joined by single dashes.
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use marq_core::{FieldDescriptor, MemoryDocumentStore, SchemaDescriptor};
    use serde_json::json;

    fn store() -> Arc<MemoryDocumentStore> {
        Arc::new(MemoryDocumentStore::new(vec![SchemaDescriptor::new(
            "pages",
            vec![
                FieldDescriptor::string("title"),
                FieldDescriptor::string(SLUG_FIELD),
            ],
        )]))
    }

    #[test]
    fn slugify_normalizes() {
        assert_eq!(slugify("Gold Coins & Bars 2026"), "gold-coins-bars-2026");
        assert_eq!(slugify("  --  "), "");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
    }

    #[tokio::test]
    async fn no_collision_is_idempotent() {
        let store = store();
        let slugs = SlugGenerator::new(store);
        let slug = slugs.ensure_unique_slug("Fresh Title", "pages").await.unwrap();
        assert_eq!(slug, "fresh-title");
    }

    #[tokio::test]
    async fn collisions_get_counter_suffixes() {
        let store = store();
        store
            .create("pages", json!({"title": "Promo", "slug": "promo"}))
            .await
            .unwrap();
        store
            .create("pages", json!({"title": "Promo", "slug": "promo-2"}))
            .await
            .unwrap();
        let slugs = SlugGenerator::new(store.clone());
        let slug = slugs.ensure_unique_slug("Promo", "pages").await.unwrap();
        assert_eq!(slug, "promo-3");
        // never returns a value already present
        let hits = store
            .find("pages", Query::by_field(SLUG_FIELD, slug.as_str()))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn existing_slug_surface_probes_too() {
        let store = store();
        store
            .create("pages", json!({"slug": "about-us"}))
            .await
            .unwrap();
        let slugs = SlugGenerator::new(store);
        assert_eq!(
            slugs
                .resolve_existing_unique_slug("about-us", "pages")
                .await
                .unwrap(),
            "about-us-2"
        );
        assert_eq!(
            slugs
                .resolve_existing_unique_slug("contact", "pages")
                .await
                .unwrap(),
            "contact"
        );
    }

    #[test]
    fn slug_source_prefers_slug_then_title_then_name() {
        assert_eq!(
            SlugGenerator::slug_from_source(&json!({"slug": "s", "title": "t"})),
            "s"
        );
        assert_eq!(SlugGenerator::slug_from_source(&json!({"title": "t"})), "t");
        assert_eq!(SlugGenerator::slug_from_source(&json!({"name": "n"})), "n");
        assert_eq!(SlugGenerator::slug_from_source(&json!({})), "untitled");
    }
}
