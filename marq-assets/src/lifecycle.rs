use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use marq_blob::{AssetKeyStrategy, Base64Detector, BlobGateway, DefaultKeyStrategy, ObjectKey};
use marq_core::schema::{SLUG_FIELD, SOFT_DELETE_FIELD, STATUS_FIELD};
use marq_core::{Document, DocumentStore, MarqError};

use crate::image::{ImageDetail, IncomingImage, UploadPayload};
use crate::resolver::{AssetResolver, CleanupInstruction, WriteMode};
use crate::slug::SlugGenerator;

/// How an asset field is persisted on its entity.
///
/// Declared at registration; never inferred from the field's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFieldKind {
    /// The field holds the plain location string.
    Simple,
    /// The field holds an [`ImageDetail`] object.
    Detailed,
}

/// Registration of one image-bearing field of an entity.
#[derive(Debug, Clone)]
pub struct AssetFieldSpec {
    /// Incoming slot carrying the retained URL (or null when replaced).
    pub retained_field: String,
    /// Incoming slot carrying the fresh [`UploadPayload`], if any.
    /// Transient: stripped before persistence.
    pub upload_field: String,
    /// Persisted slot, written according to `kind`.
    pub stored_field: String,
    pub kind: AssetFieldKind,
    /// Asset category; namespaces object keys together with the entity id.
    pub category: String,
}

impl AssetFieldSpec {
    /// A field persisted as a plain location string under its own name.
    pub fn simple(
        name: impl Into<String>,
        upload_field: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            stored_field: name.clone(),
            retained_field: name,
            upload_field: upload_field.into(),
            kind: AssetFieldKind::Simple,
            category: category.into(),
        }
    }

    /// A field persisted as an [`ImageDetail`] under `stored_field`.
    pub fn detailed(
        name: impl Into<String>,
        upload_field: impl Into<String>,
        stored_field: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            retained_field: name.into(),
            upload_field: upload_field.into(),
            stored_field: stored_field.into(),
            kind: AssetFieldKind::Detailed,
            category: category.into(),
        }
    }
}

/// The incoming values for one asset field of one mutation.
struct FieldInput {
    retained: Option<String>,
    incoming: Option<IncomingImage>,
}

impl FieldInput {
    fn extract(doc: &Document, spec: &AssetFieldSpec) -> Result<Self> {
        let retained = doc
            .get(&spec.retained_field)
            .and_then(Value::as_str)
            .map(String::from);

        // the upload slot may be a payload object or an array of one
        let raw = doc.get(&spec.upload_field).cloned().unwrap_or(Value::Null);
        let raw = match raw {
            Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
            other => other,
        };
        let incoming = match raw {
            Value::Null => None,
            value => {
                let payload: UploadPayload = serde_json::from_value(value).map_err(|e| {
                    MarqError::unprocessable(format!(
                        "malformed upload payload in '{}': {e}",
                        spec.upload_field
                    ))
                    .into_anyhow()
                })?;
                Some(IncomingImage::from_payload(payload).with_file_id(&spec.retained_field))
            }
        };
        Ok(Self { retained, incoming })
    }
}

/// Wraps the [`AssetResolver`] around entity CRUD so that every mutation
/// leaves blob storage consistent with the entity's persisted image fields.
///
/// Blob storage and the document store are not transactional with each
/// other: a crash between persisting a new value and deleting the old blob
/// leaves an orphaned blob, which is a storage leak, never dangling entity
/// data.
pub struct AssetLifecycle {
    store: Arc<dyn DocumentStore>,
    gateway: Arc<dyn BlobGateway>,
    keys: Arc<dyn AssetKeyStrategy>,
    resolver: AssetResolver,
    slugs: SlugGenerator,
}

impl AssetLifecycle {
    pub fn new(store: Arc<dyn DocumentStore>, gateway: Arc<dyn BlobGateway>) -> Self {
        Self::with_key_strategy(store, gateway, Arc::new(DefaultKeyStrategy::new()))
    }

    pub fn with_key_strategy(
        store: Arc<dyn DocumentStore>,
        gateway: Arc<dyn BlobGateway>,
        keys: Arc<dyn AssetKeyStrategy>,
    ) -> Self {
        let resolver = AssetResolver::new(gateway.clone(), keys.clone());
        let slugs = SlugGenerator::new(store.clone());
        Self {
            store,
            gateway,
            keys,
            resolver,
            slugs,
        }
    }

    /// Swap in a caller-supplied base64 predicate.
    pub fn with_detector(mut self, detect: Base64Detector) -> Self {
        self.resolver =
            AssetResolver::new(self.gateway.clone(), self.keys.clone()).with_detector(detect);
        self
    }

    /// Resolve every image field of a new entity and persist it.
    ///
    /// No stale cleanup: nothing exists yet for this entity.
    pub async fn on_create(
        &self,
        collection: &str,
        mut entity: Document,
        fields: &[AssetFieldSpec],
    ) -> Result<Document> {
        let entity_id = Self::ensure_id(&mut entity)?;
        for spec in fields {
            let input = FieldInput::extract(&entity, spec)?;
            let resolved = self
                .resolver
                .resolve(
                    &entity_id,
                    input.retained.as_deref(),
                    input.incoming.as_ref(),
                    &spec.category,
                    None,
                    WriteMode::Create,
                )
                .await?;
            Self::apply(&mut entity, spec, resolved, None);
        }
        self.store.create(collection, entity).await
    }

    /// Resolve every image field of an update and persist the patch.
    ///
    /// The persisted document is read FIRST; stale-blob keys always come
    /// from that pre-update read, so cleanup can never remove the value
    /// being written.
    pub async fn on_update(
        &self,
        collection: &str,
        id: &str,
        incoming: Document,
        fields: &[AssetFieldSpec],
    ) -> Result<Document> {
        let prior = self.store.find_by_id(collection, id).await?;
        if prior.is_none() {
            warn!(collection, id, "entity missing during cleanup lookup; nothing to clean");
        }

        let mut patch = incoming;
        for spec in fields {
            let input = FieldInput::extract(&patch, spec)?;
            let prior_stored = prior.as_ref().and_then(|d| d.get(&spec.stored_field)).cloned();
            let stale = CleanupInstruction::new(
                id,
                &spec.stored_field,
                self.owned_keys(prior_stored.as_ref(), spec.kind),
            );
            let resolved = self
                .resolver
                .resolve(
                    id,
                    input.retained.as_deref(),
                    input.incoming.as_ref(),
                    &spec.category,
                    Some(&stale),
                    WriteMode::Update,
                )
                .await?;
            Self::apply(&mut patch, spec, resolved, prior_stored.as_ref());
        }

        self.store
            .find_one_and_update(collection, id, patch)
            .await?
            .ok_or_else(|| {
                MarqError::not_found(format!("{collection}/{id} does not exist")).into_anyhow()
            })
    }

    /// Clone an entity: every blob we own is duplicated under the new
    /// entity's id, `status` is forced to draft, and a fresh unique slug is
    /// generated. External URLs are carried over as-is.
    pub async fn on_clone(
        &self,
        collection: &str,
        id: &str,
        fields: &[AssetFieldSpec],
    ) -> Result<Document> {
        let source = self
            .store
            .find_by_id(collection, id)
            .await?
            .ok_or_else(|| {
                MarqError::not_found(format!("{collection}/{id} does not exist")).into_anyhow()
            })?;

        let new_id = Uuid::new_v4().to_string();
        let mut clone = source.clone();
        if let Some(obj) = clone.as_object_mut() {
            obj.insert("id".into(), json!(new_id));
        }

        for spec in fields {
            let stored = clone.get(&spec.stored_field).cloned();
            let Some(location) = Self::stored_location(stored.as_ref(), spec.kind) else {
                continue;
            };
            let Some(key) = self.gateway.key_for_location(&location) else {
                continue;
            };
            let new_key = match self.keys.rekey(&key, &new_id) {
                Some(key) => key,
                None => {
                    let segment = key.as_str().rsplit('/').next().unwrap_or("image");
                    self.keys.object_key(&spec.category, &new_id, segment)
                }
            };
            let receipt = self.gateway.copy(&key, &new_key).await?;
            let detail = ImageDetail::new(receipt.location)
                .with_alt_text(Self::stored_alt_text(stored.as_ref()));
            Self::apply(&mut clone, spec, Some(detail), None);
        }

        if let Some(schema) = self.store.schema(collection) {
            if schema.has_field(STATUS_FIELD) {
                if let Some(obj) = clone.as_object_mut() {
                    obj.insert(STATUS_FIELD.into(), json!("draft"));
                }
            }
            if schema.has_field(SLUG_FIELD) {
                let slug = self
                    .slugs
                    .ensure_unique_slug(&SlugGenerator::slug_from_source(&source), collection)
                    .await?;
                if let Some(obj) = clone.as_object_mut() {
                    obj.insert(SLUG_FIELD.into(), json!(slug));
                }
            }
        }

        self.store.create(collection, clone).await
    }

    /// Remove every blob the entity's image fields own, then soft-delete it.
    pub async fn on_remove(
        &self,
        collection: &str,
        id: &str,
        fields: &[AssetFieldSpec],
    ) -> Result<Document> {
        match self.store.find_by_id(collection, id).await? {
            Some(doc) => {
                let keys: Vec<ObjectKey> = fields
                    .iter()
                    .flat_map(|spec| {
                        self.owned_keys(doc.get(&spec.stored_field), spec.kind)
                    })
                    .collect();
                if !keys.is_empty() {
                    self.gateway.remove(&keys).await?;
                }
            }
            None => {
                warn!(collection, id, "entity missing during cleanup lookup; nothing to clean");
            }
        }

        let patch = json!({ SOFT_DELETE_FIELD: Utc::now().to_rfc3339() });
        self.store
            .find_one_and_update(collection, id, patch)
            .await?
            .ok_or_else(|| {
                MarqError::not_found(format!("{collection}/{id} does not exist")).into_anyhow()
            })
    }

    fn ensure_id(entity: &mut Document) -> Result<String> {
        let obj = entity.as_object_mut().ok_or_else(|| {
            MarqError::unprocessable("entities must be JSON objects").into_anyhow()
        })?;
        if let Some(id) = obj.get("id").and_then(Value::as_str) {
            return Ok(id.to_string());
        }
        // keys are namespaced by entity id, so the id must exist pre-upload
        let id = Uuid::new_v4().to_string();
        obj.insert("id".into(), json!(id));
        Ok(id)
    }

    /// The location a stored field value points at, if any.
    fn stored_location(value: Option<&Value>, kind: AssetFieldKind) -> Option<String> {
        let value = value?;
        let location = match kind {
            AssetFieldKind::Simple => value.as_str(),
            AssetFieldKind::Detailed => value.get("image").and_then(Value::as_str),
        }?;
        let location = location.trim();
        (!location.is_empty()).then(|| location.to_string())
    }

    fn stored_alt_text(value: Option<&Value>) -> Option<String> {
        value?
            .get("altText")
            .and_then(Value::as_str)
            .map(String::from)
    }

    /// Object keys we own behind a stored field value; external URLs
    /// contribute nothing.
    fn owned_keys(&self, value: Option<&Value>, kind: AssetFieldKind) -> Vec<ObjectKey> {
        Self::stored_location(value, kind)
            .and_then(|location| self.gateway.key_for_location(&location))
            .into_iter()
            .collect()
    }

    /// Write the resolved value into the payload and strip the transient
    /// upload slot.
    fn apply(
        doc: &mut Document,
        spec: &AssetFieldSpec,
        resolved: Option<ImageDetail>,
        prior_stored: Option<&Value>,
    ) {
        let Some(obj) = doc.as_object_mut() else {
            return;
        };
        let value = match (spec.kind, resolved) {
            (_, None) => Value::Null,
            (AssetFieldKind::Simple, Some(detail)) => json!(detail.image),
            (AssetFieldKind::Detailed, Some(mut detail)) => {
                // keep prior metadata when the image itself is unchanged
                let prior_image = prior_stored
                    .and_then(|p| p.get("image"))
                    .and_then(Value::as_str);
                if prior_image == Some(detail.image.as_str()) {
                    if detail.alt_text.is_none() {
                        detail.alt_text = Self::stored_alt_text(prior_stored);
                    }
                    if detail.id.is_none() {
                        detail.id = prior_stored
                            .and_then(|p| p.get("id"))
                            .and_then(Value::as_str)
                            .map(String::from);
                    }
                }
                serde_json::to_value(detail).unwrap_or(Value::Null)
            }
        };
        obj.insert(spec.stored_field.clone(), value);
        obj.remove(&spec.upload_field);
        if spec.retained_field != spec.stored_field {
            obj.remove(&spec.retained_field);
        }
    }
}
