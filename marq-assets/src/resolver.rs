use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use marq_blob::{
    is_base64_payload, AssetKeyStrategy, Base64Detector, BlobGateway, ObjectKey, UploadRequest,
};

use crate::image::{ImageDetail, IncomingImage};

/// Which mutation verb the resolver is running under.
///
/// On `Create` nothing stale can exist yet, so the cleanup instruction is
/// never executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

/// Removal of the blob currently attached to one entity field.
///
/// Built by the orchestrator from the value read *before* the update is
/// persisted, and executed by the resolver right before it uploads the
/// replacement. An explicit value instead of a callback: what gets removed
/// is decided once, up front, and is visible to tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupInstruction {
    pub entity_id: String,
    pub field: String,
    pub keys: Vec<ObjectKey>,
}

impl CleanupInstruction {
    pub fn new(entity_id: impl Into<String>, field: impl Into<String>, keys: Vec<ObjectKey>) -> Self {
        Self {
            entity_id: entity_id.into(),
            field: field.into(),
            keys,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Decides what an incoming image value is and acts on it.
///
/// Per call: exactly one upload or zero, and at most one stale-asset
/// removal, governed by the emptiness rules in [`resolve`](Self::resolve).
pub struct AssetResolver {
    gateway: Arc<dyn BlobGateway>,
    keys: Arc<dyn AssetKeyStrategy>,
    detect: Base64Detector,
}

impl AssetResolver {
    pub fn new(gateway: Arc<dyn BlobGateway>, keys: Arc<dyn AssetKeyStrategy>) -> Self {
        Self {
            gateway,
            keys,
            detect: is_base64_payload,
        }
    }

    /// Swap in a caller-supplied base64 predicate.
    pub fn with_detector(mut self, detect: Base64Detector) -> Self {
        self.detect = detect;
        self
    }

    /// Resolve the final stored reference for one image field.
    ///
    /// - incoming content and retained value both blank: the field has no
    ///   image, returns `None`.
    /// - incoming content is base64 (per the detector): executes `stale`
    ///   (unless `mode` is `Create`), uploads, and returns the refreshed
    ///   detail at the new location.
    /// - incoming content is non-blank but not base64: treated as a
    ///   pass-through URL; no upload, no deletion.
    /// - incoming blank, retained non-blank: the client did not touch the
    ///   image; the retained value passes through unchanged.
    pub async fn resolve(
        &self,
        entity_id: &str,
        retained: Option<&str>,
        incoming: Option<&IncomingImage>,
        category: &str,
        stale: Option<&CleanupInstruction>,
        mode: WriteMode,
    ) -> Result<Option<ImageDetail>> {
        let incoming = incoming.filter(|i| !i.content.trim().is_empty());
        let retained = retained.map(str::trim).filter(|s| !s.is_empty());

        let Some(fresh) = incoming else {
            return Ok(retained.map(ImageDetail::new));
        };

        if !(self.detect)(&fresh.content) {
            // not upload content: a URL the client chose to store verbatim
            return Ok(Some(
                ImageDetail::new(fresh.content.trim()).with_alt_text(fresh.alt_text.clone()),
            ));
        }

        if mode == WriteMode::Update {
            if let Some(instruction) = stale.filter(|i| !i.is_empty()) {
                debug!(
                    entity_id = instruction.entity_id.as_str(),
                    field = instruction.field.as_str(),
                    keys = instruction.keys.len(),
                    "removing stale asset before upload"
                );
                self.gateway.remove(&instruction.keys).await?;
            }
        }

        let receipt = self
            .gateway
            .upload(UploadRequest::new(
                self.keys.entity_prefix(category, entity_id),
                &fresh.file_id,
                &fresh.filetype,
                &fresh.content,
            ))
            .await?;
        debug!(entity_id, category, location = receipt.location.as_str(), "uploaded asset");

        Ok(Some(
            ImageDetail::new(receipt.location).with_alt_text(fresh.alt_text.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use marq_blob::{DefaultKeyStrategy, MemoryBlobGateway};

    fn resolver() -> (Arc<MemoryBlobGateway>, AssetResolver) {
        let gateway = Arc::new(MemoryBlobGateway::new());
        let resolver = AssetResolver::new(gateway.clone(), Arc::new(DefaultKeyStrategy::new()));
        (gateway, resolver)
    }

    fn payload() -> IncomingImage {
        let body = base64::engine::general_purpose::STANDARD.encode(b"png bytes");
        IncomingImage::new(body, "png").with_file_id("cover")
    }

    #[tokio::test]
    async fn both_blank_resolves_to_no_image() {
        let (gateway, resolver) = resolver();
        let detail = resolver
            .resolve("e1", Some("  "), None, "sliders", None, WriteMode::Update)
            .await
            .unwrap();
        assert!(detail.is_none());
        assert!(gateway.is_empty());
    }

    #[tokio::test]
    async fn fresh_payload_uploads_on_create_without_cleanup() {
        let (gateway, resolver) = resolver();
        let detail = resolver
            .resolve("e1", None, Some(&payload()), "sliders", None, WriteMode::Create)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.image, "memory://sliders/e1/cover.png");
        assert_eq!(gateway.len(), 1);
    }

    #[tokio::test]
    async fn update_removes_stale_keys_before_uploading() {
        let (gateway, resolver) = resolver();
        // seed the previous asset
        resolver
            .resolve("e1", None, Some(&payload()), "sliders", None, WriteMode::Create)
            .await
            .unwrap();
        let old_key = ObjectKey::new("sliders/e1/cover.png");
        assert!(gateway.contains(&old_key));

        let mut replacement = payload();
        replacement.filetype = "webp".into();
        let stale = CleanupInstruction::new("e1", "cover", vec![old_key.clone()]);
        let detail = resolver
            .resolve("e1", None, Some(&replacement), "sliders", Some(&stale), WriteMode::Update)
            .await
            .unwrap()
            .unwrap();

        assert!(!gateway.contains(&old_key));
        assert_eq!(detail.image, "memory://sliders/e1/cover.webp");
    }

    #[tokio::test]
    async fn non_base64_incoming_passes_through_without_side_effects() {
        let (gateway, resolver) = resolver();
        let incoming = IncomingImage::new("https://cdn.example.com/banner.png", "png");
        let stale = CleanupInstruction::new("e1", "cover", vec![ObjectKey::new("sliders/e1/x.png")]);
        let detail = resolver
            .resolve("e1", None, Some(&incoming), "sliders", Some(&stale), WriteMode::Update)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.image, "https://cdn.example.com/banner.png");
        assert!(gateway.is_empty());
    }

    #[tokio::test]
    async fn retained_value_passes_through_unchanged() {
        let (gateway, resolver) = resolver();
        let detail = resolver
            .resolve(
                "e1",
                Some("memory://sliders/e1/cover.png"),
                None,
                "sliders",
                None,
                WriteMode::Update,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.image, "memory://sliders/e1/cover.png");
        assert!(gateway.is_empty());
    }
}
