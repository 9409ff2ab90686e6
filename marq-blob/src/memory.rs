use std::collections::HashMap;

use async_trait::async_trait;
use base64::Engine;
use parking_lot::RwLock;

use crate::{BlobError, BlobGateway, BlobResult, ObjectKey, UploadReceipt, UploadRequest};

const LOCATION_SCHEME: &str = "memory://";

/// In-memory gateway for testing and development.
///
/// Locations are shaped `memory://{key}` so the location/key translation
/// paths behave like a real bucket's public URLs.
#[derive(Default)]
pub struct MemoryBlobGateway {
    objects: RwLock<HashMap<ObjectKey, Vec<u8>>>,
}

impl MemoryBlobGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an object is stored under `key`.
    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.objects.read().contains_key(key)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// All stored keys, for test assertions.
    pub fn keys(&self) -> Vec<ObjectKey> {
        self.objects.read().keys().cloned().collect()
    }

    fn location_for(key: &ObjectKey) -> String {
        format!("{LOCATION_SCHEME}{key}")
    }
}

#[async_trait]
impl BlobGateway for MemoryBlobGateway {
    async fn upload(&self, request: UploadRequest) -> BlobResult<UploadReceipt> {
        if request.base64.trim().is_empty() {
            return Err(BlobError::invalid("empty upload payload"));
        }
        // tolerate data-URI payloads the same way real gateways do
        let body = request
            .base64
            .split_once(',')
            .map(|(_, body)| body)
            .unwrap_or(&request.base64);
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(body.trim())
            .map_err(|e| BlobError::decode(e.to_string()))?;

        let key = request.object_key();
        self.objects.write().insert(key.clone(), bytes);
        Ok(UploadReceipt {
            location: Self::location_for(&key),
        })
    }

    async fn remove(&self, keys: &[ObjectKey]) -> BlobResult<()> {
        let mut objects = self.objects.write();
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }

    async fn copy(&self, from: &ObjectKey, to: &ObjectKey) -> BlobResult<UploadReceipt> {
        let mut objects = self.objects.write();
        let bytes = objects
            .get(from)
            .cloned()
            .ok_or_else(|| BlobError::not_found(from.as_str()))?;
        objects.insert(to.clone(), bytes);
        Ok(UploadReceipt {
            location: Self::location_for(to),
        })
    }

    fn key_for_location(&self, location: &str) -> Option<ObjectKey> {
        location
            .strip_prefix(LOCATION_SCHEME)
            .filter(|key| !key.is_empty())
            .map(ObjectKey::new)
    }
}
