use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::BlobResult;

/// Key addressing one object in blob storage
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey(pub String);

impl ObjectKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A base64-encoded upload, addressed by `(filepath, file_id, filetype)`.
///
/// The stored object key is `{filepath}/{file_id}.{filetype}`.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filepath: String,
    pub file_id: String,
    pub filetype: String,
    pub base64: String,
}

impl UploadRequest {
    pub fn new(
        filepath: impl Into<String>,
        file_id: impl Into<String>,
        filetype: impl Into<String>,
        base64: impl Into<String>,
    ) -> Self {
        Self {
            filepath: filepath.into(),
            file_id: file_id.into(),
            filetype: filetype.into(),
            base64: base64.into(),
        }
    }

    /// The object key this request stores under.
    pub fn object_key(&self) -> ObjectKey {
        ObjectKey::new(format!(
            "{}/{}.{}",
            self.filepath.trim_matches('/'),
            self.file_id,
            self.filetype
        ))
    }
}

/// Result of a successful upload: the public location of the object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub location: String,
}

/// Blob storage operations the content core consumes.
///
/// Removal is idempotent: unknown keys are skipped, not errors, so cleanup
/// can always run even when a previous attempt half-finished.
#[async_trait]
pub trait BlobGateway: Send + Sync {
    /// Decode and store a base64 payload, returning its public location.
    async fn upload(&self, request: UploadRequest) -> BlobResult<UploadReceipt>;

    /// Remove objects by key.
    async fn remove(&self, keys: &[ObjectKey]) -> BlobResult<()>;

    /// Duplicate a stored object under a new key.
    async fn copy(&self, from: &ObjectKey, to: &ObjectKey) -> BlobResult<UploadReceipt>;

    /// Translate a public location back to the object key it was minted
    /// from; `None` when the location is not one of this gateway's objects.
    fn key_for_location(&self, location: &str) -> Option<ObjectKey>;
}
