use serde::{Deserialize, Serialize};

/// Persisted pairing of an asset's storage location with its metadata.
///
/// Owned by the entity that embeds it and never shared: cloning an entity
/// produces a new blob copy and a new detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Public location of the asset (or an external URL).
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl ImageDetail {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            id: None,
            image: image.into(),
            alt_text: None,
        }
    }

    pub fn with_alt_text(mut self, alt_text: Option<String>) -> Self {
        self.alt_text = alt_text;
        self
    }
}

/// Wire shape of a fresh upload as mutations submit it.
///
/// Transient: exists only for the duration of one mutation, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPayload {
    /// Base64-encoded file body.
    pub img: String,
    pub filetype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

/// One candidate image value handed to the resolver.
///
/// `content` is either a base64 body (fresh upload) or a URL; the resolver's
/// detector decides which.
#[derive(Debug, Clone)]
pub struct IncomingImage {
    pub content: String,
    pub filetype: String,
    /// File stem of the stored object; defaults to `"image"`.
    pub file_id: String,
    pub alt_text: Option<String>,
}

impl IncomingImage {
    pub fn new(content: impl Into<String>, filetype: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            filetype: filetype.into(),
            file_id: "image".to_string(),
            alt_text: None,
        }
    }

    pub fn from_payload(payload: UploadPayload) -> Self {
        Self {
            content: payload.img,
            filetype: payload.filetype,
            file_id: "image".to_string(),
            alt_text: payload.alt_text,
        }
    }

    pub fn with_file_id(mut self, file_id: impl Into<String>) -> Self {
        self.file_id = file_id.into();
        self
    }

    pub fn with_alt_text(mut self, alt_text: Option<String>) -> Self {
        self.alt_text = alt_text;
        self
    }
}
