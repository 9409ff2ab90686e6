//! marq-blob: blob store gateway capability for MarqRS.
//!
//! Content entities reference binary assets (images, mostly) by public
//! location. This crate owns the seam between those references and the
//! actual object storage:
//!
//! - [`BlobGateway`]: upload a base64 payload, remove objects by key, copy
//!   an object under a new key, and translate a public location back to the
//!   object key it was minted from.
//! - [`AssetKeyStrategy`]: derive object keys from `(category, entity)` so
//!   concurrent mutations on different entities can never collide.
//! - [`is_base64_payload`]: the predicate that separates fresh upload
//!   content from retained URLs. The asset resolver injects it; callers can
//!   swap in their own.
//!
//! The concrete store (S3, GCS, filesystem) implements `BlobGateway`;
//! [`MemoryBlobGateway`] ships for tests and development.

mod detect;
mod error;
mod gateway;
mod keys;
mod memory;

pub use detect::{is_base64_payload, Base64Detector};
pub use error::{BlobError, BlobResult};
pub use gateway::{BlobGateway, ObjectKey, UploadReceipt, UploadRequest};
pub use keys::{AssetKeyStrategy, DefaultKeyStrategy};
pub use memory::MemoryBlobGateway;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AssetKeyStrategy, BlobError, BlobGateway, BlobResult, ObjectKey, UploadReceipt,
        UploadRequest,
    };
}
