//! marq-assets: asset lifecycle for MarqRS content entities.
//!
//! Every content mutation that touches an image-bearing field goes through
//! this crate, which keeps blob storage in lock-step with the persisted
//! entity:
//!
//! - [`AssetResolver`] decides what an incoming image value *is* (fresh
//!   base64 content to upload, a retained URL to pass through, or nothing)
//!   and performs the upload plus the stale-blob removal at the right
//!   moment.
//! - [`AssetLifecycle`] wraps the resolver around the entity verbs
//!   (create / update / clone / remove), owning the read-then-remove
//!   ordering on update, blob duplication on clone, and the soft delete on
//!   remove.
//! - [`SlugGenerator`] produces collision-free slugs by probing the target
//!   collection, re-probing after every suffix before accepting.
//!
//! Which fields carry assets, and in what shape, is declared per entity
//! with [`AssetFieldSpec`]: an explicit registration, never inferred from
//! field naming conventions.

mod image;
mod lifecycle;
mod resolver;
mod slug;

pub use image::{ImageDetail, IncomingImage, UploadPayload};
pub use lifecycle::{AssetFieldKind, AssetFieldSpec, AssetLifecycle};
pub use resolver::{AssetResolver, CleanupInstruction, WriteMode};
pub use slug::{slugify, SlugGenerator};
