//! # Pipeline Ports
//!
//! Any adapter must implement these traits to be wired into the binary.
//! The object store and the repositories are opaque collaborators: the
//! pipeline never looks inside either.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::PipelineResult;
use crate::models::{Attachment, ImageClass, ImageMode, Post, ProcessedMedia, Upload};

/// Bucket/key byte storage. Keys are derived by the caller; the store is
/// never asked to enumerate or inspect its contents.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> PipelineResult<()>;

    async fn remove_object(&self, bucket: &str, key: &str) -> PipelineResult<()>;

    async fn bucket_exists(&self, bucket: &str) -> PipelineResult<bool>;

    async fn make_bucket(&self, bucket: &str) -> PipelineResult<()>;
}

/// Persistence contract for post rows. Only creation is needed here; the
/// timeline/query layer owns the read side.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    async fn insert(&self, post: &Post) -> PipelineResult<()>;
}

/// Persistence contract for attachment rows, keyed by `(user_id, post_id)`
/// or by row id.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AttachmentRepo: Send + Sync {
    async fn insert(&self, attachment: &Attachment) -> PipelineResult<()>;

    async fn find_by_post(&self, user_id: Uuid, post_id: Uuid)
        -> PipelineResult<Option<Attachment>>;

    async fn list_by_user(&self, user_id: Uuid) -> PipelineResult<Vec<Attachment>>;

    /// Must affect exactly one row; anything else is a persistence anomaly.
    async fn delete(&self, id: Uuid) -> PipelineResult<()>;
}

/// Media normalization contract: arbitrary accepted uploads in, one
/// canonical artifact out.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Reorient, resize and re-encode an image upload; `Caption` mode
    /// additionally composites the text onto the frame.
    async fn normalize_image(
        &self,
        upload: &Upload,
        class: ImageClass,
        mode: ImageMode,
    ) -> PipelineResult<ProcessedMedia>;

    /// Transcode an audio upload to the canonical codec/bitrate.
    async fn transcode_audio(&self, upload: &Upload) -> PipelineResult<ProcessedMedia>;
}
