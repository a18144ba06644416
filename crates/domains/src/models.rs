//! # Domain Models
//!
//! Core entities of the kotori publication pipeline.
//! We use UUID v7 for time-ordered, globally unique identification; the
//! storage-key scheme relies on post ids being monotone at creation time.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::topics::TopicId;

/// The fundamental unit of publication. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Sanitized (and, for decoration topics, decorated) body text.
    pub text: String,
    pub topic_id: TopicId,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(user_id: Uuid, text: String, topic_id: TopicId) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            text,
            topic_id,
            created_at: Utc::now(),
        }
    }
}

/// The single stored media artifact linked 1:1 to a post.
///
/// `file_path` is the caller-visible `/{bucket}/{key}` path; the row exists
/// iff the backing object exists in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub file_path: String,
    pub mime_type: String,
}

impl Attachment {
    /// Deterministic object key for a post's one attachment.
    /// `extension` carries its dot (".jpg").
    pub fn object_key(user_id: Uuid, post_id: Uuid, extension: &str) -> String {
        format!("{user_id}-{post_id}-00{extension}")
    }

    pub fn file_path(bucket: &str, key: &str) -> String {
        format!("/{bucket}/{key}")
    }

    /// Splits a stored `/{bucket}/{key}` path back into (bucket, key).
    pub fn split_file_path(path: &str) -> Option<(&str, &str)> {
        path.strip_prefix('/')?.split_once('/')
    }
}

/// Which bound(s) a random-limit topic enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitMode {
    Min,
    Max,
    MinMax,
}

/// Length bounds rolled once per post for the random-limit topic.
///
/// Treated as an *input* after generation: a retried request must carry the
/// params it was issued, otherwise validation would not be reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomLimitParams {
    pub mode: LimitMode,
    pub min: Option<u32>,
    pub max: Option<u32>,
}

/// A raw user upload, exactly as received.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    /// MIME type declared by the client; may be absent or lying.
    pub declared_mime: Option<String>,
    pub bytes: Bytes,
}

/// Detector verdict for an accepted image upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageClass {
    /// HEIC/HEIF containers must be converted before decoding.
    pub needs_conversion: bool,
    /// Animated-capable sources bypass rotate/resize/re-encode.
    pub animated: bool,
}

/// Detector verdict for an accepted upload. Rejection is an error, not a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    Image(ImageClass),
    Audio,
}

/// How the image normalizer should treat an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageMode {
    Standard,
    /// Mova-pic: composite the sanitized caption onto the resized image.
    Caption(String),
}

/// The canonical artifact leaving the media stage. `extension` carries
/// its dot and always reflects the *final* encoded format.
#[derive(Debug, Clone)]
pub struct ProcessedMedia {
    pub bytes: Bytes,
    pub mime_type: String,
    pub extension: String,
}

/// Fixed ceilings applied before any decoding is attempted.
#[derive(Debug, Clone, Copy)]
pub struct MediaLimits {
    pub max_file_size_bytes: usize,
    pub max_pixel_size: u32,
}
