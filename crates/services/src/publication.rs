//! # Publication Service
//!
//! Orchestrates post creation end to end: topic resolution, sanitation,
//! validation, decoration, persistence, and the attachment lifecycle
//! (classify → normalize/transcode → store → record). Stages run strictly
//! in order and the first error short-circuits the rest; nothing is
//! retried automatically.

use std::sync::Arc;

use rand::Rng;
use tracing::{error, info, warn};
use uuid::Uuid;

use domains::{
    Attachment, AttachmentRepo, ImageMode, MediaClass, MediaLimits, MediaProcessor, ObjectStore,
    PipelineError, PipelineResult, Post, PostRepo, RandomLimitParams, TopicId, TopicRegistry,
    Upload,
};

use crate::decoration::decorate;
use crate::detect::classify;
use crate::sanitize::sanitize;
use crate::validator::{generate_limit_params, validate};

/// A post-creation request as received from the transport layer.
#[derive(Debug, Clone)]
pub struct CreatePostRequest {
    pub user_id: Uuid,
    pub text: String,
    pub topic_id: TopicId,
    /// Poll topics carry their option list alongside the question text.
    pub poll_options: Option<Vec<String>>,
    /// A retry of a rejected random-limit post resubmits the params it was
    /// issued. Fresh requests leave this empty and have params rolled here.
    pub limit_params: Option<RandomLimitParams>,
    pub upload: Option<Upload>,
}

/// Everything the caller gets back from a successful publication.
#[derive(Debug, Clone)]
pub struct Publication {
    pub post: Post,
    /// Issued bounds, echoed so the caller can resubmit them on retry.
    pub limit_params: Option<RandomLimitParams>,
    pub attachment: Option<Attachment>,
}

/// The pipeline root. One instance is shared across requests; each request
/// is an independent unit of work with no shared mutable state.
pub struct PublicationService {
    registry: TopicRegistry,
    posts: Arc<dyn PostRepo>,
    attachments: Arc<dyn AttachmentRepo>,
    store: Arc<dyn ObjectStore>,
    media: Arc<dyn MediaProcessor>,
    limits: MediaLimits,
    bucket: String,
}

impl PublicationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: TopicRegistry,
        posts: Arc<dyn PostRepo>,
        attachments: Arc<dyn AttachmentRepo>,
        store: Arc<dyn ObjectStore>,
        media: Arc<dyn MediaProcessor>,
        limits: MediaLimits,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            posts,
            attachments,
            store,
            media,
            limits,
            bucket: bucket.into(),
        }
    }

    /// Creates a post, running the full validation/decoration/media pipeline.
    pub async fn create_post<R: Rng + ?Sized>(
        &self,
        request: CreatePostRequest,
        rng: &mut R,
    ) -> PipelineResult<Publication> {
        let topic = self
            .registry
            .get(request.topic_id)
            .ok_or_else(|| {
                PipelineError::Validation(format!("unknown topic {}", request.topic_id))
            })?
            .clone();

        let text = sanitize(&request.text);

        // Bounds are rolled once; a retry reuses what it was issued.
        let limit_params = if topic.kind.needs_limit_params() {
            Some(
                request
                    .limit_params
                    .unwrap_or_else(|| generate_limit_params(rng)),
            )
        } else {
            None
        };

        validate(
            topic.kind,
            &text,
            request.poll_options.as_deref(),
            limit_params.as_ref(),
        )?;

        if topic.kind.requires_attachment() && request.upload.is_none() {
            return Err(PipelineError::Validation(format!(
                "the {} topic requires a media file",
                topic.name
            )));
        }

        let body = if topic.kind.decorates() {
            decorate(&text, rng)
        } else {
            text.clone()
        };

        let post = Post::new(request.user_id, body, topic.id);
        self.posts.insert(&post).await?;

        let attachment = match request.upload {
            Some(upload) => {
                let caption = topic.kind.composites_caption().then(|| text.clone());
                Some(
                    self.attach(request.user_id, post.id, &upload, caption)
                        .await?,
                )
            }
            None => None,
        };

        info!(
            post_id = %post.id,
            topic = %topic.name,
            has_attachment = attachment.is_some(),
            "post published"
        );

        Ok(Publication {
            post,
            limit_params,
            attachment,
        })
    }

    /// Runs one upload through classify → normalize/transcode → store →
    /// record. The object key is derived from `{user_id}-{post_id}`, so two
    /// concurrent creates can never collide on a key.
    async fn attach(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        upload: &Upload,
        caption: Option<String>,
    ) -> PipelineResult<Attachment> {
        let class = classify(upload, &self.limits)?;

        let processed = match class {
            MediaClass::Image(image_class) => {
                let mode = match caption {
                    Some(text) => ImageMode::Caption(text),
                    None => ImageMode::Standard,
                };
                self.media.normalize_image(upload, image_class, mode).await?
            }
            MediaClass::Audio => self.media.transcode_audio(upload).await?,
        };

        let key = Attachment::object_key(user_id, post_id, &processed.extension);
        self.store
            .put_object(
                &self.bucket,
                &key,
                processed.bytes.clone(),
                &processed.mime_type,
            )
            .await?;

        let attachment = Attachment {
            id: Uuid::now_v7(),
            user_id,
            post_id,
            file_path: Attachment::file_path(&self.bucket, &key),
            mime_type: processed.mime_type,
        };

        // The object is already durable; if the row insert fails we roll the
        // write back so no orphaned object survives the error.
        if let Err(insert_err) = self.attachments.insert(&attachment).await {
            warn!(%key, error = %insert_err, "attachment insert failed, rolling back object");
            if let Err(cleanup_err) = self.store.remove_object(&self.bucket, &key).await {
                error!(%key, error = %cleanup_err, "rollback of stored object failed");
            }
            return Err(insert_err);
        }

        Ok(attachment)
    }

    /// Removes one post's attachment, or every attachment of a user when
    /// `post_id` is `None`. Returns how many attachments were removed.
    pub async fn remove_attachments(
        &self,
        user_id: Uuid,
        post_id: Option<Uuid>,
    ) -> PipelineResult<usize> {
        let targets = match post_id {
            Some(post_id) => {
                let attachment = self
                    .attachments
                    .find_by_post(user_id, post_id)
                    .await?
                    .ok_or_else(|| {
                        PipelineError::NotFound("attachment".into(), post_id.to_string())
                    })?;
                vec![attachment]
            }
            None => self.attachments.list_by_user(user_id).await?,
        };

        for attachment in &targets {
            let (bucket, key) =
                Attachment::split_file_path(&attachment.file_path).ok_or_else(|| {
                    PipelineError::Persistence(format!(
                        "malformed attachment path \"{}\"",
                        attachment.file_path
                    ))
                })?;
            self.store.remove_object(bucket, key).await?;
            self.attachments.delete(attachment.id).await?;
            info!(attachment_id = %attachment.id, %key, "attachment removed");
        }

        Ok(targets.len())
    }
}
