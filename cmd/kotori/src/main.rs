//! # kotori binary
//!
//! A one-shot publisher that wires the feature-selected adapters together,
//! mainly for smoke-testing a deployment from the command line. The same
//! `PublicationService` is what an HTTP layer would mount.
//!
//! ```text
//! kotori publish <user-uuid> <topic-id> <text> [file]
//! kotori remove  <user-uuid> [post-uuid]
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use bytes::Bytes;
use secrecy::ExposeSecret;
use uuid::Uuid;

use configs::{AppConfig, StorageBackend};
use domains::{AttachmentRepo, ObjectStore, PostRepo, TopicId, TopicRegistry, Upload};
use services::{CreatePostRequest, PublicationService};
use storage_adapters::{MediaSettings, StandardMediaProcessor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let service = build_service(&config).await?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("publish") => publish(&service, &args[1..]).await,
        Some("remove") => remove(&service, &args[1..]).await,
        _ => {
            eprintln!("usage: kotori publish <user-uuid> <topic-id> <text> [file]");
            eprintln!("       kotori remove  <user-uuid> [post-uuid]");
            std::process::exit(2);
        }
    }
}

async fn publish(service: &PublicationService, args: &[String]) -> anyhow::Result<()> {
    let [user, topic, text, rest @ ..] = args else {
        bail!("publish needs <user-uuid> <topic-id> <text> [file]");
    };
    let user_id: Uuid = user.parse().context("user id must be a UUID")?;
    let topic_id = TopicId(topic.parse().context("topic id must be an integer")?);

    let upload = match rest.first() {
        Some(path) => Some(read_upload(Path::new(path)).await?),
        None => None,
    };

    let request = CreatePostRequest {
        user_id,
        text: text.clone(),
        topic_id,
        poll_options: None,
        limit_params: None,
        upload,
    };

    let publication = service.create_post(request, &mut rand::rng()).await?;
    println!("post {}", publication.post.id);
    if let Some(params) = publication.limit_params {
        println!("issued limit params: {params:?}");
    }
    if let Some(attachment) = publication.attachment {
        println!("attachment stored at {}", attachment.file_path);
    }
    Ok(())
}

async fn remove(service: &PublicationService, args: &[String]) -> anyhow::Result<()> {
    let [user, rest @ ..] = args else {
        bail!("remove needs <user-uuid> [post-uuid]");
    };
    let user_id: Uuid = user.parse().context("user id must be a UUID")?;
    let post_id = rest
        .first()
        .map(|p| p.parse::<Uuid>().context("post id must be a UUID"))
        .transpose()?;

    let removed = service.remove_attachments(user_id, post_id).await?;
    println!("removed {removed} attachment(s)");
    Ok(())
}

async fn read_upload(path: &Path) -> anyhow::Result<Upload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let declared_mime = mime_guess::from_path(path).first_raw().map(str::to_string);
    Ok(Upload {
        file_name,
        declared_mime,
        bytes: Bytes::from(bytes),
    })
}

async fn build_service(config: &AppConfig) -> anyhow::Result<PublicationService> {
    let (posts, attachments) = connect_repos(config).await?;

    let store: Arc<dyn ObjectStore> = match config.storage.backend {
        StorageBackend::Local => local_store(config)?,
        StorageBackend::S3 => s3_store().await?,
    };

    if !store.bucket_exists(&config.storage.bucket).await? {
        store.make_bucket(&config.storage.bucket).await?;
        tracing::info!(bucket = %config.storage.bucket, "created attachment bucket");
    }

    let processor = StandardMediaProcessor::new(MediaSettings {
        max_pixel_size: config.media.max_pixel_size,
        caption_font_path: config.media.caption_font_path.clone(),
        caption_point_size: config.media.caption_point_size,
        caption_margin_px: config.media.caption_margin_px,
        ffmpeg_path: config.media.ffmpeg_path.clone(),
        audio_bitrate_kbps: config.media.audio_bitrate_kbps,
        transcode_timeout: Duration::from_secs(config.media.transcode_timeout_secs),
    })?;

    Ok(PublicationService::new(
        TopicRegistry::builtin(),
        posts,
        attachments,
        store,
        Arc::new(processor),
        domains::MediaLimits {
            max_file_size_bytes: config.media.max_file_size_bytes,
            max_pixel_size: config.media.max_pixel_size,
        },
        config.storage.bucket.clone(),
    ))
}

#[cfg(feature = "db-postgres")]
async fn connect_repos(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn PostRepo>, Arc<dyn AttachmentRepo>)> {
    use storage_adapters::repo::{PgAttachmentRepo, PgPostRepo};

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(4)
        .connect(config.database.url.expose_secret())
        .await
        .context("connecting to postgres")?;
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("running migrations")?;

    Ok((
        Arc::new(PgPostRepo::new(pool.clone())),
        Arc::new(PgAttachmentRepo::new(pool)),
    ))
}

#[cfg(not(feature = "db-postgres"))]
async fn connect_repos(
    _config: &AppConfig,
) -> anyhow::Result<(Arc<dyn PostRepo>, Arc<dyn AttachmentRepo>)> {
    bail!("this build has no database backend (enable the db-postgres feature)")
}

#[cfg(feature = "media-local")]
fn local_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ObjectStore>> {
    use storage_adapters::object_store::LocalObjectStore;
    Ok(Arc::new(LocalObjectStore::new(
        config.storage.root_path.clone(),
    )))
}

#[cfg(not(feature = "media-local"))]
fn local_store(_config: &AppConfig) -> anyhow::Result<Arc<dyn ObjectStore>> {
    bail!("this build has no local storage backend (enable the media-local feature)")
}

#[cfg(feature = "media-s3")]
async fn s3_store() -> anyhow::Result<Arc<dyn ObjectStore>> {
    use storage_adapters::object_store::S3ObjectStore;
    Ok(Arc::new(S3ObjectStore::from_env().await))
}

#[cfg(not(feature = "media-s3"))]
async fn s3_store() -> anyhow::Result<Arc<dyn ObjectStore>> {
    bail!("this build has no S3 backend (enable the media-s3 feature)")
}
