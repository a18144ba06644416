//! # configs
//!
//! Layered configuration for the kotori binary: built-in defaults, then an
//! optional file named by `KOTORI_CONFIG`, then `KOTORI_*` environment
//! variables (highest precedence). `.env` is loaded by the binary before
//! this runs, so dotenv values arrive through the environment layer.

use std::path::PathBuf;

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration load failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string; kept out of logs.
    pub url: SecretString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Bucket that holds post attachments.
    pub bucket: String,
    /// Root directory for the local backend.
    pub root_path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct MediaConfig {
    pub max_file_size_bytes: usize,
    /// Longest allowed image edge after normalization.
    pub max_pixel_size: u32,
    pub caption_font_path: Option<PathBuf>,
    pub caption_point_size: f32,
    pub caption_margin_px: u32,
    pub ffmpeg_path: PathBuf,
    pub audio_bitrate_kbps: u32,
    pub transcode_timeout_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("database.url", "postgres://localhost/kotori")?
            .set_default("storage.backend", "local")?
            .set_default("storage.bucket", "attachments")?
            .set_default("storage.root_path", "./data/objects")?
            .set_default("media.max_file_size_bytes", 10 * 1024 * 1024i64)?
            .set_default("media.max_pixel_size", 1024)?
            .set_default("media.caption_point_size", 28.0)?
            .set_default("media.caption_margin_px", 16)?
            .set_default("media.ffmpeg_path", "ffmpeg")?
            .set_default("media.audio_bitrate_kbps", 128)?
            .set_default("media.transcode_timeout_secs", 60)?;

        if let Ok(path) = std::env::var("KOTORI_CONFIG") {
            tracing::debug!(%path, "loading configuration file");
            builder = builder.add_source(config::File::with_name(&path));
        }

        let settings: AppConfig = builder
            .add_source(config::Environment::with_prefix("KOTORI").separator("__"))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.media.max_file_size_bytes == 0 {
            return Err(ConfigError::Invalid("media.max_file_size_bytes is 0".into()));
        }
        if self.media.max_pixel_size == 0 {
            return Err(ConfigError::Invalid("media.max_pixel_size is 0".into()));
        }
        if self.media.transcode_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "media.transcode_timeout_secs is 0".into(),
            ));
        }
        if self.storage.bucket.trim().is_empty() {
            return Err(ConfigError::Invalid("storage.bucket is empty".into()));
        }
        Ok(())
    }
}
