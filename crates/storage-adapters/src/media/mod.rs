//! # Media Processing Adapter
//!
//! Implements the `MediaProcessor` port: images run through the staged
//! normalizer (decode/convert, reorient, resize, optionally composite a
//! caption, re-encode), audio runs through the external-process transcoder.
//! CPU-bound image work is pushed onto the blocking pool.

pub mod audio;
pub mod caption;
#[cfg(feature = "media-heif")]
pub mod heif;
pub mod normalize;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use domains::{
    ImageClass, ImageMode, MediaProcessor, PipelineError, PipelineResult, ProcessedMedia, Upload,
};

use self::audio::{AudioTranscoder, CANONICAL_AUDIO_EXT, CANONICAL_AUDIO_MIME};
use self::caption::CaptionRenderer;
use self::normalize::{CANONICAL_IMAGE_EXT, CANONICAL_IMAGE_MIME};

/// Everything the processor needs, resolved from configuration.
#[derive(Debug, Clone)]
pub struct MediaSettings {
    pub max_pixel_size: u32,
    /// TTF/OTF face for mova-pic captions; without one, caption mode fails.
    pub caption_font_path: Option<PathBuf>,
    pub caption_point_size: f32,
    pub caption_margin_px: u32,
    pub ffmpeg_path: PathBuf,
    pub audio_bitrate_kbps: u32,
    pub transcode_timeout: Duration,
}

/// The production `MediaProcessor`.
pub struct StandardMediaProcessor {
    max_pixel_size: u32,
    caption: Option<Arc<CaptionRenderer>>,
    transcoder: AudioTranscoder,
}

impl StandardMediaProcessor {
    pub fn new(settings: MediaSettings) -> PipelineResult<Self> {
        let caption = settings
            .caption_font_path
            .as_deref()
            .map(|path| {
                CaptionRenderer::from_file(
                    path,
                    settings.caption_point_size,
                    settings.caption_margin_px,
                )
                .map(Arc::new)
            })
            .transpose()?;

        Ok(Self {
            max_pixel_size: settings.max_pixel_size,
            caption,
            transcoder: AudioTranscoder::new(
                settings.ffmpeg_path,
                settings.audio_bitrate_kbps,
                settings.transcode_timeout,
            ),
        })
    }
}

#[async_trait]
impl MediaProcessor for StandardMediaProcessor {
    async fn normalize_image(
        &self,
        upload: &Upload,
        class: ImageClass,
        mode: ImageMode,
    ) -> PipelineResult<ProcessedMedia> {
        // Animated sources are passed through byte-for-byte; any rotation
        // or re-encode would flatten them to a single frame. That also rules
        // out caption compositing, so caption mode rejects them outright.
        if class.animated {
            if matches!(mode, ImageMode::Caption(_)) {
                return Err(PipelineError::Validation(
                    "captions cannot be composited onto animated uploads".into(),
                ));
            }
            info!(file = %upload.file_name, "animated source, passing through");
            return Ok(ProcessedMedia {
                bytes: upload.bytes.clone(),
                mime_type: "image/gif".to_string(),
                extension: ".gif".to_string(),
            });
        }

        let raw = upload.bytes.clone();
        let max_pixel_size = self.max_pixel_size;
        let renderer = self.caption.clone();

        let encoded = tokio::task::spawn_blocking(move || -> PipelineResult<Vec<u8>> {
            let orientation = normalize::exif_orientation(&raw);
            let decoded = normalize::decode(&raw, class.needs_conversion)?;
            let rotated = normalize::rotate(decoded, orientation);
            let resized = normalize::resize(rotated, max_pixel_size);

            let frame = match mode {
                ImageMode::Standard => resized.0,
                ImageMode::Caption(text) => {
                    let renderer = renderer.ok_or_else(|| {
                        PipelineError::Processing("no caption font configured".into())
                    })?;
                    renderer.composite(resized.0, &text)?
                }
            };

            Ok(normalize::encode(frame)?.bytes)
        })
        .await
        .map_err(|err| PipelineError::Processing(format!("image task failed: {err}")))??;

        Ok(ProcessedMedia {
            bytes: Bytes::from(encoded),
            mime_type: CANONICAL_IMAGE_MIME.to_string(),
            extension: CANONICAL_IMAGE_EXT.to_string(),
        })
    }

    async fn transcode_audio(&self, upload: &Upload) -> PipelineResult<ProcessedMedia> {
        let encoded = self.transcoder.transcode(&upload.bytes).await?;
        Ok(ProcessedMedia {
            bytes: encoded,
            mime_type: CANONICAL_AUDIO_MIME.to_string(),
            extension: CANONICAL_AUDIO_EXT.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn settings() -> MediaSettings {
        MediaSettings {
            max_pixel_size: 1024,
            caption_font_path: None,
            caption_point_size: 24.0,
            caption_margin_px: 8,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            audio_bitrate_kbps: 128,
            transcode_timeout: Duration::from_secs(30),
        }
    }

    fn png_upload(width: u32, height: u32) -> Upload {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        Upload {
            file_name: "input.png".to_string(),
            declared_mime: Some("image/png".to_string()),
            bytes: Bytes::from(buf.into_inner()),
        }
    }

    #[tokio::test]
    async fn normalized_output_is_canonical_jpeg() {
        let processor = StandardMediaProcessor::new(settings()).unwrap();
        let media = processor
            .normalize_image(&png_upload(2048, 1024), ImageClass::default(), ImageMode::Standard)
            .await
            .unwrap();

        assert_eq!(media.mime_type, "image/jpeg");
        assert_eq!(media.extension, ".jpg");
        let img = image::load_from_memory(&media.bytes).unwrap();
        assert_eq!((img.width(), img.height()), (1024, 512));
    }

    #[tokio::test]
    async fn animated_uploads_pass_through_unchanged() {
        let processor = StandardMediaProcessor::new(settings()).unwrap();
        let upload = Upload {
            file_name: "loop.gif".to_string(),
            declared_mime: Some("image/gif".to_string()),
            bytes: Bytes::from_static(b"GIF89a-pretend-payload"),
        };
        let class = ImageClass { needs_conversion: false, animated: true };
        let media = processor
            .normalize_image(&upload, class, ImageMode::Standard)
            .await
            .unwrap();

        assert_eq!(media.bytes, upload.bytes);
        assert_eq!(media.mime_type, "image/gif");
        assert_eq!(media.extension, ".gif");
    }

    #[tokio::test]
    async fn caption_mode_rejects_animated_uploads() {
        let processor = StandardMediaProcessor::new(settings()).unwrap();
        let upload = Upload {
            file_name: "loop.gif".to_string(),
            declared_mime: Some("image/gif".to_string()),
            bytes: Bytes::from_static(b"GIF89a-pretend-payload"),
        };
        let class = ImageClass { needs_conversion: false, animated: true };
        let err = processor
            .normalize_image(&upload, class, ImageMode::Caption("lunch".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn caption_mode_without_a_font_is_a_processing_error() {
        let processor = StandardMediaProcessor::new(settings()).unwrap();
        let err = processor
            .normalize_image(
                &png_upload(64, 64),
                ImageClass::default(),
                ImageMode::Caption("hello".to_string()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Processing(_)));
    }

    #[tokio::test]
    async fn undecodable_bytes_are_a_processing_error() {
        let processor = StandardMediaProcessor::new(settings()).unwrap();
        let upload = Upload {
            file_name: "broken.png".to_string(),
            declared_mime: Some("image/png".to_string()),
            bytes: Bytes::from_static(b"definitely not a png"),
        };
        let err = processor
            .normalize_image(&upload, ImageClass::default(), ImageMode::Standard)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Processing(_)));
    }

    #[cfg(not(feature = "media-heif"))]
    #[tokio::test]
    async fn heif_without_the_feature_reports_processing_error() {
        let processor = StandardMediaProcessor::new(settings()).unwrap();
        let upload = Upload {
            file_name: "photo.heic".to_string(),
            declared_mime: Some("image/heic".to_string()),
            bytes: Bytes::from_static(b"heic payload"),
        };
        let class = ImageClass { needs_conversion: true, animated: false };
        let err = processor
            .normalize_image(&upload, class, ImageMode::Standard)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Processing(_)));
    }
}
