//! # Format Detector
//!
//! Classifies an upload from its declared MIME type, falling back to the
//! filename extension. The size ceiling is enforced here, before anyone
//! attempts to decode anything; oversize or unrecognized uploads are
//! rejected without processing.

use domains::{ImageClass, MediaClass, MediaLimits, PipelineError, PipelineResult, Upload};

/// Classifies `upload` into exactly one accepted media class.
pub fn classify(upload: &Upload, limits: &MediaLimits) -> PipelineResult<MediaClass> {
    if upload.bytes.len() > limits.max_file_size_bytes {
        return Err(PipelineError::Validation(format!(
            "file is {} bytes, limit is {}",
            upload.bytes.len(),
            limits.max_file_size_bytes
        )));
    }

    let mime = resolve_mime(upload);
    match mime.as_deref() {
        Some("image/jpeg" | "image/png" | "image/webp") => {
            Ok(MediaClass::Image(ImageClass::default()))
        }
        // Re-encoding would destroy animation; gif passes through untouched.
        Some("image/gif") => Ok(MediaClass::Image(ImageClass {
            needs_conversion: false,
            animated: true,
        })),
        Some("image/heic" | "image/heif" | "image/heic-sequence" | "image/heif-sequence") => {
            Ok(MediaClass::Image(ImageClass {
                needs_conversion: true,
                animated: false,
            }))
        }
        Some(
            "audio/mpeg" | "audio/mp3" | "audio/mp4" | "audio/aac" | "audio/ogg"
            | "audio/vorbis" | "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/flac"
            | "audio/x-flac" | "audio/m4a" | "audio/x-m4a",
        ) => Ok(MediaClass::Audio),
        Some(other) => Err(PipelineError::Validation(format!(
            "unsupported file type \"{other}\""
        ))),
        None => Err(PipelineError::Validation(format!(
            "could not determine the type of \"{}\"",
            upload.file_name
        ))),
    }
}

/// Declared MIME first; a missing or generic declaration falls back to the
/// filename extension.
fn resolve_mime(upload: &Upload) -> Option<String> {
    if let Some(declared) = upload.declared_mime.as_deref() {
        let declared = declared.trim().to_ascii_lowercase();
        if !declared.is_empty() && declared != "application/octet-stream" {
            return Some(declared);
        }
    }
    let ext = std::path::Path::new(&upload.file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    // mime_guess has no HEIC mapping, so cover the conversion class here.
    match ext.as_str() {
        "heic" | "heif" => Some("image/heic".to_string()),
        _ => mime_guess::from_ext(&ext)
            .first_raw()
            .map(|m| m.to_ascii_lowercase()),
    }
}
