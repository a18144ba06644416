//! HEIC/HEIF container conversion via libheif. Compiled only with the
//! `media-heif` feature; the decoded frame feeds the normal rotate/resize
//! stages.

use image::{DynamicImage, RgbImage};
use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

use domains::{PipelineError, PipelineResult};

fn heif_err(context: &str, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::Processing(format!("heif {context}: {err}"))
}

/// Decodes the primary image of a HEIC/HEIF container into an RGB frame.
pub fn convert_to_rgb(raw: &[u8]) -> PipelineResult<DynamicImage> {
    let lib_heif = LibHeif::new();
    let context = HeifContext::read_from_bytes(raw).map_err(|e| heif_err("parse", e))?;
    let handle = context
        .primary_image_handle()
        .map_err(|e| heif_err("primary image", e))?;
    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| heif_err("decode", e))?;

    let width = decoded.width();
    let height = decoded.height();
    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| PipelineError::Processing("heif decode yielded no pixel plane".into()))?;

    // The decoder's rows are stride-aligned; repack them tightly.
    let row_bytes = width as usize * 3;
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * plane.stride;
        pixels.extend_from_slice(&plane.data[start..start + row_bytes]);
    }

    let rgb = RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| PipelineError::Processing("heif plane size mismatch".into()))?;
    Ok(DynamicImage::ImageRgb8(rgb))
}
