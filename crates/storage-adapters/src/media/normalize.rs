//! # Image Normalizer
//!
//! The image path of the media pipeline, written as an explicit chain of
//! named stages: `Raw → Decoded → Rotated → Resized → Encoded` (with an
//! optional compositing step between resize and encode). Each stage is a
//! pure function consuming the previous stage's type, so there is no
//! mutable buffer switching meaning between branches.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use domains::{PipelineError, PipelineResult};

/// Canonical still-image output.
pub const CANONICAL_IMAGE_MIME: &str = "image/jpeg";
pub const CANONICAL_IMAGE_EXT: &str = ".jpg";

/// A decoded raster frame.
pub struct Decoded(pub DynamicImage);

/// A frame whose EXIF rotation has been applied.
pub struct Rotated(pub DynamicImage);

/// A frame clamped to the maximum pixel size.
pub struct Resized(pub DynamicImage);

/// Final canonical bytes.
pub struct Encoded {
    pub bytes: Vec<u8>,
}

/// Decodes the raw upload, converting HEIC/HEIF containers to a raster
/// frame first when the detector flagged them.
pub fn decode(raw: &[u8], needs_conversion: bool) -> PipelineResult<Decoded> {
    if needs_conversion {
        return convert_heif(raw).map(Decoded);
    }
    image::load_from_memory(raw)
        .map(Decoded)
        .map_err(|err| PipelineError::Processing(format!("image decode failed: {err}")))
}

#[cfg(feature = "media-heif")]
fn convert_heif(raw: &[u8]) -> PipelineResult<DynamicImage> {
    super::heif::convert_to_rgb(raw)
}

#[cfg(not(feature = "media-heif"))]
fn convert_heif(_raw: &[u8]) -> PipelineResult<DynamicImage> {
    Err(PipelineError::Processing(
        "HEIC/HEIF conversion requires the media-heif feature".into(),
    ))
}

/// Reads the EXIF orientation code from the original container bytes.
/// Absent or unreadable metadata reads as 1 (upright).
pub fn exif_orientation(raw: &[u8]) -> u32 {
    let mut cursor = Cursor::new(raw);
    exif::Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|data| {
            data.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .unwrap_or(1)
}

/// Applies the rotation an orientation code calls for. Only the pure
/// rotations are honored; mirrored codes and unknown values pass through.
pub fn rotate(decoded: Decoded, orientation: u32) -> Rotated {
    let img = decoded.0;
    Rotated(match orientation {
        3 => img.rotate180(),
        6 => img.rotate90(),
        8 => img.rotate270(),
        _ => img,
    })
}

/// Clamps the longest edge to `max_pixel_size`, preserving aspect ratio.
/// Images already inside the bound are never upscaled.
pub fn resize(rotated: Rotated, max_pixel_size: u32) -> Resized {
    let img = rotated.0;
    if img.width() <= max_pixel_size && img.height() <= max_pixel_size {
        return Resized(img);
    }
    Resized(img.resize(max_pixel_size, max_pixel_size, FilterType::Lanczos3))
}

/// Re-encodes to the canonical raster format.
pub fn encode(img: DynamicImage) -> PipelineResult<Encoded> {
    // JPEG has no alpha channel; flatten to RGB first.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Cursor::new(Vec::new());
    rgb.write_to(&mut buf, ImageFormat::Jpeg)
        .map_err(|err| PipelineError::Processing(format!("jpeg encode failed: {err}")))?;
    Ok(Encoded {
        bytes: buf.into_inner(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn large_images_are_clamped_with_aspect_preserved() {
        let decoded = decode(&png_bytes(4000, 3000), false).unwrap();
        let resized = resize(rotate(decoded, 1), 1024);
        assert_eq!(resized.0.width(), 1024);
        assert_eq!(resized.0.height(), 768);
    }

    #[test]
    fn small_images_are_never_upscaled() {
        let decoded = decode(&png_bytes(200, 150), false).unwrap();
        let resized = resize(rotate(decoded, 1), 1024);
        assert_eq!((resized.0.width(), resized.0.height()), (200, 150));
    }

    #[test]
    fn orientation_codes_map_to_the_specified_rotations() {
        let decoded = || decode(&png_bytes(40, 20), false).unwrap();
        assert_eq!(rotate(decoded(), 3).0.dimensions_tuple(), (40, 20));
        assert_eq!(rotate(decoded(), 6).0.dimensions_tuple(), (20, 40));
        assert_eq!(rotate(decoded(), 8).0.dimensions_tuple(), (20, 40));
        // Unknown and mirrored codes do nothing.
        assert_eq!(rotate(decoded(), 1).0.dimensions_tuple(), (40, 20));
        assert_eq!(rotate(decoded(), 2).0.dimensions_tuple(), (40, 20));
        assert_eq!(rotate(decoded(), 99).0.dimensions_tuple(), (40, 20));
    }

    /// A JPEG with an APP1 Exif segment carrying only an Orientation tag,
    /// spliced in right after the SOI marker.
    fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
        let jpeg = buf.into_inner();

        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"II\x2a\x00\x08\x00\x00\x00");
        tiff.extend_from_slice(&1u16.to_le_bytes()); // one IFD entry
        tiff.extend_from_slice(&0x0112u16.to_le_bytes()); // Orientation
        tiff.extend_from_slice(&3u16.to_le_bytes()); // SHORT
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&orientation.to_le_bytes());
        tiff.extend_from_slice(&[0, 0]); // value field padding
        tiff.extend_from_slice(&0u32.to_le_bytes()); // no next IFD

        let mut app1 = vec![0xff, 0xe1];
        app1.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
        app1.extend_from_slice(b"Exif\x00\x00");
        app1.extend_from_slice(&tiff);

        let mut out = Vec::with_capacity(jpeg.len() + app1.len());
        out.extend_from_slice(&jpeg[..2]); // SOI
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn missing_exif_reads_as_upright() {
        assert_eq!(exif_orientation(&png_bytes(8, 8)), 1);
    }

    #[test]
    fn orientation_tag_is_extracted_from_container_bytes() {
        let raw = jpeg_with_orientation(40, 20, 6);
        assert_eq!(exif_orientation(&raw), 6);
        assert_eq!(exif_orientation(&jpeg_with_orientation(40, 20, 3)), 3);
    }

    #[test]
    fn orientation_six_jpeg_normalizes_to_transposed_dimensions() {
        let raw = jpeg_with_orientation(40, 20, 6);
        let orientation = exif_orientation(&raw);
        let resized = resize(rotate(decode(&raw, false).unwrap(), orientation), 1024);
        assert_eq!(resized.0.dimensions_tuple(), (20, 40));

        let encoded = encode(resized.0).unwrap();
        let round = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!((round.width(), round.height()), (20, 40));
    }

    #[test]
    fn encode_produces_decodable_jpeg() {
        let encoded = encode(DynamicImage::ImageRgb8(RgbImage::new(16, 16))).unwrap();
        let round = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!((round.width(), round.height()), (16, 16));
        assert_eq!(
            image::guess_format(&encoded.bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    trait DimensionsTuple {
        fn dimensions_tuple(&self) -> (u32, u32);
    }

    impl DimensionsTuple for DynamicImage {
        fn dimensions_tuple(&self) -> (u32, u32) {
            (self.width(), self.height())
        }
    }
}
