//! Caption compositing for the mova-pic topic.
//!
//! The sanitized post text is wrapped to the image width by measuring
//! advance width character by character, then rendered top-left with an
//! outlined face (white fill over a black stroke) so it stays readable on
//! any photo.

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;

use domains::{PipelineError, PipelineResult};

const FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const STROKE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Offsets of the stroke passes drawn under the fill pass.
const STROKE_OFFSETS: [(i32, i32); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0), (1, 0),
    (-1, 1), (0, 1), (1, 1),
];

pub struct CaptionRenderer {
    font: FontVec,
    point_size: f32,
    margin_px: u32,
}

impl CaptionRenderer {
    pub fn new(font_bytes: Vec<u8>, point_size: f32, margin_px: u32) -> PipelineResult<Self> {
        let font = FontVec::try_from_vec(font_bytes)
            .map_err(|err| PipelineError::Processing(format!("caption font unusable: {err}")))?;
        Ok(Self {
            font,
            point_size,
            margin_px,
        })
    }

    pub fn from_file(path: &std::path::Path, point_size: f32, margin_px: u32) -> PipelineResult<Self> {
        let bytes = std::fs::read(path).map_err(|err| {
            PipelineError::Processing(format!("caption font {}: {err}", path.display()))
        })?;
        Self::new(bytes, point_size, margin_px)
    }

    /// Burns `caption` into the top-left corner of `img`.
    pub fn composite(&self, img: DynamicImage, caption: &str) -> PipelineResult<DynamicImage> {
        let mut canvas: RgbaImage = img.to_rgba8();

        let scale = PxScale::from(self.point_size);
        let scaled = self.font.as_scaled(scale);
        let budget = canvas.width() as f32 - 2.0 * self.margin_px as f32;
        if budget <= 0.0 {
            return Err(PipelineError::Processing(
                "image is narrower than the caption margin".into(),
            ));
        }

        let lines = wrap_caption(caption, budget, |c| {
            scaled.h_advance(self.font.glyph_id(c))
        });

        let line_height = (scaled.height() + scaled.line_gap()).ceil() as i32;
        let origin = self.margin_px as i32;
        for (i, line) in lines.iter().enumerate() {
            let y = origin + i as i32 * line_height;
            for (dx, dy) in STROKE_OFFSETS {
                draw_text_mut(&mut canvas, STROKE, origin + dx, y + dy, scale, &self.font, line);
            }
            draw_text_mut(&mut canvas, FILL, origin, y, scale, &self.font, line);
        }

        Ok(DynamicImage::ImageRgba8(canvas))
    }
}

/// Breaks `caption` into lines that fit `budget` pixels, measuring one
/// character at a time. Explicit newlines always break; a character that
/// would push the running line over the budget starts the next line.
pub fn wrap_caption(caption: &str, budget: f32, measure: impl Fn(char) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut width = 0.0f32;

    for c in caption.chars() {
        if c == '\n' {
            lines.push(std::mem::take(&mut line));
            width = 0.0;
            continue;
        }
        let advance = measure(c);
        if !line.is_empty() && width + advance > budget {
            lines.push(std::mem::take(&mut line));
            width = 0.0;
        }
        line.push(c);
        width += advance;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
