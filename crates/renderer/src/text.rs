//! Text drawing with a runtime-loaded TrueType font.

use std::fs;
use std::path::Path;

use image::imageops;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};

use crate::error::{RenderError, RenderResult};

#[derive(Clone)]
pub struct TextRenderer {
    font: Font<'static>,
    size: f32,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer").field("size", &self.size).finish()
    }
}

impl TextRenderer {
    /// Load a `.ttf`/`.otf` font from disk at a base pixel size.
    pub fn load(path: impl AsRef<Path>, size: f32) -> RenderResult<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| RenderError::Font {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let font = Font::try_from_vec(data).ok_or_else(|| RenderError::Font {
            path: path.display().to_string(),
            message: "not a valid TrueType font".to_string(),
        })?;
        Ok(Self { font, size })
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Pixel size of `text` at `scale` times the base size.
    pub fn measure(&self, text: &str, scale: f32) -> (i32, i32) {
        text_size(Scale::uniform(self.size * scale), &self.font, text)
    }

    /// Draw with the top-left corner at `(x, y)`.
    pub fn draw(&self, canvas: &mut RgbaImage, text: &str, x: i32, y: i32, scale: f32, color: Rgba<u8>) {
        draw_text_mut(canvas, color, x, y, Scale::uniform(self.size * scale), &self.font, text);
    }

    /// Draw horizontally centred on `cx`.
    pub fn draw_centered(&self, canvas: &mut RgbaImage, text: &str, cx: i32, y: i32, scale: f32, color: Rgba<u8>) {
        let (w, _) = self.measure(text, scale);
        self.draw(canvas, text, cx - w / 2, y, scale, color);
    }

    /// Draw reading bottom-to-top, vertically centred on `cy`, with the
    /// left edge at `x`.
    pub fn draw_vertical(&self, canvas: &mut RgbaImage, text: &str, x: i32, cy: i32, scale: f32, color: Rgba<u8>) {
        let (w, h) = self.measure(text, scale);
        if w <= 0 || h <= 0 {
            return;
        }
        // Extra rows so descenders are not clipped
        let pad = (h / 3).max(1);
        let mut label = RgbaImage::new(w as u32, (h + pad) as u32);
        draw_text_mut(
            &mut label,
            color,
            0,
            0,
            Scale::uniform(self.size * scale),
            &self.font,
            text,
        );
        let rotated = imageops::rotate270(&label);
        let top = cy - rotated.height() as i32 / 2;
        imageops::overlay(canvas, &rotated, x as i64, top as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_font_is_reported() {
        let err = TextRenderer::load("/nonexistent/font.ttf", 12.0).unwrap_err();
        assert!(matches!(err, RenderError::Font { .. }));
    }

    #[test]
    fn test_invalid_font_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ttf");
        fs::write(&path, b"definitely not a font").unwrap();
        assert!(TextRenderer::load(&path, 12.0).is_err());
    }
}
