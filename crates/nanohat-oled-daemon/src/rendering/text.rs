//! Text rendering using fontdue.

use anyhow::{anyhow, Context, Result};
use fontdue::{Font, FontSettings};
use nanohat_oled_hw::Framebuffer;
use std::path::Path;

/// Glyph coverage at or above which a pixel is lit.
const COVERAGE_THRESHOLD: u8 = 128;

/// The fixed set of text sizes used by the screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSize {
    Normal,
    Medium,
    Large,
}

impl FontSize {
    /// Returns the size in pixels.
    pub fn px(self) -> f32 {
        match self {
            FontSize::Normal => 10.0,
            FontSize::Medium => 15.0,
            FontSize::Large => 25.0,
        }
    }
}

/// Draws text into a 1-bit framebuffer.
///
/// `(x, y)` is the top-left anchor: `y` is the top of the font's ascent, so
/// text at `y = 0` touches the top edge of the frame.
pub trait GlyphRasterizer {
    fn draw_text(&self, fb: &mut Framebuffer, x: i32, y: i32, text: &str, size: FontSize);
}

/// Text renderer using fontdue for rasterization.
pub struct TextRenderer {
    font: Font,
}

impl TextRenderer {
    /// Loads a TrueType font from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data =
            std::fs::read(path).with_context(|| format!("Failed to read font {:?}", path))?;
        Self::from_bytes(&data).with_context(|| format!("Failed to load font {:?}", path))
    }

    /// Loads a font from memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let font = Font::from_bytes(data, FontSettings::default()).map_err(|e| anyhow!(e))?;
        Ok(Self { font })
    }

    fn ascent(&self, px: f32) -> i32 {
        self.font
            .horizontal_line_metrics(px)
            .map(|m| m.ascent.round() as i32)
            .unwrap_or(px as i32)
    }
}

impl GlyphRasterizer for TextRenderer {
    fn draw_text(&self, fb: &mut Framebuffer, x: i32, y: i32, text: &str, size: FontSize) {
        let px = size.px();
        let baseline = y + self.ascent(px);
        let mut cursor_x = x as f32;

        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, px);
            let left = cursor_x.round() as i32 + metrics.xmin;
            let top = baseline - metrics.ymin - metrics.height as i32;

            for glyph_y in 0..metrics.height {
                for glyph_x in 0..metrics.width {
                    if bitmap[glyph_y * metrics.width + glyph_x] < COVERAGE_THRESHOLD {
                        continue;
                    }
                    let fx = left + glyph_x as i32;
                    let fy = top + glyph_y as i32;
                    if let (Ok(fx), Ok(fy)) = (u16::try_from(fx), u16::try_from(fy)) {
                        fb.set_pixel(fx, fy, true);
                    }
                }
            }

            cursor_x += metrics.advance_width;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const SYSTEM_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf";

    #[test]
    fn test_font_sizes() {
        assert_eq!(FontSize::Normal.px(), 10.0);
        assert_eq!(FontSize::Medium.px(), 15.0);
        assert_eq!(FontSize::Large.px(), 25.0);
    }

    #[test]
    fn test_missing_font_is_an_error() {
        assert!(TextRenderer::from_file("/nonexistent/font.ttf").is_err());
    }

    #[test]
    fn test_garbage_font_is_an_error() {
        assert!(TextRenderer::from_bytes(b"not a font").is_err());
    }

    // Needs the DejaVu font package installed
    #[test]
    #[ignore]
    fn test_draw_text_stays_below_anchor() {
        let renderer = TextRenderer::from_file(SYSTEM_FONT).unwrap();
        let mut fb = Framebuffer::new();
        renderer.draw_text(&mut fb, 6, 20, "Hello", FontSize::Medium);

        assert!(fb.lit_count() > 0);
        for y in 0..20 {
            for x in 0..128 {
                assert_eq!(fb.get_pixel(x, y), Some(false));
            }
        }
    }
}
