//! Canvas for drawing screens into the framebuffer.

use anyhow::Result;
use image::GrayImage;
use nanohat_oled_hw::Framebuffer;

use super::text::{FontSize, GlyphRasterizer};

/// A line of text placed on the screen.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x: i32,
    pub y: i32,
    pub text: String,
    pub size: FontSize,
}

impl TextLine {
    pub fn new(x: i32, y: i32, text: impl Into<String>, size: FontSize) -> Self {
        Self {
            x,
            y,
            text: text.into(),
            size,
        }
    }
}

/// Canvas for rendering.
///
/// Owns the one framebuffer that lives for the whole process.
pub struct Canvas {
    framebuffer: Framebuffer,
    text_renderer: Box<dyn GlyphRasterizer>,
}

impl Canvas {
    /// Creates a new canvas with a blank 128x64 framebuffer.
    pub fn new(text_renderer: Box<dyn GlyphRasterizer>) -> Self {
        Self {
            framebuffer: Framebuffer::new(),
            text_renderer,
        }
    }

    /// Returns the canvas dimensions.
    pub fn dimensions(&self) -> (u16, u16) {
        (self.framebuffer.width(), self.framebuffer.height())
    }

    /// Returns the framebuffer to send to the display.
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Clears the whole canvas.
    pub fn clear(&mut self) {
        self.framebuffer.clear();
    }

    /// Clears a rectangle, clipped to the canvas.
    pub fn clear_rect(&mut self, x: u16, y: u16, width: u16, height: u16) {
        self.framebuffer.clear_rect(x, y, width, height);
    }

    /// Draws text with its top-left corner at `(x, y)`.
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, size: FontSize) {
        self.text_renderer
            .draw_text(&mut self.framebuffer, x, y, text, size);
    }

    /// Draws a set of text lines.
    pub fn draw_lines(&mut self, lines: &[TextLine]) {
        for line in lines {
            self.draw_text(line.x, line.y, &line.text, line.size);
        }
    }

    /// Pastes a greyscale image at the origin without clearing first.
    pub fn paste(&mut self, image: &GrayImage) -> Result<()> {
        self.framebuffer
            .paste_luma(image.width(), image.height(), image.as_raw())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::text::stub::RecordingRasterizer;
    use image::Luma;

    #[test]
    fn test_canvas_creation() {
        let canvas = Canvas::new(Box::new(RecordingRasterizer::default()));
        assert_eq!(canvas.dimensions(), (128, 64));
        assert_eq!(canvas.framebuffer().lit_count(), 0);
    }

    #[test]
    fn test_draw_lines_in_order() {
        let glyphs = RecordingRasterizer::default();
        let mut canvas = Canvas::new(Box::new(glyphs.clone()));

        canvas.draw_lines(&[
            TextLine::new(6, 2, "one", FontSize::Normal),
            TextLine::new(6, 14, "two", FontSize::Large),
        ]);

        let calls = glyphs.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!((calls[0].y, calls[0].text.as_str()), (2, "one"));
        assert_eq!((calls[1].y, calls[1].size), (14, FontSize::Large));
        assert_eq!(canvas.framebuffer().lit_count(), 6);

        canvas.clear_rect(0, 0, 128, 10);
        assert_eq!(canvas.framebuffer().lit_count(), 3);
        canvas.clear();
        assert_eq!(canvas.framebuffer().lit_count(), 0);
    }

    #[test]
    fn test_paste_image() {
        let mut canvas = Canvas::new(Box::new(RecordingRasterizer::default()));
        let mut image = GrayImage::new(200, 10);
        image.put_pixel(3, 4, Luma([255]));
        image.put_pixel(150, 4, Luma([255]));

        canvas.paste(&image).unwrap();
        assert_eq!(canvas.framebuffer().get_pixel(3, 4), Some(true));
        assert_eq!(canvas.framebuffer().lit_count(), 1);
    }
}
