//! 1-bit framebuffer for the OLED display.

use crate::{Error, Result, OLED_HEIGHT, OLED_WIDTH};

/// Total pixel count for the display.
pub const PIXEL_COUNT: usize = OLED_WIDTH as usize * OLED_HEIGHT as usize;

/// Luma value at or above which a pasted pixel is lit.
pub const LUMA_THRESHOLD: u8 = 128;

/// Monochrome framebuffer for the 128x64 display.
///
/// Pixels are stored row-major, one `bool` per pixel. Coordinates outside the
/// frame are ignored on write and yield `None` on read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    /// Pixel data, `true` = lit.
    data: Vec<bool>,
    /// Width of the framebuffer.
    width: u16,
    /// Height of the framebuffer.
    height: u16,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framebuffer {
    /// Creates a new framebuffer with every pixel off.
    pub fn new() -> Self {
        Self {
            data: vec![false; PIXEL_COUNT],
            width: OLED_WIDTH,
            height: OLED_HEIGHT,
        }
    }

    /// Creates a framebuffer with custom dimensions.
    pub fn with_dimensions(width: u16, height: u16) -> Self {
        let size = width as usize * height as usize;
        Self {
            data: vec![false; size],
            width,
            height,
        }
    }

    /// Returns the width of the framebuffer.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Returns the height of the framebuffer.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Returns a reference to the raw pixel data.
    pub fn data(&self) -> &[bool] {
        &self.data
    }

    /// Turns every pixel off.
    pub fn clear(&mut self) {
        self.data.fill(false);
    }

    /// Turns off every pixel inside the rectangle, clipped to the frame.
    pub fn clear_rect(&mut self, x: u16, y: u16, width: u16, height: u16) {
        self.fill_rect(x, y, width, height, false);
    }

    /// Sets a pixel at the given coordinates.
    pub fn set_pixel(&mut self, x: u16, y: u16, on: bool) {
        if x < self.width && y < self.height {
            let idx = y as usize * self.width as usize + x as usize;
            self.data[idx] = on;
        }
    }

    /// Gets a pixel at the given coordinates.
    pub fn get_pixel(&self, x: u16, y: u16) -> Option<bool> {
        if x < self.width && y < self.height {
            let idx = y as usize * self.width as usize + x as usize;
            Some(self.data[idx])
        } else {
            None
        }
    }

    /// Fills a rectangle, clipped to the frame.
    pub fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, on: bool) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for py in y..y_end {
            let row = py as usize * self.width as usize;
            for px in x..x_end {
                self.data[row + px as usize] = on;
            }
        }
    }

    /// Pastes an 8-bit greyscale image at the origin.
    ///
    /// Pixels at or above [`LUMA_THRESHOLD`] are lit, the rest are cleared; there
    /// is no dithering.
    /// Parts of the image outside the frame are dropped.
    pub fn paste_luma(&mut self, width: u32, height: u32, luma: &[u8]) -> Result<()> {
        let expected = width as usize * height as usize;
        if luma.len() != expected {
            return Err(Error::FramebufferSize {
                expected,
                actual: luma.len(),
            });
        }

        let cols = width.min(self.width as u32) as usize;
        let rows = height.min(self.height as u32) as usize;
        for y in 0..rows {
            for x in 0..cols {
                let on = luma[y * width as usize + x] >= LUMA_THRESHOLD;
                self.data[y * self.width as usize + x] = on;
            }
        }
        Ok(())
    }

    /// Returns the number of lit pixels.
    pub fn lit_count(&self) -> usize {
        self.data.iter().filter(|&&on| on).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framebuffer_ops() {
        let mut fb = Framebuffer::new();
        assert_eq!(fb.width(), 128);
        assert_eq!(fb.height(), 64);

        fb.set_pixel(10, 20, true);
        assert_eq!(fb.get_pixel(10, 20), Some(true));
        assert_eq!(fb.lit_count(), 1);

        fb.clear();
        assert_eq!(fb.get_pixel(10, 20), Some(false));
        assert_eq!(fb.lit_count(), 0);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut fb = Framebuffer::new();
        fb.set_pixel(128, 0, true);
        fb.set_pixel(0, 64, true);
        assert_eq!(fb.lit_count(), 0);
        assert_eq!(fb.get_pixel(128, 0), None);
        assert_eq!(fb.get_pixel(0, 64), None);
    }

    #[test]
    fn test_rects_are_clipped() {
        let mut fb = Framebuffer::new();
        fb.fill_rect(120, 60, 50, 50, true);
        assert_eq!(fb.lit_count(), 8 * 4);

        fb.clear_rect(124, 0, u16::MAX, u16::MAX);
        assert_eq!(fb.lit_count(), 4 * 4);
        assert_eq!(fb.get_pixel(123, 63), Some(true));
        assert_eq!(fb.get_pixel(124, 63), Some(false));
    }

    #[test]
    fn test_paste_luma_thresholds_and_clips() {
        let mut fb = Framebuffer::with_dimensions(4, 2);
        let luma = [0, 127, 128, 255, 255, 0, 200, 10, 90, 255];
        fb.paste_luma(5, 2, &luma).unwrap();

        assert_eq!(fb.get_pixel(0, 0), Some(false));
        assert_eq!(fb.get_pixel(1, 0), Some(false));
        assert_eq!(fb.get_pixel(2, 0), Some(true));
        assert_eq!(fb.get_pixel(3, 0), Some(true));
        assert_eq!(fb.get_pixel(0, 1), Some(false));
        assert_eq!(fb.get_pixel(1, 1), Some(true));
        assert_eq!(fb.lit_count(), 3);
    }

    #[test]
    fn test_paste_luma_size_mismatch() {
        let mut fb = Framebuffer::new();
        let err = fb.paste_luma(128, 64, &[0; 10]).unwrap_err();
        assert!(matches!(
            err,
            Error::FramebufferSize {
                expected: 8192,
                actual: 10
            }
        ));
    }
}
