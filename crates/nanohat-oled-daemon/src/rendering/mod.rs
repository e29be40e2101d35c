//! Rendering module for canvas and text.

#![allow(dead_code)]

mod canvas;
pub mod text;

pub use canvas::{Canvas, TextLine};
pub use text::{FontSize, GlyphRasterizer, TextRenderer};
