//! NanoHAT OLED Hardware Library
//!
//! Provides hardware abstraction for the 128x64 SSD1306-class OLED panel and
//! the three GPIO push-buttons found on NanoHAT-style add-on boards.

pub mod buttons;
pub mod error;
pub mod mock;
pub mod oled;

pub use buttons::{ButtonLine, ButtonPanel, ButtonState, GpioButton};
pub use error::{Error, Result};
pub use oled::{Framebuffer, OledDevice};

/// OLED display dimensions
pub const OLED_WIDTH: u16 = 128;
pub const OLED_HEIGHT: u16 = 64;

/// 7-bit I2C address of the OLED controller
pub const OLED_I2C_ADDRESS: u8 = 0x3C;
