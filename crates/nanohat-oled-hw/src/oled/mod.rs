//! OLED display module.
//!
//! Provides control over the 128x64 monochrome OLED panel via I2C.

mod device;

pub mod framebuffer;
pub mod protocol;

pub use device::OledDevice;
pub use framebuffer::Framebuffer;
pub use protocol::Command;
