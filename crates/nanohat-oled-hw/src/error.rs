//! Error types for the NanoHAT OLED hardware library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when interacting with the hardware.
#[derive(Error, Debug)]
pub enum Error {
    /// I2C bus could not be opened.
    #[error("I2C bus {path} could not be opened: {reason}")]
    BusOpen { path: String, reason: String },

    /// I2C write to the OLED controller failed.
    #[error("I2C write to 0x{address:02X} failed: {reason}")]
    Bus { address: u8, reason: String },

    /// GPIO character device error.
    #[error("GPIO error: {0}")]
    Gpio(#[from] gpio_cdev::Error),

    /// GPIO line used after it was released.
    #[error("GPIO line {0} already released")]
    LineReleased(String),

    /// Framebuffer size mismatch.
    #[error("Framebuffer size mismatch: expected {expected}, got {actual}")]
    FramebufferSize { expected: usize, actual: usize },
}
