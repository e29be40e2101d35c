//! Push-button input via the GPIO character device.
//!
//! The board has three buttons, F1 to F3, each on its own GPIO line. A line
//! reading high means the button is pressed.

use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use tracing::{debug, error, info};

use crate::{Error, Result};

/// A single button input line.
pub trait ButtonLine {
    /// Returns the line's consumer name (e.g. "F1").
    fn name(&self) -> &str;

    /// Reads the current level.
    fn is_high(&mut self) -> Result<bool>;

    /// Gives the line back to the kernel.
    fn release(&mut self) -> Result<()>;
}

/// Button line requested from a GPIO chip.
pub struct GpioButton {
    name: String,
    handle: Option<LineHandle>,
}

impl GpioButton {
    /// Requests `offset` on `chip` as an input, labelled with `name`.
    pub fn request(chip: &mut Chip, offset: u32, name: &str) -> Result<Self> {
        let handle = chip
            .get_line(offset)?
            .request(LineRequestFlags::INPUT, 0, name)?;
        debug!("Requested GPIO line {} as {}", offset, name);

        Ok(Self {
            name: name.to_string(),
            handle: Some(handle),
        })
    }
}

impl ButtonLine for GpioButton {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_high(&mut self) -> Result<bool> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| Error::LineReleased(self.name.clone()))?;
        Ok(handle.get_value()? != 0)
    }

    fn release(&mut self) -> Result<()> {
        // Dropping the handle closes its file descriptor.
        match self.handle.take() {
            Some(handle) => {
                drop(handle);
                Ok(())
            }
            None => Err(Error::LineReleased(self.name.clone())),
        }
    }
}

/// Snapshot of all three buttons, taken before any decision is made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub f1: bool,
    pub f2: bool,
    pub f3: bool,
}

impl ButtonState {
    /// Returns true if no button is pressed.
    pub fn is_idle(&self) -> bool {
        !(self.f1 || self.f2 || self.f3)
    }
}

/// The three buttons and the chip that owns their lines.
pub struct ButtonPanel<L> {
    lines: [L; 3],
    chip: Option<Chip>,
}

impl ButtonPanel<GpioButton> {
    /// Opens a GPIO chip (e.g. `/dev/gpiochip0`) and requests the F1, F2 and
    /// F3 lines as inputs.
    pub fn open(path: &str, offsets: [u32; 3]) -> Result<Self> {
        let mut chip = Chip::new(path)?;
        let f1 = GpioButton::request(&mut chip, offsets[0], "F1")?;
        let f2 = GpioButton::request(&mut chip, offsets[1], "F2")?;
        let f3 = GpioButton::request(&mut chip, offsets[2], "F3")?;

        info!(
            "Buttons ready on {} (F1={}, F2={}, F3={})",
            path, offsets[0], offsets[1], offsets[2]
        );
        Ok(Self {
            lines: [f1, f2, f3],
            chip: Some(chip),
        })
    }
}

impl<L: ButtonLine> ButtonPanel<L> {
    /// Builds a panel from lines that do not belong to a GPIO chip.
    pub fn from_lines(lines: [L; 3]) -> Self {
        Self { lines, chip: None }
    }

    /// Reads F1, F2 and F3, in that order.
    pub fn sample(&mut self) -> Result<ButtonState> {
        let [f1, f2, f3] = &mut self.lines;
        Ok(ButtonState {
            f1: f1.is_high()?,
            f2: f2.is_high()?,
            f3: f3.is_high()?,
        })
    }

    /// Releases every line, then closes the chip.
    ///
    /// Every line is attempted even if an earlier one fails. Returns the
    /// number of lines that failed to release.
    pub fn release(&mut self) -> usize {
        let mut failures = 0;
        for line in self.lines.iter_mut() {
            if let Err(e) = line.release() {
                error!("GPIO release failed for {}: {}", line.name(), e);
                failures += 1;
            }
        }

        if let Some(chip) = self.chip.take() {
            drop(chip);
            debug!("GPIO chip closed");
        }
        failures
    }
}
