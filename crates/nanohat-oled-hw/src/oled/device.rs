//! OLED device communication via I2C.

use crate::{Error, Result, OLED_I2C_ADDRESS};
use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;
use tracing::{debug, info};

use super::framebuffer::Framebuffer;
use super::protocol::{
    blocks, build_command_packet, build_data_packet, encode_pages, Command, INIT_SEQUENCE,
};

/// OLED device controller.
///
/// Generic over the I2C bus so the same code drives `/dev/i2c-*` on Linux and
/// the in-memory bus in [`crate::mock`].
pub struct OledDevice<I> {
    i2c: I,
    address: u8,
}

impl OledDevice<I2cdev> {
    /// Opens the OLED on a Linux I2C bus device such as `/dev/i2c-0`.
    pub fn open(path: &str, address: u8) -> Result<Self> {
        let i2c = I2cdev::new(path).map_err(|e| Error::BusOpen {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        info!("OLED bus opened: {} (address 0x{:02X})", path, address);
        Ok(Self::new(i2c, address))
    }
}

impl<I: I2c> OledDevice<I> {
    /// Wraps an I2C bus.
    pub fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Wraps an I2C bus using the default controller address.
    pub fn with_default_address(i2c: I) -> Self {
        Self::new(i2c, OLED_I2C_ADDRESS)
    }

    /// Returns the 7-bit controller address.
    pub fn address(&self) -> u8 {
        self.address
    }

    fn write(&mut self, packet: &[u8]) -> Result<()> {
        let address = self.address;
        self.i2c.write(address, packet).map_err(|e| Error::Bus {
            address,
            reason: format!("{:?}", e),
        })
    }

    /// Sends a sequence of controller commands in one transaction.
    pub fn command(&mut self, commands: &[u8]) -> Result<()> {
        self.write(&build_command_packet(commands))?;
        debug!("Sent {} command byte(s)", commands.len());
        Ok(())
    }

    /// Checks that the controller acknowledges a write.
    ///
    /// Sends display-off, which is harmless before initialization.
    pub fn probe(&mut self) -> Result<()> {
        self.command(&[Command::DisplayOff as u8])
    }

    /// Sends the power-on initialization sequence.
    pub fn init(&mut self) -> Result<()> {
        self.command(&INIT_SEQUENCE)?;
        info!("OLED initialized");
        Ok(())
    }

    /// Turns the panel off.
    pub fn display_off(&mut self) -> Result<()> {
        self.command(&[Command::DisplayOff as u8])
    }

    /// Performs a full screen redraw.
    ///
    /// Stops at the first failed block and returns its error.
    pub fn redraw(&mut self, framebuffer: &Framebuffer) -> Result<()> {
        let bytes = encode_pages(framebuffer);
        let mut count = 0;

        for block in blocks(&bytes) {
            self.write(&build_data_packet(block))?;
            count += 1;
        }

        debug!("Full redraw completed ({} blocks)", count);
        Ok(())
    }

    /// Releases the underlying bus.
    pub fn into_inner(self) -> I {
        self.i2c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBus;
    use crate::oled::protocol::{CONTROL_COMMAND, CONTROL_DATA};

    #[test]
    fn test_init_writes_sequence_with_command_byte() {
        let bus = MockBus::new();
        let mut oled = OledDevice::with_default_address(bus.clone());
        oled.init().unwrap();

        let writes = bus.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, 0x3C);
        assert_eq!(writes[0].1[0], CONTROL_COMMAND);
        assert_eq!(&writes[0].1[1..], &INIT_SEQUENCE[..]);
    }

    #[test]
    fn test_redraw_sends_32_data_blocks() {
        let bus = MockBus::new();
        let mut oled = OledDevice::with_default_address(bus.clone());

        let mut fb = Framebuffer::new();
        fb.set_pixel(0, 0, true);
        oled.redraw(&fb).unwrap();

        let writes = bus.writes();
        assert_eq!(writes.len(), 32);
        assert!(writes
            .iter()
            .all(|(_, p)| p.len() == 33 && p[0] == CONTROL_DATA));
        assert_eq!(writes[0].1[1], 0x01);

        let payload: usize = writes.iter().map(|(_, p)| p.len() - 1).sum();
        assert_eq!(payload, 1024);
    }

    #[test]
    fn test_redraw_propagates_bus_failure() {
        let bus = MockBus::new();
        bus.fail_after(3);
        let mut oled = OledDevice::with_default_address(bus.clone());

        let err = oled.redraw(&Framebuffer::new()).unwrap_err();
        assert!(matches!(err, Error::Bus { address: 0x3C, .. }));
        // Three good blocks, then the failing one stops the redraw
        assert_eq!(bus.writes().len(), 3);
    }

    #[test]
    fn test_display_off() {
        let bus = MockBus::new();
        let mut oled = OledDevice::new(bus.clone(), 0x3D);
        oled.display_off().unwrap();
        assert_eq!(bus.writes(), vec![(0x3D, vec![0x00, 0xAE])]);
        assert_eq!(bus.display_off_count(), 1);
    }

    // Hardware tests are skipped by default
    #[test]
    #[ignore]
    fn test_device_open() {
        let device = OledDevice::open("/dev/i2c-0", OLED_I2C_ADDRESS);
        assert!(device.is_ok());
    }
}
