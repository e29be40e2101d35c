//! In-memory bus and button lines.
//!
//! Used by the daemon's dry-run mode and by tests. Clones share state, so a
//! caller can keep a handle to inspect traffic after moving the original into
//! an [`crate::OledDevice`] or [`crate::ButtonPanel`].

use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use tracing::debug;

use crate::buttons::ButtonLine;
use crate::oled::protocol::{CONTROL_COMMAND, CONTROL_DATA};
use crate::oled::Command;
use crate::{Error, Result};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct BusState {
    writes: Vec<(u8, Vec<u8>)>,
    write_count: usize,
    discard: bool,
    fail_after: Option<usize>,
    fail_at: Option<usize>,
}

/// I2C bus that records every write.
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<BusState>>,
}

impl MockBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bus that only counts writes.
    pub fn discarding() -> Self {
        let bus = Self::default();
        lock(&bus.state).discard = true;
        bus
    }

    /// Returns the number of successful writes, recorded or not.
    pub fn write_count(&self) -> usize {
        lock(&self.state).write_count
    }

    /// Makes every write after the first `n` successful ones fail.
    pub fn fail_after(&self, n: usize) {
        lock(&self.state).fail_after = Some(n);
    }

    /// Makes only the write that would be number `n` fail; the retry and
    /// later writes go through.
    pub fn fail_write(&self, n: usize) {
        lock(&self.state).fail_at = Some(n);
    }

    /// Returns all recorded writes as `(address, bytes)`.
    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        lock(&self.state).writes.clone()
    }

    /// Returns how many display RAM blocks were written.
    pub fn data_block_count(&self) -> usize {
        lock(&self.state)
            .writes
            .iter()
            .filter(|(_, p)| p.first() == Some(&CONTROL_DATA))
            .count()
    }

    /// Returns how many standalone display-off commands were written.
    pub fn display_off_count(&self) -> usize {
        let off = [CONTROL_COMMAND, Command::DisplayOff as u8];
        lock(&self.state)
            .writes
            .iter()
            .filter(|(_, p)| p.as_slice() == off)
            .count()
    }

    /// Forgets recorded writes.
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        state.writes.clear();
        state.write_count = 0;
    }
}

impl ErrorType for MockBus {
    type Error = ErrorKind;
}

impl I2c for MockBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> std::result::Result<(), Self::Error> {
        let mut state = lock(&self.state);
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    if state.fail_after.is_some_and(|n| state.write_count >= n) {
                        return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                    }
                    if state.fail_at == Some(state.write_count) {
                        state.fail_at = None;
                        return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                    }
                    debug!("mock i2c write 0x{:02X}: {} byte(s)", address, bytes.len());
                    state.write_count += 1;
                    if !state.discard {
                        state.writes.push((address, bytes.to_vec()));
                    }
                }
                Operation::Read(buf) => buf.fill(0),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct LineState {
    high: bool,
    fail_read: bool,
    fail_release: bool,
    release_attempts: u32,
    released: bool,
}

/// Button line with a settable level.
#[derive(Debug, Clone)]
pub struct MockLine {
    name: String,
    state: Arc<Mutex<LineState>>,
}

impl MockLine {
    /// Creates a line reading low.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Arc::default(),
        }
    }

    /// Sets the level returned by subsequent reads.
    pub fn set_high(&self, high: bool) {
        lock(&self.state).high = high;
    }

    /// Makes reads fail.
    pub fn fail_read(&self) {
        lock(&self.state).fail_read = true;
    }

    /// Makes release fail.
    pub fn fail_release(&self) {
        lock(&self.state).fail_release = true;
    }

    /// Returns how many times release was attempted.
    pub fn release_attempts(&self) -> u32 {
        lock(&self.state).release_attempts
    }

    /// Returns true once a release succeeded.
    pub fn is_released(&self) -> bool {
        lock(&self.state).released
    }
}

impl ButtonLine for MockLine {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_high(&mut self) -> Result<bool> {
        let state = lock(&self.state);
        if state.released || state.fail_read {
            return Err(Error::LineReleased(self.name.clone()));
        }
        Ok(state.high)
    }

    fn release(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.release_attempts += 1;
        if state.fail_release {
            return Err(Error::LineReleased(self.name.clone()));
        }
        state.released = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_clones_share_writes() {
        let bus = MockBus::new();
        let mut other = bus.clone();
        other.write(0x3C, &[0x00, 0xAE]).unwrap();
        assert_eq!(bus.writes().len(), 1);
        assert_eq!(bus.display_off_count(), 1);

        bus.reset();
        assert!(bus.writes().is_empty());
        assert_eq!(bus.write_count(), 0);
    }

    #[test]
    fn test_discarding_bus_only_counts() {
        let bus = MockBus::discarding();
        let mut handle = bus.clone();
        handle.write(0x3C, &[0x40, 0xFF]).unwrap();
        handle.write(0x3C, &[0x00, 0xAF]).unwrap();
        assert!(bus.writes().is_empty());
        assert_eq!(bus.write_count(), 2);
    }

    #[test]
    fn test_single_write_failure() {
        let bus = MockBus::new();
        bus.fail_write(1);
        let mut handle = bus.clone();
        handle.write(0x3C, &[0x00, 0xAF]).unwrap();
        assert!(handle.write(0x3C, &[0x40, 0xFF]).is_err());
        handle.write(0x3C, &[0x00, 0xAE]).unwrap();
        assert_eq!(bus.write_count(), 2);
        assert_eq!(bus.display_off_count(), 1);
    }

    #[test]
    fn test_line_release_accounting() {
        let line = MockLine::new("F2");
        let mut handle = line.clone();
        line.set_high(true);
        assert!(handle.is_high().unwrap());

        handle.release().unwrap();
        assert!(line.is_released());
        assert!(handle.is_high().is_err());

        let failing = MockLine::new("F3");
        failing.fail_release();
        assert!(failing.clone().release().is_err());
        assert_eq!(failing.release_attempts(), 1);
        assert!(!failing.is_released());
    }
}
