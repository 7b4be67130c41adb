//! Core traits for serial port abstraction.
//!
//! `SerialPortAdapter` is an open device, `PortOpener` is what creates one. Both
//! real serial ports and mock implementations plug in behind them so the link,
//! the catalog and the workers never touch the OS directly.

use super::error::PortError;
use std::time::Duration;

/// Default baud rate used when the operator does not pick one.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default read timeout of an open link.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Parameters a device is opened with.
///
/// Framing is always 8N1 without flow control; only the rate and the read
/// timeout are adjustable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Read timeout.
    pub timeout: Duration,
}

impl PortConfiguration {
    pub fn new(baud_rate: u32, timeout: Duration) -> Self {
        Self { baud_rate, timeout }
    }
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Trait for serial port I/O operations.
///
/// Dropping the adapter closes the underlying descriptor.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Set how long a single read may block.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError>;

    /// Write the whole buffer, retrying short writes.
    fn write_all_bytes(&mut self, mut data: &[u8]) -> Result<(), PortError> {
        while !data.is_empty() {
            match self.write_bytes(data)? {
                0 => {
                    return Err(PortError::Io(std::io::Error::new(
                        std::io::ErrorKind::WriteZero,
                        "serial port accepted no bytes",
                    )))
                }
                n => data = &data[n..],
            }
        }
        Ok(())
    }
}

/// Boxed adapter as held by the link.
pub type PortAdapter = Box<dyn SerialPortAdapter>;

/// Something that can open a device path.
///
/// The system implementation goes through the `serialport` crate; tests use
/// [`MockOpener`](super::MockOpener).
pub trait PortOpener: Send + Sync {
    fn open(&self, path: &str, config: &PortConfiguration) -> Result<PortAdapter, PortError>;
}
