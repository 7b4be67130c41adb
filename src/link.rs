//! The single exclusive serial connection.
//!
//! One `SerialLink` is built at startup and shared as `Arc<SerialLink>` between the
//! foreground and the background workers. All connection state sits behind one
//! mutex so a connect/disconnect transition is atomic with respect to any
//! in-flight `send` or `read_line`.

use crate::port::{
    PortAdapter, PortConfiguration, PortError, PortOpener, SystemOpener, DEFAULT_READ_TIMEOUT,
};
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Upper bound on a single received line.
pub const DEFAULT_MAX_LINE_LEN: usize = 4096;

/// Errors surfaced by link operations.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Opening the device failed; the link stays disconnected.
    #[error("Could not connect to {path}: {source}")]
    Connection {
        path: String,
        #[source]
        source: PortError,
    },

    /// Writing to an open device failed.
    #[error("Write failed: {0}")]
    Write(#[source] PortError),
}

#[derive(Debug, Default)]
struct LinkState {
    port_path: Option<String>,
    baud_rate: u32,
    /// `Some` exactly while connected.
    handle: Option<PortAdapter>,
}

impl LinkState {
    fn close(&mut self) -> Option<String> {
        let path = self.port_path.take();
        // Dropping the adapter closes the descriptor.
        self.handle = None;
        path
    }
}

/// Owner of the one open serial descriptor.
pub struct SerialLink {
    opener: Box<dyn PortOpener>,
    read_timeout: Duration,
    max_line_len: usize,
    state: Mutex<LinkState>,
}

impl SerialLink {
    /// A disconnected link that opens devices through `opener`.
    pub fn new(opener: impl PortOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            state: Mutex::new(LinkState::default()),
        }
    }

    /// A disconnected link on real hardware.
    pub fn system() -> Self {
        Self::new(SystemOpener)
    }

    /// Read timeout applied to every connection.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_max_line_len(mut self, max: usize) -> Self {
        self.max_line_len = max.max(1);
        self
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Connect to `path`, closing any current connection first.
    pub fn connect(&self, path: &str, baud_rate: u32) -> Result<(), LinkError> {
        let mut state = self.state.lock();
        if let Some(previous) = state.close() {
            info!("Closed {} before reconnecting", previous);
        }

        let config = PortConfiguration::new(baud_rate, self.read_timeout);
        let handle = self
            .opener
            .open(path, &config)
            .map_err(|source| LinkError::Connection {
                path: path.to_string(),
                source,
            })?;

        state.port_path = Some(path.to_string());
        state.baud_rate = baud_rate;
        state.handle = Some(handle);
        info!("Connected to {} at {} baud", path, baud_rate);
        Ok(())
    }

    /// Close the connection if there is one. Idempotent.
    pub fn disconnect(&self) {
        if let Some(path) = self.state.lock().close() {
            info!("Disconnected from {}", path);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().handle.is_some()
    }

    /// Path of the connected device.
    pub fn port_path(&self) -> Option<String> {
        let state = self.state.lock();
        state.handle.as_ref().and(state.port_path.clone())
    }

    /// Baud rate of the connected device.
    pub fn baud_rate(&self) -> Option<u32> {
        let state = self.state.lock();
        state.handle.as_ref().map(|_| state.baud_rate)
    }

    /// Write the whole buffer. Does nothing when disconnected.
    pub fn send(&self, bytes: &[u8]) -> Result<(), LinkError> {
        let mut state = self.state.lock();
        match state.handle.as_mut() {
            Some(handle) => handle.write_all_bytes(bytes).map_err(LinkError::Write),
            None => Ok(()),
        }
    }

    /// Read up to and including a `\n`.
    ///
    /// Returns `None` when disconnected, when nothing arrived within the read
    /// timeout, or when the device reported an error; the caller cannot tell
    /// these apart. Bytes received before a timeout are returned as a partial
    /// line.
    pub fn read_line(&self) -> Option<Vec<u8>> {
        let mut state = self.state.lock();
        let handle = state.handle.as_mut()?;

        let deadline = Instant::now() + self.read_timeout;
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            // Each read may only block for what is left of the budget.
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!("Line read hit the {:?} budget", self.read_timeout);
                break;
            }
            if let Err(e) = handle.set_timeout(remaining) {
                warn!("Setting read timeout on {} failed: {}", handle.name(), e);
                return None;
            }

            match handle.read_bytes(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    line.push(byte[0]);
                    if byte[0] == b'\n' || line.len() >= self.max_line_len {
                        break;
                    }
                }
                Err(e) if e.is_timeout() => break,
                Err(e) => {
                    warn!("Read from {} failed: {}", handle.name(), e);
                    return None;
                }
            }
        }

        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SerialLink")
            .field("port_path", &state.port_path)
            .field("baud_rate", &state.baud_rate)
            .field("connected", &state.handle.is_some())
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}
