//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that simulates serial port behavior without
//! requiring actual hardware, and a `MockOpener` that hands out mock ports by
//! path while counting how many descriptors are currently open.

use super::error::PortError;
use super::traits::{PortAdapter, PortConfiguration, PortOpener, SerialPortAdapter};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Inner state of the mock port, protected by a mutex for interior mutability.
#[derive(Debug, Default)]
struct MockPortState {
    /// Queue of bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of all bytes written to the port.
    write_log: Vec<Vec<u8>>,
    /// Whether the next read should time out.
    should_timeout: bool,
    /// Whether writes fail with a broken pipe.
    fail_writes: bool,
    /// Largest number of bytes a single write accepts.
    write_chunk: Option<usize>,
    /// Whether an empty read waits out the timeout like a real device.
    blocking_reads: bool,
    /// Configured timeout duration.
    timeout: Duration,
}

/// Mock serial port implementation for testing.
///
/// Clones share the same queues, so a test can keep one clone to feed and
/// inspect the port while another clone is owned by the code under test.
///
/// # Example
/// ```
/// use serial_deck::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"OK\n");
///
/// let mut buffer = [0u8; 3];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"OK\n");
///
/// port.write_bytes(b"AT").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"AT".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    /// The port name/identifier.
    name: String,
    /// The internal state, shared between clones.
    state: Arc<Mutex<MockPortState>>,
    /// Present on ports handed out by a `MockOpener`; released on drop.
    lease: Option<Arc<DescriptorLease>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_secs(1),
                ..Default::default()
            })),
            lease: None,
        }
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Get a copy of all data written to the port, one entry per write call.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// All written bytes concatenated.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.state.lock().write_log.concat()
    }

    /// Clear the write log.
    pub fn clear_write_log(&mut self) {
        self.state.lock().write_log.clear();
    }

    /// Set whether the next read operation should time out.
    pub fn set_should_timeout(&mut self, should_timeout: bool) {
        self.state.lock().should_timeout = should_timeout;
    }

    /// Make every write fail until reset.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Cap how many bytes a single write call accepts.
    pub fn set_write_chunk(&mut self, chunk: Option<usize>) {
        self.state.lock().write_chunk = chunk;
    }

    /// Make reads on an empty queue wait for data up to the configured timeout.
    pub fn set_blocking_reads(&mut self, blocking: bool) {
        self.state.lock().blocking_reads = blocking;
    }

    /// Timeout most recently applied to this port.
    pub fn timeout(&self) -> Duration {
        self.state.lock().timeout
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    fn leased(&self, lease: Arc<DescriptorLease>) -> Self {
        Self {
            name: self.name.clone(),
            state: Arc::clone(&self.state),
            lease: Some(lease),
        }
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.fail_writes {
            return Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock device went away",
            )));
        }

        let accepted = state.write_chunk.map_or(data.len(), |c| c.min(data.len()));
        state.write_log.push(data[..accepted].to_vec());
        Ok(accepted)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let deadline = Instant::now() + self.state.lock().timeout;
        loop {
            let mut state = self.state.lock();

            if state.should_timeout {
                state.should_timeout = false;
                return Err(PortError::timeout(state.timeout));
            }

            let mut bytes_read = 0;
            for byte in buffer.iter_mut() {
                if let Some(queued_byte) = state.read_queue.pop_front() {
                    *byte = queued_byte;
                    bytes_read += 1;
                } else {
                    break;
                }
            }
            if bytes_read > 0 {
                return Ok(bytes_read);
            }

            // Non-blocking mocks answer an empty queue at once.
            if !state.blocking_reads || Instant::now() >= deadline {
                return Err(PortError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "No data available",
                )));
            }
            drop(state);
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.state.lock().timeout = timeout;
        Ok(())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .field("leased", &self.lease.is_some())
            .finish()
    }
}

/// Counts one open descriptor for as long as it lives.
#[derive(Debug)]
struct DescriptorLease {
    open: Arc<AtomicUsize>,
}

impl Drop for DescriptorLease {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct MockBus {
    ports: HashMap<String, MockSerialPort>,
    denied: HashSet<String>,
    open_log: Vec<(String, PortConfiguration)>,
}

/// `PortOpener` backed by registered mock ports.
///
/// Opening an unregistered path fails with `NotFound`, a path marked with
/// [`deny`](Self::deny) fails with `PermissionDenied`.
#[derive(Debug, Default, Clone)]
pub struct MockOpener {
    bus: Arc<Mutex<MockBus>>,
    open: Arc<AtomicUsize>,
}

impl MockOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `port` openable under its own name. Returns a handle sharing its queues.
    pub fn register(&self, port: MockSerialPort) -> MockSerialPort {
        self.bus
            .lock()
            .ports
            .insert(port.name.clone(), port.clone());
        port
    }

    /// Register a fresh mock port at `path`.
    pub fn add_port(&self, path: &str) -> MockSerialPort {
        self.register(MockSerialPort::new(path))
    }

    /// Opening `path` will be refused with a permission error.
    pub fn deny(&self, path: &str) {
        self.bus.lock().denied.insert(path.to_string());
    }

    /// Number of descriptors handed out and not yet dropped.
    pub fn open_descriptors(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Every successful open, in order.
    pub fn open_log(&self) -> Vec<(String, PortConfiguration)> {
        self.bus.lock().open_log.clone()
    }
}

impl PortOpener for MockOpener {
    fn open(&self, path: &str, config: &PortConfiguration) -> Result<PortAdapter, PortError> {
        let mut bus = self.bus.lock();
        if bus.denied.contains(path) {
            return Err(PortError::permission_denied(path));
        }
        let port = bus
            .ports
            .get(path)
            .cloned()
            .ok_or_else(|| PortError::not_found(path))?;
        bus.open_log.push((path.to_string(), *config));

        self.open.fetch_add(1, Ordering::SeqCst);
        let lease = Arc::new(DescriptorLease {
            open: Arc::clone(&self.open),
        });
        let leased = port.leased(lease);
        leased.state.lock().timeout = config.timeout;
        Ok(Box::new(leased))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_and_read() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello");

        let mut buffer = [0u8; 10];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buffer[..n], b"Hello");
    }

    #[test]
    fn test_write_logging() {
        let mut port = MockSerialPort::new("MOCK0");
        port.write_bytes(b"Test1").unwrap();
        port.write_bytes(b"Test2").unwrap();

        let log = port.get_write_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], b"Test1");
        assert_eq!(log[1], b"Test2");
    }

    #[test]
    fn test_timeout_simulation() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_should_timeout(true);

        let mut buffer = [0u8; 10];
        let result = port.read_bytes(&mut buffer);
        assert!(matches!(result, Err(PortError::Timeout(_))));
    }

    #[test]
    fn test_empty_read_reports_timeout() {
        let mut port = MockSerialPort::new("MOCK0");
        let mut buffer = [0u8; 10];

        let err = port.read_bytes(&mut buffer).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_blocking_read_waits_for_timeout() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_blocking_reads(true);
        port.set_timeout(Duration::from_millis(40)).unwrap();
        assert_eq!(port.timeout(), Duration::from_millis(40));

        let started = Instant::now();
        let mut buffer = [0u8; 4];
        assert!(port.read_bytes(&mut buffer).unwrap_err().is_timeout());
        assert!(started.elapsed() >= Duration::from_millis(40));

        port.enqueue_read(b"ok");
        assert_eq!(port.read_bytes(&mut buffer).unwrap(), 2);
    }

    #[test]
    fn test_failing_writes() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_fail_writes(true);
        assert!(port.write_bytes(b"x").is_err());
        assert!(port.get_write_log().is_empty());
    }

    #[test]
    fn test_opener_counts_descriptors() {
        let opener = MockOpener::new();
        let mut probe = opener.add_port("MOCK0");
        let config = PortConfiguration::default();

        let first = opener.open("MOCK0", &config).unwrap();
        let second = opener.open("MOCK0", &config).unwrap();
        assert_eq!(opener.open_descriptors(), 2);

        drop(first);
        assert_eq!(opener.open_descriptors(), 1);

        // Queues are shared with the registered handle.
        probe.enqueue_read(b"z");
        let mut second = second;
        let mut buf = [0u8; 1];
        assert_eq!(second.read_bytes(&mut buf).unwrap(), 1);

        drop(second);
        assert_eq!(opener.open_descriptors(), 0);
    }

    #[test]
    fn test_opener_errors() {
        let opener = MockOpener::new();
        opener.add_port("MOCK1");
        opener.deny("MOCK1");
        let config = PortConfiguration::default();

        assert!(matches!(
            opener.open("MOCK1", &config),
            Err(PortError::PermissionDenied(_))
        ));
        assert!(matches!(
            opener.open("MOCK9", &config),
            Err(PortError::NotFound(_))
        ));
        assert_eq!(opener.open_descriptors(), 0);
    }
}
