//! Tests requiring actual serial hardware.
//!
//! These tests are ignored by default and skip themselves when no test port
//! is configured.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! export TEST_PORT=/dev/ttyUSB0   # or COM3 on Windows
//! export TEST_BAUD=9600           # optional, default: 9600
//! cargo test --test integration_hardware -- --ignored
//! ```
//!
//! The loopback test expects TX and RX wired together.

use serial_deck::port::{list_ports, PortConfiguration, SerialPortAdapter, SyncSerialPort};
use serial_deck::{CommandList, ConfigLoader, MemoryLog, SerialLink};
use std::time::Duration;

/// Port and baud from `[testing]` config or `TEST_PORT`/`TEST_BAUD`.
fn test_port() -> Option<(String, u32)> {
    let config = ConfigLoader::with_defaults().into_config();
    match config.testing.port {
        Some(port) => Some((port, config.testing.baud)),
        None => {
            println!("Skipping hardware test: TEST_PORT not set");
            None
        }
    }
}

#[test]
#[ignore]
fn test_catalog_lists_test_port() {
    let Some((port, _)) = test_port() else { return };
    let ports = list_ports().expect("enumeration works on this platform");
    println!("Detected ports: {:?}", ports);
    assert!(ports.contains(&port), "{port} not in {ports:?}");
}

#[test]
#[ignore]
fn test_real_port_open_close() {
    let Some((port, baud)) = test_port() else { return };
    let config = PortConfiguration::new(baud, Duration::from_millis(500));

    let adapter = SyncSerialPort::open(&port, config).expect("port opens");
    assert_eq!(adapter.name(), port);
    drop(adapter);

    // Reopen to confirm the handle was released.
    SyncSerialPort::open(&port, config).expect("port reopens");
}

#[test]
#[ignore]
fn test_loopback_command_round_trip() {
    let Some((port, baud)) = test_port() else { return };
    let link = SerialLink::system().with_read_timeout(Duration::from_secs(1));
    link.connect(&port, baud).expect("link connects");

    let mut list = CommandList::new();
    let cmd = list.add("echo");
    cmd.add_char("a", "O");
    cmd.add_char("b", "K");
    cmd.add_char("nl", "\n");
    list.set_send_enabled(true);

    let log = MemoryLog::new();
    list.send(0, &link, &log).expect("command sent");
    let line = link.read_line().expect("loopback echoes the line");
    assert_eq!(line, b"OK\n");
}
