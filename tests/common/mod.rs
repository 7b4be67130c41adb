//! Shared test utilities for serial-deck integration tests.

#![allow(dead_code)]

use serial_deck::port::catalog::{CatalogError, PortCatalog};
use serial_deck::{App, CommandList, Config, MemoryLog, MockOpener, MockSerialPort, SerialLink};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Catalog that always reports the same ports.
#[derive(Debug, Clone, Default)]
pub struct FixedCatalog(pub Vec<String>);

impl PortCatalog for FixedCatalog {
    fn list_ports(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.0.clone())
    }
}

/// Configuration with short worker intervals so tests finish quickly.
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.workers.poll_interval_ms = 20;
    config.workers.read_interval_ms = 20;
    config.serial.read_timeout_ms = 50;
    config
}

/// An app over one mock port named `path`, plus a probe into that port.
pub fn mock_app(path: &str) -> (App, MockSerialPort, Arc<MemoryLog>) {
    let opener = MockOpener::new();
    let probe = opener.add_port(path);
    let config = fast_config();
    let link = SerialLink::new(opener).with_read_timeout(Duration::from_millis(50));
    let log = Arc::new(MemoryLog::new());
    let app = App::new(
        config,
        Arc::new(link),
        Arc::new(FixedCatalog(vec![path.to_string()])),
        log.clone(),
    );
    (app, probe, log)
}

/// Three commands, one per parameter kind.
pub fn sample_list() -> CommandList {
    let mut list = CommandList::new();
    list.add("one").add_char("c", "1");
    list.add("two").add_uint8("b", 2);
    let three = list.add("three");
    three.add_uint16("w", 0x0102);
    three.add_char("end", "!");
    list
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
