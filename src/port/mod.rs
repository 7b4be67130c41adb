//! Port abstraction layer for serial communication.
//!
//! Provides the traits the link is written against, the `serialport`-backed
//! implementation, mocks for tests, and the catalog of available devices.

pub mod catalog;
pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use catalog::{list_ports, CatalogError, PortCatalog, SystemCatalog};
pub use error::PortError;
pub use mock::{MockOpener, MockSerialPort};
pub use sync_port::*;
pub use traits::*;
