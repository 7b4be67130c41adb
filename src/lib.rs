//! Serial Deck Library
//!
//! Build lists of binary commands from typed parameters, keep them in XML
//! protocol documents and send them over a serial link while watching the
//! lines the device sends back.
//!
//! # Modules
//!
//! - `config`: Configuration management with TOML support
//! - `port`: Port abstraction layer and port enumeration
//! - `link`: The shared serial link
//! - `worker`: Background port poller and link reader
//! - `protocol`: Parameters, commands, the command list and its documents
//! - `log`: Operator-facing message log
//! - `app`: Foreground façade tying the pieces together
//! - `console`: Line-oriented operator console
//! - `error`: Unified error handling

pub mod app;
pub mod config;
pub mod console;
pub mod error;
pub mod link;
pub mod log;
pub mod port;
pub mod protocol;
pub mod worker;

// Re-export commonly used types for convenience
pub use app::App;
pub use error::{AppError, AppResult};
pub use link::{LinkError, SerialLink};
pub use log::{LogSink, MemoryLog, StdoutLog};
pub use port::{
    CatalogError, MockOpener, MockSerialPort, PortCatalog, PortConfiguration, PortError,
    PortOpener, SerialPortAdapter, SyncSerialPort, SystemCatalog,
};
pub use protocol::{
    Command, CommandError, CommandList, Diagnostic, DocumentError, ParamError, ParamKind,
    Parameter,
};
pub use worker::{Activity, WorkerEvent, WorkerHandle};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
