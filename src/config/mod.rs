//! Configuration module for serial-deck.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_DECK_CONFIG` environment variable (explicit path)
//! 2. `./serial-deck.toml` (current directory)
//! 3. `serial-deck.toml` in the platform config directory
//!    (`~/.config/serial-deck/` on Linux, `%APPDATA%\serial-deck\config\` on Windows)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is: `SERIAL_DECK_<SECTION>_<KEY>`
//!
//! Examples:
//! - `SERIAL_DECK_SERIAL_DEFAULT_BAUD=115200`
//! - `SERIAL_DECK_WORKERS_POLL_INTERVAL_MS=500`
//! - `SERIAL_DECK_TESTING_PORT=/dev/ttyUSB0`
//!
//! Legacy `TEST_PORT` and `TEST_BAUD` are honoured for hardware tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use serial_deck::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! println!("Default baud: {}", loader.config().serial.default_baud);
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig, TestingConfig, WorkersConfig};
