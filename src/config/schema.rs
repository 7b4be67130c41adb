//! Configuration schema definitions.
//!
//! Every section carries `#[serde(default)]` so a partial file is valid.

use super::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial link configuration
    pub serial: SerialConfig,
    /// Background worker pacing
    pub workers: WorkersConfig,
    /// Diagnostic logging
    pub logging: LoggingConfig,
    /// Hardware testing configuration
    pub testing: TestingConfig,
}

impl Config {
    /// Reject values the link and workers cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.default_baud == 0 {
            return Err(ConfigError::validation("serial.default_baud", "must be positive"));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(ConfigError::validation("serial.read_timeout_ms", "must be positive"));
        }
        if self.serial.max_line_len == 0 {
            return Err(ConfigError::validation("serial.max_line_len", "must be positive"));
        }
        if self.workers.poll_interval_ms == 0 {
            return Err(ConfigError::validation("workers.poll_interval_ms", "must be positive"));
        }
        if self.workers.read_interval_ms == 0 {
            return Err(ConfigError::validation("workers.read_interval_ms", "must be positive"));
        }
        Ok(())
    }
}

/// Serial link configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Baud rate used by `connect`
    pub default_baud: u32,
    /// Per-line read budget in milliseconds
    pub read_timeout_ms: u64,
    /// Longest line returned by one read
    pub max_line_len: usize,
    /// Port aliases for convenience
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            default_baud: crate::port::DEFAULT_BAUD_RATE,
            read_timeout_ms: 1000,
            max_line_len: crate::link::DEFAULT_MAX_LINE_LEN,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Worker pacing section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    /// Wait between port enumerations
    pub poll_interval_ms: u64,
    /// Wait between line reads
    pub read_interval_ms: u64,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            read_interval_ms: 1000,
        }
    }
}

impl WorkersConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn read_interval(&self) -> Duration {
        Duration::from_millis(self.read_interval_ms)
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line format with colors
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
    /// Default `fmt` layer format
    Full,
}

/// Hardware testing configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestingConfig {
    /// Port wired for hardware tests
    pub port: Option<String>,
    /// Test baud rate
    pub baud: u32,
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: crate::port::DEFAULT_BAUD_RATE,
        }
    }
}
