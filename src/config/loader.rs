//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_DECK";

/// Config file name
const CONFIG_FILE_NAME: &str = "serial-deck.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_DECK_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order, then apply
    /// environment overrides and validate.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        if apply_env_overrides(&mut config).is_err() || config.validate().is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Platform config directory
    get_default_config_path().filter(|path| path.exists())
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "serial-deck").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Save configuration to a file.
fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_var<T: FromStr>(var: &str, value: &str, what: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse(var, format!("Invalid {}", what)))
}

fn env_key(section_key: &str) -> String {
    format!("{}_{}", ENV_PREFIX, section_key)
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `SERIAL_DECK_<SECTION>_<KEY>`.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Serial overrides
    let var = env_key("SERIAL_DEFAULT_BAUD");
    if let Ok(val) = std::env::var(&var) {
        config.serial.default_baud = parse_var(&var, &val, "baud rate")?;
    }
    let var = env_key("SERIAL_READ_TIMEOUT_MS");
    if let Ok(val) = std::env::var(&var) {
        config.serial.read_timeout_ms = parse_var(&var, &val, "timeout")?;
    }
    let var = env_key("SERIAL_MAX_LINE_LEN");
    if let Ok(val) = std::env::var(&var) {
        config.serial.max_line_len = parse_var(&var, &val, "line length")?;
    }

    // Worker overrides
    let var = env_key("WORKERS_POLL_INTERVAL_MS");
    if let Ok(val) = std::env::var(&var) {
        config.workers.poll_interval_ms = parse_var(&var, &val, "interval")?;
    }
    let var = env_key("WORKERS_READ_INTERVAL_MS");
    if let Ok(val) = std::env::var(&var) {
        config.workers.read_interval_ms = parse_var(&var, &val, "interval")?;
    }

    // Logging overrides
    if let Ok(val) = std::env::var(env_key("LOGGING_LEVEL")) {
        config.logging.level = val;
    }

    // Testing overrides (also support legacy TEST_PORT etc.)
    if let Ok(val) = std::env::var(env_key("TESTING_PORT")).or_else(|_| std::env::var("TEST_PORT"))
    {
        config.testing.port = Some(val);
    }
    if let Ok(val) = std::env::var(env_key("TESTING_BAUD")).or_else(|_| std::env::var("TEST_BAUD"))
    {
        config.testing.baud = parse_var(
            &format!("{} or TEST_BAUD", env_key("TESTING_BAUD")),
            &val,
            "baud rate",
        )?;
    }

    Ok(())
}
