//! Enumeration of locally available serial devices.
//!
//! Candidate paths are platform specific (`COM1`..`COM256` on Windows,
//! `/dev/ttyUSB*` on Linux, `/dev/tty.*` on macOS). Every candidate is probed by
//! opening and immediately closing it; only devices that open are reported.

use super::error::PortError;
use super::sync_port::SystemOpener;
use super::traits::{PortConfiguration, PortOpener};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors raised while enumerating ports.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No candidate scheme exists for this OS.
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(&'static str),

    /// A candidate exists but the OS refused access to it.
    #[error("Permission denied while probing {0}")]
    PermissionDenied(String),

    /// The device directory could not be listed.
    #[error("Failed to list {dir}: {source}")]
    Scan {
        dir: String,
        #[source]
        source: std::io::Error,
    },
}

/// Source of the current device list.
#[cfg_attr(test, mockall::automock)]
pub trait PortCatalog: Send + Sync {
    fn list_ports(&self) -> Result<Vec<String>, CatalogError>;
}

/// The catalog of the machine we run on.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCatalog;

impl PortCatalog for SystemCatalog {
    fn list_ports(&self) -> Result<Vec<String>, CatalogError> {
        list_ports()
    }
}

/// List the serial ports that can currently be opened.
pub fn list_ports() -> Result<Vec<String>, CatalogError> {
    probe_ports(candidate_paths()?, &SystemOpener)
}

/// Probe each candidate with `opener` and keep the ones that open.
///
/// A permission failure aborts the whole enumeration; any other open failure
/// just drops the candidate.
pub fn probe_ports<I>(candidates: I, opener: &dyn PortOpener) -> Result<Vec<String>, CatalogError>
where
    I: IntoIterator<Item = String>,
{
    let config = PortConfiguration::default();
    let mut result = Vec::new();
    for path in candidates {
        match opener.open(&path, &config) {
            Ok(handle) => {
                drop(handle);
                result.push(path);
            }
            Err(PortError::PermissionDenied(p)) => return Err(CatalogError::PermissionDenied(p)),
            Err(e) => debug!("Skipping {}: {}", path, e),
        }
    }
    Ok(result)
}

/// Device paths worth probing on this platform.
pub fn candidate_paths() -> Result<Vec<String>, CatalogError> {
    #[cfg(target_os = "windows")]
    {
        Ok((1..=256).map(|i| format!("COM{i}")).collect())
    }

    #[cfg(target_os = "linux")]
    {
        scan_dir(Path::new("/dev"), "ttyUSB")
    }

    #[cfg(target_os = "macos")]
    {
        scan_dir(Path::new("/dev"), "tty.")
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        Err(CatalogError::UnsupportedPlatform(std::env::consts::OS))
    }
}

/// Entries of `dir` whose file name starts with `prefix`, in directory order.
#[cfg_attr(target_os = "windows", allow(dead_code))]
fn scan_dir(dir: &Path, prefix: &str) -> Result<Vec<String>, CatalogError> {
    let entries = std::fs::read_dir(dir).map_err(|source| CatalogError::Scan {
        dir: dir.display().to_string(),
        source,
    })?;

    Ok(entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(prefix))
        .map(|entry| entry.path().display().to_string())
        .collect())
}
