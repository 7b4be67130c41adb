//! Unified application error type.

use crate::config::ConfigError;
use crate::link::LinkError;
use crate::port::CatalogError;
use crate::protocol::{CommandError, DocumentError, ParamError};
use thiserror::Error;

/// Everything the foreground façade and the binary can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No port selected and none given.
    #[error("No serial port selected")]
    NoPortSelected,

    #[error("Failed to start worker thread: {0}")]
    Worker(#[source] std::io::Error),

    #[error("An I/O error occurred: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Errors after which the program cannot usefully continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Catalog(CatalogError::UnsupportedPlatform(_)) | Self::Config(_) | Self::Worker(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent_messages() {
        let err: AppError = CatalogError::UnsupportedPlatform("plan9").into();
        assert_eq!(err.to_string(), "Unsupported platform: plan9");
        assert!(err.is_fatal());

        let err: AppError = CommandError::SendDisabled.into();
        assert!(!err.is_fatal());
    }
}
