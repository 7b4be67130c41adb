//! Errors of the command model and its documents.

use super::parameter::ParamKind;
use crate::link::LinkError;
use std::path::PathBuf;
use thiserror::Error;

/// A parameter whose text cannot be turned into bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("{kind} parameter '{name}' needs {expected} hex digits, got '{text}'")]
    Format {
        name: String,
        kind: ParamKind,
        expected: usize,
        text: String,
    },

    #[error("'{text}' is not valid input for a {kind} parameter")]
    InvalidInput { kind: ParamKind, text: String },
}

/// Failures of a single command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// At least one parameter has no byte encoding; nothing was written.
    #[error("Missing values in command '{command}': {source}")]
    MissingValue {
        command: String,
        #[source]
        source: ParamError,
    },

    /// Sending is gated off because the link is not connected.
    #[error("Sending is disabled while the serial port is disconnected")]
    SendDisabled,

    #[error("No command at index {0}")]
    NoSuchCommand(usize),

    #[error("No parameter at index {1} in command {0}")]
    NoSuchParameter(usize, usize),

    #[error("No command named '{0}'")]
    UnknownCommand(String),

    #[error("No parameter named '{0}'")]
    UnknownParameter(String),

    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Failures loading or storing a protocol document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unknown file {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unknown file structure {}: {message}", .path.display())]
    Format { path: PathBuf, message: String },

    #[error("Failed to serialize protocol: {0}")]
    Serialize(String),

    /// A parameter could not be written out.
    #[error(transparent)]
    Param(#[from] ParamError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
