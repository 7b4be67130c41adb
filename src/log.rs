//! The operator-facing, append-only message log.
//!
//! This is what the presentation layer shows to the user ("Send: ...",
//! "Received: ...", "Missing values"). Diagnostics for developers go through
//! `tracing` instead.

use parking_lot::Mutex;
use std::io::Write;

/// Append-only sink of user-facing lines.
pub trait LogSink: Send + Sync {
    fn write_message(&self, message: &str);
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Remove and return all lines written so far.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }
}

impl LogSink for MemoryLog {
    fn write_message(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}

/// Prints every line to standard output as it arrives.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutLog;

impl LogSink for StdoutLog {
    fn write_message(&self, message: &str) {
        let mut out = std::io::stdout().lock();
        // A closed stdout leaves nobody to tell.
        let _ = writeln!(out, "{}", message);
        let _ = out.flush();
    }
}
