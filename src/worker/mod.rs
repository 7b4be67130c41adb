//! Long-lived background activities.
//!
//! Each worker is a named `std::thread` that publishes [`WorkerEvent`]s on an
//! `mpsc` channel and watches its own stop channel between iterations.
//! Dropping the stop sender is the stop request; the worker notices it at the
//! next loop boundary (its inter-iteration wait is cut short), publishes
//! [`WorkerEvent::Finished`] and exits.

pub mod poller;
pub mod reader;

pub use poller::spawn_port_poller;
pub use reader::{received_line, spawn_link_reader};

use std::fmt;
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Default wait between two port enumerations.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default wait between two line reads.
pub const DEFAULT_READ_INTERVAL: Duration = Duration::from_secs(1);

/// Which background activity an event comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    PortPoller,
    LinkReader,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PortPoller => f.write_str("port-poller"),
            Self::LinkReader => f.write_str("link-reader"),
        }
    }
}

/// Everything a worker tells its observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// Fresh list of openable ports.
    Ports(Vec<String>),
    /// A line arrived on the link, already formatted for the log.
    Received(String),
    /// The worker saw its stop request and exited.
    Finished(Activity),
    /// The worker hit an error it cannot continue from.
    Failed { activity: Activity, error: String },
}

/// Worker side of the stop channel.
pub struct StopSignal {
    rx: mpsc::Receiver<()>,
}

impl StopSignal {
    /// True once a stop was requested.
    pub fn requested(&self) -> bool {
        !matches!(self.rx.try_recv(), Err(TryRecvError::Empty))
    }

    /// Sleep for `interval` unless a stop arrives first. Returns true on stop.
    pub fn wait(&self, interval: Duration) -> bool {
        !matches!(self.rx.recv_timeout(interval), Err(RecvTimeoutError::Timeout))
    }
}

/// Owner side of a running worker.
///
/// Dropping the handle stops the worker and waits for it.
#[derive(Debug)]
pub struct WorkerHandle {
    activity: Activity,
    stop: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub(crate) fn spawn<F>(activity: Activity, body: F) -> io::Result<Self>
    where
        F: FnOnce(StopSignal) + Send + 'static,
    {
        let (stop, rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name(activity.to_string())
            .spawn(move || body(StopSignal { rx }))?;
        debug!("Started {}", activity);

        Ok(Self {
            activity,
            stop: Some(stop),
            thread: Some(thread),
        })
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// Ask the worker to stop without waiting for it.
    pub fn request_stop(&mut self) {
        self.stop.take();
    }

    /// True once the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Request a stop and wait for the worker to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.request_stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("{} panicked", self.activity);
            } else {
                debug!("Joined {}", self.activity);
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
