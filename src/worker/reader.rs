//! Continuous line reading from the shared link.

use super::{Activity, WorkerEvent, WorkerHandle};
use crate::link::SerialLink;
use std::io;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

/// `Received: <escaped bytes>`
pub fn received_line(line: &[u8]) -> String {
    format!("Received: {}", line.escape_ascii())
}

/// Start the reader: read a line, publish it if non-empty, wait `interval`.
///
/// Runs whether or not the link is connected; iterations while disconnected
/// only wait.
pub fn spawn_link_reader(
    link: Arc<SerialLink>,
    interval: Duration,
    events: Sender<WorkerEvent>,
) -> io::Result<WorkerHandle> {
    WorkerHandle::spawn(Activity::LinkReader, move |stop| {
        while !stop.requested() {
            if let Some(line) = link.read_line().filter(|l| !l.is_empty()) {
                if events.send(WorkerEvent::Received(received_line(&line))).is_err() {
                    return;
                }
            }
            if stop.wait(interval) {
                break;
            }
        }
        let _ = events.send(WorkerEvent::Finished(Activity::LinkReader));
    })
}
