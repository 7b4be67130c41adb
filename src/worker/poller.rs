//! Periodic re-enumeration of the port catalog.

use super::{Activity, WorkerEvent, WorkerHandle};
use crate::port::PortCatalog;
use std::io;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Start the poller: list ports, publish, wait `interval`, repeat.
///
/// A catalog failure ends the worker with [`WorkerEvent::Failed`]; it does not
/// retry.
pub fn spawn_port_poller(
    catalog: Arc<dyn PortCatalog>,
    interval: Duration,
    events: Sender<WorkerEvent>,
) -> io::Result<WorkerHandle> {
    WorkerHandle::spawn(Activity::PortPoller, move |stop| {
        while !stop.requested() {
            match catalog.list_ports() {
                Ok(ports) => {
                    debug!("Found {} port(s)", ports.len());
                    if events.send(WorkerEvent::Ports(ports)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    error!("Port enumeration failed: {}", e);
                    let _ = events.send(WorkerEvent::Failed {
                        activity: Activity::PortPoller,
                        error: e.to_string(),
                    });
                    return;
                }
            }
            if stop.wait(interval) {
                break;
            }
        }
        let _ = events.send(WorkerEvent::Finished(Activity::PortPoller));
    })
}
