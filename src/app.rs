//! Foreground façade: owns the command list, the device selection and the
//! background workers, and sequences connect/disconnect with their log lines.

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::link::SerialLink;
use crate::log::LogSink;
use crate::port::{PortCatalog, SystemCatalog};
use crate::protocol::{CommandList, Diagnostic};
use crate::worker::{self, WorkerEvent, WorkerHandle};
use std::path::Path;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct App {
    config: Config,
    link: Arc<SerialLink>,
    catalog: Arc<dyn PortCatalog>,
    log: Arc<dyn LogSink>,
    list: CommandList,
    ports: Vec<String>,
    selected: Option<String>,
    workers: Vec<WorkerHandle>,
}

impl App {
    pub fn new(
        config: Config,
        link: Arc<SerialLink>,
        catalog: Arc<dyn PortCatalog>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            config,
            link,
            catalog,
            log,
            list: CommandList::new(),
            ports: Vec::new(),
            selected: None,
            workers: Vec::new(),
        }
    }

    /// App wired to real hardware.
    pub fn system(config: Config, log: Arc<dyn LogSink>) -> Self {
        let link = SerialLink::system()
            .with_read_timeout(config.serial.read_timeout())
            .with_max_line_len(config.serial.max_line_len);
        Self::new(config, Arc::new(link), Arc::new(SystemCatalog), log)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn link(&self) -> &Arc<SerialLink> {
        &self.link
    }

    pub fn list(&self) -> &CommandList {
        &self.list
    }

    /// Editing access to the list. Sending stays gated by the connection.
    pub fn list_mut(&mut self) -> &mut CommandList {
        &mut self.list
    }

    /// Start the port poller and the link reader, publishing on `events`.
    ///
    /// Workers from an earlier start are stopped and joined first, so nothing
    /// they publish can follow the new start on the new channel.
    pub fn start_workers(&mut self, events: Sender<WorkerEvent>) -> AppResult<()> {
        self.stop_workers();

        let poller = worker::spawn_port_poller(
            Arc::clone(&self.catalog),
            self.config.workers.poll_interval(),
            events.clone(),
        )
        .map_err(AppError::Worker)?;
        self.workers.push(poller);

        let reader = worker::spawn_link_reader(
            Arc::clone(&self.link),
            self.config.workers.read_interval(),
            events,
        )
        .map_err(AppError::Worker)?;
        self.workers.push(reader);

        info!("Background workers started");
        Ok(())
    }

    pub fn workers_running(&self) -> bool {
        self.workers.iter().any(|w| !w.is_finished())
    }

    fn stop_workers(&mut self) {
        for handle in &mut self.workers {
            handle.request_stop();
        }
        for handle in self.workers.drain(..) {
            handle.stop();
        }
    }

    /// Apply one worker event to the foreground state.
    pub fn handle_event(&mut self, event: &WorkerEvent) {
        match event {
            WorkerEvent::Ports(ports) => self.update_ports(ports.clone()),
            WorkerEvent::Received(line) => self.log.write_message(line),
            WorkerEvent::Finished(activity) => debug!("{} finished", activity),
            WorkerEvent::Failed { activity, error } => {
                warn!("{} stopped: {}", activity, error);
                self.log.write_message(&format!("{} stopped: {}", activity, error));
            }
        }
    }

    /// Enumerate ports right now instead of waiting for the poller.
    pub fn refresh_ports(&mut self) -> AppResult<&[String]> {
        let ports = self.catalog.list_ports()?;
        self.update_ports(ports);
        Ok(&self.ports)
    }

    /// Replace the device list. The last entry becomes the selection.
    pub fn update_ports(&mut self, ports: Vec<String>) {
        self.selected = ports.last().cloned();
        self.ports = ports;
    }

    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, path: &str) {
        self.selected = Some(path.to_string());
    }

    /// Connect to `path`, or to the selected device when `path` is `None`.
    ///
    /// An existing connection is closed first. Sending follows the outcome.
    pub fn connect(&mut self, path: Option<&str>) -> AppResult<()> {
        if self.link.is_connected() {
            self.disconnect();
        }

        let name = path
            .or(self.selected.as_deref())
            .ok_or(AppError::NoPortSelected)?;
        let target = self.config.serial.resolve_port(name);

        self.log.write_message(&format!("Connecting to {}", target));
        match self.link.connect(&target, self.config.serial.default_baud) {
            Ok(()) => {
                self.log.write_message("Serial port is connected");
                self.list.set_send_enabled(true);
                info!("Connected to {}", target);
                Ok(())
            }
            Err(e) => {
                self.log.write_message("Serial port is not connected");
                self.list.set_send_enabled(false);
                warn!("Connect failed: {}", e);
                Err(e.into())
            }
        }
    }

    pub fn disconnect(&mut self) {
        let path = self.link.port_path().unwrap_or_default();
        self.log.write_message(&format!("Disconnecting {}", path));
        self.link.disconnect();
        self.list.set_send_enabled(false);
        self.log.write_message("Disconnected");
    }

    /// Send the command at `index`, returning the bytes written.
    pub fn send(&self, index: usize) -> AppResult<Vec<u8>> {
        Ok(self.list.send(index, &self.link, self.log.as_ref())?)
    }

    pub fn open(&mut self, path: &Path) -> AppResult<Vec<Diagnostic>> {
        Ok(self.list.open(path, self.log.as_ref())?)
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        Ok(self.list.save(path, self.log.as_ref())?)
    }

    /// Stop and join both workers, then release the port.
    pub fn shutdown(&mut self) {
        self.stop_workers();
        if self.link.is_connected() {
            self.link.disconnect();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}
