//! End-to-end flows through the app façade over mock hardware.

mod common;

use common::{fixture, mock_app};
use serial_deck::{Activity, AppError, CommandError, ParamKind, Parameter, WorkerEvent};
use std::sync::mpsc;
use std::time::{Duration, Instant};

fn wait_for<F>(rx: &mpsc::Receiver<WorkerEvent>, mut pred: F) -> WorkerEvent
where
    F: FnMut(&WorkerEvent) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        let event = rx.recv_timeout(left).expect("event before deadline");
        if pred(&event) {
            return event;
        }
    }
}

#[test]
fn open_connect_send_and_receive() {
    let (mut app, probe, log) = mock_app("MOCK0");
    let (tx, rx) = mpsc::channel();
    app.start_workers(tx).unwrap();

    let ports = wait_for(&rx, |e| matches!(e, WorkerEvent::Ports(_)));
    app.handle_event(&ports);
    assert_eq!(app.selected(), Some("MOCK0"));

    app.open(&fixture("panel.xml")).unwrap();
    assert!(matches!(
        app.send(0),
        Err(AppError::Command(CommandError::SendDisabled))
    ));

    app.connect(None).unwrap();
    let sent = app.send(1).unwrap();
    assert_eq!(sent, vec![b'G', 0x02, 0x01, 0x04, 0x03]);
    assert_eq!(probe.written_bytes(), sent);
    assert!(log.contains("Send: 'G\\x02\\x01\\x04\\x03' (4702010403)"));

    let mut device = probe.clone();
    device.enqueue_read(b"ACK G\r\n");
    let received = wait_for(&rx, |e| matches!(e, WorkerEvent::Received(_)));
    app.handle_event(&received);
    assert!(log.contains("Received: ACK G\\r\\n"));

    app.disconnect();
    assert!(!app.list().send_enabled());
    app.shutdown();

    let finished: Vec<_> = rx
        .try_iter()
        .filter_map(|e| match e {
            WorkerEvent::Finished(activity) => Some(activity),
            _ => None,
        })
        .collect();
    assert!(finished.contains(&Activity::PortPoller));
    assert!(finished.contains(&Activity::LinkReader));
}

#[test]
fn unencodable_command_writes_nothing() {
    let (mut app, probe, log) = mock_app("MOCK0");
    app.list_mut()
        .add("unfinished")
        .push(Parameter::blank("b", ParamKind::Uint8));
    app.connect(Some("MOCK0")).unwrap();

    let result = app.send(0);
    assert!(matches!(
        result,
        Err(AppError::Command(CommandError::MissingValue { .. }))
    ));
    assert!(probe.get_write_log().is_empty());
    assert!(log.contains("Missing values"));
}

#[test]
fn reconnect_replaces_the_open_port() {
    let (mut app, _probe, log) = mock_app("MOCK0");

    app.connect(Some("MOCK0")).unwrap();
    app.connect(Some("MOCK0")).unwrap();
    assert!(app.link().is_connected());

    let lines = log.lines();
    let connects = lines.iter().filter(|l| l.starts_with("Connecting to")).count();
    let disconnects = lines.iter().filter(|l| *l == "Disconnected").count();
    assert_eq!((connects, disconnects), (2, 1));
}
