//! Serial worker tests against an in-memory port

use palletizer_communication::{SerialPort, SerialWorker, WorkerEvent};
use palletizer_core::ConnectionError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Clone, Default)]
struct PortScript {
    written: Arc<Mutex<Vec<u8>>>,
    inbound: Arc<Mutex<VecDeque<u8>>>,
    broken: Arc<AtomicBool>,
}

impl PortScript {
    fn feed(&self, text: &str) {
        self.inbound.lock().extend(text.as_bytes());
    }

    fn written(&self) -> String {
        String::from_utf8_lossy(&self.written.lock()).to_string()
    }
}

struct ScriptedPort(PortScript);

impl SerialPort for ScriptedPort {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.0.broken.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        }
        self.0.written.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inbound = self.0.inbound.lock();
        let n = buf.len().min(inbound.len());
        for slot in buf.iter_mut().take(n) {
            *slot = inbound.pop_front().unwrap_or_default();
        }
        Ok(n)
    }

    fn bytes_to_read(&mut self) -> io::Result<usize> {
        if self.0.broken.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        }
        Ok(self.0.inbound.lock().len())
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn connected_worker() -> (SerialWorker, UnboundedReceiver<WorkerEvent>, PortScript) {
    let (mut worker, rx) = SerialWorker::new();
    worker.set_poll_interval(Duration::from_millis(1));
    let script = PortScript::default();
    worker
        .connect_with(Box::new(ScriptedPort(script.clone())))
        .unwrap();
    (worker, rx, script)
}

fn wait_for_event(
    rx: &mut UnboundedReceiver<WorkerEvent>,
    pred: impl Fn(&WorkerEvent) -> bool,
) -> Option<WorkerEvent> {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        match rx.try_recv() {
            Ok(event) if pred(&event) => return Some(event),
            Ok(_) => {}
            Err(_) => std::thread::sleep(Duration::from_millis(1)),
        }
    }
    None
}

fn wait_until(cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn test_commands_written_in_fifo_order() {
    let (worker, mut rx, script) = connected_worker();
    assert_eq!(
        wait_for_event(&mut rx, |_| true),
        Some(WorkerEvent::Connected("scripted".to_string()))
    );

    assert!(worker.send_command("START"));
    assert!(worker.send_command("x(100), y(200)"));

    assert!(wait_until(|| script.written() == "START\nx(100), y(200)\n"));
    assert_eq!(worker.queued_commands(), 0);
}

#[test]
fn test_inbound_lines_delivered() {
    let (_worker, mut rx, script) = connected_worker();
    script.feed("[FEEDBACK] ALL_SLA");
    script.feed("VES_COMPLETED\r\n[SLAVE] x;DONE\n");

    assert_eq!(
        wait_for_event(&mut rx, |e| matches!(e, WorkerEvent::Line(_))),
        Some(WorkerEvent::Line(
            "[FEEDBACK] ALL_SLAVES_COMPLETED".to_string()
        ))
    );
    assert_eq!(
        wait_for_event(&mut rx, |e| matches!(e, WorkerEvent::Line(_))),
        Some(WorkerEvent::Line("[SLAVE] x;DONE".to_string()))
    );
}

#[test]
fn test_io_failure_disconnects_without_retry() {
    let (worker, mut rx, script) = connected_worker();
    script.broken.store(true, Ordering::SeqCst);

    let event = wait_for_event(&mut rx, |e| matches!(e, WorkerEvent::Disconnected(_)));
    match event {
        Some(WorkerEvent::Disconnected(reason)) => {
            assert!(reason.starts_with("Communication error"))
        }
        other => panic!("expected disconnect, got {:?}", other),
    }
    assert!(wait_until(|| !worker.is_connected()));
    assert!(!worker.send_command("START"));
}

#[test]
fn test_send_requires_connection() {
    let (worker, _rx) = SerialWorker::new();
    assert!(!worker.is_connected());
    assert!(!worker.send_command("START"));
    assert_eq!(worker.queued_commands(), 0);
}

#[test]
fn test_disconnect_and_reconnect() {
    let (mut worker, mut rx, _script) = connected_worker();
    assert!(matches!(
        worker.connect_with(Box::new(ScriptedPort(PortScript::default()))),
        Err(ConnectionError::AlreadyConnected { .. })
    ));

    worker.disconnect();
    assert!(!worker.is_connected());
    assert_eq!(worker.queued_commands(), 0);
    assert_eq!(
        wait_for_event(&mut rx, |e| matches!(e, WorkerEvent::Disconnected(_))),
        Some(WorkerEvent::Disconnected("Disconnected".to_string()))
    );

    let script = PortScript::default();
    worker
        .connect_with(Box::new(ScriptedPort(script.clone())))
        .unwrap();
    assert!(worker.send_command("ZERO"));
    assert!(wait_until(|| script.written() == "ZERO\n"));
}
