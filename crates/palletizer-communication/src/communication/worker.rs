//! Dedicated serial I/O worker
//!
//! One background thread owns the port. Callers only append to a FIFO
//! queue; the worker pops one command per loop iteration, writes it with a
//! newline terminator, reads whatever bytes are available, and hands every
//! complete inbound line back over an unbounded channel. That channel is the
//! only point where data crosses threads.
//!
//! A read or write failure ends the connection: the worker reports
//! [`WorkerEvent::Disconnected`] and exits. Reconnecting is up to the caller.

use super::line_buffer::LineBuffer;
use super::serial::{RealSerialPort, SerialPort};
use super::ConnectionParams;
use palletizer_core::constants::DEFAULT_POLL_INTERVAL_MS;
use palletizer_core::ConnectionError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;

/// Notifications from the worker thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// Port opened and worker running
    Connected(String),
    /// One complete inbound line, trimmed
    Line(String),
    /// Connection closed or lost, with a status message
    Disconnected(String),
}

/// State shared between the handle and the worker thread
struct Shared {
    queue: Mutex<VecDeque<String>>,
    running: AtomicBool,
    connected: AtomicBool,
}

/// Handle to the serial I/O worker
pub struct SerialWorker {
    shared: Arc<Shared>,
    events: mpsc::UnboundedSender<WorkerEvent>,
    handle: Option<JoinHandle<()>>,
    poll_interval: Duration,
    port_name: Option<String>,
}

impl SerialWorker {
    /// Create a disconnected worker and the receiver for its events
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WorkerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::new()),
                running: AtomicBool::new(false),
                connected: AtomicBool::new(false),
            }),
            events: tx,
            handle: None,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            port_name: None,
        };
        (worker, rx)
    }

    /// Open the port described by `params` and start the worker
    pub fn connect(&mut self, params: &ConnectionParams) -> Result<(), ConnectionError> {
        self.ensure_disconnected()?;
        let port = match RealSerialPort::open(params) {
            Ok(port) => port,
            Err(e) => {
                let _ = self
                    .events
                    .send(WorkerEvent::Disconnected(format!("Error: {}", e)));
                return Err(e);
            }
        };
        self.poll_interval = params.poll_interval();
        self.connect_with(Box::new(port))
    }

    /// Start the worker on an already opened port
    pub fn connect_with(&mut self, port: Box<dyn SerialPort>) -> Result<(), ConnectionError> {
        self.ensure_disconnected()?;
        self.reap();

        let name = port.name();
        self.shared.queue.lock().clear();
        self.shared.running.store(true, Ordering::SeqCst);
        self.shared.connected.store(true, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();
        let poll_interval = self.poll_interval;
        let handle = thread::Builder::new()
            .name("serial-worker".to_string())
            .spawn(move || run_loop(port, shared, events, poll_interval))
            .map_err(|e| {
                self.shared.running.store(false, Ordering::SeqCst);
                self.shared.connected.store(false, Ordering::SeqCst);
                ConnectionError::FailedToOpen {
                    port: name.clone(),
                    reason: format!("failed to spawn worker: {}", e),
                }
            })?;

        self.handle = Some(handle);
        self.port_name = Some(name.clone());
        tracing::info!("Connected to {}", name);
        let _ = self.events.send(WorkerEvent::Connected(name));
        Ok(())
    }

    /// Set the sleep between loop iterations used by the next connection
    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    /// Queue a command for the worker
    ///
    /// Returns false when not connected; nothing is queued then.
    pub fn send_command(&self, command: &str) -> bool {
        if !self.is_connected() {
            tracing::warn!("Dropping command '{}': not connected", command);
            return false;
        }
        self.shared.queue.lock().push_back(command.to_string());
        tracing::debug!("Queued '{}'", command);
        true
    }

    /// Number of commands waiting to be written
    pub fn queued_commands(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Whether the worker currently holds an open port
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    /// Name of the port of the current or last connection
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    /// Stop the worker, close the port, and discard queued commands
    pub fn disconnect(&mut self) {
        let was_connected = self.shared.connected.swap(false, Ordering::SeqCst);
        self.shared.running.store(false, Ordering::SeqCst);
        self.reap();

        let discarded = {
            let mut queue = self.shared.queue.lock();
            let n = queue.len();
            queue.clear();
            n
        };
        if discarded > 0 {
            tracing::debug!("Discarded {} queued commands", discarded);
        }

        if was_connected {
            tracing::info!("Disconnected");
            let _ = self
                .events
                .send(WorkerEvent::Disconnected("Disconnected".to_string()));
        }
    }

    fn ensure_disconnected(&self) -> Result<(), ConnectionError> {
        if self.is_connected() {
            return Err(ConnectionError::AlreadyConnected {
                port: self.port_name.clone().unwrap_or_default(),
            });
        }
        Ok(())
    }

    fn reap(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Serial worker thread panicked");
            }
        }
    }
}

impl Drop for SerialWorker {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.connected.store(false, Ordering::SeqCst);
        self.reap();
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

fn write_line(port: &mut dyn SerialPort, command: &str) -> io::Result<()> {
    let mut data = Vec::with_capacity(command.len() + 1);
    data.extend_from_slice(command.as_bytes());
    data.push(b'\n');

    let mut written = 0;
    while written < data.len() {
        match port.write(&data[written..]) {
            Ok(0) => return Err(io::Error::new(io::ErrorKind::WriteZero, "port accepted no data")),
            Ok(n) => written += n,
            Err(e) if is_transient(&e) => continue,
            Err(e) => return Err(e),
        }
    }
    port.flush()
}

fn read_available(port: &mut dyn SerialPort, buf: &mut [u8]) -> io::Result<usize> {
    if port.bytes_to_read()? == 0 {
        return Ok(0);
    }
    match port.read(buf) {
        Ok(n) => Ok(n),
        Err(e) if is_transient(&e) => Ok(0),
        Err(e) => Err(e),
    }
}

fn run_loop(
    mut port: Box<dyn SerialPort>,
    shared: Arc<Shared>,
    events: mpsc::UnboundedSender<WorkerEvent>,
    poll_interval: Duration,
) {
    let mut lines = LineBuffer::new();
    let mut buf = [0u8; 256];

    while shared.running.load(Ordering::SeqCst) {
        let next = shared.queue.lock().pop_front();
        if let Some(command) = next {
            if let Err(e) = write_line(port.as_mut(), &command) {
                fail(&shared, &events, "write", &e);
                break;
            }
            tracing::debug!("TX {}", command);
        }

        match read_available(port.as_mut(), &mut buf) {
            Ok(0) => {}
            Ok(n) => {
                for line in lines.push(&buf[..n]) {
                    tracing::debug!("RX {}", line);
                    if events.send(WorkerEvent::Line(line)).is_err() {
                        tracing::warn!("Event receiver dropped, stopping worker");
                        shared.running.store(false, Ordering::SeqCst);
                        break;
                    }
                }
            }
            Err(e) => {
                fail(&shared, &events, "read", &e);
                break;
            }
        }

        thread::sleep(poll_interval);
    }

    shared.connected.store(false, Ordering::SeqCst);
    if let Err(e) = port.close() {
        tracing::warn!("Error closing {}: {}", port.name(), e);
    }
}

fn fail(
    shared: &Shared,
    events: &mpsc::UnboundedSender<WorkerEvent>,
    op: &str,
    e: &io::Error,
) {
    tracing::error!("Serial {} failed: {}", op, e);
    shared.running.store(false, Ordering::SeqCst);
    let was_connected = shared.connected.swap(false, Ordering::SeqCst);
    shared.queue.lock().clear();
    if was_connected {
        let _ = events.send(WorkerEvent::Disconnected(format!(
            "Communication error: {}",
            e
        )));
    }
}
