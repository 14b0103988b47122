//! Event system for controller notifications
//!
//! Provides:
//! - Event types for position, execution, and connection changes
//! - Event dispatcher publishing events to subscribers over a broadcast channel

use crate::data::Axis;
use tokio::sync::broadcast;

/// Controller event types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// Connection opened on a port
    Connected(String),
    /// Connection closed or lost
    Disconnected(String),
    /// Tracked position of an axis changed
    PositionChanged {
        /// The axis that moved.
        axis: Axis,
        /// New absolute position.
        position: i32,
    },
    /// Target position of an axis changed
    TargetChanged {
        /// The axis that was commanded.
        axis: Axis,
        /// New absolute target.
        position: i32,
    },
    /// Command text handed to the serial worker
    CommandSent(String),
    /// Sequence execution can advance (true) or has stopped (false)
    ExecutionStateChanged(bool),
    /// Row currently executing, `None` once idle
    RunningRowChanged(Option<usize>),
    /// Every row of the sequence has been executed
    ExecutionFinished,
    /// Speed of one axis or of every axis changed
    SpeedChanged {
        /// Target axis, `None` for every axis.
        axis: Option<Axis>,
        /// New speed.
        speed: u32,
    },
    /// Master-level feedback line
    Feedback(String),
    /// Status forwarded from a slave
    SlaveStatus {
        /// The reporting axis.
        axis: Axis,
        /// Status text.
        message: String,
    },
    /// Row store contents changed
    RowsChanged(usize),
    /// Current sequence name changed
    SequenceChanged(String),
    /// Error occurred
    Error(String),
}

impl std::fmt::Display for ControllerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerEvent::Connected(port) => write!(f, "Connected to {}", port),
            ControllerEvent::Disconnected(reason) => write!(f, "Disconnected: {}", reason),
            ControllerEvent::PositionChanged { axis, position } => {
                write!(f, "Position {}: {}", axis.label(), position)
            }
            ControllerEvent::TargetChanged { axis, position } => {
                write!(f, "Target {}: {}", axis.label(), position)
            }
            ControllerEvent::CommandSent(cmd) => write!(f, "TX: {}", cmd),
            ControllerEvent::ExecutionStateChanged(active) => {
                write!(f, "Execution {}", if *active { "ready" } else { "stopped" })
            }
            ControllerEvent::RunningRowChanged(Some(row)) => write!(f, "Running row {}", row + 1),
            ControllerEvent::RunningRowChanged(None) => write!(f, "No row running"),
            ControllerEvent::ExecutionFinished => write!(f, "All rows have been executed"),
            ControllerEvent::SpeedChanged {
                axis: Some(axis),
                speed,
            } => write!(f, "Speed {}: {}", axis.label(), speed),
            ControllerEvent::SpeedChanged { axis: None, speed } => {
                write!(f, "Speed (all axes): {}", speed)
            }
            ControllerEvent::Feedback(msg) => write!(f, "Feedback: {}", msg),
            ControllerEvent::SlaveStatus { axis, message } => {
                write!(f, "Slave {}: {}", axis.label(), message)
            }
            ControllerEvent::RowsChanged(count) => write!(f, "{} rows", count),
            ControllerEvent::SequenceChanged(name) => write!(f, "Sequence: {}", name),
            ControllerEvent::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Event dispatcher for publishing events to subscribers
#[derive(Clone)]
pub struct EventDispatcher {
    /// Broadcast sender channel for controller events.
    tx: broadcast::Sender<ControllerEvent>,
}

impl EventDispatcher {
    /// Create a new event dispatcher
    ///
    /// # Arguments
    /// * `buffer_size` - Size of the broadcast buffer (default 256)
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size);
        Self { tx }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of subscribers that received it; publishing with
    /// nobody listening is not an error.
    pub fn publish(&self, event: ControllerEvent) -> usize {
        tracing::trace!("event: {}", event);
        self.tx.send(event).unwrap_or(0)
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(256)
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Drain every event currently queued for a receiver
///
/// Lagged notifications are skipped; the remaining events are returned in
/// publication order.
pub fn drain_events(rx: &mut broadcast::Receiver<ControllerEvent>) -> Vec<ControllerEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!("Event receiver lagged, {} events skipped", skipped);
            }
            Err(_) => break,
        }
    }
    events
}
