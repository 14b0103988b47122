//! Palletizer controller
//!
//! Owns everything the operator talks to: the serial worker, the tracked
//! positions and axis settings, the rows being edited, the executor and the
//! saved sequences. It is single-threaded; the only data arriving from the
//! worker thread is drained in [`Controller::poll`], which should be called
//! on a short timer.

use palletizer_communication::{
    parse_response, ConnectionParams, DeviceResponse, SerialPort, SerialWorker, WorkerEvent,
};
use palletizer_core::codec::jog_command;
use palletizer_core::constants::ALL_SLAVES_COMPLETED;
use palletizer_core::{
    Axis, ConnectionError, ControllerEvent, Error, EventDispatcher, GlobalCommand,
    OutboundCommand, PositionTracker, Result, SpeedCommand,
};
use palletizer_sequence::{Row, RowStore, RunOutcome, SequenceExecutor, SequenceLibrary};
use palletizer_settings::{AppConfig, AxesConfig};
use std::path::Path;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc};

/// Positions and per-axis settings shared by every panel
#[derive(Debug)]
pub struct ControllerState {
    /// Last commanded position of every axis
    pub tracker: PositionTracker,
    /// Speed, jog range and display inversion of every axis
    pub axes: AxesConfig,
}

impl ControllerState {
    /// State with every axis at zero
    pub fn new(axes: AxesConfig, events: EventDispatcher) -> Self {
        Self {
            tracker: PositionTracker::new(events),
            axes,
        }
    }

    /// Position of an axis as the operator should see it
    pub fn display_position(&self, axis: Axis) -> i32 {
        self.axes
            .get(axis)
            .display_position(self.tracker.get_position(axis))
    }
}

/// The palletizer controller
pub struct Controller {
    state: ControllerState,
    store: RowStore,
    executor: SequenceExecutor,
    library: SequenceLibrary,
    worker: SerialWorker,
    worker_events: mpsc::UnboundedReceiver<WorkerEvent>,
    events: EventDispatcher,
    auto_advance: bool,
}

impl Controller {
    /// Create a disconnected controller from the application config
    pub fn new(config: &AppConfig) -> Self {
        let events = EventDispatcher::default();
        let (mut worker, worker_events) = SerialWorker::new();
        worker.set_poll_interval(config.connection.poll_interval());

        let mut executor = SequenceExecutor::new(events.clone());
        executor.set_completion_timeout(config.execution.completion_timeout());

        Self {
            state: ControllerState::new(config.axes, events.clone()),
            store: RowStore::new(),
            executor,
            library: SequenceLibrary::new(),
            worker,
            worker_events,
            events,
            auto_advance: config.execution.auto_advance,
        }
    }

    /// Subscribe to controller events
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Positions and axis settings
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Rows being edited and executed
    pub fn rows(&self) -> &RowStore {
        &self.store
    }

    /// Sequence executor
    pub fn executor(&self) -> &SequenceExecutor {
        &self.executor
    }

    /// Saved sequences
    pub fn library(&self) -> &SequenceLibrary {
        &self.library
    }

    /// Advance to the next row automatically on completion
    pub fn set_auto_advance(&mut self, enabled: bool) {
        self.auto_advance = enabled;
    }

    // Connection

    /// Open a serial port and start the worker
    pub fn connect(&mut self, params: &ConnectionParams) -> Result<()> {
        params.validate()?;
        self.worker.connect(params)?;
        Ok(())
    }

    /// Start the worker on an already opened port
    pub fn connect_with(&mut self, port: Box<dyn SerialPort>) -> Result<()> {
        self.worker.connect_with(port)?;
        Ok(())
    }

    /// Stop the worker and close the port
    pub fn disconnect(&mut self) {
        self.worker.disconnect();
    }

    /// Whether the serial link is up
    pub fn is_connected(&self) -> bool {
        self.worker.is_connected()
    }

    /// Name of the connected port
    pub fn port_name(&self) -> Option<&str> {
        self.worker.port_name().filter(|_| self.is_connected())
    }

    // Manual control

    /// Send a command, feeding axis commands to the position tracker
    pub fn send(&mut self, command: OutboundCommand) -> Result<()> {
        if !self.is_connected() {
            return Err(ConnectionError::NotConnected.into());
        }
        let wire = command.to_wire();
        if !self.worker.send_command(&wire) {
            return Err(ConnectionError::NotConnected.into());
        }
        if command.moves_axes() {
            self.state.tracker.parse_command(&wire);
        }
        self.events.publish(ControllerEvent::CommandSent(wire));
        Ok(())
    }

    /// Send a global command; ZERO also resets every tracked position
    pub fn send_global(&mut self, command: GlobalCommand) -> Result<()> {
        self.send(OutboundCommand::Global(command))?;
        if command == GlobalCommand::Zero {
            self.state.tracker.reset_all_positions();
        }
        Ok(())
    }

    /// Set the speed of one axis, or of every axis when `axis` is `None`
    pub fn set_speed(&mut self, axis: Option<Axis>, speed: u32) -> Result<()> {
        let command = SpeedCommand::new(axis, speed)?;
        self.send(OutboundCommand::Speed(command))?;

        match axis {
            Some(axis) => self.state.axes.get_mut(axis).speed = speed,
            None => {
                for axis in Axis::ALL {
                    self.state.axes.get_mut(axis).speed = speed;
                }
            }
        }
        self.events
            .publish(ControllerEvent::SpeedChanged { axis, speed });
        Ok(())
    }

    /// Move one axis, clamped to its range; returns the position sent
    pub fn jog(&mut self, axis: Axis, position: i32) -> Result<i32> {
        let clamped = self.state.axes.get(axis).clamp(position);
        if clamped != position {
            tracing::debug!("Jog {} clamped from {} to {}", axis.label(), position, clamped);
        }
        self.send(OutboundCommand::Axis(jog_command(axis, clamped)))?;
        Ok(clamped)
    }

    /// Send text typed by the operator
    ///
    /// Global and speed commands get their usual side effects; anything else
    /// is sent verbatim.
    pub fn send_manual(&mut self, text: &str) -> Result<()> {
        match OutboundCommand::classify(text) {
            OutboundCommand::Global(command) => self.send_global(command),
            OutboundCommand::Speed(command) => self.set_speed(command.axis, command.speed),
            OutboundCommand::Raw(raw) if raw.is_empty() => {
                Err(Error::other("Nothing to send"))
            }
            command => self.send(command),
        }
    }

    // Rows

    /// Append a row
    pub fn add_row(&mut self, row: Row) -> Result<usize> {
        let index = self.store.add_row(row)?;
        self.rows_changed();
        Ok(index)
    }

    /// Replace a row
    pub fn update_row(&mut self, index: usize, row: Row) -> Result<()> {
        self.store.update_row(index, row)?;
        self.rows_changed();
        Ok(())
    }

    /// Remove a row
    pub fn delete_row(&mut self, index: usize) -> Result<Row> {
        let row = self.store.delete_row(index)?;
        self.rows_changed();
        Ok(row)
    }

    /// Remove every row
    pub fn clear_rows(&mut self) {
        self.store.clear_all();
        self.rows_changed();
    }

    fn rows_changed(&self) {
        self.events
            .publish(ControllerEvent::RowsChanged(self.store.len()));
    }

    // Saved sequences

    /// Start a new named sequence with no rows
    pub fn new_sequence(&mut self, name: &str) -> Result<()> {
        self.library.new_sequence(name, &mut self.store)?;
        self.sequence_changed();
        Ok(())
    }

    /// Save the rows under the current sequence name
    pub fn save_sequence(&mut self) -> Result<()> {
        self.library.save_current(&self.store)?;
        Ok(())
    }

    /// Save the rows under a new name
    pub fn save_sequence_as(&mut self, name: &str) -> Result<()> {
        self.library.save_as(name, &self.store)?;
        self.sequence_changed();
        Ok(())
    }

    /// Load a saved sequence into the rows
    pub fn select_sequence(&mut self, name: &str) -> Result<()> {
        self.library.select(name, &mut self.store)?;
        self.sequence_changed();
        Ok(())
    }

    /// Write the rows to a YAML file
    pub fn save_sequence_file(&self, path: &Path) -> Result<()> {
        self.library.save_to_file(path, &self.store)?;
        Ok(())
    }

    /// Read rows from a YAML file
    pub fn load_sequence_file(&mut self, path: &Path) -> Result<String> {
        let name = self.library.load_from_file(path, &mut self.store)?;
        self.sequence_changed();
        Ok(name)
    }

    fn sequence_changed(&self) {
        self.events.publish(ControllerEvent::SequenceChanged(
            self.library.current_name().to_string(),
        ));
        self.rows_changed();
    }

    // Execution

    /// Run the sequence from the first row
    pub fn run_all(&mut self) -> Result<RunOutcome> {
        self.require_connection()?;
        let outcome = self.executor.run_all_rows(&self.store)?;
        self.dispatch(outcome)
    }

    /// Run the row after the current one, or finish
    pub fn run_next(&mut self) -> Result<RunOutcome> {
        self.require_connection()?;
        let outcome = self.executor.run_next_row(&self.store)?;
        self.dispatch(outcome)
    }

    /// Run one row outside the sequence
    pub fn run_row(&mut self, index: usize) -> Result<RunOutcome> {
        self.require_connection()?;
        let outcome = self.executor.run_selected_row(&self.store, index)?;
        self.dispatch(outcome)
    }

    /// Run one axis of one row outside the sequence
    pub fn run_axis(&mut self, index: usize, axis: Axis) -> Result<RunOutcome> {
        self.require_connection()?;
        let outcome = self.executor.run_single_axis(&self.store, index, axis)?;
        self.dispatch(outcome)
    }

    /// Abandon the current execution
    pub fn stop_execution(&mut self) {
        self.executor.reset();
    }

    fn require_connection(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ConnectionError::NotConnected.into())
        }
    }

    fn dispatch(&mut self, outcome: RunOutcome) -> Result<RunOutcome> {
        if let RunOutcome::Dispatched { commands, .. } = &outcome {
            for command in commands {
                if let Err(e) = self.send(command.clone()) {
                    tracing::error!("Failed to send '{}': {}", command, e);
                    self.executor.reset();
                    return Err(e);
                }
            }
        }
        Ok(outcome)
    }

    // Worker events

    /// Drain worker events, route device responses and check the
    /// completion timeout
    ///
    /// Returns the responses received since the last call, for display.
    pub fn poll(&mut self) -> Vec<DeviceResponse> {
        let mut responses = Vec::new();

        while let Ok(event) = self.worker_events.try_recv() {
            match event {
                WorkerEvent::Connected(port) => {
                    self.events.publish(ControllerEvent::Connected(port));
                }
                WorkerEvent::Disconnected(reason) => {
                    if self.executor.is_waiting() || self.executor.is_active() {
                        tracing::warn!("Connection closed during execution, stopping");
                        self.executor.reset();
                    }
                    self.events.publish(ControllerEvent::Disconnected(reason));
                }
                WorkerEvent::Line(line) => {
                    if let Some(response) = parse_response(&line) {
                        self.handle_response(&response);
                        responses.push(response);
                    }
                }
            }
        }

        if self
            .executor
            .check_completion_timeout(Instant::now())
            .is_err()
        {
            tracing::warn!("Execution stalled waiting for completion");
        }

        responses
    }

    fn handle_response(&mut self, response: &DeviceResponse) {
        match response {
            DeviceResponse::AllSlavesCompleted => {
                self.events
                    .publish(ControllerEvent::Feedback(ALL_SLAVES_COMPLETED.to_string()));
                if self.executor.handle_slave_completion() && self.auto_advance {
                    if let Err(e) = self.run_next() {
                        tracing::error!("Automatic advance failed: {}", e);
                        self.events.publish(ControllerEvent::Error(e.to_string()));
                    }
                }
            }
            DeviceResponse::Feedback(text) => {
                tracing::info!("Feedback: {}", text);
                self.events.publish(ControllerEvent::Feedback(text.clone()));
            }
            DeviceResponse::Slave { axis, message } => {
                tracing::debug!("Slave {}: {}", axis.label(), message);
                self.events.publish(ControllerEvent::SlaveStatus {
                    axis: *axis,
                    message: message.clone(),
                });
            }
            DeviceResponse::Message(text) => {
                tracing::debug!("Device: {}", text);
            }
        }
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("connected", &self.is_connected())
            .field("rows", &self.store.len())
            .field("cursor", &self.executor.cursor())
            .field("sequence", &self.library.current_name())
            .finish()
    }
}
