//! Step-by-step sequence execution
//!
//! The executor sends one row at a time and then waits for the master's
//! completion handshake. It never loops on its own: whoever receives the
//! handshake calls [`SequenceExecutor::handle_slave_completion`] and, if it
//! returns true, [`SequenceExecutor::run_next_row`] again.
//!
//! Commands are returned to the caller rather than sent, so the caller
//! decides how they reach the device.

use crate::store::RowStore;
use palletizer_core::{
    Axis, ControllerEvent, EventDispatcher, GlobalCommand, OutboundCommand, SequenceError,
};
use std::time::{Duration, Instant};

/// Position of the executor within a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionCursor {
    /// Row last dispatched by sequential execution, `None` before the first
    pub current_row: Option<usize>,
    /// Sequential execution in progress
    pub active: bool,
    /// A dispatched command still awaits the completion handshake
    pub waiting_for_completion: bool,
}

/// Coarse state derived from the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    /// Nothing dispatched
    Idle,
    /// Row dispatched and acknowledged, ready to advance
    Running(usize),
    /// Waiting for the handshake
    WaitingForCompletion,
}

/// Result of an execution request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Commands to send, in order, for the given row
    Dispatched {
        /// Row being executed
        row: usize,
        /// Commands to hand to the transport
        commands: Vec<OutboundCommand>,
    },
    /// The last row had already been dispatched; execution is over
    Finished,
}

/// Drives a row store against the completion handshake
#[derive(Debug)]
pub struct SequenceExecutor {
    cursor: ExecutionCursor,
    running_row: Option<usize>,
    waiting_since: Option<Instant>,
    completion_timeout: Option<Duration>,
    events: EventDispatcher,
}

impl SequenceExecutor {
    /// Create an idle executor that waits forever for completion
    pub fn new(events: EventDispatcher) -> Self {
        Self {
            cursor: ExecutionCursor::default(),
            running_row: None,
            waiting_since: None,
            completion_timeout: None,
            events,
        }
    }

    /// Bound the wait for the completion handshake; `None` waits forever
    pub fn set_completion_timeout(&mut self, timeout: Option<Duration>) {
        self.completion_timeout = timeout;
    }

    /// Current cursor
    pub fn cursor(&self) -> ExecutionCursor {
        self.cursor
    }

    /// Coarse state of the executor
    pub fn state(&self) -> ExecutionState {
        match (self.cursor.waiting_for_completion, self.cursor.current_row) {
            (true, _) => ExecutionState::WaitingForCompletion,
            (false, Some(row)) if self.cursor.active => ExecutionState::Running(row),
            _ => ExecutionState::Idle,
        }
    }

    /// Whether a completion handshake is pending
    pub fn is_waiting(&self) -> bool {
        self.cursor.waiting_for_completion
    }

    /// Whether sequential execution is in progress
    pub fn is_active(&self) -> bool {
        self.cursor.active
    }

    /// Row most recently dispatched by any run operation
    pub fn running_row(&self) -> Option<usize> {
        self.running_row
    }

    /// Return to the idle cursor
    pub fn reset(&mut self) {
        self.cursor = ExecutionCursor::default();
        self.waiting_since = None;
        self.set_running_row(None);
        self.events
            .publish(ControllerEvent::ExecutionStateChanged(false));
    }

    /// Dispatch the next row, or finish after the last one
    pub fn run_next_row(&mut self, store: &RowStore) -> Result<RunOutcome, SequenceError> {
        if store.is_empty() {
            tracing::warn!("No sequence rows to run");
            return Err(SequenceError::NoRows);
        }

        let next = self.cursor.current_row.map_or(0, |row| row + 1);
        if next >= store.len() {
            tracing::info!("All {} rows have been executed", store.len());
            self.cursor = ExecutionCursor::default();
            self.waiting_since = None;
            self.set_running_row(None);
            self.events
                .publish(ControllerEvent::ExecutionStateChanged(false));
            self.events.publish(ControllerEvent::ExecutionFinished);
            return Ok(RunOutcome::Finished);
        }

        let command = store.get_row_command(next);
        if command.is_empty() {
            tracing::warn!("Row {} has no command to send", next + 1);
            return Err(SequenceError::EmptySequence);
        }

        let mut commands = Vec::with_capacity(2);
        if next == 0 || !self.cursor.active {
            commands.push(OutboundCommand::Global(GlobalCommand::Start));
            self.cursor.active = true;
        }
        commands.push(OutboundCommand::Axis(command));

        self.cursor.current_row = Some(next);
        self.begin_wait();
        self.set_running_row(Some(next));
        self.events
            .publish(ControllerEvent::ExecutionStateChanged(true));
        tracing::info!("Running row {}", next + 1);

        Ok(RunOutcome::Dispatched {
            row: next,
            commands,
        })
    }

    /// Restart from the first row
    ///
    /// Only the first row is dispatched; later rows follow completions.
    pub fn run_all_rows(&mut self, store: &RowStore) -> Result<RunOutcome, SequenceError> {
        if store.is_empty() {
            tracing::warn!("No sequence rows to run");
            return Err(SequenceError::NoRows);
        }
        self.cursor = ExecutionCursor::default();
        self.waiting_since = None;
        self.run_next_row(store)
    }

    /// Dispatch one row outside sequential execution
    pub fn run_selected_row(
        &mut self,
        store: &RowStore,
        index: usize,
    ) -> Result<RunOutcome, SequenceError> {
        let command = store.load_row(index)?.command();
        if command.is_empty() {
            tracing::warn!("Row {} has no command to send", index + 1);
            return Err(SequenceError::EmptySequence);
        }
        let commands = vec![
            OutboundCommand::Global(GlobalCommand::Start),
            OutboundCommand::Axis(command),
        ];

        self.begin_wait();
        self.set_running_row(Some(index));
        tracing::info!("Running row {} on its own", index + 1);

        Ok(RunOutcome::Dispatched {
            row: index,
            commands,
        })
    }

    /// Dispatch one axis of one row outside sequential execution
    pub fn run_single_axis(
        &mut self,
        store: &RowStore,
        index: usize,
        axis: Axis,
    ) -> Result<RunOutcome, SequenceError> {
        let row = store.load_row(index)?;
        let command = row
            .axis_command(axis)
            .filter(|command| !command.is_empty())
            .ok_or(SequenceError::AxisNotInRow { row: index, axis })?;
        let commands = vec![
            OutboundCommand::Global(GlobalCommand::Start),
            OutboundCommand::Axis(command),
        ];

        self.begin_wait();
        self.set_running_row(Some(index));
        tracing::info!("Running axis {} from row {}", axis.label(), index + 1);

        Ok(RunOutcome::Dispatched {
            row: index,
            commands,
        })
    }

    /// Consume a completion handshake
    ///
    /// Returns false and changes nothing when no handshake was expected.
    /// Otherwise clears the wait and returns true if sequential execution
    /// may advance.
    pub fn handle_slave_completion(&mut self) -> bool {
        if !self.cursor.waiting_for_completion {
            tracing::debug!("Ignoring completion: nothing pending");
            return false;
        }

        self.cursor.waiting_for_completion = false;
        self.waiting_since = None;

        if self.cursor.active {
            self.events
                .publish(ControllerEvent::ExecutionStateChanged(true));
            return true;
        }
        false
    }

    /// Fail a wait that outlived the configured completion timeout
    ///
    /// The wait is abandoned when it fails, so the caller can retry the row
    /// or reset. Without a timeout this never fails.
    pub fn check_completion_timeout(&mut self, now: Instant) -> Result<(), SequenceError> {
        let (Some(timeout), Some(since)) = (self.completion_timeout, self.waiting_since) else {
            return Ok(());
        };
        if now.saturating_duration_since(since) < timeout {
            return Ok(());
        }

        self.cursor.waiting_for_completion = false;
        self.waiting_since = None;
        let err = SequenceError::CompletionTimeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        };
        tracing::error!("{}", err);
        self.events.publish(ControllerEvent::Error(err.to_string()));
        Err(err)
    }

    fn begin_wait(&mut self) {
        self.cursor.waiting_for_completion = true;
        self.waiting_since = Some(Instant::now());
    }

    fn set_running_row(&mut self, row: Option<usize>) {
        self.running_row = row;
        self.events.publish(ControllerEvent::RunningRowChanged(row));
    }
}

impl Default for SequenceExecutor {
    fn default() -> Self {
        Self::new(EventDispatcher::default())
    }
}
