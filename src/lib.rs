//! # Palletizer
//!
//! Serial control and sequence execution for a 5-axis palletizer robot
//! (X, Y, Z, T rotation, G gripper) driven through a master controller that
//! fans commands out to one slave per axis.
//!
//! ## Architecture
//!
//! The workspace is organized into multiple crates:
//!
//! 1. **palletizer-core** - Axis model, command codec, position tracking, events, errors
//! 2. **palletizer-communication** - Serial ports, the I/O worker, response parsing
//! 3. **palletizer-sequence** - Rows, the row store, the executor, saved sequences
//! 4. **palletizer-settings** - Application and visualization configuration
//! 5. **palletizer** - The [`Controller`] tying them together and a console binary
//!
//! ## Features
//!
//! - **Absolute positioning**: every move names its target; the last target is tracked
//! - **Row sequences**: up to five steps per axis per row, with delays
//! - **Handshake-driven execution**: one row at a time, advancing on `ALL_SLAVES_COMPLETED`
//! - **YAML persistence**: sequences, configuration and visualization layouts

pub mod console;
pub mod controller;

pub use console::ConsoleCommand;
pub use controller::{Controller, ControllerState};

pub use palletizer_core::{
    decode_axis_command, drain_events, encode_axis_command, jog_command, parse_command,
    split_commands, Axis, AxisSettings, ConnectionError, ControllerEvent, Error, EventDispatcher,
    GlobalCommand, OutboundCommand, PositionTracker, ProtocolError, Result, SequenceError,
    SpeedCommand, Step,
};

pub use palletizer_communication::{
    list_ports, parse_response, ConnectionParams, DeviceResponse, SerialParity, SerialPort,
    SerialPortInfo, SerialWorker, WorkerEvent,
};

pub use palletizer_sequence::{
    ExecutionCursor, ExecutionState, Row, RowStore, RunOutcome, SequenceExecutor,
    SequenceFile, SequenceLibrary,
};

pub use palletizer_settings::{AppConfig, SettingsError, VisualizationConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output on stderr, leaving stdout to the console UI
/// - RUST_LOG environment variable support, `info` by default
/// - Thread names, so worker output is easy to tell apart
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
