//! # Palletizer Core
//!
//! Core types and utilities for the palletizer controller.
//! Provides the axis data model, the command codec for the master
//! controller's line protocol, position tracking, and controller events.

pub mod codec;
pub mod constants;
pub mod core;
pub mod data;
pub mod error;

pub use codec::{
    decode_axis_command, encode_axis_command, jog_command, parse_command, parse_single_command,
    split_commands, GlobalCommand, OutboundCommand, SpeedCommand,
};

pub use self::core::{drain_events, ControllerEvent, EventDispatcher, PositionTracker};

pub use data::{validate_speed, Axis, AxisSettings, Step};

pub use error::{ConnectionError, Error, ProtocolError, Result, SequenceError};
