//! Error handling for the palletizer controller
//!
//! Provides error types for each layer of the controller:
//! - Sequence errors (row store, executor, saved sequences)
//! - Connection errors (serial link to the master controller)
//! - Protocol errors (strict command decoding and construction)
//!
//! All error types use `thiserror` for ergonomic error handling.

use crate::data::Axis;
use thiserror::Error;

/// Sequence error type
///
/// Reported synchronously by row store, executor and library operations.
/// None of these are raised after state has been mutated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// The row store holds no rows
    #[error("No sequence rows to run")]
    NoRows,

    /// A row index outside the store
    #[error("Row {} does not exist ({len} rows)", index + 1)]
    InvalidIndex {
        /// The zero-based index that was requested.
        index: usize,
        /// Number of rows in the store.
        len: usize,
    },

    /// No steps were selected for a row, or nothing to save
    #[error("No sequence steps have been selected")]
    EmptySequence,

    /// The requested axis has no command in the row
    #[error("Row {} does not contain a sequence for axis {axis}", row + 1)]
    AxisNotInRow {
        /// The zero-based row index.
        row: usize,
        /// The axis that was requested.
        axis: Axis,
    },

    /// No saved sequence with this name
    #[error("Unknown sequence: {name}")]
    UnknownSequence {
        /// The requested sequence name.
        name: String,
    },

    /// Sequence names must be non-empty
    #[error("Invalid sequence name: {name:?}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// A sequence with this name already exists
    #[error("Sequence already exists: {name}")]
    DuplicateName {
        /// The name that is taken.
        name: String,
    },

    /// Reading or writing a sequence file failed
    #[error("I/O failure on {path}: {reason}")]
    Io {
        /// The file involved.
        path: String,
        /// The underlying failure.
        reason: String,
    },

    /// The device did not report completion in time
    #[error("No completion signal after {timeout_ms}ms")]
    CompletionTimeout {
        /// The configured timeout in milliseconds.
        timeout_ms: u64,
    },
}

/// Connection error type
///
/// Represents errors on the serial link to the master controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// No connection is open
    #[error("Not connected")]
    NotConnected,

    /// A connection is already open
    #[error("Already connected to {port}")]
    AlreadyConnected {
        /// The port currently in use.
        port: String,
    },

    /// Port not found
    #[error("Port not found: {port}")]
    PortNotFound {
        /// The name of the port that was not found.
        port: String,
    },

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// Connection lost while reading or writing
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        /// The reason the connection was lost.
        reason: String,
    },

    /// I/O error outside an open connection
    #[error("I/O error: {reason}")]
    Io {
        /// The reason for the I/O error.
        reason: String,
    },

    /// Invalid connection parameters
    #[error("Invalid connection parameters: {reason}")]
    InvalidParameters {
        /// The reason the parameters are invalid.
        reason: String,
    },
}

/// Protocol error type
///
/// Raised by the strict decoder and by command constructors. The
/// best-effort tracker path never produces these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A command string does not follow the axis command grammar
    #[error("Malformed command '{command}': {reason}")]
    MalformedCommand {
        /// The offending command text.
        command: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An axis identifier outside the fixed axis set
    #[error("Unknown axis: {axis}")]
    UnknownAxis {
        /// The identifier that was given.
        axis: String,
    },

    /// Speed outside the range accepted by the slaves
    #[error("Speed {speed} outside [{min}, {max}]")]
    SpeedOutOfRange {
        /// The requested speed.
        speed: u32,
        /// Lowest accepted speed.
        min: u32,
        /// Highest accepted speed.
        max: u32,
    },
}

/// Main error type for the palletizer controller
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Sequence error
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Protocol error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a completion timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Sequence(SequenceError::CompletionTimeout { .. }))
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a sequence error
    pub fn is_sequence_error(&self) -> bool {
        matches!(self, Error::Sequence(_))
    }

    /// Check if this is a protocol error
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_index_is_one_based_in_message() {
        let err = SequenceError::InvalidIndex { index: 2, len: 2 };
        assert_eq!(err.to_string(), "Row 3 does not exist (2 rows)");
    }

    #[test]
    fn test_error_classification() {
        let err: Error = SequenceError::CompletionTimeout { timeout_ms: 50 }.into();
        assert!(err.is_timeout());
        assert!(err.is_sequence_error());
        assert!(!err.is_connection_error());

        let err: Error = ConnectionError::NotConnected.into();
        assert!(err.is_connection_error());
        assert!(!err.is_protocol_error());
        assert_eq!(err.to_string(), "Not connected");

        let err: Error = ProtocolError::UnknownAxis {
            axis: "w".to_string(),
        }
        .into();
        assert!(err.is_protocol_error());
        assert!(!err.is_sequence_error());
    }
}
